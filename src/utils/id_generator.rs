// src/utils/id_generator.rs
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdType {
    Geofence,
    Rule,
    Violation,
    Document,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::Geofence => "geo",
            IdType::Rule => "rul",
            IdType::Violation => "vio",
            IdType::Document => "doc",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}-{date}-{random_suffix}
    /// Where random_suffix is 5 characters: 3 hexchars + 2 alphanumeric or 3 alphanumeric + 2 hexchars
    pub fn generate(id_type: IdType) -> String {
        Self::generate_with_timestamp(id_type, Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(id_type: IdType, timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string();
        let random_suffix = Self::generate_random_suffix();

        format!("{}-{}-{}", id_type.to_prefix(), date_part, random_suffix)
    }

    fn generate_random_suffix() -> String {
        if rand::random::<bool>() {
            format!(
                "{}{}",
                Self::generate_from_chars(HEX_CHARS, 3),
                Self::generate_from_chars(ALPHANUMERIC_CHARS, 2)
            )
        } else {
            format!(
                "{}{}",
                Self::generate_from_chars(ALPHANUMERIC_CHARS, 3),
                Self::generate_from_chars(HEX_CHARS, 2)
            )
        }
    }

    fn generate_from_chars(charset: &[u8], n: usize) -> String {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| charset[rng.random_range(0..charset.len())] as char)
            .collect()
    }
}

const HEX_CHARS: &[u8] = b"0123456789abcdef";
const ALPHANUMERIC_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub trait WithGeneratedId {
    fn set_generated_id(&mut self);

    fn with_generated_id(mut self) -> Self
    where
        Self: Sized,
    {
        self.set_generated_id();
        self
    }
}

impl WithGeneratedId for crate::models::geofence::Geofence {
    fn set_generated_id(&mut self) {
        self.id = IdGenerator::generate(IdType::Geofence);
    }
}

impl WithGeneratedId for crate::models::alert::AlertRule {
    fn set_generated_id(&mut self) {
        self.id = IdGenerator::generate(IdType::Rule);
    }
}

impl WithGeneratedId for crate::models::violation::ViolationEvent {
    fn set_generated_id(&mut self) {
        self.id = IdGenerator::generate(IdType::Violation);
    }
}

impl WithGeneratedId for crate::models::document::Document {
    fn set_generated_id(&mut self) {
        self.id = IdGenerator::generate(IdType::Document);
    }
}
