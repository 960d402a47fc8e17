// src/models/mod.rs
pub mod alert;
pub mod document;
pub mod geofence;
pub mod report;
pub mod schedule;
pub mod violation;

pub use alert::*;
pub use document::*;
pub use geofence::*;
pub use report::*;
pub use schedule::*;
pub use violation::*;
