// src/utils/geo.rs
use crate::models::geofence::Coordinates;

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points (haversine formula)
pub fn haversine_distance_m(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1_rad = a.latitude.to_radians();
    let lat2_rad = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Even-odd ray casting over lat/lng treated as a plane.
///
/// The ring is implicitly closed, so the last vertex connects back to the first.
/// Good enough for fleet-sized zones that do not straddle the antimeridian.
pub fn point_in_polygon(point: &Coordinates, vertices: &[Coordinates]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = vertices.len() - 1;

    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].longitude, vertices[i].latitude);
        let (xj, yj) = (vertices[j].longitude, vertices[j].latitude);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates { latitude, longitude }
    }

    #[test]
    fn test_haversine_zero_distance() {
        let p = point(5.6037, -0.1870);
        assert!(haversine_distance_m(&p, &p).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_distance_m(&point(0.0, 0.0), &point(1.0, 0.0));
        // ~111.19 km per degree on a 6371 km sphere
        assert!((d - 111_195.0).abs() < 100.0, "distance was {}", d);
    }

    #[test]
    fn test_point_in_square() {
        let square = vec![point(0.0, 0.0), point(0.0, 1.0), point(1.0, 1.0), point(1.0, 0.0)];
        assert!(point_in_polygon(&point(0.5, 0.5), &square));
        assert!(!point_in_polygon(&point(1.5, 0.5), &square));
        assert!(!point_in_polygon(&point(-0.1, 0.5), &square));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // U shape opening north
        let u = vec![
            point(0.0, 0.0),
            point(0.0, 3.0),
            point(3.0, 3.0),
            point(3.0, 2.0),
            point(1.0, 2.0),
            point(1.0, 1.0),
            point(3.0, 1.0),
            point(3.0, 0.0),
        ];
        assert!(point_in_polygon(&point(0.5, 1.5), &u));
        assert!(!point_in_polygon(&point(2.0, 1.5), &u));
        assert!(point_in_polygon(&point(2.0, 0.5), &u));
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = vec![point(0.0, 0.0), point(1.0, 1.0)];
        assert!(!point_in_polygon(&point(0.5, 0.5), &line));
    }
}
