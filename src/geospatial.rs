const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in meters between two WGS84 points.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c * 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Bounding box around a point, for callers without native geospatial
/// operators. One degree of latitude is ~111320 m.
pub fn bounding_box(lat: f64, lon: f64, radius_meters: f64) -> Bounds {
    let lat_delta = radius_meters / 111_320.0;
    let lon_delta = radius_meters / (111_320.0 * lat.to_radians().cos());

    Bounds {
        min_lat: lat - lat_delta,
        min_lon: lon - lon_delta,
        max_lat: lat + lat_delta,
        max_lon: lon + lon_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine(43.263, -2.935, 43.263, -2.935), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bilbao Abando to Casco Viejo, roughly 750 m apart
        let d = haversine(43.2609, -2.9335, 43.2569, -2.9236);
        assert!(d > 700.0 && d < 1000.0, "got {}", d);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = haversine(43.263, -2.935, 43.270, -2.940);
        let b = haversine(43.270, -2.940, 43.263, -2.935);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_contains_center() {
        let b = bounding_box(43.263, -2.935, 500.0);
        assert!(b.min_lat < 43.263 && 43.263 < b.max_lat);
        assert!(b.min_lon < -2.935 && -2.935 < b.max_lon);
    }

    #[test]
    fn test_bounding_box_lat_delta() {
        let b = bounding_box(0.0, 0.0, 111_320.0);
        assert!((b.max_lat - 1.0).abs() < 1e-9);
        assert!((b.min_lat + 1.0).abs() < 1e-9);
        // at the equator the longitude delta matches the latitude delta
        assert!((b.max_lon - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_lon_widens_with_latitude() {
        let equator = bounding_box(0.0, 0.0, 1000.0);
        let north = bounding_box(60.0, 0.0, 1000.0);
        assert!(
            (north.max_lon - north.min_lon) > (equator.max_lon - equator.min_lon)
        );
    }
}
