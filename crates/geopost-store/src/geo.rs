use std::fmt;

/// Mean earth radius in kilometres, the value Elasticsearch uses for arc distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A search radius. Rendered as `"<n>km"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    km: f64,
}

impl Distance {
    /// Radius used when a search does not ask for one.
    pub const DEFAULT: Distance = Distance { km: 200.0 };

    pub fn from_km(km: f64) -> Option<Self> {
        (km.is_finite() && km >= 0.0).then_some(Self { km })
    }

    pub fn km(&self) -> f64 {
        self.km
    }
}

impl Default for Distance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}km", self.km)
    }
}

/// Great-circle distance between two points in kilometres (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_km_rejects_negative_and_non_finite() {
        assert_eq!(Distance::from_km(0.0).map(|d| d.km()), Some(0.0));
        assert!(Distance::from_km(-3.0).is_none());
        assert!(Distance::from_km(f64::NAN).is_none());
        assert!(Distance::from_km(f64::INFINITY).is_none());
    }

    #[test]
    fn renders_for_elasticsearch() {
        assert_eq!(Distance::DEFAULT.to_string(), "200km");
        assert_eq!(Distance::from_km(5.0).unwrap().to_string(), "5km");
        assert_eq!(Distance::from_km(2.5).unwrap().to_string(), "2.5km");
    }

    #[test]
    fn haversine_known_distances() {
        assert_eq!(haversine_km(37.7, -122.4, 37.7, -122.4), 0.0);

        // One degree of latitude is about 111.2 km.
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "got {d}");

        // San Francisco to Los Angeles, roughly 559 km.
        let d = haversine_km(37.7749, -122.4194, 34.0522, -118.2437);
        assert!((d - 559.0).abs() < 2.0, "got {d}");
    }
}
