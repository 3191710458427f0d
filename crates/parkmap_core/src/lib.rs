use serde::{Deserialize, Serialize};

/*
each widget must have
1. a main thread struct which owns the visible state
2. an off thread worker when it needs the network
3. messages that travel between both
4. a public api for the application to drive it

*/

#[cfg(any(test, feature = "test-util"))]
pub mod loopback;
pub mod paths;
pub mod task;
pub mod trace;

/// A WGS84 position as handed over by the map (latitude first, like leaflet does).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Key used to remember per-location results.
    /// 1. latitude and longitude are joined by a `,` without spaces
    /// 2. each float uses the shortest representation that round-trips, `34.0` is written `34`
    /// 3. `-0` is written `0`, so both zeroes share the same key
    pub fn key(&self) -> String {
        format!("{},{}", Self::unsigned_zero(self.lat), Self::unsigned_zero(self.lon))
    }

    fn unsigned_zero(value: f64) -> f64 {
        if value == 0.0 {
            0.0
        } else {
            value
        }
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<(f64, f64)> for LatLon {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

#[cfg(test)]
mod test {
    use super::LatLon;
    use rstest::rstest;

    #[rstest]
    #[case(34.05, -118.25, "34.05,-118.25")]
    #[case(34.0, 12.5, "34,12.5")]
    #[case(-0.0, 0.0, "0,0")]
    #[case(33.4484, -112.074, "33.4484,-112.074")]
    fn test_key_format(#[case] lat: f64, #[case] lon: f64, #[case] expected: &str) {
        assert_eq!(LatLon::new(lat, lon).key(), expected);
    }

    #[test]
    fn test_serde_shape() {
        let position: LatLon = serde_json::from_str(r#"{"lat": 27.9506, "lon": -82.4572}"#).unwrap();
        assert_eq!(position, LatLon::new(27.9506, -82.4572));
        assert_eq!(position.to_string(), "27.9506,-82.4572");
    }
}
