use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One marker per this many lots, unless a city says otherwise.
pub const DEFAULT_DIVISION_FACTOR: usize = 80;

/// `(south, west, north, east)` in degrees, the order Overpass expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl From<[f64; 4]> for BoundingBox {
    fn from([south, west, north, east]: [f64; 4]) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.south, b.west, b.north, b.east]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySpec {
    pub name: SmolStr,
    pub state: SmolStr,
    pub bbox: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_factor: Option<usize>,
    /// Two letter postal code, used to ask for the charging stations of the state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<SmolStr>,
}

impl CitySpec {
    pub fn division_factor(&self) -> usize {
        self.division_factor.unwrap_or(DEFAULT_DIVISION_FACTOR).max(1)
    }

    /// The three cities the project started with.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "Phoenix".into(),
                state: "Arizona".into(),
                bbox: [33.2000, -112.3000, 33.8000, -111.9000].into(),
                division_factor: Some(160),
                state_code: Some("AZ".into()),
            },
            Self {
                name: "Tampa".into(),
                state: "Florida".into(),
                bbox: [27.9000, -82.5500, 28.1500, -82.3500].into(),
                division_factor: Some(40),
                state_code: Some("FL".into()),
            },
            Self {
                name: "Atlanta".into(),
                state: "Georgia".into(),
                bbox: [33.6500, -84.5500, 33.9000, -84.2500].into(),
                division_factor: None,
                state_code: Some("GA".into()),
            },
        ]
    }
}
