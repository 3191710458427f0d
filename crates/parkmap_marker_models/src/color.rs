use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two colors a parking marker can take.
/// Red is the initial state of every marker, green means "visited".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    #[default]
    Red,
    Green,
}

impl MarkerColor {
    pub fn toggled(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }

    /// Next color from whatever the icon currently shows.
    /// Only a red icon becomes green, anything else (green, or an icon without color) becomes red.
    pub fn next_from(current: Option<Self>) -> Self {
        match current {
            Some(Self::Red) => Self::Green,
            _ => Self::Red,
        }
    }
}

impl FromStr for MarkerColor {
    type Err = &'static str;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            _ => Err("marker color must be either red or green"),
        }
    }
}

impl AsRef<str> for MarkerColor {
    fn as_ref(&self) -> &str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

impl std::fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
