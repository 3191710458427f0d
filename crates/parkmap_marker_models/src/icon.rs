use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::color::MarkerColor;

pub const INFO_SIGN_SYMBOL: &str = "info-sign";
pub const GLYPHICON_PREFIX: &str = "glyphicon";
pub const GREEN_DOT_URL: &str = "http://maps.google.com/mapfiles/ms/icons/green-dot.png";

/// Visual configuration of a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconDescriptor {
    /// A colored pin with a font glyph on it.
    Awesome {
        symbol: SmolStr,
        prefix: SmolStr,
        color: MarkerColor,
    },
    /// A picture hosted somewhere else, it carries no color.
    Image {
        url: SmolStr,
        size: [u32; 2],
        anchor: [i32; 2],
        popup_anchor: [i32; 2],
    },
}

impl IconDescriptor {
    /// The pin every toggled marker uses: fixed glyph and prefix, only the color changes.
    pub fn awesome(color: MarkerColor) -> Self {
        Self::Awesome {
            symbol: SmolStr::new_inline(INFO_SIGN_SYMBOL),
            prefix: SmolStr::new_inline(GLYPHICON_PREFIX),
            color,
        }
    }

    pub fn green_dot() -> Self {
        Self::Image {
            url: SmolStr::new(GREEN_DOT_URL),
            size: [32, 32],
            anchor: [16, 32],
            popup_anchor: [0, -32],
        }
    }

    pub fn marker_color(&self) -> Option<MarkerColor> {
        match self {
            Self::Awesome { color, .. } => Some(*color),
            Self::Image { .. } => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_awesome_icon_is_fixed_but_color() {
        let red = IconDescriptor::awesome(MarkerColor::Red);
        let green = IconDescriptor::awesome(MarkerColor::Green);
        assert_ne!(red, green);
        match (&red, &green) {
            (
                IconDescriptor::Awesome { symbol: s1, prefix: p1, .. },
                IconDescriptor::Awesome { symbol: s2, prefix: p2, .. },
            ) => {
                assert_eq!(s1, s2);
                assert_eq!(p1, p2);
                assert_eq!(s1, INFO_SIGN_SYMBOL);
                assert_eq!(p1, GLYPHICON_PREFIX);
            }
            _ => unreachable!(),
        }
        assert_eq!(green.marker_color(), Some(MarkerColor::Green));
    }

    #[test]
    fn test_green_dot_has_no_color() {
        let icon = IconDescriptor::green_dot();
        assert_eq!(icon.marker_color(), None);
        let json = serde_json::to_value(&icon).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["popup_anchor"], serde_json::json!([0, -32]));
    }
}
