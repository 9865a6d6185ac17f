//! Color themes shared by every diagram.

use crate::scene::{ColorParseError, Rgba};

/// The five roles every diagram draws with.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorTheme {
    /// Canvas clear color and node interiors.
    pub background: Rgba,
    /// Label text on highlighted nodes.
    pub primary: Rgba,
    /// Accept-node fill.
    pub secondary: Rgba,
    /// Outlines and edges that are highlighted.
    pub accent: Rgba,
    /// Everything that is not highlighted.
    pub dimmed: Rgba,
}

impl ColorTheme {
    /// Build a theme from `#rrggbb` strings.
    pub fn from_hex(
        background: &str,
        primary: &str,
        secondary: &str,
        accent: &str,
        dimmed: &str,
    ) -> Result<Self, ColorParseError> {
        Ok(Self {
            background: Rgba::from_hex(background)?,
            primary: Rgba::from_hex(primary)?,
            secondary: Rgba::from_hex(secondary)?,
            accent: Rgba::from_hex(accent)?,
            dimmed: Rgba::from_hex(dimmed)?,
        })
    }

    pub fn dark() -> Self {
        Self {
            background: Rgba::rgb(0.05, 0.06, 0.08),
            primary: Rgba::rgb(0.92, 0.93, 0.95),
            secondary: Rgba::rgb(0.98, 0.74, 0.32),
            accent: Rgba::rgb(0.38, 0.68, 0.98),
            dimmed: Rgba::rgb(0.26, 0.28, 0.32),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Rgba::rgb(0.97, 0.97, 0.96),
            primary: Rgba::rgb(0.10, 0.11, 0.13),
            secondary: Rgba::rgb(0.85, 0.45, 0.10),
            accent: Rgba::rgb(0.12, 0.42, 0.85),
            dimmed: Rgba::rgb(0.78, 0.79, 0.81),
        }
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_rejects_bad_roles() {
        let ok = ColorTheme::from_hex("#000000", "#ffffff", "#ff8800", "#0088ff", "#444444");
        assert!(ok.is_ok());
        let bad = ColorTheme::from_hex("#000000", "white", "#ff8800", "#0088ff", "#444444");
        assert!(bad.is_err());
    }
}
