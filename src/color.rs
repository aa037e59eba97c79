//! Bag color and the lighter tint derived from it.
//!
//! The [`ColorModel`] is the only place the current bag color lives. Inputs
//! and panels are views onto it.

use serde::{Deserialize, Serialize};

/// How far the ambient tint is pulled toward white.
pub const AMBIENT_LERP: f32 = 0.6;

/// Linear RGB, each channel in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Accepts `#rrggbb`, `rrggbb`, `#rgb` and `rgb` (case-insensitive).
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        // from_str_radix alone would take a leading `+`
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::from_rgb8(r, g, b))
            }
            3 => {
                // #abc == #aabbcc
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|n| n * 17);
                Some(Self::from_rgb8(nibble(0).ok()?, nibble(1).ok()?, nibble(2).ok()?))
            }
            _ => None,
        }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Lower-case `#rrggbb`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Per-channel linear interpolation, `t = 0` gives `self`.
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Current bag color plus its ambient tint.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorModel {
    bag_color: Color,
    ambient_tint: Color,
}

impl ColorModel {
    pub fn new() -> Self {
        Self::with_color(Color::default())
    }

    pub fn with_color(color: Color) -> Self {
        Self {
            bag_color: color,
            ambient_tint: tint_for(color),
        }
    }

    #[inline]
    pub fn bag_color(&self) -> Color {
        self.bag_color
    }

    #[inline]
    pub fn ambient_tint(&self) -> Color {
        self.ambient_tint
    }

    /// Parses `value` and adopts it. Unparseable input is ignored.
    ///
    /// Returns `true` when the bag color actually changed.
    pub fn set_color(&mut self, value: &str) -> bool {
        let Some(color) = Color::parse_hex(value) else {
            log::debug!("ignoring unparseable color {value:?}");
            return false;
        };
        let changed = color != self.bag_color;
        self.bag_color = color;
        self.ambient_tint = tint_for(color);
        changed
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ColorModel {
    fn default() -> Self {
        Self::new()
    }
}

fn tint_for(color: Color) -> Color {
    color.lerp(Color::WHITE, AMBIENT_LERP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::parse_hex("#e01b2f").unwrap().to_hex(), "#e01b2f");
        assert_eq!(Color::parse_hex("E01B2F").unwrap().to_hex(), "#e01b2f");
        assert_eq!(Color::parse_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse_hex(" #0a0 ").unwrap().to_hex(), "#00aa00");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "#", "#12345", "#gggggg", "red", "#ffé", "+1+1+1", "#+1+1+1", "+ff", "-1-1-1"] {
            assert!(Color::parse_hex(bad).is_none(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn tint_follows_every_color_change() {
        let mut model = ColorModel::new();
        for hex in ["#e01b2f", "#000000", "#123456", "#ffffff"] {
            model.set_color(hex);
            let expected = Color::parse_hex(hex).unwrap().lerp(Color::WHITE, AMBIENT_LERP);
            assert_eq!(model.ambient_tint(), expected);
        }
    }

    #[test]
    fn black_tints_to_light_grey() {
        let mut model = ColorModel::new();
        model.set_color("#000000");
        assert_eq!(model.ambient_tint().to_hex(), "#999999");
    }

    #[test]
    fn bad_input_is_a_no_op() {
        let mut model = ColorModel::new();
        model.set_color("#e01b2f");
        let before = model.clone();
        assert!(!model.set_color("not-a-color"));
        assert_eq!(model, before);
    }

    #[test]
    fn reset_returns_to_white() {
        let mut model = ColorModel::new();
        assert!(model.set_color("#e01b2f"));
        model.reset();
        assert_eq!(model.bag_color().to_hex(), "#ffffff");
        assert_eq!(model.ambient_tint(), Color::WHITE);
    }
}
