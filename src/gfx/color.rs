//! RGBA colors and `#RRGGBB` hex exchange
//!
//! Components are normalized floats and are never clamped. The hex helpers
//! work on different domains: [`hex_to_color`] yields floats in `[0, 1]`,
//! [`color_to_hex`] takes integer channels in `[0, 255]`. Callers scale
//! between them explicitly.

use std::{fmt, str::FromStr};

use crate::error::ColorError;

/// Four normalized color components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub fn to_rgb_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels scaled to `[0, 255]` and rounded, ready for [`color_to_hex`].
    /// Out-of-range components saturate.
    pub fn to_rgb8(self) -> [u8; 3] {
        let channel = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        f.write_str(&color_to_hex(r, g, b))
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_color(s)
    }
}

impl From<Color> for wgpu::Color {
    fn from(color: Color) -> Self {
        wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        }
    }
}

/// Parses `#RRGGBB` (case-insensitive, `#` optional) into an opaque color.
pub fn hex_to_color(hex: &str) -> Result<Color, ColorError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::MalformedHex(hex.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|value| value as f32 / 255.0)
            .map_err(|_| ColorError::MalformedHex(hex.to_string()))
    };

    Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Two lowercase hex digits for one channel.
pub fn component_to_hex(c: u8) -> String {
    format!("{:02x}", c)
}

pub fn color_to_hex(r: u8, g: u8, b: u8) -> String {
    format!(
        "#{}{}{}",
        component_to_hex(r),
        component_to_hex(g),
        component_to_hex(b)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    #[test]
    fn test_known_hex_strings() {
        assert_eq!(color_to_hex(0, 0, 0), "#000000");
        assert_eq!(color_to_hex(255, 255, 255), "#ffffff");
        assert_eq!(component_to_hex(5), "05");
        assert_eq!(component_to_hex(171), "ab");
    }

    #[test]
    fn test_parse_is_case_insensitive_and_hash_optional() {
        let upper = hex_to_color("#FF8000").unwrap();
        let lower = hex_to_color("ff8000").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.r, 1.0);
        assert_abs_diff_eq!(upper.g, 128.0 / 255.0, epsilon = 1e-6);
        assert_eq!(upper.b, 0.0);
        assert_eq!(upper.a, 1.0);
    }

    #[test]
    fn test_malformed_hex_is_rejected() {
        for bad in ["", "#", "#12345", "#1234567", "#12345g", "+12345", "##123456", "#+1+2+3"] {
            assert_eq!(
                hex_to_color(bad),
                Err(ColorError::MalformedHex(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_round_trip_every_channel_value() {
        for c in 0..=255u8 {
            let color = hex_to_color(&color_to_hex(c, c, c)).unwrap();
            for component in color.to_rgb_array() {
                assert!((component * 255.0 - c as f32).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn test_round_trip_sampled_triples() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let (r, g, b): (u8, u8, u8) = (rng.random(), rng.random(), rng.random());
            let color = hex_to_color(&color_to_hex(r, g, b)).unwrap();
            assert_eq!(color.to_rgb8(), [r, g, b]);
        }
    }

    #[test]
    fn test_display_and_from_str_agree() {
        let color: Color = "#1a2b3c".parse().unwrap();
        assert_eq!(color.to_string(), "#1a2b3c");
    }
}
