use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// sRGB color with straight (non-premultiplied) alpha.
///
/// Stored in settings files as a hex string (`#RRGGBB` or `#RRGGBBAA`), the
/// same encoding the overlay backends consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` / `#RRGGBBAA` (leading `#` optional, case-insensitive).
    pub fn from_hex(value: &str) -> Option<Self> {
        let raw = value.trim().trim_start_matches('#');
        match raw.len() {
            6 => {
                let r = u8::from_str_radix(&raw[0..2], 16).ok()?;
                let g = u8::from_str_radix(&raw[2..4], 16).ok()?;
                let b = u8::from_str_radix(&raw[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&raw[0..2], 16).ok()?;
                let g = u8::from_str_radix(&raw[2..4], 16).ok()?;
                let b = u8::from_str_radix(&raw[4..6], 16).ok()?;
                let a = u8::from_str_radix(&raw[6..8], 16).ok()?;
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Color scaled toward black by `factor` (clamped to [0, 1]).
    ///
    /// Color-keyed overlay windows cannot blend per-pixel alpha, so reduced
    /// opacity is approximated by dimming against the (black) key color.
    pub fn dimmed(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * factor).round() as u8,
            g: (self.g as f32 * factor).round() as u8,
            b: (self.b as f32 * factor).round() as u8,
            a: self.a,
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::from_hex(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid hex color '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn parses_six_and_eight_digit_hex() {
        assert_eq!(Color::from_hex("#00FFFF"), Some(Color::rgb(0, 255, 255)));
        assert_eq!(Color::from_hex("39ff14"), Some(Color::rgb(0x39, 0xff, 0x14)));
        assert_eq!(
            Color::from_hex("#FF073A80"),
            Some(Color::rgba(0xff, 0x07, 0x3a, 0x80))
        );
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(Color::from_hex(""), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("not a color"), None);
    }

    #[test]
    fn hex_round_trip_omits_opaque_alpha() {
        assert_eq!(Color::rgb(0, 255, 255).to_hex(), "#00FFFF");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn dimming_scales_channels_toward_black() {
        let dim = Color::rgb(200, 100, 50).dimmed(0.5);
        assert_eq!((dim.r, dim.g, dim.b), (100, 50, 25));
        assert_eq!(Color::rgb(10, 10, 10).dimmed(2.0), Color::rgb(10, 10, 10));
    }
}
