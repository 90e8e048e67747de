use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ColorSwapError, ColorSwapResult};

/// Largest possible Euclidean distance between two 8-bit RGB colors, `sqrt(255^2 * 3)`.
pub const MAX_RGB_DISTANCE: f64 = 441.67;

/// A canonical `#rrggbb` color key.
///
/// Parsing is case-insensitive and tolerates a missing `#`; the stored form is
/// always lowercase, so `==` is the case-insensitive comparison every matching
/// pass relies on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hex([u8; 3]);

impl Hex {
    /// Build a hex key from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Parse `#RRGGBB` / `RRGGBB` in any case.
    pub fn parse(s: &str) -> ColorSwapResult<Self> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorSwapError::validation(format!(
                "hex color must be #RRGGBB, got \"{s}\""
            )));
        }

        fn hex_byte(pair: &str) -> ColorSwapResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| ColorSwapError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        Ok(Self([
            hex_byte(&digits[0..2])?,
            hex_byte(&digits[2..4])?,
            hex_byte(&digits[4..6])?,
        ]))
    }

    /// The 8-bit `[r, g, b]` channels.
    pub fn rgb8(self) -> [u8; 3] {
        self.0
    }

    /// Normalized color with an opaque alpha channel.
    pub fn to_rgba(self) -> Rgba {
        self.to_rgba_with_alpha(1.0)
    }

    /// Normalized color carrying over an existing alpha value.
    pub fn to_rgba_with_alpha(self, alpha: f64) -> Rgba {
        let [r, g, b] = self.0;
        Rgba([
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            alpha,
        ])
    }

    /// Euclidean RGB distance as a percentage of [`MAX_RGB_DISTANCE`].
    pub fn distance_percent(self, other: Hex) -> f64 {
        let sq = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let d = f64::from(*a) - f64::from(*b);
                d * d
            })
            .sum::<f64>();
        sq.sqrt() / MAX_RGB_DISTANCE * 100.0
    }

    /// `true` when `other` lies within `threshold_percent` of `self`.
    pub fn is_similar(self, other: Hex, threshold_percent: f64) -> bool {
        self.distance_percent(other) <= threshold_percent
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Debug for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hex({self})")
    }
}

impl FromStr for Hex {
    type Err = ColorSwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Hex {
    type Error = ColorSwapError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Hex> for String {
    fn from(h: Hex) -> Self {
        h.to_string()
    }
}

/// A normalized `[r, g, b, a]` color as the document model stores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rgba(pub [f64; 4]);

impl Rgba {
    /// Build from components.
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self([r, g, b, a])
    }

    /// Alpha channel.
    pub fn alpha(self) -> f64 {
        self.0[3]
    }

    /// Quantize to the canonical hex key; channels are clamped to `[0, 1]`.
    pub fn to_hex(self) -> Hex {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Hex([to_u8(self.0[0]), to_u8(self.0[1]), to_u8(self.0[2])])
    }

    /// Replace the color channels with `hex`, keeping this color's alpha.
    pub fn recolored(self, hex: Hex) -> Rgba {
        hex.to_rgba_with_alpha(self.alpha())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Hex::parse(&s)
                .map(Hex::to_rgba)
                .map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Self::new(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
