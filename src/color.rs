//! Food colors and the readable foreground picked for them.
//!
//! A food item either has a full RGB color or none at all, so the color is
//! carried as `Option<Rgb>` everywhere above the storage layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FncmError, Result};

/// Luminance below which white text is used on top of a color.
pub const LUMINANCE_THRESHOLD: f64 = 140.0;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Build a color from its three channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Build a color from the three nullable storage columns.
    ///
    /// All three set gives a color, all three absent gives `None`. Anything
    /// else (or a value outside 0..=255) is rejected.
    pub fn from_columns(red: Option<i64>, green: Option<i64>, blue: Option<i64>) -> Result<Option<Self>> {
        match (red, green, blue) {
            (None, None, None) => Ok(None),
            (Some(r), Some(g), Some(b)) => Ok(Some(Self::new(channel(r)?, channel(g)?, channel(b)?))),
            _ => Err(FncmError::Validation(
                "Color must have all three channels or none".to_string(),
            )),
        }
    }

    /// ITU-R BT.709 weighted brightness, without gamma correction.
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn luminance(self) -> f64 {
        0.2126 * f64::from(self.red) + 0.7152 * f64::from(self.green) + 0.0722 * f64::from(self.blue)
    }
}

fn channel(value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| FncmError::Validation(format!("Color channel out of range (0-255): {value}")))
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl FromStr for Rgb {
    type Err = FncmError;

    /// Accepts `r,g,b` (decimal channels) or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(FncmError::Validation(format!("Invalid hex color: {s}")));
            }
            let parse = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| FncmError::Validation(format!("Invalid hex color: {s}")))
            };
            return Ok(Self::new(parse(0..2)?, parse(2..4)?, parse(4..6)?));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(FncmError::Validation(format!(
                "Color must be 'r,g,b' or '#rrggbb', got: {s}"
            )));
        }
        let mut channels = [0u8; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u8>()
                .map_err(|_| FncmError::Validation(format!("Color channel out of range (0-255): {part}")))?;
        }
        Ok(Self::new(channels[0], channels[1], channels[2]))
    }
}

/// Text color to draw on top of a colored cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foreground {
    /// Dark text, for light backgrounds
    Black,
    /// Light text, for dark backgrounds
    White,
}

impl Foreground {
    /// The concrete color of this foreground.
    #[must_use]
    pub const fn rgb(self) -> Rgb {
        match self {
            Self::Black => Rgb::BLACK,
            Self::White => Rgb::WHITE,
        }
    }
}

impl fmt::Display for Foreground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => f.write_str("black"),
            Self::White => f.write_str("white"),
        }
    }
}

/// Pick black or white text for the given background.
#[must_use]
pub fn foreground_for(background: Rgb) -> Foreground {
    if background.luminance() < LUMINANCE_THRESHOLD {
        Foreground::White
    } else {
        Foreground::Black
    }
}
