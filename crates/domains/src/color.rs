//! # ColorDerivation
//!
//! Theme colors of a board are derived from the average color of its
//! background image.

use std::fmt;

use serde::Serialize;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `rrggbb` or `#rrggbb`.
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::InvalidColorFormat(value.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| AppError::InvalidColorFormat(value.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Scales every channel by `factor`, which must lie in `[0, 1]`.
    pub fn darken(self, factor: f64) -> Result<Self> {
        let factor = unit_factor(factor)?;
        let scale = |c: u8| (f64::from(c) * factor) as u8;
        Ok(Self::new(scale(self.r), scale(self.g), scale(self.b)))
    }

    /// Moves every channel toward 255 by `factor`, which must lie in `[0, 1]`.
    pub fn lighten(self, factor: f64) -> Result<Self> {
        let factor = unit_factor(factor)?;
        let lift = |c: u8| {
            let c = f64::from(c);
            (c + (255.0 - c) * factor) as u8
        };
        Ok(Self::new(lift(self.r), lift(self.g), lift(self.b)))
    }
}

fn unit_factor(factor: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&factor) {
        Ok(factor)
    } else {
        Err(AppError::ValidationError(format!("color factor must be between 0 and 1, got {factor}")))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colors sent along with a board that has a background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTheme {
    pub menu_color_dark: String,
    pub menu_color_light: String,
    pub list_color: String,
}

impl BoardTheme {
    pub fn derive(background_color: &str) -> Result<Self> {
        let base = Rgb::from_hex(background_color)?;
        Ok(Self {
            menu_color_dark: base.darken(0.5)?.to_string(),
            menu_color_light: base.darken(0.7)?.to_string(),
            list_color: base.lighten(0.5)?.to_string(),
        })
    }
}
