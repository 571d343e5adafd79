// ABOUTME: Branding profile derivation - pure color math from one primary color
// Converts a hex primary into a full theme palette via fixed HSL transforms

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hue rotation applied for the secondary (+) and accent (-) colors, in degrees.
const HUE_SHIFT_DEG: f64 = 30.0;

/// Saturation step added to the accent color, in percent points.
const ACCENT_SATURATION_STEP: f64 = 15.0;

/// Lightness delta applied to produce the light/dark background companions.
const BACKGROUND_LIGHTNESS_DELTA: f64 = 40.0;

/// Secondary lightness is nudged into this band when it falls outside it.
const MID_LIGHTNESS_MIN: f64 = 25.0;
const MID_LIGHTNESS_MAX: f64 = 75.0;

/// Error raised when a primary color string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("Color must be 6 hex digits, got {0} characters")]
    BadLength(usize),
    #[error("Invalid hex digit in color: {0}")]
    BadDigit(String),
}

/// Theme variant selected from the primary color's lightness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Full derived color set for one primary color
///
/// Every field except `primary` is computed; nothing here is mutated after
/// derivation. Consumers hold the whole profile as a single read-only value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingProfile {
    /// The user-chosen primary color, normalized to `#RRGGBB`
    pub primary: String,
    /// Primary with hue rotated +30 degrees, lightness pulled toward mid-range
    pub secondary: String,
    /// Primary with hue rotated -30 degrees and saturation boosted
    pub accent: String,
    /// Light background companion (lightness raised)
    pub background: String,
    /// Dark background companion (lightness lowered)
    pub background_dark: String,
    /// Light or dark, chosen from the primary's lightness
    pub theme: ThemeMode,
}

/// HSL working representation. Hue in [0, 360), saturation and lightness in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsl {
    h: f64,
    s: f64,
    l: f64,
}

impl Hsl {
    fn rotate_hue(self, degrees: f64) -> Self {
        Self {
            h: (self.h + degrees).rem_euclid(360.0),
            ..self
        }
    }

    fn with_saturation(self, s: f64) -> Self {
        Self {
            s: s.clamp(0.0, 100.0),
            ..self
        }
    }

    fn with_lightness(self, l: f64) -> Self {
        Self {
            l: l.clamp(0.0, 100.0),
            ..self
        }
    }
}

/// Derive the full branding profile from a primary color.
///
/// Pure and deterministic: the same input always yields a bit-identical
/// profile. Accepts `#RRGGBB` or `RRGGBB`, case-insensitive.
pub fn derive(primary_hex: &str) -> Result<BrandingProfile, ColorParseError> {
    let (r, g, b) = parse_hex(primary_hex)?;
    let primary = rgb_to_hsl(r, g, b);

    let secondary = nudge_to_mid_range(primary.rotate_hue(HUE_SHIFT_DEG));
    let accent = primary
        .rotate_hue(-HUE_SHIFT_DEG)
        .with_saturation(primary.s + ACCENT_SATURATION_STEP);
    let background = primary.with_lightness(primary.l + BACKGROUND_LIGHTNESS_DELTA);
    let background_dark = primary.with_lightness(primary.l - BACKGROUND_LIGHTNESS_DELTA);

    let theme = if primary.l < 50.0 {
        ThemeMode::Dark
    } else {
        ThemeMode::Light
    };

    Ok(BrandingProfile {
        primary: format_hex(r, g, b),
        secondary: hsl_to_hex(secondary),
        accent: hsl_to_hex(accent),
        background: hsl_to_hex(background),
        background_dark: hsl_to_hex(background_dark),
        theme,
    })
}

/// Pull lightness into the mid band when it is extreme enough to wash out
/// or blacken the secondary color.
fn nudge_to_mid_range(color: Hsl) -> Hsl {
    if color.l < MID_LIGHTNESS_MIN {
        color.with_lightness(MID_LIGHTNESS_MIN)
    } else if color.l > MID_LIGHTNESS_MAX {
        color.with_lightness(MID_LIGHTNESS_MAX)
    } else {
        color
    }
}

fn parse_hex(input: &str) -> Result<(u8, u8, u8), ColorParseError> {
    let digits = input.strip_prefix('#').unwrap_or(input);
    if digits.len() != 6 {
        return Err(ColorParseError::BadLength(digits.len()));
    }
    let byte = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| ColorParseError::BadDigit(digits.to_string()))
    };
    Ok((byte(0..2)?, byte(2..4)?, byte(4..6)?))
}

fn format_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;

    if delta == 0.0 {
        return Hsl {
            h: 0.0,
            s: 0.0,
            l: l * 100.0,
        };
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if max == r {
        ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsl {
        h: (h * 60.0).rem_euclid(360.0),
        s: s * 100.0,
        l: l * 100.0,
    }
}

fn hsl_to_hex(color: Hsl) -> String {
    let h = color.h;
    let s = color.s / 100.0;
    let l = color.l / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format_hex(to_byte(r1), to_byte(g1), to_byte(b1))
}
