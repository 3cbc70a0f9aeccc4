//! Tone and detail adjustments applied to the source image.
//!
//! [`apply`] is a pure function of `(source, state)`: it always starts from the
//! decoded source and never from a previously filtered raster, so recomputing
//! the same pair yields byte-identical output.

pub mod sharpen;
pub mod tone;

use serde::{Deserialize, Serialize};

use crate::raster::Raster;

pub const CONTRAST_RANGE: (u8, u8) = (0, 200);
pub const BRIGHTNESS_RANGE: (u8, u8) = (0, 200);
pub const OPACITY_RANGE: (u8, u8) = (0, 100);
pub const GRAYSCALE_RANGE: (u8, u8) = (0, 100);
pub const SHARPEN_RANGE: (i16, i16) = (-200, 200);
pub const DETAIL_BOOST_RANGE: (u8, u8) = (0, 100);

/// The full set of tone parameters. Replaced wholesale on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    /// 100 is neutral; below 100 also inverts the image
    pub contrast: u8,
    /// 100 is neutral
    pub brightness: u8,
    /// Alpha scale in percent
    pub opacity_percent: u8,
    /// Desaturation in percent
    pub grayscale_percent: u8,
    /// 0 bypasses the unsharp-mask convolution
    pub sharpen_level: i16,
    /// 0 bypasses the local-contrast pass
    pub detail_boost_level: u8,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl FilterState {
    /// Parameters under which [`apply`] returns its input unchanged
    pub const NEUTRAL: FilterState = FilterState {
        contrast: 100,
        brightness: 100,
        opacity_percent: 100,
        grayscale_percent: 0,
        sharpen_level: 0,
        detail_boost_level: 0,
    };

    /// Returns a copy with every field forced into its allowed range
    pub fn clamped(self) -> Self {
        Self {
            contrast: self.contrast.clamp(CONTRAST_RANGE.0, CONTRAST_RANGE.1),
            brightness: self.brightness.clamp(BRIGHTNESS_RANGE.0, BRIGHTNESS_RANGE.1),
            opacity_percent: self.opacity_percent.clamp(OPACITY_RANGE.0, OPACITY_RANGE.1),
            grayscale_percent: self.grayscale_percent.clamp(GRAYSCALE_RANGE.0, GRAYSCALE_RANGE.1),
            sharpen_level: self.sharpen_level.clamp(SHARPEN_RANGE.0, SHARPEN_RANGE.1),
            detail_boost_level: self
                .detail_boost_level
                .clamp(DETAIL_BOOST_RANGE.0, DETAIL_BOOST_RANGE.1),
        }
    }

    pub fn with_contrast(mut self, contrast: u8) -> Self {
        self.contrast = contrast;
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    pub fn with_opacity(mut self, opacity_percent: u8) -> Self {
        self.opacity_percent = opacity_percent;
        self
    }

    pub fn with_grayscale(mut self, grayscale_percent: u8) -> Self {
        self.grayscale_percent = grayscale_percent;
        self
    }

    pub fn with_sharpen(mut self, sharpen_level: i16) -> Self {
        self.sharpen_level = sharpen_level;
        self
    }

    pub fn with_detail_boost(mut self, detail_boost_level: u8) -> Self {
        self.detail_boost_level = detail_boost_level;
        self
    }

    /// True when the image should be rendered as a negative
    pub fn inverts(&self) -> bool {
        self.contrast < 100
    }

    /// True when the per-pixel tone stages are all at their neutral values
    pub fn tone_is_neutral(&self) -> bool {
        self.contrast == 100
            && self.brightness == 100
            && self.opacity_percent == 100
            && self.grayscale_percent == 0
    }
}

/// Derives the base raster from `source`.
///
/// Tone stages run first, then the optional sharpen passes.
pub fn apply(source: &Raster, state: &FilterState) -> Raster {
    let state = state.clamped();
    let mut base = source.clone();

    if !state.tone_is_neutral() {
        tone::apply_tone(&mut base, &tone::ToneParams::from_state(&state));
    }
    sharpen::apply(&mut base, state.sharpen_level, state.detail_boost_level);

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Raster {
        let mut raster = Raster::transparent(width, height);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 37 + y * 91) % 256) as u8;
                raster.set_pixel(x, y, [v, 255 - v, v / 2, 200]);
            }
        }
        raster
    }

    #[test]
    fn test_neutral_state_is_identity() {
        let source = gradient(7, 5);
        assert_eq!(apply(&source, &FilterState::NEUTRAL), source);
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let source = gradient(9, 6);
        let state = FilterState::NEUTRAL
            .with_contrast(140)
            .with_brightness(80)
            .with_opacity(60)
            .with_grayscale(30)
            .with_sharpen(75)
            .with_detail_boost(20);

        let first = apply(&source, &state);
        let second = apply(&source, &state);
        assert_eq!(first, second);
        assert_ne!(first, source);
    }

    #[test]
    fn test_clamped_pulls_values_into_range() {
        let state = FilterState {
            contrast: 255,
            brightness: 201,
            opacity_percent: 150,
            grayscale_percent: 101,
            sharpen_level: -300,
            detail_boost_level: 250,
        }
        .clamped();

        assert_eq!(state.contrast, 200);
        assert_eq!(state.brightness, 200);
        assert_eq!(state.opacity_percent, 100);
        assert_eq!(state.grayscale_percent, 100);
        assert_eq!(state.sharpen_level, -200);
        assert_eq!(state.detail_boost_level, 100);
    }

    #[test]
    fn test_state_parses_from_partial_json() {
        let state: FilterState = serde_json::from_str(r#"{"brightness": 150}"#).unwrap();
        assert_eq!(state, FilterState::NEUTRAL.with_brightness(150));
    }
}
