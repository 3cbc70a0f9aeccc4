use rayon::prelude::*;

use super::FilterState;
use crate::raster::{CHANNELS, Raster};

/// Rec. 709 luma weights
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Per-pixel coefficients derived once from a [`FilterState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    /// Scale applied around the 128 midpoint. 1.0 at contrast 100.
    pub contrast_factor: f32,
    /// Relative brightness shift. 0.0 at brightness 100.
    pub brightness_shift: f32,
    /// Alpha multiplier
    pub alpha_scale: f32,
    /// Blend amount towards luma
    pub grayscale: f32,
    /// Negative-image toggle
    pub invert: bool,
}

impl ToneParams {
    pub fn from_state(state: &FilterState) -> Self {
        let contrast = state.contrast as f32;
        Self {
            contrast_factor: 1.0 - (contrast - 100.0).abs() / 100.0,
            brightness_shift: (state.brightness as f32 - 100.0) / 100.0,
            alpha_scale: state.opacity_percent as f32 / 100.0,
            grayscale: state.grayscale_percent as f32 / 100.0,
            invert: state.inverts(),
        }
    }
}

/// Applies contrast, brightness, opacity, grayscale and inversion, in that order.
pub fn apply_tone(raster: &mut Raster, params: &ToneParams) {
    raster
        .data_mut()
        .par_chunks_mut(CHANNELS)
        .for_each(|pixel| tone_pixel(pixel, params));
}

fn tone_pixel(pixel: &mut [u8], params: &ToneParams) {
    let mut rgb = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];

    for v in &mut rgb {
        *v = params.contrast_factor * (*v - 128.0) + 128.0;
        *v = (*v + *v * params.brightness_shift).clamp(0.0, 255.0);
    }

    if params.grayscale > 0.0 {
        let luma = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];
        for v in &mut rgb {
            *v += (luma - *v) * params.grayscale;
        }
    }

    if params.invert {
        for v in &mut rgb {
            *v = 255.0 - *v;
        }
    }

    for (dst, v) in pixel.iter_mut().zip(rgb) {
        *dst = v.round().clamp(0.0, 255.0) as u8;
    }
    pixel[3] = (pixel[3] as f32 * params.alpha_scale).round().clamp(0.0, 255.0) as u8;
}
