//! Merging the filtered base and the annotation layer.
//!
//! Export always happens at the source resolution; the viewport only affects
//! the preview raster handed to the display.

use egui::{Pos2, Vec2, pos2};
use image::imageops::{self, FilterType};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::layer::blend_source_over;
use crate::raster::{CHANNELS, Raster};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;

/// On-screen presentation state. Never touches pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    zoom: f32,
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(zoom: f32, pan: Vec2) -> Self {
        let mut viewport = Self { zoom: 1.0, pan };
        viewport.set_zoom(zoom);
        viewport
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Sets the zoom factor, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`]
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };
    }

    /// Maps a point on screen (relative to the canvas origin) to image pixels
    pub fn screen_to_image(&self, screen: Pos2) -> Pos2 {
        pos2(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    /// Maps image pixels to a point on screen
    pub fn image_to_screen(&self, image: Pos2) -> Pos2 {
        pos2(
            image.x * self.zoom + self.pan.x,
            image.y * self.zoom + self.pan.y,
        )
    }

    /// Size of the preview for an image of `size` pixels
    pub fn scaled_size(&self, size: [u32; 2]) -> [u32; 2] {
        let scale = |v: u32| ((v as f32 * self.zoom).round() as u32).max(1);
        [scale(size[0]), scale(size[1])]
    }
}

/// Draws `annotation` over `base` (source-over) at native resolution.
///
/// The inputs must be the same size; any region of `annotation` outside `base` is ignored.
pub fn export(base: &Raster, annotation: &Raster) -> Raster {
    let mut out = base.clone();
    if annotation.size() != base.size() {
        log::error!(
            "Compositing {:?} annotation over {:?} base",
            annotation.size(),
            base.size()
        );
        return out;
    }
    out.data_mut()
        .par_chunks_mut(CHANNELS)
        .zip(annotation.data().par_chunks(CHANNELS))
        .for_each(|(dst, src)| {
            blend_source_over(dst, [src[0], src[1], src[2], src[3]], src[3] as f32 / 255.0);
        });
    out
}

/// Composites both layers and scales the result by the viewport zoom for display.
pub fn render_preview(base: &Raster, annotation: &Raster, viewport: &Viewport) -> Raster {
    let composite = export(base, annotation);
    let [width, height] = viewport.scaled_size(composite.size());
    if [width, height] == composite.size() {
        return composite;
    }
    let filter = if viewport.zoom() > 1.0 {
        FilterType::Nearest
    } else {
        FilterType::Triangle
    };
    Raster::from_rgba_image(imageops::resize(&composite.to_rgba_image(), width, height, filter))
}

/// Flattens a raster onto an opaque background colour, e.g. paper for printing.
pub fn flatten_onto(raster: &Raster, background: [u8; 3]) -> Raster {
    let mut out = Raster::filled(
        raster.width(),
        raster.height(),
        [background[0], background[1], background[2], 255],
    );
    out.data_mut()
        .par_chunks_mut(CHANNELS)
        .zip(raster.data().par_chunks(CHANNELS))
        .for_each(|(dst, src)| {
            blend_source_over(dst, [src[0], src[1], src[2], src[3]], src[3] as f32 / 255.0);
        });
    out
}
