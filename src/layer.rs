use egui::{Pos2, Rect, pos2};
use uuid::Uuid;

use crate::raster::{CHANNELS, Raster};

/// The single freehand annotation layer drawn over the filtered base image.
///
/// The raster is the source of truth: strokes are rasterized as they arrive and
/// are not kept around afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationLayer {
    /// Unique identifier for the layer
    id: Uuid,
    raster: Raster,
    /// Bumped on every pixel change, used for texture cache invalidation
    version: u64,
    /// Open pencil stroke, if any
    stroke: Option<StrokeCoverage>,
}

/// Pixels from before the open stroke and the highest coverage each pixel
/// has received from it so far
#[derive(Debug, Clone, PartialEq)]
struct StrokeCoverage {
    before: Raster,
    coverage: Vec<f32>,
}

impl AnnotationLayer {
    /// Creates a transparent layer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            raster: Raster::transparent(width, height),
            version: 0,
            stroke: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn size(&self) -> [u32; 2] {
        self.raster.size()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Copies the current pixels, e.g. for a history entry
    pub fn snapshot(&self) -> Raster {
        self.raster.clone()
    }

    /// Replaces the pixels with `raster`, returning the previous pixels.
    ///
    /// Returns `Err(raster)` untouched if the sizes differ. Ends any open stroke.
    pub fn restore(&mut self, raster: Raster) -> Result<Raster, Raster> {
        if raster.size() != self.raster.size() {
            return Err(raster);
        }
        self.stroke = None;
        self.version += 1;
        Ok(std::mem::replace(&mut self.raster, raster))
    }

    /// Makes every pixel transparent
    pub fn clear(&mut self) {
        self.raster.clear();
        if let Some(stroke) = &mut self.stroke {
            stroke.before.clear();
            stroke.coverage.fill(0.0);
        }
        self.version += 1;
    }

    /// Starts accumulating pencil coverage for one stroke.
    ///
    /// Until [`end_stroke`](Self::end_stroke), overlapping segments (the joins
    /// between pointer moves) blend each pixel once at its highest coverage
    /// instead of compounding translucent colour.
    pub fn begin_stroke(&mut self) {
        let [w, h] = self.raster.size();
        self.stroke = Some(StrokeCoverage {
            before: self.raster.clone(),
            coverage: vec![0.0; w as usize * h as usize],
        });
    }

    /// Finishes the open stroke, returning the pixels from before it started.
    pub fn end_stroke(&mut self) -> Option<Raster> {
        self.stroke.take().map(|stroke| stroke.before)
    }

    pub fn in_stroke(&self) -> bool {
        self.stroke.is_some()
    }

    /// Composites a round-capped line segment with source-over blending.
    ///
    /// Edge pixels get fractional coverage so the line is antialiased.
    pub fn draw_segment(&mut self, from: Pos2, to: Pos2, color: [u8; 4], width: f32) {
        let radius = width.max(0.0) / 2.0;
        let alpha = color[3] as f32 / 255.0;
        let Self { raster, stroke, .. } = &mut *self;

        let painted = match stroke {
            Some(stroke) => {
                let StrokeCoverage { before, coverage } = stroke;
                for_each_covered(raster, from, to, radius, |index, pixel, cov| {
                    if cov <= coverage[index] {
                        return;
                    }
                    coverage[index] = cov;
                    let i = index * CHANNELS;
                    pixel.copy_from_slice(&before.data()[i..i + CHANNELS]);
                    blend_source_over(pixel, color, alpha * cov);
                })
            }
            None => for_each_covered(raster, from, to, radius, |_, pixel, cov| {
                blend_source_over(pixel, color, alpha * cov);
            }),
        };
        if painted {
            self.version += 1;
        }
    }

    /// Clears every pixel the same-width pencil segment would touch.
    pub fn erase_segment(&mut self, from: Pos2, to: Pos2, width: f32) {
        let radius = width.max(0.0) / 2.0;
        let erased = for_each_covered(&mut self.raster, from, to, radius, |_, pixel, _| {
            pixel.fill(0);
        });
        if erased {
            self.version += 1;
        }
    }
}

/// Visits pixels whose centre lies within `radius + 0.5` of the segment, with
/// their pixel index and coverage. Returns whether any pixel was visited.
fn for_each_covered<F>(raster: &mut Raster, from: Pos2, to: Pos2, radius: f32, mut f: F) -> bool
where
    F: FnMut(usize, &mut [u8], f32),
{
    let Some(bounds) = clip_to_raster(raster.size(), segment_bounds(from, to, radius + 1.0)) else {
        return false;
    };
    let width = raster.width() as usize;
    let data = raster.data_mut();
    let mut touched = false;

    for y in bounds.min.y as usize..bounds.max.y as usize {
        for x in bounds.min.x as usize..bounds.max.x as usize {
            let centre = pos2(x as f32 + 0.5, y as f32 + 0.5);
            let coverage = (radius + 0.5 - distance_to_segment(centre, from, to)).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let index = y * width + x;
            let i = index * CHANNELS;
            f(index, &mut data[i..i + CHANNELS], coverage);
            touched = true;
        }
    }
    touched
}

fn clip_to_raster([w, h]: [u32; 2], rect: Rect) -> Option<Rect> {
    let clipped = Rect::from_min_max(
        pos2(rect.min.x.floor().max(0.0), rect.min.y.floor().max(0.0)),
        pos2(rect.max.x.ceil().min(w as f32), rect.max.y.ceil().min(h as f32)),
    );
    (clipped.min.x < clipped.max.x && clipped.min.y < clipped.max.y).then_some(clipped)
}

fn segment_bounds(from: Pos2, to: Pos2, padding: f32) -> Rect {
    Rect::from_two_pos(from, to).expand(padding)
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Blends `src` (with effective alpha `src_alpha`) over an unmultiplied RGBA pixel.
pub(crate) fn blend_source_over(dst: &mut [u8], src: [u8; 4], src_alpha: f32) {
    if src_alpha <= 0.0 {
        return;
    }
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        dst.fill(0);
        return;
    }
    for c in 0..3 {
        let value = (src[c] as f32 * src_alpha + dst[c] as f32 * dst_alpha * (1.0 - src_alpha))
            / out_alpha;
        dst[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}
