//! 3x3 neighbourhood passes run after the tone stages.
//!
//! Both passes read from an immutable snapshot of their input and write rows in
//! parallel, so no pixel ever sees an already-written neighbour. Borders
//! replicate the nearest in-bounds pixel.

use rayon::prelude::*;

use crate::raster::{CHANNELS, Raster};

/// Runs the unsharp mask and then the detail boost. Each pass is skipped
/// entirely when its level is 0.
pub fn apply(raster: &mut Raster, sharpen_level: i16, detail_boost_level: u8) {
    if sharpen_level != 0 {
        unsharp_mask(raster, sharpen_level);
    }
    if detail_boost_level != 0 {
        detail_boost(raster, detail_boost_level);
    }
}

/// Kernel for the unsharp mask: -1 everywhere except a `9 + level / 50` centre.
pub fn sharpen_kernel(level: i16) -> [f32; 9] {
    let mut kernel = [-1.0; 9];
    kernel[4] = 9.0 + level as f32 / 50.0;
    kernel
}

/// Convolves the RGB channels with [`sharpen_kernel`]. Alpha is copied through.
pub fn unsharp_mask(raster: &mut Raster, level: i16) {
    let kernel = sharpen_kernel(level);
    log::debug!("Unsharp mask level {} (centre weight {})", level, kernel[4]);

    map_neighbourhoods(raster, |neighbours, out| {
        for c in 0..3 {
            let sum: f32 = neighbours
                .iter()
                .zip(kernel.iter())
                .map(|(px, w)| px[c] as f32 * w)
                .sum();
            out[c] = clamp_channel(sum);
        }
        out[3] = neighbours[4][3];
    });
}

/// Pushes each channel away from its 3x3 average, relative to the midpoint of
/// the channel and the pixel's alpha. The push is `level` times the difference.
pub fn detail_boost(raster: &mut Raster, level: u8) {
    let amount = level as f32;
    log::debug!("Detail boost level {}", level);

    map_neighbourhoods(raster, |neighbours, out| {
        let centre = neighbours[4];
        let alpha = centre[3] as f32;
        for c in 0..3 {
            let average = neighbours.iter().map(|px| px[c] as f32).sum::<f32>() / 9.0;
            let reference = (centre[c] as f32 + alpha) / 2.0;
            out[c] = clamp_channel(reference + amount * (reference - average));
        }
        out[3] = centre[3];
    });
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Calls `f` for every pixel with its 3x3 neighbourhood in row-major order
/// (index 4 is the pixel itself), taken from a snapshot of the input.
fn map_neighbourhoods<F>(raster: &mut Raster, f: F)
where
    F: Fn(&[[u8; 4]; 9], &mut [u8]) + Sync,
{
    if raster.width() == 0 || raster.height() == 0 {
        return;
    }
    let snapshot = raster.clone();
    let stride = raster.stride();

    raster
        .data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            for (x, out) in row.chunks_exact_mut(CHANNELS).enumerate() {
                let x = x as i64;
                let mut neighbours = [[0u8; 4]; 9];
                for (i, (dx, dy)) in OFFSETS.iter().enumerate() {
                    neighbours[i] = snapshot.pixel_clamped(x + dx, y + dy);
                }
                f(&neighbours, out);
            }
        });
}

const OFFSETS: [(i64, i64); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn dot_image() -> Raster {
        let mut raster = Raster::filled(5, 5, [20, 40, 60, 255]);
        raster.set_pixel(2, 2, [200, 180, 160, 255]);
        raster
    }

    #[test]
    fn test_zero_levels_bypass() {
        let mut raster = dot_image();
        apply(&mut raster, 0, 0);
        assert_eq!(raster, dot_image());
    }

    #[test]
    fn test_kernel_centre_weight() {
        assert_eq!(sharpen_kernel(0)[4], 9.0);
        assert_eq!(sharpen_kernel(100)[4], 11.0);
        assert_eq!(sharpen_kernel(-200)[4], 5.0);
        assert_eq!(sharpen_kernel(50).iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_flat_image_scales_uniformly_including_borders() {
        // Kernel sums to 1 + level / 50, and edge replication keeps borders identical.
        let mut raster = Raster::filled(4, 3, [100, 50, 0, 128]);
        unsharp_mask(&mut raster, 50);
        assert_eq!(raster, Raster::filled(4, 3, [200, 100, 0, 128]));

        let mut raster = Raster::filled(4, 3, [100, 50, 0, 128]);
        unsharp_mask(&mut raster, -50);
        assert_eq!(raster, Raster::filled(4, 3, [0, 0, 0, 128]));
    }

    #[test]
    fn test_unsharp_mask_reads_snapshot() {
        let mut raster = dot_image();
        unsharp_mask(&mut raster, 10);

        // Neighbours on either side of the dot see the same untouched input.
        assert_eq!(raster.pixel(1, 2), raster.pixel(3, 2));
        assert_eq!(raster.pixel(2, 1), raster.pixel(2, 3));
        assert_eq!(raster.pixel(2, 2), Some([255, 255, 255, 255]));
        // Far from the dot the kernel just scales by 1 + 10 / 50.
        assert_eq!(raster.pixel(0, 0), Some([24, 48, 72, 255]));
    }

    #[test]
    fn test_detail_boost_on_flat_region() {
        // reference = (55 + 255) / 2 = 155, pushed 1 * (155 - 55) further, clamped
        let mut raster = Raster::filled(3, 3, [55, 55, 55, 255]);
        detail_boost(&mut raster, 1);
        assert_eq!(raster, Raster::filled(3, 3, [255, 255, 255, 255]));

        // reference = (100 + 104) / 2 = 102
        let mut raster = Raster::filled(3, 3, [100, 100, 100, 104]);
        detail_boost(&mut raster, 1);
        assert_eq!(raster, Raster::filled(3, 3, [104, 104, 104, 104]));

        let mut raster = Raster::filled(3, 3, [100, 100, 100, 104]);
        detail_boost(&mut raster, 3);
        assert_eq!(raster, Raster::filled(3, 3, [108, 108, 108, 104]));
    }

    #[test]
    fn test_detail_boost_matches_formula_at_edge_of_dot() {
        let mut raster = dot_image();
        detail_boost(&mut raster, 1);
        // (1, 2): reference (20 + 255) / 2 = 137.5, average (8 * 20 + 200) / 9 = 40
        // 137.5 + (137.5 - 40) = 235
        assert_eq!(raster.pixel(1, 2).map(|p| p[0]), Some(235));
        // Centre: reference (200 + 255) / 2 = 227.5, average 40 -> clamps
        assert_eq!(raster.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_detail_boost_is_symmetric_around_dot() {
        let mut raster = dot_image();
        detail_boost(&mut raster, 30);
        assert_eq!(raster.pixel(1, 2), raster.pixel(3, 2));
        assert_eq!(raster.pixel(1, 1), raster.pixel(3, 3));
        assert_eq!(raster.pixel(2, 2).map(|p| p[3]), Some(255));
    }
}
