use photo_markup::filter::{self, FilterState};
use photo_markup::raster::Raster;

fn gradient(width: u32, height: u32) -> Raster {
    let mut raster = Raster::transparent(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 255) / width.max(1)) as u8;
            let w = ((y * 255) / height.max(1)) as u8;
            raster.set_pixel(x, y, [v, w, 255 - v, 255]);
        }
    }
    raster
}

#[test]
fn test_neutral_state_is_identity() {
    let source = gradient(16, 9);
    assert_eq!(filter::apply(&source, &FilterState::NEUTRAL), source);
}

#[test]
fn test_apply_never_touches_source() {
    let source = gradient(8, 8);
    let copy = source.clone();
    let state = FilterState::NEUTRAL
        .with_contrast(40)
        .with_brightness(170)
        .with_grayscale(60)
        .with_sharpen(120)
        .with_detail_boost(50);
    let _ = filter::apply(&source, &state);
    assert_eq!(source, copy);
}

#[test]
fn test_base_depends_only_on_source_and_state() {
    let source = gradient(12, 12);
    let target = FilterState::NEUTRAL.with_brightness(130).with_sharpen(60);

    // Walking through intermediate states must not accumulate drift.
    let direct = filter::apply(&source, &target);
    for brightness in [50, 180, 90] {
        let _ = filter::apply(&source, &FilterState::NEUTRAL.with_brightness(brightness));
    }
    let base = filter::apply(&source, &target);
    assert_eq!(base, direct);
    assert_eq!(base.size(), source.size());
}

#[test]
fn test_brightness_on_red() {
    let source = Raster::filled(10, 10, [120, 0, 0, 255]);
    let base = filter::apply(&source, &FilterState::NEUTRAL.with_brightness(150));

    let first = base.pixel(0, 0).unwrap();
    assert!(first[0] > 120);
    for y in 0..10 {
        for x in 0..10 {
            let [r, g, b, a] = base.pixel(x, y).unwrap();
            assert_eq!(r, first[0]);
            assert_eq!((g, b, a), (0, 0, 255));
        }
    }
}

#[test]
fn test_saturated_red_stays_red_when_brightened() {
    let source = Raster::filled(10, 10, [255, 0, 0, 255]);
    let base = filter::apply(&source, &FilterState::NEUTRAL.with_brightness(150));
    assert!(base.data().chunks(4).all(|p| p == [255, 0, 0, 255]));
}

#[test]
fn test_out_of_range_state_is_clamped() {
    let source = gradient(6, 6);
    let wild = FilterState {
        contrast: 255,
        brightness: 255,
        opacity_percent: 250,
        grayscale_percent: 101,
        sharpen_level: -999,
        detail_boost_level: 200,
    };
    assert_eq!(
        filter::apply(&source, &wild),
        filter::apply(&source, &wild.clamped())
    );
}

#[test]
fn test_zero_opacity_clears_alpha_only() {
    let source = Raster::filled(4, 4, [10, 20, 30, 255]);
    let base = filter::apply(&source, &FilterState::NEUTRAL.with_opacity(0));
    assert!(base.data().chunks(4).all(|p| p == [10, 20, 30, 0]));
}

#[test]
fn test_zero_sharpen_levels_bypass_pass() {
    let source = gradient(10, 10);
    let base = filter::apply(&source, &FilterState::NEUTRAL.with_sharpen(0).with_detail_boost(0));
    assert_eq!(base, source);
}

#[test]
fn test_single_pixel_image() {
    let source = Raster::filled(1, 1, [90, 90, 90, 255]);
    let state = FilterState::NEUTRAL.with_sharpen(200).with_detail_boost(100);
    let base = filter::apply(&source, &state);
    assert_eq!(base.size(), [1, 1]);
}
