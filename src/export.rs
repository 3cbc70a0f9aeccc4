use std::sync::Arc;

use image::codecs::png::PngEncoder;
use image::error::{LimitError, LimitErrorKind};
use image::{ExtendedColorType, ImageEncoder, ImageError};

use crate::error::{EditorError, EditorResult};
use crate::raster::{Raster, SourceImage};

/// Decodes uploaded bytes (PNG, JPEG, ...) into an RGBA source image.
pub fn decode(bytes: &[u8]) -> EditorResult<SourceImage> {
    let image = image::load_from_memory(bytes).map_err(EditorError::Decode)?;
    log::debug!("Successfully decoded image: {}x{}", image.width(), image.height());

    if image.width() == 0 || image.height() == 0 {
        return Err(EditorError::Decode(ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::DimensionError,
        ))));
    }
    Ok(Arc::new(Raster::from_rgba_image(image.to_rgba8())))
}

/// Encodes a raster as PNG into a byte buffer.
pub fn encode_png(raster: &Raster) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            raster.data(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(EditorError::Encode)?;
    log::debug!(
        "Encoded {}x{} PNG ({} bytes)",
        raster.width(),
        raster.height(),
        bytes.len()
    );
    Ok(bytes)
}
