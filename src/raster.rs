use std::sync::Arc;

use image::RgbaImage;

/// Bytes per RGBA pixel
pub const CHANNELS: usize = 4;

/// A 2-D grid of unmultiplied RGBA8 pixels, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// The decoded upload. Shared read-only between the session and the filter worker.
pub type SourceImage = Arc<Raster>;

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl Raster {
    /// Creates a fully transparent raster
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Creates a raster where every pixel is `rgba`
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * CHANNELS);
        for _ in 0..len {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, data }
    }

    /// Wraps an existing buffer. Returns `None` if the length doesn't match the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * CHANNELS {
            log::error!(
                "Raster data size mismatch: expected {} bytes, got {} bytes",
                width as usize * height as usize * CHANNELS,
                data.len()
            );
            return None;
        }
        Some(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Returns the pixel at (x, y), or `None` outside the raster
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Returns the pixel nearest to (x, y), replicating edge pixels for out-of-range coordinates
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [u8; 4] {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        let i = self.offset(cx, cy);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// True if every pixel has zero alpha
    pub fn is_fully_transparent(&self) -> bool {
        self.data.chunks_exact(CHANNELS).all(|p| p[3] == 0)
    }

    /// Resets every pixel to transparent black
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length is validated on construction, so this cannot fail.
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    /// Converts to an egui image for texture upload
    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgba_unmultiplied(
            [self.width as usize, self.height as usize],
            &self.data,
        )
    }

    /// Approximate heap footprint in bytes
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }
}
