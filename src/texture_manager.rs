use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;
use uuid::Uuid;

use crate::error::EditorError;

/// Errors that can occur during texture generation
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("No image loaded")]
    NotReady,
    #[error("Invalid texture dimensions {0:?}")]
    InvalidDimensions([usize; 2]),
    #[error("Failed to render preview: {0}")]
    Render(#[source] EditorError),
}

type CacheKey = (Uuid, u64);

/// Caches preview textures per surface and content version.
///
/// A surface is anything with a stable id and a version counter that is bumped
/// on every pixel change, e.g. the annotation layer or a composited preview.
pub struct TextureManager {
    texture_cache: HashMap<CacheKey, TextureHandle>,
    /// Frame each texture was last requested in
    last_used: HashMap<CacheKey, u64>,
    current_frame: u64,
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("cached", &self.texture_cache.len())
            .field("current_frame", &self.current_frame)
            .field("max_cache_size", &self.max_cache_size)
            .finish()
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size: max_cache_size.max(1),
        }
    }

    /// Should be called at the start of each displayed frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Returns the texture for `(surface, version)`, running `generator` only on a cache miss.
    pub fn get_or_create_texture<F>(
        &mut self,
        surface: Uuid,
        version: u64,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        let key = (surface, version);
        if let Some(handle) = self.texture_cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }

        let image = generator()?;
        if image.size[0] == 0 || image.size[1] == 0 {
            return Err(TextureGenerationError::InvalidDimensions(image.size));
        }

        // Older versions of the same surface will never be asked for again.
        self.invalidate_surface(surface);
        self.prune_cache_if_needed();

        let name = format!("surface_{}_v{}", surface, version);
        let handle = ctx.load_texture(name, image, TextureOptions::NEAREST);
        let id = handle.id();
        self.texture_cache.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        Ok(id)
    }

    /// Drops every cached version of `surface`
    pub fn invalidate_surface(&mut self, surface: Uuid) {
        self.texture_cache.retain(|(id, _), _| *id != surface);
        self.last_used.retain(|(id, _), _| *id != surface);
    }

    /// Evicts least recently used textures to make room for one more
    fn prune_cache_if_needed(&mut self) {
        while self.texture_cache.len() >= self.max_cache_size {
            let Some(oldest) = self
                .last_used
                .iter()
                .min_by_key(|(_, frame)| **frame)
                .map(|(key, _)| *key)
            else {
                break;
            };
            self.texture_cache.remove(&oldest);
            self.last_used.remove(&oldest);
        }
    }

    pub fn clear_cache(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    pub fn contains(&self, surface: Uuid, version: u64) -> bool {
        self.texture_cache.contains_key(&(surface, version))
    }
}
