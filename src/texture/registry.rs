//! Identity-keyed texture cache.
//!
//! The registry is the process-wide "load once by source string" cache,
//! made an explicit value instead of a module-level singleton so tests and
//! embedders control its lifetime. Entries are populated on first use and
//! evicted only on explicit removal.

use std::collections::HashMap;

use crate::math::Rectangle;

use super::base::BaseTexture;
use super::texture::Texture;

/// What kind of pixel source a path names, sniffed from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Image,
    Video,
}

/// Classify a source path. Anything that is not a known video container is
/// treated as a still image and handed to the decoder.
pub fn sniff_source_kind(path: &str) -> SourceKind {
    let ext = path
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" | "webm" | "ogv" => SourceKind::Video,
        _ => SourceKind::Image,
    }
}

/// Shared cache mapping source identity strings to textures.
#[derive(Default)]
pub struct TextureRegistry {
    cache: HashMap<String, Texture>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a texture by source path: cache hit, or decode-and-cache.
    ///
    /// Image sources decode synchronously; a decode failure is logged and
    /// yields `None` (an environmental condition, not a panic). Video
    /// sources get an unloaded base texture that the embedder later feeds
    /// frames into; they resolve immediately but stay invalid until then.
    pub fn from_path(&mut self, path: &str) -> Option<Texture> {
        if let Some(existing) = self.cache.get(path) {
            return Some(existing.clone());
        }

        let texture = match sniff_source_kind(path) {
            SourceKind::Image => {
                let img = match image::open(path) {
                    Ok(img) => img.to_rgba8(),
                    Err(err) => {
                        log::error!("failed to decode image {path}: {err}");
                        return None;
                    }
                };
                let (width, height) = img.dimensions();
                let base = BaseTexture::from_pixels(width, height, img.into_raw());
                Texture::from_base(base)
            }
            SourceKind::Video => Texture::from_base(BaseTexture::pending(path)),
        };

        self.cache.insert(path.to_string(), texture.clone());
        Some(texture)
    }

    /// Register a decoded RGBA8 buffer under an identity key, e.g. for
    /// sources the embedder decodes itself.
    pub fn insert_pixels(&mut self, key: &str, width: u32, height: u32, pixels: Vec<u8>) -> Texture {
        let texture = Texture::from_base(BaseTexture::from_pixels(width, height, pixels));
        self.cache.insert(key.to_string(), texture.clone());
        texture
    }

    /// Register a sub-frame of an existing cached texture under a new key
    /// (sprite-sheet entries).
    pub fn insert_frame(&mut self, key: &str, source: &Texture, frame: Rectangle) -> Texture {
        let texture = source.new_from_frame(frame);
        self.cache.insert(key.to_string(), texture.clone());
        texture
    }

    pub fn get(&self, key: &str) -> Option<&Texture> {
        self.cache.get(key)
    }

    /// Explicit eviction; cached textures are never silently expired.
    pub fn remove(&mut self, key: &str) -> Option<Texture> {
        self.cache.remove(key)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
