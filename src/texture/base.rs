//! CPU-side texture resource, the source of truth for GPU uploads.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::renderer::device::{ContextId, TextureHandle};

/// Sampling filter used when the texture is stretched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScaleMode {
    #[default]
    Linear,
    Nearest,
}

/// Shared handle to a [`BaseTexture`]. Many `Texture`s may alias one base
/// (a sprite sheet); the base lives as long as its longest holder.
pub type SharedBaseTexture = Rc<RefCell<BaseTexture>>;

/// The GPU-resource-owning half of the texture pipeline.
///
/// One `BaseTexture` exists per unique pixel source. The decoded RGBA bytes
/// kept here are the durable descriptor; GPU handles are a disposable cache
/// keyed by [`ContextId`], because one logical texture may be realized in
/// several GPU contexts over its lifetime (context loss, multiple
/// renderers). Never assume one GPU handle per texture.
#[derive(Debug)]
pub struct BaseTexture {
    width: u32,
    height: u32,
    resolution: f32,
    scale_mode: ScaleMode,
    pixels: Option<Vec<u8>>,
    loaded: bool,
    destroyed: bool,
    update_id: u32,
    source_id: Option<String>,

    /// Per-context GPU realizations, each tagged with the `update_id` it
    /// was uploaded at so stale handles are replaced, not reused.
    pub(crate) handles: HashMap<ContextId, (TextureHandle, u32)>,
    /// Frame number of the last draw that sampled this base (texture GC).
    pub(crate) touched: u64,
    /// Whether the renderer already tracks this base for GC/restore.
    pub(crate) tracked: bool,
}

impl BaseTexture {
    /// Create a loaded base from decoded RGBA8 pixels.
    ///
    /// # Panics
    ///
    /// Panics when `pixels.len() != width * height * 4`; a mis-sized pixel
    /// buffer is a programming error.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> SharedBaseTexture {
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "pixel buffer does not match {width}x{height} RGBA8"
        );
        Rc::new(RefCell::new(Self {
            width,
            height,
            resolution: 1.0,
            scale_mode: ScaleMode::default(),
            pixels: Some(pixels),
            loaded: true,
            destroyed: false,
            update_id: 0,
            source_id: None,
            handles: HashMap::new(),
            touched: 0,
            tracked: false,
        }))
    }

    /// Create an unloaded base whose source decodes asynchronously
    /// (e.g. a video element). Rendering it is a safe no-op until
    /// [`set_loaded_pixels`](Self::set_loaded_pixels) fires.
    pub fn pending(source_id: impl Into<String>) -> SharedBaseTexture {
        Rc::new(RefCell::new(Self {
            width: 0,
            height: 0,
            resolution: 1.0,
            scale_mode: ScaleMode::default(),
            pixels: None,
            loaded: false,
            destroyed: false,
            update_id: 0,
            source_id: Some(source_id.into()),
            handles: HashMap::new(),
            touched: 0,
            tracked: false,
        }))
    }

    /// Complete the one-shot Unloaded → Loaded transition.
    ///
    /// # Panics
    ///
    /// Panics if the base is already loaded (the transition is terminal)
    /// or destroyed.
    pub fn set_loaded_pixels(&mut self, width: u32, height: u32, pixels: Vec<u8>) {
        self.assert_alive();
        assert!(
            !self.loaded,
            "base texture {:?} already loaded; the loaded transition is one-shot",
            self.source_id
        );
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "pixel buffer does not match {width}x{height} RGBA8"
        );
        self.width = width;
        self.height = height;
        self.pixels = Some(pixels);
        self.loaded = true;
        self.update_id = self.update_id.wrapping_add(1);
    }

    /// Replace the pixel contents (same or new dimensions). Existing GPU
    /// handles become stale and re-upload on next bind.
    pub fn update_pixels(&mut self, width: u32, height: u32, pixels: Vec<u8>) {
        self.assert_alive();
        assert!(self.loaded, "update_pixels on an unloaded base texture");
        assert_eq!(
            pixels.len(),
            (width * height * 4) as usize,
            "pixel buffer does not match {width}x{height} RGBA8"
        );
        self.width = width;
        self.height = height;
        self.pixels = Some(pixels);
        self.update_id = self.update_id.wrapping_add(1);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Change the sampling mode. Bumps the upload version so every context
    /// re-creates its handle with the new sampler.
    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        if self.scale_mode != mode {
            self.scale_mode = mode;
            self.update_id = self.update_id.wrapping_add(1);
        }
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn update_id(&self) -> u32 {
        self.update_id
    }

    pub(crate) fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    /// Mark a base created from a render target: loaded, with a GPU
    /// handle but no CPU pixels (its contents only exist on the GPU).
    pub(crate) fn from_render_target(
        width: u32,
        height: u32,
        scale_mode: ScaleMode,
        context: ContextId,
        handle: TextureHandle,
    ) -> SharedBaseTexture {
        let mut handles = HashMap::new();
        handles.insert(context, (handle, 0));
        Rc::new(RefCell::new(Self {
            width,
            height,
            resolution: 1.0,
            scale_mode,
            pixels: None,
            loaded: true,
            destroyed: false,
            update_id: 0,
            source_id: None,
            handles,
            touched: 0,
            tracked: false,
        }))
    }

    /// Drop the CPU descriptor and tombstone the base. GPU handles are
    /// reclaimed by the renderer's managed-texture sweep.
    pub fn destroy(&mut self) {
        self.assert_alive();
        self.destroyed = true;
        self.loaded = false;
        self.pixels = None;
    }

    pub(crate) fn assert_alive(&self) {
        assert!(
            !self.destroyed,
            "base texture {:?} used after destroy",
            self.source_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_transition_is_one_shot() {
        let base = BaseTexture::pending("clip.webm");
        {
            let mut b = base.borrow_mut();
            assert!(!b.loaded());
            b.set_loaded_pixels(2, 2, vec![0; 16]);
            assert!(b.loaded());
            assert_eq!(b.width(), 2);
        }
    }

    #[test]
    #[should_panic(expected = "one-shot")]
    fn test_double_load_panics() {
        let base = BaseTexture::pending("clip.webm");
        let mut b = base.borrow_mut();
        b.set_loaded_pixels(1, 1, vec![0; 4]);
        b.set_loaded_pixels(1, 1, vec![0; 4]);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_bad_pixel_length_panics() {
        BaseTexture::from_pixels(2, 2, vec![0; 3]);
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn test_use_after_destroy_panics() {
        let base = BaseTexture::from_pixels(1, 1, vec![0; 4]);
        let mut b = base.borrow_mut();
        b.destroy();
        b.update_pixels(1, 1, vec![0; 4]);
    }

    #[test]
    fn test_update_bumps_version() {
        let base = BaseTexture::from_pixels(1, 1, vec![255; 4]);
        let mut b = base.borrow_mut();
        let before = b.update_id();
        b.update_pixels(1, 1, vec![0; 4]);
        assert_ne!(b.update_id(), before);
    }
}
