//! Lazy per-context texture realization.

use crate::texture::{SharedBaseTexture, Texture};

use super::device::{GpuDevice, TextureHandle};

/// Resolves a [`Texture`] to a GPU handle for the device's current context,
/// uploading (or re-uploading) from the CPU descriptor when the per-context
/// map has no fresh entry.
///
/// This is the whole context-restore story: a restored device reports a new
/// [`ContextId`](super::device::ContextId), every lookup misses, and the
/// still-valid CPU pixels are uploaded again without caller involvement.
pub struct TextureBinder {
    /// Frames rendered so far; doubles as the texture-GC clock.
    pub(crate) frame_count: u64,
    /// Every base this renderer has realized, for GC and teardown sweeps.
    pub(crate) managed: Vec<SharedBaseTexture>,
}

impl TextureBinder {
    pub(crate) fn new() -> Self {
        Self {
            frame_count: 0,
            managed: Vec::new(),
        }
    }

    /// Resolve `texture` for drawing. Returns `None` for textures that are
    /// not drawable right now (frame not yet valid, source still loading,
    /// or GPU-only contents lost with the old context).
    ///
    /// # Panics
    ///
    /// Panics when the texture or its base was destroyed: sampling freed
    /// resources is lifecycle misuse, not an environmental condition.
    pub fn bind<D: GpuDevice>(&mut self, device: &mut D, texture: &Texture) -> Option<TextureHandle> {
        assert!(!texture.destroyed(), "texture used after destroy");
        assert!(
            !texture.base().borrow().destroyed(),
            "texture's base texture used after destroy"
        );
        if !texture.valid() {
            return None;
        }

        let base_rc = texture.base().clone();
        let mut base = base_rc.borrow_mut();
        base.touched = self.frame_count;
        if !base.tracked {
            base.tracked = true;
            self.managed.push(base_rc.clone());
        }

        let context = device.context_id();
        let update_id = base.update_id();

        if let Some(&(handle, uploaded)) = base.handles.get(&context) {
            if uploaded == update_id {
                return Some(handle);
            }
            // Stale contents for this context: replace the realization.
            device.delete_texture(handle);
        }

        let (width, height, scale_mode) = (base.width(), base.height(), base.scale_mode());
        let Some(pixels) = base.pixels() else {
            // GPU-only contents (render textures) cannot be re-created
            // from CPU state; without a live handle there is nothing to
            // draw, which is a safe no-op.
            return None;
        };
        let handle = device.create_texture(width, height, scale_mode, pixels);
        log::debug!(
            "uploaded {width}x{height} texture as {handle:?} for context {context:?}"
        );
        base.handles.insert(context, (handle, update_id));
        Some(handle)
    }
}
