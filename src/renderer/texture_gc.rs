//! Idle-texture garbage collection.
//!
//! GPU memory for textures that have not been sampled for a while is
//! released; the CPU descriptor stays, so a later draw transparently
//! re-uploads. Count-based policy: a sweep every `check_period` frames
//! unloads anything idle for `max_idle` frames.

use super::binder::TextureBinder;
use super::device::GpuDevice;

/// When sweeps happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GcMode {
    /// Sweep automatically on the renderer's frame cadence.
    Auto,
    /// Only sweep when [`TextureGarbageCollector::run`] is called.
    Manual,
}

pub struct TextureGarbageCollector {
    /// Frames a texture may go unsampled before its GPU copy is dropped.
    pub max_idle: u64,
    /// Frames between automatic sweeps.
    pub check_period: u64,
    pub mode: GcMode,
}

impl TextureGarbageCollector {
    pub fn new() -> Self {
        Self {
            max_idle: 60 * 60,
            check_period: 600,
            mode: GcMode::Auto,
        }
    }

    /// Per-frame tick; sweeps when the cadence comes due.
    pub(crate) fn update<D: GpuDevice>(&mut self, device: &mut D, binder: &mut TextureBinder) {
        if self.mode != GcMode::Auto {
            return;
        }
        if binder.frame_count % self.check_period != 0 {
            return;
        }
        self.run(device, binder);
    }

    /// Sweep now: drop GPU realizations of idle textures and forget
    /// destroyed bases entirely.
    pub fn run<D: GpuDevice>(&mut self, device: &mut D, binder: &mut TextureBinder) {
        let context = device.context_id();
        let now = binder.frame_count;
        let max_idle = self.max_idle;
        let before = binder.managed.len();

        binder.managed.retain(|base| {
            let mut base = base.borrow_mut();
            if base.destroyed() {
                if let Some((handle, _)) = base.handles.remove(&context) {
                    device.delete_texture(handle);
                }
                base.handles.clear();
                base.tracked = false;
                return false;
            }
            // Render-target-backed bases have no CPU pixels to re-create
            // from; unloading them would lose the contents for good.
            if base.pixels().is_none() {
                return true;
            }
            if base.touched + max_idle <= now {
                if let Some((handle, _)) = base.handles.remove(&context) {
                    device.delete_texture(handle);
                }
            }
            true
        });

        let dropped = before - binder.managed.len();
        if dropped > 0 {
            log::debug!("texture gc released {dropped} destroyed base textures");
        }
    }
}

impl Default for TextureGarbageCollector {
    fn default() -> Self {
        Self::new()
    }
}
