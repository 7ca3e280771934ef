//! Object-renderer plugin protocol.

use crate::math::Matrix;
use crate::scene::{NodeId, Scene};

use super::binder::TextureBinder;
use super::device::GpuDevice;

/// Which plugin is currently active in the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PluginKind {
    /// No plugin started yet (or between frames).
    #[default]
    None,
    Sprite,
    Graphics,
    Mesh,
    Tiling,
}

/// Protocol every object renderer implements.
///
/// The renderer core guarantees the call order: `start` when the plugin
/// becomes active, any number of `render_node`/`flush` calls, then `stop`
/// (which must flush) before another plugin starts or the target/shader
/// changes. Geometry handed to `render_node` may be buffered until the next
/// flush boundary; anything else is the plugin's own business.
pub trait ObjectRenderer<D: GpuDevice> {
    /// Prepare shader/state for this plugin's draws.
    fn start(&mut self, device: &mut D);

    /// Flush and release; the plugin is no longer active afterwards.
    fn stop(&mut self, device: &mut D);

    /// Force-submit any pending batch without deactivating.
    fn flush(&mut self, device: &mut D);

    /// Consume one node's geometry into the current batch, or draw it
    /// immediately for unbatched plugins.
    fn render_node(
        &mut self,
        device: &mut D,
        binder: &mut TextureBinder,
        projection: &Matrix,
        scene: &mut Scene,
        node: NodeId,
    );
}
