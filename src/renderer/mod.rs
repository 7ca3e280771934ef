//! The renderer core: a state machine turning a scene tree into a bounded
//! sequence of GPU state changes and batched draw calls.
//!
//! States: ContextReady → Rendering → (ContextLost → ContextReady) →
//! Destroyed. One frame is one `render` call; everything inside it is
//! synchronous on the thread owning the GPU context.
//!
//! The single most important invariant lives here: **binding a new render
//! target or switching the active object-renderer plugin must flush the
//! outgoing plugin first.** Batched vertex data submitted under the wrong
//! target/shader corrupts unrelated draw calls.

pub mod binder;
pub mod device;
pub mod graphics_renderer;
pub mod mesh_renderer;
pub mod options;
pub mod plugin;
pub mod recording;
pub mod sprite_batch;
pub mod target;
pub mod texture_gc;
pub mod tiling_renderer;
pub mod wgpu_device;

use crate::math::Matrix;
use crate::scene::{NodeId, NodePayload, Scene};
use crate::texture::{BaseTexture, ScaleMode, Texture};

use self::binder::TextureBinder;
use self::device::GpuDevice;
use self::graphics_renderer::GraphicsRenderer;
use self::mesh_renderer::MeshRenderer;
use self::plugin::{ObjectRenderer, PluginKind};
use self::sprite_batch::SpriteBatcher;
use self::target::{RenderTarget, RenderTexture};
use self::texture_gc::TextureGarbageCollector;
use self::tiling_renderer::TilingRenderer;

pub use self::options::RendererOptions;
pub use self::recording::{GpuOp, RecordingDevice};
pub use self::texture_gc::GcMode;
pub use self::wgpu_device::WgpuDevice;

/// Lifecycle state of the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    /// A context is available and no frame is in flight.
    ContextReady,
    /// Inside a `render` call.
    Rendering,
    /// The GPU context is lost; render calls no-op until restore.
    ContextLost,
    /// Destroyed; any further use is a programming error.
    Destroyed,
}

/// Scene renderer over a [`GpuDevice`].
pub struct Renderer<D: GpuDevice> {
    device: D,
    options: RendererOptions,
    state: RendererState,

    binder: TextureBinder,
    pub texture_gc: TextureGarbageCollector,

    active_plugin: PluginKind,
    current_projection: Matrix,
    screen: RenderTarget,

    sprite_batch: SpriteBatcher,
    graphics: GraphicsRenderer,
    mesh: MeshRenderer,
    tiling: TilingRenderer,

    pre_render: Option<Box<dyn FnMut()>>,
    post_render: Option<Box<dyn FnMut()>>,
}

impl<D: GpuDevice> Renderer<D> {
    pub fn new(device: D, options: RendererOptions) -> Self {
        let screen = RenderTarget::screen(options.width, options.height);
        log::info!(
            "renderer ready: {}x{} @{}x, context {:?}",
            options.width,
            options.height,
            options.resolution,
            device.context_id()
        );
        Self {
            device,
            options,
            state: RendererState::ContextReady,
            binder: TextureBinder::new(),
            texture_gc: TextureGarbageCollector::new(),
            active_plugin: PluginKind::None,
            current_projection: screen.projection(),
            screen,
            sprite_batch: SpriteBatcher::new(options.round_pixels),
            graphics: GraphicsRenderer::new(),
            mesh: MeshRenderer::new(),
            tiling: TilingRenderer::new(),
            pre_render: None,
            post_render: None,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.binder.frame_count
    }

    pub fn background_color(&self) -> u32 {
        self.options.background_color
    }

    pub fn set_background_color(&mut self, color: u32) {
        self.options.background_color = color;
    }

    /// Hook invoked at the top of every `render` call.
    pub fn set_pre_render_hook(&mut self, hook: impl FnMut() + 'static) {
        self.pre_render = Some(Box::new(hook));
    }

    /// Hook invoked after a frame fully submits.
    pub fn set_post_render_hook(&mut self, hook: impl FnMut() + 'static) {
        self.post_render = Some(Box::new(hook));
    }

    /// Render `root`'s subtree.
    ///
    /// * `target`: offscreen destination, or `None` for the screen.
    /// * `clear`: override the `clear_before_render` option for this call.
    /// * `transform`: extra transform folded into the projection (world to
    ///   target), used by `generate_texture`.
    /// * `skip_update_transform`: reuse world state from a previous pass
    ///   instead of refreshing it.
    ///
    /// A lost context makes this a silent no-op; a destroyed renderer
    /// panics.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        root: NodeId,
        target: Option<&RenderTexture>,
        clear: Option<bool>,
        transform: Option<Matrix>,
        skip_update_transform: bool,
    ) {
        assert!(
            self.state != RendererState::Destroyed,
            "renderer used after destroy"
        );

        if let Some(hook) = &mut self.pre_render {
            hook();
        }

        if self.device.is_lost() {
            if self.state != RendererState::ContextLost {
                log::warn!("GPU context lost; suspending rendering");
            }
            self.state = RendererState::ContextLost;
            return;
        }
        self.state = RendererState::Rendering;
        self.binder.frame_count += 1;

        if !skip_update_transform {
            scene.update_transforms(root);
        }

        let render_target = match target {
            Some(t) => RenderTarget {
                handle: Some(t.target),
                width: t.width,
                height: t.height,
            },
            None => self.screen,
        };
        if render_target.width == 0 || render_target.height == 0 {
            self.state = RendererState::ContextReady;
            return;
        }

        self.bind_target(render_target);
        if let Some(extra) = transform {
            self.current_projection.append(&extra);
        }

        if clear.unwrap_or(self.options.clear_before_render) {
            let color = if target.is_some() {
                // Offscreen targets start transparent; the background color
                // belongs to the screen.
                [0.0; 4]
            } else {
                self.options.background_rgba()
            };
            self.device.clear(color);
        }

        self.render_node(scene, root);
        self.flush_active();
        self.device.present();

        self.texture_gc.update(&mut self.device, &mut self.binder);

        self.state = RendererState::ContextReady;
        if let Some(hook) = &mut self.post_render {
            hook();
        }
    }

    /// Recursive polymorphic dispatch: payload kind selects the plugin.
    fn render_node(&mut self, scene: &mut Scene, id: NodeId) {
        let node = scene.node(id);
        if !node.visible() || node.world_alpha() <= 0.0 || !node.renderable() {
            return;
        }

        let kind = match &node.payload {
            NodePayload::Empty => None,
            NodePayload::Sprite(_) => Some(PluginKind::Sprite),
            NodePayload::Graphics(_) => Some(PluginKind::Graphics),
            NodePayload::Mesh(_) => Some(PluginKind::Mesh),
            NodePayload::TilingSprite(_) => Some(PluginKind::Tiling),
        };
        if let Some(kind) = kind {
            self.set_object_renderer(kind);
            let projection = self.current_projection;
            match kind {
                PluginKind::Sprite => self.sprite_batch.render_node(
                    &mut self.device,
                    &mut self.binder,
                    &projection,
                    scene,
                    id,
                ),
                PluginKind::Graphics => self.graphics.render_node(
                    &mut self.device,
                    &mut self.binder,
                    &projection,
                    scene,
                    id,
                ),
                PluginKind::Mesh => self.mesh.render_node(
                    &mut self.device,
                    &mut self.binder,
                    &projection,
                    scene,
                    id,
                ),
                PluginKind::Tiling => self.tiling.render_node(
                    &mut self.device,
                    &mut self.binder,
                    &projection,
                    scene,
                    id,
                ),
                PluginKind::None => {}
            }
        }

        let children = scene.node(id).children().to_vec();
        for child in children {
            self.render_node(scene, child);
        }
    }

    /// Switch the active object renderer: stop (and thereby flush) the
    /// outgoing plugin, start the incoming one. A no-op when the plugin is
    /// already active; the dedup avoids redundant flushes every frame.
    fn set_object_renderer(&mut self, kind: PluginKind) {
        if self.active_plugin == kind {
            return;
        }
        match self.active_plugin {
            PluginKind::None => {}
            PluginKind::Sprite => self.sprite_batch.stop(&mut self.device),
            PluginKind::Graphics => self.graphics.stop(&mut self.device),
            PluginKind::Mesh => self.mesh.stop(&mut self.device),
            PluginKind::Tiling => self.tiling.stop(&mut self.device),
        }
        self.active_plugin = kind;
        match kind {
            PluginKind::None => {}
            PluginKind::Sprite => self.sprite_batch.start(&mut self.device),
            PluginKind::Graphics => self.graphics.start(&mut self.device),
            PluginKind::Mesh => self.mesh.start(&mut self.device),
            PluginKind::Tiling => self.tiling.start(&mut self.device),
        }
    }

    /// Force-submit whatever the active plugin has buffered.
    fn flush_active(&mut self) {
        match self.active_plugin {
            PluginKind::None => {}
            PluginKind::Sprite => self.sprite_batch.flush(&mut self.device),
            PluginKind::Graphics => self.graphics.flush(&mut self.device),
            PluginKind::Mesh => self.mesh.flush(&mut self.device),
            PluginKind::Tiling => self.tiling.flush(&mut self.device),
        }
    }

    /// Bind a render target, flushing pending batched geometry first.
    fn bind_target(&mut self, target: RenderTarget) {
        self.flush_active();
        self.device.bind_render_target(target.handle);
        self.current_projection = target.projection();
    }

    /// Resize the screen target. Zero sizes are ignored by the device.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.options.width = width;
        self.options.height = height;
        self.screen = RenderTarget::screen(width, height);
        let (pw, ph) = self.options.physical_size();
        self.device.resize_surface(pw, ph);
    }

    /// Render `node`'s local content into a fresh texture.
    ///
    /// The node's own transform is ignored (substituted with identity for
    /// the duration, restored afterwards): the capture frames the node's
    /// local bounds at the requested resolution.
    pub fn generate_texture(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        scale_mode: ScaleMode,
        resolution: f32,
    ) -> RenderTexture {
        assert!(
            self.state != RendererState::Destroyed,
            "renderer used after destroy"
        );
        let bounds = scene.local_bounds(node);
        let width = ((bounds.width * resolution).ceil() as u32).max(1);
        let height = ((bounds.height * resolution).ceil() as u32).max(1);

        let (target, texture_handle) = self.device.create_render_target(width, height);
        let base = BaseTexture::from_render_target(
            width,
            height,
            scale_mode,
            self.device.context_id(),
            texture_handle,
        );
        let render_texture = RenderTexture::new(Texture::from_base(base), target, width, height);

        // Frame the node's local space: substitute identity, render with a
        // projection offset, restore. Straight-line code so the restore
        // runs on every path.
        let saved = std::mem::replace(
            scene.transform_mut(node),
            crate::transform::Transform::new(),
        );
        let mut capture = Matrix::translation(-bounds.x, -bounds.y);
        capture.scale(resolution, resolution);
        self.render(
            scene,
            node,
            Some(&render_texture),
            Some(true),
            Some(capture),
            false,
        );
        *scene.transform_mut(node) = saved;
        scene.invalidate_subtree(node);

        render_texture
    }

    /// Drop the GPU realization of `texture` for the current context,
    /// keeping the CPU descriptor (re-uploads on next draw).
    pub fn unload_texture(&mut self, texture: &Texture) {
        let context = self.device.context_id();
        let mut base = texture.base().borrow_mut();
        if let Some((handle, _)) = base.handles.remove(&context) {
            self.device.delete_texture(handle);
        }
    }

    /// Run the texture garbage collector now.
    pub fn run_texture_gc(&mut self) {
        self.texture_gc.run(&mut self.device, &mut self.binder);
    }

    /// Release every GPU resource this renderer realized and tombstone the
    /// renderer. Further use panics.
    pub fn destroy(&mut self) {
        assert!(
            self.state != RendererState::Destroyed,
            "renderer destroyed twice"
        );
        let context = self.device.context_id();
        for base in self.binder.managed.drain(..) {
            let mut base = base.borrow_mut();
            if let Some((handle, _)) = base.handles.remove(&context) {
                self.device.delete_texture(handle);
            }
            base.tracked = false;
        }
        self.state = RendererState::Destroyed;
        log::info!("renderer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::device::{BlendMode, ShaderKind};
    use super::*;
    use crate::math::Point;
    use crate::texture::BaseTexture;

    fn renderer() -> Renderer<RecordingDevice> {
        Renderer::new(RecordingDevice::new(), RendererOptions::default())
    }

    fn texture_4x4() -> Texture {
        Texture::from_base(BaseTexture::from_pixels(4, 4, vec![255; 64]))
    }

    fn draws(ops: &[GpuOp]) -> Vec<&GpuOp> {
        ops.iter()
            .filter(|op| matches!(op, GpuOp::Draw { .. }))
            .collect()
    }

    #[test]
    fn test_frame_sequence_bind_clear_draw_present() {
        let mut scene = Scene::new();
        let root = scene.container();
        let sprite = scene.sprite(texture_4x4());
        scene.add_child(root, sprite);

        let mut r = renderer();
        r.render(&mut scene, root, None, None, None, false);

        let ops = r.device().ops();
        let bind = ops
            .iter()
            .position(|op| matches!(op, GpuOp::BindRenderTarget(None)))
            .unwrap();
        let clear = ops
            .iter()
            .position(|op| matches!(op, GpuOp::Clear(_)))
            .unwrap();
        let draw = ops
            .iter()
            .position(|op| matches!(op, GpuOp::Draw { .. }))
            .unwrap();
        let present = ops
            .iter()
            .position(|op| matches!(op, GpuOp::Present))
            .unwrap();
        assert!(bind < clear && clear < draw && draw < present);
        assert_eq!(r.state(), RendererState::ContextReady);
    }

    #[test]
    fn test_plugin_switch_flushes_outgoing_before_incoming_draws() {
        let mut scene = Scene::new();
        let root = scene.container();
        let s1 = scene.sprite(texture_4x4());
        let s2 = scene.sprite(texture_4x4());
        let g = scene.graphics();
        scene
            .graphics_mut(g)
            .begin_fill(0x00FF00, 1.0)
            .draw_rect(0.0, 0.0, 5.0, 5.0);
        let s3 = scene.sprite(texture_4x4());
        scene.add_child(root, s1);
        scene.add_child(root, s2);
        scene.add_child(root, g);
        scene.add_child(root, s3);

        let mut r = renderer();
        r.render(&mut scene, root, None, None, None, false);

        // Expected stream: the two leading sprites flush as ONE textured
        // draw before the color shader binds; the graphics draw lands
        // before the sprite shader re-binds for the trailing sprite.
        let ops = r.device().ops();
        let shader_of_draws: Vec<ShaderKind> = ops
            .iter()
            .filter_map(|op| match op {
                GpuOp::Draw { shader, .. } => Some(*shader),
                _ => None,
            })
            .collect();
        assert_eq!(
            shader_of_draws,
            vec![
                ShaderKind::Textured,
                ShaderKind::Color,
                ShaderKind::Textured
            ]
        );

        // Flush-before-rebind: the outgoing batch's draw precedes the
        // incoming plugin's SetShader.
        let first_draw = ops
            .iter()
            .position(|op| matches!(op, GpuOp::Draw { .. }))
            .unwrap();
        let color_shader_bind = ops
            .iter()
            .position(|op| matches!(op, GpuOp::SetShader(ShaderKind::Color)))
            .unwrap();
        assert!(first_draw < color_shader_bind);

        // The two leading sprites shared one draw call.
        if let GpuOp::Draw { index_count, .. } = &ops[first_draw] {
            assert_eq!(*index_count, 12);
        }
    }

    #[test]
    fn test_lost_context_is_silent_noop_and_restore_reuploads() {
        let mut scene = Scene::new();
        let root = scene.container();
        let sprite = scene.sprite(texture_4x4());
        scene.add_child(root, sprite);

        let mut r = renderer();
        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(r.device().textures_created(), 1);

        r.device_mut().lose_context();
        r.device_mut().take_ops();
        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(r.state(), RendererState::ContextLost);
        assert!(
            draws(r.device().ops()).is_empty(),
            "lost context must not draw"
        );

        // Restore: a fresh ContextId; CPU descriptors re-upload without
        // the caller re-specifying pixels.
        r.device_mut().restore_context();
        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(r.device().textures_created(), 2);
        assert_eq!(draws(r.device().ops()).len(), 1);
        assert_eq!(r.state(), RendererState::ContextReady);
    }

    #[test]
    fn test_unchanged_texture_uploads_once_across_frames() {
        let mut scene = Scene::new();
        let root = scene.container();
        let sprite = scene.sprite(texture_4x4());
        scene.add_child(root, sprite);

        let mut r = renderer();
        for _ in 0..3 {
            r.render(&mut scene, root, None, None, None, false);
        }
        assert_eq!(r.device().textures_created(), 1);
    }

    #[test]
    fn test_clear_override_and_background_color() {
        let mut scene = Scene::new();
        let root = scene.container();

        let mut r = Renderer::new(
            RecordingDevice::new(),
            RendererOptions {
                background_color: 0xFF0000,
                ..RendererOptions::default()
            },
        );

        r.render(&mut scene, root, None, Some(false), None, false);
        assert!(!r
            .device()
            .ops()
            .iter()
            .any(|op| matches!(op, GpuOp::Clear(_))));

        r.device_mut().take_ops();
        r.render(&mut scene, root, None, None, None, false);
        let clear = r
            .device()
            .ops()
            .iter()
            .find(|op| matches!(op, GpuOp::Clear(_)))
            .unwrap();
        assert_eq!(clear, &GpuOp::Clear([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_non_renderable_subtree_skipped() {
        let mut scene = Scene::new();
        let root = scene.container();
        let group = scene.container();
        let sprite = scene.sprite(texture_4x4());
        scene.add_child(root, group);
        scene.add_child(group, sprite);
        scene.set_renderable(group, false);

        let mut r = renderer();
        r.render(&mut scene, root, None, None, None, false);
        assert!(draws(r.device().ops()).is_empty());
    }

    #[test]
    fn test_generate_texture_renders_offscreen() {
        let mut scene = Scene::new();
        let sprite = scene.sprite(texture_4x4());
        scene.sprite_mut(sprite).anchor = Point::new(0.5, 0.5);
        scene.transform_mut(sprite).set_position(100.0, 100.0);

        let mut r = renderer();
        let rt = r.generate_texture(&mut scene, sprite, ScaleMode::Linear, 1.0);
        assert_eq!((rt.width, rt.height), (4, 4));
        assert!(rt.texture().valid());

        let ops = r.device().ops();
        let target_bind = ops
            .iter()
            .position(|op| matches!(op, GpuOp::BindRenderTarget(Some(_))))
            .unwrap();
        let draw = ops
            .iter()
            .position(|op| matches!(op, GpuOp::Draw { .. }))
            .unwrap();
        assert!(target_bind < draw);

        // The capture texture is immediately usable by a sprite and the
        // node's real transform survived the round trip.
        let world = scene.bounds(sprite, false);
        assert_eq!(world, crate::math::Rectangle::new(98.0, 98.0, 4.0, 4.0));
    }

    #[test]
    fn test_texture_gc_unloads_idle_and_redraw_reuploads() {
        let mut scene = Scene::new();
        let root = scene.container();
        let sprite = scene.sprite(texture_4x4());
        scene.add_child(root, sprite);

        let mut r = renderer();
        r.texture_gc.max_idle = 1;
        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(r.device().textures_created(), 1);

        // Hide the sprite, let frames pass, then collect.
        scene.set_visible(sprite, false);
        r.render(&mut scene, root, None, None, None, false);
        r.render(&mut scene, root, None, None, None, false);
        r.run_texture_gc();
        assert!(r
            .device()
            .ops()
            .iter()
            .any(|op| matches!(op, GpuOp::DeleteTexture(_))));

        // Unhidden: transparently re-uploads.
        scene.set_visible(sprite, true);
        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(r.device().textures_created(), 2);
    }

    #[test]
    fn test_blend_mode_change_splits_batches() {
        let mut scene = Scene::new();
        let root = scene.container();
        let texture = texture_4x4();
        let a = scene.sprite(texture.clone());
        let b = scene.sprite(texture);
        scene.add_child(root, a);
        scene.add_child(root, b);
        scene.sprite_mut(b).blend_mode = BlendMode::Add;

        let mut r = renderer();
        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(draws(r.device().ops()).len(), 2);
    }

    #[test]
    fn test_pre_post_hooks_fire_in_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let mut scene = Scene::new();
        let root = scene.container();

        let mut r = renderer();
        let pre = log.clone();
        r.set_pre_render_hook(move || pre.borrow_mut().push("pre"));
        let post = log.clone();
        r.set_post_render_hook(move || post.borrow_mut().push("post"));

        r.render(&mut scene, root, None, None, None, false);
        assert_eq!(*log.borrow(), vec!["pre", "post"]);
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn test_render_after_destroy_panics() {
        let mut scene = Scene::new();
        let root = scene.container();
        let mut r = renderer();
        r.destroy();
        r.render(&mut scene, root, None, None, None, false);
    }

    #[test]
    #[should_panic(expected = "destroyed twice")]
    fn test_double_destroy_panics() {
        let mut r = renderer();
        r.destroy();
        r.destroy();
    }

    #[test]
    fn test_zero_size_target_is_noop() {
        let mut scene = Scene::new();
        let root = scene.container();
        let mut r = Renderer::new(
            RecordingDevice::new(),
            RendererOptions {
                width: 0,
                height: 0,
                ..RendererOptions::default()
            },
        );
        r.render(&mut scene, root, None, None, None, false);
        assert!(r.device().ops().is_empty());
    }
}
