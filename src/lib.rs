//! A 2D scene-graph renderer.
//!
//! `tableau` keeps a tree of drawable nodes (sprites, vector graphics,
//! meshes, tiling sprites, plain containers), propagates transforms and
//! alpha down the tree once per frame, and turns the tree into batched GPU
//! draw calls through a pluggable object-renderer pipeline.
//!
//! The GPU is reached through the [`renderer::device::GpuDevice`] trait:
//! [`renderer::WgpuDevice`] renders for real (on a window via
//! `raw-window-handle`, or headless), while
//! [`renderer::RecordingDevice`] runs the identical pipeline without a GPU
//! and records the call stream.
//!
//! ```no_run
//! use tableau::prelude::*;
//!
//! let mut registry = TextureRegistry::new();
//! let texture = registry.from_path("assets/hero.png").unwrap();
//!
//! let mut scene = Scene::new();
//! let stage = scene.container();
//! let hero = scene.sprite(texture);
//! scene.add_child(stage, hero);
//! scene.transform_mut(hero).set_position(120.0, 80.0);
//!
//! let device = WgpuDevice::new_headless(800, 600);
//! let mut renderer = Renderer::new(device, RendererOptions::default());
//! renderer.render(&mut scene, stage, None, None, None, false);
//! ```

pub mod bounds;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod texture;
pub mod transform;

pub use bounds::Bounds;
pub use math::{Matrix, Point, Rectangle, TextureRotation};
pub use renderer::device::{BlendMode, ContextId, GpuDevice};
pub use renderer::{
    GcMode, RecordingDevice, Renderer, RendererOptions, RendererState, WgpuDevice,
};
pub use scene::{
    FillStyle, GraphicsData, LineStyle, MeshData, MeshDrawMode, Node, NodeId, NodePayload, Scene,
    SceneEvent, ShapeKind, SpriteData, TilingSpriteData,
};
pub use texture::{BaseTexture, ScaleMode, Texture, TextureRegistry};
pub use transform::Transform;

pub mod prelude {
    pub use crate::math::{Matrix, Point, Rectangle, TextureRotation};
    pub use crate::renderer::device::{BlendMode, GpuDevice};
    pub use crate::renderer::{
        RecordingDevice, Renderer, RendererOptions, RendererState, WgpuDevice,
    };
    pub use crate::scene::{
        GraphicsData, MeshData, NodeId, NodePayload, Scene, SceneEvent, ShapeKind, SpriteData,
    };
    pub use crate::texture::{BaseTexture, ScaleMode, Texture, TextureRegistry};
    pub use crate::transform::Transform;
}
