//! The GPU context collaborator consumed by the renderer.
//!
//! The renderer core does not talk to a graphics API directly; it drives a
//! [`GpuDevice`], the Rust shape of "whatever supplies the GL context".
//! The production implementation sits on `wgpu`
//! ([`WgpuDevice`](super::wgpu_device::WgpuDevice)); the
//! [`RecordingDevice`](super::recording::RecordingDevice) implements the
//! same contract headlessly and records the call stream for inspection.

use crate::texture::ScaleMode;

/// Identity of one GPU context incarnation.
///
/// Context loss/restore issues a fresh id; per-context resource maps keyed
/// by `ContextId` are how CPU-side descriptors find (or fail to find, and
/// re-create) their GPU realizations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub u32);

/// Opaque handle to a GPU texture owned by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque handle to an offscreen render target owned by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

/// Pixel blend equation for a draw call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
}

/// Which pipeline a draw call runs through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Flat per-vertex color (graphics tessellation).
    Color,
    /// Textured quads/meshes, clamped sampling.
    Textured,
    /// Textured with repeat-wrapped sampling (tiling sprites).
    TiledTextured,
}

/// Vertex format for textured draws.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexturedVertex {
    /// Position in normalized device coordinates (pre-computed on CPU).
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl TexturedVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexturedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Vertex format for flat-colored draws.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColorVertex {
    /// Position in normalized device coordinates (pre-computed on CPU).
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Contract between the renderer core and a GPU context provider.
///
/// All calls are synchronous and single-threaded. Resource creation hands
/// back opaque handles valid for the current [`ContextId`] only; after a
/// context loss the provider issues a new id and previously-created
/// handles are dead weight the caller simply stops referencing.
pub trait GpuDevice {
    /// Identity of the current context incarnation.
    fn context_id(&self) -> ContextId;

    /// True while the GPU context is lost; the renderer must not submit
    /// work (and render calls degrade to silent no-ops).
    fn is_lost(&self) -> bool;

    /// Upload RGBA8 pixels into a fresh GPU texture.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        scale_mode: ScaleMode,
        pixels: &[u8],
    ) -> TextureHandle;

    fn delete_texture(&mut self, handle: TextureHandle);

    /// Allocate an offscreen color target. The returned [`TextureHandle`]
    /// samples the target's contents.
    fn create_render_target(&mut self, width: u32, height: u32) -> (TargetHandle, TextureHandle);

    fn delete_render_target(&mut self, target: TargetHandle);

    /// Direct subsequent clears/draws at `target` (`None` = the screen).
    fn bind_render_target(&mut self, target: Option<TargetHandle>);

    /// Clear the bound target to `color` (premultiplied RGBA).
    fn clear(&mut self, color: [f32; 4]);

    /// Select the pipeline for subsequent draws.
    fn set_shader(&mut self, shader: ShaderKind);

    /// Submit one batched draw: vertex bytes (matching the active shader's
    /// vertex layout), a triangle-list index buffer, and blend state.
    fn draw_indexed(
        &mut self,
        texture: Option<TextureHandle>,
        vertex_bytes: &[u8],
        indices: &[u16],
        blend: BlendMode,
    );

    /// Finish the frame: execute recorded work and present the screen
    /// target if there is one.
    fn present(&mut self);

    /// Resize the screen target. Zero sizes are ignored.
    fn resize_surface(&mut self, width: u32, height: u32);
}
