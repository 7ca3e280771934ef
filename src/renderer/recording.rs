//! Headless [`GpuDevice`] that records its call stream.
//!
//! Stands in for a real GPU in tests and tooling: draw ordering, flush
//! boundaries, uploads and context loss/restore all become assertable
//! data. It is also the reference for what the renderer core is allowed to
//! ask of a device.

use crate::texture::ScaleMode;

use super::device::{BlendMode, ContextId, GpuDevice, ShaderKind, TargetHandle, TextureHandle};

/// One recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuOp {
    CreateTexture {
        handle: TextureHandle,
        width: u32,
        height: u32,
    },
    DeleteTexture(TextureHandle),
    CreateRenderTarget(TargetHandle),
    DeleteRenderTarget(TargetHandle),
    BindRenderTarget(Option<TargetHandle>),
    Clear([f32; 4]),
    SetShader(ShaderKind),
    Draw {
        shader: ShaderKind,
        texture: Option<TextureHandle>,
        vertex_count: u32,
        index_count: u32,
        blend: BlendMode,
    },
    Present,
}

/// Recording implementation of [`GpuDevice`].
pub struct RecordingDevice {
    ops: Vec<GpuOp>,
    context: ContextId,
    lost: bool,
    current_shader: ShaderKind,
    next_texture: u32,
    next_target: u32,
    textures_created: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            context: ContextId(1),
            lost: false,
            current_shader: ShaderKind::Textured,
            next_texture: 0,
            next_target: 0,
            textures_created: 0,
        }
    }

    /// Simulate the environment yanking the GPU context.
    pub fn lose_context(&mut self) {
        self.lost = true;
    }

    /// Simulate context restoration: a fresh [`ContextId`], all previously
    /// issued handles implicitly dead.
    pub fn restore_context(&mut self) {
        self.lost = false;
        self.context = ContextId(self.context.0 + 1);
    }

    pub fn ops(&self) -> &[GpuOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<GpuOp> {
        std::mem::take(&mut self.ops)
    }

    /// Total textures ever uploaded (across context incarnations).
    pub fn textures_created(&self) -> u32 {
        self.textures_created
    }

    /// Number of recorded draw calls.
    pub fn draw_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, GpuOp::Draw { .. }))
            .count()
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for RecordingDevice {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn is_lost(&self) -> bool {
        self.lost
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        _scale_mode: ScaleMode,
        pixels: &[u8],
    ) -> TextureHandle {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        self.next_texture += 1;
        self.textures_created += 1;
        let handle = TextureHandle(self.next_texture);
        self.ops.push(GpuOp::CreateTexture {
            handle,
            width,
            height,
        });
        handle
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.ops.push(GpuOp::DeleteTexture(handle));
    }

    fn create_render_target(&mut self, width: u32, height: u32) -> (TargetHandle, TextureHandle) {
        self.next_target += 1;
        let target = TargetHandle(self.next_target);
        self.ops.push(GpuOp::CreateRenderTarget(target));
        // The sampling side of the target counts as a created texture.
        let texture = self.create_texture(
            width,
            height,
            ScaleMode::Linear,
            &vec![0; (width * height * 4) as usize],
        );
        (target, texture)
    }

    fn delete_render_target(&mut self, target: TargetHandle) {
        self.ops.push(GpuOp::DeleteRenderTarget(target));
    }

    fn bind_render_target(&mut self, target: Option<TargetHandle>) {
        self.ops.push(GpuOp::BindRenderTarget(target));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.ops.push(GpuOp::Clear(color));
    }

    fn set_shader(&mut self, shader: ShaderKind) {
        self.current_shader = shader;
        self.ops.push(GpuOp::SetShader(shader));
    }

    fn draw_indexed(
        &mut self,
        texture: Option<TextureHandle>,
        vertex_bytes: &[u8],
        indices: &[u16],
        blend: BlendMode,
    ) {
        let stride = match self.current_shader {
            ShaderKind::Color => std::mem::size_of::<super::device::ColorVertex>(),
            ShaderKind::Textured | ShaderKind::TiledTextured => {
                std::mem::size_of::<super::device::TexturedVertex>()
            }
        };
        self.ops.push(GpuOp::Draw {
            shader: self.current_shader,
            texture,
            vertex_count: (vertex_bytes.len() / stride) as u32,
            index_count: indices.len() as u32,
            blend,
        });
    }

    fn present(&mut self) {
        self.ops.push(GpuOp::Present);
    }

    fn resize_surface(&mut self, _width: u32, _height: u32) {}
}
