//! Batched sprite rendering.
//!
//! Sprites accumulate into one interleaved vertex/index buffer and submit
//! as a single draw call per flush boundary. A flush happens when the
//! bound texture changes, the blend mode changes, the batch fills up, or
//! the renderer forces one (plugin switch, target rebind, end of frame).

use crate::math::{Matrix, Point};
use crate::scene::{NodeId, NodePayload, Scene};

use super::binder::TextureBinder;
use super::device::{BlendMode, GpuDevice, ShaderKind, TextureHandle, TexturedVertex};
use super::plugin::ObjectRenderer;

/// Quads per batch before a forced flush. Four vertices per quad keeps the
/// 16-bit index space comfortable.
pub const MAX_BATCH_QUADS: usize = 4096;

pub struct SpriteBatcher {
    vertices: Vec<TexturedVertex>,
    indices: Vec<u16>,
    current_texture: Option<TextureHandle>,
    current_blend: BlendMode,
    quad_count: usize,
    round_pixels: bool,
}

impl SpriteBatcher {
    pub fn new(round_pixels: bool) -> Self {
        Self {
            vertices: Vec::with_capacity(MAX_BATCH_QUADS.min(256) * 4),
            indices: Vec::with_capacity(MAX_BATCH_QUADS.min(256) * 6),
            current_texture: None,
            current_blend: BlendMode::Normal,
            quad_count: 0,
            round_pixels,
        }
    }

    pub fn pending_quads(&self) -> usize {
        self.quad_count
    }
}

/// Tint plus world alpha as a straight-alpha RGBA multiplier.
pub(crate) fn tint_rgba(tint: u32, alpha: f32) -> [f32; 4] {
    [
        ((tint >> 16) & 0xFF) as f32 / 255.0,
        ((tint >> 8) & 0xFF) as f32 / 255.0,
        (tint & 0xFF) as f32 / 255.0,
        alpha,
    ]
}

impl<D: GpuDevice> ObjectRenderer<D> for SpriteBatcher {
    fn start(&mut self, device: &mut D) {
        device.set_shader(ShaderKind::Textured);
    }

    fn stop(&mut self, device: &mut D) {
        self.flush(device);
    }

    fn flush(&mut self, device: &mut D) {
        if self.quad_count == 0 {
            return;
        }
        if let Some(texture) = self.current_texture {
            device.draw_indexed(
                Some(texture),
                bytemuck::cast_slice(&self.vertices),
                &self.indices,
                self.current_blend,
            );
        }
        self.vertices.clear();
        self.indices.clear();
        self.quad_count = 0;
    }

    fn render_node(
        &mut self,
        device: &mut D,
        binder: &mut TextureBinder,
        projection: &Matrix,
        scene: &mut Scene,
        node: NodeId,
    ) {
        let node = scene.node_mut(node);
        let world = node.transform.world_matrix();
        let world_id = node.transform.world_id();
        let world_alpha = node.world_alpha();
        let NodePayload::Sprite(sprite) = &mut node.payload else {
            return;
        };

        // An unloaded/invalid texture is a safe no-op, never a draw.
        let Some(handle) = binder.bind(device, &sprite.texture) else {
            return;
        };

        if self.quad_count == MAX_BATCH_QUADS
            || self.current_texture.is_some_and(|t| t != handle)
            || (self.quad_count > 0 && self.current_blend != sprite.blend_mode)
        {
            self.flush(device);
        }
        self.current_texture = Some(handle);
        self.current_blend = sprite.blend_mode;

        sprite.calculate_vertices(&world, world_id);
        let color = tint_rgba(sprite.tint, world_alpha);
        let uvs = *sprite.texture.uvs();

        let base = self.vertices.len() as u16;
        for corner in 0..4 {
            let mut x = sprite.vertex_data[corner * 2];
            let mut y = sprite.vertex_data[corner * 2 + 1];
            if self.round_pixels {
                x = x.round();
                y = y.round();
            }
            let ndc = projection.apply(Point::new(x, y));
            let (u, v) = uvs.corner(corner);
            self.vertices.push(TexturedVertex {
                position: [ndc.x, ndc.y],
                uv: [u, v],
                color,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self.quad_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{GpuOp, RecordingDevice};
    use crate::texture::{BaseTexture, Texture};

    fn scene_with_sprites(count: usize, texture: &Texture) -> (Scene, Vec<NodeId>) {
        let mut scene = Scene::new();
        let root = scene.container();
        let ids: Vec<NodeId> = (0..count)
            .map(|_| {
                let s = scene.sprite(texture.clone());
                scene.add_child(root, s);
                s
            })
            .collect();
        scene.update_transforms(root);
        (scene, ids)
    }

    #[test]
    fn test_same_texture_sprites_share_one_draw() {
        let texture = Texture::from_base(BaseTexture::from_pixels(2, 2, vec![255; 16]));
        let (mut scene, ids) = scene_with_sprites(3, &texture);

        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut batcher = SpriteBatcher::new(false);
        let projection = Matrix::IDENTITY;

        batcher.start(&mut device);
        for id in ids {
            batcher.render_node(&mut device, &mut binder, &projection, &mut scene, id);
        }
        batcher.stop(&mut device);

        assert_eq!(device.draw_count(), 1);
        let draw = device
            .ops()
            .iter()
            .find(|op| matches!(op, GpuOp::Draw { .. }))
            .unwrap();
        if let GpuOp::Draw {
            vertex_count,
            index_count,
            ..
        } = draw
        {
            assert_eq!(*vertex_count, 12);
            assert_eq!(*index_count, 18);
        }
    }

    #[test]
    fn test_texture_change_splits_batch() {
        let a = Texture::from_base(BaseTexture::from_pixels(2, 2, vec![255; 16]));
        let b = Texture::from_base(BaseTexture::from_pixels(2, 2, vec![0; 16]));
        let (mut scene, ids) = scene_with_sprites(2, &a);
        scene.sprite_mut(ids[1]).set_texture(b);

        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut batcher = SpriteBatcher::new(false);
        let projection = Matrix::IDENTITY;

        batcher.start(&mut device);
        for id in ids {
            batcher.render_node(&mut device, &mut binder, &projection, &mut scene, id);
        }
        batcher.stop(&mut device);

        assert_eq!(device.draw_count(), 2);
    }

    #[test]
    fn test_invalid_texture_draws_nothing() {
        let pending = Texture::from_base(BaseTexture::pending("later.png"));
        let (mut scene, ids) = scene_with_sprites(1, &pending);

        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut batcher = SpriteBatcher::new(false);
        let projection = Matrix::IDENTITY;

        batcher.start(&mut device);
        batcher.render_node(&mut device, &mut binder, &projection, &mut scene, ids[0]);
        batcher.stop(&mut device);

        assert_eq!(device.draw_count(), 0);
    }
}
