//! Tiling-sprite rendering.
//!
//! One quad per node; the repeat happens in the sampler, so the UV range
//! simply spans `region size / (tile size × tile scale)` with the tile
//! offset folded in.

use crate::math::{Matrix, Point};
use crate::scene::{NodeId, NodePayload, Scene};

use super::binder::TextureBinder;
use super::device::{GpuDevice, ShaderKind, TexturedVertex};
use super::plugin::ObjectRenderer;
use super::sprite_batch::tint_rgba;

pub struct TilingRenderer;

impl TilingRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TilingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: GpuDevice> ObjectRenderer<D> for TilingRenderer {
    fn start(&mut self, device: &mut D) {
        device.set_shader(ShaderKind::TiledTextured);
    }

    fn stop(&mut self, _device: &mut D) {}

    fn flush(&mut self, _device: &mut D) {}

    fn render_node(
        &mut self,
        device: &mut D,
        binder: &mut TextureBinder,
        projection: &Matrix,
        scene: &mut Scene,
        node: NodeId,
    ) {
        let node = scene.node(node);
        let world = node.transform.world_matrix();
        let world_alpha = node.world_alpha();
        let NodePayload::TilingSprite(tiling) = &node.payload else {
            return;
        };
        if tiling.width <= 0.0 || tiling.height <= 0.0 {
            return;
        }
        let Some(handle) = binder.bind(device, &tiling.texture) else {
            return;
        };

        let tile_w = tiling.texture.width() * tiling.tile_scale.x;
        let tile_h = tiling.texture.height() * tiling.tile_scale.y;
        if tile_w <= 0.0 || tile_h <= 0.0 {
            return;
        }

        let u0 = -tiling.tile_position.x / tile_w;
        let v0 = -tiling.tile_position.y / tile_h;
        let u1 = u0 + tiling.width / tile_w;
        let v1 = v0 + tiling.height / tile_h;

        let mut full = *projection;
        full.append(&world);
        let color = tint_rgba(tiling.tint, world_alpha);

        let corners = [
            (0.0, 0.0, u0, v0),
            (tiling.width, 0.0, u1, v0),
            (tiling.width, tiling.height, u1, v1),
            (0.0, tiling.height, u0, v1),
        ];
        let vertices: Vec<TexturedVertex> = corners
            .iter()
            .map(|&(x, y, u, v)| {
                let ndc = full.apply(Point::new(x, y));
                TexturedVertex {
                    position: [ndc.x, ndc.y],
                    uv: [u, v],
                    color,
                }
            })
            .collect();

        device.draw_indexed(
            Some(handle),
            bytemuck::cast_slice(&vertices),
            &[0, 1, 2, 0, 2, 3],
            tiling.blend_mode,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{GpuOp, RecordingDevice};
    use crate::texture::{BaseTexture, Texture};

    #[test]
    fn test_tiling_draw_uses_repeat_shader() {
        let texture = Texture::from_base(BaseTexture::from_pixels(8, 8, vec![255; 256]));
        let mut scene = Scene::new();
        let id = scene.tiling_sprite(texture, 64.0, 32.0);
        scene.update_transforms(id);

        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut renderer = TilingRenderer::new();
        renderer.start(&mut device);
        renderer.render_node(
            &mut device,
            &mut binder,
            &Matrix::IDENTITY,
            &mut scene,
            id,
        );

        let GpuOp::Draw { shader, .. } = device.ops().last().unwrap() else {
            panic!("expected a draw");
        };
        assert_eq!(*shader, ShaderKind::TiledTextured);
    }
}
