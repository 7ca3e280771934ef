//! Immediate-mode textured mesh rendering.

use crate::math::{Matrix, Point};
use crate::scene::{MeshDrawMode, NodeId, NodePayload, Scene};

use super::binder::TextureBinder;
use super::device::{GpuDevice, ShaderKind, TexturedVertex};
use super::plugin::ObjectRenderer;
use super::sprite_batch::tint_rgba;

pub struct MeshRenderer {
    // Scratch buffers reused across draws to avoid per-mesh allocation.
    vertices: Vec<TexturedVertex>,
    indices: Vec<u16>,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: GpuDevice> ObjectRenderer<D> for MeshRenderer {
    fn start(&mut self, device: &mut D) {
        device.set_shader(ShaderKind::Textured);
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
        let NodePayload::Mesh(mesh) = &node.payload else {
            return;
        };
        if mesh.vertices.len() < 6 || mesh.indices.len() < 3 {
            return;
        }
        let Some(handle) = binder.bind(device, &mesh.texture) else {
            return;
        };

        let mut full = *projection;
        full.append(&world);
        let color = tint_rgba(mesh.tint, world_alpha);

        self.vertices.clear();
        for (pair, uv) in mesh
            .vertices
            .chunks_exact(2)
            .zip(mesh.uvs.chunks_exact(2))
        {
            let ndc = full.apply(Point::new(pair[0], pair[1]));
            self.vertices.push(TexturedVertex {
                position: [ndc.x, ndc.y],
                uv: [uv[0], uv[1]],
                color,
            });
        }

        self.indices.clear();
        match mesh.draw_mode {
            MeshDrawMode::Triangles => self.indices.extend_from_slice(&mesh.indices),
            MeshDrawMode::TriangleStrip => {
                // Unroll the strip into a list, alternating winding so every
                // triangle faces the same way.
                for i in 2..mesh.indices.len() {
                    let (a, b) = if i % 2 == 0 {
                        (mesh.indices[i - 2], mesh.indices[i - 1])
                    } else {
                        (mesh.indices[i - 1], mesh.indices[i - 2])
                    };
                    self.indices.extend_from_slice(&[a, b, mesh.indices[i]]);
                }
            }
        }
        if self.indices.is_empty() {
            return;
        }

        device.draw_indexed(
            Some(handle),
            bytemuck::cast_slice(&self.vertices),
            &self.indices,
            mesh.blend_mode,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{GpuOp, RecordingDevice};
    use crate::scene::MeshData;
    use crate::texture::{BaseTexture, Texture};

    #[test]
    fn test_strip_unrolls_to_triangle_list() {
        let texture = Texture::from_base(BaseTexture::from_pixels(2, 2, vec![255; 16]));
        let mut mesh = MeshData::new(
            texture,
            vec![0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 10.0, 10.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            vec![0, 1, 2, 3],
        );
        mesh.draw_mode = MeshDrawMode::TriangleStrip;

        let mut scene = Scene::new();
        let id = scene.mesh(mesh);
        scene.update_transforms(id);

        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut renderer = MeshRenderer::new();
        renderer.start(&mut device);
        renderer.render_node(
            &mut device,
            &mut binder,
            &Matrix::IDENTITY,
            &mut scene,
            id,
        );

        let GpuOp::Draw { index_count, .. } = device.ops().last().unwrap() else {
            panic!("expected a draw");
        };
        // 4-index strip -> 2 triangles -> 6 list indices.
        assert_eq!(*index_count, 6);
    }
}
