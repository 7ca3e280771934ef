//! Drawable payloads carried by scene nodes.
//!
//! Instead of a deep inheritance chain, a node's drawable content is one
//! tagged variant; the renderer dispatches on the variant to pick an
//! object-renderer plugin. A node with [`NodePayload::Empty`] and children
//! is a plain container.

use crate::math::{Matrix, Point, Rectangle};
use crate::renderer::device::BlendMode;
use crate::texture::Texture;

/// What a node draws. Child management lives on the node itself, so every
/// payload kind may also parent children.
#[derive(Debug)]
pub enum NodePayload {
    /// Draws nothing; groups children.
    Empty,
    Sprite(SpriteData),
    Graphics(GraphicsData),
    Mesh(MeshData),
    TilingSprite(TilingSpriteData),
}

/// A textured quad with an anchor and tint.
#[derive(Debug)]
pub struct SpriteData {
    pub texture: Texture,
    /// Origin of the quad relative to its size: (0,0) = top-left corner at
    /// the node position, (0.5,0.5) = centered.
    pub anchor: Point,
    /// Multiplied into the texture as 0xRRGGBB.
    pub tint: u32,
    pub blend_mode: BlendMode,

    // World-space corner cache, refreshed when either the world matrix or
    // the texture frame moved on.
    pub(crate) vertex_data: [f32; 8],
    cached_world_id: u32,
    cached_texture_id: u32,
}

impl SpriteData {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            anchor: Point::ZERO,
            tint: 0xFFFFFF,
            blend_mode: BlendMode::Normal,
            vertex_data: [0.0; 8],
            cached_world_id: u32::MAX,
            cached_texture_id: u32::MAX,
        }
    }

    /// Replace the texture; the vertex cache refreshes on next use.
    pub fn set_texture(&mut self, texture: Texture) {
        self.texture = texture;
        self.cached_texture_id = u32::MAX;
    }

    /// Drop the cached corners, e.g. after the owning node's transform was
    /// temporarily substituted and version counters cannot be trusted.
    pub(crate) fn invalidate_vertex_cache(&mut self) {
        self.cached_world_id = u32::MAX;
        self.cached_texture_id = u32::MAX;
    }

    /// Refresh the cached world-space quad corners.
    ///
    /// Staleness is detected by comparing the transform's `world_id` and
    /// the texture's `update_id`; an unchanged sprite costs two compares.
    pub(crate) fn calculate_vertices(&mut self, world: &Matrix, world_id: u32) {
        if self.cached_world_id == world_id && self.cached_texture_id == self.texture.update_id() {
            return;
        }

        let orig_w = self.texture.width();
        let orig_h = self.texture.height();
        let frame = self.texture.frame();
        let (content_w, content_h) = if self.texture.rotate().swaps_axes() {
            (frame.height, frame.width)
        } else {
            (frame.width, frame.height)
        };
        let (off_x, off_y) = match self.texture.trim() {
            Some(t) => (t.x, t.y),
            None => (0.0, 0.0),
        };

        let x0 = off_x - self.anchor.x * orig_w;
        let x1 = x0 + content_w;
        let y0 = off_y - self.anchor.y * orig_h;
        let y1 = y0 + content_h;

        let corners = [
            world.apply(Point::new(x0, y0)),
            world.apply(Point::new(x1, y0)),
            world.apply(Point::new(x1, y1)),
            world.apply(Point::new(x0, y1)),
        ];
        for (i, c) in corners.iter().enumerate() {
            self.vertex_data[i * 2] = c.x;
            self.vertex_data[i * 2 + 1] = c.y;
        }

        self.cached_world_id = world_id;
        self.cached_texture_id = self.texture.update_id();
    }

    /// Hit-test a point given in the sprite's local coordinate space.
    pub fn contains_local_point(&self, p: Point) -> bool {
        let w = self.texture.width();
        let h = self.texture.height();
        if w <= 0.0 || h <= 0.0 {
            return false;
        }
        let x0 = -self.anchor.x * w;
        let y0 = -self.anchor.y * h;
        p.x >= x0 && p.x < x0 + w && p.y >= y0 && p.y < y0 + h
    }
}

/// A closed set of shape primitives; matched exhaustively by the
/// tessellation builders.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Rectangle(Rectangle),
    Circle { x: f32, y: f32, radius: f32 },
    RoundedRectangle { rect: Rectangle, radius: f32 },
    Polygon { points: Vec<Point> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillStyle {
    pub color: u32,
    pub alpha: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    pub color: u32,
    pub alpha: f32,
}

/// One recorded shape with the styles that were active when it was drawn.
#[derive(Clone, Debug)]
pub struct GraphicsShape {
    pub kind: ShapeKind,
    pub fill: Option<FillStyle>,
    pub line: Option<LineStyle>,
}

/// A vector-shape display list.
///
/// Mutations bump `dirty`; the graphics renderer keys its tessellated
/// geometry on that counter so unchanged shapes never re-tessellate.
#[derive(Debug, Default)]
pub struct GraphicsData {
    shapes: Vec<GraphicsShape>,
    fill: Option<FillStyle>,
    line: Option<LineStyle>,
    dirty: u32,
    pub blend_mode: BlendMode,
}

impl GraphicsData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fill(&mut self, color: u32, alpha: f32) -> &mut Self {
        self.fill = Some(FillStyle { color, alpha });
        self
    }

    pub fn end_fill(&mut self) -> &mut Self {
        self.fill = None;
        self
    }

    /// Zero width disables the outline.
    pub fn line_style(&mut self, width: f32, color: u32, alpha: f32) -> &mut Self {
        self.line = if width > 0.0 {
            Some(LineStyle {
                width,
                color,
                alpha,
            })
        } else {
            None
        };
        self
    }

    pub fn draw_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.push_shape(ShapeKind::Rectangle(Rectangle::new(x, y, width, height)))
    }

    pub fn draw_circle(&mut self, x: f32, y: f32, radius: f32) -> &mut Self {
        self.push_shape(ShapeKind::Circle { x, y, radius })
    }

    pub fn draw_rounded_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
    ) -> &mut Self {
        self.push_shape(ShapeKind::RoundedRectangle {
            rect: Rectangle::new(x, y, width, height),
            radius,
        })
    }

    pub fn draw_polygon(&mut self, points: Vec<Point>) -> &mut Self {
        self.push_shape(ShapeKind::Polygon { points })
    }

    fn push_shape(&mut self, kind: ShapeKind) -> &mut Self {
        self.shapes.push(GraphicsShape {
            kind,
            fill: self.fill,
            line: self.line,
        });
        self.dirty = self.dirty.wrapping_add(1);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.shapes.clear();
        self.fill = None;
        self.line = None;
        self.dirty = self.dirty.wrapping_add(1);
        self
    }

    pub fn shapes(&self) -> &[GraphicsShape] {
        &self.shapes
    }

    pub fn dirty(&self) -> u32 {
        self.dirty
    }

    /// Local-space AABB of one shape, padded by half its outline width.
    pub(crate) fn shape_local_rect(shape: &GraphicsShape) -> Rectangle {
        let pad = shape.line.map(|l| l.width / 2.0).unwrap_or(0.0);
        let r = match &shape.kind {
            ShapeKind::Rectangle(r) => *r,
            ShapeKind::RoundedRectangle { rect, .. } => *rect,
            ShapeKind::Circle { x, y, radius } => {
                Rectangle::new(x - radius, y - radius, radius * 2.0, radius * 2.0)
            }
            ShapeKind::Polygon { points } => {
                let mut min_x = f32::INFINITY;
                let mut min_y = f32::INFINITY;
                let mut max_x = f32::NEG_INFINITY;
                let mut max_y = f32::NEG_INFINITY;
                for p in points {
                    min_x = min_x.min(p.x);
                    min_y = min_y.min(p.y);
                    max_x = max_x.max(p.x);
                    max_y = max_y.max(p.y);
                }
                if min_x > max_x {
                    return Rectangle::EMPTY;
                }
                Rectangle::new(min_x, min_y, max_x - min_x, max_y - min_y)
            }
        };
        Rectangle::new(
            r.x - pad,
            r.y - pad,
            r.width + pad * 2.0,
            r.height + pad * 2.0,
        )
    }
}

/// How mesh indices are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshDrawMode {
    #[default]
    Triangles,
    TriangleStrip,
}

/// Arbitrary textured geometry: interleaved x/y vertices, matching UVs and
/// an index list.
#[derive(Debug)]
pub struct MeshData {
    pub texture: Texture,
    pub vertices: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u16>,
    pub draw_mode: MeshDrawMode,
    pub tint: u32,
    pub blend_mode: BlendMode,
}

impl MeshData {
    pub fn new(texture: Texture, vertices: Vec<f32>, uvs: Vec<f32>, indices: Vec<u16>) -> Self {
        assert_eq!(
            vertices.len(),
            uvs.len(),
            "mesh vertex and uv arrays must pair up"
        );
        Self {
            texture,
            vertices,
            uvs,
            indices,
            draw_mode: MeshDrawMode::default(),
            tint: 0xFFFFFF,
            blend_mode: BlendMode::Normal,
        }
    }
}

/// A texture repeated across a fixed-size region.
#[derive(Debug)]
pub struct TilingSpriteData {
    pub texture: Texture,
    pub width: f32,
    pub height: f32,
    /// Offset of the tile pattern within the region.
    pub tile_position: Point,
    /// Scale of one tile.
    pub tile_scale: Point,
    pub tint: u32,
    pub blend_mode: BlendMode,
}

impl TilingSpriteData {
    pub fn new(texture: Texture, width: f32, height: f32) -> Self {
        Self {
            texture,
            width,
            height,
            tile_position: Point::ZERO,
            tile_scale: Point::new(1.0, 1.0),
            tint: 0xFFFFFF,
            blend_mode: BlendMode::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::BaseTexture;

    fn texture_10x10() -> Texture {
        Texture::from_base(BaseTexture::from_pixels(10, 10, vec![255; 400]))
    }

    #[test]
    fn test_sprite_vertices_anchor_center() {
        let mut sprite = SpriteData::new(texture_10x10());
        sprite.anchor = Point::new(0.5, 0.5);

        let world = Matrix::IDENTITY;
        sprite.calculate_vertices(&world, 1);
        assert_eq!(sprite.vertex_data[0], -5.0);
        assert_eq!(sprite.vertex_data[1], -5.0);
        assert_eq!(sprite.vertex_data[4], 5.0);
        assert_eq!(sprite.vertex_data[5], 5.0);
    }

    #[test]
    fn test_sprite_vertex_cache_hits() {
        let mut sprite = SpriteData::new(texture_10x10());
        let world = Matrix::IDENTITY;
        sprite.calculate_vertices(&world, 1);
        let before = sprite.vertex_data;

        // Same world id: cached corners are untouched even if we poke them.
        sprite.vertex_data[0] = 99.0;
        sprite.calculate_vertices(&world, 1);
        assert_eq!(sprite.vertex_data[0], 99.0);

        // New world id: recompute.
        sprite.calculate_vertices(&world, 2);
        assert_eq!(sprite.vertex_data, before);
    }

    #[test]
    fn test_sprite_hit_test() {
        let mut sprite = SpriteData::new(texture_10x10());
        sprite.anchor = Point::new(0.5, 0.5);
        assert!(sprite.contains_local_point(Point::new(0.0, 0.0)));
        assert!(sprite.contains_local_point(Point::new(-4.9, 4.9)));
        assert!(!sprite.contains_local_point(Point::new(5.1, 0.0)));
    }

    #[test]
    fn test_graphics_dirty_tracking() {
        let mut g = GraphicsData::new();
        let d0 = g.dirty();
        g.begin_fill(0xFF0000, 1.0).draw_rect(0.0, 0.0, 10.0, 10.0);
        assert_ne!(g.dirty(), d0);
        assert_eq!(g.shapes().len(), 1);
        assert!(g.shapes()[0].fill.is_some());

        g.clear();
        assert!(g.shapes().is_empty());
    }

    #[test]
    fn test_shape_rect_includes_line_padding() {
        let mut g = GraphicsData::new();
        g.line_style(4.0, 0xFFFFFF, 1.0).draw_rect(0.0, 0.0, 10.0, 10.0);
        let r = GraphicsData::shape_local_rect(&g.shapes()[0]);
        assert_eq!(r, Rectangle::new(-2.0, -2.0, 14.0, 14.0));
    }

    #[test]
    #[should_panic(expected = "pair up")]
    fn test_mesh_mismatched_uvs_panics() {
        MeshData::new(texture_10x10(), vec![0.0; 8], vec![0.0; 6], vec![0, 1, 2]);
    }
}
