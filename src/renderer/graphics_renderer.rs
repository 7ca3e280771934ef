//! Vector-shape rendering with cached tessellation.
//!
//! Tessellating a path is the expensive part, so the derived geometry is
//! cached per (node, context) and keyed by the graphics payload's dirty
//! counter: re-rendering an unchanged shape is a cache hit, a mutated
//! shape re-tessellates once, and a fresh context (loss/restore, second
//! renderer) gets its own entry.

use std::collections::HashMap;

use crate::math::{Matrix, Point};
use crate::scene::{
    FillStyle, GraphicsData, GraphicsShape, LineStyle, NodeId, NodePayload, Scene, ShapeKind,
};

use super::binder::TextureBinder;
use super::device::{ColorVertex, ContextId, GpuDevice, ShaderKind};
use super::plugin::ObjectRenderer;
use super::sprite_batch::tint_rgba;

/// Entries kept before stale-context eviction kicks in.
const GEOMETRY_CACHE_LIMIT: usize = 256;

/// Tessellated geometry in shape-local space. Colors carry the style
/// alpha; world alpha multiplies in at draw time.
struct CachedGeometry {
    dirty: u32,
    positions: Vec<Point>,
    colors: Vec<[f32; 4]>,
    indices: Vec<u16>,
}

pub struct GraphicsRenderer {
    cache: HashMap<(u64, ContextId), CachedGeometry>,
}

impl GraphicsRenderer {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub fn cached_geometries(&self) -> usize {
        self.cache.len()
    }

    fn prune(&mut self, current: ContextId) {
        if self.cache.len() > GEOMETRY_CACHE_LIMIT {
            // Entries from dead context incarnations can never hit again.
            self.cache.retain(|(_, context), _| *context == current);
        }
    }
}

impl Default for GraphicsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: GpuDevice> ObjectRenderer<D> for GraphicsRenderer {
    fn start(&mut self, device: &mut D) {
        device.set_shader(ShaderKind::Color);
    }

    // Immediate-mode: every render_node submits, nothing is buffered.
    fn stop(&mut self, _device: &mut D) {}

    fn flush(&mut self, _device: &mut D) {}

    fn render_node(
        &mut self,
        device: &mut D,
        _binder: &mut TextureBinder,
        projection: &Matrix,
        scene: &mut Scene,
        node: NodeId,
    ) {
        let key = node.as_u64();
        let node = scene.node(node);
        let world = node.transform.world_matrix();
        let world_alpha = node.world_alpha();
        let NodePayload::Graphics(graphics) = &node.payload else {
            return;
        };
        if graphics.shapes().is_empty() {
            return;
        }

        let context = device.context_id();
        let needs_build = self
            .cache
            .get(&(key, context))
            .map(|entry| entry.dirty != graphics.dirty())
            .unwrap_or(true);
        if needs_build {
            self.cache.insert((key, context), tessellate(graphics));
            self.prune(context);
        }

        let entry = &self.cache[&(key, context)];
        if entry.indices.is_empty() {
            return;
        }

        let mut full = *projection;
        full.append(&world);
        let vertices: Vec<ColorVertex> = entry
            .positions
            .iter()
            .zip(&entry.colors)
            .map(|(p, c)| {
                let ndc = full.apply(*p);
                ColorVertex {
                    position: [ndc.x, ndc.y],
                    color: [c[0], c[1], c[2], c[3] * world_alpha],
                }
            })
            .collect();

        device.draw_indexed(
            None,
            bytemuck::cast_slice(&vertices),
            &entry.indices,
            graphics.blend_mode,
        );
    }
}

// ----- path builders ------------------------------------------------------

fn tessellate(graphics: &GraphicsData) -> CachedGeometry {
    let mut geo = CachedGeometry {
        dirty: graphics.dirty(),
        positions: Vec::new(),
        colors: Vec::new(),
        indices: Vec::new(),
    };
    for shape in graphics.shapes() {
        if let Some(fill) = shape.fill {
            build_fill(shape, fill, &mut geo);
        }
        if let Some(line) = shape.line {
            build_line(shape, line, &mut geo);
        }
    }
    geo
}

fn circle_segments(radius: f32) -> usize {
    ((radius.abs().sqrt() * 8.0).ceil() as usize).clamp(8, 128)
}

/// Closed outline of a shape, counter-clockwise in a y-down space.
fn outline_points(kind: &ShapeKind) -> Vec<Point> {
    match kind {
        ShapeKind::Rectangle(r) => vec![
            Point::new(r.x, r.y),
            Point::new(r.right(), r.y),
            Point::new(r.right(), r.bottom()),
            Point::new(r.x, r.bottom()),
        ],
        ShapeKind::Circle { x, y, radius } => {
            let segments = circle_segments(*radius);
            (0..segments)
                .map(|i| {
                    let theta = (i as f32 / segments as f32) * std::f32::consts::TAU;
                    Point::new(x + theta.cos() * radius, y + theta.sin() * radius)
                })
                .collect()
        }
        ShapeKind::RoundedRectangle { rect, radius } => {
            let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
            if r <= 0.0 {
                return outline_points(&ShapeKind::Rectangle(*rect));
            }
            // Quarter arcs around the four inset corner centers.
            let centers = [
                (rect.right() - r, rect.y + r, -std::f32::consts::FRAC_PI_2),
                (rect.right() - r, rect.bottom() - r, 0.0),
                (rect.x + r, rect.bottom() - r, std::f32::consts::FRAC_PI_2),
                (rect.x + r, rect.y + r, std::f32::consts::PI),
            ];
            let arc_segments = circle_segments(r).max(4) / 2;
            let mut points = Vec::with_capacity(centers.len() * (arc_segments + 1));
            for (cx, cy, start) in centers {
                for i in 0..=arc_segments {
                    let theta = start + (i as f32 / arc_segments as f32) * std::f32::consts::FRAC_PI_2;
                    points.push(Point::new(cx + theta.cos() * r, cy + theta.sin() * r));
                }
            }
            points
        }
        ShapeKind::Polygon { points } => {
            let mut points = points.clone();
            // A repeated terminal point marks an explicitly closed path.
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            points
        }
    }
}

fn build_fill(shape: &GraphicsShape, fill: FillStyle, geo: &mut CachedGeometry) {
    let color = tint_rgba(fill.color, fill.alpha);
    match &shape.kind {
        ShapeKind::Rectangle(r) => {
            let base = geo.positions.len() as u16;
            geo.positions.extend_from_slice(&[
                Point::new(r.x, r.y),
                Point::new(r.right(), r.y),
                Point::new(r.right(), r.bottom()),
                Point::new(r.x, r.bottom()),
            ]);
            geo.colors.extend(std::iter::repeat(color).take(4));
            geo.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        ShapeKind::Circle { .. } | ShapeKind::RoundedRectangle { .. } => {
            // Convex outlines fan from an interior point.
            let ring = outline_points(&shape.kind);
            let (cx, cy) = match &shape.kind {
                ShapeKind::Circle { x, y, .. } => (*x, *y),
                ShapeKind::RoundedRectangle { rect, .. } => {
                    (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
                }
                _ => unreachable!(),
            };
            let base = geo.positions.len() as u16;
            geo.positions.push(Point::new(cx, cy));
            geo.colors.push(color);
            let n = ring.len() as u16;
            for p in &ring {
                geo.positions.push(*p);
                geo.colors.push(color);
            }
            for i in 0..n {
                let a = base + 1 + i;
                let b = base + 1 + (i + 1) % n;
                geo.indices.extend_from_slice(&[base, a, b]);
            }
        }
        ShapeKind::Polygon { .. } => {
            let ring = outline_points(&shape.kind);
            if ring.len() < 3 {
                return;
            }
            let base = geo.positions.len() as u16;
            let local = ear_clip(&ring);
            for p in &ring {
                geo.positions.push(*p);
                geo.colors.push(color);
            }
            geo.indices.extend(local.iter().map(|i| base + i));
        }
    }
}

fn build_line(shape: &GraphicsShape, line: LineStyle, geo: &mut CachedGeometry) {
    let points = outline_points(&shape.kind);
    if points.len() < 2 {
        return;
    }
    let closed = !matches!(&shape.kind, ShapeKind::Polygon { points } if points.first() != points.last());
    let color = tint_rgba(line.color, line.alpha);
    let half = line.width / 2.0;

    let segment_count = if closed {
        points.len()
    } else {
        points.len() - 1
    };
    for i in 0..segment_count {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            continue;
        }
        let nx = -dy / len * half;
        let ny = dx / len * half;

        let base = geo.positions.len() as u16;
        geo.positions.extend_from_slice(&[
            Point::new(a.x + nx, a.y + ny),
            Point::new(b.x + nx, b.y + ny),
            Point::new(b.x - nx, b.y - ny),
            Point::new(a.x - nx, a.y - ny),
        ]);
        geo.colors.extend(std::iter::repeat(color).take(4));
        geo.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Ear-clipping triangulation of a simple polygon. Returns indices into
/// `points`. Handles either winding; degenerate input yields what it can.
fn ear_clip(points: &[Point]) -> Vec<u16> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    // Normalize to counter-clockwise (positive signed area in y-down space
    // means clockwise on screen, but consistency is all that matters here).
    let mut order: Vec<u16> = (0..n as u16).collect();
    let signed_area: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (b.x - a.x) * (b.y + a.y))
        .sum();
    if signed_area > 0.0 {
        order.reverse();
    }

    let cross = |o: Point, a: Point, b: Point| -> f32 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };
    let point_in_triangle = |p: Point, a: Point, b: Point, c: Point| -> bool {
        let d1 = cross(p, a, b);
        let d2 = cross(p, b, c);
        let d3 = cross(p, c, a);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_neg && has_pos)
    };

    let mut indices = Vec::with_capacity((n - 2) * 3);
    let mut remaining = order;
    'outer: while remaining.len() > 3 {
        let m = remaining.len();
        for i in 0..m {
            let prev = points[remaining[(i + m - 1) % m] as usize];
            let ear = points[remaining[i] as usize];
            let next = points[remaining[(i + 1) % m] as usize];

            if cross(prev, ear, next) <= 0.0 {
                continue;
            }
            let contains_other = remaining.iter().enumerate().any(|(j, &idx)| {
                let skip = j == i || j == (i + m - 1) % m || j == (i + 1) % m;
                !skip && point_in_triangle(points[idx as usize], prev, ear, next)
            });
            if contains_other {
                continue;
            }

            indices.extend_from_slice(&[
                remaining[(i + m - 1) % m],
                remaining[i],
                remaining[(i + 1) % m],
            ]);
            remaining.remove(i);
            continue 'outer;
        }
        // No ear found: degenerate or self-intersecting input. Stop rather
        // than loop forever.
        log::warn!("polygon triangulation bailed out with {m} vertices left");
        break;
    }
    if remaining.len() == 3 {
        indices.extend_from_slice(&[remaining[0], remaining[1], remaining[2]]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{GpuOp, RecordingDevice};

    fn graphics_scene() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let g = scene.graphics();
        scene
            .graphics_mut(g)
            .begin_fill(0xFF8800, 1.0)
            .draw_rect(0.0, 0.0, 10.0, 10.0);
        scene.update_transforms(g);
        (scene, g)
    }

    #[test]
    fn test_unchanged_shape_reuses_tessellation() {
        let (mut scene, g) = graphics_scene();
        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut renderer = GraphicsRenderer::new();
        let projection = Matrix::IDENTITY;

        renderer.render_node(&mut device, &mut binder, &projection, &mut scene, g);
        renderer.render_node(&mut device, &mut binder, &projection, &mut scene, g);
        assert_eq!(renderer.cached_geometries(), 1);
        assert_eq!(device.draw_count(), 2);
    }

    #[test]
    fn test_mutation_retessellates_and_new_context_rebuilds() {
        let (mut scene, g) = graphics_scene();
        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut renderer = GraphicsRenderer::new();
        let projection = Matrix::IDENTITY;

        renderer.render_node(&mut device, &mut binder, &projection, &mut scene, g);
        scene.graphics_mut(g).draw_circle(20.0, 20.0, 5.0);
        renderer.render_node(&mut device, &mut binder, &projection, &mut scene, g);
        assert_eq!(renderer.cached_geometries(), 1);

        // A restored context has a fresh id, so geometry rebuilds per
        // context instead of reusing a dead incarnation's entry.
        device.lose_context();
        device.restore_context();
        renderer.render_node(&mut device, &mut binder, &projection, &mut scene, g);
        assert_eq!(renderer.cached_geometries(), 2);
    }

    #[test]
    fn test_rect_fill_geometry() {
        let (mut scene, g) = graphics_scene();
        let mut device = RecordingDevice::new();
        let mut binder = TextureBinder::new();
        let mut renderer = GraphicsRenderer::new();
        let projection = Matrix::IDENTITY;

        renderer.start(&mut device);
        renderer.render_node(&mut device, &mut binder, &projection, &mut scene, g);
        let GpuOp::Draw {
            shader,
            vertex_count,
            index_count,
            ..
        } = device.ops().last().unwrap()
        else {
            panic!("expected a draw");
        };
        assert_eq!(*shader, ShaderKind::Color);
        assert_eq!(*vertex_count, 4);
        assert_eq!(*index_count, 6);
    }

    #[test]
    fn test_ear_clip_square_and_concave() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(ear_clip(&square).len(), 6);

        // L-shaped hexagon: 6 vertices, 4 triangles.
        let l_shape = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(ear_clip(&l_shape).len(), 12);
    }
}
