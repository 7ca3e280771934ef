//! Node-local transform state with cached world composition.
//!
//! A `Transform` owns decomposed components (position, scale, rotation,
//! skew, pivot), a local matrix derived from them, and a world matrix
//! composed against the parent during the top-down transform pass. Both
//! matrices are cached behind version counters so an unchanged subtree
//! costs two integer compares per frame.

use crate::math::{Matrix, Point};

/// Sentinel forcing the next world update to recompute unconditionally.
const INVALID_PARENT_ID: u32 = u32::MAX;

/// Local + world transform state for one scene node.
///
/// The world matrix is only valid if it was refreshed since the last
/// ancestor change; `world_id` increments on every world recompute and is
/// what downstream caches (sprite vertices, bounds) compare against.
#[derive(Clone, Debug)]
pub struct Transform {
    position: Point,
    scale: Point,
    pivot: Point,
    skew: Point,
    rotation: f32,

    // Cached trig of rotation ± skew, refreshed when either changes.
    cx: f32,
    sx: f32,
    cy: f32,
    sy: f32,

    local: Matrix,
    world: Matrix,

    local_id: u32,
    current_local_id: u32,
    world_id: u32,
    parent_id: u32,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Point::ZERO,
            scale: Point::new(1.0, 1.0),
            pivot: Point::ZERO,
            skew: Point::ZERO,
            rotation: 0.0,
            cx: 1.0,
            sx: 0.0,
            cy: 0.0,
            sy: 1.0,
            local: Matrix::IDENTITY,
            world: Matrix::IDENTITY,
            local_id: 1,
            current_local_id: 0,
            world_id: 0,
            parent_id: INVALID_PARENT_ID,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn scale(&self) -> Point {
        self.scale
    }

    pub fn pivot(&self) -> Point {
        self.pivot
    }

    pub fn skew(&self) -> Point {
        self.skew
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position.set(x, y);
        self.local_id = self.local_id.wrapping_add(1);
    }

    pub fn set_scale(&mut self, x: f32, y: f32) {
        self.scale.set(x, y);
        self.local_id = self.local_id.wrapping_add(1);
    }

    pub fn set_pivot(&mut self, x: f32, y: f32) {
        self.pivot.set(x, y);
        self.local_id = self.local_id.wrapping_add(1);
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
        self.update_trig();
    }

    pub fn set_skew(&mut self, x: f32, y: f32) {
        self.skew.set(x, y);
        self.update_trig();
    }

    /// Adopt the components of a composed matrix (see
    /// [`Matrix::decompose`] for the rotation/skew disambiguation caveat).
    pub fn set_from_matrix(&mut self, matrix: &Matrix) {
        let d = matrix.decompose();
        self.position = d.position;
        self.scale = d.scale;
        self.rotation = d.rotation;
        self.skew = d.skew;
        self.update_trig();
    }

    fn update_trig(&mut self) {
        self.cx = (self.rotation + self.skew.y).cos();
        self.sx = (self.rotation + self.skew.y).sin();
        self.cy = -(self.rotation - self.skew.x).sin();
        self.sy = (self.rotation - self.skew.x).cos();
        self.local_id = self.local_id.wrapping_add(1);
    }

    /// Recompute the local matrix if any component changed since the last
    /// call. A local change also invalidates the cached world matrix.
    pub fn update_local(&mut self) {
        if self.local_id == self.current_local_id {
            return;
        }
        self.local.a = self.cx * self.scale.x;
        self.local.b = self.sx * self.scale.x;
        self.local.c = self.cy * self.scale.y;
        self.local.d = self.sy * self.scale.y;
        self.local.tx =
            self.position.x - (self.pivot.x * self.local.a + self.pivot.y * self.local.c);
        self.local.ty =
            self.position.y - (self.pivot.x * self.local.b + self.pivot.y * self.local.d);
        self.current_local_id = self.local_id;
        self.parent_id = INVALID_PARENT_ID;
    }

    /// Compose the world matrix as parent-world ∘ local.
    ///
    /// Skips the multiply when neither this transform nor the parent world
    /// changed since the last pass. Returns whether the world matrix was
    /// recomputed; `world_id` is bumped exactly when it was.
    pub(crate) fn update(&mut self, parent_world: &Matrix, parent_world_id: u32) -> bool {
        self.update_local();

        if self.parent_id == parent_world_id {
            return false;
        }
        self.world = parent_world.appended(&self.local);
        self.parent_id = parent_world_id;
        self.world_id = self.world_id.wrapping_add(1);
        true
    }

    pub fn local_matrix(&self) -> Matrix {
        self.local
    }

    pub fn world_matrix(&self) -> Matrix {
        self.world
    }

    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Force the next [`update`](Self::update) to recompute the world
    /// matrix regardless of version counters.
    pub(crate) fn invalidate_world(&mut self) {
        self.parent_id = INVALID_PARENT_ID;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
