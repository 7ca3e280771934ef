//! Arena-based scene graph.
//!
//! All nodes live in a dense vector owned by [`Scene`]; handles are
//! generational [`NodeId`]s, so a stale handle (a destroyed node, or a slot
//! that was since reused) is detected instead of silently corrupting state.
//! Parent links are non-owning back-references; a parent's child list is
//! insertion-ordered and that order is the paint order, back to front.
//!
//! The scene also runs the two tree-wide passes the renderer depends on:
//! top-down transform propagation (`update_transforms`) and lazily cached
//! world-bounds aggregation (`bounds` / `local_bounds`).

pub mod node;
pub mod payload;

use crate::bounds::Bounds;
use crate::math::{Matrix, Point, Rectangle};
use crate::texture::Texture;
use crate::transform::Transform;

pub use node::{Node, NodeFlags};
pub use payload::{
    FillStyle, GraphicsData, GraphicsShape, LineStyle, MeshData, MeshDrawMode, NodePayload,
    ShapeKind, SpriteData, TilingSpriteData,
};

/// Generational handle to a node.
///
/// The generation half catches use-after-destroy: a destroyed node's slot
/// may be reused, but the stale id keeps the old generation and every
/// accessor rejects it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Stable 64-bit key (e.g. for per-node renderer caches).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

/// Synchronous lifecycle notification, emitted during the mutating call
/// and drained by the embedder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    Added { child: NodeId, parent: NodeId },
    Removed { child: NodeId, parent: NodeId },
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

/// Owner of every node; see the module docs.
pub struct Scene {
    dense: Vec<Node>,
    sparse: Vec<Option<SparseEntry>>,
    free_indices: Vec<u32>,
    events: Vec<SceneEvent>,
    /// Scratch parent a root node updates against, so the hot path never
    /// branches on "has no parent".
    root_parent: Transform,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            events: Vec::new(),
            root_parent: Transform::new(),
        }
    }

    // ----- creation -------------------------------------------------------

    /// Insert a detached node carrying `payload`.
    pub fn spawn(&mut self, payload: NodePayload) -> NodeId {
        let (sparse_index, generation) = if let Some(index) = self.free_indices.pop() {
            let old_gen = self.sparse[index as usize]
                .as_ref()
                .map(|e| e.generation)
                .unwrap_or(0);
            (index, old_gen.wrapping_add(1))
        } else {
            let index = self.sparse.len() as u32;
            self.sparse.push(None);
            (index, 0)
        };

        let dense_index = self.dense.len();
        self.dense.push(Node::new(payload, sparse_index));
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        NodeId {
            index: sparse_index,
            generation,
        }
    }

    /// An empty grouping node.
    pub fn container(&mut self) -> NodeId {
        self.spawn(NodePayload::Empty)
    }

    pub fn sprite(&mut self, texture: Texture) -> NodeId {
        self.spawn(NodePayload::Sprite(SpriteData::new(texture)))
    }

    pub fn graphics(&mut self) -> NodeId {
        self.spawn(NodePayload::Graphics(GraphicsData::new()))
    }

    pub fn mesh(&mut self, mesh: MeshData) -> NodeId {
        self.spawn(NodePayload::Mesh(mesh))
    }

    pub fn tiling_sprite(&mut self, texture: Texture, width: f32, height: f32) -> NodeId {
        self.spawn(NodePayload::TilingSprite(TilingSpriteData::new(
            texture, width, height,
        )))
    }

    // ----- lookup ---------------------------------------------------------

    fn dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    fn idx(&self, id: NodeId) -> usize {
        self.dense_index(id)
            .unwrap_or_else(|| panic!("scene node {id:?} used after destroy"))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Borrow a node. Panics on a stale id; resource-lifecycle misuse is a
    /// programming error, not a condition to limp through.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.dense[self.idx(id)]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let idx = self.idx(id);
        &mut self.dense[idx]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.dense_index(id).map(|i| &self.dense[i])
    }

    // ----- display state --------------------------------------------------

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        let idx = self.idx(id);
        if self.dense[idx].flags.contains(NodeFlags::VISIBLE) != visible {
            self.dense[idx].flags.set(NodeFlags::VISIBLE, visible);
            self.invalidate_bounds_up(id);
        }
    }

    pub fn set_renderable(&mut self, id: NodeId, renderable: bool) {
        let idx = self.idx(id);
        if self.dense[idx].flags.contains(NodeFlags::RENDERABLE) != renderable {
            self.dense[idx].flags.set(NodeFlags::RENDERABLE, renderable);
            self.invalidate_bounds_up(id);
        }
    }

    pub fn set_alpha(&mut self, id: NodeId, alpha: f32) {
        let idx = self.idx(id);
        self.dense[idx].alpha = alpha;
    }

    /// Attach or clear a mask. The mask node is referenced, not owned; it
    /// clips this node's bounds contribution to the intersection with the
    /// mask's own bounds.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<NodeId>) {
        if let Some(m) = mask {
            assert!(self.contains(m), "mask node {m:?} used after destroy");
        }
        let idx = self.idx(id);
        self.dense[idx].mask = mask;
        self.invalidate_bounds_up(id);
    }

    /// Mutable transform access. World matrices refresh on the next
    /// transform pass.
    pub fn transform_mut(&mut self, id: NodeId) -> &mut Transform {
        let idx = self.idx(id);
        &mut self.dense[idx].transform
    }

    // ----- payload access -------------------------------------------------

    /// Mutable sprite payload. Panics when the node is not a sprite.
    ///
    /// Handing out mutable access conservatively invalidates the sprite's
    /// cached corners and the bounds chain (anchor or texture changes are
    /// not observable through version counters alone).
    pub fn sprite_mut(&mut self, id: NodeId) -> &mut SpriteData {
        self.invalidate_bounds_up(id);
        let idx = self.idx(id);
        match &mut self.dense[idx].payload {
            NodePayload::Sprite(data) => {
                data.invalidate_vertex_cache();
                data
            }
            other => panic!("node {id:?} is not a sprite (payload {other:?})"),
        }
    }

    /// Mutable graphics payload. Panics when the node is not a graphics.
    pub fn graphics_mut(&mut self, id: NodeId) -> &mut GraphicsData {
        self.invalidate_bounds_up(id);
        let idx = self.idx(id);
        match &mut self.dense[idx].payload {
            NodePayload::Graphics(data) => data,
            other => panic!("node {id:?} is not a graphics (payload {other:?})"),
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> &mut MeshData {
        self.invalidate_bounds_up(id);
        let idx = self.idx(id);
        match &mut self.dense[idx].payload {
            NodePayload::Mesh(data) => data,
            other => panic!("node {id:?} is not a mesh (payload {other:?})"),
        }
    }

    pub fn tiling_sprite_mut(&mut self, id: NodeId) -> &mut TilingSpriteData {
        self.invalidate_bounds_up(id);
        let idx = self.idx(id);
        match &mut self.dense[idx].payload {
            NodePayload::TilingSprite(data) => data,
            other => panic!("node {id:?} is not a tiling sprite (payload {other:?})"),
        }
    }

    // ----- hierarchy ------------------------------------------------------

    /// Append `child` to `parent`'s child list (top of the paint order).
    ///
    /// Reparents silently if the child is already in another container,
    /// emitting `Removed` for the old parent and `Added` for the new one,
    /// both synchronously.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let count = self.node(parent).children.len();
        self.add_child_at(parent, child, count);
    }

    /// Insert `child` at `index` in the paint order.
    ///
    /// # Panics
    ///
    /// Panics on stale ids, on `index > len`, and on attempts to create a
    /// cycle (adding a node to itself or to one of its descendants).
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) {
        assert!(
            parent != child,
            "cannot add node {child:?} as a child of itself"
        );
        let parent_idx = self.idx(parent);
        self.idx(child);

        // Reject cycles: walking up from the parent must not reach child.
        let mut cursor = self.dense[parent_idx].parent;
        while let Some(ancestor) = cursor {
            assert!(
                ancestor != child,
                "cannot add node {child:?} below its own descendant {parent:?}"
            );
            cursor = self.dense[self.idx(ancestor)].parent;
        }

        let child_count = self.dense[parent_idx].children.len();
        assert!(
            index <= child_count,
            "child index {index} out of range (0..={child_count})"
        );

        if let Some(old_parent) = self.dense[self.idx(child)].parent {
            self.remove_child(old_parent, child);
        }

        // Index may have shifted if child was already inside this parent.
        let parent_idx = self.idx(parent);
        let index = index.min(self.dense[parent_idx].children.len());
        self.dense[parent_idx].children.insert(index, child);

        let child_idx = self.idx(child);
        self.dense[child_idx].parent = Some(parent);
        // A new parent means a new world ancestry even if version counters
        // happen to line up.
        self.dense[child_idx].transform.invalidate_world();

        self.invalidate_bounds_up(parent);
        self.events.push(SceneEvent::Added { child, parent });
    }

    /// Transfer `child` into `parent`'s child list; sugar for `add_child`
    /// from the child's point of view.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.add_child(parent, child);
    }

    /// Detach `child` from `parent`. Returns `false` when it was not a
    /// child of `parent` (not an error: mirrors remove-by-value semantics).
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let parent_idx = self.idx(parent);
        let Some(pos) = self.dense[parent_idx]
            .children
            .iter()
            .position(|&c| c == child)
        else {
            return false;
        };
        self.dense[parent_idx].children.remove(pos);

        let child_idx = self.idx(child);
        self.dense[child_idx].parent = None;
        self.dense[child_idx].transform.invalidate_world();

        self.invalidate_bounds_up(parent);
        self.events.push(SceneEvent::Removed { child, parent });
        true
    }

    /// Detach the child at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> NodeId {
        let parent_idx = self.idx(parent);
        let count = self.dense[parent_idx].children.len();
        assert!(index < count, "child index {index} out of range (0..{count})");
        let child = self.dense[parent_idx].children[index];
        self.remove_child(parent, child);
        child
    }

    /// Detach the children in `begin..end` (`end` defaults to the list
    /// length). Panics on an invalid range.
    pub fn remove_children(
        &mut self,
        parent: NodeId,
        begin: usize,
        end: Option<usize>,
    ) -> Vec<NodeId> {
        let parent_idx = self.idx(parent);
        let count = self.dense[parent_idx].children.len();
        let end = end.unwrap_or(count);
        assert!(
            begin <= end && end <= count,
            "remove_children range {begin}..{end} out of range (len {count})"
        );
        let removed: Vec<NodeId> = self.dense[parent_idx].children[begin..end].to_vec();
        for &child in &removed {
            self.remove_child(parent, child);
        }
        removed
    }

    /// Position of `child` in `parent`'s paint order.
    ///
    /// # Panics
    ///
    /// Panics when `child` is not a child of `parent`.
    pub fn get_child_index(&self, parent: NodeId, child: NodeId) -> usize {
        self.node(parent)
            .children
            .iter()
            .position(|&c| c == child)
            .unwrap_or_else(|| panic!("node {child:?} is not a child of {parent:?}"))
    }

    /// Move `child` to `index` in the paint order. Panics when the child is
    /// absent or the index out of range.
    pub fn set_child_index(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let current = self.get_child_index(parent, child);
        let parent_idx = self.idx(parent);
        let count = self.dense[parent_idx].children.len();
        assert!(index < count, "child index {index} out of range (0..{count})");
        self.dense[parent_idx].children.remove(current);
        self.dense[parent_idx].children.insert(index, child);
        self.invalidate_bounds_up(parent);
    }

    /// Swap two children's paint-order positions. Panics when either is not
    /// a child of `parent`.
    pub fn swap_children(&mut self, parent: NodeId, a: NodeId, b: NodeId) {
        let ia = self.get_child_index(parent, a);
        let ib = self.get_child_index(parent, b);
        let parent_idx = self.idx(parent);
        self.dense[parent_idx].children.swap(ia, ib);
        self.invalidate_bounds_up(parent);
    }

    /// Walk to the root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Drain lifecycle notifications accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // ----- destruction ----------------------------------------------------

    /// Destroy a node: sever the parent link, tombstone the id, and free
    /// the slot. With `destroy_children` the whole subtree goes; otherwise
    /// the children are orphaned as detached roots.
    ///
    /// Any later use of the id (including a second destroy) panics.
    pub fn destroy(&mut self, id: NodeId, destroy_children: bool) {
        let idx = self.idx(id);

        if let Some(parent) = self.dense[idx].parent {
            self.remove_child(parent, id);
        }

        let idx = self.idx(id);
        let children = std::mem::take(&mut self.dense[idx].children);
        for child in children {
            let child_idx = self.idx(child);
            self.dense[child_idx].parent = None;
            if destroy_children {
                self.destroy(child, true);
            }
        }

        self.unregister(id);
    }

    /// Free a slot: swap-remove from dense storage and fix up the moved
    /// node's sparse entry.
    fn unregister(&mut self, id: NodeId) {
        let dense_index = self.idx(id);
        let last_dense_index = self.dense.len() - 1;

        self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index && !self.dense.is_empty() {
            let moved_sparse = self.dense[dense_index].sparse_index;
            if let Some(entry) = self.sparse[moved_sparse as usize].as_mut() {
                entry.dense_index = dense_index;
            }
        }

        self.sparse[id.index as usize] = None;
        self.free_indices.push(id.index);
    }

    // ----- transform propagation ------------------------------------------

    /// Recompute world transforms and world alpha for `root`'s subtree,
    /// top-down. The root composes against the shared scratch parent
    /// (identity, alpha 1) regardless of any real parent link, so the hot
    /// path never branches on "has no parent". Call once per frame before
    /// rendering or querying world state, passing the tree root.
    pub fn update_transforms(&mut self, root: NodeId) {
        self.idx(root);
        let parent_world = self.root_parent.world_matrix();
        let parent_world_id = self.root_parent.world_id();
        self.update_node_recursive(root, parent_world, parent_world_id, 1.0);
    }

    /// Returns whether anything in the subtree recomputed its world
    /// matrix; a changed descendant dirties this node's bounds cache.
    fn update_node_recursive(
        &mut self,
        id: NodeId,
        parent_world: Matrix,
        parent_world_id: u32,
        parent_alpha: f32,
    ) -> bool {
        let Some(idx) = self.dense_index(id) else {
            return false;
        };
        if !self.dense[idx].flags.contains(NodeFlags::VISIBLE) {
            return false;
        }

        let node = &mut self.dense[idx];
        let self_changed = node.transform.update(&parent_world, parent_world_id);
        node.world_alpha = node.alpha * parent_alpha;

        let world = node.transform.world_matrix();
        let world_id = node.transform.world_id();
        let alpha = node.world_alpha;
        let children = node.children.clone();

        let mut changed = self_changed;
        for child in children {
            changed |= self.update_node_recursive(child, world, world_id, alpha);
        }

        if changed {
            let node = &mut self.dense[idx];
            node.bounds_id = node.bounds_id.wrapping_add(1);
        }
        changed
    }

    // ----- bounds ---------------------------------------------------------

    /// World-space axis-aligned bounds of `id`'s subtree.
    ///
    /// Unless `skip_update` is set, forces a transform refresh of the whole
    /// tree containing the node first. Results are cached: a second call
    /// with no intervening mutation re-uses the cached box without
    /// recomputation.
    pub fn bounds(&mut self, id: NodeId, skip_update: bool) -> Rectangle {
        self.idx(id);
        if !skip_update {
            let root = self.root_of(id);
            self.update_transforms(root);
        }
        self.ensure_bounds(id);
        self.node(id).bounds.rectangle()
    }

    /// Bounds in the node's own coordinate space.
    ///
    /// Substitutes an identity transform for the duration of the call and
    /// restores the real one afterwards; the computation between swap and
    /// restore is infallible, so the restore runs on every exit path.
    pub fn local_bounds(&mut self, id: NodeId) -> Rectangle {
        let idx = self.idx(id);

        let saved = std::mem::replace(&mut self.dense[idx].transform, Transform::new());

        let scratch_world = self.root_parent.world_matrix();
        let scratch_world_id = self.root_parent.world_id();
        self.update_node_recursive(id, scratch_world, scratch_world_id, 1.0);
        self.ensure_bounds(id);
        let rect = self.dense[self.idx(id)].bounds.rectangle();

        let idx = self.idx(id);
        self.dense[idx].transform = saved;
        // The temporary pass left identity-space worlds and bounds in the
        // subtree; force both to refresh on next use.
        self.invalidate_subtree(id);

        rect
    }

    pub(crate) fn invalidate_subtree(&mut self, id: NodeId) {
        let Some(idx) = self.dense_index(id) else {
            return;
        };
        self.dense[idx].transform.invalidate_world();
        self.dense[idx].bounds_id = self.dense[idx].bounds_id.wrapping_add(1);
        if let NodePayload::Sprite(sprite) = &mut self.dense[idx].payload {
            sprite.invalidate_vertex_cache();
        }
        let children = self.dense[idx].children.clone();
        for child in children {
            self.invalidate_subtree(child);
        }
    }

    /// Bump the bounds version of `id` and every ancestor, so cached boxes
    /// along the chain recompute on next read (invalidate-on-write).
    fn invalidate_bounds_up(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(idx) = self.dense_index(node_id) else {
                break;
            };
            self.dense[idx].bounds_id = self.dense[idx].bounds_id.wrapping_add(1);
            current = self.dense[idx].parent;
        }
    }

    fn ensure_bounds(&mut self, id: NodeId) {
        let Some(idx) = self.dense_index(id) else {
            return;
        };
        if self.dense[idx].bounds_id != self.dense[idx].last_bounds_id {
            self.calculate_bounds(id);
        }
    }

    /// Recompute the cached world bounds: own payload plus the union of
    /// visible+renderable children, masked children clipped to their
    /// mask's box.
    fn calculate_bounds(&mut self, id: NodeId) {
        let mut bounds = Bounds::new();
        self.add_payload_bounds(id, &mut bounds);

        let idx = self.idx(id);
        let children = self.dense[idx].children.clone();
        for child in children {
            let Some(child_idx) = self.dense_index(child) else {
                continue;
            };
            let flags = self.dense[child_idx].flags;
            if !flags.contains(NodeFlags::VISIBLE) || !flags.contains(NodeFlags::RENDERABLE) {
                continue;
            }

            self.ensure_bounds(child);
            let child_bounds = self.dense[self.idx(child)].bounds.clone();

            let mask = self.dense[self.idx(child)].mask;
            match mask.and_then(|m| self.dense_index(m).map(|_| m)) {
                Some(mask_id) => {
                    self.ensure_bounds(mask_id);
                    let mask_bounds = self.dense[self.idx(mask_id)].bounds.clone();
                    bounds.add_bounds_masked(&child_bounds, &mask_bounds);
                }
                None => bounds.add_bounds(&child_bounds),
            }
        }

        let idx = self.idx(id);
        let node = &mut self.dense[idx];
        node.bounds = bounds;
        node.last_bounds_id = node.bounds_id;
        node.bounds_recomputes = node.bounds_recomputes.wrapping_add(1);
    }

    /// Accumulate the node's own drawable extents in world space.
    fn add_payload_bounds(&mut self, id: NodeId, bounds: &mut Bounds) {
        let idx = self.idx(id);
        let node = &mut self.dense[idx];
        let world = node.transform.world_matrix();
        let world_id = node.transform.world_id();

        match &mut node.payload {
            NodePayload::Empty => {}
            NodePayload::Sprite(sprite) => {
                if sprite.texture.valid() {
                    sprite.calculate_vertices(&world, world_id);
                    bounds.add_quad(&sprite.vertex_data);
                }
            }
            NodePayload::Graphics(graphics) => {
                for shape in graphics.shapes() {
                    let r = GraphicsData::shape_local_rect(shape);
                    if !r.is_empty() {
                        bounds.add_frame(&world, r.x, r.y, r.right(), r.bottom());
                    }
                }
            }
            NodePayload::Mesh(mesh) => {
                bounds.add_vertices(&world, &mesh.vertices);
            }
            NodePayload::TilingSprite(tiling) => {
                bounds.add_frame(&world, 0.0, 0.0, tiling.width, tiling.height);
            }
        }
    }

    // ----- coordinate conversion ------------------------------------------

    /// Map a point from `id`'s local space to the root coordinate space.
    pub fn to_global(&mut self, id: NodeId, p: Point, skip_update: bool) -> Point {
        self.idx(id);
        if !skip_update {
            let root = self.root_of(id);
            self.update_transforms(root);
        }
        self.node(id).transform.world_matrix().apply(p)
    }

    /// Map a point into `id`'s local space. With `from`, the input is
    /// interpreted in `from`'s local space instead of global space.
    pub fn to_local(
        &mut self,
        id: NodeId,
        p: Point,
        from: Option<NodeId>,
        skip_update: bool,
    ) -> Point {
        let global = match from {
            Some(source) => self.to_global(source, p, skip_update),
            None => {
                self.idx(id);
                if !skip_update {
                    let root = self.root_of(id);
                    self.update_transforms(root);
                }
                p
            }
        };
        self.node(id).transform.world_matrix().apply_inverse(global)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
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
    fn test_add_remove_child_events() {
        let mut scene = Scene::new();
        let parent = scene.container();
        let child = scene.container();

        scene.add_child(parent, child);
        assert_eq!(scene.node(child).parent(), Some(parent));
        assert_eq!(scene.node(parent).children(), &[child]);

        scene.remove_child(parent, child);
        assert_eq!(scene.node(child).parent(), None);

        let events = scene.drain_events();
        assert_eq!(
            events,
            vec![
                SceneEvent::Added { child, parent },
                SceneEvent::Removed { child, parent },
            ]
        );
    }

    #[test]
    fn test_reparent_emits_removed_then_added() {
        let mut scene = Scene::new();
        let a = scene.container();
        let b = scene.container();
        let child = scene.container();

        scene.add_child(a, child);
        scene.drain_events();

        scene.set_parent(child, b);
        let events = scene.drain_events();
        assert_eq!(
            events,
            vec![
                SceneEvent::Removed { child, parent: a },
                SceneEvent::Added { child, parent: b },
            ]
        );
        assert!(scene.node(a).children().is_empty());
        assert_eq!(scene.node(child).parent(), Some(b));
    }

    #[test]
    #[should_panic(expected = "child of itself")]
    fn test_self_parent_panics() {
        let mut scene = Scene::new();
        let a = scene.container();
        scene.add_child(a, a);
    }

    #[test]
    #[should_panic(expected = "below its own descendant")]
    fn test_cycle_panics() {
        let mut scene = Scene::new();
        let a = scene.container();
        let b = scene.container();
        scene.add_child(a, b);
        scene.add_child(b, a);
    }

    #[test]
    fn test_child_index_management() {
        let mut scene = Scene::new();
        let parent = scene.container();
        let a = scene.container();
        let b = scene.container();
        let c = scene.container();
        scene.add_child(parent, a);
        scene.add_child(parent, b);
        scene.add_child(parent, c);

        assert_eq!(scene.get_child_index(parent, b), 1);
        scene.swap_children(parent, a, c);
        assert_eq!(scene.node(parent).children(), &[c, b, a]);

        scene.set_child_index(parent, b, 0);
        assert_eq!(scene.node(parent).children(), &[b, c, a]);

        let removed = scene.remove_children(parent, 1, None);
        assert_eq!(removed, vec![c, a]);
        assert_eq!(scene.node(parent).children(), &[b]);
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn test_stale_id_panics() {
        let mut scene = Scene::new();
        let a = scene.container();
        scene.destroy(a, false);
        scene.node(a);
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn test_double_destroy_panics() {
        let mut scene = Scene::new();
        let a = scene.container();
        scene.destroy(a, false);
        scene.destroy(a, false);
    }

    #[test]
    fn test_destroy_orphans_or_destroys_children() {
        let mut scene = Scene::new();
        let parent = scene.container();
        let child = scene.container();
        scene.add_child(parent, child);
        scene.destroy(parent, false);
        assert!(scene.contains(child));
        assert_eq!(scene.node(child).parent(), None);

        let parent2 = scene.container();
        scene.add_child(parent2, child);
        scene.destroy(parent2, true);
        assert!(!scene.contains(child));
    }

    #[test]
    fn test_slot_reuse_keeps_old_ids_stale() {
        let mut scene = Scene::new();
        let a = scene.container();
        scene.destroy(a, false);
        let b = scene.container();
        // Same slot, new generation.
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_world_alpha_propagates() {
        let mut scene = Scene::new();
        let root = scene.container();
        let child = scene.container();
        scene.add_child(root, child);
        scene.set_alpha(root, 0.5);
        scene.set_alpha(child, 0.5);

        scene.update_transforms(root);
        assert!((scene.node(child).world_alpha() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_world_transform_composes_down_the_tree() {
        let mut scene = Scene::new();
        let root = scene.container();
        let child = scene.container();
        scene.add_child(root, child);

        scene.transform_mut(root).set_position(100.0, 0.0);
        scene.transform_mut(child).set_position(0.0, 50.0);
        scene.update_transforms(root);

        let p = scene.to_global(child, Point::ZERO, true);
        assert_eq!((p.x, p.y), (100.0, 50.0));

        let back = scene.to_local(child, Point::new(100.0, 50.0), None, true);
        assert_eq!((back.x, back.y), (0.0, 0.0));
    }

    #[test]
    fn test_container_bounds_of_child_sprite() {
        let mut scene = Scene::new();
        let container = scene.container();
        let sprite = scene.sprite(texture_10x10());
        scene.add_child(container, sprite);
        scene.transform_mut(sprite).set_position(30.0, 20.0);

        let rect = scene.bounds(container, false);
        assert_eq!(rect, Rectangle::new(30.0, 20.0, 10.0, 10.0));
    }

    #[test]
    fn test_invisible_child_contributes_nothing() {
        let mut scene = Scene::new();
        let container = scene.container();
        let sprite = scene.sprite(texture_10x10());
        scene.add_child(container, sprite);
        scene.transform_mut(sprite).set_position(30.0, 20.0);
        scene.bounds(container, false);

        scene.set_visible(sprite, false);
        let rect = scene.bounds(container, false);
        assert_eq!(rect, Rectangle::new(0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_bounds_cache_idempotent() {
        let mut scene = Scene::new();
        let container = scene.container();
        let sprite = scene.sprite(texture_10x10());
        scene.add_child(container, sprite);

        let first = scene.bounds(container, false);
        let recomputes = scene.node(container).bounds_recompute_count();

        let second = scene.bounds(container, false);
        assert_eq!(first, second);
        assert_eq!(
            scene.node(container).bounds_recompute_count(),
            recomputes,
            "second getBounds without mutation must not recompute"
        );

        // A transform mutation invalidates and recomputes once.
        scene.transform_mut(sprite).set_position(5.0, 5.0);
        scene.bounds(container, false);
        assert_eq!(
            scene.node(container).bounds_recompute_count(),
            recomputes + 1
        );
    }

    #[test]
    fn test_local_bounds_of_centered_sprite() {
        let mut scene = Scene::new();
        let sprite = scene.sprite(texture_10x10());
        scene.sprite_mut(sprite).anchor = Point::new(0.5, 0.5);
        scene.transform_mut(sprite).set_position(200.0, 300.0);

        let local = scene.local_bounds(sprite);
        assert_eq!(local, Rectangle::new(-5.0, -5.0, 10.0, 10.0));

        // The real transform is restored: world bounds are back at the
        // translated position.
        let world = scene.bounds(sprite, false);
        assert_eq!(world, Rectangle::new(195.0, 295.0, 10.0, 10.0));
    }

    #[test]
    fn test_masked_child_clips_contribution() {
        let mut scene = Scene::new();
        let container = scene.container();
        let sprite = scene.sprite(texture_10x10());
        let mask = scene.graphics();
        scene
            .graphics_mut(mask)
            .begin_fill(0xFFFFFF, 1.0)
            .draw_rect(0.0, 0.0, 4.0, 4.0);
        scene.add_child(container, sprite);
        scene.add_child(container, mask);
        scene.set_renderable(mask, false);
        scene.set_mask(sprite, Some(mask));

        let rect = scene.bounds(container, false);
        assert_eq!(rect, Rectangle::new(0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn test_unloaded_texture_sprite_has_empty_bounds() {
        let mut scene = Scene::new();
        let pending = Texture::from_base(BaseTexture::pending("later.png"));
        let sprite = scene.sprite(pending);
        let rect = scene.bounds(sprite, false);
        assert_eq!(rect, Rectangle::EMPTY);
    }
}
