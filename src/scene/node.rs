//! A single node of the scene graph.

use bitflags::bitflags;

use crate::bounds::Bounds;
use crate::transform::Transform;

use super::payload::NodePayload;
use super::NodeId;

bitflags! {
    /// Render-relevant node state bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Invisible nodes skip transform updates, bounds contribution and
        /// rendering for their whole subtree.
        const VISIBLE = 1 << 0;
        /// Non-renderable nodes keep their transforms updated but are
        /// skipped (with their subtree) at draw and bounds time.
        const RENDERABLE = 1 << 1;
    }
}

/// One scene-graph node: a transform, display state, an optional drawable
/// payload, and links into the hierarchy.
///
/// The parent link is a non-owning back-reference; ownership of a node
/// always rests with the [`Scene`](super::Scene) arena, and membership in a
/// parent's child list is what keeps it in the paint order.
#[derive(Debug)]
pub struct Node {
    pub payload: NodePayload,
    pub transform: Transform,

    pub(crate) alpha: f32,
    pub(crate) world_alpha: f32,
    pub(crate) flags: NodeFlags,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Clips this node's bounds contribution; not owned.
    pub(crate) mask: Option<NodeId>,

    // Cached world bounds with the invalidate-on-write / compute-on-read
    // dirty pair. `bounds_recomputes` counts actual recomputations so the
    // caching contract is observable.
    pub(crate) bounds: Bounds,
    pub(crate) bounds_id: u32,
    pub(crate) last_bounds_id: u32,
    pub(crate) bounds_recomputes: u32,

    /// Back-pointer into the sparse index table (swap-remove fixup).
    pub(crate) sparse_index: u32,
}

impl Node {
    pub(crate) fn new(payload: NodePayload, sparse_index: u32) -> Self {
        Self {
            payload,
            transform: Transform::new(),
            alpha: 1.0,
            world_alpha: 1.0,
            flags: NodeFlags::VISIBLE | NodeFlags::RENDERABLE,
            parent: None,
            children: Vec::new(),
            mask: None,
            bounds: Bounds::new(),
            bounds_id: 1,
            last_bounds_id: 0,
            bounds_recomputes: 0,
            sparse_index,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Own alpha multiplied down the ancestor chain; refreshed by the
    /// transform pass.
    pub fn world_alpha(&self) -> f32 {
        self.world_alpha
    }

    pub fn visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    pub fn renderable(&self) -> bool {
        self.flags.contains(NodeFlags::RENDERABLE)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mask(&self) -> Option<NodeId> {
        self.mask
    }

    /// How many times the cached bounds were actually recomputed.
    pub fn bounds_recompute_count(&self) -> u32 {
        self.bounds_recomputes
    }
}
