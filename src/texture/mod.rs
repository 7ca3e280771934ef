//! Texture identity, metadata and GPU-upload lifecycle.
//!
//! The pipeline has two levels of ownership: a [`BaseTexture`] owns the
//! pixel source (and is shared, reference-counted, by every view of it),
//! while a [`Texture`] owns only frame/trim/rotation metadata describing a
//! region of its base. GPU-side handles live in a per-context map on the
//! base and are a disposable cache recreated after context loss.

pub mod base;
pub mod registry;
pub mod texture;
pub mod uvs;

pub use base::{BaseTexture, ScaleMode, SharedBaseTexture};
pub use registry::{sniff_source_kind, SourceKind, TextureRegistry};
pub use texture::Texture;
pub use uvs::TextureUvs;
