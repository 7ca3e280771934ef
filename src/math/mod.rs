//! Geometry primitives shared by the scene graph and the renderer.

pub mod group_d8;
pub mod matrix;
pub mod point;
pub mod rectangle;

pub use group_d8::TextureRotation;
pub use matrix::{Decomposed, Matrix, SKEW_EPSILON};
pub use point::Point;
pub use rectangle::Rectangle;
