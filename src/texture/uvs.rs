//! Normalized texture coordinates for a frame within its base.

use crate::math::{Rectangle, TextureRotation};

/// The four UV corners of a texture's frame, in quad order (top-left,
/// top-right, bottom-right, bottom-left of the *displayed* sprite), with
/// any atlas rotation already undone.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextureUvs {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub x3: f32,
    pub y3: f32,
}

impl TextureUvs {
    /// Recompute from a frame in base-texture pixel space.
    pub fn set(&mut self, frame: &Rectangle, base_w: u32, base_h: u32, rotate: TextureRotation) {
        let tw = base_w as f32;
        let th = base_h as f32;

        // Frame corners in atlas space, counter-clockwise from top-left.
        let corners = [
            (frame.x / tw, frame.y / th),
            (frame.right() / tw, frame.y / th),
            (frame.right() / tw, frame.bottom() / th),
            (frame.x / tw, frame.bottom() / th),
        ];

        let order = rotate.corner_order();
        (self.x0, self.y0) = corners[order[0]];
        (self.x1, self.y1) = corners[order[1]];
        (self.x2, self.y2) = corners[order[2]];
        (self.x3, self.y3) = corners[order[3]];
    }

    /// Corner `i` (0..4) as a `(u, v)` pair.
    pub fn corner(&self, i: usize) -> (f32, f32) {
        match i {
            0 => (self.x0, self.y0),
            1 => (self.x1, self.y1),
            2 => (self.x2, self.y2),
            3 => (self.x3, self.y3),
            _ => panic!("uv corner index {i} out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrotated_frame() {
        let mut uvs = TextureUvs::default();
        uvs.set(
            &Rectangle::new(16.0, 32.0, 16.0, 16.0),
            64,
            64,
            TextureRotation::Rotate0,
        );
        assert_eq!((uvs.x0, uvs.y0), (0.25, 0.5));
        assert_eq!((uvs.x2, uvs.y2), (0.5, 0.75));
    }

    #[test]
    fn test_rotation_permutes_corners() {
        let frame = Rectangle::new(0.0, 0.0, 32.0, 32.0);
        let mut plain = TextureUvs::default();
        plain.set(&frame, 64, 64, TextureRotation::Rotate0);
        let mut rotated = TextureUvs::default();
        rotated.set(&frame, 64, 64, TextureRotation::Rotate90);

        // The rotated quad's first corner is the plain quad's last.
        assert_eq!(rotated.corner(0), plain.corner(3));
        assert_eq!(rotated.corner(1), plain.corner(0));
    }
}
