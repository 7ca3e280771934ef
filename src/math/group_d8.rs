//! The eight orthogonal/diagonal symmetries of a square.
//!
//! Texture-packing tools may store a sprite frame rotated or mirrored inside
//! the atlas; the packed orientation is one of these eight elements and is
//! undone at UV-computation time by permuting quad corners.

/// One of the eight symmetries of the unit square (four rotations, four
/// reflections), applied to a texture frame by an offline packer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TextureRotation {
    #[default]
    Rotate0 = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
    FlipHorizontal = 4,
    FlipVertical = 5,
    /// Reflection across the main diagonal (transpose).
    Transpose = 6,
    /// Reflection across the anti-diagonal.
    AntiTranspose = 7,
}

impl TextureRotation {
    /// Decode a packed orientation value.
    ///
    /// # Panics
    ///
    /// Panics for values outside `0..=7`; an out-of-range orientation in
    /// atlas metadata is a data error, not a runtime condition.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Rotate0,
            1 => Self::Rotate90,
            2 => Self::Rotate180,
            3 => Self::Rotate270,
            4 => Self::FlipHorizontal,
            5 => Self::FlipVertical,
            6 => Self::Transpose,
            7 => Self::AntiTranspose,
            other => panic!("invalid texture rotation value {other}, expected 0..=7"),
        }
    }

    /// True when the orientation swaps the frame's axes, i.e. the packed
    /// width/height are transposed relative to the original sprite.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Transpose | Self::AntiTranspose
        )
    }

    /// Corner permutation undoing this orientation.
    ///
    /// Index `i` of the result names which frame corner (0 = top-left,
    /// 1 = top-right, 2 = bottom-right, 3 = bottom-left, counter-clockwise
    /// in texture space) lands on quad corner `i`.
    pub fn corner_order(self) -> [usize; 4] {
        match self {
            Self::Rotate0 => [0, 1, 2, 3],
            Self::Rotate90 => [3, 0, 1, 2],
            Self::Rotate180 => [2, 3, 0, 1],
            Self::Rotate270 => [1, 2, 3, 0],
            Self::FlipHorizontal => [1, 0, 3, 2],
            Self::FlipVertical => [3, 2, 1, 0],
            Self::Transpose => [0, 3, 2, 1],
            Self::AntiTranspose => [2, 1, 0, 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_values() {
        for v in 0..8u8 {
            assert_eq!(TextureRotation::from_u8(v) as u8, v);
        }
    }

    #[test]
    #[should_panic(expected = "invalid texture rotation")]
    fn test_invalid_value_panics() {
        TextureRotation::from_u8(8);
    }

    #[test]
    fn test_corner_orders_are_permutations() {
        for v in 0..8u8 {
            let mut order = TextureRotation::from_u8(v).corner_order();
            order.sort_unstable();
            assert_eq!(order, [0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_axis_swap() {
        assert!(!TextureRotation::Rotate0.swaps_axes());
        assert!(TextureRotation::Rotate90.swaps_axes());
        assert!(!TextureRotation::FlipHorizontal.swaps_axes());
        assert!(TextureRotation::Transpose.swaps_axes());
    }
}
