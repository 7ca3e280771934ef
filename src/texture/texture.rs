//! A drawable view into a [`BaseTexture`]: frame, trim and atlas rotation.

use crate::math::{Rectangle, TextureRotation};

use super::base::{BaseTexture, SharedBaseTexture};
use super::uvs::TextureUvs;

/// A region of a base texture plus the metadata needed to draw it.
///
/// Many textures may alias one base (sprite sheets); cloning a `Texture`
/// clones the shared handle, not the pixels. A texture is `valid` only when
/// its frame has positive extents, fits the base, and the base has loaded;
/// an invalid texture never reaches a draw call.
#[derive(Clone, Debug)]
pub struct Texture {
    base: SharedBaseTexture,
    frame: Rectangle,
    trim: Option<Rectangle>,
    rotate: TextureRotation,
    uvs: TextureUvs,
    valid: bool,
    no_frame: bool,
    update_id: u32,
    destroyed: bool,
}

impl Texture {
    /// Wrap a region of `base`.
    ///
    /// Passing `None` for `frame` means "the whole base"; the frame then
    /// tracks the base dimensions once it loads.
    ///
    /// # Panics
    ///
    /// Panics when an explicit frame exceeds the loaded base's dimensions.
    /// A frame outside its atlas signals broken packing metadata, not a
    /// runtime condition.
    pub fn new(
        base: SharedBaseTexture,
        frame: Option<Rectangle>,
        trim: Option<Rectangle>,
        rotate: TextureRotation,
    ) -> Self {
        base.borrow().assert_alive();
        let mut texture = Self {
            base,
            frame: Rectangle::EMPTY,
            trim,
            rotate,
            uvs: TextureUvs::default(),
            valid: false,
            no_frame: frame.is_none(),
            update_id: 0,
            destroyed: false,
        };
        match frame {
            Some(rect) => texture.set_frame(rect),
            None => texture.refresh(),
        }
        texture
    }

    /// The whole of `base` as a texture.
    pub fn from_base(base: SharedBaseTexture) -> Self {
        Self::new(base, None, None, TextureRotation::Rotate0)
    }

    /// A permanently-invalid placeholder texture.
    pub fn empty() -> Self {
        Self::from_base(BaseTexture::pending("<empty>"))
    }

    /// A new view of the same base with a different frame.
    pub fn new_from_frame(&self, frame: Rectangle) -> Self {
        Self::new(self.base.clone(), Some(frame), None, self.rotate)
    }

    pub fn base(&self) -> &SharedBaseTexture {
        &self.base
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    pub fn trim(&self) -> Option<Rectangle> {
        self.trim
    }

    pub fn rotate(&self) -> TextureRotation {
        self.rotate
    }

    pub fn uvs(&self) -> &TextureUvs {
        &self.uvs
    }

    /// Bumped whenever frame or rotation changes, letting consumers detect
    /// staleness with one integer compare instead of recomputing.
    pub fn update_id(&self) -> u32 {
        self.update_id
    }

    pub fn valid(&self) -> bool {
        if self.destroyed || !self.valid {
            return false;
        }
        let base = self.base.borrow();
        base.loaded() && !base.destroyed()
    }

    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// Display width: the untrimmed extents when trimmed, otherwise the
    /// frame (axis-corrected for rotated atlas entries).
    pub fn width(&self) -> f32 {
        match self.trim {
            Some(t) => t.width,
            None if self.rotate.swaps_axes() => self.frame.height,
            None => self.frame.width,
        }
    }

    pub fn height(&self) -> f32 {
        match self.trim {
            Some(t) => t.height,
            None if self.rotate.swaps_axes() => self.frame.width,
            None => self.frame.height,
        }
    }

    /// Set the visible sub-rectangle of the base.
    ///
    /// Validation happens before any mutation: on a loaded base an
    /// out-of-bounds frame panics and leaves the texture untouched.
    pub fn set_frame(&mut self, frame: Rectangle) {
        self.assert_alive();
        let (base_w, base_h, base_loaded) = {
            let base = self.base.borrow();
            (base.width() as f32, base.height() as f32, base.loaded())
        };

        if base_loaded {
            assert!(
                frame.x >= 0.0
                    && frame.y >= 0.0
                    && frame.right() <= base_w
                    && frame.bottom() <= base_h,
                "texture frame {frame:?} does not fit base texture {base_w}x{base_h}"
            );
        }

        self.frame = frame;
        self.no_frame = false;
        self.valid = base_loaded && frame.width > 0.0 && frame.height > 0.0;
        if self.valid {
            self.update_uvs();
        }
        self.update_id = self.update_id.wrapping_add(1);
    }

    pub fn set_rotate(&mut self, rotate: TextureRotation) {
        self.assert_alive();
        self.rotate = rotate;
        if self.valid {
            self.update_uvs();
        }
        self.update_id = self.update_id.wrapping_add(1);
    }

    /// Re-derive frame/validity after the base finished loading. Frameless
    /// textures adopt the full base extents.
    pub fn refresh(&mut self) {
        self.assert_alive();
        let (w, h, loaded) = {
            let base = self.base.borrow();
            (base.width() as f32, base.height() as f32, base.loaded())
        };
        if !loaded {
            self.valid = false;
            return;
        }
        if self.no_frame {
            self.frame = Rectangle::new(0.0, 0.0, w, h);
        }
        self.valid = self.frame.width > 0.0
            && self.frame.height > 0.0
            && self.frame.right() <= w
            && self.frame.bottom() <= h;
        if self.valid {
            self.update_uvs();
            self.update_id = self.update_id.wrapping_add(1);
        }
    }

    fn update_uvs(&mut self) {
        let base = self.base.borrow();
        self.uvs
            .set(&self.frame, base.width(), base.height(), self.rotate);
    }

    /// Invalidate this texture; with `destroy_base` the shared base is
    /// tombstoned as well.
    ///
    /// The cascade is opt-in because bases are commonly shared by many
    /// textures (sprite sheets): destroying the base while siblings still
    /// reference it marks them invalid rather than leaving dangling GPU
    /// memory, but it is still almost always wrong unless this texture is
    /// the sole owner.
    pub fn destroy(&mut self, destroy_base: bool) {
        self.assert_alive();
        if destroy_base {
            self.base.borrow_mut().destroy();
        }
        self.destroyed = true;
        self.valid = false;
    }

    fn assert_alive(&self) {
        assert!(!self.destroyed, "texture used after destroy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::base::BaseTexture;

    fn base_4x4() -> SharedBaseTexture {
        BaseTexture::from_pixels(4, 4, vec![255; 64])
    }

    #[test]
    fn test_full_frame_texture_is_valid() {
        let t = Texture::from_base(base_4x4());
        assert!(t.valid());
        assert_eq!(t.frame(), Rectangle::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(t.width(), 4.0);
    }

    #[test]
    #[should_panic(expected = "does not fit base texture")]
    fn test_oversized_frame_panics() {
        Texture::new(
            base_4x4(),
            Some(Rectangle::new(2.0, 0.0, 4.0, 4.0)),
            None,
            TextureRotation::Rotate0,
        );
    }

    #[test]
    fn test_unloaded_base_is_invalid_until_refresh() {
        let base = BaseTexture::pending("later.png");
        let mut t = Texture::from_base(base.clone());
        assert!(!t.valid());

        base.borrow_mut().set_loaded_pixels(2, 2, vec![0; 16]);
        t.refresh();
        assert!(t.valid());
        assert_eq!(t.frame(), Rectangle::new(0.0, 0.0, 2.0, 2.0));
    }

    #[test]
    fn test_frame_change_bumps_update_id() {
        let mut t = Texture::from_base(base_4x4());
        let before = t.update_id();
        t.set_frame(Rectangle::new(0.0, 0.0, 2.0, 2.0));
        assert_ne!(t.update_id(), before);
        assert!(t.valid());
    }

    #[test]
    fn test_rotated_texture_swaps_display_dims() {
        let mut t = Texture::new(
            base_4x4(),
            Some(Rectangle::new(0.0, 0.0, 4.0, 2.0)),
            None,
            TextureRotation::Rotate90,
        );
        assert_eq!(t.width(), 2.0);
        assert_eq!(t.height(), 4.0);
        t.set_rotate(TextureRotation::Rotate0);
        assert_eq!(t.width(), 4.0);
    }

    #[test]
    fn test_destroy_cascade_invalidates_siblings() {
        let base = base_4x4();
        let mut a = Texture::from_base(base.clone());
        let b = Texture::from_base(base);

        a.destroy(true);
        assert!(!a.valid());
        // The sibling shares the tombstoned base and reports invalid
        // instead of dangling.
        assert!(!b.valid());
    }

    #[test]
    #[should_panic(expected = "used after destroy")]
    fn test_double_destroy_panics() {
        let mut t = Texture::from_base(base_4x4());
        t.destroy(false);
        t.destroy(false);
    }
}
