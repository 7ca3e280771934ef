//! Render-target bookkeeping.

use crate::math::Matrix;
use crate::texture::Texture;

use super::device::TargetHandle;

/// Where draws land: the screen (`handle == None`) or an offscreen target.
///
/// The renderer holds exactly one active target at a time; binding a new
/// one must flush any pending batch first (see the renderer core).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub(crate) handle: Option<TargetHandle>,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub(crate) fn screen(width: u32, height: u32) -> Self {
        Self {
            handle: None,
            width,
            height,
        }
    }

    /// Pixel-space → normalized-device-coordinate mapping for this target.
    pub(crate) fn projection(&self) -> Matrix {
        Matrix::new(
            2.0 / self.width as f32,
            0.0,
            0.0,
            -2.0 / self.height as f32,
            -1.0,
            1.0,
        )
    }
}

/// A texture whose contents are produced by rendering into it.
///
/// The sampling side is an ordinary [`Texture`] (usable by sprites); the
/// target side is bound through `Renderer::render`'s `target` parameter.
/// Contents exist only on the GPU: after a context loss they are not
/// recoverable from a CPU descriptor and the texture simply stops drawing
/// until re-rendered.
#[derive(Debug)]
pub struct RenderTexture {
    texture: Texture,
    pub(crate) target: TargetHandle,
    pub width: u32,
    pub height: u32,
}

impl RenderTexture {
    pub(crate) fn new(texture: Texture, target: TargetHandle, width: u32, height: u32) -> Self {
        Self {
            texture,
            target,
            width,
            height,
        }
    }

    /// The sampling side, cloneable into sprites.
    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point;

    #[test]
    fn test_projection_maps_corners() {
        let target = RenderTarget::screen(800, 600);
        let m = target.projection();
        let tl = m.apply(Point::new(0.0, 0.0));
        let br = m.apply(Point::new(800.0, 600.0));
        assert_eq!((tl.x, tl.y), (-1.0, 1.0));
        assert_eq!((br.x, br.y), (1.0, -1.0));
    }
}
