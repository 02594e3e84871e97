//! Convenience wrappers over [`image::RgbaImage`].

use crate::foundation::error::{TilekitError, TilekitResult};
use crate::kernels::histogram::DEFAULT_DOT_COEFFICIENTS;
use crate::toolkit::Toolkit;
use image::RgbaImage;

/// Sharpening filter used by the `tilekit sharpen` subcommand.
pub const SHARPEN_3X3: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

fn dims(img: &RgbaImage) -> TilekitResult<(usize, usize)> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(TilekitError::validation(format!(
            "image must be non-empty, got {w}x{h}"
        )));
    }
    Ok((w as usize, h as usize))
}

impl Toolkit {
    /// Blur every channel of `img` and return the result as a new image.
    pub fn blur_image(&self, img: &RgbaImage, radius: usize) -> TilekitResult<RgbaImage> {
        let (w, h) = dims(img)?;
        let mut out = RgbaImage::new(img.width(), img.height());
        self.blur(img.as_raw(), &mut out, w, h, 4, radius, None)?;
        Ok(out)
    }

    /// Filter every channel of `img` with a 3x3 kernel.
    pub fn convolve_image(
        &self,
        img: &RgbaImage,
        coefficients: &[f32; 9],
    ) -> TilekitResult<RgbaImage> {
        let (w, h) = dims(img)?;
        let mut out = RgbaImage::new(img.width(), img.height());
        self.convolve3x3(img.as_raw(), &mut out, 4, w, h, coefficients, None)?;
        Ok(out)
    }

    /// 256-bin luminance histogram of `img`, ignoring alpha.
    pub fn luma_histogram(&self, img: &RgbaImage) -> TilekitResult<Vec<u32>> {
        let (w, h) = dims(img)?;
        self.histogram_dot(img.as_raw(), w, h, 4, Some(DEFAULT_DOT_COEFFICIENTS), None)
    }
}

#[cfg(test)]
#[path = "../tests/unit/imaging.rs"]
mod tests;
