use std::path::Path;

use af_core::error::CoreError;
use af_core::frame::FrameBuffer;
use anyhow::{Context, Result};
use image::DynamicImage;

/// Charge une image et conserve ses canaux natifs (gris, gris+alpha, RGB, RGBA).
///
/// Les formats 16 bits ou flottants sont ramenés à 8 bits.
///
/// # Errors
/// [`CoreError::FileNotFound`] if `path` does not exist, [`CoreError::Decode`]
/// if the file cannot be decoded.
///
/// # Example
/// ```no_run
/// use af_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("test.png")).unwrap();
/// assert!(frame.width() > 0);
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let img = image::open(path)
        .map_err(|e| CoreError::Decode(e.to_string()))
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let frame = to_frame(img)?;
    log::info!(
        "load_image: {}x{} ({} canaux) : {}",
        frame.width(),
        frame.height(),
        frame.channels(),
        path.display()
    );
    Ok(frame)
}

/// Convert a decoded image to a packed 8-bit frame.
///
/// # Errors
/// Returns an error for an empty (0×N) image.
pub fn to_frame(img: DynamicImage) -> Result<FrameBuffer> {
    let (width, height) = (img.width(), img.height());
    let (data, channels) = match img {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
        DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), 2),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
        other @ DynamicImage::ImageLuma16(_) => (other.to_luma8().into_raw(), 1),
        other @ DynamicImage::ImageLumaA16(_) => (other.to_luma_alpha8().into_raw(), 2),
        other if other.color().has_alpha() => (other.to_rgba8().into_raw(), 4),
        other => (other.to_rgb8().into_raw(), 3),
    };
    Ok(FrameBuffer::from_raw(data, width, height, channels)?)
}
