use af_core::error::CoreError;
use af_core::frame::FrameBuffer;
use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};

/// Compensation du ratio des cellules terminal (environ deux fois plus hautes que larges).
pub const CELL_ASPECT: f64 = 0.45;

/// Hauteur de grille pour une largeur `output_width` :
/// `floor(output_width * (src_h / src_w) * 0.45)`.
///
/// Peut valoir 0 pour une source très large ; le resampler le refuse.
///
/// # Example
/// ```
/// use af_source::resize::target_height;
/// assert_eq!(target_height(600, 1920, 1080), 151);
/// assert_eq!(target_height(80, 100, 100), 36);
/// ```
#[must_use]
pub fn target_height(output_width: u32, src_width: u32, src_height: u32) -> u32 {
    if src_width == 0 {
        return 0;
    }
    let aspect = f64::from(src_height) / f64::from(src_width);
    (f64::from(output_width) * aspect * CELL_ASPECT).floor() as u32
}

fn pixel_type(channels: u8) -> Result<PixelType, CoreError> {
    match channels {
        1 => Ok(PixelType::U8),
        2 => Ok(PixelType::U8x2),
        3 => Ok(PixelType::U8x3),
        4 => Ok(PixelType::U8x4),
        other => Err(CoreError::UnsupportedChannels(other)),
    }
}

/// Resizer réutilisable wrappant fast_image_resize (filtre bilinéaire).
///
/// Pré-alloue le resizer pour zéro allocation en hot path.
///
/// # Example
/// ```
/// use af_source::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Copie compacte de la source (l'API exige `&mut` et des lignes sans padding).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new bilinear resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. Dimensions and channels of `dst` determine the output.
    ///
    /// Identical dimensions copy the samples unchanged.
    ///
    /// # Errors
    /// Returns an error if the channel counts differ or the resize fails.
    ///
    /// # Example
    /// ```
    /// use af_source::resize::Resizer;
    /// use af_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let src = FrameBuffer::try_new(100, 100, 3).unwrap();
    /// let mut dst = FrameBuffer::try_new(50, 22, 3).unwrap();
    /// r.resize_into(&src, &mut dst).unwrap();
    /// ```
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if src.channels() != dst.channels() {
            anyhow::bail!(
                "Canaux incompatibles : source {}, destination {}",
                src.channels(),
                dst.channels()
            );
        }
        if dst.width() == 0 || dst.height() == 0 {
            return Err(CoreError::InvalidDimensions {
                width: dst.width(),
                height: dst.height(),
            }
            .into());
        }
        let pixel_type = pixel_type(src.channels())?;

        // Repack ligne par ligne : supprime le padding éventuel du décodeur.
        self.src_buf.clear();
        for y in 0..src.height() {
            self.src_buf.extend_from_slice(src.row(y));
        }

        let dst_packed = dst.is_packed();
        if src.width() == dst.width() && src.height() == dst.height() && dst_packed {
            dst.data_mut()[..self.src_buf.len()].copy_from_slice(&self.src_buf);
            return Ok(());
        }
        if !dst_packed {
            anyhow::bail!("La destination du resize doit être compacte");
        }

        let src_image =
            Image::from_slice_u8(src.width(), src.height(), &mut self.src_buf, pixel_type)
                .context("Invalid source dimensions")?;

        let (dw, dh) = (dst.width(), dst.height());
        let mut dst_image = Image::from_slice_u8(dw, dh, dst.data_mut(), pixel_type)
            .context("Invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;

        Ok(())
    }

    /// Resize `src` into a new packed buffer of `width × height`.
    ///
    /// # Errors
    /// Returns an error if a target dimension is zero, the output buffer
    /// cannot be allocated, or the resize fails.
    ///
    /// # Example
    /// ```
    /// use af_source::resize::Resizer;
    /// use af_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let out = r.resample(&FrameBuffer::try_new(64, 48, 3).unwrap(), 16, 5).unwrap();
    /// assert_eq!(out.data().len(), 16 * 5 * 3);
    /// ```
    pub fn resample(&mut self, src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height }.into());
        }
        let mut dst = FrameBuffer::try_new(width, height, src.channels())?;
        self.resize_into(src, &mut dst)?;
        Ok(dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for one-shot usage on raw samples. DO NOT use in hot path.
///
/// Returns exactly `target_w * target_h * channels` samples.
///
/// # Errors
/// Fails if a dimension is zero, `channels` is outside 1..=4, or `buf` is
/// shorter than `src_w * src_h * channels`.
///
/// # Example
/// ```
/// use af_source::resize::resample;
/// let out = resample(&[0u8; 4 * 4 * 3], 4, 4, 3, 2, 2).unwrap();
/// assert_eq!(out.len(), 2 * 2 * 3);
/// assert!(resample(&[0u8; 10], 4, 4, 3, 2, 2).is_err());
/// ```
pub fn resample(
    buf: &[u8],
    src_w: u32,
    src_h: u32,
    channels: u8,
    target_w: u32,
    target_h: u32,
) -> Result<Vec<u8>> {
    let len = src_w as usize * src_h as usize * usize::from(channels);
    if buf.len() < len {
        return Err(CoreError::BufferTooSmall {
            expected: len,
            actual: buf.len(),
        }
        .into());
    }
    let src = FrameBuffer::from_raw(buf[..len].to_vec(), src_w, src_h, channels)?;
    let dst = Resizer::new().resample(&src, target_w, target_h)?;
    Ok(dst.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_policy() {
        assert_eq!(target_height(600, 1920, 1080), 151);
        assert_eq!(target_height(200, 100, 50), 45);
        assert_eq!(target_height(600, 100_000, 10), 0);
        assert_eq!(target_height(600, 0, 10), 0);
    }

    #[test]
    fn output_length_matches_target() {
        let mut r = Resizer::new();
        for channels in 1..=4u8 {
            let src = FrameBuffer::try_new(37, 23, channels).unwrap();
            for (w, h) in [(1, 1), (10, 4), (37, 23), (80, 60)] {
                let out = r.resample(&src, w, h).unwrap();
                assert_eq!(out.data().len(), w as usize * h as usize * usize::from(channels));
                assert_eq!((out.width(), out.height()), (w, h));
            }
        }
    }

    #[test]
    fn same_size_is_an_exact_copy() {
        let data: Vec<u8> = (0..2 * 2 * 3).collect();
        let out = resample(&data, 2, 2, 3, 2, 2).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn strided_source_is_repacked() {
        // 2×1 RGB avec 4 octets de padding en fin de ligne.
        let src = FrameBuffer::with_stride(vec![1, 2, 3, 4, 5, 6, 9, 9, 9, 9], 2, 1, 3, 10).unwrap();
        let mut dst = FrameBuffer::try_new(2, 1, 3).unwrap();
        Resizer::new().resize_into(&src, &mut dst).unwrap();
        assert_eq!(dst.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn uniform_color_survives_bilinear() {
        let src = FrameBuffer::from_raw([200u8, 40, 90].repeat(64 * 64), 64, 64, 3).unwrap();
        let out = Resizer::new().resample(&src, 7, 3).unwrap();
        // Arrondi à virgule fixe : au plus 1 niveau d'écart.
        for px in out.data().chunks_exact(3) {
            for (got, want) in px.iter().zip([200u8, 40, 90]) {
                assert!(got.abs_diff(want) <= 1, "{px:?}");
            }
        }
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        assert!(resample(&[], 0, 4, 3, 2, 2).is_err());
        assert!(resample(&[0; 48], 4, 4, 3, 0, 2).is_err());
        assert!(resample(&[0; 48], 4, 4, 5, 2, 2).is_err());
        assert!(resample(&[0; 47], 4, 4, 3, 2, 2).is_err());
        let mut r = Resizer::new();
        let mut dst = FrameBuffer::try_new(2, 2, 1).unwrap();
        assert!(r.resize_into(&FrameBuffer::try_new(4, 4, 3).unwrap(), &mut dst).is_err());
    }
}
