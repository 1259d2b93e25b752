use crate::error::CoreError;

/// Buffer de pixels 8 bits, row-major, 1 à 4 canaux.
///
/// Chaque ligne commence à `y * stride` ; `stride` peut dépasser
/// `width * channels` quand le décodeur ajoute du padding en fin de ligne.
/// Les constructeurs valident la géométrie, un `FrameBuffer` est donc
/// toujours indexable sans débordement.
///
/// # Example
/// ```
/// use af_core::frame::FrameBuffer;
/// let fb = FrameBuffer::try_new(10, 10, 3).unwrap();
/// assert_eq!(fb.data().len(), 300);
/// assert!(fb.is_packed());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    stride: usize,
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué (zéros, sans padding).
    ///
    /// La taille est calculée sans débordement et réservée sans abort : une
    /// géométrie trop grande devient une erreur.
    ///
    /// # Errors
    /// [`CoreError::InvalidDimensions`] on a zero dimension,
    /// [`CoreError::UnsupportedChannels`] outside 1..=4,
    /// [`CoreError::Allocation`] if the byte count overflows or cannot be reserved.
    ///
    /// # Example
    /// ```
    /// use af_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::try_new(4, 2, 3).unwrap();
    /// assert_eq!(fb.data().len(), 24);
    /// assert!(FrameBuffer::try_new(0, 2, 3).is_err());
    /// ```
    pub fn try_new(width: u32, height: u32, channels: u8) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if !(1..=4).contains(&channels) {
            return Err(CoreError::UnsupportedChannels(channels));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(usize::from(channels)))
            .ok_or_else(|| {
                CoreError::Allocation(format!("{width}x{height}x{channels} dépasse l'espace adressable"))
            })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| CoreError::Allocation(format!("{len} octets : {e}")))?;
        data.resize(len, 0);
        Self::from_raw(data, width, height, channels)
    }

    /// Wrap packed samples (`stride == width * channels`).
    ///
    /// # Errors
    /// Fails on a zero dimension, a channel count outside 1..=4, or a buffer
    /// shorter than `width * height * channels`.
    ///
    /// # Example
    /// ```
    /// use af_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::from_raw(vec![255, 0, 0, 0, 255, 0], 2, 1, 3).unwrap();
    /// assert_eq!(fb.row(0)[3..], [0, 255, 0]);
    /// assert!(FrameBuffer::from_raw(vec![0; 5], 2, 1, 3).is_err());
    /// ```
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self, CoreError> {
        let stride = width as usize * usize::from(channels);
        Self::with_stride(data, width, height, channels, stride)
    }

    /// Wrap samples whose rows are `stride` bytes apart.
    ///
    /// The last row only needs `width * channels` bytes, trailing padding is optional.
    ///
    /// # Errors
    /// Same as [`FrameBuffer::from_raw`], plus `stride < width * channels`.
    ///
    /// # Example
    /// ```
    /// use af_core::frame::FrameBuffer;
    /// // 1×2 gray frame, each row padded to 4 bytes.
    /// let fb = FrameBuffer::with_stride(vec![10, 0, 0, 0, 20], 1, 2, 1, 4).unwrap();
    /// assert_eq!(fb.row(1), &[20]);
    /// ```
    pub fn with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        stride: usize,
    ) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if !(1..=4).contains(&channels) {
            return Err(CoreError::UnsupportedChannels(channels));
        }
        let row_bytes = width as usize * usize::from(channels);
        if stride < row_bytes {
            return Err(CoreError::BufferTooSmall {
                expected: row_bytes,
                actual: stride,
            });
        }
        let expected = stride
            .saturating_mul(height as usize - 1)
            .saturating_add(row_bytes);
        if data.len() < expected {
            return Err(CoreError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel.
    #[inline]
    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// `true` si les lignes se suivent sans padding.
    #[inline]
    #[must_use]
    pub fn is_packed(&self) -> bool {
        self.stride == self.row_bytes()
    }

    /// Useful bytes per row, `width * channels`.
    #[inline]
    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * usize::from(self.channels)
    }

    /// Raw samples, padding included.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw samples. The length never changes, so the geometry stays valid.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its samples.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Samples of row `y`, without padding.
    ///
    /// # Panics
    /// Panics if `y >= height`.
    #[inline(always)]
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }
}

/// Single cell in the ASCII grid.
///
/// # Example
/// ```
/// use af_core::frame::AsciiCell;
/// let cell = AsciiCell::default();
/// assert_eq!(cell.ch, '.');
/// assert_eq!(cell.color, 16);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AsciiCell {
    /// Caractère à afficher.
    pub ch: char,
    /// Index dans la palette 256 couleurs du terminal.
    pub color: u8,
}

impl Default for AsciiCell {
    fn default() -> Self {
        Self { ch: '.', color: 16 }
    }
}

/// Grille de sortie ASCII, row-major.
///
/// Invariant : `cells.len() == width * height`.
///
/// # Example
/// ```
/// use af_core::frame::{AsciiCell, AsciiGrid};
/// let mut grid = AsciiGrid::try_new(80, 24).unwrap();
/// assert_eq!(grid.cells().len(), 80 * 24);
/// grid.refill(2, 1, [AsciiCell { ch: '@', color: 196 }, AsciiCell::default()]);
/// assert_eq!(grid.cells()[0].ch, '@');
/// assert_eq!(grid.rows().count(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AsciiGrid {
    cells: Vec<AsciiCell>,
    width: u32,
    height: u32,
}

impl AsciiGrid {
    /// Crée une grille pré-allouée, remplie de cellules par défaut.
    ///
    /// # Errors
    /// [`CoreError::Allocation`] if `width * height` cells overflow or cannot
    /// be reserved.
    pub fn try_new(width: u32, height: u32) -> Result<Self, CoreError> {
        let len = (width as usize).checked_mul(height as usize).ok_or_else(|| {
            CoreError::Allocation(format!("grille {width}x{height} hors de l'espace adressable"))
        })?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|e| CoreError::Allocation(format!("grille de {len} cellules : {e}")))?;
        cells.resize(len, AsciiCell::default());
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Width in characters.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in characters.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[AsciiCell] {
        &self.cells
    }

    /// Iterate over rows of `width` cells.
    pub fn rows(&self) -> impl Iterator<Item = &[AsciiCell]> {
        // chunks(0) panique : une grille vide n'a simplement aucune ligne.
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// Replace the whole content, reusing the existing allocation.
    ///
    /// `cells` must yield exactly `width * height` items; the grid is
    /// truncated or padded with default cells otherwise, so the length
    /// invariant always holds. Growing past the current capacity allocates;
    /// size the grid with [`AsciiGrid::try_new`] first to keep that fallible.
    pub fn refill(&mut self, width: u32, height: u32, cells: impl IntoIterator<Item = AsciiCell>) {
        let len = width as usize * height as usize;
        self.cells.clear();
        self.cells.extend(cells.into_iter().take(len));
        self.cells.resize(len, AsciiCell::default());
        self.width = width;
        self.height = height;
    }
}
