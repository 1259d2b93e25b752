/// Premier index du cube 6×6×6 dans la palette 256 couleurs.
pub const CUBE_OFFSET: u8 = 16;

/// Largeur d'un palier par canal (255 / 5).
pub const CUBE_STEP: u8 = 51;

/// Quantize an RGB triple onto the 6×6×6 cube of the 256-color terminal palette.
///
/// Each channel is split into 6 bins of width 51, the last one also covering 255.
///
/// # Example
/// ```
/// use af_core::color::cube_index;
/// assert_eq!(cube_index(0, 0, 0), 16);
/// assert_eq!(cube_index(255, 255, 255), 231);
/// assert_eq!(cube_index(255, 0, 0), 196);
/// ```
#[inline(always)]
#[must_use]
pub fn cube_index(r: u8, g: u8, b: u8) -> u8 {
    CUBE_OFFSET + 36 * (r / CUBE_STEP) + 6 * (g / CUBE_STEP) + b / CUBE_STEP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_stays_in_palette_range() {
        for v in 0..=255u8 {
            let idx = cube_index(v, v, v);
            assert!((16..=231).contains(&idx), "index hors cube: {idx}");
            assert_eq!(cube_index(v, 0, 0), 16 + 36 * (v / 51));
            assert_eq!(cube_index(0, v, 0), 16 + 6 * (v / 51));
            assert_eq!(cube_index(0, 0, v), 16 + v / 51);
        }
    }

    #[test]
    fn bin_edges() {
        assert_eq!(cube_index(50, 50, 50), 16);
        assert_eq!(cube_index(51, 51, 51), 16 + 36 + 6 + 1);
        assert_eq!(cube_index(254, 254, 254), 16 + 36 * 4 + 6 * 4 + 4);
        assert_eq!(cube_index(255, 255, 255), 231);
    }
}
