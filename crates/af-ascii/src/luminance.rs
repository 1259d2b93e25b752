use af_core::charset::{GLYPH_COUNT, glyph};
use af_core::color::cube_index;
use af_core::frame::AsciiCell;

/// Poids BT.709 ×10 000 (R, G, B). La somme vaut exactement 10 000.
const BT709_R: u32 = 2126;
const BT709_G: u32 = 7152;
const BT709_B: u32 = 722;

/// Luminance maximale dans l'échelle entière (blanc pur).
const LUMA_MAX: u32 = 10_000 * 255;

/// Glyph index for an RGB sample: `floor(L * (N - 1))` with `L` the BT.709
/// relative luminance in `[0, 1]`.
///
/// Computed on integers so pure white lands exactly on the last glyph.
///
/// # Example
/// ```
/// use af_ascii::luminance::glyph_index;
/// assert_eq!(glyph_index(0, 0, 0), 0);
/// assert_eq!(glyph_index(255, 255, 255), 23);
/// assert_eq!(glyph_index(255, 0, 0), 4);
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_index(r: u8, g: u8, b: u8) -> usize {
    let luma = BT709_R * u32::from(r) + BT709_G * u32::from(g) + BT709_B * u32::from(b);
    (luma.min(LUMA_MAX) as usize * (GLYPH_COUNT - 1)) / LUMA_MAX as usize
}

/// Map one RGB sample to its cell: luminance glyph + 6×6×6 cube color.
///
/// # Example
/// ```
/// use af_ascii::luminance::map_pixel;
/// let cell = map_pixel(255, 255, 255);
/// assert_eq!(cell.ch, '@');
/// assert_eq!(cell.color, 231);
/// ```
#[inline(always)]
#[must_use]
pub fn map_pixel(r: u8, g: u8, b: u8) -> AsciiCell {
    AsciiCell {
        ch: glyph(glyph_index(r, g, b)),
        color: cube_index(r, g, b),
    }
}

/// Gray sample, treated as `(v, v, v)`.
///
/// # Example
/// ```
/// use af_ascii::luminance::{map_gray, map_pixel};
/// assert_eq!(map_gray(128), map_pixel(128, 128, 128));
/// ```
#[inline(always)]
#[must_use]
pub fn map_gray(v: u8) -> AsciiCell {
    map_pixel(v, v, v)
}
