/// 24 glyphes ordonnés du plus sombre au plus clair.
pub const GLYPHS: &str = ".:;=ox+*?SXE$O8NZHMW#BQ@";

/// Same gradient as [`GLYPHS`], indexable without UTF-8 decoding.
pub const GLYPH_TABLE: [char; GLYPH_COUNT] = [
    '.', ':', ';', '=', 'o', 'x', '+', '*', '?', 'S', 'X', 'E', '$', 'O', '8', 'N', 'Z', 'H', 'M',
    'W', '#', 'B', 'Q', '@',
];

/// Nombre de glyphes de la palette.
pub const GLYPH_COUNT: usize = 24;

/// Glyph at position `index` in the gradient, saturating at the lightest one.
///
/// # Example
/// ```
/// use af_core::charset::{glyph, GLYPH_COUNT};
/// assert_eq!(glyph(0), '.');
/// assert_eq!(glyph(GLYPH_COUNT - 1), '@');
/// assert_eq!(glyph(1000), '@');
/// ```
#[inline(always)]
#[must_use]
pub fn glyph(index: usize) -> char {
    GLYPH_TABLE[index.min(GLYPH_COUNT - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_gradient_string() {
        let chars: Vec<char> = GLYPHS.chars().collect();
        assert_eq!(chars.len(), GLYPH_COUNT);
        assert_eq!(chars.as_slice(), GLYPH_TABLE.as_slice());
    }

    #[test]
    fn glyphs_are_unique_and_printable() {
        for (i, ch) in GLYPH_TABLE.iter().enumerate() {
            assert!(ch.is_ascii_graphic(), "glyphe non imprimable: {ch:?}");
            assert_eq!(GLYPH_TABLE.iter().position(|c| c == ch), Some(i));
        }
    }
}
