use af_core::error::CoreError;
use af_core::frame::{AsciiCell, AsciiGrid, FrameBuffer};

use crate::luminance::{map_gray, map_pixel};

/// Convert a resampled frame into a fresh grid, one cell per pixel.
///
/// # Errors
/// [`CoreError::Allocation`] if the grid cannot be allocated.
///
/// # Example
/// ```
/// use af_core::frame::FrameBuffer;
/// use af_ascii::renderer::render;
///
/// let frame = FrameBuffer::from_raw(vec![255, 0, 0, 0, 0, 0], 2, 1, 3).unwrap();
/// let grid = render(&frame).unwrap();
/// assert_eq!(grid.cells().len(), 2);
/// assert_eq!(grid.cells()[0].color, 196);
/// assert_eq!(grid.cells()[1].ch, '.');
/// ```
pub fn render(frame: &FrameBuffer) -> Result<AsciiGrid, CoreError> {
    let mut grid = AsciiGrid::try_new(frame.width(), frame.height())?;
    render_into(frame, &mut grid);
    Ok(grid)
}

/// Convert `frame` into `grid`, reusing the grid's allocation.
///
/// Rows are addressed through the frame's stride, so decoder padding is
/// never read. The grid takes the frame's dimensions.
pub fn render_into(frame: &FrameBuffer, grid: &mut AsciiGrid) {
    let channels = usize::from(frame.channels());
    let cells = (0..frame.height()).flat_map(|y| row_cells(frame.row(y), channels));
    grid.refill(frame.width(), frame.height(), cells);
}

/// Cells of one unpadded row: RGB triples from 3+ channels, gray otherwise.
fn row_cells(row: &[u8], channels: usize) -> impl Iterator<Item = AsciiCell> + '_ {
    row.chunks_exact(channels).map(move |px| {
        if channels >= 3 {
            map_pixel(px[0], px[1], px[2])
        } else {
            map_gray(px[0])
        }
    })
}
