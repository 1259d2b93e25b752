use std::fmt::Write as _;
use std::io::Write;

use af_core::frame::AsciiGrid;
use anyhow::{Context, Result};
use crossterm::Command;
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, ResetColor, SetForegroundColor};

/// Octets par cellule dans le pire cas : `ESC[38;5;NNNm` + glyphe ASCII.
const CELL_BYTES: usize = 12;

/// Placement d'une frame dans le terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    /// Image fixe : le texte s'ajoute à la suite de la sortie.
    Scroll,
    /// Vidéo : curseur ramené en haut à gauche, la frame écrase la précédente.
    Overwrite,
}

/// Serialize `grid` into `out` (cleared first).
///
/// Every cell gets its own color escape, even when unchanged from the
/// previous cell; each row ends with a reset and a line break.
///
/// # Example
/// ```
/// use af_core::frame::{AsciiCell, AsciiGrid};
/// use af_render::compositor::{composite_into, CompositeMode};
///
/// let mut grid = AsciiGrid::default();
/// grid.refill(1, 1, [AsciiCell { ch: '@', color: 231 }]);
/// let mut out = String::new();
/// composite_into(&grid, CompositeMode::Scroll, &mut out);
/// assert_eq!(out, "\x1b[38;5;231m@\x1b[0m\n");
/// ```
pub fn composite_into(grid: &AsciiGrid, mode: CompositeMode, out: &mut String) {
    out.clear();
    out.reserve(grid.cells().len() * CELL_BYTES + grid.height() as usize * 5 + 8);

    // Écrire dans un String ne peut pas échouer.
    if mode == CompositeMode::Overwrite {
        let _ = MoveTo(0, 0).write_ansi(out);
    }
    for row in grid.rows() {
        for cell in row {
            let _ = SetForegroundColor(Color::AnsiValue(cell.color)).write_ansi(out);
            out.push(cell.ch);
        }
        let _ = ResetColor.write_ansi(out);
        let _ = out.write_char('\n');
    }
}

/// Serialize `grid` into a new string.
///
/// # Example
/// ```
/// use af_core::frame::AsciiGrid;
/// use af_render::compositor::{composite, CompositeMode};
/// let text = composite(&AsciiGrid::try_new(3, 2).unwrap(), CompositeMode::Overwrite);
/// assert_eq!(text.matches("\x1b[0m").count(), 2);
/// ```
#[must_use]
pub fn composite(grid: &AsciiGrid, mode: CompositeMode) -> String {
    let mut out = String::new();
    composite_into(grid, mode, &mut out);
    out
}

/// Écrit des frames composées sur un flux de sortie.
///
/// Une frame = un seul `write_all` suivi d'un `flush`. Le buffer texte est
/// réutilisé d'une frame à l'autre.
///
/// # Example
/// ```
/// use af_core::frame::AsciiGrid;
/// use af_render::compositor::{CompositeMode, TerminalWriter};
///
/// let mut out = Vec::new();
/// let mut writer = TerminalWriter::new(&mut out, CompositeMode::Scroll);
/// writer.write_frame(&AsciiGrid::try_new(2, 2).unwrap()).unwrap();
/// assert_eq!(writer.frames_written(), 1);
/// assert!(!out.is_empty());
/// ```
pub struct TerminalWriter<W: Write> {
    out: W,
    mode: CompositeMode,
    buf: String,
    frames_written: u64,
}

impl<W: Write> TerminalWriter<W> {
    /// Wrap an output stream.
    pub fn new(out: W, mode: CompositeMode) -> Self {
        Self {
            out,
            mode,
            buf: String::new(),
            frames_written: 0,
        }
    }

    /// Compose and write one frame.
    ///
    /// # Errors
    /// Returns an error if the write or the flush fails (e.g. closed pipe).
    pub fn write_frame(&mut self, grid: &AsciiGrid) -> Result<()> {
        composite_into(grid, self.mode, &mut self.buf);
        self.out
            .write_all(self.buf.as_bytes())
            .context("Écriture de la frame impossible")?;
        self.out.flush().context("Flush de la sortie impossible")?;
        self.frames_written += 1;
        Ok(())
    }

    /// Frames écrites depuis la création.
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

}
