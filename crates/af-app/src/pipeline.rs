use std::io::Write;
use std::path::Path;

use af_ascii::renderer::render;
use af_core::config::PlayerConfig;
use af_core::error::CoreError;
use af_render::compositor::{CompositeMode, TerminalWriter};
use af_source::image::load_image;
use af_source::resize::{Resizer, target_height};
use anyhow::{Context, Result};

/// Fail with [`CoreError::FileNotFound`] unless `path` exists.
///
/// # Errors
/// See above.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into())
    }
}

/// Dimensions de grille pour une source `src_w × src_h` : largeur fixe,
/// hauteur corrigée pour les cellules terminal.
///
/// # Errors
/// [`CoreError::InvalidDimensions`] when the source is so wide that the grid
/// would have no rows.
pub fn grid_size(output_width: u32, src_w: u32, src_h: u32) -> Result<(u32, u32)> {
    let height = target_height(output_width, src_w, src_h);
    if output_width == 0 || height == 0 {
        return Err(CoreError::InvalidDimensions {
            width: output_width,
            height,
        })
        .with_context(|| format!("Source {src_w}x{src_h} trop large pour {output_width} colonnes"));
    }
    Ok((output_width, height))
}

/// Mode image : charge, redimensionne, convertit et écrit l'image en une fois.
///
/// # Errors
/// Missing file, decode failure, degenerate geometry, allocation failure or
/// write failure.
pub fn render_image<W: Write>(path: &Path, config: &PlayerConfig, out: W) -> Result<()> {
    ensure_exists(path)?;
    let frame = load_image(path)?;
    let (width, height) = grid_size(config.output_width, frame.width(), frame.height())?;
    log::debug!(
        "render_image: {}x{} → grille {width}x{height}",
        frame.width(),
        frame.height()
    );

    let scaled = Resizer::new().resample(&frame, width, height)?;
    let grid = render(&scaled)?;
    TerminalWriter::new(out, CompositeMode::Scroll).write_frame(&grid)
}
