use std::path::PathBuf;

use af_core::config::{PlayerConfig, load_config};
use af_core::error::CoreError;
use clap::{Args, Parser};

/// Options partagées par `img2ascii` et `vid2ascii`.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Fichier de configuration TOML ([render] output_width, [playback] max_fps).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Largeur de sortie en colonnes (défaut : 600).
    #[arg(short, long, value_name = "COLS")]
    pub width: Option<u32>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// img2ascii : affiche une image en ASCII art coloré (palette 256 couleurs).
#[derive(Parser, Debug)]
#[command(name = "img2ascii", version, about, long_about = None)]
pub struct ImageCli {
    /// Image source (PNG, JPEG, BMP, GIF).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// vid2ascii : lit une vidéo en ASCII art coloré dans le terminal.
#[derive(Parser, Debug)]
#[command(name = "vid2ascii", version, about, long_about = None)]
pub struct VideoCli {
    /// Vidéo source (tout format lisible par ffmpeg).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Cadence maximale en images/s (défaut : 144, minimum : 1).
    #[arg(long, value_name = "FPS")]
    pub max_fps: Option<f64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Resolve config: `--config` file (or defaults), then CLI overrides.
///
/// # Errors
/// Returns an error if the config file is malformed or `--width` is zero.
pub fn resolve_config(common: &CommonArgs) -> anyhow::Result<PlayerConfig> {
    let mut config = match common.config.as_deref() {
        Some(path) if path.exists() => load_config(path)?,
        Some(path) => {
            log::warn!(
                "Config introuvable : {}. Utilisation des défauts.",
                path.display()
            );
            PlayerConfig::default()
        }
        None => PlayerConfig::default(),
    };
    if let Some(width) = common.width {
        if width == 0 {
            return Err(CoreError::Usage("--width doit être strictement positif".into()).into());
        }
        config.output_width = width;
    }
    Ok(config)
}

/// Video config: [`resolve_config`] plus `--max-fps`, clamped to at least `MIN_FPS`.
///
/// # Errors
/// Same as [`resolve_config`].
pub fn resolve_video_config(cli: &VideoCli) -> anyhow::Result<PlayerConfig> {
    let mut config = resolve_config(&cli.common)?;
    if let Some(fps) = cli.max_fps {
        config.max_fps = fps;
    }
    config.clamp_all();
    Ok(config)
}
