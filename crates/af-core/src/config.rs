use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clock::MIN_FPS;

/// Largeur de sortie par défaut, en colonnes.
pub const DEFAULT_OUTPUT_WIDTH: u32 = 600;

/// Plafond de cadence par défaut (fréquence d'affichage typique).
pub const DEFAULT_MAX_FPS: f64 = 144.0;

/// Configuration du rendu et de la lecture.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use af_core::config::PlayerConfig;
/// let config = PlayerConfig::default();
/// assert_eq!(config.output_width, 600);
/// assert!((config.max_fps - 144.0).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Largeur de la grille de sortie en caractères.
    pub output_width: u32,
    /// Cadence maximale de lecture vidéo (images/s).
    pub max_fps: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            output_width: DEFAULT_OUTPUT_WIDTH,
            max_fps: DEFAULT_MAX_FPS,
        }
    }
}

impl PlayerConfig {
    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization and after CLI overrides.
    pub fn clamp_all(&mut self) {
        if self.max_fps.is_nan() {
            self.max_fps = DEFAULT_MAX_FPS;
        }
        self.max_fps = self.max_fps.max(MIN_FPS);
        self.output_width = self.output_width.max(1);
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    playback: Option<PlaybackSection>,
}

#[derive(Deserialize)]
struct RenderSection {
    output_width: Option<u32>,
}

#[derive(Deserialize)]
struct PlaybackSection {
    max_fps: Option<f64>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// ```toml
/// [render]
/// output_width = 200
///
/// [playback]
/// max_fps = 30.0
/// ```
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use af_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// assert!(config.output_width >= 1);
/// ```
pub fn load_config(path: &Path) -> Result<PlayerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = PlayerConfig::default();

    if let Some(r) = file.render
        && let Some(v) = r.output_width
    {
        config.output_width = v;
    }
    if let Some(p) = file.playback
        && let Some(v) = p.max_fps
    {
        config.max_fps = v;
    }

    config.clamp_all();
    log::debug!("Config chargée depuis {}: {config:?}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config("[playback]\nmax_fps = 30.0\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.output_width, DEFAULT_OUTPUT_WIDTH);
        assert!((config.max_fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_file_is_default() {
        let file = write_config("");
        assert_eq!(load_config(file.path()).unwrap(), PlayerConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file = write_config("[render]\noutput_width = 0\n[playback]\nmax_fps = 0.25\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.output_width, 1);
        assert!((config.max_fps - MIN_FPS).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let file = write_config("[render\noutput_width = 10");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn shipped_default_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        assert_eq!(load_config(&path).unwrap(), PlayerConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }
}
