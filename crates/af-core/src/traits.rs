use anyhow::Result;

use crate::frame::FrameBuffer;

/// Métadonnées du flux vidéo principal.
///
/// # Example
/// ```
/// use af_core::traits::StreamInfo;
/// let info = StreamInfo { width: 1920, height: 1080, fps: 23.976, pixel_format: "yuv420p".into() };
/// assert!(info.fps > 23.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    /// Largeur native en pixels.
    pub width: u32,
    /// Hauteur native en pixels.
    pub height: u32,
    /// Images par seconde annoncées par le conteneur (peut être 0 ou NaN si
    /// les métadonnées sont corrompues).
    pub fps: f64,
    /// Format pixel du codec (informatif).
    pub pixel_format: String,
}

/// Fournit des frames décodées au lecteur vidéo.
///
/// Implémenté par : `FfmpegSource` (af-source, feature `video`).
///
/// Les frames sont prêtées : l'implémentation réutilise le même buffer d'une
/// frame à l'autre.
///
/// # Example
/// ```
/// use af_core::frame::FrameBuffer;
/// use af_core::traits::{FrameSource, StreamInfo};
///
/// struct Empty(StreamInfo);
/// impl FrameSource for Empty {
///     fn info(&self) -> &StreamInfo { &self.0 }
///     fn read_frame(&mut self) -> anyhow::Result<Option<&FrameBuffer>> { Ok(None) }
///     fn drain_frame(&mut self) -> anyhow::Result<Option<&FrameBuffer>> { Ok(None) }
/// }
/// ```
pub trait FrameSource {
    /// Stream metadata, known once the source is open.
    fn info(&self) -> &StreamInfo;

    /// Prochaine frame démuxée et décodée.
    ///
    /// Retourne `Ok(None)` quand le flux ne contient plus de paquets.
    ///
    /// # Errors
    /// Any I/O or decoder failure; these are fatal for playback.
    fn read_frame(&mut self) -> Result<Option<&FrameBuffer>>;

    /// Frames encore retenues par le décodeur après la fin des données.
    ///
    /// Appelé en boucle jusqu'à `Ok(None)` une fois que `read_frame` a signalé
    /// la fin du flux.
    ///
    /// # Errors
    /// Any I/O or decoder failure detected while flushing.
    fn drain_frame(&mut self) -> Result<Option<&FrameBuffer>>;
}
