use thiserror::Error;

/// Errors originating from the core module.
///
/// Every variant is fatal: the binaries report it on stderr and exit with
/// status 1.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad or missing command-line arguments.
    #[error("Arguments invalides : {0}")]
    Usage(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Stream open, codec, stream-info or decoder failure.
    #[error("Erreur de décodage : {0}")]
    Decode(String),

    /// Buffer or resize-context allocation failure.
    #[error("Allocation impossible : {0}")]
    Allocation(String),

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Sample buffer shorter than its declared geometry.
    #[error("Buffer trop petit : {actual} octets, {expected} attendus")]
    BufferTooSmall {
        /// Minimum byte count implied by width, height, channels and stride.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// Channel count outside 1..=4.
    #[error("Nombre de canaux non supporté : {0}")]
    UnsupportedChannels(u8),
}
