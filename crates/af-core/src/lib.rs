//! Configuration, types, and shared structures for clasSCII.
//!
//! This crate contains the pixel and cell types, the constant palettes, the
//! playback clock and the decoder seam shared across the workspace.

pub mod charset;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use clock::{Clock, PlaybackClock, SystemClock};
pub use config::PlayerConfig;
pub use error::CoreError;
pub use frame::{AsciiCell, AsciiGrid, FrameBuffer};
pub use traits::{FrameSource, StreamInfo};
