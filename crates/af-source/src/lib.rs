//! Visual sources for clasSCII: still images, ffmpeg video, and the resampler
//! that fits them to the output grid.

pub mod image;
pub mod resize;

#[cfg(feature = "video")]
pub mod video;
