//! Frontal des deux commandes `img2ascii` et `vid2ascii` : CLI, mode image,
//! lecteur vidéo.

use std::process::ExitCode;

use clap::Parser;

pub mod cli;
pub mod pipeline;
#[cfg(feature = "video")]
pub mod player;

/// Parse the command line, printing clap's message on failure.
///
/// Help and version requests map to success, every other parse error to
/// failure (exit 1 instead of clap's default 2).
///
/// # Errors
/// The exit code the binary should return immediately.
pub fn parse_args<T: Parser>() -> Result<T, ExitCode> {
    T::try_parse().map_err(|err| {
        let _ = err.print();
        if err.use_stderr() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    })
}

/// Initialise `env_logger` au niveau demandé (`warn` si illisible).
pub fn init_logging(level: &str) {
    env_logger::Builder::new()
        .filter_level(level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();
}

/// Map the outcome of a command to its exit code, reporting the error chain.
#[must_use]
pub fn exit_with(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
