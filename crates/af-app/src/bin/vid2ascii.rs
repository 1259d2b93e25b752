use std::process::ExitCode;

use af_app::cli::{VideoCli, resolve_video_config};
use af_app::pipeline::ensure_exists;
use af_app::player::Player;
use af_core::clock::SystemClock;
use af_source::video::FfmpegSource;
use anyhow::Result;

fn play(cli: &VideoCli) -> Result<()> {
    let config = resolve_video_config(cli)?;
    ensure_exists(&cli.file)?;

    let source = FfmpegSource::open(&cli.file)?;
    let player = Player::new(source, std::io::stdout().lock(), SystemClock, &config)?;
    let summary = player.run()?;
    log::info!(
        "{} frames ({} en vidage) en {:.2}s, intervalle {:?}",
        summary.frames,
        summary.drained,
        summary.elapsed.as_secs_f64(),
        summary.frame_interval
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli: VideoCli = match af_app::parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    af_app::init_logging(&cli.common.log_level);
    af_app::exit_with(play(&cli))
}
