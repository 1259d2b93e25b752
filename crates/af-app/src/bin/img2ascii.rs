use std::process::ExitCode;

use af_app::cli::{ImageCli, resolve_config};
use af_app::pipeline::render_image;

fn main() -> ExitCode {
    let cli: ImageCli = match af_app::parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    af_app::init_logging(&cli.common.log_level);

    af_app::exit_with(resolve_config(&cli.common).and_then(|config| {
        render_image(&cli.file, &config, std::io::stdout().lock())
    }))
}
