//! Implementation of `concord config`.

use std::process::ExitCode;

use crate::cli::context::CommandContext;

/// Shows effective configuration settings, then any warnings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;
    match config.settings_to_toml() {
        Ok(toml) => print!("{toml}"),
        Err(e) => {
            eprintln!("error: failed to serialize configuration: {e}");
            return ExitCode::FAILURE;
        }
    }

    for warning in config.validate() {
        eprintln!("warning: {warning}");
    }
    ExitCode::SUCCESS
}
