//! Implementation of `concord init`.

use std::{fs, path::PathBuf, process::ExitCode};

use concord_config::{CONFIG_FILENAME, global_config_path, global_template, local_template};

use crate::cli::{args::InitCommand, context::CommandContext};

/// Where the new file goes: `~/.concord.toml` for `--global` or when run from
/// the home directory, otherwise the working directory.
fn target_path(ctx: &CommandContext, global: bool) -> Result<(PathBuf, bool), ExitCode> {
    let global_path = global_config_path();
    let in_home = global_path
        .as_ref()
        .and_then(|p| p.parent())
        .is_some_and(|home| home == ctx.cwd);

    if !(global || in_home) {
        return Ok((ctx.cwd.join(CONFIG_FILENAME), false));
    }
    match global_path {
        Some(path) => Ok((path, true)),
        None => {
            eprintln!("error: could not determine home directory");
            Err(ExitCode::FAILURE)
        }
    }
}

/// Writes a commented `.concord.toml` template.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let (config_path, global) = match target_path(ctx, cmd.global) {
        Ok(target) => target,
        Err(code) => return code,
    };

    if config_path.exists() && !cmd.force {
        eprintln!(
            "error: configuration file already exists: {}",
            config_path.display()
        );
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    let template = if global {
        global_template()
    } else {
        local_template()
    };
    if let Err(e) = fs::write(&config_path, &template) {
        eprintln!("error: failed to write {}: {e}", config_path.display());
        return ExitCode::FAILURE;
    }

    println!("Created {}", config_path.display());
    println!("Uncomment [window] and [search] settings, then check them with `concord config`.");
    ExitCode::SUCCESS
}
