//! Command-line interface for the `concord` keyword-in-context tool.

use std::process::ExitCode;

use clap::Parser;
use concord::cli::{
    CommandContext,
    args::{Cli, Commands},
    commands,
};
use env_logger::Env;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let ctx = match &cli.command {
        Commands::Init(_) => CommandContext::load_cwd_only(),
        _ => CommandContext::load(),
    };
    let mut ctx = match ctx {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };
    commands::run(cli.command, &mut ctx)
}
