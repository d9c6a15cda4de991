//! Command implementations and dispatch.

pub mod config;
pub mod fields;
pub mod idf;
pub mod index;
pub mod init;
pub mod search;
pub mod terms;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &mut CommandContext) -> ExitCode {
    match command {
        Commands::Search(cmd) => search::run(ctx, &cmd),
        Commands::Index(cmd) => index::run(ctx, &cmd),
        Commands::Terms(cmd) => terms::run(ctx, &cmd),
        Commands::Fields(cmd) => fields::run(ctx, &cmd),
        Commands::Idf(cmd) => idf::run(ctx, &cmd),
        Commands::Init(cmd) => init::run(ctx, &cmd),
        Commands::Config => config::run(ctx),
    }
}
