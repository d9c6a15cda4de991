//! Implementation of `concord fields`.

use std::process::ExitCode;

use concord_index::field_stats;

use crate::cli::{args::FieldsCommand, context::CommandContext, output::output_field_stats};

/// Shows totals for every text field of the corpus.
pub fn run(ctx: &CommandContext, cmd: &FieldsCommand) -> ExitCode {
    let index = match ctx.open_index(&cmd.index) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let mut rows = Vec::new();
    for field in index.text_fields() {
        match field_stats(&index, &field) {
            Ok(stats) => rows.push((field, stats)),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    output_field_stats(&rows, cmd.json)
}
