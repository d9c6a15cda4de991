//! Implementation of `concord terms`.

use std::{
    io::{self, Write},
    path::Path,
    process::ExitCode,
};

use concord_index::{ConcordanceIndex, TopTermsRequest, load_word_list, write_top_terms};

use crate::cli::{args::TermsCommand, context::CommandContext};

/// Loads an optional word list, exiting with an error when it cannot be read.
fn word_list(ctx: &CommandContext, path: Option<&Path>) -> Result<Vec<String>, ExitCode> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    load_word_list(&ctx.resolve(path)).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        ExitCode::FAILURE
    })
}

/// Fields named on the command line, or every text field of the corpus.
fn requested_fields(index: &ConcordanceIndex, cmd: &TermsCommand) -> Vec<String> {
    if cmd.fields.is_empty() {
        index.text_fields()
    } else {
        cmd.fields.clone()
    }
}

/// Lists the most frequent terms of each requested field.
pub fn run(ctx: &CommandContext, cmd: &TermsCommand) -> ExitCode {
    let index = match ctx.open_index(&cmd.index) {
        Ok(index) => index,
        Err(code) => return code,
    };
    let stop_words = match word_list(ctx, cmd.stop_words.as_deref()) {
        Ok(words) => words,
        Err(code) => return code,
    };
    let start_words = match word_list(ctx, cmd.start_words.as_deref()) {
        Ok(words) => words,
        Err(code) => return code,
    };

    let request = TopTermsRequest {
        top_n: cmd.top,
        min_doc_freq: cmd.min_df,
        max_doc_freq: cmd.max_df,
        min_doc_percent: cmd.min_percent,
        max_doc_percent: cmd.max_percent,
        include_doc_freq: cmd.include_df,
        stop_words: stop_words.into_iter().collect(),
        start_words,
    };
    let fields = requested_fields(&index, cmd);
    let output = cmd.output.as_deref().map(|p| ctx.resolve(p));
    let output = output.as_deref();

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let report = match write_top_terms(&index, &fields, &request, output, &mut stdout) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = stdout.flush() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    for path in &report.written {
        eprintln!("Wrote {}", path.display());
    }
    for path in &report.skipped {
        eprintln!("warning: {} already exists, skipped", path.display());
    }
    ExitCode::SUCCESS
}
