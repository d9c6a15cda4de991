//! Implementation of `concord idf`.

use std::process::ExitCode;

use concord_index::IdfCalculator;

use crate::cli::{args::IdfCommand, context::CommandContext};

/// Prints the IDF of each analyzed term, then their sum.
pub fn run(ctx: &CommandContext, cmd: &IdfCommand) -> ExitCode {
    let field = cmd.field.as_deref().unwrap_or(&ctx.config.search.field);
    let index = match ctx.open_index(&cmd.index) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let terms = match index.analyze(field, &cmd.text.join(" ")) {
        Ok(terms) => terms,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if terms.is_empty() {
        eprintln!("error: no indexable terms in '{}'", cmd.text.join(" "));
        return ExitCode::FAILURE;
    }

    let calc = IdfCalculator::new(&index);
    for term in &terms {
        match index.doc_freq(field, term) {
            Ok(df) => println!("{term}\t{df}\t{:.4}", calc.idf(df)),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    match calc.multi_term_stats(field, &terms.join(" ")) {
        Ok(stats) => {
            println!("sum\t{}\t{:.4}", stats.min_doc_freq.unwrap_or(0), stats.idf_sum);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
