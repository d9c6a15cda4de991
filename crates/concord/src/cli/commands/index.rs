//! Implementation of `concord index`.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader},
    process::ExitCode,
};

use concord_index::{CorpusDocument, CorpusField, CorpusWriter, MANIFEST_FILENAME};
use log::debug;
use serde::Deserialize;

use crate::cli::{args::IndexCommand, context::CommandContext};

/// A field value in an input line: one string or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputValue {
    /// A single value.
    One(String),
    /// Values of a multi-valued field, in order.
    Many(Vec<String>),
}

/// Parses one JSON line into a corpus document.
fn parse_line(line: &str) -> Result<CorpusDocument, serde_json::Error> {
    let fields: BTreeMap<String, InputValue> = serde_json::from_str(line)?;
    let mut doc = CorpusDocument::new();
    for (name, value) in fields {
        match value {
            InputValue::One(v) => doc.add(name, v),
            InputValue::Many(values) => {
                for v in values {
                    doc.add(name.clone(), v);
                }
            }
        }
    }
    Ok(doc)
}

/// Builds a corpus from JSON lines, one document per line.
pub fn run(ctx: &CommandContext, cmd: &IndexCommand) -> ExitCode {
    let path = ctx.resolve(&cmd.index);
    if path.join(MANIFEST_FILENAME).exists() {
        eprintln!("error: {} already holds a corpus", path.display());
        return ExitCode::FAILURE;
    }

    let input: Box<dyn BufRead> = match &cmd.input {
        Some(file) => match File::open(ctx.resolve(file)) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                eprintln!("error: failed to open {}: {e}", file.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let fields: Vec<CorpusField> = cmd
        .keyword_fields
        .iter()
        .map(CorpusField::keyword)
        .chain(cmd.text_fields.iter().map(CorpusField::text))
        .collect();

    let mut writer = match CorpusWriter::create(&path, &fields, &ctx.config.analysis) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut count = 0usize;
    for (n, line) in input.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("error: failed to read input: {e}");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let doc = match parse_line(&line) {
            Ok(doc) => doc,
            Err(e) => {
                eprintln!("error: line {}: {e}", n + 1);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = writer.add_document(&doc) {
            eprintln!("error: line {}: {e}", n + 1);
            return ExitCode::FAILURE;
        }
        count += 1;
    }

    if let Err(e) = writer.finish() {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    debug!("indexed {count} documents into {}", path.display());
    println!("Indexed {count} documents into {}", path.display());
    ExitCode::SUCCESS
}
