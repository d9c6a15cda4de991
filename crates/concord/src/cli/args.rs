//! Clap argument definitions for the `concord` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use concord_config::SortKeyKind;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "concord")]
#[command(about = "Keyword-in-context concordances from a full-text index")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for `concord search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    /// Index directory
    pub index: PathBuf,

    /// Query tree as JSON; read from stdin when neither this nor --phrase is given
    pub query: Option<String>,

    /// Search for this text as a phrase, analyzed like the indexed field
    #[arg(short = 'p', long, conflicts_with = "query")]
    pub phrase: Option<String>,

    /// Field to cut windows from [default: from configuration]
    #[arg(short = 'f', long)]
    pub field: Option<String>,

    /// Context tokens before the target [default: from configuration]
    #[arg(short = 'B', long)]
    pub before: Option<usize>,

    /// Context tokens after the target [default: from configuration]
    #[arg(short = 'A', long)]
    pub after: Option<usize>,

    /// Stop after this many windows
    #[arg(short = 'n', long)]
    pub max_hits: Option<usize>,

    /// Sort windows by: target_post, target, pre, pre_reversed, post, doc
    #[arg(short = 's', long)]
    pub sort: Option<SortKeyKind>,

    /// Keep only the first N windows in sort order
    #[arg(long)]
    pub top: Option<usize>,

    /// Keep overlapping hits within a document
    #[arg(long)]
    pub allow_overlaps: bool,

    /// Stored field to include with each window (can be specified multiple times)
    #[arg(short = 'm', long = "metadata")]
    pub metadata: Vec<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `concord index`.
#[derive(Args, Debug, Clone)]
pub struct IndexCommand {
    /// Index directory to create
    pub index: PathBuf,

    /// JSON lines file of documents; stdin when omitted
    pub input: Option<PathBuf>,

    /// Analyzed text field (can be specified multiple times)
    #[arg(short = 't', long = "text", required = true)]
    pub text_fields: Vec<String>,

    /// Untokenized keyword field (can be specified multiple times)
    #[arg(short = 'k', long = "keyword")]
    pub keyword_fields: Vec<String>,
}

/// Arguments for `concord terms`.
#[derive(Args, Debug, Clone)]
pub struct TermsCommand {
    /// Index directory
    pub index: PathBuf,

    /// Field to report (can be specified multiple times) [default: every text field]
    #[arg(short = 'f', long = "field")]
    pub fields: Vec<String>,

    /// Number of terms per field
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Minimum document frequency
    #[arg(long)]
    pub min_df: Option<u64>,

    /// Maximum document frequency
    #[arg(long)]
    pub max_df: Option<u64>,

    /// Minimum document frequency as a percentage of all documents
    #[arg(long)]
    pub min_percent: Option<f64>,

    /// Maximum document frequency as a percentage of all documents
    #[arg(long)]
    pub max_percent: Option<f64>,

    /// Append the document frequency to each term
    #[arg(long)]
    pub include_df: bool,

    /// File of terms never reported, one per line
    #[arg(long)]
    pub stop_words: Option<PathBuf>,

    /// File of terms written before the ranked terms, one per line
    #[arg(long)]
    pub start_words: Option<PathBuf>,

    /// Output file, or directory for one file per field
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `concord fields`.
#[derive(Args, Debug, Clone)]
pub struct FieldsCommand {
    /// Index directory
    pub index: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `concord idf`.
#[derive(Args, Debug, Clone)]
pub struct IdfCommand {
    /// Index directory
    pub index: PathBuf,

    /// Text whose terms are looked up
    #[arg(required = true)]
    pub text: Vec<String>,

    /// Field the terms are looked up in [default: from configuration]
    #[arg(short = 'f', long)]
    pub field: Option<String>,
}

/// Arguments for `concord init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Create global ~/.concord.toml instead
    #[arg(long)]
    pub global: bool,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `concord` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print keyword-in-context windows for a query
    #[command(after_help = "\
QUERY TREES:
  Queries are JSON objects tagged by \"type\":
    {\"type\": \"term\", \"field\": \"body\", \"text\": \"fox\"}
    {\"type\": \"phrase\", \"field\": \"body\", \"terms\": [\"brown\", \"fox\"], \"slop\": 0}
    {\"type\": \"boolean\", \"clauses\": [{\"occur\": \"must\", \"query\": ...}]}
    {\"type\": \"multi_term\", \"field\": \"body\",
     \"pattern\": {\"kind\": \"prefix\", \"prefix\": \"jump\"}}

EXAMPLES:
  concord search ./corpus --phrase 'brown fox'
  concord search ./corpus --phrase fox -B 3 -A 3 --sort pre_reversed
  concord search ./corpus '{\"type\": \"term\", \"field\": \"body\", \"text\": \"fox\"}'")]
    Search(SearchCommand),

    /// Build a corpus from JSON lines documents
    Index(IndexCommand),

    /// List the most frequent terms of each field
    Terms(TermsCommand),

    /// Show document and term totals per field
    Fields(FieldsCommand),

    /// Show inverse document frequencies of terms
    Idf(IdfCommand),

    /// Initialize concord configuration in current directory
    Init(InitCommand),

    /// Show effective configuration settings
    Config,
}
