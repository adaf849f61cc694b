//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Convert a Nuclino workspace export into a browsable Markdown docs tree
#[derive(Parser, Debug)]
#[command(name = "wiki2docs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory of the unpacked wiki export
    #[arg(value_hint = ValueHint::DirPath, required_unless_present_any = ["completions", "show_config"])]
    pub input: Option<PathBuf>,

    /// Output directory (default: `output_dir` setting, "docs")
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Issue report destination, "-" for stdout
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    pub issues: String,

    /// Also write a full trace log to this file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub logfile: Option<PathBuf>,

    /// Verbosity, repeat for more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Additional config file, merged over the global one
    #[arg(short, long, env = "WIKI2DOCS_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Root page of the export (default: `start_file` setting, "index.md")
    #[arg(long)]
    pub start_file: Option<String>,

    /// Parse and plan only; print the resulting layout, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub show_config: bool,

    /// Generate shell completions
    #[arg(long = "completions", value_enum)]
    pub completions: Option<clap_complete::Shell>,
}
