//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use concord_assembler::{PromptMode, PromptStyle};
use std::path::PathBuf;

/// Concord - Resolve disputed software registry clusters with an LLM.
#[derive(Debug, Parser)]
#[command(name = "concord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true, env = "CONCORD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model identifier, overriding the configuration
    #[arg(short, long, global = true, env = "CONCORD_MODEL")]
    pub model: Option<String>,

    /// Answer with the mock oracle instead of calling a provider
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Assemble conflicts and write their prompts to a messages file
    Prepare(PrepareArgs),

    /// Send prepared prompts to the oracle and record the results
    Infer(InferArgs),

    /// Resolve disputed clusters end to end and write regrouped entries
    Resolve(ResolveArgs),
}

/// Arguments for the prepare command.
#[derive(Debug, Parser)]
pub struct PrepareArgs {
    /// JSON file of conflicts keyed by cluster
    pub conflicts: PathBuf,

    /// Messages file to append to
    #[arg(long)]
    pub messages: Option<PathBuf>,

    /// Prompt mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Prompt style
    #[arg(long, value_enum)]
    pub style: Option<StyleArg>,
}

/// Arguments for the infer command.
#[derive(Debug, Parser)]
pub struct InferArgs {
    /// Messages file to read
    #[arg(long)]
    pub messages: Option<PathBuf>,

    /// Ledger to append results to
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Directory for raw answers and usage metadata
    #[arg(long)]
    pub raw_results_dir: Option<PathBuf>,

    /// Record unparsable answers as solved
    #[arg(long)]
    pub persist_unparsed: bool,
}

/// Arguments for the resolve command.
#[derive(Debug, Parser)]
pub struct ResolveArgs {
    /// JSON file of grouped entries keyed by cluster
    pub grouped: PathBuf,

    /// JSON file of conflicts keyed by cluster
    pub conflicts: PathBuf,

    /// Where to write the regrouped entries
    #[arg(short, long)]
    pub output: PathBuf,

    /// Ledger to read and append results to
    #[arg(long)]
    pub results: Option<PathBuf>,
}

/// Prompt mode argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ModeArg {
    /// Ordered chat messages
    Chat,
    /// One text block
    Flattened,
}

/// Prompt style argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StyleArg {
    /// Partition-dependent production instructions
    Production,
    /// Pairwise benchmarking instructions
    Benchmarking,
}

impl From<ModeArg> for PromptMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Chat => PromptMode::Chat,
            ModeArg::Flattened => PromptMode::Flattened,
        }
    }
}

impl From<StyleArg> for PromptStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Production => PromptStyle::Production,
            StyleArg::Benchmarking => PromptStyle::Benchmarking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_command() {
        let cli = Cli::parse_from([
            "concord",
            "prepare",
            "conflicts.json",
            "--mode",
            "flattened",
            "--style",
            "benchmarking",
        ]);
        match cli.command {
            Command::Prepare(args) => {
                assert_eq!(args.conflicts, PathBuf::from("conflicts.json"));
                assert_eq!(PromptMode::from(args.mode.unwrap()), PromptMode::Flattened);
                assert_eq!(PromptStyle::from(args.style.unwrap()), PromptStyle::Benchmarking);
            }
            _ => panic!("Expected Prepare command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "concord",
            "resolve",
            "grouped.json",
            "conflicts.json",
            "-o",
            "out.json",
            "--dry-run",
            "--model",
            "openai/gpt-4o",
        ]);
        assert!(cli.dry_run);
        assert_eq!(cli.model.as_deref(), Some("openai/gpt-4o"));
        assert!(matches!(cli.command, Command::Resolve(_)));
    }

    #[test]
    fn test_resolve_requires_output() {
        let result = Cli::try_parse_from(["concord", "resolve", "grouped.json", "conflicts.json"]);
        assert!(result.is_err());
    }
}
