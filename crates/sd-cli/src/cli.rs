use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sdelta",
    about = "SchemaDelta: structural diff and patch for schema catalog trees",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file (defaults to ./sdelta.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute a delta between two schema trees
    Diff(DiffArgs),
    /// Apply a delta to a schema tree
    Apply(ApplyArgs),
    /// Show a schema tree with its identity and digest
    Show(ShowArgs),
    /// Show the contents of a delta file
    Inspect(InspectArgs),
    /// Check that a delta round-trips between two trees
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub before: PathBuf,
    pub after: PathBuf,
    /// Where to write the framed delta
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Encode the payload as JSON instead of bincode
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub tree: PathBuf,
    pub delta: PathBuf,
    /// Where to write the patched tree (defaults to overwriting TREE)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub tree: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    pub delta: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub before: PathBuf,
    pub after: PathBuf,
}
