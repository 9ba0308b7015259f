use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a machine's docker engine and record its IP in the cluster config
    Provision(ProvisionArgs),

    /// Check that a machine record is complete enough to provision
    Validate(ValidateArgs),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Name of the machine to provision
    #[arg(short, long, default_value = "default")]
    pub machine: String,

    /// Cluster profile to record the node in (defaults to the machine name)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Node name within the profile (defaults to the machine name)
    #[arg(short, long)]
    pub node: Option<String>,

    /// Directory holding machine records and cluster profiles
    #[arg(short, long, default_value = ".rsmachine")]
    pub store: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Name of the machine to validate
    #[arg(short, long, default_value = "default")]
    pub machine: String,

    /// Directory holding machine records and cluster profiles
    #[arg(short, long, default_value = ".rsmachine")]
    pub store: Utf8PathBuf,

    /// Set the log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Represents log levels for controlling the verbosity of logging output.
///
/// Maps directly to the levels of the `tracing` crate; `--log-level debug`
/// additionally shows every remote command and its output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub fn parse_args() -> Result<Cli> {
    Ok(Cli::parse())
}
