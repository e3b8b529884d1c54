use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "kctl")]
#[command(version)]
#[command(about = "Reconcile cluster objects with local manifests", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/kctl/config.toml)
    #[arg(long, env = "KCTL_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace a resource by filename or stdin
    Replace(ReplaceArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Replace
// ============================================================================

const REPLACE_LONG_ABOUT: &str = "\
Replace a resource by filename or stdin.

JSON and YAML formats are accepted. If replacing an existing resource, the
complete resource spec must be provided.

With --force, each resource is deleted, the command waits until the server
confirms it is gone, and then it is created again from the same manifest.";

const REPLACE_EXAMPLES: &str = "\
Examples:
  # Replace a pod using the data in pod.json
  kctl replace -f ./pod.json

  # Replace a pod based on the JSON passed into stdin
  cat pod.json | kctl replace -f -

  # Force replace, delete and then re-create the resource
  kctl replace --force -f ./pod.json";

#[derive(Args, Debug)]
#[command(long_about = REPLACE_LONG_ABOUT, after_help = REPLACE_EXAMPLES)]
pub struct ReplaceArgs {
    /// Filename, directory, or '-' for stdin, of the manifests to replace
    #[arg(short, long = "filename", value_name = "PATH")]
    pub filenames: Vec<String>,

    /// Process directories given with -f recursively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Delete and re-create the specified resources
    #[arg(long)]
    pub force: bool,

    /// Also delete resources managed by the specified resources (with --force)
    #[arg(long)]
    pub cascade: bool,

    /// Seconds given to each resource to terminate gracefully (with --force).
    /// Negative uses the server default; 0 waits for deletion with a 1s grace.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub grace_period: i64,

    /// How long to wait for each deletion to be confirmed, e.g. 30s or 5m
    /// (with --force; 0 uses the configured default)
    #[arg(long, value_parser = humantime::parse_duration, default_value = "0s")]
    pub timeout: Duration,

    /// Check manifests for required fields before sending them
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub validate: bool,

    /// Store the applied configuration in an annotation on the resource
    #[arg(long)]
    pub save_config: bool,

    /// Record the current command in the change-cause annotation
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub record: Option<bool>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Print only `kind/name`
    Name,
    Json,
    Yaml,
}

/// API server selection, overriding the config file
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Namespace for resources that do not name one
    #[arg(short, long, env = "KCTL_NAMESPACE")]
    pub namespace: Option<String>,

    /// API server URL
    #[arg(long, env = "KCTL_SERVER")]
    pub server: Option<String>,

    /// Bearer token for the API server
    #[arg(long, env = "KCTL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}
