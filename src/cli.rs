use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "voicestack")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision a voice agent runtime: image, execution role and runtime", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stack config file (defaults to ./voicestack.toml)
    #[arg(short, long, global = true, env = "VOICESTACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the image, create the role and the runtime
    Deploy(DeployArgs),

    /// Show the resource graph and apply order without changing anything
    Plan(TargetArgs),

    /// Print the identity policy and trust policy as JSON
    Policy(PolicyArgs),

    /// Show outputs from the last deploy
    Outputs(OutputsArgs),

    /// Print the effective configuration as TOML
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Target
// ============================================================================

#[derive(Args, Clone)]
pub struct TargetArgs {
    /// Region to deploy into
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Account id (looked up with `aws sts get-caller-identity` if omitted)
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    pub account: Option<String>,

    /// CLI profile for the aws backend
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Backend that performs builds and provisioning
    #[arg(short, long, value_enum, default_value = "aws")]
    pub backend: BackendKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// docker for images, aws CLI for roles and runtimes
    Aws,
    /// Offline backend with deterministic identifiers
    Simulated,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Aws => "aws",
            BackendKind::Simulated => "simulated",
        }
    }
}

// ============================================================================
// Deploy
// ============================================================================

#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Validate and show the plan without applying
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Apply independent resources concurrently
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Build the image without pushing it to the registry
    #[arg(long)]
    pub no_push: bool,

    /// Where to write the deployment report
    #[arg(short, long)]
    pub outputs_file: Option<PathBuf>,
}

// ============================================================================
// Policy
// ============================================================================

#[derive(Args)]
pub struct PolicyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print only the trust policy
    #[arg(long, conflicts_with = "identity")]
    pub trust: bool,

    /// Print only the identity policy
    #[arg(long)]
    pub identity: bool,
}

// ============================================================================
// Outputs
// ============================================================================

#[derive(Args)]
pub struct OutputsArgs {
    /// Report file to read (defaults to the configured report file)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Print a single output value
    #[arg(short, long)]
    pub name: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
