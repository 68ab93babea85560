mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::policy::PolicySubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wfcheck",
    about = "Validate version pinning of actions referenced by GitHub workflow files",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .github/ or .git/)
    #[arg(long, global = true, env = "WFCHECK_ROOT")]
    root: Option<PathBuf>,

    /// Policy file (default: <root>/.github/wfcheck.yaml)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate workflow files (default: every workflow under .github/workflows)
    Check {
        files: Vec<PathBuf>,

        /// Treat advisories as failures
        #[arg(long)]
        strict: bool,
    },

    /// Print unified-diff snippets for deprecated references
    Diff { files: Vec<PathBuf> },

    /// Generate a shell script that updates every deprecated reference
    Fix {
        files: Vec<PathBuf>,

        /// Write the script to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Classify individual references (e.g. actions/checkout@v3)
    Classify {
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Inspect, validate, or create the policy file
    Policy {
        #[command(subcommand)]
        subcommand: PolicySubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let ctx = cmd::Context {
        root,
        policy: cli.policy,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Check { files, strict } => cmd::check::run(&ctx, &files, strict),
        Commands::Diff { files } => cmd::diff::run(&ctx, &files),
        Commands::Fix { files, output } => cmd::fix::run(&ctx, &files, output.as_deref()),
        Commands::Classify { refs } => cmd::classify::run(&ctx, &refs),
        Commands::Policy { subcommand } => cmd::policy::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
