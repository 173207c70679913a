//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crossbuild::Backend;

/// crossbuild - Resolve compiler versions and cross-build matrices
#[derive(Parser)]
#[command(name = "crossbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Never touch the network; serve cached indices only
    #[arg(long, global = true, env = "CROSSBUILD_OFFLINE")]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the compiler version of a build configuration
    Resolve(ResolveArgs),

    /// Resolve every cross-build variant of a build configuration
    Matrix(MatrixArgs),

    /// Show the build-cache fingerprint of a build configuration
    Fingerprint(FingerprintArgs),

    /// Classify a compiler version request (no network access)
    Classify(ClassifyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where to find the build configuration.
#[derive(Args)]
pub struct ManifestArgs {
    /// Path to crossbuild.toml (defaults to ./crossbuild.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Compiler version request, overriding the configuration
    #[arg(long)]
    pub compiler_version: Option<String>,

    /// Target backend, overriding the configuration
    #[arg(long)]
    pub platform: Option<Backend>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Number of parallel resolutions
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct FingerprintArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Also list the fields that contribute to the fingerprint
    #[arg(long)]
    pub fields: bool,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Version request, e.g. `3.nightly` or `2.13.16`
    pub version: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
