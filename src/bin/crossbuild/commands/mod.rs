//! Command implementations

pub mod classify;
pub mod completions;
pub mod fingerprint;
pub mod matrix;
pub mod resolve;

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::cli::ManifestArgs;
use crossbuild::core::config::{load_build_configuration, BuildConfiguration, CONFIG_FILE_NAME};
use crossbuild::util::config::global_defaults_path;
use crossbuild::util::diagnostic::suggestions;
use crossbuild::GlobalContext;

/// Flags shared by every command.
pub struct GlobalArgs {
    pub verbose: bool,
    pub offline: bool,
}

/// Create the global context and apply command-line overrides.
pub fn context(global: &GlobalArgs) -> Result<GlobalContext> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(global.verbose);
    if global.offline {
        ctx.set_offline(true);
    }
    Ok(ctx)
}

/// Load the build configuration, merged over the global defaults.
///
/// A missing `crossbuild.toml` in the working directory means an all-default
/// configuration; a missing explicit `--manifest` is an error.
pub fn load_configuration(ctx: &mut GlobalContext, args: &ManifestArgs) -> Result<BuildConfiguration> {
    let path = match &args.manifest {
        Some(path) => {
            if !path.exists() {
                bail!(
                    "build configuration not found: {}\n{}",
                    path.display(),
                    suggestions::NO_CONFIGURATION
                );
            }
            path.clone()
        }
        None => ctx.cwd().join(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
    }

    let global: Option<PathBuf> = global_defaults_path();
    let config = load_build_configuration(&path, global.as_deref())?;

    if config.internal.is_offline() {
        ctx.set_offline(true);
    }

    Ok(config)
}
