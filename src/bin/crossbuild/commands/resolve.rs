//! `crossbuild resolve` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::ResolveArgs;
use crate::commands::{context, load_configuration, GlobalArgs};
use crossbuild::builder::cross::strip_extras;
use crossbuild::ops::matrix::artifact_cache_for;
use crossbuild::VersionResolver;

pub fn execute(args: ResolveArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = context(global)?;
    let mut config = strip_extras(&load_configuration(&mut ctx, &args.manifest)?);

    if let Some(version) = args.compiler_version {
        config.compiler.version = Some(version);
    }
    if let Some(platform) = args.platform {
        config.platform = Some(platform);
    }

    let cache = artifact_cache_for(&ctx, &config);
    let index = ctx.version_index(Arc::clone(&cache))?;
    let feed = ctx.release_feed(cache)?;
    let resolver = VersionResolver::new(&index, &feed, &feed);

    let params = resolver.toolchain_params(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    match params {
        Some(params) => {
            println!("compiler-version: {}", params.compiler_version);
            println!("binary-version: {}", params.binary_version);
            println!(
                "platform-suffix: {}",
                params.platform_suffix.as_deref().unwrap_or("none")
            );
        }
        None => println!("host-only: no compiler version"),
    }

    if ctx.is_verbose() {
        let supported = index.supported_versions();
        println!("supported: {}", supported.to_strings().join(", "));
    }

    Ok(())
}
