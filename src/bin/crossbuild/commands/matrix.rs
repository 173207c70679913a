//! `crossbuild matrix` command

use anyhow::Result;

use crate::cli::MatrixArgs;
use crate::commands::{context, load_configuration, GlobalArgs};
use crossbuild::ops::{resolve_matrix_with_context, MatrixOptions};

pub fn execute(args: MatrixArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = context(global)?;
    let config = load_configuration(&mut ctx, &args.manifest)?;

    let opts = MatrixOptions {
        jobs: args.jobs,
        base_only: false,
    };
    let variants = resolve_matrix_with_context(&ctx, &config, &opts)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&variants)?);
        return Ok(());
    }

    let width = variants.iter().map(|v| v.label().len()).max().unwrap_or(0);
    for variant in &variants {
        println!(
            "{:<width$}  {}",
            variant.label(),
            variant.fingerprint.as_deref().unwrap_or("none"),
            width = width
        );
    }

    Ok(())
}
