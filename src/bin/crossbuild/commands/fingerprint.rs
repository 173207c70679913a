//! `crossbuild fingerprint` command
//!
//! Fingerprints the configuration as written, without resolving the
//! compiler version.

use anyhow::Result;

use crate::cli::FingerprintArgs;
use crate::commands::{context, load_configuration, GlobalArgs};
use crossbuild::builder::cross::strip_extras;
use crossbuild::builder::fingerprint::{fingerprint, fingerprint_fields};

pub fn execute(args: FingerprintArgs, global: &GlobalArgs) -> Result<()> {
    let mut ctx = context(global)?;
    let config = strip_extras(&load_configuration(&mut ctx, &args.manifest)?);

    println!("{}", fingerprint(&config).as_deref().unwrap_or("none"));

    if args.fields {
        for (path, value) in fingerprint_fields(&config) {
            println!("  {} = {}", path, value);
        }
    }

    Ok(())
}
