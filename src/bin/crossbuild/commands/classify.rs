//! `crossbuild classify` command

use anyhow::Result;

use crate::cli::ClassifyArgs;
use crossbuild::classify;

pub fn execute(args: ClassifyArgs) -> Result<()> {
    let classification = classify(Some(args.version.as_str()));
    println!("{}", classification);
    Ok(())
}
