use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use studio_mdl::is_studio_header;

/// Check whether a file looks like a studio model without loading it
#[derive(Parser)]
pub struct Sniff {
    path: PathBuf,
}

pub fn sniff(opts: &Sniff) -> Result<()> {
    let mut file = File::open(&opts.path)
        .with_context(|| format!("failed to open `{}`", opts.path.display()))?;

    let verdict = if is_studio_header(&mut file)? {
        "studio model"
    } else {
        "not a studio model"
    };
    println!("{}: {verdict}", opts.path.display());

    Ok(())
}
