use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use studio_mdl::{EditableStudioModel, Settings};

/// Print decoded sequences
#[derive(Parser)]
pub struct DumpAnimation {
    path: PathBuf,
    #[clap(short, long)]
    sequence: Option<String>,
    #[clap(short, long)]
    bones: bool,
    #[clap(short, long)]
    names_only: bool,
}

pub fn dump_animation(opts: &DumpAnimation, settings: &Settings) -> Result<()> {
    let mut settings = settings.clone();
    if opts.names_only {
        settings.decode_animations(false);
    }

    let model = EditableStudioModel::read(&opts.path, &settings)
        .with_context(|| format!("failed to load `{}`", opts.path.display()))?;

    if opts.bones {
        for bone in &model.bones {
            println!("{:#?}", bone);
        }
    }

    for sequence in &model.sequences {
        if let Some(filter) = &opts.sequence {
            if &sequence.label != filter {
                continue;
            }
        }

        if opts.names_only {
            println!("{}", sequence.label);
        } else {
            println!("{:#?}", sequence);
        }
    }

    Ok(())
}
