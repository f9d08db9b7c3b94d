#![warn(clippy::all, clippy::pedantic)]

mod dump_animation;
mod export_textures;
mod info;
mod sniff;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dump_animation::{dump_animation, DumpAnimation};
use export_textures::{export_textures, ExportTextures};
use info::{info, Info};
use sniff::{sniff, Sniff};

use studio_mdl::{Settings, TextureEncoding};

#[derive(Parser)]
#[clap(version = "0.1.0")]
struct Opts {
    /// Truncate or pad animation streams that don't match the frame count
    #[clap(long)]
    lenient: bool,
    /// Read textures as hybrid encoded, regardless of extension
    #[clap(long, conflicts_with = "indexed")]
    hybrid: bool,
    /// Read textures as indexed, regardless of extension
    #[clap(long)]
    indexed: bool,
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    Info(Info),
    DumpAnimation(DumpAnimation),
    ExportTextures(ExportTextures),
    Sniff(Sniff),
}

impl Opts {
    fn settings(&self) -> Settings {
        let encoding = if self.hybrid {
            Some(TextureEncoding::Hybrid)
        } else if self.indexed {
            Some(TextureEncoding::Indexed)
        } else {
            None
        };

        let mut settings = Settings::new();
        settings
            .strict_animation(!self.lenient)
            .texture_encoding(encoding);
        settings
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    let settings = opts.settings();

    match opts.subcommand {
        SubCommand::Info(opts) => info(&opts, &settings),
        SubCommand::DumpAnimation(opts) => dump_animation(&opts, &settings),
        SubCommand::ExportTextures(opts) => export_textures(&opts, &settings),
        SubCommand::Sniff(opts) => sniff(&opts),
    }
}
