use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use image::RgbImage;
use tracing::info;

use studio_mdl::{EditableStudioModel, EditableTexture, Settings};

/// Write every texture of a model as png
#[derive(Parser)]
pub struct ExportTextures {
    path: PathBuf,
    out_dir: PathBuf,
}

fn output_name(texture: &EditableTexture, index: usize) -> PathBuf {
    Path::new(&texture.name)
        .file_name()
        .map_or_else(|| PathBuf::from(format!("texture_{index}")), PathBuf::from)
        .with_extension("png")
}

pub fn export_textures(opts: &ExportTextures, settings: &Settings) -> Result<()> {
    let mut settings = settings.clone();
    settings.decode_animations(false);

    let model = EditableStudioModel::read(&opts.path, &settings)
        .with_context(|| format!("failed to load `{}`", opts.path.display()))?;

    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("failed to create `{}`", opts.out_dir.display()))?;

    for (i, texture) in model.textures.iter().enumerate() {
        let pixels = texture
            .image
            .to_rgb8()
            .iter()
            .flat_map(|pixel| [pixel.r, pixel.g, pixel.b])
            .collect();
        let image = RgbImage::from_raw(texture.image.width(), texture.image.height(), pixels)
            .with_context(|| format!("texture `{}` has invalid dimensions", texture.name))?;

        let out_path = opts.out_dir.join(output_name(texture, i));
        image
            .save(&out_path)
            .with_context(|| format!("failed to write `{}`", out_path.display()))?;
        info!("wrote `{}`", out_path.display());
    }

    Ok(())
}
