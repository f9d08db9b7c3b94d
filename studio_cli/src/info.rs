use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use studio_mdl::{EditableStudioModel, Settings, StudioData};

/// Print a summary of a model
#[derive(Parser)]
pub struct Info {
    path: PathBuf,
}

pub fn info(opts: &Info, settings: &Settings) -> Result<()> {
    let context = || format!("failed to load `{}`", opts.path.display());
    let data = StudioData::read(&opts.path).with_context(context)?;
    let model = EditableStudioModel::from_studio_data(&data, settings).with_context(context)?;

    println!("name: {}", data.main().header().with_context(context)?.name());
    println!("eye position: {}", model.eye_position);
    println!("hull: {} .. {}", model.hull_min, model.hull_max);
    println!("bounding box: {} .. {}", model.bb_min, model.bb_max);
    println!("flags: {:#x}", model.flags);
    println!("bones: {}", model.bones.len());
    println!("bone controllers: {}", model.bone_controllers.len());
    println!("hitboxes: {}", model.hitboxes.len());
    println!("attachments: {}", model.attachments.len());
    println!("transitions: {}", model.transitions.len());

    println!("sequence groups: {}", model.sequence_groups.len());
    for group in &model.sequence_groups {
        println!("  {} ({})", group.label, group.file_name);
    }
    for file in data.sequence_groups().iter().flatten() {
        let header = file.header().with_context(context)?;
        println!("  loaded {}: {}", header.file_type(), header.name());
    }

    println!("sequences: {}", model.sequences.len());
    for sequence in &model.sequences {
        println!(
            "  {}: {} frames at {} fps, {} blends, group {}{}",
            sequence.label,
            sequence.frame_count,
            sequence.fps,
            sequence.blends.len(),
            sequence.sequence_group,
            if sequence.is_looping() { ", looping" } else { "" },
        );
    }

    println!("body parts: {}", model.body_parts.len());
    for body_part in &model.body_parts {
        println!("  {} ({} models)", body_part.name, body_part.models.len());
        for body_model in &body_part.models {
            let runs: usize = body_model.meshes.iter().map(|m| m.triangles.len()).sum();
            println!(
                "    {}: {} meshes, {} triangle runs",
                body_model.name,
                body_model.meshes.len(),
                runs
            );
        }
    }

    println!("textures: {}", model.textures.len());
    for texture in &model.textures {
        println!(
            "  {}: {}x{} {:?}",
            texture.name,
            texture.image.width(),
            texture.image.height(),
            texture.flags
        );
    }
    println!("skin families: {}", model.skin_families.len());

    Ok(())
}
