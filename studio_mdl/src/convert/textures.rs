use std::mem::size_of;

use itertools::Itertools;
use rgb::{FromSlice, RGB8, RGBA8};

use crate::{
    binary_utils::fixed_string,
    editable::EditableTexture,
    format::{Texture, TextureFlags, HYBRID_TEXTURE_NAME_SIZE, PALETTE_SIZE},
    header::{to_usize, HeaderRef},
    image::{IndexedImage, Palette},
    settings::TextureEncoding,
    Error, Result,
};

/// Maps a hybrid encoded pixel to its index in the indexed palette order.
///
/// Within every group of 32 palette entries the blocks `8..16` and `16..24` are swapped.
#[must_use]
pub fn remap_hybrid_index(pixel: u8) -> u8 {
    match pixel & 0x1F {
        8..=15 => pixel + 8,
        16..=23 => pixel - 8,
        _ => pixel,
    }
}

fn corrupted_dimensions(header: &HeaderRef) -> Error {
    Error::Corrupted {
        ty: header.file_type(),
        error: "texture dimensions too large",
    }
}

fn texture(
    header: &HeaderRef,
    texture: &Texture,
    encoding: TextureEncoding,
) -> Result<EditableTexture> {
    let ty = header.file_type();
    let width = to_usize(texture.width, ty, "texture data")?;
    let height = to_usize(texture.height, ty, "texture data")?;
    let pixel_count = width
        .checked_mul(height)
        .ok_or_else(|| corrupted_dimensions(header))?;

    let mut palette = Box::new([RGB8::default(); PALETTE_SIZE]);

    let pixels = match encoding {
        TextureEncoding::Indexed => {
            let palette_size = PALETTE_SIZE * size_of::<RGB8>();
            let data = header.texture_data(
                texture,
                0,
                pixel_count
                    .checked_add(palette_size)
                    .ok_or_else(|| corrupted_dimensions(header))?,
            )?;
            let (pixels, source_palette) = data.split_at(pixel_count);

            palette.copy_from_slice(source_palette.as_rgb());
            pixels.to_vec()
        }
        TextureEncoding::Hybrid => {
            let palette_size = PALETTE_SIZE * size_of::<RGBA8>();
            let data = header.texture_data(
                texture,
                HYBRID_TEXTURE_NAME_SIZE,
                pixel_count
                    .checked_add(palette_size)
                    .ok_or_else(|| corrupted_dimensions(header))?,
            )?;
            let (source_palette, pixels) = data.split_at(palette_size);

            for (entry, source) in palette.iter_mut().zip(source_palette.as_rgba()) {
                *entry = source.rgb();
            }
            pixels.iter().copied().map(remap_hybrid_index).collect()
        }
    };

    let image =
        to_image(palette, pixels, width, height).ok_or_else(|| corrupted_dimensions(header))?;

    Ok(EditableTexture {
        name: fixed_string(&texture.name),
        flags: TextureFlags::from_bits_retain(texture.flags.get()),
        image,
    })
}

fn to_image(
    palette: Box<Palette>,
    pixels: Vec<u8>,
    width: usize,
    height: usize,
) -> Option<IndexedImage> {
    IndexedImage::new(
        palette,
        pixels,
        width.try_into().ok()?,
        height.try_into().ok()?,
    )
}

pub(crate) fn textures(
    header: &HeaderRef,
    encoding: TextureEncoding,
) -> Result<Vec<EditableTexture>> {
    header
        .textures()?
        .iter()
        .map(|raw| texture(header, raw, encoding))
        .try_collect()
}

pub(crate) fn skin_families(header: &HeaderRef) -> Result<Vec<Vec<i16>>> {
    let skins = header.skin_families()?;
    let ty = header.file_type();
    let reference_count = to_usize(header.raw().skin_reference_count, ty, "skin families")?;
    if reference_count == 0 {
        let family_count = to_usize(header.raw().skin_family_count, ty, "skin families")?;
        return Ok(vec![Vec::new(); family_count]);
    }

    Ok(skins
        .chunks_exact(reference_count)
        .map(|family| family.iter().map(|skin| skin.get()).collect())
        .collect())
}
