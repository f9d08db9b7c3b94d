//! Conversion of raw sections into their editable, owned form.

mod bones;
mod meshes;
mod sequences;
mod textures;

pub(crate) use bones::{attachments, bone_controllers, bones, hitboxes};
pub use meshes::{parse_triangle_commands, TriangleCommandRun};
pub(crate) use meshes::body_parts;
pub(crate) use sequences::{sequence_groups, sequences, transitions};
pub use textures::remap_hybrid_index;
pub(crate) use textures::{skin_families, textures};

use crate::{Error, FileType, Result};

/// Index field where a negative value means "none".
fn optional_index(value: i32) -> Option<usize> {
    value.try_into().ok()
}

/// Index field that must point into a section of `len` entries.
fn required_index(value: i32, len: usize, ty: FileType, error: &'static str) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|&index| index < len)
        .ok_or(Error::Corrupted { ty, error })
}
