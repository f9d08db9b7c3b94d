//! On-disk layout of studio model files.
//!
//! Studio models are position independent: every section is located through a
//! `(count, offset)` pair measured from the start of the buffer holding the pair.
//! All records are little-endian and read without alignment requirements.

use std::fmt;

use bitflags::bitflags;
use byteorder::LittleEndian;
use glam::Vec3;
use zerocopy::{
    byteorder::{I16, I32, U16, U32},
    AsBytes, FromBytes, Unaligned,
};

pub type I16Le = I16<LittleEndian>;
pub type U16Le = U16<LittleEndian>;
pub type I32Le = I32<LittleEndian>;

/// Tag of main and texture headers.
pub const MAIN_HEADER_ID: [u8; 4] = *b"IDST";
/// Tag of demand loaded sequence group headers.
pub const SEQUENCE_GROUP_HEADER_ID: [u8; 4] = *b"IDSQ";

pub const FILE_VERSION: i32 = 10;

pub const VECTOR_COMPONENT_COUNT: usize = 3;
/// Translation + rotation.
pub const ANIMATION_CHANNEL_COUNT: usize = VECTOR_COMPONENT_COUNT * 2;
/// Sequences store parameters for two blend axes, regardless of the blend count.
pub const BLEND_DATA_COUNT: usize = 2;

pub const PALETTE_SIZE: usize = 256;
/// Size of the texture name prefixed to hybrid encoded texture data.
pub const HYBRID_TEXTURE_NAME_SIZE: usize = 32;

/// Bone controller index driven by the mouth instead of user input.
pub const MOUTH_CONTROLLER_INDEX: usize = 4;

#[derive(Clone, Copy, Default, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(transparent)]
pub struct F32Le(U32<LittleEndian>);

impl F32Le {
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(U32::new(value.to_bits()))
    }

    #[must_use]
    pub fn get(self) -> f32 {
        f32::from_bits(self.0.get())
    }
}

impl fmt::Debug for F32Le {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(transparent)]
pub struct Vec3Le([F32Le; 3]);

impl Vec3Le {
    #[must_use]
    pub fn new(value: Vec3) -> Self {
        Self([F32Le::new(value.x), F32Le::new(value.y), F32Le::new(value.z)])
    }

    #[must_use]
    pub fn get(&self) -> Vec3 {
        Vec3::new(self.0[0].get(), self.0[1].get(), self.0[2].get())
    }
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Header {
    pub id: [u8; 4],
    pub version: I32Le,

    pub name: [u8; 64],
    pub length: I32Le,

    pub eye_position: Vec3Le,
    pub hull_min: Vec3Le,
    pub hull_max: Vec3Le,

    pub bb_min: Vec3Le,
    pub bb_max: Vec3Le,

    pub flags: I32Le,

    pub bone_count: I32Le,
    pub bone_offset: I32Le,

    pub bone_controller_count: I32Le,
    pub bone_controller_offset: I32Le,

    pub hitbox_count: I32Le,
    pub hitbox_offset: I32Le,

    pub sequence_count: I32Le,
    pub sequence_offset: I32Le,

    pub sequence_group_count: I32Le,
    pub sequence_group_offset: I32Le,

    pub texture_count: I32Le,
    pub texture_offset: I32Le,
    pub texture_data_offset: I32Le,

    pub skin_reference_count: I32Le,
    pub skin_family_count: I32Le,
    pub skin_offset: I32Le,

    pub body_part_count: I32Le,
    pub body_part_offset: I32Le,

    pub attachment_count: I32Le,
    pub attachment_offset: I32Le,

    pub sound_table: I32Le,
    pub sound_offset: I32Le,
    pub sound_groups: I32Le,
    pub sound_group_offset: I32Le,

    pub transition_count: I32Le,
    pub transition_offset: I32Le,
}

/// Header of a demand loaded sequence group file, followed by animation data only.
#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct SequenceGroupHeader {
    pub id: [u8; 4],
    pub version: I32Le,

    pub name: [u8; 64],
    pub length: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Bone {
    pub name: [u8; 32],
    pub parent: I32Le,
    pub flags: I32Le,
    /// -1 == none
    pub bone_controller: [I32Le; ANIMATION_CHANNEL_COUNT],
    pub value: [F32Le; ANIMATION_CHANNEL_COUNT],
    pub scale: [F32Le; ANIMATION_CHANNEL_COUNT],
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct BoneController {
    pub bone: I32Le,
    pub kind: I32Le,
    pub start: F32Le,
    pub end: F32Le,
    pub rest: I32Le,
    /// 0-3 user set controller, 4 mouth
    pub index: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct HitBox {
    pub bone: I32Le,
    pub group: I32Le,
    pub bb_min: Vec3Le,
    pub bb_max: Vec3Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct SequenceGroup {
    pub label: [u8; 32],
    pub name: [u8; 64],
    pub unused_1: I32Le,
    pub unused_2: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct SequenceDesc {
    pub label: [u8; 32],

    pub fps: F32Le,
    pub flags: I32Le,

    pub activity: I32Le,
    pub activity_weight: I32Le,

    pub event_count: I32Le,
    pub event_offset: I32Le,

    pub frame_count: I32Le,

    pub pivot_count: I32Le,
    pub pivot_offset: I32Le,

    pub motion_type: I32Le,
    pub motion_bone: I32Le,
    pub linear_movement: Vec3Le,
    pub automove_position_offset: I32Le,
    pub automove_angle_offset: I32Le,

    pub bb_min: Vec3Le,
    pub bb_max: Vec3Le,

    pub blend_count: I32Le,
    /// Relative to the start of the sequence group buffer holding the animation.
    pub animation_offset: I32Le,

    pub blend_type: [I32Le; BLEND_DATA_COUNT],
    pub blend_start: [F32Le; BLEND_DATA_COUNT],
    pub blend_end: [F32Le; BLEND_DATA_COUNT],
    pub blend_parent: I32Le,

    pub sequence_group: I32Le,

    pub entry_node: I32Le,
    pub exit_node: I32Le,
    pub node_flags: I32Le,

    pub next_sequence: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Event {
    pub frame: I32Le,
    pub event: I32Le,
    pub kind: I32Le,
    pub options: [u8; 64],
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Pivot {
    pub origin: Vec3Le,
    pub start: I32Le,
    pub end: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Attachment {
    pub name: [u8; 32],
    pub kind: I32Le,
    pub bone: I32Le,
    pub origin: Vec3Le,
    pub vectors: [Vec3Le; 3],
}

/// Per bone animation record, one per bone for every blend.
/// A zero offset marks a constant channel; otherwise the offset is measured from this record.
#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Animation {
    pub offset: [U16Le; ANIMATION_CHANNEL_COUNT],
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct BodyPart {
    pub name: [u8; 64],
    pub model_count: I32Le,
    pub base: I32Le,
    pub model_offset: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Texture {
    pub name: [u8; 64],
    pub flags: I32Le,
    pub width: I32Le,
    pub height: I32Le,
    pub offset: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Model {
    pub name: [u8; 64],

    pub kind: I32Le,

    pub bounding_radius: F32Le,

    pub mesh_count: I32Le,
    pub mesh_offset: I32Le,

    pub vertex_count: I32Le,
    pub vertex_info_offset: I32Le,
    pub vertex_offset: I32Le,
    pub normal_count: I32Le,
    pub normal_info_offset: I32Le,
    pub normal_offset: I32Le,

    pub group_count: I32Le,
    pub group_offset: I32Le,
}

#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct Mesh {
    pub triangle_count: I32Le,
    pub triangle_offset: I32Le,
    pub skin_reference: I32Le,
    pub normal_count: I32Le,
    pub normal_offset: I32Le,
}

/// One vertex of a triangle command run.
#[derive(Debug, PartialEq, FromBytes, AsBytes, Unaligned)]
#[repr(C)]
pub struct TriangleVertex {
    pub vertex_index: I16Le,
    pub normal_index: I16Le,
    pub s: I16Le,
    pub t: I16Le,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: i32 {
        const FLAT_SHADE = 0x0001;
        const CHROME = 0x0002;
        const FULLBRIGHT = 0x0004;
        const NO_MIPS = 0x0008;
        const ALPHA = 0x0010;
        const ADDITIVE = 0x0020;
        const MASKED = 0x0040;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MotionFlags: i32 {
        const X = 0x0001;
        const Y = 0x0002;
        const Z = 0x0004;
        const XR = 0x0008;
        const YR = 0x0010;
        const ZR = 0x0020;
        const LX = 0x0040;
        const LY = 0x0080;
        const LZ = 0x0100;
        const AX = 0x0200;
        const AY = 0x0400;
        const AZ = 0x0800;
        const AXR = 0x1000;
        const AYR = 0x2000;
        const AZR = 0x4000;
        /// Controller that wraps shortest distance.
        const RLOOP = 0x8000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SequenceFlags: i32 {
        const LOOPING = 0x0001;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: i32 {
        const REVERSE = 1 << 0;
    }
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use super::*;

    #[test]
    fn record_sizes_match_file_format() {
        assert_eq!(size_of::<Header>(), 244);
        assert_eq!(size_of::<SequenceGroupHeader>(), 76);
        assert_eq!(size_of::<Bone>(), 112);
        assert_eq!(size_of::<BoneController>(), 24);
        assert_eq!(size_of::<HitBox>(), 32);
        assert_eq!(size_of::<SequenceGroup>(), 104);
        assert_eq!(size_of::<SequenceDesc>(), 176);
        assert_eq!(size_of::<Event>(), 76);
        assert_eq!(size_of::<Pivot>(), 20);
        assert_eq!(size_of::<Attachment>(), 88);
        assert_eq!(size_of::<Animation>(), 12);
        assert_eq!(size_of::<BodyPart>(), 76);
        assert_eq!(size_of::<Texture>(), 80);
        assert_eq!(size_of::<Model>(), 112);
        assert_eq!(size_of::<Mesh>(), 20);
        assert_eq!(size_of::<TriangleVertex>(), 8);
    }

    #[test]
    fn floats_are_little_endian() {
        let value = F32Le::new(1.5);
        assert_eq!(value.as_bytes(), 1.5f32.to_le_bytes());
        assert_eq!(value.get(), 1.5);
    }
}
