use std::mem::size_of;

use glam::Vec3;
use zerocopy::{FromBytes, Unaligned};

use crate::binary_utils::{fixed_string, parse_slice};
use crate::format::{
    Attachment, BodyPart, Bone, BoneController, Event, Header, HitBox, I16Le, I32Le, Mesh, Model,
    Pivot, SequenceDesc, SequenceGroup, SequenceGroupHeader, Texture, Vec3Le,
};

use super::{Error, FileType, Result};

/// Converts an on-disk count or offset, rejecting negative values.
pub(crate) fn to_usize(value: I32Le, ty: FileType, section: &'static str) -> Result<usize> {
    value
        .get()
        .try_into()
        .map_err(|_| Error::OutOfBounds { ty, section })
}

/// Typed, non-owning view of a main or texture header and the buffer it lives in.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRef<'a> {
    header: &'a Header,
    bytes: &'a [u8],
    ty: FileType,
}

impl<'a> HeaderRef<'a> {
    pub(crate) fn new(header: &'a Header, bytes: &'a [u8], ty: FileType) -> Self {
        Self { header, bytes, ty }
    }

    #[must_use]
    pub fn raw(&self) -> &'a Header {
        self.header
    }

    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.ty
    }

    #[must_use]
    pub fn name(&self) -> String {
        fixed_string(&self.header.name)
    }

    #[must_use]
    pub fn eye_position(&self) -> Vec3 {
        self.header.eye_position.get()
    }

    /// Reads `count` records of `T` starting at `offset` in this header's buffer.
    pub(crate) fn section<T: FromBytes + Unaligned>(
        &self,
        offset: I32Le,
        count: I32Le,
        section: &'static str,
    ) -> Result<&'a [T]> {
        let count = to_usize(count, self.ty, section)?;
        if count == 0 {
            return Ok(&[]);
        }
        let offset = to_usize(offset, self.ty, section)?;

        parse_slice(self.bytes, offset, count).ok_or(Error::OutOfBounds {
            ty: self.ty,
            section,
        })
    }

    /// Same as [`Self::section`] for sections whose count is a product of two header fields.
    fn section_2d<T: FromBytes + Unaligned>(
        &self,
        offset: I32Le,
        rows: I32Le,
        columns: I32Le,
        section: &'static str,
    ) -> Result<&'a [T]> {
        let rows = to_usize(rows, self.ty, section)?;
        let columns = to_usize(columns, self.ty, section)?;
        let count = rows.checked_mul(columns).ok_or(Error::OutOfBounds {
            ty: self.ty,
            section,
        })?;
        if count == 0 {
            return Ok(&[]);
        }
        let offset = to_usize(offset, self.ty, section)?;

        parse_slice(self.bytes, offset, count).ok_or(Error::OutOfBounds {
            ty: self.ty,
            section,
        })
    }

    pub fn bones(&self) -> Result<&'a [Bone]> {
        self.section(self.header.bone_offset, self.header.bone_count, "bones")
    }

    pub fn bone_controllers(&self) -> Result<&'a [BoneController]> {
        self.section(
            self.header.bone_controller_offset,
            self.header.bone_controller_count,
            "bone controllers",
        )
    }

    pub fn hitboxes(&self) -> Result<&'a [HitBox]> {
        self.section(
            self.header.hitbox_offset,
            self.header.hitbox_count,
            "hitboxes",
        )
    }

    pub fn sequences(&self) -> Result<&'a [SequenceDesc]> {
        self.section(
            self.header.sequence_offset,
            self.header.sequence_count,
            "sequences",
        )
    }

    pub fn sequence_groups(&self) -> Result<&'a [SequenceGroup]> {
        self.section(
            self.header.sequence_group_offset,
            self.header.sequence_group_count,
            "sequence groups",
        )
    }

    pub fn textures(&self) -> Result<&'a [Texture]> {
        self.section(
            self.header.texture_offset,
            self.header.texture_count,
            "textures",
        )
    }

    /// Skin family table, `skin_family_count` rows of `skin_reference_count` texture indices.
    pub fn skin_families(&self) -> Result<&'a [I16Le]> {
        self.section_2d(
            self.header.skin_offset,
            self.header.skin_family_count,
            self.header.skin_reference_count,
            "skin families",
        )
    }

    pub fn body_parts(&self) -> Result<&'a [BodyPart]> {
        self.section(
            self.header.body_part_offset,
            self.header.body_part_count,
            "body parts",
        )
    }

    pub fn attachments(&self) -> Result<&'a [Attachment]> {
        self.section(
            self.header.attachment_offset,
            self.header.attachment_count,
            "attachments",
        )
    }

    /// Row-major transition matrix, `transition_count` squared bytes.
    pub fn transitions(&self) -> Result<&'a [u8]> {
        self.section_2d(
            self.header.transition_offset,
            self.header.transition_count,
            self.header.transition_count,
            "transitions",
        )
    }

    pub fn events(&self, sequence: &SequenceDesc) -> Result<&'a [Event]> {
        self.section(sequence.event_offset, sequence.event_count, "events")
    }

    pub fn pivots(&self, sequence: &SequenceDesc) -> Result<&'a [Pivot]> {
        self.section(sequence.pivot_offset, sequence.pivot_count, "pivots")
    }

    pub fn models(&self, body_part: &BodyPart) -> Result<&'a [Model]> {
        self.section(body_part.model_offset, body_part.model_count, "models")
    }

    pub fn meshes(&self, model: &Model) -> Result<&'a [Mesh]> {
        self.section(model.mesh_offset, model.mesh_count, "meshes")
    }

    /// Bone index of every vertex of a model.
    pub fn vertex_bones(&self, model: &Model) -> Result<&'a [u8]> {
        self.section(
            model.vertex_info_offset,
            model.vertex_count,
            "vertex bone info",
        )
    }

    pub fn vertices(&self, model: &Model) -> Result<&'a [Vec3Le]> {
        self.section(model.vertex_offset, model.vertex_count, "vertices")
    }

    /// Bone index of every normal of a model.
    pub fn normal_bones(&self, model: &Model) -> Result<&'a [u8]> {
        self.section(
            model.normal_info_offset,
            model.normal_count,
            "normal bone info",
        )
    }

    pub fn normals(&self, model: &Model) -> Result<&'a [Vec3Le]> {
        self.section(model.normal_offset, model.normal_count, "normals")
    }

    /// The zero terminated triangle command stream of a mesh and everything after it.
    pub fn triangle_commands(&self, mesh: &Mesh) -> Result<&'a [u8]> {
        let offset = to_usize(mesh.triangle_offset, self.ty, "triangle commands")?;

        self.bytes.get(offset..).ok_or(Error::OutOfBounds {
            ty: self.ty,
            section: "triangle commands",
        })
    }

    /// `length` bytes of texture data starting `skip` bytes after the texture's offset.
    pub fn texture_data(&self, texture: &Texture, skip: usize, length: usize) -> Result<&'a [u8]> {
        let offset = to_usize(texture.offset, self.ty, "texture data")?;

        offset
            .checked_add(skip)
            .and_then(|start| Some(start..start.checked_add(length)?))
            .and_then(|range| self.bytes.get(range))
            .ok_or(Error::OutOfBounds {
                ty: self.ty,
                section: "texture data",
            })
    }
}

/// Typed, non-owning view of a sequence group header.
#[derive(Debug, Clone, Copy)]
pub struct SequenceHeaderRef<'a> {
    header: &'a SequenceGroupHeader,
    ty: FileType,
}

impl<'a> SequenceHeaderRef<'a> {
    pub(crate) fn new(header: &'a SequenceGroupHeader, ty: FileType) -> Self {
        Self { header, ty }
    }

    #[must_use]
    pub fn name(&self) -> String {
        fixed_string(&self.header.name)
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.ty
    }
}

pub(crate) const HEADER_SIZE: usize = size_of::<Header>();
pub(crate) const SEQUENCE_GROUP_HEADER_SIZE: usize = size_of::<SequenceGroupHeader>();
