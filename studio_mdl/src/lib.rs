#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Reader for GoldSource studio models (`.mdl`, `.dol`).
//!
//! Loading happens in two steps: [`StudioData`] owns the raw, validated file buffers
//! (main file, optional texture file and sequence group files), and
//! [`EditableStudioModel::from_studio_data`] converts them into a self-contained model
//! with no references back to the raw bytes.

mod binary_utils;
mod convert;
mod editable;
mod header;
mod image;
mod loader;
mod settings;

pub mod animation;
pub mod format;

#[cfg(test)]
mod fixture;

use std::{
    fmt::{self, Display},
    io, result,
};

use thiserror::Error;

pub use convert::{parse_triangle_commands, remap_hybrid_index, TriangleCommandRun};
pub use editable::{
    BoneAxes, EditableAnimation, EditableAttachment, EditableBlend, EditableBodypart,
    EditableBone, EditableBoneController, EditableEvent, EditableHitbox, EditableMesh,
    EditableMeshTriangleRun, EditableMeshVertex, EditableModel, EditablePivot, EditableSequence,
    EditableSequenceGroup, EditableStudioModel, EditableTexture,
};
pub use header::{HeaderRef, SequenceHeaderRef};
pub use image::{IndexedImage, Palette};
pub use loader::{
    is_studio_header, sequence_group_file_path, texture_file_path, MainFile, SequenceGroupFile,
    StudioData,
};
pub use settings::{Settings, TextureEncoding};

#[derive(Debug, Clone, Error, Hash, PartialEq, Eq)]
pub enum Error {
    #[error("could not open `{path}`: {error}")]
    NotFound { path: String, error: String },
    #[error("io error reading `{path}`: {error}")]
    Io { path: String, error: String },
    #[error("not a {ty} file: invalid signature `{signature}`")]
    InvalidSignature { ty: FileType, signature: String },
    #[error("unsupported {ty} version {version}")]
    UnsupportedVersion { ty: FileType, version: i32 },
    #[error("{ty} corrupted: {error}")]
    Corrupted { ty: FileType, error: &'static str },
    #[error("{ty} corrupted: {section} out of bounds")]
    OutOfBounds { ty: FileType, section: &'static str },
    #[error("error writing `{path}`: {error}")]
    Write { path: String, error: String },
}

/// Broad classification of an [`Error`], for callers that only care about the kind of failure.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file does not exist or cannot be opened for reading.
    NotFound,
    /// Wrong tag, truncated read or a structurally invalid section.
    InvalidFormat,
    /// Correct tag but unsupported version.
    VersionMismatch,
    /// The destination could not be opened or was only partially written.
    WriteFailure,
}

/// Which of the files making up a model an error refers to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum FileType {
    Main,
    Texture,
    /// 1-based sequence group index.
    SequenceGroup(usize),
}

pub type Result<T> = result::Result<T, Error>;

impl Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Main => f.write_str("studio model"),
            FileType::Texture => f.write_str("studio texture"),
            FileType::SequenceGroup(index) => write!(f, "studio sequence group {index}"),
        }
    }
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Io { .. }
            | Error::InvalidSignature { .. }
            | Error::Corrupted { .. }
            | Error::OutOfBounds { .. } => ErrorKind::InvalidFormat,
            Error::UnsupportedVersion { .. } => ErrorKind::VersionMismatch,
            Error::Write { .. } => ErrorKind::WriteFailure,
        }
    }

    /// The version found in the file, if this is a version mismatch.
    #[must_use]
    pub fn found_version(&self) -> Option<i32> {
        match self {
            Error::UnsupportedVersion { version, .. } => Some(*version),
            _ => None,
        }
    }

    fn from_io(err: &io::Error, path: &impl Display) -> Self {
        Self::Io {
            path: path.to_string(),
            error: err.to_string(),
        }
    }

    fn from_open(err: &io::Error, path: &impl Display) -> Self {
        Self::NotFound {
            path: path.to_string(),
            error: err.to_string(),
        }
    }

    fn from_write(err: &io::Error, path: &impl Display) -> Self {
        Self::Write {
            path: path.to_string(),
            error: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let not_found = Error::NotFound {
            path: "a.mdl".to_owned(),
            error: "missing".to_owned(),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let version = Error::UnsupportedVersion {
            ty: FileType::Main,
            version: 44,
        };
        assert_eq!(version.kind(), ErrorKind::VersionMismatch);
        assert_eq!(version.found_version(), Some(44));
        assert_eq!(version.to_string(), "unsupported studio model version 44");

        let bounds = Error::OutOfBounds {
            ty: FileType::SequenceGroup(2),
            section: "animation data",
        };
        assert_eq!(bounds.kind(), ErrorKind::InvalidFormat);
        assert_eq!(bounds.found_version(), None);
        assert_eq!(
            bounds.to_string(),
            "studio sequence group 2 corrupted: animation data out of bounds"
        );
    }
}
