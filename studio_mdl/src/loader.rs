use std::{
    ffi::OsString,
    fmt,
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    binary_utils::parse,
    format::{FILE_VERSION, MAIN_HEADER_ID, SEQUENCE_GROUP_HEADER_ID},
    header::{HeaderRef, SequenceHeaderRef, HEADER_SIZE, SEQUENCE_GROUP_HEADER_SIZE},
};

use super::{Error, ErrorKind, FileType, Result};

fn check_signature(bytes: &[u8], expected: [u8; 4], ty: FileType) -> Result<()> {
    let signature = bytes.get(0..4).ok_or(Error::Corrupted {
        ty,
        error: "eof reading signature",
    })?;

    if signature == expected {
        Ok(())
    } else {
        Err(Error::InvalidSignature {
            ty,
            signature: String::from_utf8_lossy(signature).into_owned(),
        })
    }
}

fn check_version(bytes: &[u8], ty: FileType) -> Result<()> {
    let version = bytes
        .get(4..8)
        .and_then(|b| b.try_into().ok())
        .map(i32::from_le_bytes)
        .ok_or(Error::Corrupted {
            ty,
            error: "eof reading version",
        })?;

    if version == FILE_VERSION {
        Ok(())
    } else {
        Err(Error::UnsupportedVersion { ty, version })
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|err| Error::from_open(&err, &path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|err| Error::from_io(&err, &path.display()))?;
    Ok(bytes)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|err| Error::from_write(&err, &path.display()))
}

/// Owned buffer of a validated main or texture file.
pub struct MainFile {
    bytes: Vec<u8>,
    ty: FileType,
}

impl MainFile {
    /// # Errors
    ///
    /// Returns `Err` if the tag or version is wrong or the buffer is smaller than a header.
    pub fn from_bytes(bytes: Vec<u8>, ty: FileType) -> Result<Self> {
        check_signature(&bytes, MAIN_HEADER_ID, ty)?;
        check_version(&bytes, ty)?;
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Corrupted {
                ty,
                error: "eof reading header",
            });
        }

        Ok(Self { bytes, ty })
    }

    /// # Errors
    ///
    /// Returns `Err` if the file can't be opened or read, or isn't a valid studio model.
    pub fn read(path: impl AsRef<Path>, ty: FileType) -> Result<Self> {
        Self::from_bytes(read_file(path.as_ref())?, ty)
    }

    /// # Errors
    ///
    /// Returns `Err` if the header doesn't fit in the buffer.
    pub fn header(&self) -> Result<HeaderRef> {
        let header = parse(&self.bytes, 0).ok_or(Error::Corrupted {
            ty: self.ty,
            error: "eof reading header",
        })?;

        Ok(HeaderRef::new(header, &self.bytes, self.ty))
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.ty
    }
}

impl fmt::Debug for MainFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainFile")
            .field("ty", &self.ty)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Owned buffer of a validated sequence group file.
pub struct SequenceGroupFile {
    bytes: Vec<u8>,
    ty: FileType,
}

impl SequenceGroupFile {
    /// # Errors
    ///
    /// Returns `Err` if the tag or version is wrong or the buffer is smaller than a header.
    pub fn from_bytes(bytes: Vec<u8>, index: usize) -> Result<Self> {
        let ty = FileType::SequenceGroup(index);

        check_signature(&bytes, SEQUENCE_GROUP_HEADER_ID, ty)?;
        check_version(&bytes, ty)?;
        if bytes.len() < SEQUENCE_GROUP_HEADER_SIZE {
            return Err(Error::Corrupted {
                ty,
                error: "eof reading header",
            });
        }

        Ok(Self { bytes, ty })
    }

    /// # Errors
    ///
    /// Returns `Err` if the file can't be opened or read, or isn't a valid sequence group.
    pub fn read(path: impl AsRef<Path>, index: usize) -> Result<Self> {
        Self::from_bytes(read_file(path.as_ref())?, index)
    }

    /// # Errors
    ///
    /// Returns `Err` if the header doesn't fit in the buffer.
    pub fn header(&self) -> Result<SequenceHeaderRef> {
        let header = parse(&self.bytes, 0).ok_or(Error::Corrupted {
            ty: self.ty,
            error: "eof reading header",
        })?;

        Ok(SequenceHeaderRef::new(header, self.ty))
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.ty
    }
}

impl fmt::Debug for SequenceGroupFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceGroupFile")
            .field("ty", &self.ty)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Checks whether the stream starts with a studio model or sequence group header
/// of a supported version. The stream position is left unchanged.
///
/// # Errors
///
/// Returns `Err` if seeking fails.
pub fn is_studio_header<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let start = reader.stream_position()?;

    let mut prefix = [0; 8];
    let result = reader.read_exact(&mut prefix);
    reader.seek(SeekFrom::Start(start))?;

    match result {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
        Err(err) => return Err(err),
    }

    let tag_matches = prefix[0..4] == MAIN_HEADER_ID || prefix[0..4] == SEQUENCE_GROUP_HEADER_ID;
    let version = i32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);

    Ok(tag_matches && version == FILE_VERSION)
}

pub(crate) fn is_hybrid_path(path: &Path) -> bool {
    path.extension()
        .map_or(false, |extension| extension.eq_ignore_ascii_case("dol"))
}

fn auxiliary_file_path(path: &Path, suffix: &str) -> PathBuf {
    let extension = if is_hybrid_path(path) { "dol" } else { "mdl" };

    let mut file_name = path.file_stem().map_or_else(OsString::new, ToOwned::to_owned);
    file_name.push(suffix);
    file_name.push(".");
    file_name.push(extension);

    path.with_file_name(file_name)
}

/// `models/barney.mdl` -> `models/barneyT.mdl`
#[must_use]
pub fn texture_file_path(path: impl AsRef<Path>) -> PathBuf {
    auxiliary_file_path(path.as_ref(), "T")
}

/// `models/barney.mdl`, 1 -> `models/barney01.mdl`
#[must_use]
pub fn sequence_group_file_path(path: impl AsRef<Path>, index: usize) -> PathBuf {
    auxiliary_file_path(path.as_ref(), &format!("{index:02}"))
}

/// Every raw buffer making up one studio model.
#[derive(Debug)]
pub struct StudioData {
    path: PathBuf,
    main: MainFile,
    texture: Option<MainFile>,
    sequence_groups: Vec<Option<SequenceGroupFile>>,
}

impl StudioData {
    /// Assembles already loaded buffers. `sequence_groups[i]` holds group `i + 1`.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        main: MainFile,
        texture: Option<MainFile>,
        sequence_groups: Vec<Option<SequenceGroupFile>>,
    ) -> Self {
        Self {
            path: path.into(),
            main,
            texture,
            sequence_groups,
        }
    }

    /// Loads a model and its texture and sequence group files.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the main file or any sequence group file fails to load,
    /// or if the texture file exists but fails to load.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let main = MainFile::read(path, FileType::Main)?;
        Self::load_auxiliary(path, main)
    }

    /// Same as [`Self::read`], but the main file is read from `reader` starting at its
    /// current position. `path` locates the auxiliary files.
    ///
    /// # Errors
    ///
    /// Returns `Err` if reading fails or any file is invalid.
    pub fn read_from(path: impl AsRef<Path>, reader: &mut impl Read) -> Result<Self> {
        let path = path.as_ref();

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|err| Error::from_io(&err, &path.display()))?;
        let main = MainFile::from_bytes(bytes, FileType::Main)?;

        Self::load_auxiliary(path, main)
    }

    fn load_auxiliary(path: &Path, main: MainFile) -> Result<Self> {
        let header = main.header()?.raw();
        let texture_count = header.texture_count.get();
        let sequence_group_count = header.sequence_group_count.get();

        let texture = if texture_count == 0 {
            let texture_path = texture_file_path(path);
            debug!("loading texture file `{}`", texture_path.display());

            match MainFile::read(&texture_path, FileType::Texture) {
                Ok(texture) => Some(texture),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!(
                        "texture file `{}` not found, model has no textures",
                        texture_path.display()
                    );
                    None
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        let sequence_groups = (1..usize::try_from(sequence_group_count).unwrap_or(0))
            .map(|index| {
                let group_path = sequence_group_file_path(path, index);
                debug!("loading sequence group file `{}`", group_path.display());
                SequenceGroupFile::read(group_path, index).map(Some)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path: path.to_owned(),
            main,
            texture,
            sequence_groups,
        })
    }

    /// Writes every buffer back next to `path`, using the same naming as [`Self::read`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if a destination can't be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        write_file(path, self.main.bytes())?;

        if let Some(texture) = &self.texture {
            write_file(&texture_file_path(path), texture.bytes())?;
        }

        for (i, group) in self.sequence_groups.iter().enumerate() {
            if let Some(group) = group {
                write_file(&sequence_group_file_path(path, i + 1), group.bytes())?;
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn main(&self) -> &MainFile {
        &self.main
    }

    #[must_use]
    pub fn texture(&self) -> Option<&MainFile> {
        self.texture.as_ref()
    }

    #[must_use]
    pub fn sequence_groups(&self) -> &[Option<SequenceGroupFile>] {
        &self.sequence_groups
    }

    /// Sequence group `index` (1-based) if it's loaded.
    #[must_use]
    pub fn sequence_group(&self, index: usize) -> Option<&SequenceGroupFile> {
        index
            .checked_sub(1)
            .and_then(|i| self.sequence_groups.get(i))
            .and_then(Option::as_ref)
    }
}
