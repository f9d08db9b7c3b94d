//! Builds synthetic studio model buffers for tests.

use zerocopy::{AsBytes, FromBytes};

use crate::{
    format::{
        Header, SequenceGroupHeader, FILE_VERSION, MAIN_HEADER_ID, SEQUENCE_GROUP_HEADER_ID,
    },
    header::HEADER_SIZE,
};

/// Fixed width, NUL padded name field.
pub fn name<const N: usize>(value: &str) -> [u8; N] {
    let mut field = [0; N];
    field[..value.len()].copy_from_slice(value.as_bytes());
    field
}

pub fn main_header() -> Header {
    let mut header = Header::new_zeroed();
    header.id = MAIN_HEADER_ID;
    header.version.set(FILE_VERSION);
    header.name = name("test.mdl");
    header
}

pub fn sequence_group_header() -> SequenceGroupHeader {
    let mut header = SequenceGroupHeader::new_zeroed();
    header.id = SEQUENCE_GROUP_HEADER_ID;
    header.version.set(FILE_VERSION);
    header.name = name("test01.mdl");
    header
}

/// Appends records after space reserved for the header, handing out their offsets.
pub struct FileBuilder {
    bytes: Vec<u8>,
}

impl FileBuilder {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; HEADER_SIZE],
        }
    }

    pub fn push<T: AsBytes + ?Sized>(&mut self, value: &T) -> i32 {
        let offset = i32::try_from(self.bytes.len()).unwrap();
        self.bytes.extend_from_slice(value.as_bytes());
        offset
    }

    /// Writes `header` at the start of the buffer, filling in its length field.
    pub fn finish<H: AsBytes>(mut self, header: &H) -> Vec<u8> {
        let header = header.as_bytes();
        self.bytes[..header.len()].copy_from_slice(header);

        let length = i32::try_from(self.bytes.len()).unwrap();
        // `length` follows the tag, version and 64 byte name in both header kinds
        self.bytes[72..76].copy_from_slice(&length.to_le_bytes());
        self.bytes
    }
}
