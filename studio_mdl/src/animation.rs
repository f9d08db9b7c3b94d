//! Decoding of the run-length compressed per channel animation streams.
//!
//! Each channel that isn't constant points at a stream of runs. A run starts with a
//! header holding two bytes, `valid` and `total`, followed by `valid` literal `i16` values.
//! The run covers `total` frames; frames past the literals hold the last literal.

use std::mem::size_of;

use crate::{
    binary_utils::{parse, parse_mut, parse_slice_mut},
    format::{Animation, I16Le, U16Le, ANIMATION_CHANNEL_COUNT},
    Error, FileType, Result,
};

/// Header of one run in a channel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHeader {
    /// Number of literal values stored after the header.
    pub valid: u8,
    /// Number of frames covered by the run.
    pub total: u8,
}

impl RunHeader {
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        let [valid, total] = raw.to_le_bytes();
        Self { valid, total }
    }
}

/// Decodes one channel stream into exactly `frame_count` values.
///
/// With `strict` set, the run totals must add up to `frame_count`. Otherwise surplus frames
/// are dropped and a stream ending early is padded by holding its last value.
///
/// # Errors
///
/// Returns `Err` if the stream is truncated or malformed, or if `strict` is set and the
/// sequence has no frames.
pub fn decode_channel(
    bytes: &[u8],
    frame_count: usize,
    strict: bool,
    ty: FileType,
) -> Result<Vec<i16>> {
    if frame_count == 0 && strict {
        return Err(Error::Corrupted {
            ty,
            error: "animated channel in a sequence without frames",
        });
    }

    let mut values = Vec::with_capacity(frame_count);
    let mut stream = bytes;

    while values.len() < frame_count {
        let header = match parse_mut::<U16Le>(&mut stream) {
            Some(header) => RunHeader::from_raw(header.get()),
            None if !strict && !values.is_empty() => break,
            None => {
                return Err(Error::OutOfBounds {
                    ty,
                    section: "animation values",
                })
            }
        };

        if header.total == 0 {
            return Err(Error::Corrupted {
                ty,
                error: "empty animation run",
            });
        }
        if header.valid > header.total {
            return Err(Error::Corrupted {
                ty,
                error: "animation run has more values than frames",
            });
        }

        let literals: &[I16Le] = parse_slice_mut(&mut stream, header.valid.into()).ok_or(
            Error::OutOfBounds {
                ty,
                section: "animation values",
            },
        )?;
        values.extend(literals.iter().map(|value| value.get()));

        let last = *values.last().ok_or(Error::Corrupted {
            ty,
            error: "animation run holds a value before any was read",
        })?;
        let held = usize::from(header.total - header.valid);
        values.resize(values.len() + held, last);
    }

    if values.len() > frame_count {
        if strict {
            return Err(Error::Corrupted {
                ty,
                error: "animation runs exceed the frame count",
            });
        }
        values.truncate(frame_count);
    }

    if let Some(&last) = values.last() {
        values.resize(frame_count, last);
    }

    Ok(values)
}

/// Decodes all channels of the animation record at `record_offset` in `bytes`.
/// Channels with a zero offset are constant and stay empty.
///
/// # Errors
///
/// Returns `Err` if the record or any of its streams is out of bounds or malformed.
pub fn decode_bone_channels(
    bytes: &[u8],
    record_offset: usize,
    frame_count: usize,
    strict: bool,
    ty: FileType,
) -> Result<[Vec<i16>; ANIMATION_CHANNEL_COUNT]> {
    let record: &Animation = parse(bytes, record_offset).ok_or(Error::OutOfBounds {
        ty,
        section: "animation",
    })?;

    let mut channels: [Vec<i16>; ANIMATION_CHANNEL_COUNT] = Default::default();

    for (channel, offset) in channels.iter_mut().zip(&record.offset) {
        let offset = usize::from(offset.get());
        if offset == 0 {
            continue;
        }

        let stream = record_offset
            .checked_add(offset)
            .and_then(|start| bytes.get(start..))
            .ok_or(Error::OutOfBounds {
                ty,
                section: "animation values",
            })?;

        *channel = decode_channel(stream, frame_count, strict, ty)?;
    }

    Ok(channels)
}

/// Offset of the animation record of `bone` in `blend`, relative to the sequence's
/// animation block.
#[must_use]
pub fn record_offset(blend: usize, bone: usize, bone_count: usize) -> Option<usize> {
    blend
        .checked_mul(bone_count)?
        .checked_add(bone)?
        .checked_mul(size_of::<Animation>())
}
