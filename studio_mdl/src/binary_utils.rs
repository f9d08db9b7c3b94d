use std::mem::size_of;

use zerocopy::{FromBytes, LayoutVerified, Unaligned};

pub fn null_terminated_prefix(bytes: &[u8]) -> &[u8] {
    bytes.splitn(2, |&b| b == 0).next().unwrap_or(bytes)
}

/// Decodes a fixed width, NUL padded name field.
pub fn fixed_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(null_terminated_prefix(bytes)).into_owned()
}

pub fn parse<T: FromBytes + Unaligned>(bytes: &[u8], offset: usize) -> Option<&T> {
    bytes
        .get(offset..)
        .and_then(LayoutVerified::<_, T>::new_unaligned_from_prefix)
        .map(|(res, _)| res.into_ref())
}

pub fn parse_slice<T: FromBytes + Unaligned>(
    bytes: &[u8],
    offset: usize,
    count: usize,
) -> Option<&[T]> {
    if count == 0 {
        return Some(&[]);
    }

    let end = count
        .checked_mul(size_of::<T>())
        .and_then(|length| length.checked_add(offset))?;

    bytes
        .get(offset..end)
        .and_then(LayoutVerified::new_slice_unaligned)
        .map(|res| res.into_slice())
}

pub fn parse_mut<'a, T: FromBytes + Unaligned>(bytes: &mut &'a [u8]) -> Option<&'a T> {
    LayoutVerified::<_, T>::new_unaligned_from_prefix(*bytes).map(|(res, remaining)| {
        *bytes = remaining;
        res.into_ref()
    })
}

pub fn parse_slice_mut<'a, T: FromBytes + Unaligned>(
    bytes: &mut &'a [u8],
    count: usize,
) -> Option<&'a [T]> {
    if count == 0 {
        return Some(&[]);
    }

    LayoutVerified::new_slice_unaligned_from_prefix(*bytes, count).map(|(res, remaining)| {
        *bytes = remaining;
        res.into_slice()
    })
}
