//! Element header decoding.
//!
//! The layout of an element header depends on the transfer syntax in effect
//! *and* on the element itself: the file meta group (`0x0002`) is always
//! explicit VR, and under implicit VR an unknown attribute may still be
//! probed for an explicit header or an undefined-length sequence (the loose
//! private tag policy). Four layouts are possible, tried in this order:
//!
//! 1. **Explicit**: the syntax is explicit, or the group is `0x0002`.
//!    2 VR bytes, then a 2-byte length, or 2 reserved bytes and a 4-byte
//!    length for VRs of the extended form.
//! 2. **Explicit (loose override)**: implicit syntax, tag absent from the
//!    dictionary, and the speculative 4 bytes start with a valid VR code.
//!    Decoded as explicit.
//! 3. **Implicit sequence (loose)**: implicit syntax, unknown tag, and the
//!    speculative 4 bytes read as the undefined-length marker. Decoded as a
//!    sequence of undefined length.
//! 4. **Implicit**: the VR comes from the dictionary (`UN` when unknown)
//!    and the 4 speculative bytes are the value length.
//!
//! Tag and length fields are little endian in every mode; the transfer
//! syntax byte order concerns value fields only.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmlite_core::dictionary::DictionaryEntry;
use dcmlite_core::{DataDictionary, DataElementHeader, Length, Tag, VR};
use snafu::ResultExt;
use std::io::Read;

use crate::error::{ReadHeaderSnafu, ReadTagSnafu, Result, StrayDelimiterSnafu};
use crate::source::ByteSource;
use crate::transfer_syntax::TransferSyntax;

/// Decode the tag of the next data element.
///
/// Tags are framed as two little-endian 16-bit numbers, group first,
/// regardless of the transfer syntax.
pub(crate) fn decode_tag<S>(source: &mut ByteSource<S>) -> Result<Tag>
where
    S: Read,
{
    let position = source.position();
    let mut buf = [0u8; 4];
    source
        .read_exact(&mut buf)
        .context(ReadTagSnafu { position })?;
    Ok(Tag(
        LittleEndian::read_u16(&buf[0..2]),
        LittleEndian::read_u16(&buf[2..4]),
    ))
}

/// Decode the next element header (tag, VR and value length) from the given
/// source, under the given transfer syntax.
///
/// At the end of this operation, the source points at the element's value
/// field. A sequence delimiter in element position is a structural error:
/// it means the preceding sequence was decoded with the wrong layout.
pub(crate) fn decode_header<S, D>(
    source: &mut ByteSource<S>,
    syntax: TransferSyntax,
    dict: &D,
    loose_tags: bool,
) -> Result<DataElementHeader>
where
    S: Read,
    D: DataDictionary,
{
    let tag = decode_tag(source)?;
    if tag == Tag(0xFFFE, 0xE0DD) || tag == Tag(0xFFFE, 0xE00D) {
        return StrayDelimiterSnafu {
            tag,
            position: source.position() - 4,
        }
        .fail();
    }

    // speculative read: VR (2) + length (2) if explicit, length (4) if implicit
    let position = source.position();
    let mut buf = [0u8; 4];
    source
        .read_exact(&mut buf)
        .context(ReadHeaderSnafu { position })?;

    if !syntax.is_implicit() || tag.group() == 0x0002 {
        return decode_explicit(source, tag, buf);
    }

    if loose_tags && dict.by_tag(tag).is_none() {
        // unknown attribute under implicit VR: probe for an explicit header
        // first, then for an undefined-length sequence
        if VR::from_binary([buf[0], buf[1]]).is_some() {
            return decode_explicit(source, tag, buf);
        }
        if LittleEndian::read_u32(&buf) == Length::UNDEFINED.0 {
            return Ok(DataElementHeader::new(tag, VR::SQ, Length::UNDEFINED));
        }
    }

    let vr = dict.by_tag(tag).map(|entry| entry.vr()).unwrap_or(VR::UN);
    let len = LittleEndian::read_u32(&buf);
    Ok(DataElementHeader::new(tag, vr, Length(len)))
}

/// Finish decoding an explicit header whose first four bytes (VR and short
/// length) were already read into `buf`.
fn decode_explicit<S>(
    source: &mut ByteSource<S>,
    tag: Tag,
    buf: [u8; 4],
) -> Result<DataElementHeader>
where
    S: Read,
{
    let (vr, len) = match VR::from_binary([buf[0], buf[1]]) {
        Some(vr) if vr.uses_extended_length() => {
            // buf[2..4] are reserved; the length is in the next 4 bytes
            let position = source.position();
            let mut len_buf = [0u8; 4];
            source
                .read_exact(&mut len_buf)
                .context(ReadHeaderSnafu { position })?;
            (vr, LittleEndian::read_u32(&len_buf))
        }
        Some(vr) => (vr, u32::from(LittleEndian::read_u16(&buf[2..4]))),
        // two bytes which name no representation: keep the short layout
        None => (VR::UN, u32::from(LittleEndian::read_u16(&buf[2..4]))),
    };
    Ok(DataElementHeader::new(tag, vr, Length(len)))
}
