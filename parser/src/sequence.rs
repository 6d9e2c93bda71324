//! Sequence value reading.
//!
//! A sequence (VR `SQ`) value is a series of items. Each item starts with
//! the item tag `(FFFE,E000)` and a 4-byte length: either a byte count, or
//! the undefined-length marker `0xFFFF_FFFF`, in which case the item runs
//! until its item delimiter `(FFFE,E00D)`. The sequence itself is either
//! bounded by a byte count from its element header (defined mode) or runs
//! until the sequence delimiter `(FFFE,E0DD)` (undefined mode).
//!
//! Undefined-length items are materialised by accumulating one byte at a
//! time while scanning the tail of the buffer for delimiters. A delimiter
//! only terminates the item when it belongs to it: every undefined-length
//! subsequence opened inside the item increments a depth counter, and its
//! own sequence delimiter decrements it. In a well-formed item the marker
//! patterns cannot occur at other offsets of an item header, so the linear
//! scan cannot misfire.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmlite_core::dictionary::DictionaryEntry;
use dcmlite_core::header::SequenceItemHeader;
use dcmlite_core::{DataDictionary, Length, SequenceItem, Tag, VR};
use snafu::{ensure, ResultExt};
use std::io::Read;

use crate::error::{
    BadItemHeaderSnafu, ItemOverrunsSequenceSnafu, ReadItemHeaderSnafu, ReadItemValueSnafu,
    SequenceReadError, UnexpectedDelimiterSnafu,
};
use crate::source::ByteSource;
use crate::transfer_syntax::TransferSyntax;

/// Wire form of the item delimiter tag `(FFFE,E00D)`.
const ITEM_DELIMITER: [u8; 4] = [0xFE, 0xFF, 0x0D, 0xE0];
/// Wire form of the sequence delimiter tag `(FFFE,E0DD)`.
const SEQUENCE_DELIMITER: [u8; 4] = [0xFE, 0xFF, 0xDD, 0xE0];
/// Wire form of the undefined-length marker.
const UNDEFINED_MARKER: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
/// Wire form of an explicit `SQ` VR with its two reserved bytes.
const EXPLICIT_SQ: &[u8; 4] = b"SQ\x00\x00";

type Result<T, E = SequenceReadError> = std::result::Result<T, E>;

/// A subordinate reader for the content of one sequence value.
#[derive(Debug)]
pub(crate) struct SequenceReader<'a, D> {
    syntax: TransferSyntax,
    dict: &'a D,
    loose_tags: bool,
}

impl<'a, D> SequenceReader<'a, D>
where
    D: DataDictionary,
{
    /// Create a sequence reader operating under the given transfer syntax.
    pub fn new(syntax: TransferSyntax, dict: &'a D, loose_tags: bool) -> Self {
        SequenceReader {
            syntax,
            dict,
            loose_tags,
        }
    }

    /// Read the items of an undefined-length sequence,
    /// up to and including its sequence delimiter.
    pub fn read_undefined<S>(&self, source: &mut ByteSource<S>) -> Result<Vec<SequenceItem>>
    where
        S: Read,
    {
        let mut items = Vec::new();
        loop {
            match self.read_item_header(source)? {
                SequenceItemHeader::SequenceDelimiter => break,
                SequenceItemHeader::ItemDelimiter => {
                    return UnexpectedDelimiterSnafu {
                        position: source.position() - 8,
                    }
                    .fail();
                }
                SequenceItemHeader::Item { len } => {
                    items.push(self.read_item(source, len)?);
                }
            }
        }
        Ok(items)
    }

    /// Read the items of a sequence bounded by a byte count.
    ///
    /// Every item header consumes 8 bytes of the budget and every item body
    /// its own length; reading stops when the budget reaches zero. An item
    /// claiming more than the remaining budget is a structural error.
    pub fn read_defined<S>(
        &self,
        source: &mut ByteSource<S>,
        len: u32,
    ) -> Result<Vec<SequenceItem>>
    where
        S: Read,
    {
        let mut items = Vec::new();
        let mut remaining = len;
        while remaining > 0 {
            let position = source.position();
            ensure!(
                remaining >= 8,
                ItemOverrunsSequenceSnafu {
                    len: 8u32,
                    remaining,
                    position,
                }
            );
            let header = match self.read_item_header(source)? {
                SequenceItemHeader::Item { len } => len,
                SequenceItemHeader::ItemDelimiter | SequenceItemHeader::SequenceDelimiter => {
                    return UnexpectedDelimiterSnafu { position }.fail();
                }
            };
            remaining -= 8;

            let item = self.read_item(source, header)?;
            let body_len = item.data().len() as u32;
            ensure!(
                body_len <= remaining,
                ItemOverrunsSequenceSnafu {
                    len: body_len,
                    remaining,
                    position,
                }
            );
            remaining -= body_len;
            items.push(item);
        }
        Ok(items)
    }

    /// Read one item body, defined or delimited.
    fn read_item<S>(&self, source: &mut ByteSource<S>, len: Length) -> Result<SequenceItem>
    where
        S: Read,
    {
        if len.is_undefined() {
            return Ok(SequenceItem::new(self.accumulate_delimited_item(source)?));
        }
        let len = len.0;
        let position = source.position();
        let mut data = Vec::new();
        source
            .read_to_vec(len, &mut data)
            .context(ReadItemValueSnafu { len, position })?;
        Ok(SequenceItem::new(data))
    }

    /// Read one `(tag, length)` pair in item-header position.
    fn read_item_header<S>(&self, source: &mut ByteSource<S>) -> Result<SequenceItemHeader>
    where
        S: Read,
    {
        let position = source.position();
        let mut buf = [0u8; 8];
        source
            .read_exact(&mut buf)
            .context(ReadItemHeaderSnafu { position })?;
        let tag = Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        );
        let len = LittleEndian::read_u32(&buf[4..8]);
        SequenceItemHeader::new(tag, Length(len)).context(BadItemHeaderSnafu { position })
    }

    /// Accumulate the body of an undefined-length item one byte at a time,
    /// up to its item delimiter, which is stripped along with its zero
    /// length field.
    fn accumulate_delimited_item<S>(&self, source: &mut ByteSource<S>) -> Result<Vec<u8>>
    where
        S: Read,
    {
        let mut buffer: Vec<u8> = Vec::new();
        let mut depth: u32 = 0;
        loop {
            let position = source.position();
            let byte = source
                .read_u8()
                .context(ReadItemValueSnafu { len: 1u32, position })?;
            buffer.push(byte);
            let n = buffer.len();

            // an undefined-length field may open a subsequence: check what
            // the four bytes before the marker identify
            if n >= 8 && buffer.ends_with(&UNDEFINED_MARKER) {
                let probe = &buffer[n - 8..n - 4];
                if !self.syntax.is_implicit() {
                    if probe == EXPLICIT_SQ {
                        depth += 1;
                    }
                } else {
                    let tag = Tag(
                        LittleEndian::read_u16(&probe[0..2]),
                        LittleEndian::read_u16(&probe[2..4]),
                    );
                    match self.dict.by_tag(tag) {
                        Some(entry) if entry.vr() == VR::SQ => depth += 1,
                        None if self.loose_tags => depth += 1,
                        _ => {}
                    }
                }
            }

            if buffer.ends_with(&ITEM_DELIMITER) && depth == 0 {
                buffer.truncate(n - 4);
                // the delimiter carries a zero length field; consume it
                let position = source.position();
                let mut tail = [0u8; 4];
                source
                    .read_exact(&mut tail)
                    .context(ReadItemValueSnafu { len: 4u32, position })?;
                return Ok(buffer);
            } else if buffer.ends_with(&SEQUENCE_DELIMITER) {
                // end of a subsequence opened inside this item
                depth = depth.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmlite_core::dictionary::DictionaryEntryRef;
    use dcmlite_core::header::HasLength;
    use std::io::Cursor;

    #[derive(Debug)]
    struct TestDictionary;

    static ENTRIES: &[DictionaryEntryRef<'static>] = &[DictionaryEntryRef {
        tag: Tag(0x3006, 0x0040),
        vr: VR::SQ,
        title: "Contour Sequence",
    }];

    impl DataDictionary for TestDictionary {
        type Entry = DictionaryEntryRef<'static>;

        fn by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
            ENTRIES.iter().find(|e| e.tag == tag)
        }
    }

    fn reader(syntax: TransferSyntax) -> SequenceReader<'static, TestDictionary> {
        SequenceReader::new(syntax, &TestDictionary, true)
    }

    fn source_of(data: &[u8]) -> ByteSource<Cursor<&[u8]>> {
        ByteSource::new(Cursor::new(data))
    }

    #[test]
    fn undefined_sequence_with_defined_items() {
        #[rustfmt::skip]
        let raw = [
            // Item, length 4
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00,
            0x10, 0x20, 0x30, 0x40,
            // Item, length 2
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00,
            0x50, 0x60,
            // Sequence Delimitation Item
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let items = reader(TransferSyntax::ExplicitVRLittleEndian)
            .read_undefined(&mut source)
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].data(), &[0x10, 0x20, 0x30, 0x40]);
        assert_eq!(items[1].data(), &[0x50, 0x60]);
        assert_eq!(source.position() as usize, raw.len());
    }

    #[test]
    fn delimited_item_is_stripped_and_trailed() {
        #[rustfmt::skip]
        let raw = [
            // Item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            0xAA, 0xBB, 0xCC,
            // Item Delimitation Item with zero length
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // Sequence Delimitation Item
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let items = reader(TransferSyntax::ExplicitVRLittleEndian)
            .read_undefined(&mut source)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data(), &[0xAA, 0xBB, 0xCC]);
        assert_eq!(items[0].length(), Length(3));
        assert_eq!(source.position() as usize, raw.len());
    }

    #[test]
    fn nested_explicit_subsequence_does_not_terminate_early() {
        // One undefined-length item holding a complete nested sequence
        // element; the nested content contains an item delimiter which must
        // not end the outer item.
        #[rustfmt::skip]
        let raw = [
            // outer Item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // nested element (300A,00B0) SQ, undefined length -> depth 1
            0xB0, 0x30, 0xB0, 0x00, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // nested Item, length 8; its payload mimics an item delimiter
            0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // nested Sequence Delimitation Item -> depth 0
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // outer Item Delimitation Item
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // outer Sequence Delimitation Item
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let items = reader(TransferSyntax::ExplicitVRLittleEndian)
            .read_undefined(&mut source)
            .unwrap();
        assert_eq!(items.len(), 1);
        // the item holds the nested element in full, delimiters included
        assert_eq!(items[0].data().len(), 12 + 8 + 8 + 8);
        assert!(items[0].data().starts_with(&[0xB0, 0x30, 0xB0, 0x00]));
        assert!(items[0].data().ends_with(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]));
        assert_eq!(source.position() as usize, raw.len());
    }

    #[test]
    fn nested_implicit_subsequence_tracks_depth_through_the_dictionary() {
        #[rustfmt::skip]
        let raw = [
            // outer Item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // nested implicit element (3006,0040), undefined length;
            // the dictionary resolves it to SQ -> depth 1
            0x06, 0x30, 0x40, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // nested Item, length 0
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // nested Sequence Delimitation Item -> depth 0
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // outer Item Delimitation Item
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // outer Sequence Delimitation Item
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let items = reader(TransferSyntax::ImplicitVRLittleEndian)
            .read_undefined(&mut source)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data().len(), 8 + 8 + 8);
    }

    #[test]
    fn unknown_implicit_tag_counts_as_subsequence_in_loose_mode() {
        #[rustfmt::skip]
        let raw = [
            // outer Item, undefined length
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            // vendor element (0029,1010) unknown to the dictionary,
            // undefined length -> depth 1 under the loose policy
            0x29, 0x00, 0x10, 0x10, 0xFF, 0xFF, 0xFF, 0xFF,
            // its Item Delimitation Item decoy (depth is 1, skipped)
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // its Sequence Delimitation Item -> depth 0
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // outer Item Delimitation Item
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // outer Sequence Delimitation Item
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let items = reader(TransferSyntax::ImplicitVRLittleEndian)
            .read_undefined(&mut source)
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].data().len(), 8 + 8 + 8);
    }

    #[test]
    fn defined_sequence_consumes_exactly_its_budget() {
        #[rustfmt::skip]
        let raw = [
            // Item, length 4
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00,
            0x01, 0x02, 0x03, 0x04,
            // Item, length 0
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // trailing content which belongs to the next element
            0x99, 0x99,
        ];
        let mut source = source_of(&raw);
        let items = reader(TransferSyntax::ExplicitVRLittleEndian)
            .read_defined(&mut source, 20)
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].data(), &[0x01, 0x02, 0x03, 0x04]);
        assert!(items[1].data().is_empty());
        // the two trailing bytes were not consumed
        assert_eq!(source.position(), 20);
    }

    #[test]
    fn item_overrunning_the_budget_is_an_error() {
        #[rustfmt::skip]
        let raw = [
            // Item, length 16, in a sequence declared as 12 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let err = reader(TransferSyntax::ExplicitVRLittleEndian)
            .read_defined(&mut source, 12)
            .unwrap_err();
        assert!(matches!(
            err,
            SequenceReadError::ItemOverrunsSequence { len: 16, remaining: 4, .. }
        ));
    }

    #[test]
    fn foreign_tag_in_item_position_is_an_error() {
        #[rustfmt::skip]
        let raw = [
            0x08, 0x00, 0x05, 0x00, 0x04, 0x00, 0x00, 0x00,
        ];
        let mut source = source_of(&raw);
        let err = reader(TransferSyntax::ExplicitVRLittleEndian)
            .read_undefined(&mut source)
            .unwrap_err();
        assert!(matches!(err, SequenceReadError::BadItemHeader { .. }));
    }
}
