//! Stateful reading of whole data sets.
//!
//! [`DataSetReader`] drives the element decoding loop: for each element it
//! decodes the header under the transfer syntax currently in effect,
//! resolves the attribute title from the data dictionary, captures the value
//! (recursing into the sequence reader for `SQ` elements), applies the side
//! effects of the special attributes, and inserts the finished element at
//! its sorted position. The Transfer Syntax UID element switches the syntax
//! for all subsequent elements; the Slice Location element yields the slice
//! coordinate.
//!
//! The same loop serves nested content: [`DataSetReader::read_nested`]
//! decodes the raw bytes of a sequence item into elements, accumulating into
//! a caller-supplied data set under the same transfer syntax.

use dcmlite_core::dictionary::DictionaryEntry;
use dcmlite_core::header::{HasLength, Header};
use dcmlite_core::{DataDictionary, DataElement, DataElementHeader, Length, Tag, Value, VR};
use snafu::ResultExt;
use std::borrow::Cow;
use std::io::Read;

use crate::dataset::DataSet;
use crate::decode;
use crate::error::{
    DefinedSequenceSnafu, ReadTagSnafu, ReadValueChunkedSnafu, ReadValueSnafu, Result,
    UndefinedSequenceSnafu,
};
use crate::sequence::SequenceReader;
use crate::source::{ByteSource, MAX_READ_CHUNK};
use crate::transfer_syntax::TransferSyntax;
use crate::LOOSE_PRIVATE_TAGS;

/// The Transfer Syntax UID attribute.
const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
/// The Slice Location attribute.
const SLICE_LOCATION: Tag = Tag(0x0020, 0x1041);

/// The description given to attributes absent from the data dictionary.
pub const UNKNOWN_TAG: &str = "Unknown Tag";

/// A reader which decodes a stream of data elements into a sorted data set,
/// tracking the transfer syntax in effect.
#[derive(Debug)]
pub struct DataSetReader<'a, D> {
    dict: &'a D,
    syntax: TransferSyntax,
    loose_tags: bool,
    slice_location: Option<f64>,
}

impl<'a, D> DataSetReader<'a, D>
where
    D: DataDictionary,
{
    /// Create a data set reader resolving attributes through the given
    /// dictionary, starting in explicit VR little endian (the syntax of the
    /// file meta group).
    pub fn new(dict: &'a D) -> Self {
        Self::new_with_syntax(dict, TransferSyntax::default())
    }

    /// Create a data set reader starting in the given transfer syntax,
    /// as recorded by a previous read. This is the entry point for decoding
    /// the content of sequence items after the fact.
    pub fn new_with_syntax(dict: &'a D, syntax: TransferSyntax) -> Self {
        DataSetReader {
            dict,
            syntax,
            loose_tags: LOOSE_PRIVATE_TAGS,
            slice_location: None,
        }
    }

    /// Override the loose private tag policy
    /// (see [`LOOSE_PRIVATE_TAGS`](crate::LOOSE_PRIVATE_TAGS)).
    pub fn loose_tags(mut self, enabled: bool) -> Self {
        self.loose_tags = enabled;
        self
    }

    /// Retrieve the transfer syntax currently in effect.
    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.syntax
    }

    /// Retrieve the slice coordinate decoded from the Slice Location
    /// attribute, if one was read.
    pub fn slice_location(&self) -> Option<f64> {
        self.slice_location
    }

    /// Read data elements until the end of the stream,
    /// collecting them into a new sorted data set.
    pub fn read_data_set<S>(&mut self, source: &mut ByteSource<S>) -> Result<DataSet>
    where
        S: Read,
    {
        let mut set = DataSet::new();
        self.read_into(source, &mut set, false)?;
        Ok(set)
    }

    /// Read the content of a sequence item as data elements until the end of
    /// the stream, inserting them into the given data set in sorted order.
    ///
    /// An element of undefined length is recorded with length zero once its
    /// sequence content has been decoded.
    pub fn read_nested<S>(&mut self, source: &mut ByteSource<S>, set: &mut DataSet) -> Result<()>
    where
        S: Read,
    {
        self.read_into(source, set, true)
    }

    fn read_into<S>(
        &mut self,
        source: &mut ByteSource<S>,
        set: &mut DataSet,
        nested: bool,
    ) -> Result<()>
    where
        S: Read,
    {
        loop {
            let position = source.position();
            if source.at_end().context(ReadTagSnafu { position })? {
                break;
            }
            let element = self.read_element(source, nested)?;
            set.insert(element);
        }
        Ok(())
    }

    /// Decode one data element, header and value.
    fn read_element<S>(&mut self, source: &mut ByteSource<S>, nested: bool) -> Result<DataElement>
    where
        S: Read,
    {
        let header = decode::decode_header(source, self.syntax, self.dict, self.loose_tags)?;
        let tag = header.tag();
        tracing::trace!(
            "element {} {} length {} at {}",
            tag,
            header.vr(),
            header.length(),
            source.position()
        );

        let description: Cow<'static, str> = match self.dict.by_tag(tag) {
            Some(entry) => Cow::Owned(entry.title().to_string()),
            None => Cow::Borrowed(UNKNOWN_TAG),
        };

        if header.vr() == VR::SQ {
            let position = source.position();
            let reader = SequenceReader::new(self.syntax, self.dict, self.loose_tags);
            let (items, len) = if header.length().is_undefined() {
                let items = reader
                    .read_undefined(source)
                    .context(UndefinedSequenceSnafu { tag, position })?;
                let len = if nested {
                    Length(0)
                } else {
                    Length::UNDEFINED
                };
                (items, len)
            } else {
                let items = reader
                    .read_defined(source, header.length().0)
                    .context(DefinedSequenceSnafu { tag, position })?;
                (items, header.length())
            };
            return Ok(DataElement::new(
                DataElementHeader::new(tag, VR::SQ, len),
                description,
                Value::Sequence(items),
            ));
        }

        let len = if nested && header.length().is_undefined() {
            Length(0)
        } else {
            header.length()
        };
        let count = len.0;
        let position = source.position();
        let mut data = Vec::new();
        if count as usize > MAX_READ_CHUNK {
            source
                .read_to_vec(count, &mut data)
                .context(ReadValueChunkedSnafu {
                    tag,
                    len: count,
                    position,
                })?;
        } else {
            source.read_to_vec(count, &mut data).context(ReadValueSnafu {
                tag,
                len: count,
                position,
            })?;
        }

        if tag == TRANSFER_SYNTAX_UID {
            self.update_transfer_syntax(&data);
        } else if tag == SLICE_LOCATION {
            self.read_slice_location(&data);
        }

        Ok(DataElement::new(
            DataElementHeader::new(tag, header.vr(), len),
            description,
            Value::Primitive(data),
        ))
    }

    /// Interpret the Transfer Syntax UID value and switch the syntax used
    /// for all subsequent elements.
    fn update_transfer_syntax(&mut self, value: &[u8]) {
        let uid = String::from_utf8_lossy(value);
        let uid = uid.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        match TransferSyntax::from_uid(uid) {
            Some(syntax) => {
                tracing::trace!("transfer syntax: {}", syntax.uid());
                self.syntax = syntax;
            }
            None => {
                tracing::warn!(
                    "Unknown transfer syntax \"{}\", assuming explicit VR little endian",
                    uid
                );
                self.syntax = TransferSyntax::ExplicitVRLittleEndian;
            }
        }
    }

    /// Interpret the Slice Location value as a decimal number.
    fn read_slice_location(&mut self, value: &[u8]) {
        let text = String::from_utf8_lossy(value);
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        match text.parse::<f64>() {
            Ok(z) => self.slice_location = Some(z),
            Err(_) => {
                tracing::warn!("Could not interpret slice location \"{}\"", text);
            }
        }
    }
}
