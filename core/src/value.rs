//! Payload types for decoded data elements.
//!
//! An element's payload is either a run of raw bytes or a sequence of items,
//! never both. The distinction is carried in the [`Value`] enum, so that a
//! sequence element cannot also hold primitive bytes.

use crate::header::{HasLength, Length};

/// The payload of a data element: raw bytes for a leaf element,
/// or the decoded items of a sequence (VR `SQ`) element.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    /// The raw value field, uninterpreted.
    Primitive(Vec<u8>),
    /// The decoded items of a sequence, in wire order.
    Sequence(Vec<SequenceItem>),
}

impl Value {
    /// Retrieve the raw payload bytes, if this is a primitive value.
    pub fn primitive(&self) -> Option<&[u8]> {
        match self {
            Value::Primitive(data) => Some(data),
            Value::Sequence(..) => None,
        }
    }

    /// Retrieve the sequence items, if this is a sequence value.
    pub fn items(&self) -> Option<&[SequenceItem]> {
        match self {
            Value::Primitive(..) => None,
            Value::Sequence(items) => Some(items),
        }
    }

    /// Check whether this value is a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(..))
    }
}

impl From<Vec<u8>> for Value {
    fn from(data: Vec<u8>) -> Self {
        Value::Primitive(data)
    }
}

impl From<Vec<SequenceItem>> for Value {
    fn from(items: Vec<SequenceItem>) -> Self {
        Value::Sequence(items)
    }
}

/// A single item of a sequence element: its materialised byte content and
/// length. Items read with an undefined length hold their accumulated
/// content, with the trailing item delimiter already stripped.
#[derive(Debug, PartialEq, Clone)]
pub struct SequenceItem {
    len: Length,
    data: Vec<u8>,
}

impl SequenceItem {
    /// Create a sequence item owning the given bytes.
    pub fn new(data: Vec<u8>) -> Self {
        SequenceItem {
            len: Length(data.len() as u32),
            data,
        }
    }

    /// Retrieve the item's byte content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Move the byte content out of the item.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl HasLength for SequenceItem {
    fn length(&self) -> Length {
        self.len
    }
}
