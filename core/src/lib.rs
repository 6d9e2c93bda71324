#![warn(missing_docs)]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
//! This crate contains the DICOM data model used when reading medical
//! imaging files: attribute tags, value representations, value lengths,
//! element and sequence item headers, decoded data elements with their
//! payloads, and the data dictionary interface through which attribute
//! metadata is resolved.
//!
//! The decoding machinery itself lives in the `dcmlite-parser` crate; this
//! crate is the vocabulary shared between a decoder and its consumers.

pub mod dictionary;
pub mod header;
pub mod value;

pub use crate::dictionary::DataDictionary;
pub use crate::header::{DataElement, DataElementHeader, Length, Tag, VR};
pub use crate::value::{SequenceItem, Value};
