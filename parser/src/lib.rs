#![warn(missing_docs)]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
//! A decoder of DICOM files into sorted, queryable data sets.
//!
//! The decoder reads the 128-byte preamble and `DICM` magic code, then
//! decodes data elements to the end of the stream, switching the element
//! header layout on the fly when the Transfer Syntax UID element is
//! encountered. Sequence elements are decoded recursively, with both
//! defined and undefined (delimited) lengths, to arbitrary depth. Value
//! fields are kept as raw byte runs; interpreting them is left to the
//! caller, with the transfer syntax's byte order available from the decoded
//! object.
//!
//! Attribute names and implicit-VR resolution are obtained through the
//! [`DataDictionary`](dcmlite_core::DataDictionary) interface; any provider
//! can be plugged in.
//!
//! ## Example
//!
//! ```no_run
//! use dcmlite_core::dictionary::stub::StubDataDictionary;
//! use dcmlite_core::header::HasLength;
//! use dcmlite_core::Tag;
//!
//! # fn main() -> Result<(), dcmlite_parser::Error> {
//! let object = dcmlite_parser::open_file("image.dcm", &StubDataDictionary)?;
//! for element in object.data_set() {
//!     println!("{} {}: {} bytes", element.description(), element.vr(),
//!         element.length());
//! }
//! if let Some(element) = object.get(Tag(0x0008, 0x0018)) {
//!     println!("SOP Instance UID: {:?}", element.bytes());
//! }
//! # Ok(())
//! # }
//! ```

pub mod dataset;
mod decode;
pub mod error;
pub mod read;
mod sequence;
pub mod source;
pub mod transfer_syntax;

mod object;

/// Whether unknown attributes under implicit VR encoding may be decoded as
/// sequences when their length field holds the undefined-length marker, and
/// probed for vendor-specific explicit headers.
///
/// Private sequences of vendors absent from the data dictionary cannot be
/// decoded without this policy: their length field would be taken for a
/// byte count of `0xFFFF_FFFF`. It is enabled by default;
/// [`DataSetReader::loose_tags`](read::DataSetReader::loose_tags) overrides
/// it per reader.
pub const LOOSE_PRIVATE_TAGS: bool = true;

pub use crate::dataset::DataSet;
pub use crate::error::{Error, Result};
pub use crate::object::{open_file, DicomObject};
pub use crate::read::DataSetReader;
pub use crate::source::ByteSource;
pub use crate::transfer_syntax::TransferSyntax;
