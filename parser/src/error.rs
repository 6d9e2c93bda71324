//! Crate-level error types.
//!
//! Every failure mode of the reading process maps to one variant of
//! [`Error`], and each variant carries a stable numeric code (see
//! [`Error::code`]) so that non-Rust callers and logs can identify the
//! failure condition without matching on the enum.

use dcmlite_core::header::SequenceItemHeaderError;
use dcmlite_core::Tag;
use snafu::{Backtrace, Snafu};
use std::io;
use std::path::PathBuf;

/// Type alias for a result from this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The main error type for failures while reading DICOM content.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The input file could not be opened.
    #[snafu(display("Could not open file {}", filename.display()))]
    OpenFile {
        filename: PathBuf,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// The 128-byte preamble could not be read in full.
    #[snafu(display("Could not read the 128-byte file preamble"))]
    ReadPreamble {
        source: io::Error,
        backtrace: Backtrace,
    },

    /// The 4-byte magic code could not be read in full.
    #[snafu(display("Could not read the magic code"))]
    ReadMagic {
        source: io::Error,
        backtrace: Backtrace,
    },

    /// The magic code was read but is not `DICM`.
    #[snafu(display("Invalid magic code {:?}, expected \"DICM\"", magic))]
    InvalidMagic {
        magic: [u8; 4],
        backtrace: Backtrace,
    },

    /// An element tag could not be read.
    #[snafu(display("Could not read an element tag at position {}", position))]
    ReadTag {
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// A sequence delimiter appeared where an element header was expected,
    /// meaning that the preceding sequence was decoded with the wrong
    /// layout. This tends to happen on private sequences of vendors absent
    /// from the data dictionary when the loose private tag policy is off.
    #[snafu(display(
        "Stray sequence delimiter {} in element position at {}",
        tag,
        position
    ))]
    StrayDelimiter {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },

    /// The 4-byte VR/length field of an element header could not be read.
    #[snafu(display("Could not read an element header at position {}", position))]
    ReadHeader {
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// Reading the content of an undefined-length sequence failed.
    #[snafu(display(
        "Could not read undefined-length sequence of {} at position {}",
        tag,
        position
    ))]
    UndefinedSequence {
        tag: Tag,
        position: u64,
        #[snafu(backtrace)]
        source: SequenceReadError,
    },

    /// Reading the content of a defined-length sequence failed.
    #[snafu(display(
        "Could not read defined-length sequence of {} at position {}",
        tag,
        position
    ))]
    DefinedSequence {
        tag: Tag,
        position: u64,
        #[snafu(backtrace)]
        source: SequenceReadError,
    },

    /// A value field could not be read in full.
    #[snafu(display(
        "Could not read {} value bytes of {} at position {}",
        len,
        tag,
        position
    ))]
    ReadValue {
        tag: Tag,
        len: u32,
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// A value field larger than the maximum single read could not be
    /// read in full.
    #[snafu(display(
        "Could not read {} value bytes (chunked) of {} at position {}",
        len,
        tag,
        position
    ))]
    ReadValueChunked {
        tag: Tag,
        len: u32,
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },
}

impl Error {
    /// Retrieve the stable numeric code identifying this failure condition.
    ///
    /// The codes are part of the crate's public interface:
    ///
    /// | code | condition |
    /// |------|-----------|
    /// | 101  | preamble short read |
    /// | 102  | magic code short read |
    /// | 103  | magic code mismatch |
    /// | 201  | element tag read failure |
    /// | 202  | stray sequence delimiter in element position |
    /// | 204  | element header short read |
    /// | 208  | undefined-length sequence read failure |
    /// | 209  | defined-length sequence read failure |
    /// | 301  | value field short read |
    /// | 302  | value field short read (chunked) |
    /// | 501  | cannot open input file |
    ///
    /// A successful parse has no error and therefore no code.
    pub fn code(&self) -> u16 {
        match self {
            Error::ReadPreamble { .. } => 101,
            Error::ReadMagic { .. } => 102,
            Error::InvalidMagic { .. } => 103,
            Error::ReadTag { .. } => 201,
            Error::StrayDelimiter { .. } => 202,
            Error::ReadHeader { .. } => 204,
            Error::UndefinedSequence { .. } => 208,
            Error::DefinedSequence { .. } => 209,
            Error::ReadValue { .. } => 301,
            Error::ReadValueChunked { .. } => 302,
            Error::OpenFile { .. } => 501,
        }
    }
}

/// Errors which may occur inside a sequence value, reported through the
/// [`UndefinedSequence`](Error::UndefinedSequence) or
/// [`DefinedSequence`](Error::DefinedSequence) variant of the enclosing
/// reading mode.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum SequenceReadError {
    /// An item header (tag and length) could not be read.
    #[snafu(display("Could not read an item header at position {}", position))]
    ReadItemHeader {
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// The tag in item-header position does not introduce an item or
    /// delimiter.
    #[snafu(display("Bad item header at position {}", position))]
    BadItemHeader {
        position: u64,
        #[snafu(backtrace)]
        source: SequenceItemHeaderError,
    },

    /// An item's value bytes could not be read in full.
    #[snafu(display(
        "Could not read {} item value bytes at position {}",
        len,
        position
    ))]
    ReadItemValue {
        len: u32,
        position: u64,
        source: io::Error,
        backtrace: Backtrace,
    },

    /// A delimiter appeared where an item header was required.
    #[snafu(display("Unexpected delimiter at position {}", position))]
    UnexpectedDelimiter { position: u64, backtrace: Backtrace },

    /// An item claims more content than the sequence's remaining declared
    /// length.
    #[snafu(display(
        "Item of {} bytes overruns the sequence's remaining {} bytes at position {}",
        len,
        remaining,
        position
    ))]
    ItemOverrunsSequence {
        len: u32,
        remaining: u32,
        position: u64,
        backtrace: Backtrace,
    },
}
