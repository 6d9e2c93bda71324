//! Transfer syntax identification.
//!
//! Only the three uncompressed transfer syntaxes are supported. The syntax
//! in effect is an explicit value threaded through every header-decode call:
//! it determines whether element headers carry their VR on the wire and the
//! byte order in which numeric value fields were written. Tag and length
//! framing is little endian in all three syntaxes.

use byteordered::Endianness;

/// An uncompressed DICOM transfer syntax.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TransferSyntax {
    /// Implicit VR Little Endian: the default transfer syntax for DICOM,
    /// "1.2.840.10008.1.2".
    ImplicitVRLittleEndian,
    /// Explicit VR Little Endian, "1.2.840.10008.1.2.1".
    ///
    /// This is also the syntax assumed before the Transfer Syntax UID
    /// element is decoded, since the file meta group is always encoded
    /// this way.
    #[default]
    ExplicitVRLittleEndian,
    /// Explicit VR Big Endian (retired), "1.2.840.10008.1.2.2".
    ExplicitVRBigEndian,
}

impl TransferSyntax {
    /// Identify a transfer syntax from its UID,
    /// with trailing padding already trimmed.
    pub fn from_uid(uid: &str) -> Option<Self> {
        match uid {
            "1.2.840.10008.1.2" => Some(TransferSyntax::ImplicitVRLittleEndian),
            "1.2.840.10008.1.2.1" => Some(TransferSyntax::ExplicitVRLittleEndian),
            "1.2.840.10008.1.2.2" => Some(TransferSyntax::ExplicitVRBigEndian),
            _ => None,
        }
    }

    /// Retrieve the unique identifier of this transfer syntax.
    pub fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVRLittleEndian => "1.2.840.10008.1.2",
            TransferSyntax::ExplicitVRLittleEndian => "1.2.840.10008.1.2.1",
            TransferSyntax::ExplicitVRBigEndian => "1.2.840.10008.1.2.2",
        }
    }

    /// Check whether element headers leave their VR implicit.
    pub fn is_implicit(self) -> bool {
        matches!(self, TransferSyntax::ImplicitVRLittleEndian)
    }

    /// Retrieve the byte order of numeric value fields under this syntax.
    pub fn endianness(self) -> Endianness {
        match self {
            TransferSyntax::ExplicitVRBigEndian => Endianness::Big,
            _ => Endianness::Little,
        }
    }
}
