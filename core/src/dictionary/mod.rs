//! This module contains the concept of a DICOM data dictionary:
//! the interface through which a decoder resolves an attribute tag into its
//! value representation and title.
//!
//! Concrete dictionary tables are provided by the library's consumers. A
//! [stub dictionary](stub::StubDataDictionary), which knows no attributes at
//! all, is available for testing and for reading fully explicit data sets
//! without attribute titles.

pub mod stub;

use crate::header::{Tag, VR};
use std::fmt::Debug;

/// Type trait for a dictionary of DICOM attributes.
///
/// A lookup either finds the exact attribute for the queried tag or nothing:
/// implementations backed by a sorted table must verify that the nearest
/// entry matches the key before returning it.
///
/// The methods herein have no generic parameters, so as to enable being
/// used as a trait object.
pub trait DataDictionary: Debug {
    /// The type of the dictionary entry.
    type Entry: DictionaryEntry;

    /// Fetch an entry by its attribute tag.
    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry>;
}

impl<T: ?Sized> DataDictionary for &T
where
    T: DataDictionary,
{
    type Entry = T::Entry;

    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
        (**self).by_tag(tag)
    }
}

impl<T: ?Sized> DataDictionary for Box<T>
where
    T: DataDictionary,
{
    type Entry = T::Entry;

    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
        (**self).by_tag(tag)
    }
}

/// The dictionary entry data type, representing a DICOM attribute.
pub trait DictionaryEntry {
    /// The attribute tag.
    fn tag(&self) -> Tag;
    /// The _typical_ value representation of the attribute.
    fn vr(&self) -> VR;
    /// The human readable title of the attribute
    /// (e.g. "Transfer Syntax UID").
    fn title(&self) -> &str;
}

/// A data type for a dictionary entry borrowing its title.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DictionaryEntryRef<'a> {
    /// The attribute tag
    pub tag: Tag,
    /// The typical value representation of the attribute
    pub vr: VR,
    /// The human readable title of the attribute
    pub title: &'a str,
}

impl<'a> DictionaryEntry for DictionaryEntryRef<'a> {
    fn tag(&self) -> Tag {
        self.tag
    }
    fn vr(&self) -> VR {
        self.vr
    }
    fn title(&self) -> &str {
        self.title
    }
}

/// A data type for a dictionary entry with full ownership.
#[derive(Debug, PartialEq, Clone)]
pub struct DictionaryEntryBuf {
    /// The attribute tag
    pub tag: Tag,
    /// The typical value representation of the attribute
    pub vr: VR,
    /// The human readable title of the attribute
    pub title: String,
}

impl DictionaryEntry for DictionaryEntryBuf {
    fn tag(&self) -> Tag {
        self.tag
    }
    fn vr(&self) -> VR {
        self.vr
    }
    fn title(&self) -> &str {
        self.title.as_str()
    }
}
