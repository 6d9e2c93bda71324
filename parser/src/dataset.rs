//! The in-memory data set: an ordered container of decoded elements.
//!
//! Elements are held in a vector kept sorted by tag, group first and element
//! second, so that lookups and insertion positions are resolved by binary
//! search. Order does not depend on the order in which elements appeared on
//! the wire.

use dcmlite_core::header::Header;
use dcmlite_core::{DataElement, Tag};

/// A collection of data elements sorted by tag.
///
/// Tags are unique within one data set: inserting an element with a tag
/// already present replaces the previous element.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataSet {
    elements: Vec<DataElement>,
}

impl DataSet {
    /// Create an empty data set.
    pub fn new() -> Self {
        DataSet::default()
    }

    /// Insert an element at its sorted position.
    ///
    /// If an element with the same tag is already present, it is replaced
    /// and the previous element is returned.
    pub fn insert(&mut self, element: DataElement) -> Option<DataElement> {
        match self.search(element.tag()) {
            Ok(index) => {
                let previous = std::mem::replace(&mut self.elements[index], element);
                Some(previous)
            }
            Err(index) => {
                self.elements.insert(index, element);
                None
            }
        }
    }

    /// Fetch the element with the given tag, if present.
    pub fn get(&self, tag: Tag) -> Option<&DataElement> {
        self.search(tag).ok().map(|index| &self.elements[index])
    }

    /// Retrieve the elements in tag order.
    pub fn elements(&self) -> &[DataElement] {
        &self.elements
    }

    /// Obtain an iterator over the elements in tag order.
    pub fn iter(&self) -> std::slice::Iter<'_, DataElement> {
        self.elements.iter()
    }

    /// Retrieve the number of elements in the set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn search(&self, tag: Tag) -> Result<usize, usize> {
        self.elements.binary_search_by(|e| e.tag().cmp(&tag))
    }
}

impl IntoIterator for DataSet {
    type Item = DataElement;
    type IntoIter = std::vec::IntoIter<DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a DataElement;
    type IntoIter = std::slice::Iter<'a, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
