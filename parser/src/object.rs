//! File-level reading: preamble and magic code validation, and the object
//! type holding a fully decoded file.

use dcmlite_core::{DataDictionary, DataElement, Tag};
use snafu::{ensure, ResultExt};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::dataset::DataSet;
use crate::error::{
    InvalidMagicSnafu, OpenFileSnafu, ReadMagicSnafu, ReadPreambleSnafu, Result,
};
use crate::read::DataSetReader;
use crate::source::ByteSource;
use crate::transfer_syntax::TransferSyntax;

/// The magic code expected after the 128-byte preamble.
const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

/// A DICOM file decoded into memory: the sorted data set, the transfer
/// syntax the file was written in, and the slice coordinate, when present.
#[derive(Debug, Clone)]
pub struct DicomObject {
    data: DataSet,
    syntax: TransferSyntax,
    slice_location: Option<f64>,
}

/// Open and decode the DICOM file at the given path,
/// resolving attributes through the given dictionary.
pub fn open_file<P, D>(path: P, dict: &D) -> Result<DicomObject>
where
    P: AsRef<Path>,
    D: DataDictionary,
{
    let path = path.as_ref();
    let file = File::open(path).context(OpenFileSnafu { filename: path })?;
    DicomObject::from_reader(BufReader::new(file), dict)
}

impl DicomObject {
    /// Decode a DICOM byte stream:
    /// 128 bytes of preamble (discarded), the `DICM` magic code, and data
    /// elements until the end of the stream.
    pub fn from_reader<R, D>(reader: R, dict: &D) -> Result<Self>
    where
        R: Read,
        D: DataDictionary,
    {
        let mut source = ByteSource::new(reader);

        let mut preamble = [0u8; 128];
        source
            .read_exact(&mut preamble)
            .context(ReadPreambleSnafu)?;

        let mut magic = [0u8; 4];
        source.read_exact(&mut magic).context(ReadMagicSnafu)?;
        ensure!(magic == DICM_MAGIC_CODE, InvalidMagicSnafu { magic });

        let mut reader = DataSetReader::new(dict);
        let data = reader.read_data_set(&mut source)?;
        Ok(DicomObject {
            data,
            syntax: reader.transfer_syntax(),
            slice_location: reader.slice_location(),
        })
    }

    /// Retrieve the decoded data set, sorted by tag.
    pub fn data_set(&self) -> &DataSet {
        &self.data
    }

    /// Fetch the element with the given tag, if present at the top level.
    pub fn get(&self, tag: Tag) -> Option<&DataElement> {
        self.data.get(tag)
    }

    /// Retrieve the transfer syntax the file was written in.
    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.syntax
    }

    /// Retrieve the slice coordinate decoded from the Slice Location
    /// attribute, if the file carried one.
    pub fn slice_location(&self) -> Option<f64> {
        self.slice_location
    }

    /// Decode the raw bytes of a sequence item as data elements, under the
    /// transfer syntax recorded for this file.
    pub fn parse_item<D>(&self, data: &[u8], dict: &D) -> Result<DataSet>
    where
        D: DataDictionary,
    {
        let mut source = ByteSource::new(data);
        let mut reader = DataSetReader::new_with_syntax(dict, self.syntax);
        let mut set = DataSet::new();
        reader.read_nested(&mut source, &mut set)?;
        Ok(set)
    }
}
