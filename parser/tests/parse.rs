//! Whole-file decoding tests over handcrafted DICOM streams.

use dcmlite_core::dictionary::DictionaryEntryRef;
use dcmlite_core::header::{HasLength, Header};
use dcmlite_core::{DataDictionary, Tag, VR};
use dcmlite_parser::{DicomObject, TransferSyntax};
use std::io::Cursor;

/// An attribute table over a sorted slice, resolved by binary search,
/// in the shape a real dictionary provider would supply.
#[derive(Debug)]
struct TestDictionary;

/// Entries sorted by tag, group first and element second.
static ENTRIES: &[DictionaryEntryRef<'static>] = &[
    DictionaryEntryRef {
        tag: Tag(0x0002, 0x0010),
        vr: VR::UI,
        title: "Transfer Syntax UID",
    },
    DictionaryEntryRef {
        tag: Tag(0x0008, 0x0005),
        vr: VR::CS,
        title: "Specific Character Set",
    },
    DictionaryEntryRef {
        tag: Tag(0x0008, 0x0060),
        vr: VR::CS,
        title: "Modality",
    },
    DictionaryEntryRef {
        tag: Tag(0x0010, 0x0010),
        vr: VR::PN,
        title: "Patient's Name",
    },
    DictionaryEntryRef {
        tag: Tag(0x0020, 0x1041),
        vr: VR::DS,
        title: "Slice Location",
    },
    DictionaryEntryRef {
        tag: Tag(0x3006, 0x0039),
        vr: VR::SQ,
        title: "ROI Contour Sequence",
    },
    DictionaryEntryRef {
        tag: Tag(0x3006, 0x0040),
        vr: VR::SQ,
        title: "Contour Sequence",
    },
];

impl DataDictionary for TestDictionary {
    type Entry = DictionaryEntryRef<'static>;

    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
        ENTRIES
            .binary_search_by(|entry| entry.tag.cmp(&tag))
            .ok()
            .map(|index| &ENTRIES[index])
    }
}

/// Build a file: 128 zero bytes of preamble, the magic code, and the given
/// element stream.
fn file_of(elements: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8; 128];
    data.extend_from_slice(b"DICM");
    data.extend_from_slice(elements);
    data
}

#[test]
fn minimal_file() {
    #[rustfmt::skip]
    let data = file_of(&[
        // (0008,0005) CS, length 10, "ISO_IR 100"
        0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
        b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'0', b'0',
    ]);
    let object = DicomObject::from_reader(&data[..], &TestDictionary).unwrap();

    let set = object.data_set();
    assert_eq!(set.len(), 1);
    let element = &set.elements()[0];
    assert_eq!(element.tag(), Tag(0x0008, 0x0005));
    assert_eq!(element.vr(), VR::CS);
    assert_eq!(element.length().get(), Some(10));
    assert_eq!(element.bytes(), Some(&b"ISO_IR 100"[..]));
    assert_eq!(element.description(), "Specific Character Set");
}

#[test]
fn transfer_syntax_switch_to_implicit() {
    #[rustfmt::skip]
    let data = file_of(&[
        // (0002,0010) UI, length 18, "1.2.840.10008.1.2\0" (implicit VR LE)
        0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x12, 0x00,
        b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0',
        b'0', b'0', b'8', b'.', b'1', b'.', b'2', 0x00,
        // (0010,0010) in implicit form, length 6, "Doe^J\0"
        0x10, 0x00, 0x10, 0x00, 0x06, 0x00, 0x00, 0x00,
        b'D', b'o', b'e', b'^', b'J', 0x00,
    ]);
    let object = DicomObject::from_reader(&data[..], &TestDictionary).unwrap();

    assert_eq!(
        object.transfer_syntax(),
        TransferSyntax::ImplicitVRLittleEndian
    );
    let name = object.get(Tag(0x0010, 0x0010)).unwrap();
    assert_eq!(name.vr(), VR::PN);
    assert_eq!(name.length().get(), Some(6));
    assert_eq!(name.bytes(), Some(&b"Doe^J\0"[..]));
}

#[test]
fn nested_undefined_length_sequence() {
    // (3006,0039), undefined length, holding one undefined-length item.
    // The item's content is a complete nested sequence element whose inner
    // item payload mimics an item delimiter: the lookahead must not take it
    // for the end of the outer item.
    #[rustfmt::skip]
    let nested_element: &[u8] = &[
        // (3006,0040) SQ, undefined length
        0x06, 0x30, 0x40, 0x00, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        // Item, length 8
        0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00,
        // payload: the bytes of an item delimiter with zero length
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
        // Sequence Delimitation Item
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut elements = vec![
        // (3006,0039) SQ, undefined length
        0x06, 0x30, 0x39, 0x00, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        // Item, undefined length
        0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
    ];
    elements.extend_from_slice(nested_element);
    #[rustfmt::skip]
    elements.extend_from_slice(&[
        // Item Delimitation Item, the true end of the outer item
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
        // Sequence Delimitation Item
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ]);
    let data = file_of(&elements);
    let object = DicomObject::from_reader(&data[..], &TestDictionary).unwrap();

    let outer = object.get(Tag(0x3006, 0x0039)).unwrap();
    assert_eq!(outer.vr(), VR::SQ);
    assert!(outer.length().is_undefined());
    let items = outer.items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data(), nested_element);

    // reparsing the item's bytes yields the nested sequence element
    let inner_set = object.parse_item(items[0].data(), &TestDictionary).unwrap();
    assert_eq!(inner_set.len(), 1);
    let inner = inner_set.get(Tag(0x3006, 0x0040)).unwrap();
    assert_eq!(inner.vr(), VR::SQ);
    assert_eq!(inner.description(), "Contour Sequence");
    let inner_items = inner.items().unwrap();
    assert_eq!(inner_items.len(), 1);
    assert_eq!(
        inner_items[0].data(),
        &[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn unknown_vendor_tag_as_sequence() {
    #[rustfmt::skip]
    let data = file_of(&[
        // (0002,0010) UI, length 18, "1.2.840.10008.1.2\0" (implicit VR LE)
        0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x12, 0x00,
        b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0',
        b'0', b'0', b'8', b'.', b'1', b'.', b'2', 0x00,
        // (3F3F,1001), absent from the dictionary, length field all ones:
        // decoded as a sequence rather than a 4 GiB value field
        0x3F, 0x3F, 0x01, 0x10, 0xFF, 0xFF, 0xFF, 0xFF,
        // Item, length 4
        0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00,
        0xAB, 0xAD, 0xCA, 0xFE,
        // Sequence Delimitation Item
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ]);
    let object = DicomObject::from_reader(&data[..], &TestDictionary).unwrap();

    let element = object.get(Tag(0x3F3F, 0x1001)).unwrap();
    assert_eq!(element.vr(), VR::SQ);
    assert!(element.length().is_undefined());
    assert_eq!(element.description(), "Unknown Tag");
    let items = element.items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].data(), &[0xAB, 0xAD, 0xCA, 0xFE]);
}

#[test]
fn slice_location_with_trailing_space() {
    #[rustfmt::skip]
    let data = file_of(&[
        // (0020,1041) DS, length 6, "-12.5 "
        0x20, 0x00, 0x41, 0x10, b'D', b'S', 0x06, 0x00,
        b'-', b'1', b'2', b'.', b'5', b' ',
    ]);
    let object = DicomObject::from_reader(&data[..], &TestDictionary).unwrap();
    assert_eq!(object.slice_location(), Some(-12.5));
}

#[test]
fn elements_are_sorted_and_the_stream_fully_consumed() {
    #[rustfmt::skip]
    let data = file_of(&[
        // (0010,0010) PN, length 6, out of tag order on the wire
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x06, 0x00,
        b'D', b'o', b'e', b'^', b'J', 0x00,
        // (0008,0060) CS, length 2
        0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00,
        b'C', b'T',
        // (0008,0005) CS, length 10
        0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
        b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'0', b'0',
    ]);
    let mut cursor = Cursor::new(&data[..]);
    let object = DicomObject::from_reader(&mut cursor, &TestDictionary).unwrap();

    // the whole stream was consumed
    assert_eq!(cursor.position() as usize, data.len());

    let tags: Vec<Tag> = object.data_set().iter().map(|e| e.tag()).collect();
    assert_eq!(
        tags,
        vec![
            Tag(0x0008, 0x0005),
            Tag(0x0008, 0x0060),
            Tag(0x0010, 0x0010),
        ]
    );
}

#[test]
fn truncated_value_field() {
    #[rustfmt::skip]
    let data = file_of(&[
        // (0008,0060) CS claims 10 bytes but only 2 follow
        0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x0A, 0x00,
        b'C', b'T',
    ]);
    let err = DicomObject::from_reader(&data[..], &TestDictionary).unwrap_err();
    assert_eq!(err.code(), 301);
}

#[test]
fn truncated_element_tag() {
    #[rustfmt::skip]
    let data = file_of(&[
        // half a tag
        0x08, 0x00,
    ]);
    let err = DicomObject::from_reader(&data[..], &TestDictionary).unwrap_err();
    assert_eq!(err.code(), 201);
}

#[test]
fn truncated_element_header() {
    #[rustfmt::skip]
    let data = file_of(&[
        // a tag with no header bytes after it
        0x08, 0x00, 0x60, 0x00,
    ]);
    let err = DicomObject::from_reader(&data[..], &TestDictionary).unwrap_err();
    assert_eq!(err.code(), 204);
}
