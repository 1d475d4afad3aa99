use og_codec::wire::{Tag, WireWriter};
use og_codec::{Codec, CodecError, FormatError};
use og_model::Shared;
use og_model::derive::Graph;

#[derive(Graph, Default, Debug, PartialEq)]
struct Entry {
    key: String,
    value: i64,
}

#[derive(Graph, Default, Debug, PartialEq)]
struct Cell {
    id: u32,
}

#[derive(Graph, Default, Debug, Clone, Copy, PartialEq)]
enum Color {
    #[default]
    Red,
    Green,
}

fn bytes(build: impl FnOnce(&mut WireWriter)) -> Vec<u8> {
    let mut out = Vec::new();
    build(&mut WireWriter::new(&mut out));
    out
}

#[track_caller]
fn format_error(err: CodecError) -> (usize, FormatError) {
    match err {
        CodecError::Format { offset, kind } => (offset, kind),
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn unknown_tags() {
    let codec = Codec::new();
    let err = codec.decode::<u8>(&[0xFF]).unwrap_err();
    assert_eq!(format_error(err), (0, FormatError::UnknownTag(0xFF)));

    let err = codec.decode::<u8>(&[]).unwrap_err();
    assert_eq!(format_error(err), (0, FormatError::UnexpectedEof));
}

#[test]
fn malformed_scalars() {
    let codec = Codec::new();

    let err = codec.decode::<bool>(&[Tag::Bool as u8, 2]).unwrap_err();
    assert_eq!(format_error(err).1, FormatError::InvalidBool(2));

    let mut surrogate = vec![Tag::Char as u8];
    surrogate.extend_from_slice(&0xD800_u32.to_le_bytes());
    let err = codec.decode::<char>(&surrogate).unwrap_err();
    assert_eq!(format_error(err).1, FormatError::InvalidChar(0xD800));

    let mut color = vec![Tag::I32 as u8];
    color.extend_from_slice(&7_i32.to_le_bytes());
    let err = codec.decode::<Color>(&color).unwrap_err();
    assert!(matches!(
        format_error(err),
        (1, FormatError::InvalidEnumValue { type_name, value: 7 }) if type_name == "Color"
    ));
}

#[test]
fn malformed_strings() {
    let codec = Codec::new();

    let invalid = bytes(|w| {
        w.tag(Tag::String);
        w.varint(2);
        w.raw(&[0xC3, 0x28]);
    });
    let err = codec.decode::<String>(&invalid).unwrap_err();
    assert_eq!(format_error(err).1, FormatError::InvalidUtf8);

    let negative = bytes(|w| {
        w.tag(Tag::String);
        w.varint(-2);
    });
    let err = codec.decode::<String>(&negative).unwrap_err();
    assert_eq!(format_error(err).1, FormatError::InvalidLength(-2));

    let short = bytes(|w| {
        w.tag(Tag::String);
        w.varint(10);
        w.raw(b"abc");
    });
    let err = codec.decode::<String>(&short).unwrap_err();
    assert_eq!(format_error(err).1, FormatError::UnexpectedEof);
}

#[test]
fn name_numbers_must_be_known() {
    let codec = Codec::new();

    let unknown = bytes(|w| {
        w.tag(Tag::ObjectStart);
        w.tag(Tag::NameReferenceId);
        w.varint(0);
        w.tag(Tag::ObjectEnd);
    });
    let err = codec.decode::<Entry>(&unknown).unwrap_err();
    assert_eq!(
        format_error(err).1,
        FormatError::NameOutOfRange { number: 0, known: 0 }
    );

    let skipped = bytes(|w| {
        w.tag(Tag::ObjectStart);
        w.string(Some("Entry")).unwrap();
        w.varint(3);
        w.tag(Tag::ObjectEnd);
    });
    let err = codec.decode::<Entry>(&skipped).unwrap_err();
    assert_eq!(
        format_error(err).1,
        FormatError::NameOutOfRange { number: 3, known: 0 }
    );
}

#[test]
fn reference_numbers_must_be_known() {
    let codec = Codec::new();
    let ahead = bytes(|w| {
        w.tag(Tag::ObjectStart);
        w.string(Some("Cell")).unwrap();
        w.varint(0);
        w.tag(Tag::ReferenceId);
        w.varint(5);
        w.tag(Tag::ObjectEnd);
    });
    let err = codec.decode::<Shared<Cell>>(&ahead).unwrap_err();
    assert_eq!(
        format_error(err).1,
        FormatError::ReferenceOutOfRange { number: 5, known: 0 }
    );
}

#[test]
fn trailing_bytes() {
    let codec = Codec::new();
    let mut bytes = codec.encode(&7_u8).unwrap();
    bytes.push(Tag::Null as u8);
    let err = codec.decode::<u8>(&bytes).unwrap_err();
    assert_eq!(format_error(err), (2, FormatError::TrailingBytes(1)));
}

#[test]
fn every_truncation_fails() {
    let codec = Codec::new();
    let entry = Entry {
        key: String::from("answer"),
        value: 42,
    };
    let bytes = codec.encode(&entry).unwrap();
    assert_eq!(codec.decode::<Entry>(&bytes).unwrap(), entry);

    for len in 0..bytes.len() {
        assert!(codec.decode::<Entry>(&bytes[..len]).is_err(), "prefix of {len} bytes");
    }
    let err = codec.decode::<Entry>(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(format_error(err).1, FormatError::UnexpectedEof);
}

#[test]
fn unexpected_structure() {
    let codec = Codec::new();

    let err = codec.decode::<u32>(&codec.encode(&1_u16).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        CodecError::TypeMismatch { expected, found } if expected == "u32" && found == "U16"
    ));

    let null = bytes(|w| w.string(None).unwrap());
    let err = codec.decode::<String>(&null).unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { found, .. } if found == "null"));

    let unterminated = bytes(|w| {
        w.tag(Tag::ObjectStart);
        w.string(Some("Entry")).unwrap();
        w.varint(0);
        w.tag(Tag::ArrayEnd);
    });
    let err = codec.decode::<Entry>(&unterminated).unwrap_err();
    assert_eq!(
        format_error(err).1,
        FormatError::UnexpectedTag {
            expected: "FieldName or ObjectEnd",
            found: Tag::ArrayEnd,
        }
    );
}
