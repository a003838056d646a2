use crate::*;
use pretty_hex::PrettyHex;
use proptest::prelude::*;

#[test]
fn basic_u8() {
    let mut r = BinaryReader::new(&[42, 43, 44]);
    let b = r.read_u8().unwrap();
    assert_eq!(b, 42);
    assert_eq!(r.remaining_bytes(), &[43, 44]);
    assert_eq!(r.position(), 1);
}

/// Not sure why you would ever test a zero-length read, but ok.
#[test]
fn read_cbytes_zero_len() {
    let mut r = BinaryReader::new(&[0x33, 0x44]);
    let _empty: [u8; 0] = r.read_cbytes().unwrap();
    assert_eq!(r.remaining_bytes(), [0x33, 0x44]);
}

#[test]
fn read_cbytes_not_enough() {
    let mut r = BinaryReader::new(&[0x33, 0x44, 0x55]);
    assert_eq!(
        r.read_cbytes::<5>(),
        Err(CodecError::TruncatedStream {
            position: 0,
            needed: 5,
            remaining: 3
        })
    );
    // A failed read consumes nothing.
    assert_eq!(r.remaining(), 3);
}

#[test]
fn read_cbytes_some() {
    let mut r = BinaryReader::new(&[0x33, 0x44, 0x55]);
    assert_eq!(r.read_cbytes(), Ok([0x33, 0x44]));
    assert_eq!(r.remaining_bytes(), [0x55]);
}

#[test]
fn basic_u16() {
    let mut r = BinaryReader::new(&[]);
    assert!(r.read_u16().unwrap_err().is_truncated());

    let mut r = BinaryReader::new(&[0xaa, 0x55, 0x33, 0x44]);
    assert_eq!(r.read_u16(), Ok(0x55aa));
    assert_eq!(r.remaining_bytes(), &[0x33, 0x44]);
}

#[test]
fn big_endian() {
    let mut w = BinaryWriter::with_byte_order(ByteOrder::Big);
    w.write_u32(0x0102_0304);
    w.write_i16(-2);
    w.write_f32(1.0);
    assert_eq!(w.as_bytes(), [1, 2, 3, 4, 0xff, 0xfe, 0x3f, 0x80, 0, 0]);

    let bytes = w.into_inner();
    let mut r = BinaryReader::with_byte_order(&bytes, ByteOrder::Big);
    assert_eq!(r.read_u32(), Ok(0x0102_0304));
    assert_eq!(r.read_i16(), Ok(-2));
    assert_eq!(r.read_f32(), Ok(1.0));
    assert!(r.is_eof());
}

#[test]
fn str_utf8() {
    let mut w = BinaryWriter::new();
    w.write_utf8_str("Hello!").unwrap();
    w.write_u16(0xaa55);
    assert_eq!(w.as_bytes(), [6, b'H', b'e', b'l', b'l', b'o', b'!', 0x55, 0xaa]);

    let mut r = BinaryReader::new(w.as_bytes());
    assert_eq!(r.read_utf8_string(), Ok("Hello!".to_string()));
    assert_eq!(r.remaining_bytes(), [0x55, 0xaa]);
}

#[test]
fn str_utf16() {
    let format = StringFormat::LengthPrefixed(LengthPrefix::U8);

    let mut w = BinaryWriter::new();
    w.write_string("Hé", format, TextEncoding::Utf16).unwrap();
    assert_eq!(w.as_bytes(), [4, b'H', 0, 0xe9, 0]);
    let mut r = BinaryReader::new(w.as_bytes());
    assert_eq!(r.read_string(format, TextEncoding::Utf16), Ok("Hé".to_string()));

    let mut w = BinaryWriter::with_byte_order(ByteOrder::Big);
    w.write_string("Hé", format, TextEncoding::Utf16).unwrap();
    assert_eq!(w.as_bytes(), [4, 0, b'H', 0, 0xe9]);
    let mut r = BinaryReader::with_byte_order(w.as_bytes(), ByteOrder::Big);
    assert_eq!(r.read_string(format, TextEncoding::Utf16), Ok("Hé".to_string()));
}

#[test]
fn str_utf16_odd_length() {
    let mut r = BinaryReader::new(&[3, b'a', 0, b'b']);
    let err = r
        .read_string(StringFormat::LengthPrefixed(LengthPrefix::U8), TextEncoding::Utf16)
        .unwrap_err();
    assert!(matches!(err, CodecError::Malformed { position: 0, .. }), "{err}");
}

#[test]
fn null_terminated_utf16() {
    // U+0100 encodes as [0x00, 0x01]: a zero byte, but not a zero code unit.
    let mut w = BinaryWriter::new();
    w.write_string("a\u{100}", StringFormat::NullTerminated, TextEncoding::Utf16)
        .unwrap();
    w.write_u8(0x77);
    assert_eq!(w.as_bytes(), [b'a', 0, 0x00, 0x01, 0, 0, 0x77]);

    let mut r = BinaryReader::new(w.as_bytes());
    assert_eq!(
        r.read_string(StringFormat::NullTerminated, TextEncoding::Utf16),
        Ok("a\u{100}".to_string())
    );
    assert_eq!(r.remaining_bytes(), [0x77]);
}

#[test]
fn null_terminated_rejects_embedded_terminator() {
    let mut w = BinaryWriter::new();
    w.write_u8(1);
    let err = w
        .write_string("ab\0", StringFormat::NullTerminated, TextEncoding::Utf8)
        .unwrap_err();
    assert_eq!(
        err,
        CodecError::Serialization {
            field: "",
            reason: SerializationFault::EmbeddedTerminator { offset: 2 },
        }
    );
    assert_eq!(w.as_bytes(), [1]);
}

#[cfg(feature = "bstr")]
#[test]
fn null_terminated_bstr() {
    let mut r = BinaryReader::new(b"abc\0\xffz");
    assert_eq!(r.read_null_terminated_bstr(), "abc");
    assert_eq!(r.read_null_terminated_bstr(), b"\xffz".as_slice());
    assert!(r.is_eof());
}

#[test]
fn mixed() {
    let mut w = BinaryWriter::new();
    w.write_u8(42);
    w.write_u16(0x0102);
    w.write_utf8_str("Hello, world!").unwrap();
    w.write_i32(-33);

    println!("{}", w.as_bytes().hex_dump());

    let mut r = BinaryReader::new(w.as_bytes());
    assert_eq!(r.read_u8(), Ok(42));
    assert_eq!(r.read_u16(), Ok(0x0102));
    assert_eq!(r.read_utf8_string(), Ok("Hello, world!".to_string()));
    assert_eq!(r.read_i32(), Ok(-33));
    assert!(r.is_eof());
}

#[test]
fn length_prefixes() {
    let mut w = BinaryWriter::new();
    w.write_length(LengthPrefix::U8, 255).unwrap();
    w.write_length(LengthPrefix::U16, 0x1234).unwrap();
    w.write_length(LengthPrefix::U32, 1).unwrap();
    w.write_length(LengthPrefix::Var7, 300).unwrap();
    assert_eq!(w.as_bytes(), [0xff, 0x34, 0x12, 1, 0, 0, 0, 0xac, 0x02]);

    let mut r = BinaryReader::new(w.as_bytes());
    assert_eq!(r.read_length(LengthPrefix::U8), Ok(255));
    assert_eq!(r.read_length(LengthPrefix::U16), Ok(0x1234));
    assert_eq!(r.read_length(LengthPrefix::U32), Ok(1));
    assert_eq!(r.read_length(LengthPrefix::Var7), Ok(300));

    let err = w.write_length(LengthPrefix::U8, 256).unwrap_err();
    assert!(
        matches!(
            err,
            CodecError::Serialization {
                reason: SerializationFault::LengthOverflow { len: 256, .. },
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn negative_var7_length() {
    let mut r = BinaryReader::new(&[0xff, 0xff, 0xff, 0xff, 0x0f]);
    let err = r.read_length(LengthPrefix::Var7).unwrap_err();
    assert!(matches!(err, CodecError::Malformed { position: 0, .. }), "{err}");
}

#[test]
fn int7_too_long() {
    let mut r = BinaryReader::new(&[0x80; 6]);
    assert!(matches!(r.read_7bit_encoded_i32(), Err(CodecError::Malformed { .. })));

    let mut r = BinaryReader::new(&[0x80; 4]);
    assert!(r.read_7bit_encoded_i32().unwrap_err().is_truncated());
}

#[test]
fn int7_i32() {
    let cases: &[(i32, &[u8])] = &[
        (0 /* 0x00000000 */, &[0x00]),
        (1 /* 0x00000001 */, &[0x01]),
        (-1 /* 0xffffffff */, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
        (127 /* 0x0000007f */, &[0x7f]),
        (128 /* 0x00000080 */, &[0x80, 0x01]),
        (255 /* 0x000000ff */, &[0xff, 0x01]),
        (256 /* 0x00000100 */, &[0x80, 0x02]),
        (
            -12345, /* 0xffffcfc7 */
            &[0xc7, 0x9f, 0xff, 0xff, 0x0f],
        ),
        (12345 /* 0x00003039 */, &[0xb9, 0x60]),
        (
            2147483647, /* 0x7fffffff */
            &[0xff, 0xff, 0xff, 0xff, 0x07],
        ),
        (
            -2147483648, /* 0x80000000 */
            &[0x80, 0x80, 0x80, 0x80, 0x08],
        ),
    ];

    // Check encoding
    for &(x, bytes) in cases.iter() {
        let mut w = BinaryWriter::new();
        w.write_7bit_encoded_i32(x);
        assert_eq!(w.as_bytes(), bytes, "x = {x} (0x{x:x})");
    }

    // Check decoding
    for &(expected_x, bytes) in cases.iter() {
        let mut r = BinaryReader::new(bytes);
        let decoded_x = r.read_7bit_encoded_i32().unwrap();
        assert_eq!(decoded_x, expected_x, "x = {expected_x} (0x{expected_x:x})");
    }
}

#[test]
fn int7_i64() {
    let cases: &[(i64, &[u8])] = &[
        (0 /* 0x00000000 */, &[0x00]),
        (1 /* 0x00000001 */, &[0x01]),
        (
            -1, /* 0xffffffffffffffff */
            &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
        ),
        (127 /* 0x0000007f */, &[0x7f]),
        (128 /* 0x00000080 */, &[0x80, 0x01]),
        (255 /* 0x000000ff */, &[0xff, 0x01]),
        (256 /* 0x00000100 */, &[0x80, 0x02]),
        (
            -12345, /* 0xffffffffffffcfc7 */
            &[0xc7, 0x9f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
        ),
        (12345 /* 0x00003039 */, &[0xb9, 0x60]),
        (
            9223372036854775807, /* 0x7fffffffffffffff */
            &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f],
        ),
        (
            -9223372036854775808, /* 0x8000000000000000 */
            &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01],
        ),
    ];

    // Check encoding
    for &(x, bytes) in cases.iter() {
        let mut w = BinaryWriter::new();
        w.write_7bit_encoded_i64(x);
        assert_eq!(w.as_bytes(), bytes, "x = {x} (0x{x:x})");
    }

    // Check decoding
    for &(expected_x, bytes) in cases.iter() {
        let mut r = BinaryReader::new(bytes);
        let decoded_x = r.read_7bit_encoded_i64().unwrap();
        assert_eq!(decoded_x, expected_x, "x = {expected_x} (0x{expected_x:x})");
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
struct Record {
    id: u32,
    delta: i64,
    name: String,
    samples: Vec<u16>,
    weights: Vec<i32>,
}

impl Compound for Record {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .field(Field::new(0, "id", |r: &Self| &r.id, |r: &mut Self| &mut r.id))
            .field(Field::new(1, "delta", |r: &Self| &r.delta, |r: &mut Self| &mut r.delta))
            .field(Field::new(2, "name", |r: &Self| &r.name, |r: &mut Self| &mut r.name))
            .field(
                Seq::new(3, "samples", |r: &Self| &r.samples, |r: &mut Self| &mut r.samples)
                    .length_prefix(LengthPrefix::U16),
            )
            .field(
                Seq::new(4, "weights", |r: &Self| &r.weights, |r: &mut Self| &mut r.weights)
                    .wire::<i64>()
                    .length_prefix(LengthPrefix::Var7),
            );
    }
}

proptest! {
    #[test]
    fn int7_round_trip(x in any::<i64>()) {
        let mut w = BinaryWriter::new();
        w.write_7bit_encoded_i64(x);
        let mut r = BinaryReader::new(w.as_bytes());
        prop_assert_eq!(r.read_7bit_encoded_i64().unwrap(), x);
        prop_assert!(r.is_eof());
    }

    #[test]
    fn record_round_trip(
        id in any::<u32>(),
        delta in any::<i64>(),
        name in ".{0,40}",
        samples in prop::collection::vec(any::<u16>(), 0..64),
        weights in prop::collection::vec(any::<i32>(), 0..16),
        big_endian in any::<bool>(),
    ) {
        let engine = Engine::default();
        let record = Record { id, delta, name, samples, weights };
        let order = if big_endian { ByteOrder::Big } else { ByteOrder::Little };

        let mut w = BinaryWriter::with_byte_order(order);
        engine.write(&record, &mut w).unwrap();
        let bytes = w.into_inner();

        let mut r = BinaryReader::with_byte_order(&bytes, order);
        let decoded = engine.create::<Record>(&mut r).unwrap();
        prop_assert!(r.is_eof());
        prop_assert_eq!(&decoded, &record);

        // Writing what was read reproduces the same bytes.
        let mut again = BinaryWriter::with_byte_order(order);
        engine.write(&decoded, &mut again).unwrap();
        prop_assert_eq!(again.into_inner(), bytes);
    }
}
