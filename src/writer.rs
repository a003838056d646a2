use crate::error::{CodecError, Result, SerializationFault};
use crate::wire::{ByteOrder, LengthPrefix, StringFormat, TextEncoding};
use std::borrow::Cow;
use zerocopy::byteorder::{BE, LE, U16};
use zerocopy::IntoBytes;

/// Encodes binary values into a `Vec<u8>`, using the same rules as .NET's
/// `System.IO.BinaryWriter` unless a big-endian byte order is requested.
#[derive(Clone, Debug, Default)]
pub struct BinaryWriter {
    /// The output data.
    out: Vec<u8>,
    order: ByteOrder,
}

macro_rules! write_int {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: $ty) {
                match self.order {
                    ByteOrder::Little => self.write_cbytes(value.to_le_bytes()),
                    ByteOrder::Big => self.write_cbytes(value.to_be_bytes()),
                }
            }
        )*
    };
}

impl BinaryWriter {
    /// Creates a new little-endian `BinaryWriter` over an empty `Vec<u8>`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new little-endian `BinaryWriter` with the given capacity.
    pub fn with_capacity(len: usize) -> Self {
        Self {
            out: Vec::with_capacity(len),
            order: ByteOrder::Little,
        }
    }

    /// Creates a writer that encodes multi-byte values in `order`.
    pub fn with_byte_order(order: ByteOrder) -> Self {
        Self {
            out: Vec::new(),
            order,
        }
    }

    /// The byte order used for multi-byte values.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.out.len()
    }

    /// Extracts the inner buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.out
    }

    /// Writes `bytes` to the output.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    /// Writes a small, fixed-size array of bytes. The bytes are never reordered.
    pub fn write_cbytes<const N: usize>(&mut self, value: [u8; N]) {
        self.write_bytes(&value)
    }

    /// Writes a single `u8` value
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value])
    }

    /// Writes a single `i8` value
    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&[value as u8])
    }

    write_int! {
        /// Writes a single `u16` value
        write_u16 => u16;
        /// Writes a single `u32` value
        write_u32 => u32;
        /// Writes a single `u64` value
        write_u64 => u64;
        /// Writes a single `i16` value
        write_i16 => i16;
        /// Writes a single `i32` value
        write_i32 => i32;
        /// Writes a single `i64` value
        write_i64 => i64;
        /// Writes an `f32` value using its IEEE 754 representation.
        write_f32 => f32;
        /// Writes an `f64` value using its IEEE 754 representation.
        write_f64 => f64;
    }

    /// Encodes an `i32` value using a variable-length encoding.
    ///
    /// Although this function takes `i32` values, applications should avoid using this for
    /// negative values. This function can correctly encode negative values, but most "small"
    /// negative value (e.g. `-10`) will be encoded with the maximum number of bytes, which wastes
    /// space.
    pub fn write_7bit_encoded_i32(&mut self, value: i32) {
        const MORE: u8 = 0x80; // bit indicating there are more bits
        const MASK: u8 = 0x7f;

        let w0: u8 = value as u8 & MASK; // 7 significant bits
        let w1: u8 = (value >> 7) as u8 & MASK; // 7 significant bits
        let w2: u8 = (value >> 14) as u8 & MASK; // 7 significant bits
        let w3: u8 = (value >> 21) as u8 & MASK; // 7 significant bits
        let w4: u8 = (value >> 28) as u8 & 0xF; // only 4 significant bits

        if w4 != 0 {
            self.write_cbytes([w0 | MORE, w1 | MORE, w2 | MORE, w3 | MORE, w4]);
        } else if w3 != 0 {
            self.write_cbytes([w0 | MORE, w1 | MORE, w2 | MORE, w3]);
        } else if w2 != 0 {
            self.write_cbytes([w0 | MORE, w1 | MORE, w2]);
        } else if w1 != 0 {
            self.write_cbytes([w0 | MORE, w1]);
        } else {
            self.write_cbytes([w0]);
        }
    }

    /// Encodes an `i64` value using a variable-length encoding.
    pub fn write_7bit_encoded_i64(&mut self, value: i64) {
        let mut n: u64 = value as u64;

        loop {
            if n < 0x80 {
                self.write_u8(n as u8);
                break;
            }
            self.write_u8((n & 0x7f) as u8 | 0x80);
            n >>= 7;
        }
    }

    /// Writes `len` using the `prefix` encoding.
    ///
    /// Fails without writing anything if `len` does not fit in the prefix.
    pub fn write_length(&mut self, prefix: LengthPrefix, len: usize) -> Result<()> {
        if len > prefix.max_len() {
            return Err(CodecError::serialization(
                "",
                SerializationFault::LengthOverflow {
                    len,
                    prefix: prefix.name(),
                },
            ));
        }
        // The check above makes these casts lossless.
        match prefix {
            LengthPrefix::U8 => self.write_u8(len as u8),
            LengthPrefix::U16 => self.write_u16(len as u16),
            LengthPrefix::U32 => self.write_u32(len as u32),
            LengthPrefix::Var7 => self.write_7bit_encoded_i32(len as i32),
        }
        Ok(())
    }

    /// Writes the byte count of `bytes` using `prefix`, then `bytes`.
    pub fn write_prefixed_bytes(&mut self, prefix: LengthPrefix, bytes: &[u8]) -> Result<()> {
        self.write_length(prefix, bytes.len())?;
        self.write_bytes(bytes);
        Ok(())
    }

    /// Writes a string in the given wire format and character encoding.
    ///
    /// All validation happens before any byte is written: characters the encoding cannot
    /// represent, lengths that overflow the prefix, and (for null-terminated strings) an
    /// encoded zero code unit inside the payload are all rejected with a
    /// [`CodecError::Serialization`] error, leaving the output untouched.
    pub fn write_string(&mut self, s: &str, format: StringFormat, encoding: TextEncoding) -> Result<()> {
        let payload = self.encode_text(s, encoding)?;
        match format {
            StringFormat::LengthPrefixed(prefix) => self.write_prefixed_bytes(prefix, &payload),
            StringFormat::NullTerminated => {
                let unit = encoding.unit_len();
                if let Some(i) = payload.chunks(unit).position(|c| c.iter().all(|&b| b == 0)) {
                    return Err(CodecError::serialization(
                        "",
                        SerializationFault::EmbeddedTerminator { offset: i * unit },
                    ));
                }
                self.write_bytes(&payload);
                self.out.resize(self.out.len() + unit, 0);
                Ok(())
            }
        }
    }

    /// Writes a UTF-8 string with a 7-bit encoded length prefix, like `BinaryWriter.Write(string)`.
    pub fn write_utf8_str(&mut self, s: &str) -> Result<()> {
        self.write_string(s, StringFormat::default(), TextEncoding::Utf8)
    }

    fn encode_text<'s>(&self, s: &'s str, encoding: TextEncoding) -> Result<Cow<'s, [u8]>> {
        match encoding {
            TextEncoding::Ascii => {
                if let Some(ch) = s.chars().find(|c| !c.is_ascii()) {
                    return Err(CodecError::serialization(
                        "",
                        SerializationFault::Unencodable {
                            ch,
                            encoding: encoding.name(),
                        },
                    ));
                }
                Ok(Cow::Borrowed(s.as_bytes()))
            }
            TextEncoding::Utf8 => Ok(Cow::Borrowed(s.as_bytes())),
            TextEncoding::Utf16 => Ok(Cow::Owned(match self.order {
                ByteOrder::Little => s.encode_utf16().map(U16::<LE>::new).collect::<Vec<_>>().as_bytes().to_vec(),
                ByteOrder::Big => s.encode_utf16().map(U16::<BE>::new).collect::<Vec<_>>().as_bytes().to_vec(),
            })),
        }
    }
}
