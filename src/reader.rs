use crate::error::{CodecError, Result};
use crate::wire::{ByteOrder, LengthPrefix, StringFormat, TextEncoding};
use zerocopy::byteorder::{BE, LE, U16};
use zerocopy::FromBytes;

/// Reads values from a slice of bytes.
///
/// Fixed-size values are decoded from their in-memory representation, using the reader's
/// [`ByteOrder`] (little-endian unless configured otherwise, matching .NET's
/// `System.IO.BinaryReader`). Variable-length values describe their representation on the method
/// that decodes them.
///
/// This type only supports reading values from a slice of bytes. If you need to read values from
/// a file or `Read` implementation, copy the data into an in-memory buffer first.
///
/// Failed reads report [`CodecError::TruncatedStream`] when the input ends early and
/// [`CodecError::Malformed`] when the bytes are present but invalid. After a failure the read
/// position is unspecified.
#[derive(Clone, Debug)]
pub struct BinaryReader<'a> {
    /// The input that has not been read yet.
    data: &'a [u8],
    /// Length of the input the reader was created with.
    total: usize,
    order: ByteOrder,
    /// How many nested compound values are being read.
    pub(crate) depth: usize,
}

macro_rules! read_int {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[inline(always)]
            pub fn $name(&mut self) -> Result<$ty> {
                let bytes = self.read_cbytes()?;
                Ok(match self.order {
                    ByteOrder::Little => <$ty>::from_le_bytes(bytes),
                    ByteOrder::Big => <$ty>::from_be_bytes(bytes),
                })
            }
        )*
    };
}

impl<'a> BinaryReader<'a> {
    /// Constructor. Values are decoded in little-endian byte order.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_byte_order(data, ByteOrder::Little)
    }

    /// Creates a reader that decodes multi-byte values in `order`.
    pub fn with_byte_order(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            total: data.len(),
            order,
            depth: 0,
        }
    }

    /// The byte order used for multi-byte values.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Offset of the next byte to be read, from the start of the input.
    pub fn position(&self) -> usize {
        self.total - self.data.len()
    }

    /// Total length of the input.
    pub fn len(&self) -> usize {
        self.total
    }

    /// Returns `true` if the input was empty to begin with.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of bytes that have not been read yet.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if every byte of the input has been read.
    pub fn is_eof(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes that have not been read yet.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub(crate) fn truncated(&self, needed: usize) -> CodecError {
        CodecError::TruncatedStream {
            position: self.position(),
            needed,
            remaining: self.data.len(),
        }
    }

    pub(crate) fn malformed(&self, position: usize, reason: impl Into<String>) -> CodecError {
        CodecError::Malformed {
            position,
            reason: reason.into(),
        }
    }

    /// Reads a single `u8` value.
    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8> {
        if let Some((&value, rest)) = self.data.split_first() {
            self.data = rest;
            Ok(value)
        } else {
            Err(self.truncated(1))
        }
    }

    /// Reads a single `i8` value.
    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a slice of bytes whose length is `len`. This function returns a slice reference
    /// to the bytes; it does not copy them.
    #[inline(always)]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.data.len() < len {
            Err(self.truncated(len))
        } else {
            let (lo, hi) = self.data.split_at(len);
            self.data = hi;
            Ok(lo)
        }
    }

    /// Reads a small array of bytes, with a constant length. The bytes are never reordered.
    #[inline(always)]
    pub fn read_cbytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    read_int! {
        /// Reads a `u16` in the reader's byte order.
        read_u16 => u16;
        /// Reads a `u32` in the reader's byte order.
        read_u32 => u32;
        /// Reads a `u64` in the reader's byte order.
        read_u64 => u64;
        /// Reads an `i16` in the reader's byte order.
        read_i16 => i16;
        /// Reads an `i32` in the reader's byte order.
        read_i32 => i32;
        /// Reads an `i64` in the reader's byte order.
        read_i64 => i64;
        /// Reads an `f32` from its IEEE 754 representation, in the reader's byte order.
        read_f32 => f32;
        /// Reads an `f64` from its IEEE 754 representation, in the reader's byte order.
        read_f64 => f64;
    }

    /// Reads a variable-length integer and returns the value in `i32`.
    pub fn read_7bit_encoded_i32(&mut self) -> Result<i32> {
        // Each byte encodes 7 bits of the integer and 1 bit indicating whether there are
        // more bytes following this one. Because 32 is not evenly divisible by 7, the last
        // byte has some meaningless bits in them. We could validate those bits (rejecting
        // input where the last byte contains non-zero meaningless bits), but that would be
        // stricter than the .NET implementation, so we do not.

        const MORE: u8 = 0x80;

        let start = self.position();
        let mut shift: u32 = 0;
        let mut n: u32 = 0;

        loop {
            let b = self.read_u8()?;
            n |= ((b & 0x7f) as u32) << shift;

            if (b & MORE) == 0 {
                break;
            }

            shift += 7;
            if shift >= 32 {
                return Err(self.malformed(start, "7-bit encoded i32 is too long"));
            }
        }

        Ok(n as i32)
    }

    /// Reads a variable-length integer and returns the value in `i64`.
    pub fn read_7bit_encoded_i64(&mut self) -> Result<i64> {
        const MORE: u8 = 0x80;

        let start = self.position();
        let mut shift: u32 = 0;
        let mut n: u64 = 0;

        loop {
            let b = self.read_u8()?;
            n |= ((b & 0x7f) as u64) << shift;

            if (b & MORE) == 0 {
                break;
            }

            shift += 7;
            if shift >= 64 {
                return Err(self.malformed(start, "7-bit encoded i64 is too long"));
            }
        }

        Ok(n as i64)
    }

    /// Reads a length (an element count or a byte count) encoded as `prefix`.
    pub fn read_length(&mut self, prefix: LengthPrefix) -> Result<usize> {
        let start = self.position();
        let len: u64 = match prefix {
            LengthPrefix::U8 => self.read_u8()?.into(),
            LengthPrefix::U16 => self.read_u16()?.into(),
            LengthPrefix::U32 => self.read_u32()?.into(),
            LengthPrefix::Var7 => {
                let n = self.read_7bit_encoded_i32()?;
                u64::try_from(n).map_err(|_| self.malformed(start, format!("negative length {n}")))?
            }
        };
        usize::try_from(len).map_err(|_| self.malformed(start, format!("length {len} exceeds the address space")))
    }

    /// Reads a byte count encoded as `prefix`, then that many bytes.
    ///
    /// This does not copy any data.
    pub fn read_prefixed_bytes(&mut self, prefix: LengthPrefix) -> Result<&'a [u8]> {
        let len = self.read_length(prefix)?;
        self.read_bytes(len)
    }

    /// Reads bytes up to a zero code unit that is `unit` bytes wide, and consumes the terminator.
    ///
    /// Reading stops at the first terminator or at the end of the input, whichever comes first,
    /// so this never fails. The terminator is not part of the returned slice.
    pub fn read_null_terminated_bytes(&mut self, unit: usize) -> &'a [u8] {
        let unit = unit.max(1);
        let data = self.data;
        let mut end = 0;
        while end + unit <= data.len() {
            if data[end..end + unit].iter().all(|&b| b == 0) {
                self.data = &data[end + unit..];
                return &data[..end];
            }
            end += unit;
        }
        self.data = &[];
        data
    }

    /// Reads a zero-terminated run of single-byte characters as a `bstr::BStr`.
    ///
    /// The caller must handle validating the contents, if necessary.
    #[cfg(feature = "bstr")]
    pub fn read_null_terminated_bstr(&mut self) -> &'a bstr::BStr {
        bstr::BStr::new(self.read_null_terminated_bytes(1))
    }

    /// Reads a string in the given wire format and character encoding.
    pub fn read_string(&mut self, format: StringFormat, encoding: TextEncoding) -> Result<String> {
        let start = self.position();
        let bytes = match format {
            StringFormat::LengthPrefixed(prefix) => self.read_prefixed_bytes(prefix)?,
            StringFormat::NullTerminated => self.read_null_terminated_bytes(encoding.unit_len()),
        };
        self.decode_text(bytes, encoding, start)
    }

    /// Reads a 7-bit length-prefixed UTF-8 string, as written by `BinaryWriter.Write(string)`.
    pub fn read_utf8_string(&mut self) -> Result<String> {
        self.read_string(StringFormat::default(), TextEncoding::Utf8)
    }

    fn decode_text(&self, bytes: &[u8], encoding: TextEncoding, start: usize) -> Result<String> {
        match encoding {
            TextEncoding::Ascii => {
                if let Some(i) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(self.malformed(start, format!("non-ASCII byte 0x{:02x} in ASCII string", bytes[i])));
                }
                Ok(bytes.iter().map(|&b| char::from(b)).collect())
            }
            TextEncoding::Utf8 => match core::str::from_utf8(bytes) {
                Ok(s) => Ok(s.to_owned()),
                Err(e) => Err(self.malformed(start, format!("invalid UTF-8: {e}"))),
            },
            TextEncoding::Utf16 => {
                let units = self.utf16_units(bytes, start)?;
                String::from_utf16(&units).map_err(|e| self.malformed(start, format!("invalid UTF-16: {e}")))
            }
        }
    }

    /// Converts raw bytes into UTF-16 code units, using the reader's byte order.
    ///
    /// The length in bytes is required to be a multiple of 2.
    fn utf16_units(&self, bytes: &[u8], start: usize) -> Result<Vec<u16>> {
        let odd = || self.malformed(start, format!("UTF-16 payload has odd length {}", bytes.len()));
        Ok(match self.order {
            ByteOrder::Little => <[U16<LE>]>::ref_from_bytes(bytes)
                .map_err(|_| odd())?
                .iter()
                .map(|c| c.get())
                .collect(),
            ByteOrder::Big => <[U16<BE>]>::ref_from_bytes(bytes)
                .map_err(|_| odd())?
                .iter()
                .map(|c| c.get())
                .collect(),
        })
    }
}
