//! Shared descriptions of how values are laid out on the wire.

use core::fmt;

/// Byte order used for multi-byte integers, floats and UTF-16 code units.
///
/// .NET's `BinaryWriter` always uses little-endian order, which is the default here. Raw byte
/// ranges, such as digests, are never reordered.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// The encoding of an element count (or a string's byte count) that precedes its payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LengthPrefix {
    /// One unsigned byte.
    U8,
    /// An unsigned 16-bit integer.
    U16,
    /// An unsigned 32-bit integer.
    U32,
    /// A 7-bit variable-length integer, as written by `BinaryWriter.Write7BitEncodedInt`.
    Var7,
}

impl LengthPrefix {
    /// The largest length this prefix can encode.
    pub fn max_len(self) -> usize {
        let max: u64 = match self {
            Self::U8 => u8::MAX.into(),
            Self::U16 => u16::MAX.into(),
            Self::U32 => u32::MAX.into(),
            Self::Var7 => i32::MAX as u64,
        };
        usize::try_from(max).unwrap_or(usize::MAX)
    }

    /// Number of bytes the prefix occupies for `len`.
    pub fn encoded_len(self, len: usize) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::Var7 => {
                let mut n = 1;
                let mut v = len >> 7;
                while v != 0 {
                    n += 1;
                    v >>= 7;
                }
                n
            }
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::U8 => "8-bit",
            Self::U16 => "16-bit",
            Self::U32 => "32-bit",
            Self::Var7 => "7-bit encoded",
        }
    }
}

impl fmt::Display for LengthPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Character encoding of a string payload.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TextEncoding {
    /// 7-bit ASCII. Any other character is rejected.
    Ascii,
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16, with code units in the stream's byte order.
    Utf16,
}

impl TextEncoding {
    /// Size of one code unit in bytes. Null terminators are one code unit wide.
    pub fn unit_len(self) -> usize {
        match self {
            Self::Ascii | Self::Utf8 => 1,
            Self::Utf16 => 2,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ASCII",
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
        }
    }
}

/// How a string is delimited on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StringFormat {
    /// The payload's byte count, then the payload.
    LengthPrefixed(LengthPrefix),
    /// The payload, then one zero code unit.
    NullTerminated,
}

impl Default for StringFormat {
    /// `BinaryWriter.Write(string)` uses a 7-bit encoded byte count.
    fn default() -> Self {
        Self::LengthPrefixed(LengthPrefix::Var7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var7_encoded_len() {
        assert_eq!(LengthPrefix::Var7.encoded_len(0), 1);
        assert_eq!(LengthPrefix::Var7.encoded_len(127), 1);
        assert_eq!(LengthPrefix::Var7.encoded_len(128), 2);
        assert_eq!(LengthPrefix::Var7.encoded_len(16384), 3);
    }

    #[test]
    fn fixed_prefix_limits() {
        assert_eq!(LengthPrefix::U8.max_len(), 255);
        assert_eq!(LengthPrefix::U16.max_len(), 65535);
        assert_eq!(LengthPrefix::U16.encoded_len(70000), 2);
    }
}
