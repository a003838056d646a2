use crate::codec::{Codec, ParseTask, WireValue, WriteTask};
use crate::error::Result;
use crate::registry::{CodecSet, Registry};
use core::fmt;
use core::str::FromStr;

/// A fixed-size message digest of `N` bytes.
///
/// Digests are opaque byte strings: they are copied to and from the stream as-is, without any
/// byte-order conversion.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Digest<const N: usize>(pub [u8; N]);

/// A 128-bit digest, such as MD5.
pub type Digest128 = Digest<16>;
/// A 160-bit digest, such as SHA-1.
pub type Digest160 = Digest<20>;
/// A 256-bit digest, such as SHA-256.
pub type Digest256 = Digest<32>;
/// A 384-bit digest, such as SHA-384.
pub type Digest384 = Digest<48>;
/// A 512-bit digest, such as SHA-512.
pub type Digest512 = Digest<64>;

impl<const N: usize> Digest<N> {
    /// Size of the digest in bytes.
    pub const LEN: usize = N;

    /// The digest bytes.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> Default for Digest<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> From<[u8; N]> for Digest<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> fmt::Display for Digest<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl<const N: usize> fmt::Debug for Digest<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest<{}>({})", N, self)
    }
}

impl<const N: usize> FromStr for Digest<N> {
    type Err = hex::FromHexError;

    /// Parses `2 * N` hex digits.
    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let mut bytes = [0u8; N];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Reads and writes every [`Digest`] size as raw bytes.
#[derive(Copy, Clone, Debug, Default)]
pub struct DigestCodec;

impl<const N: usize> Codec<Digest<N>> for DigestCodec {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<Digest<N>> {
        Ok(Digest(task.reader().read_cbytes()?))
    }

    fn write(&self, value: &Digest<N>, task: &mut WriteTask<'_>) -> Result<()> {
        task.writer().write_cbytes(value.0);
        Ok(())
    }
}

impl CodecSet for DigestCodec {
    fn install(&self, registry: &Registry) {
        registry.register::<Digest128, _>(*self);
        registry.register::<Digest160, _>(*self);
        registry.register::<Digest256, _>(*self);
        registry.register::<Digest384, _>(*self);
        registry.register::<Digest512, _>(*self);
    }
}

impl<const N: usize> WireValue for Digest<N> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryReader, ByteOrder, Compound, Engine, Field, SchemaBuilder};

    #[derive(Default, Debug, PartialEq)]
    struct Sums {
        md5: Digest128,
        sha384: Digest384,
    }

    impl Compound for Sums {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field(Field::new(0, "md5", |s: &Self| &s.md5, |s: &mut Self| &mut s.md5))
                .field(Field::new(1, "sha384", |s: &Self| &s.sha384, |s: &mut Self| &mut s.sha384));
        }
    }

    #[test]
    fn digest_128_consumes_sixteen_bytes() {
        let engine = Engine::default();
        let mut data: Vec<u8> = (0u8..16).collect();
        data.extend_from_slice(&[0xee; 50]);

        #[derive(Default)]
        struct Only(Digest128);
        impl Compound for Only {
            fn describe(schema: &mut SchemaBuilder<Self>) {
                schema.field(Field::new(0, "sum", |o: &Self| &o.0, |o: &mut Self| &mut o.0));
            }
        }

        let mut reader = BinaryReader::new(&data);
        let only = engine.create::<Only>(&mut reader).unwrap();
        assert_eq!(reader.position(), 16);
        assert_eq!(only.0.as_bytes(), &core::array::from_fn::<u8, 16, _>(|i| i as u8));
    }

    #[test]
    fn digests_ignore_byte_order() {
        let engine = Engine::default();
        let sums = Sums {
            md5: Digest([0xab; 16]),
            sha384: Digest(core::array::from_fn(|i| i as u8)),
        };
        let little = engine.to_vec(&sums).unwrap();
        let mut big = crate::BinaryWriter::with_byte_order(ByteOrder::Big);
        engine.write(&sums, &mut big).unwrap();
        assert_eq!(little.len(), 16 + 48);
        assert_eq!(little, big.into_inner());
        assert_eq!(engine.from_slice::<Sums>(&little).unwrap(), sums);
    }

    #[test]
    fn hex_text() {
        let d: Digest128 = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
        assert_eq!(d.to_string(), "000102030405060708090a0b0c0d0e0f");
        assert!("0001".parse::<Digest128>().is_err());
        assert_eq!(Digest384::LEN, 48);
    }
}
