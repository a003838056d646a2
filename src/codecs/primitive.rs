use crate::codec::{Codec, ParseTask, WireValue, WriteTask};
use crate::error::Result;
use std::sync::Arc;

/// The fallback codec for fixed-width numbers and `bool`.
///
/// Numbers use their natural width in the stream's byte order. `bool` is a 32-bit word holding
/// 0 or 1; any other value is rejected when reading.
#[derive(Copy, Clone, Debug, Default)]
pub struct PrimitiveCodec;

macro_rules! primitive {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl Codec<$ty> for PrimitiveCodec {
                #[inline]
                fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<$ty> {
                    task.reader().$read()
                }

                #[inline]
                fn write(&self, value: &$ty, task: &mut WriteTask<'_>) -> Result<()> {
                    task.writer().$write(*value);
                    Ok(())
                }
            }

            impl WireValue for $ty {
                fn default_codec() -> Option<Arc<dyn Codec<Self>>> {
                    Some(Arc::new(PrimitiveCodec))
                }
            }
        )*
    };
}

primitive! {
    u8 => read_u8, write_u8;
    i8 => read_i8, write_i8;
    u16 => read_u16, write_u16;
    i16 => read_i16, write_i16;
    u32 => read_u32, write_u32;
    i32 => read_i32, write_i32;
    u64 => read_u64, write_u64;
    i64 => read_i64, write_i64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
}

impl Codec<bool> for PrimitiveCodec {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<bool> {
        let reader = task.reader();
        let start = reader.position();
        match reader.read_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(reader.malformed(start, format!("boolean word must be 0 or 1, found {n}"))),
        }
    }

    fn write(&self, value: &bool, task: &mut WriteTask<'_>) -> Result<()> {
        task.writer().write_u32(u32::from(*value));
        Ok(())
    }
}

impl WireValue for bool {
    fn default_codec() -> Option<Arc<dyn Codec<Self>>> {
        Some(Arc::new(PrimitiveCodec))
    }
}

#[cfg(test)]
mod tests {
    use crate::{CodecError, Compound, Engine, Field, SchemaBuilder};

    #[derive(Default, Debug, PartialEq)]
    struct Flags {
        enabled: bool,
        ratio: f32,
    }

    impl Compound for Flags {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .field(Field::new(0, "enabled", |f: &Self| &f.enabled, |f: &mut Self| &mut f.enabled))
                .field(Field::new(1, "ratio", |f: &Self| &f.ratio, |f: &mut Self| &mut f.ratio));
        }
    }

    #[test]
    fn bool_is_a_32_bit_word() {
        let engine = Engine::default();
        let bytes = engine.to_vec(&Flags { enabled: true, ratio: 0.5 }).unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 0x00, 0x00, 0x00, 0x3f]);
    }

    #[test]
    fn bool_rejects_other_words() {
        let engine = Engine::default();
        let err = engine.from_slice::<Flags>(&[2, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { position: 0, .. }), "{err}");
    }
}
