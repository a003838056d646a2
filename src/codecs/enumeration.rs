use crate::codec::{Codec, ParseTask, WriteTask};
use crate::error::Result;
use core::marker::PhantomData;

/// A fieldless enum stored as its 32-bit discriminant.
///
/// Usually implemented with [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Copy + Send + Sync + 'static {
    /// The discriminant written to the stream.
    fn to_wire(self) -> i32;

    /// The variant with discriminant `value`, if there is one.
    fn from_wire(value: i32) -> Option<Self>;
}

/// Reads and writes a [`WireEnum`] as an `i32`. Unknown discriminants are rejected.
pub struct EnumCodec<E>(PhantomData<fn() -> E>);

impl<E> EnumCodec<E> {
    /// Constructor
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for EnumCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: WireEnum> Codec<E> for EnumCodec<E> {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<E> {
        let reader = task.reader();
        let start = reader.position();
        let value = reader.read_i32()?;
        E::from_wire(value).ok_or_else(|| {
            reader.malformed(
                start,
                format!("{value} is not a discriminant of `{}`", core::any::type_name::<E>()),
            )
        })
    }

    fn write(&self, value: &E, task: &mut WriteTask<'_>) -> Result<()> {
        task.writer().write_i32(value.to_wire());
        Ok(())
    }
}

/// Declares a fieldless enum that is stored on the wire as its `i32` discriminant.
///
/// The enum gets `#[repr(i32)]` and derives `Clone`, `Copy`, `Debug`, `PartialEq`, `Eq` and
/// `Hash`; other attributes (such as `#[derive(Default)]` with a `#[default]` variant) are passed
/// through.
///
/// ```
/// binary_schema_io::wire_enum! {
///     #[derive(Default)]
///     pub enum Compression {
///         #[default]
///         None = 0,
///         Deflate = 8,
///     }
/// }
///
/// use binary_schema_io::WireEnum;
/// assert_eq!(Compression::from_wire(8), Some(Compression::Deflate));
/// assert_eq!(Compression::from_wire(3), None);
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i32)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $crate::WireEnum for $name {
            fn to_wire(self) -> i32 {
                self as i32
            }

            fn from_wire(value: i32) -> ::core::option::Option<Self> {
                $(
                    if value == $name::$variant as i32 {
                        return ::core::option::Option::Some($name::$variant);
                    }
                )+
                ::core::option::Option::None
            }
        }

        impl $crate::WireValue for $name {
            fn default_codec() -> ::core::option::Option<::std::sync::Arc<dyn $crate::Codec<Self>>> {
                ::core::option::Option::Some(::std::sync::Arc::new($crate::EnumCodec::<Self>::new()))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{CodecError, Compound, Engine, Field, SchemaBuilder};

    crate::wire_enum! {
        #[derive(Default)]
        enum Shade {
            #[default]
            Light = 1,
            Dark = -2,
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Tile {
        shade: Shade,
    }

    impl Compound for Tile {
        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema.field(Field::new(0, "shade", |t: &Self| &t.shade, |t: &mut Self| &mut t.shade));
        }
    }

    #[test]
    fn enum_uses_its_discriminant() {
        let engine = Engine::default();
        let bytes = engine.to_vec(&Tile { shade: Shade::Dark }).unwrap();
        assert_eq!(bytes, (-2i32).to_le_bytes());
        assert_eq!(engine.from_slice::<Tile>(&bytes).unwrap().shade, Shade::Dark);
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let engine = Engine::default();
        let err = engine.from_slice::<Tile>(&7i32.to_le_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }), "{err}");
    }
}
