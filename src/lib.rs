//! Reads and writes structured values as an explicitly ordered sequence of binary fields.
//!
//! The wire layout of a type is declared, not derived from its memory layout. A [`Compound`]
//! type lists its fields with a wire position, an optional wire type distinct from the field's
//! own type, and attributes such as string encoding or the length prefix of a collection. The
//! [`Engine`] compiles those declarations into a [`Schema`] once per type and then reads or
//! writes the fields in ascending order, asking the [`Registry`] for the [`Codec`] of each
//! field's type.
//!
//! Primitive values use the encoding rules of .NET's `System.IO.BinaryWriter` (little-endian by
//! default), via [`BinaryReader`] and [`BinaryWriter`].
//!
//! ```
//! use binary_schema_io::{Compound, Engine, Field, LengthPrefix, SchemaBuilder, Seq, Version};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Package {
//!     name: String,
//!     version: Version,
//!     sizes: Vec<usize>,
//! }
//!
//! impl Compound for Package {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field(Field::new(0, "name", |p: &Self| &p.name, |p| &mut p.name))
//!             .field(Field::new(1, "version", |p: &Self| &p.version, |p| &mut p.version))
//!             .field(
//!                 Seq::new(2, "sizes", |p: &Self| &p.sizes, |p| &mut p.sizes)
//!                     .wire::<u32>()
//!                     .length_prefix(LengthPrefix::U16),
//!             );
//!     }
//! }
//!
//! let engine = Engine::default();
//! let package = Package { name: "core".into(), version: Version::new(1, 2, 0, 0), sizes: vec![10, 20] };
//! let bytes = engine.to_vec(&package).unwrap();
//! assert_eq!(bytes.len(), 1 + 4 + 16 + 2 + 8);
//! assert_eq!(engine.from_slice::<Package>(&bytes).unwrap(), package);
//! ```
//!
//! # References
//! * <https://learn.microsoft.com/en-us/dotnet/api/system.io.binarywriter.write?view=net-9.0>

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(missing_docs)]

mod codec;
pub mod codecs;
mod engine;
mod error;
mod reader;
mod registry;
mod schema;
mod wire;
mod writer;

#[cfg(test)]
mod tests;

pub use codec::{Codec, Compound, NestedCodec, ParseTask, WireCollection, WireValue, WriteTask};
#[cfg(feature = "chrono")]
pub use codecs::TimestampCodec;
pub use codecs::{
    Digest, Digest128, Digest160, Digest256, Digest384, Digest512, DigestCodec, EnumCodec, ParseVersionError,
    PrimitiveCodec, StringCodec, Version, VersionCodec, WireEnum,
};
pub use engine::Engine;
pub use error::{CodecError, Result, SchemaError, SchemaRule, SerializationFault};
pub use reader::BinaryReader;
pub use registry::{CodecSet, Registration, Registry};
pub use schema::{
    CollectionKind, Conversion, Converted, DeclareField, Field, FieldAttrs, FieldDescriptor, FieldInfo, FloatCast,
    LengthPolicy, Same, Schema, SchemaBuilder, Seq,
};
pub use wire::{ByteOrder, LengthPrefix, StringFormat, TextEncoding};
pub use writer::BinaryWriter;
