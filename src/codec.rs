//! The codec contract and the traits that let a type take part in the wire format.

use crate::engine::Engine;
use crate::error::Result;
use crate::reader::BinaryReader;
use crate::schema::{CollectionKind, FieldAttrs, FieldInfo, SchemaBuilder};
use crate::writer::BinaryWriter;
use core::marker::PhantomData;
use std::sync::Arc;

/// Paired read and write logic for one logical type `V`.
///
/// A codec reads and writes the wire representation of a single value. It receives the
/// per-field context (the stream, the engine, and the field's attributes) through a
/// [`ParseTask`] or [`WriteTask`].
pub trait Codec<V>: Send + Sync + 'static {
    /// Decodes one value from the stream.
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<V>;

    /// Encodes one value to the stream.
    fn write(&self, value: &V, task: &mut WriteTask<'_>) -> Result<()>;

    /// A name used in diagnostics.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Context for decoding one field value.
pub struct ParseTask<'t, 'a> {
    reader: &'t mut BinaryReader<'a>,
    engine: &'t Engine,
    field: &'t FieldInfo,
}

impl<'t, 'a> ParseTask<'t, 'a> {
    pub(crate) fn new(reader: &'t mut BinaryReader<'a>, engine: &'t Engine, field: &'t FieldInfo) -> Self {
        Self { reader, engine, field }
    }

    /// The stream being read.
    pub fn reader(&mut self) -> &mut BinaryReader<'a> {
        self.reader
    }

    /// The engine driving this read. Codecs use it to decode nested compound values.
    pub fn engine(&self) -> &'t Engine {
        self.engine
    }

    /// The field being decoded.
    pub fn field(&self) -> &'t FieldInfo {
        self.field
    }

    /// The field's auxiliary attributes.
    pub fn attrs(&self) -> &'t FieldAttrs {
        self.field.attrs()
    }
}

/// Context for encoding one field value.
pub struct WriteTask<'t> {
    writer: &'t mut BinaryWriter,
    engine: &'t Engine,
    field: &'t FieldInfo,
}

impl<'t> WriteTask<'t> {
    pub(crate) fn new(writer: &'t mut BinaryWriter, engine: &'t Engine, field: &'t FieldInfo) -> Self {
        Self { writer, engine, field }
    }

    /// The stream being written.
    pub fn writer(&mut self) -> &mut BinaryWriter {
        self.writer
    }

    /// The engine driving this write.
    pub fn engine(&self) -> &'t Engine {
        self.engine
    }

    /// The field being encoded.
    pub fn field(&self) -> &'t FieldInfo {
        self.field
    }

    /// The field's auxiliary attributes.
    pub fn attrs(&self) -> &'t FieldAttrs {
        self.field.attrs()
    }
}

/// A type that can appear as a field value on the wire.
///
/// The registry is consulted first. When it has no codec for the type, the codec returned by
/// [`WireValue::default_codec`] is used: primitives return the primitive codec and every
/// [`Compound`] returns a codec that recurses into the engine. Types that return `None` must be
/// registered, or resolution fails with [`CodecError::CodecNotFound`](crate::CodecError::CodecNotFound).
pub trait WireValue: Sized + 'static {
    /// The codec used when no codec is registered for this type.
    fn default_codec() -> Option<Arc<dyn Codec<Self>>> {
        None
    }

    /// Called on every decoded value before it is stored into its field.
    fn after_decode(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A structured value whose declared fields make up its wire format.
///
/// ```
/// use binary_schema_io::{Compound, Engine, Field, LengthPrefix, SchemaBuilder, Seq};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Header {
///     magic: u32,
///     tags: Vec<u16>,
/// }
///
/// impl Compound for Header {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema
///             .field(Field::new(0, "magic", |h: &Self| &h.magic, |h| &mut h.magic))
///             .field(Seq::new(1, "tags", |h: &Self| &h.tags, |h| &mut h.tags).length_prefix(LengthPrefix::U8));
///     }
/// }
///
/// let engine = Engine::default();
/// let header = Header { magic: 7, tags: vec![1, 2] };
/// let bytes = engine.to_vec(&header).unwrap();
/// assert_eq!(bytes, [7, 0, 0, 0, 2, 1, 0, 2, 0]);
/// assert_eq!(engine.from_slice::<Header>(&bytes).unwrap(), header);
/// ```
pub trait Compound: Default + 'static {
    /// Declares the fields that take part in the wire format.
    fn describe(schema: &mut SchemaBuilder<Self>);

    /// Called once after all fields have been read.
    fn after_read(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once before any field is written. Returning an error aborts the write.
    fn before_write(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: Compound> WireValue for T {
    fn default_codec() -> Option<Arc<dyn Codec<Self>>> {
        Some(Arc::new(NestedCodec::<T>::new()))
    }

    fn after_decode(&mut self) -> Result<()> {
        self.after_read()
    }
}

/// Reads and writes a nested compound value through the engine.
pub struct NestedCodec<T>(PhantomData<fn() -> T>);

impl<T> NestedCodec<T> {
    /// Constructor
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NestedCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Compound> Codec<T> for NestedCodec<T> {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<T> {
        let engine = task.engine();
        engine.read_nested(task.reader())
    }

    fn write(&self, value: &T, task: &mut WriteTask<'_>) -> Result<()> {
        let engine = task.engine();
        engine.write(value, task.writer())
    }
}

/// A container that can back a collection field.
pub trait WireCollection: 'static {
    /// The element type.
    type Item: 'static;

    /// How the container is reported in the schema.
    const KIND: CollectionKind;

    /// The elements, in wire order.
    fn items(&self) -> &[Self::Item];

    /// Builds the container from decoded elements.
    fn from_items(items: Vec<Self::Item>) -> Self;
}

impl<V: 'static> WireCollection for Vec<V> {
    type Item = V;
    const KIND: CollectionKind = CollectionKind::List;

    fn items(&self) -> &[V] {
        self
    }

    fn from_items(items: Vec<V>) -> Self {
        items
    }
}

impl<V: 'static> WireCollection for Box<[V]> {
    type Item = V;
    const KIND: CollectionKind = CollectionKind::Array;

    fn items(&self) -> &[V] {
        self
    }

    fn from_items(items: Vec<V>) -> Self {
        items.into_boxed_slice()
    }
}
