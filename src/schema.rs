//! Field declarations and the compiled, ordered schema of a compound type.
//!
//! A compound type lists its wire fields in [`Compound::describe`]. Each declaration records the
//! field's wire position (`order`), how to reach the field inside the value, its wire type, and
//! any auxiliary attributes. Compiling validates the declarations and sorts them by `order`,
//! which is the byte layout of the type.

use crate::codec::{Compound, ParseTask, WireCollection, WireValue, WriteTask};
use crate::engine::Engine;
use crate::error::{CodecError, Result, SchemaError, SchemaRule, SerializationFault};
use crate::reader::BinaryReader;
use crate::wire::{LengthPrefix, StringFormat, TextEncoding};
use crate::writer::BinaryWriter;
use core::any::{type_name, Any};
use core::fmt;
use core::marker::PhantomData;
use std::collections::{BTreeMap, HashSet};

/// Whether a field holds one value or a sequence of values.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CollectionKind {
    /// A single value.
    None,
    /// A boxed slice (`Box<[T]>`).
    Array,
    /// A growable list (`Vec<T>`).
    List,
}

/// How the element count of a collection field is determined.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LengthPolicy {
    /// The count is fixed by the schema and is not written to the stream.
    Entries(usize),
    /// The count precedes the elements, encoded with the given prefix.
    Prefixed(LengthPrefix),
}

/// Auxiliary attributes of a field, consulted by codecs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldAttrs {
    string: StringFormat,
    encoding: TextEncoding,
    extra: BTreeMap<&'static str, String>,
}

impl FieldAttrs {
    /// How string values of this field are delimited.
    pub fn string_format(&self) -> StringFormat {
        self.string
    }

    /// The character encoding of string values of this field.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// A free-form attribute, for use by custom codecs.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// The description of one field in a schema.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldInfo {
    order: i32,
    name: &'static str,
    wire_type: &'static str,
    logical_type: &'static str,
    container_type: Option<&'static str>,
    collection: CollectionKind,
    length: Option<LengthPolicy>,
    attrs: FieldAttrs,
}

impl FieldInfo {
    /// The declared wire position. Fields are laid out in ascending order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// The field's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type read from and written to the stream (per element, for collections).
    pub fn wire_type(&self) -> &'static str {
        self.wire_type
    }

    /// The type stored in the value (per element, for collections).
    pub fn logical_type(&self) -> &'static str {
        self.logical_type
    }

    /// The container type of a collection field.
    pub fn container_type(&self) -> Option<&'static str> {
        self.container_type
    }

    /// Whether the field is a collection, and of which kind.
    pub fn collection(&self) -> CollectionKind {
        self.collection
    }

    /// How the element count of a collection is determined. `None` for scalars.
    pub fn length(&self) -> Option<LengthPolicy> {
        self.length
    }

    /// Auxiliary attributes.
    pub fn attrs(&self) -> &FieldAttrs {
        &self.attrs
    }

    /// Returns `true` if the wire type differs from the logical type.
    pub fn is_coerced(&self) -> bool {
        self.wire_type != self.logical_type
    }
}

/// Reads and writes one field of `T`.
pub(crate) trait FieldOps<T>: Send + Sync {
    fn read(&self, target: &mut T, reader: &mut BinaryReader<'_>, engine: &Engine, info: &FieldInfo) -> Result<()>;
    fn write(&self, source: &T, writer: &mut BinaryWriter, engine: &Engine, info: &FieldInfo) -> Result<()>;
}

/// One compiled entry of a [`Schema`].
pub struct FieldDescriptor<T> {
    info: FieldInfo,
    ops: Box<dyn FieldOps<T>>,
}

impl<T> FieldDescriptor<T> {
    /// The field's description.
    pub fn info(&self) -> &FieldInfo {
        &self.info
    }

    pub(crate) fn read(&self, target: &mut T, reader: &mut BinaryReader<'_>, engine: &Engine) -> Result<()> {
        self.ops
            .read(target, reader, engine, &self.info)
            .map_err(|e| e.in_field(self.info.name))
    }

    pub(crate) fn write(&self, source: &T, writer: &mut BinaryWriter, engine: &Engine) -> Result<()> {
        self.ops
            .write(source, writer, engine, &self.info)
            .map_err(|e| e.in_field(self.info.name))
    }
}

impl<T> core::ops::Deref for FieldDescriptor<T> {
    type Target = FieldInfo;

    fn deref(&self) -> &FieldInfo {
        &self.info
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.info, f)
    }
}

/// The ordered wire fields of a compound type. Immutable once compiled.
pub struct Schema<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    graceful_eof: bool,
}

impl<T: Compound> Schema<T> {
    /// Compiles the schema of `T` from its declarations.
    pub fn compile() -> core::result::Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::new();
        T::describe(&mut builder);
        builder.build()
    }
}

impl<T> Schema<T> {
    /// Name of the compound type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The fields, in wire order.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Finds a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of wire fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the type has no wire fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if reaching the end of the stream between fields stops reading instead of
    /// failing.
    pub fn graceful_eof(&self) -> bool {
        self.graceful_eof
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("graceful_eof", &self.graceful_eof)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Collects the field declarations of a compound type.
pub struct SchemaBuilder<T> {
    fields: Vec<FieldDescriptor<T>>,
    graceful_eof: bool,
    error: Option<SchemaError>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            graceful_eof: false,
            error: None,
        }
    }

    /// Adds a field. Fields may be declared in any order; the wire order comes from each
    /// field's `order`, with ties keeping declaration order.
    pub fn field<D: DeclareField<T>>(&mut self, decl: D) -> &mut Self {
        match decl.declare(type_name::<T>()) {
            Ok(field) => self.fields.push(field),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Includes the wire fields of an embedded base compound, reached through `get`/`get_mut`.
    ///
    /// Base fields keep their own `order` values and are sorted together with the fields of
    /// `T`. They are never included unless this is called.
    pub fn inherit<B: Compound>(&mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> &mut Self {
        let mut base = SchemaBuilder::<B>::new();
        B::describe(&mut base);
        if let Some(e) = base.error {
            self.fail(e);
            return self;
        }
        for field in base.fields {
            self.fields.push(FieldDescriptor {
                info: field.info,
                ops: Box::new(BaseOps {
                    inner: field.ops,
                    get,
                    get_mut,
                }),
            });
        }
        self
    }

    /// Treats the end of the stream before a field as a normal stop. Fields that were not
    /// reached keep their default values.
    pub fn graceful_eof(&mut self) -> &mut Self {
        self.graceful_eof = true;
        self
    }

    fn fail(&mut self, e: SchemaError) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    fn build(mut self) -> core::result::Result<Schema<T>, SchemaError> {
        let type_name = type_name::<T>();
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.info.name) {
                return Err(SchemaError {
                    type_name,
                    field: field.info.name,
                    rule: SchemaRule::DuplicateField,
                });
            }
        }
        // Stable, so equal orders keep declaration order.
        self.fields.sort_by_key(|f| f.info.order);
        Ok(Schema {
            type_name,
            fields: self.fields,
            graceful_eof: self.graceful_eof,
        })
    }
}

/// A field declaration that can be compiled into a [`FieldDescriptor`].
pub trait DeclareField<T> {
    /// Validates the declaration and compiles it.
    fn declare(self, type_name: &'static str) -> core::result::Result<FieldDescriptor<T>, SchemaError>;
}

/// Conversion between a field's logical type `L` and its wire type `W`.
pub trait Conversion<L, W>: 'static {
    /// Converts a decoded wire value into the logical type.
    fn to_logical(wire: W, info: &FieldInfo) -> Result<L>;

    /// Runs `f` with the wire form of `logical`.
    fn with_wire<R>(logical: &L, info: &FieldInfo, f: impl FnOnce(&W) -> Result<R>) -> Result<R>;
}

/// The wire type is the logical type.
pub struct Same;

/// The wire type is converted to and from the logical type with `TryFrom`.
pub struct Converted;

impl<V> Conversion<V, V> for Same {
    fn to_logical(wire: V, _: &FieldInfo) -> Result<V> {
        Ok(wire)
    }

    fn with_wire<R>(logical: &V, _: &FieldInfo, f: impl FnOnce(&V) -> Result<R>) -> Result<R> {
        f(logical)
    }
}

impl<L, W> Conversion<L, W> for Converted
where
    L: TryFrom<W> + Clone + 'static,
    W: TryFrom<L> + 'static,
    <L as TryFrom<W>>::Error: fmt::Display,
    <W as TryFrom<L>>::Error: fmt::Display,
{
    fn to_logical(wire: W, info: &FieldInfo) -> Result<L> {
        L::try_from(wire).map_err(|e| coercion_error::<W, L>(info, e))
    }

    fn with_wire<R>(logical: &L, info: &FieldInfo, f: impl FnOnce(&W) -> Result<R>) -> Result<R> {
        if let Some(wire) = (logical as &dyn Any).downcast_ref::<W>() {
            return f(wire);
        }
        let wire = W::try_from(logical.clone()).map_err(|e| coercion_error::<L, W>(info, e))?;
        f(&wire)
    }
}

/// Converts between `f32` and `f64`.
///
/// Widening is exact. Narrowing rounds to the nearest `f32`; a finite value beyond the `f32`
/// range is a [`CodecError::Coercion`]. Infinities and NaN are carried over.
///
/// ```
/// use binary_schema_io::{Compound, Engine, Field, FloatCast, SchemaBuilder};
///
/// #[derive(Default)]
/// struct Reading {
///     value: f64,
/// }
///
/// impl Compound for Reading {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.field(Field::new(0, "value", |r: &Self| &r.value, |r| &mut r.value).wire_with::<f32, FloatCast>());
///     }
/// }
///
/// let engine = Engine::default();
/// assert_eq!(engine.to_vec(&Reading { value: 1.5 }).unwrap(), 1.5f32.to_le_bytes());
/// assert!(engine.to_vec(&Reading { value: 1e300 }).is_err());
/// ```
pub struct FloatCast;

fn narrow(value: f64, info: &FieldInfo) -> Result<f32> {
    if value.is_finite() && value.abs() > f64::from(f32::MAX) {
        return Err(coercion_error::<f64, f32>(
            info,
            format_args!("{value} is outside the range of f32"),
        ));
    }
    Ok(value as f32)
}

impl Conversion<f64, f32> for FloatCast {
    fn to_logical(wire: f32, _: &FieldInfo) -> Result<f64> {
        Ok(f64::from(wire))
    }

    fn with_wire<R>(logical: &f64, info: &FieldInfo, f: impl FnOnce(&f32) -> Result<R>) -> Result<R> {
        f(&narrow(*logical, info)?)
    }
}

impl Conversion<f32, f64> for FloatCast {
    fn to_logical(wire: f64, info: &FieldInfo) -> Result<f32> {
        narrow(wire, info)
    }

    fn with_wire<R>(logical: &f32, _: &FieldInfo, f: impl FnOnce(&f64) -> Result<R>) -> Result<R> {
        f(&f64::from(*logical))
    }
}

fn coercion_error<S, D>(info: &FieldInfo, e: impl fmt::Display) -> CodecError {
    CodecError::Coercion {
        field: info.name,
        from: type_name::<S>(),
        to: type_name::<D>(),
        reason: e.to_string(),
    }
}

/// The part of a declaration shared by scalars and collections.
#[derive(Clone, Debug)]
struct FieldDecl {
    order: i32,
    name: &'static str,
    entries: Option<usize>,
    prefix: Option<LengthPrefix>,
    attrs: FieldAttrs,
}

impl FieldDecl {
    fn new(order: i32, name: &'static str) -> Self {
        Self {
            order,
            name,
            entries: None,
            prefix: None,
            attrs: FieldAttrs::default(),
        }
    }

    fn error(&self, type_name: &'static str, rule: SchemaRule) -> SchemaError {
        SchemaError {
            type_name,
            field: self.name,
            rule,
        }
    }
}

macro_rules! decl_setters {
    () => {
        /// Declares a fixed element count. Only valid on collections.
        pub fn entries(mut self, count: usize) -> Self {
            self.decl.entries = Some(count);
            self
        }

        /// Declares the encoding of the element count. Only valid on collections.
        pub fn length_prefix(mut self, prefix: LengthPrefix) -> Self {
            self.decl.prefix = Some(prefix);
            self
        }

        /// Sets how string values are delimited.
        pub fn string(mut self, format: StringFormat) -> Self {
            self.decl.attrs.string = format;
            self
        }

        /// Sets the character encoding of string values.
        pub fn encoding(mut self, encoding: TextEncoding) -> Self {
            self.decl.attrs.encoding = encoding;
            self
        }

        /// Sets a free-form attribute for custom codecs.
        pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
            self.decl.attrs.extra.insert(key, value.into());
            self
        }
    };
}

/// Declares a scalar field of `T` with logical type `L`, read and written as `W`.
pub struct Field<T, L, W, M> {
    decl: FieldDecl,
    get: fn(&T) -> &L,
    get_mut: fn(&mut T) -> &mut L,
    _wire: PhantomData<fn() -> (W, M)>,
}

impl<T, L> Field<T, L, L, Same> {
    /// Declares a field at wire position `order`, whose wire type is its logical type.
    pub fn new(order: i32, name: &'static str, get: fn(&T) -> &L, get_mut: fn(&mut T) -> &mut L) -> Self {
        Self {
            decl: FieldDecl::new(order, name),
            get,
            get_mut,
            _wire: PhantomData,
        }
    }
}

impl<T, L, W, M> Field<T, L, W, M> {
    /// Stores the field on the wire as `W2`, converting with `TryFrom` in both directions.
    /// A value that does not fit is a [`CodecError::Coercion`].
    ///
    /// The wire type must be a single value; collections are declared with [`Seq`]:
    ///
    /// ```compile_fail
    /// use binary_schema_io::{Compound, Field, SchemaBuilder};
    ///
    /// #[derive(Default)]
    /// struct Blob {
    ///     data: Vec<u8>,
    /// }
    ///
    /// impl Compound for Blob {
    ///     fn describe(schema: &mut SchemaBuilder<Self>) {
    ///         schema.field(Field::new(0, "data", |b: &Self| &b.data, |b| &mut b.data).wire::<Vec<u8>>());
    ///     }
    /// }
    /// ```
    pub fn wire<W2>(self) -> Field<T, L, W2, Converted> {
        self.wire_with()
    }

    /// Stores the field on the wire as `W2`, converting with `M2`.
    pub fn wire_with<W2, M2>(self) -> Field<T, L, W2, M2> {
        Field {
            decl: self.decl,
            get: self.get,
            get_mut: self.get_mut,
            _wire: PhantomData,
        }
    }

    decl_setters!();
}

impl<T, L, W, M> DeclareField<T> for Field<T, L, W, M>
where
    T: 'static,
    L: 'static,
    W: WireValue,
    M: Conversion<L, W>,
{
    fn declare(self, type_name: &'static str) -> core::result::Result<FieldDescriptor<T>, SchemaError> {
        if self.decl.entries.is_some() || self.decl.prefix.is_some() {
            return Err(self.decl.error(type_name, SchemaRule::LengthOnScalar));
        }
        Ok(FieldDescriptor {
            info: FieldInfo {
                order: self.decl.order,
                name: self.decl.name,
                wire_type: core::any::type_name::<W>(),
                logical_type: core::any::type_name::<L>(),
                container_type: None,
                collection: CollectionKind::None,
                length: None,
                attrs: self.decl.attrs,
            },
            ops: Box::new(ScalarOps::<T, L, W, M> {
                get: self.get,
                get_mut: self.get_mut,
                _wire: PhantomData,
            }),
        })
    }
}

/// Declares a collection field of `T` held in container `C`, whose elements are read and
/// written as `W`.
pub struct Seq<T, C, W, M> {
    decl: FieldDecl,
    get: fn(&T) -> &C,
    get_mut: fn(&mut T) -> &mut C,
    _wire: PhantomData<fn() -> (W, M)>,
}

impl<T, C: WireCollection> Seq<T, C, C::Item, Same> {
    /// Declares a collection at wire position `order`. Exactly one of [`Seq::entries`] and
    /// [`Seq::length_prefix`] must be set.
    pub fn new(order: i32, name: &'static str, get: fn(&T) -> &C, get_mut: fn(&mut T) -> &mut C) -> Self {
        Self {
            decl: FieldDecl::new(order, name),
            get,
            get_mut,
            _wire: PhantomData,
        }
    }
}

impl<T, C, W, M> Seq<T, C, W, M> {
    /// Stores each element on the wire as `W2`, converting with `TryFrom` in both directions.
    pub fn wire<W2>(self) -> Seq<T, C, W2, Converted> {
        self.wire_with()
    }

    /// Stores each element on the wire as `W2`, converting with `M2`.
    pub fn wire_with<W2, M2>(self) -> Seq<T, C, W2, M2> {
        Seq {
            decl: self.decl,
            get: self.get,
            get_mut: self.get_mut,
            _wire: PhantomData,
        }
    }

    decl_setters!();
}

impl<T, C, W, M> DeclareField<T> for Seq<T, C, W, M>
where
    T: 'static,
    C: WireCollection,
    W: WireValue,
    M: Conversion<C::Item, W>,
{
    fn declare(self, type_name: &'static str) -> core::result::Result<FieldDescriptor<T>, SchemaError> {
        let length = match (self.decl.entries, self.decl.prefix) {
            (Some(_), Some(_)) => return Err(self.decl.error(type_name, SchemaRule::ConflictingLength)),
            (None, None) => return Err(self.decl.error(type_name, SchemaRule::MissingLength)),
            (Some(0), None) => return Err(self.decl.error(type_name, SchemaRule::ZeroEntries)),
            (Some(n), None) => LengthPolicy::Entries(n),
            (None, Some(prefix)) => LengthPolicy::Prefixed(prefix),
        };
        Ok(FieldDescriptor {
            info: FieldInfo {
                order: self.decl.order,
                name: self.decl.name,
                wire_type: core::any::type_name::<W>(),
                logical_type: core::any::type_name::<C::Item>(),
                container_type: Some(core::any::type_name::<C>()),
                collection: C::KIND,
                length: Some(length),
                attrs: self.decl.attrs,
            },
            ops: Box::new(SeqOps::<T, C, W, M> {
                get: self.get,
                get_mut: self.get_mut,
                length,
                _wire: PhantomData,
            }),
        })
    }
}

struct ScalarOps<T, L, W, M> {
    get: fn(&T) -> &L,
    get_mut: fn(&mut T) -> &mut L,
    _wire: PhantomData<fn() -> (W, M)>,
}

impl<T, L, W, M> FieldOps<T> for ScalarOps<T, L, W, M>
where
    W: WireValue,
    M: Conversion<L, W>,
{
    fn read(&self, target: &mut T, reader: &mut BinaryReader<'_>, engine: &Engine, info: &FieldInfo) -> Result<()> {
        let codec = engine.registry().codec_for::<W>()?;
        let mut wire = codec.read(&mut ParseTask::new(reader, engine, info))?;
        wire.after_decode()?;
        *(self.get_mut)(target) = M::to_logical(wire, info)?;
        Ok(())
    }

    fn write(&self, source: &T, writer: &mut BinaryWriter, engine: &Engine, info: &FieldInfo) -> Result<()> {
        let codec = engine.registry().codec_for::<W>()?;
        M::with_wire((self.get)(source), info, |wire| {
            codec.write(wire, &mut WriteTask::new(writer, engine, info))
        })
    }
}

struct SeqOps<T, C, W, M> {
    get: fn(&T) -> &C,
    get_mut: fn(&mut T) -> &mut C,
    length: LengthPolicy,
    _wire: PhantomData<fn() -> (W, M)>,
}

impl<T, C, W, M> FieldOps<T> for SeqOps<T, C, W, M>
where
    C: WireCollection,
    W: WireValue,
    M: Conversion<C::Item, W>,
{
    fn read(&self, target: &mut T, reader: &mut BinaryReader<'_>, engine: &Engine, info: &FieldInfo) -> Result<()> {
        let codec = engine.registry().codec_for::<W>()?;
        let count = match self.length {
            LengthPolicy::Entries(n) => n,
            LengthPolicy::Prefixed(prefix) => reader.read_length(prefix)?,
        };
        // A corrupt count must not turn into a huge allocation.
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        let mut task = ParseTask::new(reader, engine, info);
        for _ in 0..count {
            if task.reader().is_eof() {
                return Err(task.reader().truncated(1));
            }
            let mut wire = codec.read(&mut task)?;
            wire.after_decode()?;
            items.push(M::to_logical(wire, info)?);
        }
        *(self.get_mut)(target) = C::from_items(items);
        Ok(())
    }

    fn write(&self, source: &T, writer: &mut BinaryWriter, engine: &Engine, info: &FieldInfo) -> Result<()> {
        let codec = engine.registry().codec_for::<W>()?;
        let items = (self.get)(source).items();
        match self.length {
            LengthPolicy::Entries(declared) if declared != items.len() => {
                return Err(CodecError::serialization(
                    info.name,
                    SerializationFault::EntriesMismatch {
                        declared,
                        actual: items.len(),
                    },
                ));
            }
            LengthPolicy::Entries(_) => {}
            LengthPolicy::Prefixed(prefix) => writer.write_length(prefix, items.len())?,
        }
        let mut task = WriteTask::new(writer, engine, info);
        for item in items {
            M::with_wire(item, info, |wire| codec.write(wire, &mut task))?;
        }
        Ok(())
    }
}

struct BaseOps<T, B> {
    inner: Box<dyn FieldOps<B>>,
    get: fn(&T) -> &B,
    get_mut: fn(&mut T) -> &mut B,
}

impl<T, B> FieldOps<T> for BaseOps<T, B> {
    fn read(&self, target: &mut T, reader: &mut BinaryReader<'_>, engine: &Engine, info: &FieldInfo) -> Result<()> {
        self.inner.read((self.get_mut)(target), reader, engine, info)
    }

    fn write(&self, source: &T, writer: &mut BinaryWriter, engine: &Engine, info: &FieldInfo) -> Result<()> {
        self.inner.write((self.get)(source), writer, engine, info)
    }
}
