//! Drives compiled schemas against a stream.

use crate::codec::{Codec, Compound, WireValue};
use crate::error::{Result, SchemaError};
use crate::reader::BinaryReader;
use crate::registry::Registry;
use crate::schema::Schema;
use crate::writer::BinaryWriter;
use core::any::{type_name, Any, TypeId};
use dashmap::DashMap;
use std::sync::Arc;

/// Reads and writes compound values field by field, in schema order.
///
/// An engine owns a [`Registry`] and a cache of compiled schemas. It is `Send + Sync`; share one
/// engine (for example in an `Arc`) rather than building one per call, so each schema is
/// compiled only once.
pub struct Engine {
    registry: Registry,
    schemas: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    max_depth: usize,
}

impl Default for Engine {
    /// An engine with the built-in codecs.
    fn default() -> Self {
        Self::new(Registry::with_builtins())
    }
}

impl Engine {
    /// Nesting limit used by [`Engine::new`].
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// Creates an engine that resolves codecs through `registry`.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            schemas: DashMap::new(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how deeply compound values may nest inside each other when reading. Input that nests
    /// deeper is rejected as [`CodecError::Malformed`](crate::CodecError::Malformed).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The nesting limit for reads.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The codec registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers `codec` for `V`, replacing any earlier codec for `V`.
    pub fn register_codec<V: WireValue, C: Codec<V>>(&self, codec: C) -> bool {
        self.registry.register::<V, C>(codec)
    }

    /// Returns the compiled schema of `T`, compiling and caching it on first use.
    ///
    /// If several threads compile the same schema at once, they all do the work but only the
    /// first result is kept; every caller gets that one.
    pub fn schema_of<T: Compound>(&self) -> core::result::Result<Arc<Schema<T>>, SchemaError> {
        let id = TypeId::of::<T>();
        let cached = self.schemas.get(&id).map(|e| Arc::clone(e.value()));
        if let Some(schema) = cached.and_then(|s| s.downcast::<Schema<T>>().ok()) {
            return Ok(schema);
        }

        let compiled = Arc::new(Schema::<T>::compile()?);
        log::debug!(
            "compiled wire schema for `{}`: {} fields",
            type_name::<T>(),
            compiled.len()
        );
        let winner = Arc::clone(
            self.schemas
                .entry(id)
                .or_insert_with(|| Arc::clone(&compiled) as Arc<dyn Any + Send + Sync>)
                .value(),
        );
        Ok(winner.downcast::<Schema<T>>().unwrap_or(compiled))
    }

    /// Creates a default `T` and populates it from `reader`.
    pub fn create<T: Compound>(&self, reader: &mut BinaryReader<'_>) -> Result<T> {
        let mut value = T::default();
        self.populate(&mut value, reader)?;
        Ok(value)
    }

    /// Reads every schema field of `instance` from `reader`, in order, then runs its
    /// [`Compound::after_read`] hook.
    ///
    /// On failure `instance` may have been partly updated.
    pub fn populate<'v, T: Compound>(&self, instance: &'v mut T, reader: &mut BinaryReader<'_>) -> Result<&'v mut T> {
        self.read_fields(instance, reader)?;
        instance.after_read()?;
        Ok(instance)
    }

    /// Runs the [`Compound::before_write`] hook of `value`, then writes every schema field in
    /// order.
    pub fn write<T: Compound>(&self, value: &T, writer: &mut BinaryWriter) -> Result<()> {
        value.before_write()?;
        let schema = self.schema_of::<T>()?;
        for field in schema.fields() {
            field.write(value, writer, self)?;
        }
        Ok(())
    }

    /// Writes `value` into a new little-endian buffer.
    pub fn to_vec<T: Compound>(&self, value: &T) -> Result<Vec<u8>> {
        let mut writer = BinaryWriter::new();
        self.write(value, &mut writer)?;
        Ok(writer.into_inner())
    }

    /// Creates a `T` from little-endian `bytes`. Trailing bytes are ignored.
    pub fn from_slice<T: Compound>(&self, bytes: &[u8]) -> Result<T> {
        self.create(&mut BinaryReader::new(bytes))
    }

    /// Reads a nested compound value. Its `after_read` hook runs when the caller hands the value
    /// to [`WireValue::after_decode`].
    pub(crate) fn read_nested<T: Compound>(&self, reader: &mut BinaryReader<'_>) -> Result<T> {
        if reader.depth >= self.max_depth {
            return Err(reader.malformed(
                reader.position(),
                format!("`{}` is nested more than {} levels deep", type_name::<T>(), self.max_depth),
            ));
        }
        reader.depth += 1;
        let mut value = T::default();
        let result = self.read_fields(&mut value, reader);
        reader.depth -= 1;
        result.map(|()| value)
    }

    fn read_fields<T: Compound>(&self, target: &mut T, reader: &mut BinaryReader<'_>) -> Result<()> {
        let schema = self.schema_of::<T>()?;
        for field in schema.fields() {
            if schema.graceful_eof() && reader.is_eof() {
                log::trace!(
                    "`{}`: end of stream before field `{}`, keeping defaults",
                    schema.type_name(),
                    field.name()
                );
                break;
            }
            field.read(target, reader, self)?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("cached_schemas", &self.schemas.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
