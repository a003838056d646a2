//! Maps logical types to the codecs that read and write them.

use crate::codec::{Codec, WireValue};
use crate::error::{CodecError, Result};
use core::any::{type_name, Any, TypeId};
use core::fmt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A codec implementation that supports one or more logical types.
///
/// Installing a set registers the codec for every type it supports.
pub trait CodecSet {
    /// Registers this codec for each of its logical types.
    fn install(&self, registry: &Registry);
}

struct Entry {
    type_name: &'static str,
    codec_name: &'static str,
    /// Holds an `Arc<dyn Codec<V>>` for the type the entry is keyed by.
    codec: Box<dyn Any + Send + Sync>,
}

/// A summary of one registered codec.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Registration {
    /// The logical type.
    pub type_name: &'static str,
    /// The codec handling it.
    pub codec_name: &'static str,
}

/// Type-to-codec registry.
///
/// Codecs are normally registered once, before the registry is handed to an
/// [`Engine`](crate::Engine). Registering a type that already has a codec replaces the old codec
/// and logs a warning; this is how applications override a built-in representation.
///
/// Lookups resolve in this order:
/// 1. a codec registered for the exact type;
/// 2. the type's own fallback, from [`WireValue::default_codec`]: nested compound types recurse
///    into the engine and primitives use the primitive codec;
/// 3. otherwise [`CodecError::CodecNotFound`].
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl Registry {
    /// Creates an empty registry. Primitives and compound types still resolve through their
    /// fallback codecs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in string, version, digest and (with the `chrono`
    /// feature) timestamp codecs.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::codecs::install_builtins(&registry);
        registry
    }

    /// Registers `codec` for `V`. Returns `true` if it replaced an earlier registration.
    pub fn register<V: WireValue, C: Codec<V>>(&self, codec: C) -> bool {
        self.register_shared::<V>(Arc::new(codec))
    }

    /// Registers an already-shared codec for `V`. Returns `true` if it replaced an earlier
    /// registration.
    pub fn register_shared<V: WireValue>(&self, codec: Arc<dyn Codec<V>>) -> bool {
        let codec_name = codec.name();
        let entry = Entry {
            type_name: type_name::<V>(),
            codec_name,
            codec: Box::new(codec),
        };
        let replaced = self.entries.write().insert(TypeId::of::<V>(), entry);
        match replaced {
            Some(old) => {
                log::warn!(
                    "codec for `{}` replaced: `{}` is now `{}`",
                    old.type_name,
                    old.codec_name,
                    codec_name
                );
                true
            }
            None => {
                log::trace!("registered codec for `{}`", type_name::<V>());
                false
            }
        }
    }

    /// Installs every type of a codec set.
    pub fn install<S: CodecSet>(&self, set: &S) -> &Self {
        set.install(self);
        self
    }

    /// Finds the codec for `V`.
    pub fn codec_for<V: WireValue>(&self) -> Result<Arc<dyn Codec<V>>> {
        if let Some(entry) = self.entries.read().get(&TypeId::of::<V>()) {
            if let Some(codec) = entry.codec.downcast_ref::<Arc<dyn Codec<V>>>() {
                return Ok(Arc::clone(codec));
            }
        }
        V::default_codec().ok_or(CodecError::CodecNotFound {
            type_name: type_name::<V>(),
        })
    }

    /// Returns `true` if a codec is registered for `V`. Fallback codecs are not counted.
    pub fn contains<V: 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<V>())
    }

    /// Name of the codec registered for `V`, if any.
    pub fn codec_name<V: 'static>(&self) -> Option<&'static str> {
        self.entries.read().get(&TypeId::of::<V>()).map(|e| e.codec_name)
    }

    /// Lists the registered codecs, sorted by type name.
    pub fn registrations(&self) -> Vec<Registration> {
        let mut list: Vec<Registration> = self
            .entries
            .read()
            .values()
            .map(|e| Registration {
                type_name: e.type_name,
                codec_name: e.codec_name,
            })
            .collect();
        list.sort();
        list
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.registrations()).finish()
    }
}
