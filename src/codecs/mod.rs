//! Built-in codecs.

mod digest;
mod enumeration;
mod primitive;
mod string;
#[cfg(feature = "chrono")]
mod timestamp;
mod version;

pub use digest::{Digest, Digest128, Digest160, Digest256, Digest384, Digest512, DigestCodec};
pub use enumeration::{EnumCodec, WireEnum};
pub use primitive::PrimitiveCodec;
pub use string::StringCodec;
#[cfg(feature = "chrono")]
pub use timestamp::TimestampCodec;
pub use version::{ParseVersionError, Version, VersionCodec};

use crate::registry::Registry;

/// Registers the string, version, digest and timestamp codecs.
pub(crate) fn install_builtins(registry: &Registry) {
    registry.install(&StringCodec).install(&VersionCodec).install(&DigestCodec);
    #[cfg(feature = "chrono")]
    registry.install(&TimestampCodec);
}
