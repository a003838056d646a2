use crate::codec::{Codec, ParseTask, WireValue, WriteTask};
use crate::error::Result;
use crate::registry::{CodecSet, Registry};
use core::fmt;
use core::str::FromStr;
use thiserror::Error;

/// A four-part version number, `major.minor.build.revision`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Version {
    /// Major component.
    pub major: i32,
    /// Minor component.
    pub minor: i32,
    /// Build component.
    pub build: i32,
    /// Revision component.
    pub revision: i32,
}

impl Version {
    /// Constructor
    pub const fn new(major: i32, minor: i32, build: i32, revision: i32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.build, self.revision)
    }
}

/// Error returned when parsing a [`Version`] from text.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid version `{0}`: expected four dot-separated integers")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let mut parts = [0i32; 4];
        let mut split = s.split('.');
        for part in parts.iter_mut() {
            *part = split
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| ParseVersionError(s.to_owned()))?;
        }
        if split.next().is_some() {
            return Err(ParseVersionError(s.to_owned()));
        }
        let [major, minor, build, revision] = parts;
        Ok(Self::new(major, minor, build, revision))
    }
}

/// Reads and writes a [`Version`] as four `i32`s: major, minor, build, revision.
#[derive(Copy, Clone, Debug, Default)]
pub struct VersionCodec;

impl Codec<Version> for VersionCodec {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<Version> {
        let r = task.reader();
        Ok(Version {
            major: r.read_i32()?,
            minor: r.read_i32()?,
            build: r.read_i32()?,
            revision: r.read_i32()?,
        })
    }

    fn write(&self, value: &Version, task: &mut WriteTask<'_>) -> Result<()> {
        let w = task.writer();
        w.write_i32(value.major);
        w.write_i32(value.minor);
        w.write_i32(value.build);
        w.write_i32(value.revision);
        Ok(())
    }
}

impl CodecSet for VersionCodec {
    fn install(&self, registry: &Registry) {
        registry.register::<Version, _>(*self);
    }
}

impl WireValue for Version {}
