use crate::codec::{Codec, ParseTask, WireValue, WriteTask};
use crate::error::{CodecError, Result};
use crate::registry::{CodecSet, Registry};
use chrono::{DateTime, Local, TimeZone, Utc};

/// Reads and writes timestamps as a signed 64-bit count of seconds since the Unix epoch (UTC).
///
/// Local timestamps are converted from and to UTC at the codec boundary. Sub-second precision
/// is not stored.
#[derive(Copy, Clone, Debug, Default)]
pub struct TimestampCodec;

fn read_utc(task: &mut ParseTask<'_, '_>) -> Result<DateTime<Utc>> {
    let secs = task.reader().read_i64()?;
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| CodecError::Coercion {
        field: task.field().name(),
        from: "i64",
        to: core::any::type_name::<DateTime<Utc>>(),
        reason: format!("{secs} seconds since the epoch is out of range"),
    })
}

impl Codec<DateTime<Utc>> for TimestampCodec {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<DateTime<Utc>> {
        read_utc(task)
    }

    fn write(&self, value: &DateTime<Utc>, task: &mut WriteTask<'_>) -> Result<()> {
        task.writer().write_i64(value.timestamp());
        Ok(())
    }
}

impl Codec<DateTime<Local>> for TimestampCodec {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<DateTime<Local>> {
        Ok(Local.from_utc_datetime(&read_utc(task)?.naive_utc()))
    }

    fn write(&self, value: &DateTime<Local>, task: &mut WriteTask<'_>) -> Result<()> {
        task.writer().write_i64(value.timestamp());
        Ok(())
    }
}

impl CodecSet for TimestampCodec {
    fn install(&self, registry: &Registry) {
        registry.register::<DateTime<Local>, _>(*self);
        registry.register::<DateTime<Utc>, _>(*self);
    }
}

impl WireValue for DateTime<Local> {}

impl WireValue for DateTime<Utc> {}
