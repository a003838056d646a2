use crate::codec::{Codec, ParseTask, WireValue, WriteTask};
use crate::error::Result;
use crate::registry::{CodecSet, Registry};

/// Reads and writes `String` fields.
///
/// The wire shape comes from the field's attributes: [`StringFormat`](crate::StringFormat)
/// selects a length prefix (counting encoded bytes) or a zero terminator, and
/// [`TextEncoding`](crate::TextEncoding) selects ASCII, UTF-8 or UTF-16.
#[derive(Copy, Clone, Debug, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn read(&self, task: &mut ParseTask<'_, '_>) -> Result<String> {
        let attrs = task.attrs();
        task.reader().read_string(attrs.string_format(), attrs.encoding())
    }

    fn write(&self, value: &String, task: &mut WriteTask<'_>) -> Result<()> {
        let attrs = task.attrs();
        task.writer().write_string(value, attrs.string_format(), attrs.encoding())
    }
}

impl CodecSet for StringCodec {
    fn install(&self, registry: &Registry) {
        registry.register::<String, _>(*self);
    }
}

impl WireValue for String {}
