//! String codec with write-time encoding selection.
//!
//! The header is a varuint carrying `(byte_len << 2) | encoding`. With
//! string compression enabled, Latin-1 is chosen when every codepoint fits
//! one byte and UTF-16LE when astral codepoints make it competitive;
//! otherwise UTF-8.

use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{read_type_id, write_type_id, ForyDefault, Serializer};
use crate::types;

pub mod string_flags {
    pub const LATIN1: u32 = 0;
    pub const UTF8: u32 = 1;
    pub const UTF16_LE: u32 = 2;
}

pub(crate) fn write_string_body(context: &mut WriteContext, s: &str) {
    use string_flags::*;
    let (encoding, byte_len) = if context.fory().is_compress_string() {
        if s.chars().all(|c| (c as u32) <= 0xFF) {
            (LATIN1, s.chars().count())
        } else if s.chars().any(|c| (c as u32) > 0xFFFF) {
            (UTF16_LE, s.encode_utf16().count() * 2)
        } else {
            (UTF8, s.len())
        }
    } else {
        (UTF8, s.len())
    };
    context.writer.var_uint32(((byte_len as u32) << 2) | encoding);
    match encoding {
        LATIN1 => context.writer.latin1(s),
        UTF8 => context.writer.bytes(s.as_bytes()),
        _ => context.writer.utf16_le(s),
    }
}

pub(crate) fn read_string_body(context: &mut ReadContext) -> Result<String> {
    use string_flags::*;
    let header = context.reader.var_uint32();
    context.reader.check()?;
    let byte_len = (header >> 2) as usize;
    context.check_string_bytes(byte_len)?;
    let s = match header & 3 {
        LATIN1 => context.reader.latin1(byte_len),
        UTF8 => {
            let raw = context.reader.bytes(byte_len);
            context.reader.check()?;
            std::str::from_utf8(raw)
                .map_err(|_| Error::deserialization("string bytes are not valid UTF-8"))?
                .to_string()
        }
        UTF16_LE => context.reader.utf16_le(byte_len),
        other => {
            return Err(Error::deserialization(format!(
                "unknown string encoding {other}"
            )))
        }
    };
    context.reader.check()?;
    Ok(s)
}

impl ForyDefault for String {
    fn fory_default() -> Self {
        String::new()
    }
}

impl Serializer for String {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::STRING
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        write_string_body(context, self);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::STRING);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        read_string_body(context)
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::STRING)
    }

    fn fory_reserved_space() -> usize {
        16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Reader, Writer};

    fn encode(fory: &Fory, s: &str) -> Vec<u8> {
        let mut writer = Writer::new();
        let mut context = WriteContext::new(fory, &mut writer);
        write_string_body(&mut context, s);
        writer.dump()
    }

    #[test]
    fn plain_profile_always_writes_utf8() {
        let fory = Fory::default();
        let data = encode(&fory, "café");
        // Header carries the UTF-8 byte length, not the char count.
        assert_eq!(data[0], (5 << 2) | string_flags::UTF8 as u8);
        assert_eq!(&data[1..], "café".as_bytes());
    }

    #[test]
    fn compressed_profile_selects_by_charset() {
        let fory = Fory::default().compress_string(true);
        let latin = encode(&fory, "café");
        assert_eq!(latin[0] & 3, string_flags::LATIN1 as u8);
        assert_eq!(latin.len(), 1 + 4);

        let plain = encode(&fory, "日本語");
        assert_eq!(plain[0] & 3, string_flags::UTF8 as u8);

        let astral = encode(&fory, "𝄞");
        assert_eq!(astral[0] & 3, string_flags::UTF16_LE as u8);
        // One surrogate pair.
        assert_eq!(astral.len(), 1 + 4);
    }

    #[test]
    fn all_encodings_decode() {
        let fory = Fory::default().compress_string(true);
        for s in ["", "plain", "café", "日本語", "astral 𝄞 mix"] {
            let data = encode(&fory, s);
            let mut context = ReadContext::new(&fory, Reader::new(&data));
            assert_eq!(read_string_body(&mut context).unwrap(), s, "{s}");
        }
    }
}
