//! Per-stream interning of namespace and type-name bytes.
//!
//! First appearance: varuint `(byte_len << 1)`, one encoding byte, then the
//! encoded bytes. Later appearances: varuint `(index << 1) | 1` referencing
//! the dictionary, which both peers rebuild in first-mention order.

use std::collections::HashMap;

use crate::buffer::{Reader, Writer};
use crate::error::{Error, Result};
use crate::meta::{MetaString, MetaStringEncoder, MetaStringEncoding};

#[derive(Default)]
pub struct MetaStringWriterResolver {
    index: HashMap<(MetaStringEncoding, Vec<u8>), u32>,
}

impl MetaStringWriterResolver {
    pub fn write(&mut self, writer: &mut Writer, ms: &MetaString) {
        let key = (ms.encoding, ms.bytes.clone());
        if let Some(&idx) = self.index.get(&key) {
            writer.var_uint32((idx << 1) | 1);
            return;
        }
        let idx = self.index.len() as u32;
        self.index.insert(key, idx);
        writer.var_uint32((ms.bytes.len() as u32) << 1);
        writer.u8(ms.encoding as u8);
        writer.bytes(&ms.bytes);
    }
}

#[derive(Default)]
pub struct MetaStringReaderResolver {
    entries: Vec<MetaString>,
}

impl MetaStringReaderResolver {
    pub fn read(&mut self, reader: &mut Reader) -> Result<MetaString> {
        let header = reader.var_uint32();
        reader.check()?;
        if header & 1 != 0 {
            let idx = (header >> 1) as usize;
            return self
                .entries
                .get(idx)
                .cloned()
                .ok_or_else(|| Error::deserialization(format!("meta string index {idx} unknown")));
        }
        let len = (header >> 1) as usize;
        let encoding = MetaStringEncoding::from_byte(reader.u8())?;
        let bytes = reader.bytes(len).to_vec();
        reader.check()?;
        let ms = MetaStringEncoder.decode(&bytes, encoding)?;
        self.entries.push(ms.clone());
        Ok(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_mention_is_a_back_index() {
        let encoder = MetaStringEncoder;
        let ns = encoder.encode("org.example");
        let name = encoder.encode("order");

        let mut resolver = MetaStringWriterResolver::default();
        let mut writer = Writer::new();
        resolver.write(&mut writer, &ns);
        resolver.write(&mut writer, &name);
        let full_len = writer.len();
        resolver.write(&mut writer, &ns);
        // Back reference is a single varuint: (0 << 1) | 1.
        assert_eq!(writer.len(), full_len + 1);

        let data = writer.dump();
        let mut reader = Reader::new(&data);
        let mut read_resolver = MetaStringReaderResolver::default();
        assert_eq!(read_resolver.read(&mut reader).unwrap().original, "org.example");
        assert_eq!(read_resolver.read(&mut reader).unwrap().original, "order");
        assert_eq!(read_resolver.read(&mut reader).unwrap().original, "org.example");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn unknown_index_is_an_error() {
        let mut writer = Writer::new();
        writer.var_uint32((3 << 1) | 1);
        let data = writer.dump();
        let mut reader = Reader::new(&data);
        let mut resolver = MetaStringReaderResolver::default();
        assert!(resolver.read(&mut reader).is_err());
    }
}
