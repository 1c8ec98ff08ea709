//! Schema descriptors transmitted inline in compatible mode.
//!
//! A `TypeDef` lists the fields of a struct in the writer's deterministic
//! emission order; the reader matches them against its local shape and skips
//! what it does not know. The descriptor's 64-bit hash identifies it inside
//! the per-stream meta-share dictionary.

use crate::buffer::{Reader, Writer};
use crate::error::{Error, Result};
use crate::meta::meta_string::{MetaString, MetaStringEncoding};
use crate::meta::murmur3::murmur3_x64_128;
use crate::meta::TYPE_DEF_HASH_SEED;
use crate::types;

/// A declared value type: its type id plus generic parameters for
/// containers and union arms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub type_id: u32,
    pub generics: Vec<FieldType>,
}

impl FieldType {
    pub fn new(type_id: u32) -> FieldType {
        FieldType {
            type_id,
            generics: Vec::new(),
        }
    }

    pub fn with_generics(type_id: u32, generics: Vec<FieldType>) -> FieldType {
        FieldType { type_id, generics }
    }

    fn write(&self, writer: &mut Writer) {
        writer.var_uint32(self.type_id);
        match self.type_id {
            types::LIST | types::SET => {
                self.generics[0].write(writer);
            }
            types::MAP => {
                self.generics[0].write(writer);
                self.generics[1].write(writer);
            }
            types::UNION | types::TYPED_UNION | types::NAMED_UNION => {
                writer.var_uint32(self.generics.len() as u32);
                for g in &self.generics {
                    g.write(writer);
                }
            }
            _ => {}
        }
    }

    fn read(reader: &mut Reader) -> Result<FieldType> {
        let type_id = reader.var_uint32();
        reader.check()?;
        let generics = match type_id {
            types::LIST | types::SET => vec![FieldType::read(reader)?],
            types::MAP => vec![FieldType::read(reader)?, FieldType::read(reader)?],
            types::UNION | types::TYPED_UNION | types::NAMED_UNION => {
                let n = reader.var_uint32() as usize;
                reader.check()?;
                if n > 256 {
                    return Err(Error::deserialization("union arity out of range"));
                }
                let mut arms = Vec::with_capacity(n);
                for _ in 0..n {
                    arms.push(FieldType::read(reader)?);
                }
                arms
            }
            _ => Vec::new(),
        };
        Ok(FieldType { type_id, generics })
    }
}

const FIELD_NULLABLE: u8 = 1 << 0;
const FIELD_TRACKING_REF: u8 = 1 << 1;
const FIELD_HAS_TAG_ID: u8 = 1 << 2;

/// One field of a remote or local schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    /// Explicit tag id, `-1` when unset; matching prefers tags over names.
    pub tag_id: i32,
    pub field_type: FieldType,
    pub nullable: bool,
    pub tracking_ref: bool,
}

impl FieldDef {
    fn write(&self, writer: &mut Writer) {
        let mut flags = 0u8;
        if self.nullable {
            flags |= FIELD_NULLABLE;
        }
        if self.tracking_ref {
            flags |= FIELD_TRACKING_REF;
        }
        if self.tag_id >= 0 {
            flags |= FIELD_HAS_TAG_ID;
        }
        writer.u8(flags);
        if self.tag_id >= 0 {
            writer.var_int32(self.tag_id);
        }
        writer.write_length(self.name.len());
        writer.bytes(self.name.as_bytes());
        self.field_type.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<FieldDef> {
        let flags = reader.u8();
        let tag_id = if flags & FIELD_HAS_TAG_ID != 0 {
            reader.var_int32()
        } else {
            -1
        };
        let name_len = reader.read_length();
        reader.check()?;
        let name = std::str::from_utf8(reader.bytes(name_len))
            .map_err(|_| Error::deserialization("field name is not valid UTF-8"))?
            .to_string();
        let field_type = FieldType::read(reader)?;
        Ok(FieldDef {
            name,
            tag_id,
            field_type,
            nullable: flags & FIELD_NULLABLE != 0,
            tracking_ref: flags & FIELD_TRACKING_REF != 0,
        })
    }
}

/// Ordered schema descriptor for one struct type, plus its stable hash and
/// the pre-encoded bytes used for inline transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Registered wire id; unused when registered by name.
    pub type_id: u32,
    pub register_by_name: bool,
    pub namespace: MetaString,
    pub type_name: MetaString,
    /// Fields in the writer's deterministic emission order.
    pub fields: Vec<FieldDef>,
    pub hash: u64,
    pub encoded: Vec<u8>,
}

fn write_meta_string_inline(writer: &mut Writer, ms: &MetaString) {
    writer.u8(ms.encoding as u8);
    writer.write_length(ms.bytes.len());
    writer.bytes(&ms.bytes);
}

fn read_meta_string_inline(reader: &mut Reader) -> Result<MetaString> {
    let encoding = MetaStringEncoding::from_byte(reader.u8())?;
    let len = reader.read_length();
    reader.check()?;
    let bytes = reader.bytes(len).to_vec();
    reader.check()?;
    crate::meta::meta_string::MetaStringEncoder.decode(&bytes, encoding)
}

impl TypeDef {
    pub fn new(
        type_id: u32,
        register_by_name: bool,
        namespace: MetaString,
        type_name: MetaString,
        fields: Vec<FieldDef>,
    ) -> TypeDef {
        let mut body = Writer::new();
        body.var_uint32(((fields.len() as u32) << 1) | register_by_name as u32);
        if register_by_name {
            write_meta_string_inline(&mut body, &namespace);
            write_meta_string_inline(&mut body, &type_name);
        } else {
            body.var_uint32(type_id);
        }
        for field in &fields {
            field.write(&mut body);
        }
        let body = body.dump();
        let (hash, _) = murmur3_x64_128(&body, TYPE_DEF_HASH_SEED);
        let mut encoded = Vec::with_capacity(8 + body.len());
        encoded.extend_from_slice(&hash.to_le_bytes());
        encoded.extend_from_slice(&body);
        TypeDef {
            type_id,
            register_by_name,
            namespace,
            type_name,
            fields,
            hash,
            encoded,
        }
    }

    /// Parses one length-prefixed descriptor from the stream.
    pub fn read(reader: &mut Reader) -> Result<TypeDef> {
        let len = reader.read_length();
        reader.check()?;
        let encoded = reader.bytes(len).to_vec();
        reader.check()?;
        if encoded.len() < 9 {
            return Err(Error::deserialization("truncated type def"));
        }
        let hash = u64::from_le_bytes(encoded[..8].try_into().unwrap());
        let body = &encoded[8..];
        let (expected, _) = murmur3_x64_128(body, TYPE_DEF_HASH_SEED);
        if expected != hash {
            return Err(Error::deserialization("type def hash mismatch"));
        }

        let mut inner = Reader::new(body);
        let meta = inner.var_uint32();
        inner.check()?;
        let register_by_name = meta & 1 != 0;
        let num_fields = (meta >> 1) as usize;
        let (type_id, namespace, type_name) = if register_by_name {
            let ns = read_meta_string_inline(&mut inner)?;
            let name = read_meta_string_inline(&mut inner)?;
            (0, ns, name)
        } else {
            let id = inner.var_uint32();
            inner.check()?;
            (id, MetaString::empty(), MetaString::empty())
        };
        let mut fields = Vec::with_capacity(num_fields.min(1024));
        for _ in 0..num_fields {
            fields.push(FieldDef::read(&mut inner)?);
        }
        inner.check()?;
        Ok(TypeDef {
            type_id,
            register_by_name,
            namespace,
            type_name,
            fields,
            hash,
            encoded,
        })
    }

    /// Appends the length-prefixed descriptor bytes.
    pub fn write(&self, writer: &mut Writer) {
        writer.write_length(self.encoded.len());
        writer.bytes(&self.encoded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::meta_string::MetaStringEncoder;

    fn sample_fields() -> Vec<FieldDef> {
        vec![
            FieldDef {
                name: "ratio".to_string(),
                tag_id: -1,
                field_type: FieldType::new(types::FLOAT64),
                nullable: false,
                tracking_ref: false,
            },
            FieldDef {
                name: "id".to_string(),
                tag_id: 7,
                field_type: FieldType::new(types::INT32),
                nullable: false,
                tracking_ref: false,
            },
            FieldDef {
                name: "tags".to_string(),
                tag_id: -1,
                field_type: FieldType::with_generics(
                    types::LIST,
                    vec![FieldType::new(types::STRING)],
                ),
                nullable: true,
                tracking_ref: false,
            },
        ]
    }

    #[test]
    fn round_trip_by_id() {
        let def = TypeDef::new(
            100,
            false,
            MetaString::empty(),
            MetaString::empty(),
            sample_fields(),
        );
        let mut writer = Writer::new();
        def.write(&mut writer);
        let data = writer.dump();
        let mut reader = Reader::new(&data);
        let parsed = TypeDef::read(&mut reader).unwrap();
        assert_eq!(parsed.type_id, 100);
        assert!(!parsed.register_by_name);
        assert_eq!(parsed.fields, def.fields);
        assert_eq!(parsed.hash, def.hash);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn round_trip_by_name() {
        let encoder = MetaStringEncoder;
        let def = TypeDef::new(
            0,
            true,
            encoder.encode("org.example"),
            encoder.encode("order"),
            sample_fields(),
        );
        let mut writer = Writer::new();
        def.write(&mut writer);
        let data = writer.dump();
        let mut reader = Reader::new(&data);
        let parsed = TypeDef::read(&mut reader).unwrap();
        assert!(parsed.register_by_name);
        assert_eq!(parsed.namespace.original, "org.example");
        assert_eq!(parsed.type_name.original, "order");
    }

    #[test]
    fn hash_tracks_shape() {
        let a = TypeDef::new(
            100,
            false,
            MetaString::empty(),
            MetaString::empty(),
            sample_fields(),
        );
        let mut fields = sample_fields();
        fields[1].nullable = true;
        let b = TypeDef::new(100, false, MetaString::empty(), MetaString::empty(), fields);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn corrupted_descriptor_is_rejected() {
        let def = TypeDef::new(
            100,
            false,
            MetaString::empty(),
            MetaString::empty(),
            sample_fields(),
        );
        let mut writer = Writer::new();
        def.write(&mut writer);
        let mut data = writer.dump();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        let mut reader = Reader::new(&data);
        assert!(TypeDef::read(&mut reader).is_err());
    }
}
