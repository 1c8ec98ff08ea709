//! Byte-exact discarding of values the local schema does not know, driven
//! entirely by the remote `FieldDef`. Skipping must consume exactly the
//! bytes the remote writer emitted so subsequent fields keep decoding.

use crate::error::{Error, Result};
use crate::meta::{FieldDef, FieldType, TypeDef};
use crate::resolver::context::ReadContext;
use crate::serializer::collection::{collection_flags, element_ref_mode};
use crate::serializer::map::map_flags;
use crate::serializer::{NOT_NULL_VALUE_FLAG, NULL_FLAG, REF_FLAG, REF_VALUE_FLAG};
use crate::types::{self, need_to_write_type_for_field, RefMode};

/// Discards one field value using the remote field's declared type,
/// nullability, and tracking flags.
pub fn skip_field_value(context: &mut ReadContext, field: &FieldDef) -> Result<()> {
    let mode = RefMode::from_flags(field.nullable, field.tracking_ref);
    skip_value(context, &field.field_type, mode)
}

/// Discards one value of the given declared type.
pub fn skip_value(context: &mut ReadContext, field_type: &FieldType, mode: RefMode) -> Result<()> {
    if mode.has_ref_flag() {
        let flag = context.reader.i8();
        context.reader.check()?;
        match flag {
            NULL_FLAG => return Ok(()),
            REF_FLAG => {
                let _ = context.reader.var_uint32();
                return context.reader.check();
            }
            REF_VALUE_FLAG => {
                // Keep ref numbering aligned even though the object is
                // dropped; later back-references to it will fail cleanly.
                let _ = context.reserve_ref();
            }
            NOT_NULL_VALUE_FLAG => {}
            other => {
                return Err(Error::deserialization(format!("unknown ref flag {other}")));
            }
        }
    }
    if context.fory().is_compatible() && need_to_write_type_for_field(field_type.type_id) {
        let def = context.read_type_def()?;
        return skip_struct(context, &def);
    }
    skip_data(context, field_type)
}

fn skip_struct(context: &mut ReadContext, def: &TypeDef) -> Result<()> {
    if !context.fory().allow_unknown_types() && resolve_local(context, def).is_none() {
        return Err(Error::class_unregistered(format!(
            "{}.{} (remote type def {:#018x})",
            def.namespace.original, def.type_name.original, def.hash
        )));
    }
    for field in &def.fields {
        skip_field_value(context, field)?;
    }
    Ok(())
}

fn resolve_local(context: &ReadContext, def: &TypeDef) -> Option<()> {
    let resolver = context.fory().type_resolver();
    if def.register_by_name {
        resolver
            .resolve_by_name(&def.namespace, &def.type_name)
            .ok()
            .map(|_| ())
    } else {
        resolver.resolve_by_id(def.type_id).ok().map(|_| ())
    }
}

fn skip_data(context: &mut ReadContext, field_type: &FieldType) -> Result<()> {
    match field_type.type_id {
        types::BOOL | types::INT8 | types::UINT8 => context.reader.skip(1),
        types::INT16 | types::UINT16 => context.reader.skip(2),
        types::INT32 | types::UINT32 | types::FLOAT32 => context.reader.skip(4),
        types::INT64 | types::UINT64 | types::FLOAT64 | types::TIMESTAMP => {
            context.reader.skip(8)
        }
        types::VARINT32 | types::VAR_UINT32 | types::ENUM | types::NAMED_ENUM => {
            let _ = context.reader.var_uint32();
        }
        types::VARINT64 | types::VAR_UINT64 | types::DATE => {
            let _ = context.reader.var_uint64();
        }
        types::TAGGED_INT64 | types::TAGGED_UINT64 => {
            let _ = context.reader.tagged_uint64();
        }
        types::DURATION => context.reader.skip(12),
        types::STRING => {
            let header = context.reader.var_uint32();
            context.reader.check()?;
            let byte_len = (header >> 2) as usize;
            context.check_string_bytes(byte_len)?;
            context.reader.skip(byte_len);
        }
        types::BINARY | types::BOOL_ARRAY | types::INT8_ARRAY | types::UINT8_ARRAY => {
            let n = context.reader.read_length();
            context.reader.check()?;
            if field_type.type_id == types::BINARY {
                context.check_binary_size(n)?;
            } else {
                context.check_collection_size(n)?;
            }
            context.reader.skip(n);
        }
        types::INT16_ARRAY | types::UINT16_ARRAY => skip_packed(context, 2)?,
        types::INT32_ARRAY | types::UINT32_ARRAY | types::FLOAT32_ARRAY => {
            skip_packed(context, 4)?
        }
        types::INT64_ARRAY | types::UINT64_ARRAY | types::FLOAT64_ARRAY => {
            skip_packed(context, 8)?
        }
        types::LIST | types::SET => skip_list(context, field_type)?,
        types::MAP => skip_map(context, field_type)?,
        types::UNION | types::TYPED_UNION | types::NAMED_UNION => {
            skip_union(context, field_type)?
        }
        types::NONE => {}
        other => {
            return Err(Error::deserialization(format!(
                "cannot skip value of type {} ({other})",
                types::format_type_id(other)
            )));
        }
    }
    context.reader.check()
}

fn skip_packed(context: &mut ReadContext, elem_size: usize) -> Result<()> {
    let n = context.reader.read_length();
    context.reader.check()?;
    context.check_collection_size(n)?;
    context.reader.skip(n * elem_size);
    Ok(())
}

fn skip_list(context: &mut ReadContext, field_type: &FieldType) -> Result<()> {
    let n = context.reader.read_length();
    context.reader.check()?;
    context.check_collection_size(n)?;
    let flags = context.reader.u8();
    context.reader.check()?;
    let element = field_type
        .generics
        .first()
        .ok_or_else(|| Error::deserialization("list type def is missing its element type"))?;
    let mode = element_ref_mode(flags);
    if flags & collection_flags::IS_SAME_TYPE != 0
        && flags & collection_flags::IS_DECL_ELEMENT_TYPE == 0
    {
        // Shared element TypeInfo precedes the elements.
        skip_element_type_info(context, element)?;
    }
    for _ in 0..n {
        skip_value(context, element, mode)?;
    }
    Ok(())
}

fn skip_map(context: &mut ReadContext, field_type: &FieldType) -> Result<()> {
    let total = context.reader.read_length();
    context.reader.check()?;
    context.check_map_size(total)?;
    let key_type = field_type
        .generics
        .first()
        .ok_or_else(|| Error::deserialization("map type def is missing its key type"))?;
    let value_type = field_type
        .generics
        .get(1)
        .ok_or_else(|| Error::deserialization("map type def is missing its value type"))?;
    let mut read = 0usize;
    while read < total {
        let header = context.reader.u8();
        context.reader.check()?;
        let key_mode = RefMode::from_flags(false, header & map_flags::TRACKING_KEY_REF != 0);
        let value_mode = RefMode::from_flags(false, header & map_flags::TRACKING_VALUE_REF != 0);
        if header & (map_flags::KEY_HAS_NULL | map_flags::VALUE_HAS_NULL) != 0 {
            if header & map_flags::KEY_HAS_NULL == 0 {
                skip_value(context, key_type, key_mode)?;
            }
            if header & map_flags::VALUE_HAS_NULL == 0 {
                skip_value(context, value_type, value_mode)?;
            }
            read += 1;
        } else {
            let n = context.reader.u8() as usize;
            context.reader.check()?;
            if n == 0 || read + n > total {
                return Err(Error::deserialization("malformed map chunk while skipping"));
            }
            for _ in 0..n {
                skip_value(context, key_type, key_mode)?;
                skip_value(context, value_type, value_mode)?;
            }
            read += n;
        }
    }
    Ok(())
}

fn skip_union(context: &mut ReadContext, field_type: &FieldType) -> Result<()> {
    let index = context.reader.var_uint32() as usize;
    context.reader.check()?;
    let arm = field_type.generics.get(index).ok_or_else(|| {
        Error::deserialization(format!(
            "union index {index} out of range while skipping ({} arms)",
            field_type.generics.len()
        ))
    })?;
    if arm.type_id == types::NONE {
        return Ok(());
    }
    if context.fory().is_xlang() && !need_to_write_type_for_field(arm.type_id) {
        // Built-in arm tag; struct arms carry their TypeDef instead, which
        // skip_value reads itself.
        let _ = context.reader.var_uint32();
        context.reader.check()?;
    }
    skip_value(context, arm, RefMode::None)
}

fn skip_element_type_info(context: &mut ReadContext, element: &FieldType) -> Result<()> {
    if context.fory().is_compatible() && need_to_write_type_for_field(element.type_id) {
        let _ = context.read_type_def()?;
    } else {
        let _ = context.reader.var_uint32();
        context.reader.check()?;
    }
    Ok(())
}
