//! Three-phase struct body write.
//!
//! Phase 1 reserves the fixed block once and stores every fixed-width
//! primitive at its precomputed offset. Phase 2 reserves the worst-case
//! varint span and streams the compressed primitives. Phase 3 dispatches
//! the remaining fields through their inline fast paths, falling back to
//! the monomorphized serializer entry points for `General`.
//!
//! Safety: every pointer cast is backed by the exact-Rust-type check done
//! when the field's `DispatchId` was resolved.

use std::collections::HashMap;

use crate::resolver::context::WriteContext;
use crate::serializer::string::write_string_body;
use crate::serializer::struct_::field_info::DispatchId;
use crate::serializer::struct_::{FieldInfo, StructInfo};
use crate::serializer::{Serializer, NOT_NULL_VALUE_FLAG, NULL_FLAG};

pub(crate) fn write_fields(base: *const u8, info: &StructInfo, context: &mut WriteContext) {
    if !context.fory().is_compatible() {
        context.writer.u32(info.fingerprint);
    }
    context
        .writer
        .reserve(info.fixed_size + info.max_varint_size);
    let block = context.writer.grab(info.fixed_size);
    for &i in &info.fixed {
        unsafe { write_fixed(&info.fields[i], base, block) };
    }
    for &i in &info.varint {
        unsafe { write_varint(&info.fields[i], base, context) };
    }
    for &i in &info.remaining {
        unsafe { write_remaining(&info.fields[i], base, context) };
    }
}

unsafe fn write_fixed(field: &FieldInfo, base: *const u8, block: &mut [u8]) {
    let p = base.add(field.desc.offset);
    let o = field.write_offset;
    match field.dispatch {
        DispatchId::Bool => block[o] = *(p as *const bool) as u8,
        DispatchId::Int8 => block[o] = *(p as *const i8) as u8,
        DispatchId::UInt8 => block[o] = *p,
        DispatchId::Int16 => {
            block[o..o + 2].copy_from_slice(&(*(p as *const i16)).to_le_bytes())
        }
        DispatchId::UInt16 => {
            block[o..o + 2].copy_from_slice(&(*(p as *const u16)).to_le_bytes())
        }
        DispatchId::Int32 => {
            block[o..o + 4].copy_from_slice(&(*(p as *const i32)).to_le_bytes())
        }
        DispatchId::UInt32 => {
            block[o..o + 4].copy_from_slice(&(*(p as *const u32)).to_le_bytes())
        }
        DispatchId::Float32 => {
            block[o..o + 4].copy_from_slice(&(*(p as *const f32)).to_le_bytes())
        }
        DispatchId::Int64 => {
            block[o..o + 8].copy_from_slice(&(*(p as *const i64)).to_le_bytes())
        }
        DispatchId::UInt64 => {
            block[o..o + 8].copy_from_slice(&(*(p as *const u64)).to_le_bytes())
        }
        DispatchId::Float64 => {
            block[o..o + 8].copy_from_slice(&(*(p as *const f64)).to_le_bytes())
        }
        _ => unreachable!("non-fixed dispatch in fixed group"),
    }
}

unsafe fn write_varint(field: &FieldInfo, base: *const u8, context: &mut WriteContext) {
    let p = base.add(field.desc.offset);
    match field.dispatch {
        DispatchId::VarInt32 => context.writer.var_int32(*(p as *const i32)),
        DispatchId::VarUInt32 => context.writer.var_uint32(*(p as *const u32)),
        DispatchId::VarInt64 => context.writer.var_int64(*(p as *const i64)),
        DispatchId::VarUInt64 => context.writer.var_uint64(*(p as *const u64)),
        DispatchId::TaggedInt64 => context.writer.tagged_int64(*(p as *const i64)),
        DispatchId::TaggedUInt64 => context.writer.tagged_uint64(*(p as *const u64)),
        _ => unreachable!("non-varint dispatch in varint group"),
    }
}

unsafe fn write_remaining(field: &FieldInfo, base: *const u8, context: &mut WriteContext) {
    let p = base.add(field.desc.offset);
    match field.dispatch {
        DispatchId::String => write_string_body(context, &*(p as *const String)),
        DispatchId::Binary => (*(p as *const Vec<u8>)).fory_write_data(context),
        DispatchId::BoolSlice => (*(p as *const Vec<bool>)).fory_write_data(context),
        DispatchId::Int8Slice => (*(p as *const Vec<i8>)).fory_write_data(context),
        DispatchId::Int16Slice => (*(p as *const Vec<i16>)).fory_write_data(context),
        DispatchId::Int32Slice => (*(p as *const Vec<i32>)).fory_write_data(context),
        DispatchId::Int64Slice => (*(p as *const Vec<i64>)).fory_write_data(context),
        DispatchId::UInt16Slice => (*(p as *const Vec<u16>)).fory_write_data(context),
        DispatchId::UInt32Slice => (*(p as *const Vec<u32>)).fory_write_data(context),
        DispatchId::UInt64Slice => (*(p as *const Vec<u64>)).fory_write_data(context),
        DispatchId::Float32Slice => (*(p as *const Vec<f32>)).fory_write_data(context),
        DispatchId::Float64Slice => (*(p as *const Vec<f64>)).fory_write_data(context),
        DispatchId::StringStringMap => {
            (*(p as *const HashMap<String, String>)).fory_write_data(context)
        }
        DispatchId::NullableBool => match *(p as *const Option<bool>) {
            None => context.writer.i8(NULL_FLAG),
            Some(v) => {
                context.writer.i8(NOT_NULL_VALUE_FLAG);
                context.writer.bool(v);
            }
        },
        DispatchId::NullableInt32 => match *(p as *const Option<i32>) {
            None => context.writer.i8(NULL_FLAG),
            Some(v) => {
                context.writer.i8(NOT_NULL_VALUE_FLAG);
                context.writer.i32(v);
            }
        },
        DispatchId::NullableInt64 => match *(p as *const Option<i64>) {
            None => context.writer.i8(NULL_FLAG),
            Some(v) => {
                context.writer.i8(NOT_NULL_VALUE_FLAG);
                context.writer.i64(v);
            }
        },
        DispatchId::NullableTaggedInt64 => match *(p as *const Option<i64>) {
            None => context.writer.i8(NULL_FLAG),
            Some(v) => {
                context.writer.i8(NOT_NULL_VALUE_FLAG);
                context.writer.tagged_int64(v);
            }
        },
        DispatchId::NullableFloat64 => match *(p as *const Option<f64>) {
            None => context.writer.i8(NULL_FLAG),
            Some(v) => {
                context.writer.i8(NOT_NULL_VALUE_FLAG);
                context.writer.f64(v);
            }
        },
        DispatchId::NullableString => match &*(p as *const Option<String>) {
            None => context.writer.i8(NULL_FLAG),
            Some(v) => {
                context.writer.i8(NOT_NULL_VALUE_FLAG);
                write_string_body(context, v);
            }
        },
        _ => (field.desc.write_fn)(p, context, field.ref_mode, field.write_type_flag),
    }
}
