//! Three-phase struct body read, mirroring `write.rs`. Deferred reader
//! errors are surfaced at each phase boundary, not per byte.

use std::collections::HashMap;

use crate::error::Result;
use crate::resolver::context::ReadContext;
use crate::serializer::string::read_string_body;
use crate::serializer::struct_::field_info::DispatchId;
use crate::serializer::struct_::{FieldInfo, ForyStruct, StructInfo};
use crate::serializer::{ForyDefault, Serializer, NULL_FLAG};

/// Fingerprint check plus grouped phases; the schema-consistent read path.
pub(crate) fn read_consistent<T: ForyStruct>(
    context: &mut ReadContext,
    info: &StructInfo,
) -> Result<T> {
    let actual = context.reader.u32();
    context.reader.check()?;
    if actual != info.fingerprint {
        return Err(crate::error::Error::hash_mismatch(
            info.fingerprint,
            actual,
            info.type_name,
        ));
    }
    read_grouped::<T>(context, info)
}

/// Grouped phase read; also used in compatible mode when the remote shape
/// matches the local one exactly.
pub(crate) fn read_grouped<T: ForyStruct>(
    context: &mut ReadContext,
    info: &StructInfo,
) -> Result<T> {
    let mut value = T::fory_default();
    let base = &mut value as *mut T as *mut u8;
    let block = context.reader.bytes(info.fixed_size);
    context.reader.check()?;
    for &i in &info.fixed {
        unsafe { read_fixed(&info.fields[i], base, block) };
    }
    for &i in &info.varint {
        unsafe { read_varint(&info.fields[i], base, context) };
    }
    context.reader.check()?;
    for &i in &info.remaining {
        unsafe { read_remaining(&info.fields[i], base, context)? };
    }
    context.reader.check()?;
    Ok(value)
}

unsafe fn read_fixed(field: &FieldInfo, base: *mut u8, block: &[u8]) {
    let slot = base.add(field.desc.offset);
    let o = field.write_offset;
    match field.dispatch {
        DispatchId::Bool => *(slot as *mut bool) = block[o] as i8 != 0,
        DispatchId::Int8 => *(slot as *mut i8) = block[o] as i8,
        DispatchId::UInt8 => *slot = block[o],
        DispatchId::Int16 => {
            *(slot as *mut i16) = i16::from_le_bytes(block[o..o + 2].try_into().unwrap())
        }
        DispatchId::UInt16 => {
            *(slot as *mut u16) = u16::from_le_bytes(block[o..o + 2].try_into().unwrap())
        }
        DispatchId::Int32 => {
            *(slot as *mut i32) = i32::from_le_bytes(block[o..o + 4].try_into().unwrap())
        }
        DispatchId::UInt32 => {
            *(slot as *mut u32) = u32::from_le_bytes(block[o..o + 4].try_into().unwrap())
        }
        DispatchId::Float32 => {
            *(slot as *mut f32) = f32::from_le_bytes(block[o..o + 4].try_into().unwrap())
        }
        DispatchId::Int64 => {
            *(slot as *mut i64) = i64::from_le_bytes(block[o..o + 8].try_into().unwrap())
        }
        DispatchId::UInt64 => {
            *(slot as *mut u64) = u64::from_le_bytes(block[o..o + 8].try_into().unwrap())
        }
        DispatchId::Float64 => {
            *(slot as *mut f64) = f64::from_le_bytes(block[o..o + 8].try_into().unwrap())
        }
        _ => unreachable!("non-fixed dispatch in fixed group"),
    }
}

unsafe fn read_varint(field: &FieldInfo, base: *mut u8, context: &mut ReadContext) {
    let slot = base.add(field.desc.offset);
    match field.dispatch {
        DispatchId::VarInt32 => *(slot as *mut i32) = context.reader.var_int32(),
        DispatchId::VarUInt32 => *(slot as *mut u32) = context.reader.var_uint32(),
        DispatchId::VarInt64 => *(slot as *mut i64) = context.reader.var_int64(),
        DispatchId::VarUInt64 => *(slot as *mut u64) = context.reader.var_uint64(),
        DispatchId::TaggedInt64 => *(slot as *mut i64) = context.reader.tagged_int64(),
        DispatchId::TaggedUInt64 => *(slot as *mut u64) = context.reader.tagged_uint64(),
        _ => unreachable!("non-varint dispatch in varint group"),
    }
}

unsafe fn read_remaining(
    field: &FieldInfo,
    base: *mut u8,
    context: &mut ReadContext,
) -> Result<()> {
    let slot = base.add(field.desc.offset);
    match field.dispatch {
        DispatchId::String => *(slot as *mut String) = read_string_body(context)?,
        DispatchId::Binary => *(slot as *mut Vec<u8>) = <Vec<u8>>::fory_read_data(context)?,
        DispatchId::BoolSlice => *(slot as *mut Vec<bool>) = <Vec<bool>>::fory_read_data(context)?,
        DispatchId::Int8Slice => *(slot as *mut Vec<i8>) = <Vec<i8>>::fory_read_data(context)?,
        DispatchId::Int16Slice => *(slot as *mut Vec<i16>) = <Vec<i16>>::fory_read_data(context)?,
        DispatchId::Int32Slice => *(slot as *mut Vec<i32>) = <Vec<i32>>::fory_read_data(context)?,
        DispatchId::Int64Slice => *(slot as *mut Vec<i64>) = <Vec<i64>>::fory_read_data(context)?,
        DispatchId::UInt16Slice => *(slot as *mut Vec<u16>) = <Vec<u16>>::fory_read_data(context)?,
        DispatchId::UInt32Slice => *(slot as *mut Vec<u32>) = <Vec<u32>>::fory_read_data(context)?,
        DispatchId::UInt64Slice => *(slot as *mut Vec<u64>) = <Vec<u64>>::fory_read_data(context)?,
        DispatchId::Float32Slice => {
            *(slot as *mut Vec<f32>) = <Vec<f32>>::fory_read_data(context)?
        }
        DispatchId::Float64Slice => {
            *(slot as *mut Vec<f64>) = <Vec<f64>>::fory_read_data(context)?
        }
        DispatchId::StringStringMap => {
            *(slot as *mut HashMap<String, String>) =
                <HashMap<String, String>>::fory_read_data(context)?
        }
        DispatchId::NullableBool => {
            *(slot as *mut Option<bool>) = read_nullable(context, |c| c.reader.bool())?
        }
        DispatchId::NullableInt32 => {
            *(slot as *mut Option<i32>) = read_nullable(context, |c| c.reader.i32())?
        }
        DispatchId::NullableInt64 => {
            *(slot as *mut Option<i64>) = read_nullable(context, |c| c.reader.i64())?
        }
        DispatchId::NullableTaggedInt64 => {
            *(slot as *mut Option<i64>) = read_nullable(context, |c| c.reader.tagged_int64())?
        }
        DispatchId::NullableFloat64 => {
            *(slot as *mut Option<f64>) = read_nullable(context, |c| c.reader.f64())?
        }
        DispatchId::NullableString => {
            let flag = context.reader.i8();
            context.reader.check()?;
            *(slot as *mut Option<String>) = if flag == NULL_FLAG {
                None
            } else {
                Some(read_string_body(context)?)
            };
        }
        _ => (field.desc.read_fn)(slot, context, field.ref_mode, field.write_type_flag)?,
    }
    Ok(())
}

fn read_nullable<T>(
    context: &mut ReadContext,
    read: impl FnOnce(&mut ReadContext) -> T,
) -> Result<Option<T>> {
    let flag = context.reader.i8();
    context.reader.check()?;
    if flag == NULL_FLAG {
        Ok(None)
    } else {
        Ok(Some(read(context)))
    }
}
