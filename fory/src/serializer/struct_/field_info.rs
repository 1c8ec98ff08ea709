//! Per-field metadata driving the struct fast paths.
//!
//! A `FieldDescriptor` comes from the derive: name, `offset_of!` byte
//! offset, declared type (after annotation overrides), and monomorphized
//! write/read entry points. At registration the descriptor is resolved into
//! a `DispatchId` that fully determines the inline fast-path branch; the fn
//! pointers are only consulted for the `General` and `Enum` dispatches.

use std::any::TypeId as RustTypeId;
use std::collections::HashMap;

use crate::error::Result;
use crate::fory::Fory;
use crate::meta::FieldType;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::Serializer;
use crate::types::{self, RefMode};

/// How the field's value is held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Value,
    /// Shared handle with identity (`Rc<RefCell<T>>`).
    Pointer,
    /// `Option<T>`.
    Optional,
}

/// Wire encoding choice for 64-bit integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntEncoding {
    Fixed,
    Varint,
    Tagged,
}

/// Field annotation surface collected by the derive.
#[derive(Debug, Clone)]
pub struct FieldOverrides {
    pub nullable: bool,
    pub track: bool,
    pub tag_id: i32,
    pub compress: bool,
    pub encoding: Option<IntEncoding>,
}

impl Default for FieldOverrides {
    fn default() -> Self {
        FieldOverrides {
            nullable: false,
            track: false,
            tag_id: -1,
            compress: false,
            encoding: None,
        }
    }
}

pub type WriteFn = unsafe fn(*const u8, &mut WriteContext, RefMode, bool);
pub type ReadFn = unsafe fn(*mut u8, &mut ReadContext, RefMode, bool) -> Result<()>;

/// # Safety
/// `ptr` must point at a live, initialized `F`.
pub(crate) unsafe fn write_field_raw<F: Serializer>(
    ptr: *const u8,
    context: &mut WriteContext,
    ref_mode: RefMode,
    write_type: bool,
) {
    let value = &*(ptr as *const F);
    value.fory_write(context, ref_mode, write_type);
}

/// # Safety
/// `slot` must point at a live, initialized `F`; the previous value is
/// dropped by the assignment.
pub(crate) unsafe fn read_field_raw<F: Serializer>(
    slot: *mut u8,
    context: &mut ReadContext,
    ref_mode: RefMode,
    read_type: bool,
) -> Result<()> {
    let value = F::fory_read(context, ref_mode, read_type)?;
    *(slot as *mut F) = value;
    Ok(())
}

#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Byte offset of the field within the struct value.
    pub offset: usize,
    /// Declared wire type id, after annotation overrides.
    pub type_id: u32,
    pub field_type: FieldType,
    pub nullable: bool,
    pub tracking_ref: bool,
    pub tag_id: i32,
    pub kind: FieldKind,
    pub rust_type: RustTypeId,
    pub write_fn: WriteFn,
    pub read_fn: ReadFn,
}

impl FieldDescriptor {
    pub fn of<F: Serializer>(
        fory: &Fory,
        name: &'static str,
        offset: usize,
        overrides: FieldOverrides,
    ) -> FieldDescriptor {
        let mut field_type = F::fory_field_type(fory);
        let nullable = F::fory_is_option() || overrides.nullable;
        let tracking_ref = overrides.track || (F::fory_is_shared_ref() && fory.is_track_ref());
        if overrides.compress || overrides.encoding.is_some() {
            if tracking_ref {
                panic!("field {name}: integer encoding annotations cannot combine with ref tracking");
            }
            if nullable && (overrides.compress || overrides.encoding == Some(IntEncoding::Varint)) {
                panic!("field {name}: varint encodings require a non-nullable field");
            }
            field_type.type_id = apply_int_overrides(field_type.type_id, &overrides, name);
        }
        let kind = if F::fory_is_shared_ref() {
            FieldKind::Pointer
        } else if F::fory_is_option() {
            FieldKind::Optional
        } else {
            FieldKind::Value
        };
        FieldDescriptor {
            name,
            offset,
            type_id: field_type.type_id,
            field_type,
            nullable,
            tracking_ref,
            tag_id: overrides.tag_id,
            kind,
            rust_type: RustTypeId::of::<F>(),
            write_fn: write_field_raw::<F>,
            read_fn: read_field_raw::<F>,
        }
    }
}

fn apply_int_overrides(type_id: u32, overrides: &FieldOverrides, name: &str) -> u32 {
    if let Some(encoding) = overrides.encoding {
        return match (type_id, encoding) {
            (types::INT64 | types::VARINT64 | types::TAGGED_INT64, IntEncoding::Fixed) => {
                types::INT64
            }
            (types::INT64 | types::VARINT64 | types::TAGGED_INT64, IntEncoding::Varint) => {
                types::VARINT64
            }
            (types::INT64 | types::VARINT64 | types::TAGGED_INT64, IntEncoding::Tagged) => {
                types::TAGGED_INT64
            }
            (types::UINT64 | types::VAR_UINT64 | types::TAGGED_UINT64, IntEncoding::Fixed) => {
                types::UINT64
            }
            (types::UINT64 | types::VAR_UINT64 | types::TAGGED_UINT64, IntEncoding::Varint) => {
                types::VAR_UINT64
            }
            (types::UINT64 | types::VAR_UINT64 | types::TAGGED_UINT64, IntEncoding::Tagged) => {
                types::TAGGED_UINT64
            }
            _ => panic!("field {name}: encoding annotation applies to 64-bit integer fields"),
        };
    }
    match type_id {
        types::INT32 => types::VARINT32,
        types::UINT32 => types::VAR_UINT32,
        types::INT64 | types::TAGGED_INT64 => types::VARINT64,
        types::UINT64 | types::TAGGED_UINT64 => types::VAR_UINT64,
        _ => panic!("field {name}: compress annotation applies to 32/64-bit integer fields"),
    }
}

/// Numeric tag driving the struct serializer's inline fast paths. `General`
/// falls back to the field's monomorphized serializer entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchId {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    VarInt32,
    VarUInt32,
    VarInt64,
    VarUInt64,
    TaggedInt64,
    TaggedUInt64,
    String,
    Binary,
    BoolSlice,
    Int8Slice,
    Int16Slice,
    Int32Slice,
    Int64Slice,
    UInt16Slice,
    UInt32Slice,
    UInt64Slice,
    Float32Slice,
    Float64Slice,
    StringStringMap,
    NullableBool,
    NullableInt32,
    NullableInt64,
    NullableFloat64,
    NullableTaggedInt64,
    NullableString,
    Enum,
    General,
}

/// The write phase a dispatch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fixed,
    Varint,
    Remaining,
}

impl DispatchId {
    pub fn phase(self) -> Phase {
        match self {
            DispatchId::Bool
            | DispatchId::Int8
            | DispatchId::Int16
            | DispatchId::Int32
            | DispatchId::Int64
            | DispatchId::UInt8
            | DispatchId::UInt16
            | DispatchId::UInt32
            | DispatchId::UInt64
            | DispatchId::Float32
            | DispatchId::Float64 => Phase::Fixed,
            DispatchId::VarInt32
            | DispatchId::VarUInt32
            | DispatchId::VarInt64
            | DispatchId::VarUInt64
            | DispatchId::TaggedInt64
            | DispatchId::TaggedUInt64 => Phase::Varint,
            _ => Phase::Remaining,
        }
    }
}

/// Resolves the fast-path branch for a field. Every unsafe offset cast in
/// the fast paths is justified here by an exact Rust type check.
pub(crate) fn dispatch_of(f: RustTypeId, type_id: u32, nullable: bool, tracking: bool) -> DispatchId {
    if tracking {
        return DispatchId::General;
    }
    if nullable {
        return match type_id {
            types::BOOL if f == RustTypeId::of::<Option<bool>>() => DispatchId::NullableBool,
            types::INT32 if f == RustTypeId::of::<Option<i32>>() => DispatchId::NullableInt32,
            types::INT64 if f == RustTypeId::of::<Option<i64>>() => DispatchId::NullableInt64,
            types::FLOAT64 if f == RustTypeId::of::<Option<f64>>() => DispatchId::NullableFloat64,
            types::TAGGED_INT64 if f == RustTypeId::of::<Option<i64>>() => {
                DispatchId::NullableTaggedInt64
            }
            types::STRING if f == RustTypeId::of::<Option<String>>() => DispatchId::NullableString,
            _ => DispatchId::General,
        };
    }
    match type_id {
        types::BOOL if f == RustTypeId::of::<bool>() => DispatchId::Bool,
        types::INT8 if f == RustTypeId::of::<i8>() => DispatchId::Int8,
        types::INT16 if f == RustTypeId::of::<i16>() => DispatchId::Int16,
        types::INT32 if f == RustTypeId::of::<i32>() => DispatchId::Int32,
        types::INT64 if f == RustTypeId::of::<i64>() => DispatchId::Int64,
        types::UINT8 if f == RustTypeId::of::<u8>() => DispatchId::UInt8,
        types::UINT16 if f == RustTypeId::of::<u16>() => DispatchId::UInt16,
        types::UINT32 if f == RustTypeId::of::<u32>() => DispatchId::UInt32,
        types::UINT64 if f == RustTypeId::of::<u64>() => DispatchId::UInt64,
        types::FLOAT32 if f == RustTypeId::of::<f32>() => DispatchId::Float32,
        types::FLOAT64 if f == RustTypeId::of::<f64>() => DispatchId::Float64,
        types::VARINT32 if f == RustTypeId::of::<i32>() => DispatchId::VarInt32,
        types::VAR_UINT32 if f == RustTypeId::of::<u32>() => DispatchId::VarUInt32,
        types::VARINT64 if f == RustTypeId::of::<i64>() => DispatchId::VarInt64,
        types::VAR_UINT64 if f == RustTypeId::of::<u64>() => DispatchId::VarUInt64,
        types::TAGGED_INT64 if f == RustTypeId::of::<i64>() => DispatchId::TaggedInt64,
        types::TAGGED_UINT64 if f == RustTypeId::of::<u64>() => DispatchId::TaggedUInt64,
        types::STRING if f == RustTypeId::of::<std::string::String>() => DispatchId::String,
        types::BINARY if f == RustTypeId::of::<Vec<u8>>() => DispatchId::Binary,
        types::BOOL_ARRAY if f == RustTypeId::of::<Vec<bool>>() => DispatchId::BoolSlice,
        types::INT8_ARRAY if f == RustTypeId::of::<Vec<i8>>() => DispatchId::Int8Slice,
        types::INT16_ARRAY if f == RustTypeId::of::<Vec<i16>>() => DispatchId::Int16Slice,
        types::INT32_ARRAY if f == RustTypeId::of::<Vec<i32>>() => DispatchId::Int32Slice,
        types::INT64_ARRAY if f == RustTypeId::of::<Vec<i64>>() => DispatchId::Int64Slice,
        types::UINT16_ARRAY if f == RustTypeId::of::<Vec<u16>>() => DispatchId::UInt16Slice,
        types::UINT32_ARRAY if f == RustTypeId::of::<Vec<u32>>() => DispatchId::UInt32Slice,
        types::UINT64_ARRAY if f == RustTypeId::of::<Vec<u64>>() => DispatchId::UInt64Slice,
        types::FLOAT32_ARRAY if f == RustTypeId::of::<Vec<f32>>() => DispatchId::Float32Slice,
        types::FLOAT64_ARRAY if f == RustTypeId::of::<Vec<f64>>() => DispatchId::Float64Slice,
        types::MAP if f == RustTypeId::of::<HashMap<std::string::String, std::string::String>>() => {
            DispatchId::StringStringMap
        }
        types::ENUM | types::NAMED_ENUM => DispatchId::Enum,
        _ => DispatchId::General,
    }
}
