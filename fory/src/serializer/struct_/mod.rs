//! Struct serialization: deterministic field ordering, three-phase body
//! encoding, fingerprint checking, and the schema-evolution read path.
//!
//! Registration resolves a type's field descriptors into a [`StructInfo`]:
//! fields sorted by the cross-language contract, partitioned into fixed /
//! varint / remaining groups with precomputed offsets, and hashed into the
//! 32-bit fingerprint. Everything here is shape work; the byte-level phases
//! live in `write.rs` / `read.rs`.

mod compat;
mod field_info;
mod read;
mod skip;
mod write;

pub use compat::CompatStructInfo;
pub use field_info::{
    DispatchId, FieldDescriptor, FieldKind, FieldOverrides, IntEncoding, Phase,
};
pub use skip::{skip_field_value, skip_value};

use std::any::TypeId as RustTypeId;

use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::meta::murmur3::murmur3_x64_128;
use crate::meta::{FieldDef, MetaString, TypeDef, FINGERPRINT_HASH_SEED};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeKind;
use crate::serializer::Serializer;
use crate::types::{self, need_to_write_type_for_field, RefMode};

use field_info::dispatch_of;

/// Implemented by the derive for record types. The descriptor list is the
/// complete static dispatch table the core consumes; its order is the
/// source declaration order and carries no wire meaning.
pub trait ForyStruct: Serializer {
    fn fory_fields(fory: &Fory) -> Vec<FieldDescriptor>;

    fn fory_type_name() -> &'static str;

    fn fory_kind() -> TypeKind {
        TypeKind::Struct
    }
}

/// One field after registration-time resolution.
pub struct FieldInfo {
    pub desc: FieldDescriptor,
    pub dispatch: DispatchId,
    pub ref_mode: RefMode,
    /// Whether values of this field carry inline type info (struct-typed
    /// fields in compatible mode).
    pub write_type_flag: bool,
    /// Offset inside the reserved fixed-primitive block.
    pub write_offset: usize,
}

/// Registration-time product: sorted fields, phase partition, sizes, and
/// the struct fingerprint.
pub struct StructInfo {
    pub type_name: &'static str,
    pub fields: Vec<FieldInfo>,
    pub fixed: Vec<usize>,
    pub varint: Vec<usize>,
    pub remaining: Vec<usize>,
    pub fixed_size: usize,
    pub max_varint_size: usize,
    pub fingerprint: u32,
}

/// Logical width used by the size-descending primitive sort; compressed
/// variants sort by the width of the value they carry.
fn sort_size(type_id: u32) -> usize {
    match type_id {
        types::VARINT32 | types::VAR_UINT32 => 4,
        types::VARINT64
        | types::VAR_UINT64
        | types::TAGGED_INT64
        | types::TAGGED_UINT64 => 8,
        other => types::fixed_size_of(other),
    }
}

/// Sorts and partitions the descriptor list. The resulting order is part of
/// the wire contract: group 1 holds primitives (fixed-width first, then
/// compressed, wider first, ties by name), group 2 holds everything else
/// ordered by (type id, name).
pub fn build_struct_info(
    fory: &Fory,
    type_name: &'static str,
    descriptors: Vec<FieldDescriptor>,
) -> StructInfo {
    let mut fields: Vec<FieldInfo> = descriptors
        .into_iter()
        .map(|desc| {
            let dispatch = dispatch_of(
                desc.rust_type,
                desc.type_id,
                desc.nullable,
                desc.tracking_ref,
            );
            let ref_mode = RefMode::from_flags(desc.nullable, desc.tracking_ref);
            let write_type_flag =
                fory.is_compatible() && need_to_write_type_for_field(desc.type_id);
            FieldInfo {
                desc,
                dispatch,
                ref_mode,
                write_type_flag,
                write_offset: 0,
            }
        })
        .collect();

    fields.sort_by(|a, b| {
        let group_a = (a.dispatch.phase() == Phase::Remaining) as u8;
        let group_b = (b.dispatch.phase() == Phase::Remaining) as u8;
        group_a.cmp(&group_b).then_with(|| {
            if group_a == 0 {
                let compressed_a = (a.dispatch.phase() == Phase::Varint) as u8;
                let compressed_b = (b.dispatch.phase() == Phase::Varint) as u8;
                compressed_a
                    .cmp(&compressed_b)
                    .then_with(|| sort_size(b.desc.type_id).cmp(&sort_size(a.desc.type_id)))
                    .then_with(|| a.desc.name.cmp(b.desc.name))
            } else {
                a.desc
                    .type_id
                    .cmp(&b.desc.type_id)
                    .then_with(|| a.desc.name.cmp(b.desc.name))
            }
        })
    });

    let mut fixed = Vec::new();
    let mut varint = Vec::new();
    let mut remaining = Vec::new();
    let mut fixed_size = 0usize;
    for (index, field) in fields.iter_mut().enumerate() {
        match field.dispatch.phase() {
            Phase::Fixed => {
                field.write_offset = fixed_size;
                fixed_size += types::fixed_size_of(field.desc.type_id);
                fixed.push(index);
            }
            Phase::Varint => varint.push(index),
            Phase::Remaining => remaining.push(index),
        }
    }
    let max_varint_size = varint
        .iter()
        .map(|&i| types::varint_max_size_of(fields[i].desc.type_id))
        .sum();
    let fingerprint = compute_fingerprint(&fields);
    StructInfo {
        type_name,
        fields,
        fixed,
        varint,
        remaining,
        fixed_size,
        max_varint_size,
        fingerprint,
    }
}

/// Pure function of the sorted `(name, type_id, nullable, ref)` tuples,
/// folded through MurmurHash3 behind a domain-separation prefix. Checked on
/// every schema-consistent read.
pub(crate) fn compute_fingerprint(fields: &[FieldInfo]) -> u32 {
    let mut input = String::from("fory.struct.v1");
    for field in fields {
        input.push(';');
        input.push_str(field.desc.name);
        input.push(',');
        input.push_str(&field.desc.type_id.to_string());
        input.push(',');
        input.push(if field.desc.nullable { '1' } else { '0' });
        input.push(',');
        input.push(if field.desc.tracking_ref { '1' } else { '0' });
    }
    let (h1, _) = murmur3_x64_128(input.as_bytes(), FINGERPRINT_HASH_SEED);
    let fingerprint = h1 as u32;
    if fingerprint == 0 {
        1
    } else {
        fingerprint
    }
}

/// Builds the transmissible schema descriptor from the sorted fields.
pub fn type_def_of(
    info: &StructInfo,
    user_id: u32,
    register_by_name: bool,
    namespace: MetaString,
    type_name: MetaString,
) -> TypeDef {
    let fields = info
        .fields
        .iter()
        .map(|f| FieldDef {
            name: f.desc.name.to_string(),
            tag_id: f.desc.tag_id,
            field_type: f.desc.field_type.clone(),
            nullable: f.desc.nullable,
            tracking_ref: f.desc.tracking_ref,
        })
        .collect();
    TypeDef::new(user_id, register_by_name, namespace, type_name, fields)
}

/// Type info for any registered user type: a varuint user id, or the
/// `NAMED_*` tag plus interned namespace/name strings. Compatible-mode
/// structs send their TypeDef through the meta-share dictionary instead.
pub fn write_registered_type_info<T: Serializer>(context: &mut WriteContext) {
    let fory = context.fory();
    let rust_type = RustTypeId::of::<T>();
    let info = fory
        .type_resolver()
        .expect_info(rust_type, std::any::type_name::<T>());
    if fory.is_compatible() && info.kind == TypeKind::Struct {
        let def = info.type_def.clone().expect("struct type has a type def");
        context.write_type_def(rust_type, &def);
        return;
    }
    if info.register_by_name {
        context.writer.var_uint32(info.kind.named_tag());
        context.write_meta_string(&info.namespace);
        context.write_meta_string(&info.type_name);
    } else {
        context.writer.var_uint32(info.type_id);
    }
}

pub fn read_registered_type_info<T: Serializer>(context: &mut ReadContext) -> Result<()> {
    let fory = context.fory();
    let rust_type = RustTypeId::of::<T>();
    let info = fory
        .type_resolver()
        .resolve_by_type(rust_type)
        .ok_or_else(|| Error::class_unregistered(std::any::type_name::<T>()))?;
    if fory.is_compatible() && info.kind == TypeKind::Struct {
        let def = context.read_type_def()?;
        context.set_pending_type_def(def);
        return Ok(());
    }
    let tag = context.reader.var_uint32();
    context.reader.check()?;
    if info.register_by_name {
        let named_tag = info.kind.named_tag();
        if tag != named_tag {
            return Err(Error::unexpected_type_id(named_tag, tag));
        }
        let namespace = context.read_meta_string()?;
        let type_name = context.read_meta_string()?;
        if namespace != info.namespace || type_name != info.type_name {
            return Err(Error::deserialization(format!(
                "type name mismatch: expected {}.{}, actual {}.{}",
                info.namespace.original,
                info.type_name.original,
                namespace.original,
                type_name.original
            )));
        }
    } else if tag != info.type_id {
        return Err(Error::unexpected_type_id(info.type_id, tag));
    }
    Ok(())
}

/// Body write: fingerprint (consistent mode) plus the three phases.
pub fn write_struct_data<T: ForyStruct>(value: &T, context: &mut WriteContext) {
    let info = context
        .fory()
        .type_resolver()
        .struct_info_of(RustTypeId::of::<T>(), T::fory_type_name());
    let base = value as *const T as *const u8;
    write::write_fields(base, &info, context);
}

/// Body read: fingerprint check and grouped phases in consistent mode; the
/// remote-TypeDef-driven path in compatible mode.
pub fn read_struct_data<T: ForyStruct>(context: &mut ReadContext) -> Result<T> {
    let info = context
        .fory()
        .type_resolver()
        .struct_info_of(RustTypeId::of::<T>(), T::fory_type_name());
    let result = if context.fory().is_compatible() {
        match context.take_pending_type_def() {
            Some(def) => compat::read_compatible::<T>(context, &info, def),
            None => Err(Error::deserialization(
                "compatible struct read without a type def",
            )),
        }
    } else {
        read::read_consistent::<T>(context, &info)
    };
    result.map_err(|e| e.with_frame(format!("[struct {}]", T::fory_type_name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fory::Fory;
    use crate::serializer::struct_::field_info::FieldOverrides;

    fn descriptor<F: Serializer>(fory: &Fory, name: &'static str) -> FieldDescriptor {
        FieldDescriptor::of::<F>(fory, name, 0, FieldOverrides::default())
    }

    fn sample(fory: &Fory) -> StructInfo {
        // Declared out of sorted order on purpose.
        let fields = vec![
            descriptor::<String>(fory, "name"),
            descriptor::<i32>(fory, "id"),
            descriptor::<bool>(fory, "ok"),
            descriptor::<f64>(fory, "ratio"),
        ];
        build_struct_info(fory, "Sample", fields)
    }

    #[test]
    fn primitives_sort_size_descending_before_remaining() {
        let fory = Fory::default();
        let info = sample(&fory);
        let order: Vec<&str> = info.fields.iter().map(|f| f.desc.name).collect();
        assert_eq!(order, vec!["ratio", "id", "ok", "name"]);
        assert_eq!(info.fixed.len(), 3);
        assert_eq!(info.fixed_size, 13);
        assert_eq!(info.remaining.len(), 1);
    }

    #[test]
    fn compressed_primitives_sort_after_fixed_ones() {
        let fory = Fory::default();
        let fields = vec![
            FieldDescriptor::of::<i32>(
                &fory,
                "count",
                0,
                FieldOverrides {
                    compress: true,
                    ..Default::default()
                },
            ),
            descriptor::<i16>(&fory, "small"),
            descriptor::<i64>(&fory, "big"),
        ];
        let info = build_struct_info(&fory, "Sorted", fields);
        let order: Vec<&str> = info.fields.iter().map(|f| f.desc.name).collect();
        // i64 is tagged (varint phase) under xlang, so the fixed group is
        // just `small`; `big` (8) sorts before `count` (4) inside it.
        assert_eq!(order, vec!["small", "big", "count"]);
        assert_eq!(info.varint.len(), 2);
        assert_eq!(info.max_varint_size, 9 + 5);
    }

    #[test]
    fn fingerprint_ignores_declaration_order() {
        let fory = Fory::default();
        let a = sample(&fory);
        let reordered = vec![
            descriptor::<f64>(&fory, "ratio"),
            descriptor::<bool>(&fory, "ok"),
            descriptor::<i32>(&fory, "id"),
            descriptor::<String>(&fory, "name"),
        ];
        let b = build_struct_info(&fory, "Sample", reordered);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn fingerprint_sees_added_nullable_field() {
        let fory = Fory::default();
        let a = sample(&fory);
        let mut fields = vec![
            descriptor::<String>(&fory, "name"),
            descriptor::<i32>(&fory, "id"),
            descriptor::<bool>(&fory, "ok"),
            descriptor::<f64>(&fory, "ratio"),
        ];
        fields.push(descriptor::<Option<String>>(&fory, "note"));
        let b = build_struct_info(&fory, "Sample", fields);
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn fingerprint_sees_nullability() {
        let fory = Fory::default();
        let plain = build_struct_info(&fory, "T", vec![descriptor::<i32>(&fory, "id")]);
        let nullable =
            build_struct_info(&fory, "T", vec![descriptor::<Option<i32>>(&fory, "id")]);
        assert_ne!(plain.fingerprint, nullable.fingerprint);
    }
}
