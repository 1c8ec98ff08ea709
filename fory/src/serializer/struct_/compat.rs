//! Schema-evolution read path. The remote TypeDef, not the local type,
//! drives what is read: each remote field is matched against the local
//! shape (tag id first, then snake_case name) and either read into its slot
//! or skipped byte-exactly. When the shapes agree completely the grouped
//! fast path is used instead.

use std::any::TypeId as RustTypeId;
use std::sync::Arc;

use crate::error::Result;
use crate::fory::Fory;
use crate::meta::{to_snake_case, TypeDef};
use crate::resolver::context::ReadContext;
use crate::serializer::struct_::{read, skip, ForyStruct, StructInfo};
use crate::serializer::ForyDefault;
use crate::types::types_compatible;

/// Read plan for one remote field.
#[derive(Debug, Clone, Copy)]
pub enum CompatFieldOp {
    /// Read into the local field at this index (sorted order).
    Read(usize),
    /// Discard the remote field at this index of the TypeDef.
    Skip(usize),
}

/// Lazily built per (local type, remote TypeDef hash) and cached for the
/// session.
pub struct CompatStructInfo {
    pub ops: Vec<CompatFieldOp>,
    /// True when any remote field is missing locally, mismatched, or out of
    /// order; selects the field-by-field read over the grouped fast path.
    pub type_def_differs: bool,
}

impl CompatStructInfo {
    pub fn build(local: &StructInfo, def: &TypeDef, _fory: &Fory) -> CompatStructInfo {
        let mut used = vec![false; local.fields.len()];
        let mut ops = Vec::with_capacity(def.fields.len());
        let mut differs = def.fields.len() != local.fields.len();
        for (remote_index, remote) in def.fields.iter().enumerate() {
            let by_tag = if remote.tag_id >= 0 {
                local
                    .fields
                    .iter()
                    .enumerate()
                    .find_map(|(i, lf)| (!used[i] && lf.desc.tag_id == remote.tag_id).then_some(i))
            } else {
                None
            };
            let matched = by_tag.or_else(|| {
                let remote_name = to_snake_case(&remote.name);
                local
                    .fields
                    .iter()
                    .enumerate()
                    .find_map(|(i, lf)| (!used[i] && lf.desc.name == remote_name).then_some(i))
            });
            let readable = matched.filter(|&i| {
                let lf = &local.fields[i];
                types_compatible(remote.field_type.type_id, lf.desc.type_id)
                    && remote.nullable == lf.desc.nullable
                    && remote.tracking_ref == lf.desc.tracking_ref
            });
            match readable {
                Some(i) => {
                    used[i] = true;
                    if i != remote_index
                        || remote.field_type.type_id != local.fields[i].desc.type_id
                    {
                        differs = true;
                    }
                    ops.push(CompatFieldOp::Read(i));
                }
                None => {
                    log::debug!(
                        "field {} of remote {} has no readable local counterpart; skipping",
                        remote.name,
                        local.type_name
                    );
                    differs = true;
                    ops.push(CompatFieldOp::Skip(remote_index));
                }
            }
        }
        if !used.iter().all(|&u| u) {
            // Local-only fields keep their defaults.
            differs = true;
        }
        CompatStructInfo {
            ops,
            type_def_differs: differs,
        }
    }
}

pub(crate) fn read_compatible<T: ForyStruct>(
    context: &mut ReadContext,
    local: &StructInfo,
    def: Arc<TypeDef>,
) -> Result<T> {
    let key = (RustTypeId::of::<T>(), def.hash);
    let compat = match context.cached_compat_info(key) {
        Some(cached) => cached,
        None => {
            let built = Arc::new(CompatStructInfo::build(local, &def, context.fory()));
            context.cache_compat_info(key, built.clone());
            built
        }
    };
    if !compat.type_def_differs {
        return read::read_grouped::<T>(context, local);
    }
    let mut value = T::fory_default();
    let base = &mut value as *mut T as *mut u8;
    for op in &compat.ops {
        match *op {
            CompatFieldOp::Read(i) => {
                let field = &local.fields[i];
                unsafe {
                    (field.desc.read_fn)(
                        base.add(field.desc.offset),
                        context,
                        field.ref_mode,
                        field.write_type_flag,
                    )?;
                }
            }
            CompatFieldOp::Skip(j) => skip::skip_field_value(context, &def.fields[j])?,
        }
    }
    context.reader.check()?;
    Ok(value)
}
