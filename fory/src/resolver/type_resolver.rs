//! Registry mapping application types to wire type ids, qualified names,
//! serializers, and schema descriptors.
//!
//! The registry is append-only: registration happens up front on `&mut
//! Fory`, after which lookups are read-only and the instance can be shared
//! across serialization contexts.

use std::any::TypeId as RustTypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::meta::{MetaString, TypeDef};
use crate::serializer::struct_::StructInfo;
use crate::types::{self, MIN_USER_TYPE_ID};

/// What family a registered type belongs to; decides the `NAMED_*` tag used
/// on the wire for name-registered types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Struct,
    Enum,
    Union,
    Ext,
}

impl TypeKind {
    pub fn named_tag(self) -> u32 {
        match self {
            TypeKind::Struct => types::NAMED_STRUCT,
            TypeKind::Enum => types::NAMED_ENUM,
            TypeKind::Union => types::NAMED_UNION,
            TypeKind::Ext => types::NAMED_EXT,
        }
    }
}

/// The registry's per-type record.
pub struct TypeInfo {
    pub kind: TypeKind,
    /// Varuint written as type info for id-registered types; the `NAMED_*`
    /// tag for name-registered ones.
    pub type_id: u32,
    /// Registered user id, `None` when registered by name.
    pub user_type_id: Option<u32>,
    pub register_by_name: bool,
    pub namespace: MetaString,
    pub type_name: MetaString,
    /// Rust type name, for diagnostics only.
    pub rust_name: &'static str,
    /// Schema descriptor; present for struct kinds.
    pub type_def: Option<Arc<TypeDef>>,
    /// Sorted field groups; present for struct kinds.
    pub struct_info: Option<Arc<StructInfo>>,
}

#[derive(Default)]
pub struct TypeResolver {
    infos: HashMap<RustTypeId, Arc<TypeInfo>>,
    by_id: HashMap<u32, RustTypeId>,
    by_name: HashMap<(MetaString, MetaString), RustTypeId>,
}

impl TypeResolver {
    pub fn register(&mut self, rust_type: RustTypeId, info: TypeInfo) -> Result<()> {
        if let Some(existing) = self.infos.get(&rust_type) {
            return Err(Error::serialization(format!(
                "type {} is already registered",
                existing.rust_name
            )));
        }
        if let Some(id) = info.user_type_id {
            if id < MIN_USER_TYPE_ID {
                return Err(Error::serialization(format!(
                    "type id {id} is reserved for built-ins (user ids start at {MIN_USER_TYPE_ID})"
                )));
            }
            if self.by_id.contains_key(&id) {
                return Err(Error::serialization(format!(
                    "type id {id} is already registered"
                )));
            }
            self.by_id.insert(id, rust_type);
        }
        if info.register_by_name {
            let key = (info.namespace.clone(), info.type_name.clone());
            if self.by_name.contains_key(&key) {
                return Err(Error::serialization(format!(
                    "name {}.{} is already registered",
                    info.namespace.original, info.type_name.original
                )));
            }
            self.by_name.insert(key, rust_type);
        }
        log::debug!(
            "registered {} as {}",
            info.rust_name,
            match info.user_type_id {
                Some(id) => format!("id {id}"),
                None => format!("{}.{}", info.namespace.original, info.type_name.original),
            }
        );
        self.infos.insert(rust_type, Arc::new(info));
        Ok(())
    }

    /// Smallest unused user id; gaps left by explicit registrations are
    /// filled first.
    pub fn next_auto_id(&self) -> u32 {
        let mut id = MIN_USER_TYPE_ID;
        while self.by_id.contains_key(&id) {
            id += 1;
        }
        id
    }

    pub fn resolve_by_type(&self, rust_type: RustTypeId) -> Option<&Arc<TypeInfo>> {
        self.infos.get(&rust_type)
    }

    pub fn resolve_by_id(&self, id: u32) -> Result<&Arc<TypeInfo>> {
        self.by_id
            .get(&id)
            .and_then(|rt| self.infos.get(rt))
            .ok_or_else(|| Error::class_unregistered(format!("type id {id}")))
    }

    pub fn resolve_by_name(&self, namespace: &MetaString, name: &MetaString) -> Result<&Arc<TypeInfo>> {
        self.by_name
            .get(&(namespace.clone(), name.clone()))
            .and_then(|rt| self.infos.get(rt))
            .ok_or_else(|| {
                Error::class_unregistered(format!("{}.{}", namespace.original, name.original))
            })
    }

    /// Panics when unregistered: serialization of an unregistered type is a
    /// programming error surfaced as early as possible.
    pub fn expect_info(&self, rust_type: RustTypeId, rust_name: &str) -> &Arc<TypeInfo> {
        self.infos.get(&rust_type).unwrap_or_else(|| {
            panic!("type {rust_name} is not registered; call Fory::register before serializing")
        })
    }

    pub fn struct_info_of(&self, rust_type: RustTypeId, rust_name: &str) -> Arc<StructInfo> {
        self.expect_info(rust_type, rust_name)
            .struct_info
            .clone()
            .unwrap_or_else(|| panic!("type {rust_name} has no struct serializer"))
    }
}
