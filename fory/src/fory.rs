//! The public façade: configuration, the registration API, and the
//! top-level header/payload framing.
//!
//! A `Fory` instance is not safe for concurrent serialization calls; pool
//! per-thread instances if parallelism is required. After the registration
//! phase the registry is read-only and lookups are lock-free.

use std::any::TypeId as RustTypeId;
use std::sync::Arc;

use crate::buffer::{Reader, Writer};
use crate::ensure;
use crate::error::{Error, Result};
use crate::meta::{MetaString, NAMESPACE_ENCODER, TYPE_NAME_ENCODER};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::type_resolver::{TypeInfo, TypeKind, TypeResolver};
use crate::serializer::struct_::{build_struct_info, type_def_of, ForyStruct};
use crate::serializer::Serializer;
use crate::types::{config_flags, Language, Mode, RefMode};

/// Runtime knobs; see the builder methods on [`Fory`]. Limit fields use `0`
/// for "unlimited".
#[derive(Debug, Clone)]
pub struct Config {
    pub xlang: bool,
    pub mode: Mode,
    pub track_ref: bool,
    pub compress_string: bool,
    /// Whether compatible-mode reads may skip values of types unknown to
    /// this registry instead of failing.
    pub allow_unknown: bool,
    pub max_string_bytes: u64,
    pub max_collection_size: u64,
    pub max_map_size: u64,
    pub max_binary_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            xlang: true,
            mode: Mode::SchemaConsistent,
            track_ref: false,
            compress_string: false,
            allow_unknown: true,
            max_string_bytes: 64 * 1024 * 1024,
            max_collection_size: 1_000_000,
            max_map_size: 1_000_000,
            max_binary_size: 64 * 1024 * 1024,
        }
    }
}

#[derive(Default)]
pub struct Fory {
    config: Config,
    type_resolver: TypeResolver,
}

impl Fory {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Schema-evolution switch: `true` selects [`Mode::Compatible`].
    pub fn compatible(mut self, compatible: bool) -> Self {
        self.config.mode = if compatible {
            Mode::Compatible
        } else {
            Mode::SchemaConsistent
        };
        self
    }

    pub fn xlang(mut self, xlang: bool) -> Self {
        self.config.xlang = xlang;
        self
    }

    pub fn track_ref(mut self, track_ref: bool) -> Self {
        self.config.track_ref = track_ref;
        self
    }

    pub fn compress_string(mut self, compress_string: bool) -> Self {
        self.config.compress_string = compress_string;
        self
    }

    pub fn allow_unknown(mut self, allow_unknown: bool) -> Self {
        self.config.allow_unknown = allow_unknown;
        self
    }

    pub fn max_string_bytes(mut self, limit: u64) -> Self {
        self.config.max_string_bytes = limit;
        self
    }

    pub fn max_collection_size(mut self, limit: u64) -> Self {
        self.config.max_collection_size = limit;
        self
    }

    pub fn max_map_size(mut self, limit: u64) -> Self {
        self.config.max_map_size = limit;
        self
    }

    pub fn max_binary_size(mut self, limit: u64) -> Self {
        self.config.max_binary_size = limit;
        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_xlang(&self) -> bool {
        self.config.xlang
    }

    #[inline]
    pub fn is_compatible(&self) -> bool {
        self.config.mode == Mode::Compatible
    }

    #[inline]
    pub fn is_track_ref(&self) -> bool {
        self.config.track_ref
    }

    #[inline]
    pub fn is_compress_string(&self) -> bool {
        self.config.compress_string
    }

    #[inline]
    pub fn get_mode(&self) -> Mode {
        self.config.mode
    }

    #[inline]
    pub fn type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    /// Registers `T` under an explicit user id (>= 64).
    pub fn register<T: ForyStruct>(&mut self, id: u32) -> Result<()> {
        let info = self.build_type_info::<T>(Some(id), None)?;
        self.type_resolver.register(RustTypeId::of::<T>(), info)
    }

    /// Registers `T` under the smallest free user id and returns it.
    pub fn register_auto<T: ForyStruct>(&mut self) -> Result<u32> {
        let id = self.type_resolver.next_auto_id();
        self.register::<T>(id)?;
        Ok(id)
    }

    /// Registers `T` under a qualified `(namespace, name)` pair. The name
    /// must not contain `.`; dots belong to the namespace.
    pub fn register_by_namespace<T: ForyStruct>(
        &mut self,
        namespace: &str,
        type_name: &str,
    ) -> Result<()> {
        ensure!(
            !type_name.contains('.'),
            Error::serialization(format!(
                "type name {type_name} must not contain '.'; use the namespace for the dotted path"
            ))
        );
        let info = self.build_type_info::<T>(None, Some((namespace, type_name)))?;
        self.type_resolver.register(RustTypeId::of::<T>(), info)
    }

    pub fn register_by_name<T: ForyStruct>(&mut self, type_name: &str) -> Result<()> {
        self.register_by_namespace::<T>("", type_name)
    }

    /// Registers a hand-written serializer as an extension type under a
    /// user id. The type's own `Serializer` impl provides the body codec.
    pub fn register_serializer<T: Serializer>(&mut self, id: u32) -> Result<()> {
        let info = TypeInfo {
            kind: TypeKind::Ext,
            type_id: id,
            user_type_id: Some(id),
            register_by_name: false,
            namespace: MetaString::empty(),
            type_name: MetaString::empty(),
            rust_name: std::any::type_name::<T>(),
            type_def: None,
            struct_info: None,
        };
        self.type_resolver.register(RustTypeId::of::<T>(), info)
    }

    fn build_type_info<T: ForyStruct>(
        &self,
        id: Option<u32>,
        named: Option<(&str, &str)>,
    ) -> Result<TypeInfo> {
        let kind = T::fory_kind();
        let register_by_name = named.is_some();
        let (namespace, type_name) = match named {
            Some((ns, name)) => (
                NAMESPACE_ENCODER.encode(ns),
                TYPE_NAME_ENCODER.encode(name),
            ),
            None => (MetaString::empty(), MetaString::empty()),
        };
        let (struct_info, type_def) = if kind == TypeKind::Struct {
            let info = Arc::new(build_struct_info(
                self,
                T::fory_type_name(),
                T::fory_fields(self),
            ));
            let def = Arc::new(type_def_of(
                &info,
                id.unwrap_or(0),
                register_by_name,
                namespace.clone(),
                type_name.clone(),
            ));
            (Some(info), Some(def))
        } else {
            (None, None)
        };
        Ok(TypeInfo {
            kind,
            type_id: match id {
                Some(id) => id,
                None => kind.named_tag(),
            },
            user_type_id: id,
            register_by_name,
            namespace,
            type_name,
            rust_name: T::fory_type_name(),
            type_def,
            struct_info,
        })
    }

    pub fn serialize<T: Serializer>(&self, value: &T) -> Result<Vec<u8>> {
        let mut writer = Writer::with_capacity(T::fory_reserved_space() + 8);
        self.serialize_into(value, &mut writer)?;
        Ok(writer.dump())
    }

    /// Serializes into a caller-provided (possibly pooled) writer.
    pub fn serialize_into<T: Serializer>(&self, value: &T, writer: &mut Writer) -> Result<()> {
        let mut context = WriteContext::new(self, writer);
        let is_none = value.fory_is_none();
        let mut bitmap = config_flags::IS_LITTLE_ENDIAN_FLAG;
        if self.config.xlang {
            bitmap |= config_flags::IS_XLANG_FLAG;
        }
        if self.config.track_ref {
            bitmap |= config_flags::REF_TRACKING_FLAG;
        }
        if self.is_compatible() {
            bitmap |= config_flags::META_SHARE_FLAG;
        }
        if is_none {
            bitmap |= config_flags::IS_NULL_FLAG;
        }
        context.writer.u8(bitmap);
        if is_none {
            return Ok(());
        }
        if self.config.xlang {
            context.writer.u8(Language::Rust as u8);
        }
        value.fory_write(&mut context, self.root_ref_mode(), true);
        Ok(())
    }

    pub fn deserialize<T: Serializer>(&self, bytes: &[u8]) -> Result<T> {
        let mut context = ReadContext::new(self, Reader::new(bytes));
        let bitmap = context.reader.u8();
        context.reader.check()?;
        ensure!(
            bitmap & config_flags::IS_LITTLE_ENDIAN_FLAG != 0,
            Error::deserialization("big-endian payloads are not supported")
        );
        let peer_xlang = bitmap & config_flags::IS_XLANG_FLAG != 0;
        ensure!(
            peer_xlang == self.config.xlang,
            Error::deserialization("xlang header bit does not match this configuration")
        );
        ensure!(
            (bitmap & config_flags::REF_TRACKING_FLAG != 0) == self.config.track_ref,
            Error::deserialization("ref-tracking header bit does not match this configuration")
        );
        ensure!(
            (bitmap & config_flags::META_SHARE_FLAG != 0) == self.is_compatible(),
            Error::deserialization("meta-share header bit does not match this configuration")
        );
        if bitmap & config_flags::IS_NULL_FLAG != 0 {
            return Ok(T::fory_default());
        }
        if peer_xlang {
            let _peer_language = context.reader.u8();
        }
        let value = T::fory_read(&mut context, self.root_ref_mode(), true)?;
        context.reader.check()?;
        Ok(value)
    }

    #[inline]
    fn root_ref_mode(&self) -> RefMode {
        if self.config.track_ref {
            RefMode::Tracking
        } else {
            RefMode::None
        }
    }
}

impl Fory {
    #[inline]
    pub(crate) fn allow_unknown_types(&self) -> bool {
        self.config.allow_unknown
    }
}
