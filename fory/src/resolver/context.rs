//! Per-call serialization state: the buffer plus the session-scoped
//! dictionaries (ref ids, meta strings, TypeDefs). A context lives for one
//! top-level call; nothing in it leaks across calls.

use std::any::TypeId as RustTypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::{Reader, Writer};
use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::meta::{MetaString, TypeDef};
use crate::resolver::meta_string_resolver::{MetaStringReaderResolver, MetaStringWriterResolver};
use crate::resolver::ref_resolver::{RefReader, RefWriter};
use crate::serializer::struct_::CompatStructInfo;

pub struct WriteContext<'a> {
    pub writer: &'a mut Writer,
    fory: &'a Fory,
    ref_writer: RefWriter,
    meta_writer: MetaStringWriterResolver,
    type_def_index: HashMap<RustTypeId, u32>,
}

impl<'a> WriteContext<'a> {
    pub fn new(fory: &'a Fory, writer: &'a mut Writer) -> WriteContext<'a> {
        WriteContext {
            writer,
            fory,
            ref_writer: RefWriter::default(),
            meta_writer: MetaStringWriterResolver::default(),
            type_def_index: HashMap::new(),
        }
    }

    #[inline]
    pub fn fory(&self) -> &'a Fory {
        self.fory
    }

    /// Write-side identity tracking; see [`RefWriter::try_register`].
    #[inline]
    pub fn track_ref(&mut self, identity: usize) -> Option<u32> {
        self.ref_writer.try_register(identity)
    }

    pub fn write_meta_string(&mut self, ms: &MetaString) {
        self.meta_writer.write(self.writer, ms);
    }

    /// Meta-share entry: first occurrence of a type writes
    /// `varuint(index << 1)` followed by the descriptor bytes; every later
    /// occurrence writes `varuint((index << 1) | 1)`.
    pub fn write_type_def(&mut self, key: RustTypeId, def: &TypeDef) {
        if let Some(&idx) = self.type_def_index.get(&key) {
            self.writer.var_uint32((idx << 1) | 1);
            return;
        }
        let idx = self.type_def_index.len() as u32;
        self.type_def_index.insert(key, idx);
        self.writer.var_uint32(idx << 1);
        def.write(self.writer);
    }
}

pub struct ReadContext<'a> {
    pub reader: Reader<'a>,
    fory: &'a Fory,
    ref_reader: RefReader,
    meta_reader: MetaStringReaderResolver,
    type_defs: Vec<Arc<TypeDef>>,
    pending_type_def: Option<Arc<TypeDef>>,
    compat_cache: HashMap<(RustTypeId, u64), Arc<CompatStructInfo>>,
}

impl<'a> ReadContext<'a> {
    pub fn new(fory: &'a Fory, reader: Reader<'a>) -> ReadContext<'a> {
        ReadContext {
            reader,
            fory,
            ref_reader: RefReader::default(),
            meta_reader: MetaStringReaderResolver::default(),
            type_defs: Vec::new(),
            pending_type_def: None,
            compat_cache: HashMap::new(),
        }
    }

    #[inline]
    pub fn fory(&self) -> &'a Fory {
        self.fory
    }

    #[inline]
    pub fn reserve_ref(&mut self) -> u32 {
        self.ref_reader.reserve()
    }

    #[inline]
    pub fn set_ref(&mut self, id: u32, obj: Box<dyn std::any::Any>) {
        self.ref_reader.set(id, obj);
    }

    #[inline]
    pub fn get_ref<T: Clone + 'static>(&self, id: u32) -> Option<T> {
        self.ref_reader.get(id)
    }

    pub fn read_meta_string(&mut self) -> Result<MetaString> {
        self.meta_reader.read(&mut self.reader)
    }

    /// Mirror of [`WriteContext::write_type_def`]; grows the session
    /// dictionary on first occurrence.
    pub fn read_type_def(&mut self) -> Result<Arc<TypeDef>> {
        let header = self.reader.var_uint32();
        self.reader.check()?;
        if header & 1 != 0 {
            let idx = (header >> 1) as usize;
            return self
                .type_defs
                .get(idx)
                .cloned()
                .ok_or_else(|| Error::deserialization(format!("type def index {idx} unknown")));
        }
        let idx = (header >> 1) as usize;
        if idx != self.type_defs.len() {
            return Err(Error::deserialization(format!(
                "type def index {idx} out of order (expected {})",
                self.type_defs.len()
            )));
        }
        let def = Arc::new(TypeDef::read(&mut self.reader)?);
        log::debug!(
            "interned remote type def {} ({} fields) at index {idx}",
            def.type_name.original,
            def.fields.len()
        );
        self.type_defs.push(def.clone());
        Ok(def)
    }

    /// Hands the struct reader the TypeDef its type info carried.
    pub fn set_pending_type_def(&mut self, def: Arc<TypeDef>) {
        self.pending_type_def = Some(def);
    }

    pub fn take_pending_type_def(&mut self) -> Option<Arc<TypeDef>> {
        self.pending_type_def.take()
    }

    pub fn cached_compat_info(&self, key: (RustTypeId, u64)) -> Option<Arc<CompatStructInfo>> {
        self.compat_cache.get(&key).cloned()
    }

    pub fn cache_compat_info(&mut self, key: (RustTypeId, u64), info: Arc<CompatStructInfo>) {
        self.compat_cache.insert(key, info);
    }

    /// Guardrail checks run before any element or byte decoding.
    pub fn check_collection_size(&self, actual: usize) -> Result<()> {
        Self::check_limit("collection", self.fory.config().max_collection_size, actual)
    }

    pub fn check_map_size(&self, actual: usize) -> Result<()> {
        Self::check_limit("map", self.fory.config().max_map_size, actual)
    }

    pub fn check_string_bytes(&self, actual: usize) -> Result<()> {
        Self::check_limit("string", self.fory.config().max_string_bytes, actual)
    }

    pub fn check_binary_size(&self, actual: usize) -> Result<()> {
        Self::check_limit("binary", self.fory.config().max_binary_size, actual)
    }

    fn check_limit(what: &'static str, limit: u64, actual: usize) -> Result<()> {
        if limit != 0 && actual as u64 > limit {
            return Err(Error::exceeds_limit(what, limit, actual as u64));
        }
        Ok(())
    }
}
