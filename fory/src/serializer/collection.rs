//! Chunk-free list/set protocol: varuint length, one flag byte, optional
//! element TypeInfo, then elements. Homogeneous primitive arrays bypass the
//! element loop entirely with a packed little-endian copy.

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::Result;
use crate::fory::Fory;
use crate::meta::FieldType;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{
    element_writes_type_info, read_type_id, write_type_id, ForyDefault, Serializer,
};
use crate::types::{self, RefMode};

pub mod collection_flags {
    /// Elements participate in reference tracking.
    pub const TRACKING_REF: u8 = 0b0001;
    /// At least one element is null.
    pub const HAS_NULL: u8 = 0b0010;
    /// The element type equals the declared generic type.
    pub const IS_DECL_ELEMENT_TYPE: u8 = 0b0100;
    /// All elements share one concrete type.
    pub const IS_SAME_TYPE: u8 = 0b1000;
}

use collection_flags::*;

#[inline]
pub(crate) fn element_ref_mode(flags: u8) -> RefMode {
    if flags & TRACKING_REF != 0 {
        RefMode::Tracking
    } else if flags & HAS_NULL != 0 {
        RefMode::NullOnly
    } else {
        RefMode::None
    }
}

pub(crate) fn write_collection_body<'a, T, I>(context: &mut WriteContext, len: usize, items: I)
where
    T: Serializer + 'a,
    I: Iterator<Item = &'a T> + Clone,
{
    context.writer.write_length(len);
    let tracking = T::fory_is_shared_ref() && context.fory().is_track_ref();
    let has_null = T::fory_is_option() && items.clone().any(|item| item.fory_is_none());
    let mut flags = IS_SAME_TYPE | IS_DECL_ELEMENT_TYPE;
    if tracking {
        flags |= TRACKING_REF;
    }
    if has_null {
        flags |= HAS_NULL;
    }
    context.writer.u8(flags);
    let mode = element_ref_mode(flags);
    let write_type = element_writes_type_info::<T>(context.fory());
    if mode == RefMode::None && !write_type {
        for item in items {
            item.fory_write_data(context);
        }
    } else {
        for item in items {
            item.fory_write(context, mode, write_type);
        }
    }
}

pub(crate) fn read_collection_items<T: Serializer>(
    context: &mut ReadContext,
    n: usize,
) -> Result<Vec<T>> {
    let flags = context.reader.u8();
    context.reader.check()?;
    let mode = element_ref_mode(flags);
    let mut out = Vec::with_capacity(n.min(4096));
    if flags & IS_SAME_TYPE == 0 {
        // Heterogeneous peer stream: every element carries its own type info.
        for _ in 0..n {
            out.push(T::fory_read(context, mode, true)?);
        }
        return Ok(out);
    }
    if flags & IS_DECL_ELEMENT_TYPE == 0 {
        // One shared element TypeInfo precedes the elements.
        T::fory_read_type_info(context)?;
        for _ in 0..n {
            out.push(T::fory_read(context, mode, false)?);
        }
        return Ok(out);
    }
    let read_type = element_writes_type_info::<T>(context.fory());
    if mode == RefMode::None && !read_type {
        for _ in 0..n {
            out.push(T::fory_read_data(context)?);
        }
    } else {
        for _ in 0..n {
            out.push(T::fory_read(context, mode, read_type)?);
        }
    }
    Ok(out)
}

impl<T: Serializer> ForyDefault for Vec<T> {
    fn fory_default() -> Self {
        Vec::new()
    }
}

impl<T: Serializer> Serializer for Vec<T> {
    fn fory_type_id(_fory: &Fory) -> u32 {
        T::fory_primitive_array_type_id().unwrap_or(types::LIST)
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        match T::fory_primitive_array_type_id() {
            Some(array_id) => FieldType::new(array_id),
            None => FieldType::with_generics(types::LIST, vec![T::fory_field_type(fory)]),
        }
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        if T::fory_primitive_array_type_id().is_some() {
            context.writer.write_length(self.len());
            T::fory_write_slice(self, context.writer);
            return;
        }
        write_collection_body(context, self.len(), self.iter());
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        let type_id = Self::fory_type_id(context.fory());
        write_type_id(context, type_id);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        let n = context.reader.read_length();
        context.reader.check()?;
        if let Some(array_id) = T::fory_primitive_array_type_id() {
            if array_id == types::BINARY {
                context.check_binary_size(n)?;
            } else {
                context.check_collection_size(n)?;
            }
            return T::fory_read_slice(n, context);
        }
        context.check_collection_size(n)?;
        read_collection_items(context, n)
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        let type_id = Self::fory_type_id(context.fory());
        read_type_id(context, type_id)
    }

    fn fory_reserved_space() -> usize {
        16
    }
}

impl<T: Serializer + Eq + Hash> ForyDefault for HashSet<T> {
    fn fory_default() -> Self {
        HashSet::new()
    }
}

impl<T: Serializer + Eq + Hash> Serializer for HashSet<T> {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::SET
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        FieldType::with_generics(types::SET, vec![T::fory_field_type(fory)])
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        write_collection_body(context, self.len(), self.iter());
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::SET);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        let n = context.reader.read_length();
        context.reader.check()?;
        context.check_collection_size(n)?;
        let items = read_collection_items::<T>(context, n)?;
        Ok(items.into_iter().collect())
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::SET)
    }

    fn fory_reserved_space() -> usize {
        16
    }
}
