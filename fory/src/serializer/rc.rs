//! Shared handles. `Rc<RefCell<T>>` carries identity: under a tracking wire
//! position the first occurrence writes `RefValue` and claims the next ref
//! id, repeats write `Ref` plus the id. On read the handle is registered
//! *before* its body is read (two-phase), so a cycle back to an in-flight
//! object resolves to the same allocation.
//!
//! `Arc<T>` shares identity the same way but has no interior mutability, so
//! its handle registers after the body; acyclic sharing round-trips, a
//! cycle through it fails cleanly. `Box<T>` is plain indirection for
//! recursive shapes and carries no identity.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::meta::FieldType;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{
    read_ref_info_data, write_ref_info_data, ForyDefault, Serializer, NOT_NULL_VALUE_FLAG,
    NULL_FLAG, REF_FLAG, REF_VALUE_FLAG,
};
use crate::types::RefMode;

impl<T: Serializer> ForyDefault for Rc<RefCell<T>> {
    fn fory_default() -> Self {
        Rc::new(RefCell::new(T::fory_default()))
    }
}

impl<T: Serializer> Serializer for Rc<RefCell<T>> {
    fn fory_type_id(fory: &Fory) -> u32 {
        T::fory_type_id(fory)
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        T::fory_field_type(fory)
    }

    fn fory_is_shared_ref() -> bool {
        true
    }

    fn fory_is_struct() -> bool {
        T::fory_is_struct()
    }

    fn fory_write(&self, context: &mut WriteContext, ref_mode: RefMode, write_type: bool) {
        if !ref_mode.tracks_refs() {
            write_ref_info_data(self, context, ref_mode, write_type);
            return;
        }
        let identity = Rc::as_ptr(self) as usize;
        if let Some(id) = context.track_ref(identity) {
            context.writer.i8(REF_FLAG);
            context.writer.var_uint32(id);
            return;
        }
        context.writer.i8(REF_VALUE_FLAG);
        if write_type {
            T::fory_write_type_info(context);
        }
        self.borrow().fory_write_data(context);
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        self.borrow().fory_write_data(context);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        T::fory_write_type_info(context);
    }

    fn fory_read(context: &mut ReadContext, ref_mode: RefMode, read_type: bool) -> Result<Self> {
        if !ref_mode.tracks_refs() {
            return read_ref_info_data(context, ref_mode, read_type);
        }
        let flag = context.reader.i8();
        context.reader.check()?;
        match flag {
            REF_VALUE_FLAG => {
                let id = context.reserve_ref();
                let handle: Rc<RefCell<T>> = Rc::new(RefCell::new(T::fory_default()));
                context.set_ref(id, Box::new(handle.clone()));
                if read_type {
                    T::fory_read_type_info(context)?;
                }
                let value = T::fory_read_data(context)?;
                *handle.borrow_mut() = value;
                Ok(handle)
            }
            REF_FLAG => {
                let id = context.reader.var_uint32();
                context.reader.check()?;
                context.get_ref::<Rc<RefCell<T>>>(id).ok_or_else(|| {
                    Error::deserialization(format!("back-reference {id} has no registered object"))
                })
            }
            NOT_NULL_VALUE_FLAG => {
                if read_type {
                    T::fory_read_type_info(context)?;
                }
                Ok(Rc::new(RefCell::new(T::fory_read_data(context)?)))
            }
            NULL_FLAG => Err(Error::deserialization(
                "null for a non-nullable shared reference",
            )),
            other => Err(Error::deserialization(format!("unknown ref flag {other}"))),
        }
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(Rc::new(RefCell::new(T::fory_read_data(context)?)))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        T::fory_read_type_info(context)
    }

    fn fory_reserved_space() -> usize {
        T::fory_reserved_space()
    }
}

impl<T: Serializer> ForyDefault for Arc<T> {
    fn fory_default() -> Self {
        Arc::new(T::fory_default())
    }
}

impl<T: Serializer> Serializer for Arc<T> {
    fn fory_type_id(fory: &Fory) -> u32 {
        T::fory_type_id(fory)
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        T::fory_field_type(fory)
    }

    fn fory_is_shared_ref() -> bool {
        true
    }

    fn fory_is_struct() -> bool {
        T::fory_is_struct()
    }

    fn fory_write(&self, context: &mut WriteContext, ref_mode: RefMode, write_type: bool) {
        if !ref_mode.tracks_refs() {
            write_ref_info_data(self, context, ref_mode, write_type);
            return;
        }
        let identity = Arc::as_ptr(self) as usize;
        if let Some(id) = context.track_ref(identity) {
            context.writer.i8(REF_FLAG);
            context.writer.var_uint32(id);
            return;
        }
        context.writer.i8(REF_VALUE_FLAG);
        if write_type {
            T::fory_write_type_info(context);
        }
        (**self).fory_write_data(context);
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        (**self).fory_write_data(context);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        T::fory_write_type_info(context);
    }

    fn fory_read(context: &mut ReadContext, ref_mode: RefMode, read_type: bool) -> Result<Self> {
        if !ref_mode.tracks_refs() {
            return read_ref_info_data(context, ref_mode, read_type);
        }
        let flag = context.reader.i8();
        context.reader.check()?;
        match flag {
            REF_VALUE_FLAG => {
                // The id is claimed up front to keep numbering aligned, but
                // the handle only exists once the body is read; a cycle
                // through an Arc therefore surfaces as a missing slot.
                let id = context.reserve_ref();
                if read_type {
                    T::fory_read_type_info(context)?;
                }
                let handle = Arc::new(T::fory_read_data(context)?);
                context.set_ref(id, Box::new(handle.clone()));
                Ok(handle)
            }
            REF_FLAG => {
                let id = context.reader.var_uint32();
                context.reader.check()?;
                context.get_ref::<Arc<T>>(id).ok_or_else(|| {
                    Error::deserialization(format!("back-reference {id} has no registered object"))
                })
            }
            NOT_NULL_VALUE_FLAG => {
                if read_type {
                    T::fory_read_type_info(context)?;
                }
                Ok(Arc::new(T::fory_read_data(context)?))
            }
            NULL_FLAG => Err(Error::deserialization(
                "null for a non-nullable shared reference",
            )),
            other => Err(Error::deserialization(format!("unknown ref flag {other}"))),
        }
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(Arc::new(T::fory_read_data(context)?))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        T::fory_read_type_info(context)
    }

    fn fory_reserved_space() -> usize {
        T::fory_reserved_space()
    }
}

impl<T: Serializer> ForyDefault for Box<T> {
    fn fory_default() -> Self {
        Box::new(T::fory_default())
    }
}

impl<T: Serializer> Serializer for Box<T> {
    fn fory_type_id(fory: &Fory) -> u32 {
        T::fory_type_id(fory)
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        T::fory_field_type(fory)
    }

    fn fory_is_struct() -> bool {
        T::fory_is_struct()
    }

    fn fory_is_none(&self) -> bool {
        (**self).fory_is_none()
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        (**self).fory_write_data(context);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        T::fory_write_type_info(context);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(Box::new(T::fory_read_data(context)?))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        T::fory_read_type_info(context)
    }

    fn fory_reserved_space() -> usize {
        T::fory_reserved_space()
    }
}
