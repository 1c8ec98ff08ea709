//! Optional values. Presence collapses into the surrounding ref flag: the
//! wrapper writes `NULL` for `None` and otherwise defers the whole preamble
//! (including identity tracking for shared inners) to the wrapped value.

use crate::error::Result;
use crate::fory::Fory;
use crate::meta::FieldType;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{ForyDefault, Serializer, NULL_FLAG};
use crate::types::RefMode;

impl<T: Serializer> ForyDefault for Option<T> {
    fn fory_default() -> Self {
        None
    }
}

impl<T: Serializer> Serializer for Option<T> {
    fn fory_type_id(fory: &Fory) -> u32 {
        T::fory_type_id(fory)
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        T::fory_field_type(fory)
    }

    fn fory_is_none(&self) -> bool {
        self.is_none()
    }

    fn fory_is_option() -> bool {
        true
    }

    fn fory_is_shared_ref() -> bool {
        T::fory_is_shared_ref()
    }

    fn fory_is_struct() -> bool {
        T::fory_is_struct()
    }

    fn fory_write(&self, context: &mut WriteContext, ref_mode: RefMode, write_type: bool) {
        match self {
            None => {
                if !ref_mode.has_ref_flag() {
                    panic!("cannot write None into a non-nullable wire position");
                }
                context.writer.i8(NULL_FLAG);
            }
            Some(value) => value.fory_write(context, ref_mode, write_type),
        }
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        match self {
            Some(value) => value.fory_write_data(context),
            None => panic!("cannot write None as a raw body"),
        }
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        T::fory_write_type_info(context);
    }

    fn fory_read(context: &mut ReadContext, ref_mode: RefMode, read_type: bool) -> Result<Self> {
        if !ref_mode.has_ref_flag() {
            return Ok(Some(T::fory_read(context, ref_mode, read_type)?));
        }
        if context.reader.peek_u8() as i8 == NULL_FLAG {
            context.reader.skip(1);
            return Ok(None);
        }
        Ok(Some(T::fory_read(context, ref_mode, read_type)?))
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(Some(T::fory_read_data(context)?))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        T::fory_read_type_info(context)
    }

    fn fory_reserved_space() -> usize {
        1 + T::fory_reserved_space()
    }
}
