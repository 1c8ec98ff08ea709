//! The serializer capability set and the shared ref-flag protocol.
//!
//! Every serializable type implements [`Serializer`]: body codec
//! (`fory_write_data`/`fory_read_data`), type-info codec, and the flag-aware
//! entry points (`fory_write`/`fory_read`) whose default bodies implement
//! the null/ref preamble. Shared handles (`Rc<RefCell<T>>`) override the
//! entry points to add identity tracking.

pub mod collection;
pub mod datetime;
pub mod map;
pub mod option;
pub mod primitive;
pub mod rc;
pub mod string;
pub mod struct_;
pub mod union;

use crate::buffer::Writer;
use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::meta::FieldType;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::{RefFlag, RefMode};

pub(crate) const NULL_FLAG: i8 = RefFlag::Null as i8;
pub(crate) const REF_FLAG: i8 = RefFlag::Ref as i8;
pub(crate) const NOT_NULL_VALUE_FLAG: i8 = RefFlag::NotNullValue as i8;
pub(crate) const REF_VALUE_FLAG: i8 = RefFlag::RefValue as i8;

/// Default value used for null slots, missing compatible-mode fields, and
/// pre-registered cycle placeholders.
pub trait ForyDefault: Sized {
    fn fory_default() -> Self;
}

pub trait Serializer: ForyDefault + 'static {
    /// Type id this type serializes as under the given configuration.
    fn fory_type_id(fory: &Fory) -> u32;

    /// Declared type for schema descriptors; containers add generics.
    fn fory_field_type(fory: &Fory) -> FieldType {
        FieldType::new(Self::fory_type_id(fory))
    }

    fn fory_is_none(&self) -> bool {
        false
    }

    fn fory_is_option() -> bool {
        false
    }

    fn fory_is_shared_ref() -> bool {
        false
    }

    fn fory_is_struct() -> bool {
        false
    }

    /// For fixed-width primitives: the id of the packed-array form, enabling
    /// the homogeneous bulk fast path in collections.
    fn fory_primitive_array_type_id() -> Option<u32> {
        None
    }

    /// Packed little-endian run; only called when
    /// [`fory_primitive_array_type_id`](Serializer::fory_primitive_array_type_id)
    /// is `Some`.
    fn fory_write_slice(_items: &[Self], _writer: &mut Writer) {
        unreachable!("not a primitive array element")
    }

    fn fory_read_slice(_n: usize, _context: &mut ReadContext) -> Result<Vec<Self>> {
        unreachable!("not a primitive array element")
    }

    /// Conservative buffer pre-reservation hint.
    fn fory_reserved_space() -> usize {
        8
    }

    /// Writes the ref/null preamble per `ref_mode`, then type info when
    /// requested, then the body.
    fn fory_write(&self, context: &mut WriteContext, ref_mode: RefMode, write_type: bool) {
        write_ref_info_data(self, context, ref_mode, write_type);
    }

    fn fory_write_data(&self, context: &mut WriteContext);

    fn fory_write_type_info(context: &mut WriteContext);

    fn fory_read(context: &mut ReadContext, ref_mode: RefMode, read_type: bool) -> Result<Self> {
        read_ref_info_data(context, ref_mode, read_type)
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self>;

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()>;
}

/// Default write-side preamble for types without identity.
pub fn write_ref_info_data<T: Serializer>(
    value: &T,
    context: &mut WriteContext,
    ref_mode: RefMode,
    write_type: bool,
) {
    if ref_mode.has_ref_flag() {
        if value.fory_is_none() {
            context.writer.i8(NULL_FLAG);
            return;
        }
        context.writer.i8(NOT_NULL_VALUE_FLAG);
    } else if value.fory_is_none() {
        panic!("cannot write a null value into a non-nullable wire position");
    }
    if write_type {
        T::fory_write_type_info(context);
    }
    value.fory_write_data(context);
}

/// Default read-side preamble. A `RefValue` flag from a tracking writer
/// still reserves a ref id so the numbering stays aligned, even when the
/// local type carries no identity.
pub fn read_ref_info_data<T: Serializer>(
    context: &mut ReadContext,
    ref_mode: RefMode,
    read_type: bool,
) -> Result<T> {
    if !ref_mode.has_ref_flag() {
        if read_type {
            T::fory_read_type_info(context)?;
        }
        return T::fory_read_data(context);
    }
    let flag = context.reader.i8();
    context.reader.check()?;
    match flag {
        NULL_FLAG => Ok(T::fory_default()),
        NOT_NULL_VALUE_FLAG => {
            if read_type {
                T::fory_read_type_info(context)?;
            }
            T::fory_read_data(context)
        }
        REF_VALUE_FLAG => {
            let _ = context.reserve_ref();
            if read_type {
                T::fory_read_type_info(context)?;
            }
            T::fory_read_data(context)
        }
        REF_FLAG => {
            let id = context.reader.var_uint32();
            context.reader.check()?;
            Err(Error::deserialization(format!(
                "back-reference {id} targets a type without identity"
            )))
        }
        other => Err(Error::deserialization(format!("unknown ref flag {other}"))),
    }
}

/// Writes the varuint tag of a built-in type.
#[inline]
pub fn write_type_id(context: &mut WriteContext, type_id: u32) {
    context.writer.var_uint32(type_id);
}

/// Reads a varuint type tag and checks it against the expectation.
pub fn read_type_id(context: &mut ReadContext, expected: u32) -> Result<()> {
    let actual = context.reader.var_uint32();
    context.reader.check()?;
    if actual != expected {
        return Err(Error::unexpected_type_id(expected, actual));
    }
    Ok(())
}

/// Whether element values of `T` carry inline type info. Only struct types
/// do, and only in compatible mode where the descriptor must travel.
#[inline]
pub(crate) fn element_writes_type_info<T: Serializer>(fory: &Fory) -> bool {
    fory.is_compatible() && T::fory_is_struct()
}
