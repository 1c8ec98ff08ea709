//! Helpers behind derived enum and union codecs.
//!
//! Unit-only enums travel as a varuint ordinal (one byte below 128); enums
//! with data-carrying variants travel as unions: varuint arm index, the
//! active arm's TypeInfo under the xlang profile, then the arm body.

use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::Serializer;

/// Whether the active arm's TypeInfo travels with the union body: always
/// under the xlang profile, and for struct arms in compatible mode where
/// the TypeDef must reach the reader.
pub fn arm_writes_type_info<T: Serializer>(fory: &Fory) -> bool {
    fory.is_xlang() || (fory.is_compatible() && T::fory_is_struct())
}

#[inline]
pub fn write_enum_ordinal(context: &mut WriteContext, ordinal: u32) {
    context.writer.var_uint32(ordinal);
}

#[inline]
pub fn read_enum_ordinal(context: &mut ReadContext) -> Result<u32> {
    let ordinal = context.reader.var_uint32();
    context.reader.check()?;
    Ok(ordinal)
}

/// Default schema-evolution policy: an ordinal the local enum does not know
/// degrades to the default variant instead of failing the read.
pub fn report_unknown_ordinal(type_name: &str, ordinal: u32) {
    log::warn!("enum {type_name} has no variant for ordinal {ordinal}; using the default variant");
}

#[inline]
pub fn write_union_index(context: &mut WriteContext, index: u32) {
    context.writer.var_uint32(index);
}

pub fn read_union_index(context: &mut ReadContext, arm_count: u32, type_name: &str) -> Result<u32> {
    let index = context.reader.var_uint32();
    context.reader.check()?;
    if index >= arm_count {
        return Err(Error::deserialization(format!(
            "union index {index} out of range for {type_name} ({arm_count} arms)"
        )));
    }
    Ok(index)
}
