//! Chunked map protocol. Each chunk is a header byte carrying six flags, a
//! size byte in `1..=255`, optional key/value TypeInfo, then the pairs.
//! Entries with a null key or value travel as singleton chunks whose size
//! byte is implicit, so a homogeneous map of `M` entries never needs more
//! than `ceil(M / 255)` chunks.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::meta::FieldType;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{
    element_writes_type_info, read_type_id, write_type_id, ForyDefault, Serializer,
};
use crate::types::{self, RefMode};

pub mod map_flags {
    pub const TRACKING_KEY_REF: u8 = 0b00_0001;
    pub const KEY_HAS_NULL: u8 = 0b00_0010;
    pub const KEY_DECL_TYPE: u8 = 0b00_0100;
    pub const TRACKING_VALUE_REF: u8 = 0b00_1000;
    pub const VALUE_HAS_NULL: u8 = 0b01_0000;
    pub const VALUE_DECL_TYPE: u8 = 0b10_0000;
}

use map_flags::*;

pub(crate) const MAX_CHUNK_SIZE: usize = 255;

fn write_entry_side<T: Serializer>(
    value: &T,
    context: &mut WriteContext,
    mode: RefMode,
    write_type: bool,
) {
    if mode.tracks_refs() {
        value.fory_write(context, mode, write_type);
    } else if write_type {
        value.fory_write(context, RefMode::None, true);
    } else {
        value.fory_write_data(context);
    }
}

fn read_entry_side<T: Serializer>(
    context: &mut ReadContext,
    mode: RefMode,
    read_type: bool,
) -> Result<T> {
    if mode.tracks_refs() {
        T::fory_read(context, mode, read_type)
    } else if read_type {
        T::fory_read(context, RefMode::None, true)
    } else {
        T::fory_read_data(context)
    }
}

#[allow(clippy::too_many_arguments)]
fn flush_chunk<K: Serializer, V: Serializer>(
    context: &mut WriteContext,
    header: u8,
    chunk: &mut Vec<(&K, &V)>,
    key_mode: RefMode,
    value_mode: RefMode,
    write_key_type: bool,
    write_value_type: bool,
) {
    if chunk.is_empty() {
        return;
    }
    context.writer.u8(header);
    context.writer.u8(chunk.len() as u8);
    for &(k, v) in chunk.iter() {
        write_entry_side(k, context, key_mode, write_key_type);
        write_entry_side(v, context, value_mode, write_value_type);
    }
    chunk.clear();
}

impl<K: Serializer + Eq + Hash, V: Serializer> ForyDefault for HashMap<K, V> {
    fn fory_default() -> Self {
        HashMap::new()
    }
}

impl<K: Serializer + Eq + Hash, V: Serializer> Serializer for HashMap<K, V> {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::MAP
    }

    fn fory_field_type(fory: &Fory) -> FieldType {
        FieldType::with_generics(
            types::MAP,
            vec![K::fory_field_type(fory), V::fory_field_type(fory)],
        )
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        context.writer.write_length(self.len());
        let fory = context.fory();
        let key_tracking = K::fory_is_shared_ref() && fory.is_track_ref();
        let value_tracking = V::fory_is_shared_ref() && fory.is_track_ref();
        let mut base = KEY_DECL_TYPE | VALUE_DECL_TYPE;
        if key_tracking {
            base |= TRACKING_KEY_REF;
        }
        if value_tracking {
            base |= TRACKING_VALUE_REF;
        }
        let key_mode = RefMode::from_flags(false, key_tracking);
        let value_mode = RefMode::from_flags(false, value_tracking);
        let write_key_type = element_writes_type_info::<K>(fory);
        let write_value_type = element_writes_type_info::<V>(fory);

        let mut chunk: Vec<(&K, &V)> = Vec::new();
        for (k, v) in self.iter() {
            if k.fory_is_none() || v.fory_is_none() {
                flush_chunk(
                    context,
                    base,
                    &mut chunk,
                    key_mode,
                    value_mode,
                    write_key_type,
                    write_value_type,
                );
                let mut header = base;
                if k.fory_is_none() {
                    header |= KEY_HAS_NULL;
                }
                if v.fory_is_none() {
                    header |= VALUE_HAS_NULL;
                }
                context.writer.u8(header);
                if !k.fory_is_none() {
                    write_entry_side(k, context, key_mode, write_key_type);
                }
                if !v.fory_is_none() {
                    write_entry_side(v, context, value_mode, write_value_type);
                }
            } else {
                chunk.push((k, v));
                if chunk.len() == MAX_CHUNK_SIZE {
                    flush_chunk(
                        context,
                        base,
                        &mut chunk,
                        key_mode,
                        value_mode,
                        write_key_type,
                        write_value_type,
                    );
                }
            }
        }
        flush_chunk(
            context,
            base,
            &mut chunk,
            key_mode,
            value_mode,
            write_key_type,
            write_value_type,
        );
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::MAP);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        let total = context.reader.read_length();
        context.reader.check()?;
        context.check_map_size(total)?;
        let read_key_type = element_writes_type_info::<K>(context.fory());
        let read_value_type = element_writes_type_info::<V>(context.fory());
        let mut out = HashMap::with_capacity(total.min(4096));
        let mut read = 0usize;
        while read < total {
            let header = context.reader.u8();
            context.reader.check()?;
            let key_mode = RefMode::from_flags(false, header & TRACKING_KEY_REF != 0);
            let value_mode = RefMode::from_flags(false, header & TRACKING_VALUE_REF != 0);
            if header & (KEY_HAS_NULL | VALUE_HAS_NULL) != 0 {
                let k = if header & KEY_HAS_NULL != 0 {
                    K::fory_default()
                } else {
                    read_entry_side::<K>(context, key_mode, read_key_type)?
                };
                let v = if header & VALUE_HAS_NULL != 0 {
                    V::fory_default()
                } else {
                    read_entry_side::<V>(context, value_mode, read_value_type)?
                };
                out.insert(k, v);
                read += 1;
            } else {
                let n = context.reader.u8() as usize;
                context.reader.check()?;
                if n == 0 || read + n > total {
                    return Err(Error::deserialization(format!(
                        "malformed map chunk: size {n} with {read}/{total} entries read"
                    )));
                }
                for _ in 0..n {
                    let k = read_entry_side::<K>(context, key_mode, read_key_type)?;
                    let v = read_entry_side::<V>(context, value_mode, read_value_type)?;
                    out.insert(k, v);
                }
                read += n;
            }
        }
        Ok(out)
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::MAP)
    }

    fn fory_reserved_space() -> usize {
        16
    }
}
