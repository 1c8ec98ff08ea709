//! Fixed and variable-width primitive codecs.
//!
//! Every primitive here has a non-nullable form (raw value); the nullable
//! form is `Option<T>` whose presence rides the surrounding ref flag.
//! 64-bit integers default to the size-adaptive tagged form under the xlang
//! profile and to raw fixed bytes otherwise.

use crate::buffer::Writer;
use crate::error::Result;
use crate::fory::Fory;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{read_type_id, write_type_id, ForyDefault, Serializer};
use crate::types;

cfg_if::cfg_if! {
    if #[cfg(target_endian = "little")] {
        /// Appends a primitive slice as raw bytes; the in-memory layout
        /// already matches the wire on little-endian hosts.
        #[inline]
        fn write_packed<T>(items: &[T], writer: &mut Writer) {
            let raw = unsafe {
                std::slice::from_raw_parts(
                    items.as_ptr() as *const u8,
                    std::mem::size_of_val(items),
                )
            };
            writer.bytes(raw);
        }
    }
}

macro_rules! impl_fixed_primitive {
    ($ty:ty, $type_id:expr, $array_type_id:expr, $write:ident, $read:ident, $size:expr) => {
        impl ForyDefault for $ty {
            fn fory_default() -> Self {
                Default::default()
            }
        }

        impl Serializer for $ty {
            fn fory_type_id(_fory: &Fory) -> u32 {
                $type_id
            }

            fn fory_primitive_array_type_id() -> Option<u32> {
                Some($array_type_id)
            }

            fn fory_write_slice(items: &[Self], writer: &mut Writer) {
                #[cfg(target_endian = "little")]
                write_packed(items, writer);
                #[cfg(not(target_endian = "little"))]
                for item in items {
                    writer.$write(*item);
                }
            }

            fn fory_read_slice(n: usize, context: &mut ReadContext) -> Result<Vec<Self>> {
                let raw = context.reader.bytes(n * $size);
                context.reader.check()?;
                Ok(raw
                    .chunks_exact($size)
                    .map(|chunk| <$ty>::from_le_bytes(chunk.try_into().unwrap()))
                    .collect())
            }

            fn fory_write_data(&self, context: &mut WriteContext) {
                context.writer.$write(*self);
            }

            fn fory_write_type_info(context: &mut WriteContext) {
                write_type_id(context, $type_id);
            }

            fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
                Ok(context.reader.$read())
            }

            fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
                read_type_id(context, $type_id)
            }

            fn fory_reserved_space() -> usize {
                $size
            }
        }
    };
}

impl_fixed_primitive!(i8, types::INT8, types::INT8_ARRAY, i8, i8, 1);
impl_fixed_primitive!(i16, types::INT16, types::INT16_ARRAY, i16, i16, 2);
impl_fixed_primitive!(i32, types::INT32, types::INT32_ARRAY, i32, i32, 4);
impl_fixed_primitive!(u8, types::UINT8, types::BINARY, u8, u8, 1);
impl_fixed_primitive!(u16, types::UINT16, types::UINT16_ARRAY, u16, u16, 2);
impl_fixed_primitive!(u32, types::UINT32, types::UINT32_ARRAY, u32, u32, 4);
impl_fixed_primitive!(f32, types::FLOAT32, types::FLOAT32_ARRAY, f32, f32, 4);
impl_fixed_primitive!(f64, types::FLOAT64, types::FLOAT64_ARRAY, f64, f64, 8);

impl ForyDefault for bool {
    fn fory_default() -> Self {
        false
    }
}

impl Serializer for bool {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::BOOL
    }

    fn fory_primitive_array_type_id() -> Option<u32> {
        Some(types::BOOL_ARRAY)
    }

    fn fory_write_slice(items: &[Self], writer: &mut Writer) {
        for item in items {
            writer.bool(*item);
        }
    }

    fn fory_read_slice(n: usize, context: &mut ReadContext) -> Result<Vec<Self>> {
        let raw = context.reader.bytes(n);
        context.reader.check()?;
        // Elements travel as int8; any non-zero byte is true.
        Ok(raw.iter().map(|&b| b as i8 != 0).collect())
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        context.writer.bool(*self);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::BOOL);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(context.reader.bool())
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::BOOL)
    }

    fn fory_reserved_space() -> usize {
        1
    }
}

impl ForyDefault for i64 {
    fn fory_default() -> Self {
        0
    }
}

impl Serializer for i64 {
    fn fory_type_id(fory: &Fory) -> u32 {
        if fory.is_xlang() {
            types::TAGGED_INT64
        } else {
            types::INT64
        }
    }

    fn fory_primitive_array_type_id() -> Option<u32> {
        Some(types::INT64_ARRAY)
    }

    fn fory_write_slice(items: &[Self], writer: &mut Writer) {
        #[cfg(target_endian = "little")]
        write_packed(items, writer);
        #[cfg(not(target_endian = "little"))]
        for item in items {
            writer.i64(*item);
        }
    }

    fn fory_read_slice(n: usize, context: &mut ReadContext) -> Result<Vec<Self>> {
        let raw = context.reader.bytes(n * 8);
        context.reader.check()?;
        Ok(raw
            .chunks_exact(8)
            .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        if context.fory().is_xlang() {
            context.writer.tagged_int64(*self);
        } else {
            context.writer.i64(*self);
        }
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        let type_id = Self::fory_type_id(context.fory());
        write_type_id(context, type_id);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(if context.fory().is_xlang() {
            context.reader.tagged_int64()
        } else {
            context.reader.i64()
        })
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        let type_id = Self::fory_type_id(context.fory());
        read_type_id(context, type_id)
    }

    fn fory_reserved_space() -> usize {
        9
    }
}

impl ForyDefault for u64 {
    fn fory_default() -> Self {
        0
    }
}

impl Serializer for u64 {
    fn fory_type_id(fory: &Fory) -> u32 {
        if fory.is_xlang() {
            types::TAGGED_UINT64
        } else {
            types::UINT64
        }
    }

    fn fory_primitive_array_type_id() -> Option<u32> {
        Some(types::UINT64_ARRAY)
    }

    fn fory_write_slice(items: &[Self], writer: &mut Writer) {
        #[cfg(target_endian = "little")]
        write_packed(items, writer);
        #[cfg(not(target_endian = "little"))]
        for item in items {
            writer.u64(*item);
        }
    }

    fn fory_read_slice(n: usize, context: &mut ReadContext) -> Result<Vec<Self>> {
        let raw = context.reader.bytes(n * 8);
        context.reader.check()?;
        Ok(raw
            .chunks_exact(8)
            .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        if context.fory().is_xlang() {
            context.writer.tagged_uint64(*self);
        } else {
            context.writer.u64(*self);
        }
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        let type_id = Self::fory_type_id(context.fory());
        write_type_id(context, type_id);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        Ok(if context.fory().is_xlang() {
            context.reader.tagged_uint64()
        } else {
            context.reader.u64()
        })
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        let type_id = Self::fory_type_id(context.fory());
        read_type_id(context, type_id)
    }

    fn fory_reserved_space() -> usize {
        9
    }
}
