use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Wire flags preceding a value whenever nullability or reference tracking is
/// in play. `Ref` is followed by the varuint id of a previously written
/// object; `RefValue` marks the first occurrence of a referencable object and
/// implicitly claims the next ref id in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i8)]
pub enum RefFlag {
    Null = -3,
    Ref = -2,
    NotNullValue = -1,
    RefValue = 0,
}

/// Controls how reference and null flags are handled for one value position.
///
/// - `None`: non-nullable, no tracking; no flag byte on the wire.
/// - `NullOnly`: nullable without circular-reference tracking.
/// - `Tracking`: nullable with identity tracking (`Rc<RefCell<T>>` graphs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RefMode {
    #[default]
    None = 0,
    NullOnly = 1,
    Tracking = 2,
}

impl RefMode {
    #[inline]
    pub const fn from_flags(nullable: bool, track_ref: bool) -> Self {
        match (nullable, track_ref) {
            (false, false) => RefMode::None,
            (true, false) => RefMode::NullOnly,
            (_, true) => RefMode::Tracking,
        }
    }

    #[inline]
    pub const fn has_ref_flag(self) -> bool {
        !matches!(self, RefMode::None)
    }

    #[inline]
    pub const fn tracks_refs(self) -> bool {
        matches!(self, RefMode::Tracking)
    }
}

/// The closed type-id enumeration. Numeric assignments are part of the wire
/// contract and must not drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum TypeId {
    UNKNOWN = 0,
    BOOL = 1,
    INT8 = 2,
    INT16 = 3,
    INT32 = 4,
    VARINT32 = 5,
    INT64 = 6,
    VARINT64 = 7,
    TAGGED_INT64 = 8,
    UINT8 = 9,
    UINT16 = 10,
    UINT32 = 11,
    VAR_UINT32 = 12,
    UINT64 = 13,
    VAR_UINT64 = 14,
    TAGGED_UINT64 = 15,
    FLOAT8 = 16,
    FLOAT16 = 17,
    BFLOAT16 = 18,
    FLOAT32 = 19,
    FLOAT64 = 20,
    STRING = 21,
    LIST = 22,
    SET = 23,
    MAP = 24,
    ENUM = 25,
    NAMED_ENUM = 26,
    STRUCT = 27,
    COMPATIBLE_STRUCT = 28,
    NAMED_STRUCT = 29,
    NAMED_COMPATIBLE_STRUCT = 30,
    EXT = 31,
    NAMED_EXT = 32,
    UNION = 33,
    TYPED_UNION = 34,
    NAMED_UNION = 35,
    NONE = 36,
    DURATION = 37,
    TIMESTAMP = 38,
    DATE = 39,
    DECIMAL = 40,
    BINARY = 41,
    ARRAY = 42,
    BOOL_ARRAY = 43,
    INT8_ARRAY = 44,
    INT16_ARRAY = 45,
    INT32_ARRAY = 46,
    INT64_ARRAY = 47,
    UINT8_ARRAY = 48,
    UINT16_ARRAY = 49,
    UINT32_ARRAY = 50,
    UINT64_ARRAY = 51,
    FLOAT8_ARRAY = 52,
    FLOAT16_ARRAY = 53,
    BFLOAT16_ARRAY = 54,
    FLOAT32_ARRAY = 55,
    FLOAT64_ARRAY = 56,
}

pub const UNKNOWN: u32 = TypeId::UNKNOWN as u32;
pub const BOOL: u32 = TypeId::BOOL as u32;
pub const INT8: u32 = TypeId::INT8 as u32;
pub const INT16: u32 = TypeId::INT16 as u32;
pub const INT32: u32 = TypeId::INT32 as u32;
pub const VARINT32: u32 = TypeId::VARINT32 as u32;
pub const INT64: u32 = TypeId::INT64 as u32;
pub const VARINT64: u32 = TypeId::VARINT64 as u32;
pub const TAGGED_INT64: u32 = TypeId::TAGGED_INT64 as u32;
pub const UINT8: u32 = TypeId::UINT8 as u32;
pub const UINT16: u32 = TypeId::UINT16 as u32;
pub const UINT32: u32 = TypeId::UINT32 as u32;
pub const VAR_UINT32: u32 = TypeId::VAR_UINT32 as u32;
pub const UINT64: u32 = TypeId::UINT64 as u32;
pub const VAR_UINT64: u32 = TypeId::VAR_UINT64 as u32;
pub const TAGGED_UINT64: u32 = TypeId::TAGGED_UINT64 as u32;
pub const FLOAT32: u32 = TypeId::FLOAT32 as u32;
pub const FLOAT64: u32 = TypeId::FLOAT64 as u32;
pub const STRING: u32 = TypeId::STRING as u32;
pub const LIST: u32 = TypeId::LIST as u32;
pub const SET: u32 = TypeId::SET as u32;
pub const MAP: u32 = TypeId::MAP as u32;
pub const ENUM: u32 = TypeId::ENUM as u32;
pub const NAMED_ENUM: u32 = TypeId::NAMED_ENUM as u32;
pub const STRUCT: u32 = TypeId::STRUCT as u32;
pub const COMPATIBLE_STRUCT: u32 = TypeId::COMPATIBLE_STRUCT as u32;
pub const NAMED_STRUCT: u32 = TypeId::NAMED_STRUCT as u32;
pub const NAMED_COMPATIBLE_STRUCT: u32 = TypeId::NAMED_COMPATIBLE_STRUCT as u32;
pub const EXT: u32 = TypeId::EXT as u32;
pub const NAMED_EXT: u32 = TypeId::NAMED_EXT as u32;
pub const UNION: u32 = TypeId::UNION as u32;
pub const TYPED_UNION: u32 = TypeId::TYPED_UNION as u32;
pub const NAMED_UNION: u32 = TypeId::NAMED_UNION as u32;
pub const NONE: u32 = TypeId::NONE as u32;
pub const DURATION: u32 = TypeId::DURATION as u32;
pub const TIMESTAMP: u32 = TypeId::TIMESTAMP as u32;
pub const DATE: u32 = TypeId::DATE as u32;
pub const BINARY: u32 = TypeId::BINARY as u32;
pub const BOOL_ARRAY: u32 = TypeId::BOOL_ARRAY as u32;
pub const INT8_ARRAY: u32 = TypeId::INT8_ARRAY as u32;
pub const UINT8_ARRAY: u32 = TypeId::UINT8_ARRAY as u32;
pub const INT16_ARRAY: u32 = TypeId::INT16_ARRAY as u32;
pub const INT32_ARRAY: u32 = TypeId::INT32_ARRAY as u32;
pub const INT64_ARRAY: u32 = TypeId::INT64_ARRAY as u32;
pub const UINT16_ARRAY: u32 = TypeId::UINT16_ARRAY as u32;
pub const UINT32_ARRAY: u32 = TypeId::UINT32_ARRAY as u32;
pub const UINT64_ARRAY: u32 = TypeId::UINT64_ARRAY as u32;
pub const FLOAT32_ARRAY: u32 = TypeId::FLOAT32_ARRAY as u32;
pub const FLOAT64_ARRAY: u32 = TypeId::FLOAT64_ARRAY as u32;

/// First id available to user registrations; 0..63 belong to built-ins.
pub const MIN_USER_TYPE_ID: u32 = 64;

/// Top-level header bits written before any payload byte.
pub mod config_flags {
    pub const IS_NULL_FLAG: u8 = 1 << 0;
    pub const IS_LITTLE_ENDIAN_FLAG: u8 = 1 << 1;
    pub const IS_XLANG_FLAG: u8 = 1 << 2;
    pub const IS_OUT_OF_BAND_FLAG: u8 = 1 << 3;
    pub const REF_TRACKING_FLAG: u8 = 1 << 4;
    pub const META_SHARE_FLAG: u8 = 1 << 5;
}

/// Peer language tag written after the header under the xlang profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Language {
    Java = 0,
    Python = 1,
    Cpp = 2,
    Go = 3,
    JavaScript = 4,
    Rust = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Type declarations must match between peers; struct fingerprints are
    /// written and checked.
    SchemaConsistent,
    /// Peers may add/remove fields independently; TypeDefs are shared inline
    /// and drive the read path.
    Compatible,
}

#[inline(always)]
pub const fn is_primitive_type_id(type_id: u32) -> bool {
    matches!(
        type_id,
        BOOL | INT8
            | INT16
            | INT32
            | VARINT32
            | INT64
            | VARINT64
            | TAGGED_INT64
            | UINT8
            | UINT16
            | UINT32
            | VAR_UINT32
            | UINT64
            | VAR_UINT64
            | TAGGED_UINT64
            | FLOAT32
            | FLOAT64
    )
}

/// Compressed variants sort after fixed-width ones inside the primitive
/// group and land in the varint write phase.
#[inline(always)]
pub const fn is_compressed_type_id(type_id: u32) -> bool {
    matches!(
        type_id,
        VARINT32 | VAR_UINT32 | VARINT64 | VAR_UINT64 | TAGGED_INT64 | TAGGED_UINT64
    )
}

/// In-memory byte width of a fixed-width primitive; also its wire width.
#[inline(always)]
pub const fn fixed_size_of(type_id: u32) -> usize {
    match type_id {
        BOOL | INT8 | UINT8 => 1,
        INT16 | UINT16 => 2,
        INT32 | UINT32 | FLOAT32 => 4,
        INT64 | UINT64 | FLOAT64 => 8,
        _ => 0,
    }
}

/// Worst-case wire width of a compressed primitive.
#[inline(always)]
pub const fn varint_max_size_of(type_id: u32) -> usize {
    match type_id {
        VARINT32 | VAR_UINT32 => 5,
        VARINT64 | VAR_UINT64 => 10,
        TAGGED_INT64 | TAGGED_UINT64 => 9,
        _ => 0,
    }
}

/// Whether a field of this declared type carries inline type info in
/// compatible mode. Internal types and enums never do.
#[inline(always)]
pub const fn need_to_write_type_for_field(type_id: u32) -> bool {
    matches!(
        type_id,
        STRUCT | COMPATIBLE_STRUCT | NAMED_STRUCT | NAMED_COMPATIBLE_STRUCT | EXT | NAMED_EXT
            | UNKNOWN
    )
}

/// Equivalence used when matching remote fields to local ones in compatible
/// mode. Union flavors are wire-compatible, as are i8/u8 arrays and binary.
pub fn types_compatible(a: u32, b: u32) -> bool {
    if a == b {
        return true;
    }
    let union_class = |id| matches!(id, UNION | TYPED_UNION | NAMED_UNION);
    let byte_array_class = |id| matches!(id, INT8_ARRAY | UINT8_ARRAY | BINARY);
    (union_class(a) && union_class(b)) || (byte_array_class(a) && byte_array_class(b))
}

/// Human-readable name for diagnostics.
pub fn format_type_id(type_id: u32) -> &'static str {
    if type_id >= MIN_USER_TYPE_ID {
        return "USER";
    }
    match TypeId::try_from(type_id as u8) {
        Ok(TypeId::UNKNOWN) => "UNKNOWN",
        Ok(TypeId::BOOL) => "BOOL",
        Ok(TypeId::INT8) => "INT8",
        Ok(TypeId::INT16) => "INT16",
        Ok(TypeId::INT32) => "INT32",
        Ok(TypeId::VARINT32) => "VARINT32",
        Ok(TypeId::INT64) => "INT64",
        Ok(TypeId::VARINT64) => "VARINT64",
        Ok(TypeId::TAGGED_INT64) => "TAGGED_INT64",
        Ok(TypeId::UINT8) => "UINT8",
        Ok(TypeId::UINT16) => "UINT16",
        Ok(TypeId::UINT32) => "UINT32",
        Ok(TypeId::VAR_UINT32) => "VAR_UINT32",
        Ok(TypeId::UINT64) => "UINT64",
        Ok(TypeId::VAR_UINT64) => "VAR_UINT64",
        Ok(TypeId::TAGGED_UINT64) => "TAGGED_UINT64",
        Ok(TypeId::FLOAT8) => "FLOAT8",
        Ok(TypeId::FLOAT16) => "FLOAT16",
        Ok(TypeId::BFLOAT16) => "BFLOAT16",
        Ok(TypeId::FLOAT32) => "FLOAT32",
        Ok(TypeId::FLOAT64) => "FLOAT64",
        Ok(TypeId::STRING) => "STRING",
        Ok(TypeId::LIST) => "LIST",
        Ok(TypeId::SET) => "SET",
        Ok(TypeId::MAP) => "MAP",
        Ok(TypeId::ENUM) => "ENUM",
        Ok(TypeId::NAMED_ENUM) => "NAMED_ENUM",
        Ok(TypeId::STRUCT) => "STRUCT",
        Ok(TypeId::COMPATIBLE_STRUCT) => "COMPATIBLE_STRUCT",
        Ok(TypeId::NAMED_STRUCT) => "NAMED_STRUCT",
        Ok(TypeId::NAMED_COMPATIBLE_STRUCT) => "NAMED_COMPATIBLE_STRUCT",
        Ok(TypeId::EXT) => "EXT",
        Ok(TypeId::NAMED_EXT) => "NAMED_EXT",
        Ok(TypeId::UNION) => "UNION",
        Ok(TypeId::TYPED_UNION) => "TYPED_UNION",
        Ok(TypeId::NAMED_UNION) => "NAMED_UNION",
        Ok(TypeId::NONE) => "NONE",
        Ok(TypeId::DURATION) => "DURATION",
        Ok(TypeId::TIMESTAMP) => "TIMESTAMP",
        Ok(TypeId::DATE) => "DATE",
        Ok(TypeId::DECIMAL) => "DECIMAL",
        Ok(TypeId::BINARY) => "BINARY",
        Ok(TypeId::ARRAY) => "ARRAY",
        Ok(TypeId::BOOL_ARRAY) => "BOOL_ARRAY",
        Ok(TypeId::INT8_ARRAY) => "INT8_ARRAY",
        Ok(TypeId::INT16_ARRAY) => "INT16_ARRAY",
        Ok(TypeId::INT32_ARRAY) => "INT32_ARRAY",
        Ok(TypeId::INT64_ARRAY) => "INT64_ARRAY",
        Ok(TypeId::UINT8_ARRAY) => "UINT8_ARRAY",
        Ok(TypeId::UINT16_ARRAY) => "UINT16_ARRAY",
        Ok(TypeId::UINT32_ARRAY) => "UINT32_ARRAY",
        Ok(TypeId::UINT64_ARRAY) => "UINT64_ARRAY",
        Ok(TypeId::FLOAT8_ARRAY) => "FLOAT8_ARRAY",
        Ok(TypeId::FLOAT16_ARRAY) => "FLOAT16_ARRAY",
        Ok(TypeId::BFLOAT16_ARRAY) => "BFLOAT16_ARRAY",
        Ok(TypeId::FLOAT32_ARRAY) => "FLOAT32_ARRAY",
        Ok(TypeId::FLOAT64_ARRAY) => "FLOAT64_ARRAY",
        _ => "UNKNOWN_TYPE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_assignments_do_not_drift() {
        assert_eq!(BOOL, 1);
        assert_eq!(TAGGED_INT64, 8);
        assert_eq!(FLOAT32, 19);
        assert_eq!(FLOAT64, 20);
        assert_eq!(STRING, 21);
        assert_eq!(NAMED_STRUCT, 29);
        assert_eq!(UNION, 33);
        assert_eq!(BINARY, 41);
        assert_eq!(FLOAT64_ARRAY, 56);
    }

    #[test]
    fn compatibility_classes() {
        assert!(types_compatible(UNION, NAMED_UNION));
        assert!(types_compatible(INT8_ARRAY, BINARY));
        assert!(types_compatible(UINT8_ARRAY, INT8_ARRAY));
        assert!(!types_compatible(INT32, VARINT32));
        assert!(!types_compatible(STRING, BINARY));
    }

    #[test]
    fn ref_mode_from_flags() {
        assert_eq!(RefMode::from_flags(false, false), RefMode::None);
        assert_eq!(RefMode::from_flags(true, false), RefMode::NullOnly);
        assert_eq!(RefMode::from_flags(false, true), RefMode::Tracking);
    }
}
