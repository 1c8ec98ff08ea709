pub mod meta_string;
pub mod murmur3;
pub mod type_meta;

use once_cell::sync::Lazy;

pub use meta_string::{MetaString, MetaStringEncoder, MetaStringEncoding};
pub use type_meta::{FieldDef, FieldType, TypeDef};

/// Seed for TypeDef hashes; distinct from the fingerprint seed so the two
/// hash domains never collide.
pub const TYPE_DEF_HASH_SEED: u32 = 47;
/// Seed for struct fingerprints.
pub const FINGERPRINT_HASH_SEED: u32 = 17;

pub static NAMESPACE_ENCODER: Lazy<MetaStringEncoder> = Lazy::new(MetaStringEncoder::default);
pub static TYPE_NAME_ENCODER: Lazy<MetaStringEncoder> = Lazy::new(MetaStringEncoder::default);

/// Normalizes identifiers for cross-language field matching; remote peers
/// may send camelCase names.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_normalization() {
        assert_eq!(to_snake_case("orderId"), "order_id");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("HTTPCode"), "httpcode");
        assert_eq!(to_snake_case("price2Qty"), "price2_qty");
    }
}
