use proc_macro::TokenStream;

mod attr;
mod derive;

/// Derive macro generating the `fory` serialization impls for a struct or
/// enum.
///
/// For structs, the macro walks every named field and emits a static field
/// descriptor table (name, `offset_of!` byte offset, declared type,
/// annotation overrides). All ordering, grouping, and dispatch decisions
/// happen in the core at registration time; the generated code contains no
/// serialization logic of its own.
///
/// Unit-only enums serialize as a varuint ordinal. Enums with payload
/// variants serialize as unions: a varuint arm index followed by the active
/// arm's body. Payload variants must hold exactly one unnamed field.
///
/// Field annotations:
///
/// - `#[fory(ignore)]` — exclude the field (it keeps its default on read)
/// - `#[fory(id = N)]` — explicit tag id used for schema-evolution matching
/// - `#[fory(nullable)]` — force a null flag for a non-`Option` field
/// - `#[fory(track_ref)]` — force reference tracking for this field
/// - `#[fory(compress)]` — varint encoding for 32/64-bit integers
/// - `#[fory(encoding = "fixed" | "varint" | "tagged")]` — 64-bit integer
///   wire form
#[proc_macro_derive(ForyObject, attributes(fory))]
pub fn derive_fory_object(input: TokenStream) -> TokenStream {
    derive::derive(input)
}
