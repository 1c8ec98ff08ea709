//! Cross-language binary serialization with reference tracking and schema
//! evolution.
//!
//! The engine serializes registered types into a compact little-endian wire
//! format shared across language implementations. Struct bodies are written
//! in three phases (fixed primitives, varint primitives, everything else)
//! over field groups precomputed at registration, so the common path never
//! touches reflection-like lookups.
//!
//! ```
//! use fory::{Fory, ForyObject};
//!
//! #[derive(ForyObject, Debug, PartialEq)]
//! struct Event {
//!     id: i32,
//!     name: String,
//!     ok: bool,
//! }
//!
//! let mut fory = Fory::default();
//! fory.register::<Event>(100).unwrap();
//!
//! let event = Event { id: 42, name: "boot".to_string(), ok: true };
//! let bytes = fory.serialize(&event).unwrap();
//! let back: Event = fory.deserialize(&bytes).unwrap();
//! assert_eq!(event, back);
//! ```
//!
//! Schema evolution is opt-in via [`Fory::compatible`]: peers may then add
//! and remove fields independently, with schema descriptors shared inline
//! once per stream. Shared and cyclic object graphs round-trip through
//! `Rc<RefCell<T>>` fields when [`Fory::track_ref`] is enabled.

pub mod buffer;
pub mod error;
#[allow(clippy::module_inception)]
pub mod fory;
pub mod meta;
pub mod pool;
pub mod resolver;
pub mod serializer;
pub mod types;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::fory::{Config, Fory};
pub use crate::pool::BufferPool;
pub use crate::resolver::type_resolver::{TypeInfo, TypeKind, TypeResolver};
pub use crate::serializer::struct_::{
    FieldDescriptor, FieldKind, FieldOverrides, ForyStruct, IntEncoding,
};
pub use crate::serializer::{ForyDefault, Serializer};
pub use crate::types::{Language, Mode, RefFlag, RefMode, TypeId};

pub use fory_macros::ForyObject;
