use std::fmt;

use crate::types::format_type_id;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of failure categories surfaced by the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Struct fingerprint check failed in schema-consistent mode.
    #[error("struct hash mismatch for {type_name}: expected {expected:#010x}, actual {actual:#010x}")]
    HashMismatch {
        expected: u32,
        actual: u32,
        type_name: String,
    },

    #[error("invalid UTF-16 string bytes")]
    InvalidUtf16String,

    /// A read ran past the written region of the buffer.
    #[error("buffer out of bounds: needed {needed} bytes, {remaining} remaining")]
    BufferOutOfBounds { needed: usize, remaining: usize },

    /// A deserialization-time guardrail tripped before any payload decoding.
    #[error("{what} length {actual} exceeds limit {limit}")]
    ExceedsLimit {
        what: &'static str,
        limit: u64,
        actual: u64,
    },

    #[error("type {name} is not registered")]
    ClassUnregistered { name: String },

    #[error("no serializer registered for {name}")]
    SerializerUnregistered { name: String },
}

/// An [`ErrorKind`] plus a short trail of context frames appended while
/// unwinding, e.g. `[struct Order]`. Frames are ordered innermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    frames: Vec<String>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            frames: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Appends a context frame; used at serializer boundaries.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Serialization(msg.into()))
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Deserialization(msg.into()))
    }

    pub fn hash_mismatch(expected: u32, actual: u32, type_name: &str) -> Self {
        Error::new(ErrorKind::HashMismatch {
            expected,
            actual,
            type_name: type_name.to_string(),
        })
    }

    pub fn out_of_bounds(needed: usize, remaining: usize) -> Self {
        Error::new(ErrorKind::BufferOutOfBounds { needed, remaining })
    }

    pub fn exceeds_limit(what: &'static str, limit: u64, actual: u64) -> Self {
        Error::new(ErrorKind::ExceedsLimit {
            what,
            limit,
            actual,
        })
    }

    pub fn class_unregistered(name: impl Into<String>) -> Self {
        Error::new(ErrorKind::ClassUnregistered { name: name.into() })
    }

    pub fn serializer_unregistered(name: impl Into<String>) -> Self {
        Error::new(ErrorKind::SerializerUnregistered { name: name.into() })
    }

    pub fn unexpected_type_id(expected: u32, actual: u32) -> Self {
        Error::deserialization(format!(
            "unexpected type id: expected {} ({}), actual {} ({})",
            expected,
            format_type_id(expected),
            actual,
            format_type_id(actual)
        ))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.frames {
            write!(f, " {}", frame)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

/// Returns early with the given error when the condition does not hold.
/// Write-side validation fails eagerly; read-side hot loops use the deferred
/// error on [`Reader`](crate::buffer::Reader) instead.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_render_innermost_first() {
        let err = Error::deserialization("boom")
            .with_frame("[struct Inner]")
            .with_frame("[struct Outer]");
        assert_eq!(
            err.to_string(),
            "deserialization error: boom [struct Inner] [struct Outer]"
        );
    }

    #[test]
    fn limit_error_carries_context() {
        let err = Error::exceeds_limit("collection", 3, 10);
        match err.kind() {
            ErrorKind::ExceedsLimit {
                what,
                limit,
                actual,
            } => {
                assert_eq!(*what, "collection");
                assert_eq!(*limit, 3);
                assert_eq!(*actual, 10);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
