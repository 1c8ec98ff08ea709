//! Identifier interning encodings for namespaces and type names.
//!
//! General identifiers stay UTF-8. Type names drawn from the lowercase
//! charset `a-z . _ $ |` pack into 5 bits per character ("lower-special"),
//! with the first bit of the first byte flagging whether the decoder must
//! strip one trailing padding character.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MetaStringEncoding {
    Utf8 = 0,
    LowerSpecial = 1,
}

impl MetaStringEncoding {
    pub fn from_byte(b: u8) -> Result<MetaStringEncoding> {
        match b {
            0 => Ok(MetaStringEncoding::Utf8),
            1 => Ok(MetaStringEncoding::LowerSpecial),
            other => Err(Error::deserialization(format!(
                "unknown meta string encoding {other}"
            ))),
        }
    }
}

/// An identifier together with its chosen encoding and encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaString {
    pub original: String,
    pub encoding: MetaStringEncoding,
    pub bytes: Vec<u8>,
}

impl MetaString {
    pub fn empty() -> MetaString {
        MetaString {
            original: String::new(),
            encoding: MetaStringEncoding::Utf8,
            bytes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

#[inline]
fn lower_special_value(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a'),
        '.' => Some(26),
        '_' => Some(27),
        '$' => Some(28),
        '|' => Some(29),
        _ => None,
    }
}

#[inline]
fn lower_special_char(v: u8) -> Result<char> {
    match v {
        0..=25 => Ok((b'a' + v) as char),
        26 => Ok('.'),
        27 => Ok('_'),
        28 => Ok('$'),
        29 => Ok('|'),
        other => Err(Error::deserialization(format!(
            "invalid lower-special value {other}"
        ))),
    }
}

#[derive(Default)]
pub struct MetaStringEncoder;

impl MetaStringEncoder {
    /// Picks the densest encoding the character set permits.
    pub fn encode(&self, s: &str) -> MetaString {
        if !s.is_empty() && s.chars().all(|c| lower_special_value(c).is_some()) {
            MetaString {
                original: s.to_string(),
                encoding: MetaStringEncoding::LowerSpecial,
                bytes: encode_lower_special(s),
            }
        } else {
            MetaString {
                original: s.to_string(),
                encoding: MetaStringEncoding::Utf8,
                bytes: s.as_bytes().to_vec(),
            }
        }
    }

    pub fn decode(&self, bytes: &[u8], encoding: MetaStringEncoding) -> Result<MetaString> {
        let original = match encoding {
            MetaStringEncoding::Utf8 => std::str::from_utf8(bytes)
                .map_err(|_| Error::deserialization("meta string is not valid UTF-8"))?
                .to_string(),
            MetaStringEncoding::LowerSpecial => decode_lower_special(bytes)?,
        };
        Ok(MetaString {
            original,
            encoding,
            bytes: bytes.to_vec(),
        })
    }
}

fn encode_lower_special(s: &str) -> Vec<u8> {
    let n = s.chars().count();
    let total_bits = 1 + 5 * n;
    let n_bytes = total_bits.div_ceil(8);
    let mut out = vec![0u8; n_bytes];
    // A trailing gap of >= 5 bits would decode as one extra character.
    if n_bytes * 8 - total_bits >= 5 {
        out[0] |= 0x80;
    }
    let mut bit = 1usize;
    for c in s.chars() {
        let v = lower_special_value(c).expect("charset checked by encode");
        for i in 0..5 {
            if v & (1 << (4 - i)) != 0 {
                out[bit / 8] |= 0x80 >> (bit % 8);
            }
            bit += 1;
        }
    }
    out
}

fn decode_lower_special(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Ok(String::new());
    }
    let strip = bytes[0] & 0x80 != 0;
    let mut n = (bytes.len() * 8 - 1) / 5;
    if strip {
        n -= 1;
    }
    let mut out = String::with_capacity(n);
    let mut bit = 1usize;
    for _ in 0..n {
        let mut v = 0u8;
        for i in 0..5 {
            let byte = bytes[bit / 8];
            if byte & (0x80 >> (bit % 8)) != 0 {
                v |= 1 << (4 - i);
            }
            bit += 1;
        }
        out.push(lower_special_char(v)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_special_round_trip() {
        let encoder = MetaStringEncoder;
        for s in ["a", "ab", "foo", "org.example", "a_b$c|d", "abcdefghijklmnop"] {
            let ms = encoder.encode(s);
            assert_eq!(ms.encoding, MetaStringEncoding::LowerSpecial, "{s}");
            let back = encoder.decode(&ms.bytes, ms.encoding).unwrap();
            assert_eq!(back.original, s);
        }
    }

    #[test]
    fn lower_special_is_denser_than_utf8() {
        let encoder = MetaStringEncoder;
        let ms = encoder.encode("serialization");
        assert!(ms.bytes.len() < "serialization".len());
    }

    #[test]
    fn mixed_case_falls_back_to_utf8() {
        let encoder = MetaStringEncoder;
        for s in ["Foo", "order-book", "数据", ""] {
            let ms = encoder.encode(s);
            assert_eq!(ms.encoding, MetaStringEncoding::Utf8, "{s}");
            let back = encoder.decode(&ms.bytes, ms.encoding).unwrap();
            assert_eq!(back.original, s);
        }
    }
}
