//! Canonical byte encoding for hashing and signing.
//!
//! The output is compact JSON with a fixed shape:
//!
//! - object keys sorted by their text (code-point order) at every level
//! - no insignificant whitespace (`,` and `:` separators only)
//! - integers as plain decimal; integral floats collapse to integers
//! - strings are ASCII-only: `"` `\` and the short control escapes
//!   (`\b \f \n \r \t`) use their two-character form, every other character
//!   outside `0x20..=0x7E` is written as `\uXXXX` (lowercase hex, UTF-16
//!   surrogate pairs above the BMP)
//!
//! Two values that serialize to the same keys and values always produce the
//! same bytes, whatever order their maps were built in. Values with no
//! canonical form (NaN, infinities, duplicate keys, non-scalar map keys) are
//! rejected with [`GatewayError::Encoding`].
//!
//! The encoder is a `serde::Serializer`, so any `Serialize` type can be
//! canonicalized without first going through `serde_json::Value` (which
//! would silently turn NaN into `null`).

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use govgate_types::{GatewayError, Result};
use serde::Serialize;
use serde::ser;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Deterministic encoder for hashing/signing input.
pub struct CanonicalEncoder;

impl CanonicalEncoder {
    /// Encode `value` into canonical bytes.
    ///
    /// # Errors
    /// Returns [`GatewayError::Encoding`] if any part of `value` has no
    /// canonical form.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        value
            .serialize(ValueEncoder)
            .map_err(|err| GatewayError::Encoding { reason: err.0 })
    }

    /// Encode into a `String`. Canonical output is always ASCII.
    pub fn encode_to_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        let bytes = Self::encode(value)?;
        String::from_utf8(bytes).map_err(|e| GatewayError::Internal(e.to_string()))
    }
}

/// Internal serializer error; converted to [`GatewayError::Encoding`] at the boundary.
#[derive(Debug)]
struct EncodeError(String);

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for EncodeError {}

impl ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

type EncodeResult<T> = std::result::Result<T, EncodeError>;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn quote(s: &str) -> Vec<u8> {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out.push('"');
    out.into_bytes()
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn encode_f64(v: f64) -> EncodeResult<Vec<u8>> {
    if !v.is_finite() {
        return Err(EncodeError(format!(
            "non-finite float {v} has no canonical form"
        )));
    }
    if v.fract() == 0.0 && v.abs() < MAX_SAFE_FLOAT_INT {
        // Integral: render exactly like the integer (also folds -0.0 into 0).
        return Ok((v as i64).to_string().into_bytes());
    }
    serde_json::Number::from_f64(v)
        .map(|n| n.to_string().into_bytes())
        .ok_or_else(|| EncodeError(format!("float {v} has no canonical form")))
}

/// Recover the text of an encoded map key. Only strings and integers qualify.
fn key_text(encoded: Vec<u8>) -> EncodeResult<String> {
    if encoded.first() == Some(&b'"') {
        return serde_json::from_slice::<String>(&encoded)
            .map_err(|e| EncodeError(format!("unreadable map key: {e}")));
    }
    let integral = !encoded.is_empty()
        && encoded
            .iter()
            .enumerate()
            .all(|(i, b)| b.is_ascii_digit() || (i == 0 && *b == b'-' && encoded.len() > 1));
    if integral {
        return String::from_utf8(encoded).map_err(|e| EncodeError(e.to_string()));
    }
    Err(EncodeError(
        "map keys must be strings or integers".to_string(),
    ))
}

fn wrap_variant(variant: &str, inner: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(inner.len() + variant.len() + 4);
    out.push(b'{');
    out.extend(quote(variant));
    out.push(b':');
    out.extend(inner);
    out.push(b'}');
    out
}

// ---------------------------------------------------------------------------
// Value serializer
// ---------------------------------------------------------------------------

struct ValueEncoder;

impl ser::Serializer for ValueEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    type SerializeSeq = SeqEncoder;
    type SerializeTuple = SeqEncoder;
    type SerializeTupleStruct = SeqEncoder;
    type SerializeTupleVariant = VariantSeqEncoder;
    type SerializeMap = MapEncoder;
    type SerializeStruct = MapEncoder;
    type SerializeStructVariant = VariantMapEncoder;

    fn serialize_bool(self, v: bool) -> EncodeResult<Vec<u8>> {
        Ok(if v { b"true".to_vec() } else { b"false".to_vec() })
    }

    fn serialize_i8(self, v: i8) -> EncodeResult<Vec<u8>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> EncodeResult<Vec<u8>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> EncodeResult<Vec<u8>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> EncodeResult<Vec<u8>> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_i128(self, v: i128) -> EncodeResult<Vec<u8>> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_u8(self, v: u8) -> EncodeResult<Vec<u8>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> EncodeResult<Vec<u8>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> EncodeResult<Vec<u8>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> EncodeResult<Vec<u8>> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_u128(self, v: u128) -> EncodeResult<Vec<u8>> {
        Ok(v.to_string().into_bytes())
    }

    fn serialize_f32(self, v: f32) -> EncodeResult<Vec<u8>> {
        encode_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> EncodeResult<Vec<u8>> {
        encode_f64(v)
    }

    fn serialize_char(self, v: char) -> EncodeResult<Vec<u8>> {
        let mut buf = [0u8; 4];
        Ok(quote(v.encode_utf8(&mut buf)))
    }

    fn serialize_str(self, v: &str) -> EncodeResult<Vec<u8>> {
        Ok(quote(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> EncodeResult<Vec<u8>> {
        let mut seq = SeqEncoder::with_capacity(v.len());
        for b in v {
            seq.push(b)?;
        }
        Ok(seq.finish())
    }

    fn serialize_none(self) -> EncodeResult<Vec<u8>> {
        Ok(b"null".to_vec())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> EncodeResult<Vec<u8>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> EncodeResult<Vec<u8>> {
        Ok(b"null".to_vec())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> EncodeResult<Vec<u8>> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> EncodeResult<Vec<u8>> {
        Ok(quote(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> EncodeResult<Vec<u8>> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> EncodeResult<Vec<u8>> {
        Ok(wrap_variant(variant, value.serialize(ValueEncoder)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> EncodeResult<SeqEncoder> {
        Ok(SeqEncoder::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> EncodeResult<SeqEncoder> {
        Ok(SeqEncoder::with_capacity(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> EncodeResult<SeqEncoder> {
        Ok(SeqEncoder::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> EncodeResult<VariantSeqEncoder> {
        Ok(VariantSeqEncoder {
            variant,
            seq: SeqEncoder::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> EncodeResult<MapEncoder> {
        Ok(MapEncoder::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> EncodeResult<MapEncoder> {
        Ok(MapEncoder::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> EncodeResult<VariantMapEncoder> {
        Ok(VariantMapEncoder {
            variant,
            map: MapEncoder::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

struct SeqEncoder {
    items: Vec<Vec<u8>>,
}

impl SeqEncoder {
    fn with_capacity(len: usize) -> Self {
        Self {
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.items.push(value.serialize(ValueEncoder)?);
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        let mut out = vec![b'['];
        for (i, item) in self.items.into_iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.extend(item);
        }
        out.push(b']');
        out
    }
}

impl ser::SerializeSeq for SeqEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.push(value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.push(value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.push(value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(self.finish())
    }
}

struct VariantSeqEncoder {
    variant: &'static str,
    seq: SeqEncoder,
}

impl ser::SerializeTupleVariant for VariantSeqEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        self.seq.push(value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(wrap_variant(self.variant, self.seq.finish()))
    }
}

// ---------------------------------------------------------------------------
// Maps and structs
// ---------------------------------------------------------------------------

/// Collects entries keyed by their text; `BTreeMap` yields them sorted.
#[derive(Default)]
struct MapEncoder {
    entries: BTreeMap<String, Vec<u8>>,
    pending_key: Option<String>,
}

impl MapEncoder {
    fn insert(&mut self, key: String, value: Vec<u8>) -> EncodeResult<()> {
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            Entry::Occupied(slot) => Err(EncodeError(format!(
                "duplicate map key {:?}",
                slot.key()
            ))),
        }
    }

    fn finish(self) -> Vec<u8> {
        let mut out = vec![b'{'];
        for (i, (key, value)) in self.entries.into_iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.extend(quote(&key));
            out.push(b':');
            out.extend(value);
        }
        out.push(b'}');
        out
    }
}

impl ser::SerializeMap for MapEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> EncodeResult<()> {
        self.pending_key = Some(key_text(key.serialize(ValueEncoder)?)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> EncodeResult<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| EncodeError("map value without a key".to_string()))?;
        let value = value.serialize(ValueEncoder)?;
        self.insert(key, value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> EncodeResult<()> {
        let value = value.serialize(ValueEncoder)?;
        self.insert(key.to_string(), value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(self.finish())
    }
}

struct VariantMapEncoder {
    variant: &'static str,
    map: MapEncoder,
}

impl ser::SerializeStructVariant for VariantMapEncoder {
    type Ok = Vec<u8>;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> EncodeResult<()> {
        ser::SerializeStruct::serialize_field(&mut self.map, key, value)
    }

    fn end(self) -> EncodeResult<Vec<u8>> {
        Ok(wrap_variant(self.variant, self.map.finish()))
    }
}
