//! The open value model: what an untyped decode produces and what the encoder
//! accepts when no record shape is in play.

use core::fmt;

use crate::cid::{Cid, RawCid};
use crate::order::cmp_encoded_keys;
use crate::wire::{write_head, MAJOR_TEXT};
use crate::{Error, ErrorCode};

/// An integer in the DRISL range `[-(2^64), 2^64-1]`.
///
/// Wire integers cover the union of the `u64` and `i64` ranges plus the
/// single extra value `-(2^64)`, so neither primitive fits alone; the value
/// is held as a range-checked `i128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Int(i128);

impl Int {
    /// Smallest representable integer, `-(2^64)`.
    pub const MIN: Self = Self(-(1_i128 << 64));
    /// Largest representable integer, `2^64 - 1`.
    pub const MAX: Self = Self((1_i128 << 64) - 1);

    /// Construct from a wide integer.
    ///
    /// # Errors
    ///
    /// Returns `IntegerOverflow` if the value is outside `[-(2^64), 2^64-1]`.
    pub fn new(v: i128) -> Result<Self, Error> {
        if v < Self::MIN.0 || v > Self::MAX.0 {
            return Err(Error::new(ErrorCode::IntegerOverflow, 0));
        }
        Ok(Self(v))
    }

    /// The value as an `i128`, always exact.
    #[inline]
    #[must_use]
    pub const fn as_i128(self) -> i128 {
        self.0
    }

    /// The value as an `i64` if it fits.
    #[inline]
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        i64::try_from(self.0).ok()
    }

    /// The value as a `u64` if it fits.
    #[inline]
    #[must_use]
    pub fn as_u64(self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }

    /// Returns true for values below zero.
    #[inline]
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl From<i64> for Int {
    fn from(v: i64) -> Self {
        Self(i128::from(v))
    }
}

impl From<u64> for Int {
    fn from(v: u64) -> Self {
        Self(i128::from(v))
    }
}

impl From<i32> for Int {
    fn from(v: i32) -> Self {
        Self(i128::from(v))
    }
}

impl From<u32> for Int {
    fn from(v: u32) -> Self {
        Self(i128::from(v))
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A dynamically-typed DRISL value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null. Undefined also decodes to this when `AllowUndefined` is set.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer in `[-(2^64), 2^64-1]`.
    Int(Int),
    /// IEEE-754 binary64. Never NaN or infinite.
    Float(f64),
    /// Text string.
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// String-keyed mapping in canonical key order.
    Map(ValueMap),
    /// Validated DASL CID (tag 42).
    Cid(Cid),
    /// Opaque CID captured under `UseRawCid`.
    RawCid(RawCid),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean value, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value, if this is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<Int> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float value, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The text value, if this is a text string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The byte-string value, if this is a byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The mapping, if this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The CID, if this is a validated CID.
    #[must_use]
    pub const fn as_cid(&self) -> Option<&Cid> {
        match self {
            Self::Cid(c) => Some(c),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(Int::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Int(Int::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Cid> for Value {
    fn from(v: Cid) -> Self {
        Self::Cid(v)
    }
}

/// A string-keyed mapping whose entries are held in canonical key order.
///
/// Keys are unique; insertion position is determined by the bytewise order of
/// the encoded key, so iterating yields entries exactly as they appear on the
/// wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

fn encoded_key(k: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(k.len() + 2);
    write_head(&mut buf, MAJOR_TEXT, k.len() as u64);
    buf.extend_from_slice(k.as_bytes());
    buf
}

impl ValueMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a map from entries, sorting them canonically.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if two entries share a key.
    pub fn from_entries(entries: Vec<(String, Value)>) -> Result<Self, Error> {
        let mut out = Self { entries };
        out.entries
            .sort_by(|(a, _), (b, _)| cmp_encoded_keys(&encoded_key(a), &encoded_key(b)));
        for pair in out.entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(Error::new(ErrorCode::DuplicateKey, 0));
            }
        }
        Ok(out)
    }

    /// Insert an entry at its canonical position.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the key is already present.
    pub fn insert(&mut self, key: String, value: Value) -> Result<(), Error> {
        let enc = encoded_key(&key);
        let pos = self
            .entries
            .binary_search_by(|(k, _)| cmp_encoded_keys(&encoded_key(k), &enc));
        match pos {
            Ok(_) => Err(Error::new(ErrorCode::DuplicateKey, 0)),
            Err(idx) => {
                self.entries.insert(idx, (key, value));
                Ok(())
            }
        }
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = &'a (String, Value);
    type IntoIter = core::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
