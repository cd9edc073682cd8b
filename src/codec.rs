//! The `Encode`/`Decode` traits, their implementations for common targets,
//! and the `marshal`/`unmarshal` entry points.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use sha2::{Digest as _, Sha256};

use crate::cid::{Cid, Codec, HashType, RawCid};
use crate::de::{Kind, ValueRef};
use crate::encode::Encoder;
use crate::float::narrow_to_f32;
use crate::options::{DecOptions, EncOptions};
use crate::scan;
use crate::time;
use crate::value::{Int, Value, ValueMap};
use crate::{Error, ErrorCode};

/// Encode a value into the canonical encoder.
pub trait Encode {
    /// Encode `self` into the provided encoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented in the profile.
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error>;
}

/// Decode a value from a validated item reference.
pub trait Decode<'de>: Sized {
    /// Decode `Self` from the item `value` points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the wire item does not match the target.
    fn decode(value: ValueRef<'de>) -> Result<Self, Error>;
}

/// Marker trait for element types of array targets.
///
/// `u8` deliberately does not implement it: byte strings are their own wire
/// category and bind only to byte targets.
pub trait ArrayElem {}

/// Logical emptiness, as consulted by the `omitempty` directive: false, zero,
/// empty text/bytes/sequence/map, and null are empty.
pub trait IsEmpty {
    /// Returns true when the value is logically empty.
    fn is_empty_value(&self) -> bool;
}

/// Returns the DRISL encoding of `value` using default encoding options.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in the profile.
pub fn marshal<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    marshal_with(value, EncOptions::default())
}

/// Returns the DRISL encoding of `value` with the given options.
///
/// # Errors
///
/// Returns an error if the value cannot be represented in the profile.
pub fn marshal_with<T: Encode + ?Sized>(value: &T, opts: EncOptions) -> Result<Vec<u8>, Error> {
    let mut enc = Encoder::with_options(opts);
    value.encode(&mut enc)?;
    Ok(enc.into_vec())
}

/// Parses DRISL-encoded data into a value of type `T` using default decoding
/// options.
///
/// The input is first validated against every rule of the strict profile and
/// then bound to the target; trailing bytes after one item are an error.
///
/// # Errors
///
/// Returns an error if the input is not canonical DRISL or does not match
/// the target shape.
pub fn unmarshal<'de, T: Decode<'de>>(bytes: &'de [u8]) -> Result<T, Error> {
    unmarshal_with(bytes, DecOptions::default())
}

/// Parses DRISL-encoded data into a value of type `T` with the given options.
///
/// # Errors
///
/// Returns an error if the input is not canonical DRISL or does not match
/// the target shape.
pub fn unmarshal_with<'de, T: Decode<'de>>(
    bytes: &'de [u8],
    opts: DecOptions,
) -> Result<T, Error> {
    scan::validate(bytes, &opts)?;
    T::decode(ValueRef::new(bytes, 0, opts))
}

/// Reports whether `bytes` are a single canonical DRISL item under default
/// options.
#[must_use]
pub fn valid(bytes: &[u8]) -> bool {
    scan::validate(bytes, &DecOptions::default()).is_ok()
}

/// Calculates the DRISL SHA-256 CID for the given value: the value is
/// canonically encoded and those bytes are hashed.
///
/// # Errors
///
/// Returns an error if the value could not be encoded.
pub fn cid_for_value<T: Encode + ?Sized>(value: &T) -> Result<Cid, Error> {
    let bytes = marshal(value)?;
    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    Ok(Cid::from_parts(Codec::Drisl, HashType::Sha256, &digest))
}

/// A raw pre-encoded DRISL value.
///
/// Like a raw JSON message, this can be used to delay decoding or precompute
/// encoding. On encode the bytes are validated through the strict decoder
/// before being spliced; non-canonical bytes are reported as
/// `MarshalerViolatedCanonicity`. On decode it captures the exact wire
/// subslice of its item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawValue(Vec<u8>);

impl RawValue {
    /// Wrap pre-encoded bytes. Validation happens when the value is encoded.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Encode for RawValue {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.raw(self)
    }
}

impl<'de> Decode<'de> for RawValue {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        Ok(Self(value.raw_slice()?.to_vec()))
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bool(*self);
        Ok(())
    }
}

impl<'de> Decode<'de> for bool {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.bool()
    }
}

impl Encode for Int {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.int(*self)
    }
}

impl<'de> Decode<'de> for Int {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.int()
    }
}

macro_rules! encode_signed {
    ($($t:ty)*) => {$(
        impl Encode for $t {
            fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
                enc.int(Int::from(i64::from(*self)))
            }
        }
    )*};
}

macro_rules! encode_unsigned {
    ($($t:ty)*) => {$(
        impl Encode for $t {
            fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
                enc.int(Int::from(u64::from(*self)))
            }
        }
    )*};
}

encode_signed!(i8 i16 i32 i64);
encode_unsigned!(u8 u16 u32 u64);

impl Encode for i128 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        let v = Int::new(*self).map_err(|e| Error::new(e.code, enc.len()))?;
        enc.int(v)
    }
}

impl Encode for u128 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        let v = i128::try_from(*self)
            .ok()
            .and_then(|v| Int::new(v).ok())
            .ok_or(Error::new(ErrorCode::IntegerOverflow, enc.len()))?;
        enc.int(v)
    }
}

impl Encode for usize {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.int(Int::from(*self as u64))
    }
}

macro_rules! decode_narrow {
    ($($t:ty)*) => {$(
        impl<'de> Decode<'de> for $t {
            fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
                let v = value.int()?;
                Self::try_from(v.as_i128())
                    .map_err(|_| Error::new(ErrorCode::IntegerOverflow, value.offset()))
            }
        }
    )*};
}

decode_narrow!(i8 i16 i32 i64 u8 u16 u32 u64 usize i128 u128);

impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.float(*self)
    }
}

impl<'de> Decode<'de> for f64 {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.float()
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        // Widening is lossless.
        enc.float(f64::from(*self))
    }
}

impl<'de> Decode<'de> for f32 {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        let v = value.float()?;
        narrow_to_f32(v).map_err(|code| Error::new(code, value.offset()))
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.text(self);
        Ok(())
    }
}

impl Encode for &str {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.text(self);
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.text(self);
        Ok(())
    }
}

impl<'de> Decode<'de> for &'de str {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.text()
    }
}

impl<'de> Decode<'de> for String {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.text().map(str::to_owned)
    }
}

impl Encode for [u8] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self);
        Ok(())
    }
}

impl Encode for &[u8] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self);
        Ok(())
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.bytes(self);
        Ok(())
    }
}

impl<'de> Decode<'de> for &'de [u8] {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.bytes()
    }
}

impl<'de> Decode<'de> for Vec<u8> {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.bytes().map(<[u8]>::to_vec)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        match self {
            Some(v) => v.encode(enc),
            None => {
                enc.null();
                Ok(())
            }
        }
    }
}

impl<'de, T: Decode<'de>> Decode<'de> for Option<T> {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        if value.is_null() {
            Ok(None)
        } else {
            T::decode(value).map(Some)
        }
    }
}

impl<T: Encode + ArrayElem> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.array(self.len(), |a| {
            for item in self {
                a.value(item)?;
            }
            Ok(())
        })
    }
}

impl<'de, T: Decode<'de> + ArrayElem> Decode<'de> for Vec<T> {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        let mut arr = value.array()?;
        let mut out = Self::with_capacity(arr.len());
        while let Some(item) = arr.next()? {
            out.push(T::decode(item)?);
        }
        Ok(out)
    }
}

impl<V: Encode> Encode for BTreeMap<String, V> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.map(|m| {
            for (k, v) in self {
                m.value_entry(k, v)?;
            }
            Ok(())
        })
    }
}

impl<'de, V: Decode<'de>> Decode<'de> for BTreeMap<String, V> {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        let mut map = value.map()?;
        let mut out = Self::new();
        while let Some((k, v)) = map.next()? {
            out.insert(k.to_owned(), V::decode(v)?);
        }
        Ok(out)
    }
}

impl Encode for ValueMap {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.map(|m| {
            for (k, v) in self.iter() {
                m.value_entry(k, v)?;
            }
            Ok(())
        })
    }
}

impl<'de> Decode<'de> for ValueMap {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        let mut map = value.map()?;
        let mut out = Self::new();
        while let Some((k, v)) = map.next()? {
            out.insert(k.to_owned(), Value::decode(v)?)?;
        }
        Ok(out)
    }
}

impl Encode for Value {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        match self {
            Self::Null => {
                enc.null();
                Ok(())
            }
            Self::Bool(b) => {
                enc.bool(*b);
                Ok(())
            }
            Self::Int(i) => enc.int(*i),
            Self::Float(f) => enc.float(*f),
            Self::Text(s) => {
                enc.text(s);
                Ok(())
            }
            Self::Bytes(b) => {
                enc.bytes(b);
                Ok(())
            }
            Self::Array(items) => enc.array(items.len(), |a| {
                for item in items {
                    a.value(item)?;
                }
                Ok(())
            }),
            Self::Map(m) => m.encode(enc),
            Self::Cid(c) => enc.cid(c),
            Self::RawCid(c) => {
                enc.raw_cid(c);
                Ok(())
            }
        }
    }
}

impl<'de> Decode<'de> for Value {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        match value.kind() {
            Kind::Null => Ok(Self::Null),
            Kind::Bool => value.bool().map(Self::Bool),
            Kind::Integer => value.int().map(Self::Int),
            Kind::Float => value.float().map(Self::Float),
            Kind::Text => value.text().map(|s| Self::Text(s.to_owned())),
            Kind::Bytes => value.bytes().map(|b| Self::Bytes(b.to_vec())),
            Kind::Array => {
                let mut arr = value.array()?;
                let mut out = Vec::with_capacity(arr.len());
                while let Some(item) = arr.next()? {
                    out.push(Self::decode(item)?);
                }
                Ok(Self::Array(out))
            }
            Kind::Map => ValueMap::decode(value).map(Self::Map),
            Kind::Cid => {
                if value.options().use_raw_cid {
                    value.raw_cid().map(Self::RawCid)
                } else {
                    value.cid().map(Self::Cid)
                }
            }
        }
    }
}

impl Encode for Cid {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.cid(self)
    }
}

impl<'de> Decode<'de> for Cid {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.cid()
    }
}

impl Encode for RawCid {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.raw_cid(self);
        Ok(())
    }
}

impl<'de> Decode<'de> for RawCid {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        value.raw_cid()
    }
}

impl Encode for DateTime<FixedOffset> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.time(self)
    }
}

impl Encode for DateTime<Utc> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        enc.time(&self.fixed_offset())
    }
}

impl<'de> Decode<'de> for DateTime<FixedOffset> {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        match value.kind() {
            Kind::Text => time::time_from_text(value.text()?, value.offset()),
            Kind::Integer => {
                let secs = value
                    .int()?
                    .as_i64()
                    .ok_or(Error::new(ErrorCode::IntegerOverflow, value.offset()))?;
                time::time_from_unix(secs, value.offset())
            }
            Kind::Float => time::time_from_unix_f64(value.float()?, value.offset()),
            _ => Err(Error::new(ErrorCode::TypeMismatch, value.offset())),
        }
    }
}

impl<'de> Decode<'de> for DateTime<Utc> {
    fn decode(value: ValueRef<'de>) -> Result<Self, Error> {
        DateTime::<FixedOffset>::decode(value).map(|t| t.with_timezone(&Utc))
    }
}

impl ArrayElem for bool {}
impl ArrayElem for Int {}
impl ArrayElem for i8 {}
impl ArrayElem for i16 {}
impl ArrayElem for i32 {}
impl ArrayElem for i64 {}
impl ArrayElem for i128 {}
impl ArrayElem for u16 {}
impl ArrayElem for u32 {}
impl ArrayElem for u64 {}
impl ArrayElem for u128 {}
impl ArrayElem for usize {}
impl ArrayElem for f32 {}
impl ArrayElem for f64 {}
impl ArrayElem for String {}
impl ArrayElem for &str {}
impl ArrayElem for Value {}
impl ArrayElem for ValueMap {}
impl ArrayElem for Cid {}
impl ArrayElem for RawCid {}
impl ArrayElem for RawValue {}
impl ArrayElem for DateTime<FixedOffset> {}
impl ArrayElem for DateTime<Utc> {}
impl<T: ArrayElem> ArrayElem for Option<T> {}
impl<T: ArrayElem> ArrayElem for Vec<T> {}
impl<V> ArrayElem for BTreeMap<String, V> {}

impl IsEmpty for bool {
    fn is_empty_value(&self) -> bool {
        !*self
    }
}

macro_rules! is_empty_int {
    ($($t:ty)*) => {$(
        impl IsEmpty for $t {
            fn is_empty_value(&self) -> bool {
                *self == 0
            }
        }
    )*};
}

is_empty_int!(i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 usize);

impl IsEmpty for Int {
    fn is_empty_value(&self) -> bool {
        self.as_i128() == 0
    }
}

impl IsEmpty for f32 {
    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl IsEmpty for f64 {
    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for &str {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for ValueMap {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for Value {
    fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => i.as_i128() == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::Array(a) => a.is_empty(),
            Self::Map(m) => m.is_empty(),
            Self::Cid(_) | Self::RawCid(_) => false,
        }
    }
}
