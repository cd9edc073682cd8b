//! Borrowed navigation over validated bytes.
//!
//! A [`ValueRef`] points at one item inside a buffer that already passed the
//! strict scanner, so reads here trust canonical form and only check that the
//! wire kind matches the requested target.

use crate::cid::{Cid, RawCid, CID_TAG};
use crate::options::DecOptions;
use crate::value::Int;
use crate::wire::{
    len_to_usize, read_be_u64, read_exact, read_u8, read_uint_trusted, skip_trusted, MAJOR_ARRAY,
    MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG, MAJOR_TEXT, MAJOR_UNSIGNED,
};
use crate::{Error, ErrorCode};

/// The wire category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Major type 0 or 1.
    Integer,
    /// Major type 2.
    Bytes,
    /// Major type 3.
    Text,
    /// Major type 4.
    Array,
    /// Major type 5.
    Map,
    /// Tag 42.
    Cid,
    /// Simple values 20/21.
    Bool,
    /// Simple value 22, and 23 when undefined is allowed.
    Null,
    /// Major type 7, binary64.
    Float,
}

/// A reference to one item inside validated canonical bytes.
#[derive(Debug, Clone, Copy)]
pub struct ValueRef<'de> {
    data: &'de [u8],
    start: usize,
    opts: DecOptions,
}

impl<'de> ValueRef<'de> {
    pub(crate) const fn new(data: &'de [u8], start: usize, opts: DecOptions) -> Self {
        Self { data, start, opts }
    }

    /// Byte offset of this item in the decoded input.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.start
    }

    /// The active decoding options.
    #[must_use]
    pub const fn options(&self) -> DecOptions {
        self.opts
    }

    fn head(&self) -> (u8, u8) {
        let ib = self.data[self.start];
        (ib >> 5, ib & 0x1f)
    }

    fn mismatch(&self) -> Error {
        Error::new(ErrorCode::TypeMismatch, self.start)
    }

    /// The wire category of this item.
    #[must_use]
    pub fn kind(&self) -> Kind {
        let (major, ai) = self.head();
        match major {
            MAJOR_UNSIGNED | MAJOR_NEGATIVE => Kind::Integer,
            MAJOR_BYTES => Kind::Bytes,
            MAJOR_TEXT => Kind::Text,
            MAJOR_ARRAY => Kind::Array,
            MAJOR_MAP => Kind::Map,
            MAJOR_TAG => Kind::Cid,
            MAJOR_SIMPLE => match ai {
                20 | 21 => Kind::Bool,
                22 | 23 => Kind::Null,
                _ => Kind::Float,
            },
            _ => unreachable!("major out of range"),
        }
    }

    /// Returns true for null, and for undefined when `AllowUndefined` is set
    /// (undefined folds to the same empty value).
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }

    /// The exact wire subslice of this item.
    ///
    /// This is what a user unmarshal hook receives: the bytes are
    /// self-contained and canonical.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying buffer is corrupt.
    pub fn raw_slice(&self) -> Result<&'de [u8], Error> {
        let end = skip_trusted(self.data, self.start)?;
        Ok(&self.data[self.start..end])
    }

    /// The boolean value.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not a boolean.
    pub fn bool(&self) -> Result<bool, Error> {
        match self.data[self.start] {
            0xf4 => Ok(false),
            0xf5 => Ok(true),
            _ => Err(self.mismatch()),
        }
    }

    /// The integer value.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not an integer.
    pub fn int(&self) -> Result<Int, Error> {
        let (major, ai) = self.head();
        let mut pos = self.start + 1;
        let v = read_uint_trusted(self.data, &mut pos, ai, self.start)?;
        match major {
            MAJOR_UNSIGNED => Ok(Int::from(v)),
            MAJOR_NEGATIVE => {
                let n = -1_i128 - i128::from(v);
                Ok(Int::new(n).map_err(|_| self.mismatch())?)
            }
            _ => Err(self.mismatch()),
        }
    }

    /// The float value.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not a float.
    pub fn float(&self) -> Result<f64, Error> {
        let (major, ai) = self.head();
        if major != MAJOR_SIMPLE || ai != 27 {
            return Err(self.mismatch());
        }
        let mut pos = self.start + 1;
        let bits = read_be_u64(self.data, &mut pos)?;
        Ok(f64::from_bits(bits))
    }

    /// The text payload, borrowed from the input.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not a text string.
    pub fn text(&self) -> Result<&'de str, Error> {
        let (major, ai) = self.head();
        if major != MAJOR_TEXT {
            return Err(self.mismatch());
        }
        let mut pos = self.start + 1;
        let len = read_uint_trusted(self.data, &mut pos, ai, self.start)?;
        let len = len_to_usize(len, self.start)?;
        let payload = read_exact(self.data, &mut pos, len)?;
        // Validated by the scanner already.
        core::str::from_utf8(payload).map_err(|_| Error::new(ErrorCode::InvalidUtf8, self.start))
    }

    /// The byte-string payload, borrowed from the input.
    ///
    /// Byte strings never bind to text targets and vice versa.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not a byte string.
    pub fn bytes(&self) -> Result<&'de [u8], Error> {
        let (major, ai) = self.head();
        if major != MAJOR_BYTES {
            return Err(self.mismatch());
        }
        let mut pos = self.start + 1;
        let len = read_uint_trusted(self.data, &mut pos, ai, self.start)?;
        let len = len_to_usize(len, self.start)?;
        read_exact(self.data, &mut pos, len)
    }

    /// An iterator view of this array.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not an array.
    pub fn array(&self) -> Result<ArrayRef<'de>, Error> {
        let (major, ai) = self.head();
        if major != MAJOR_ARRAY {
            return Err(self.mismatch());
        }
        let mut pos = self.start + 1;
        let len = read_uint_trusted(self.data, &mut pos, ai, self.start)?;
        Ok(ArrayRef {
            data: self.data,
            pos,
            remaining: len_to_usize(len, self.start)?,
            opts: self.opts,
        })
    }

    /// An iterator view of this map.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if this item is not a map.
    pub fn map(&self) -> Result<MapRef<'de>, Error> {
        let (major, ai) = self.head();
        if major != MAJOR_MAP {
            return Err(self.mismatch());
        }
        let mut pos = self.start + 1;
        let len = read_uint_trusted(self.data, &mut pos, ai, self.start)?;
        Ok(MapRef {
            data: self.data,
            pos,
            remaining: len_to_usize(len, self.start)?,
            opts: self.opts,
        })
    }

    fn tag_content(&self) -> Result<&'de [u8], Error> {
        let (major, ai) = self.head();
        if major != MAJOR_TAG {
            return Err(self.mismatch());
        }
        let mut pos = self.start + 1;
        let tag = read_uint_trusted(self.data, &mut pos, ai, self.start)?;
        if tag != CID_TAG {
            return Err(Error::new(ErrorCode::UnknownTag, self.start));
        }
        let c_off = pos;
        let ib = read_u8(self.data, &mut pos)?;
        let len = read_uint_trusted(self.data, &mut pos, ib & 0x1f, c_off)?;
        let len = len_to_usize(len, c_off)?;
        let content = read_exact(self.data, &mut pos, len)?;
        if content.is_empty() || content[0] != 0x00 {
            return Err(Error::new(ErrorCode::UnknownTag, c_off));
        }
        Ok(&content[1..])
    }

    /// The validated CID carried by this tag-42 item.
    ///
    /// Binding null into a CID target fails; absent-vs-null is expressed with
    /// an `Option<Cid>` target instead.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for non-tag items and `ForbiddenCid` for
    /// non-DASL contents.
    pub fn cid(&self) -> Result<Cid, Error> {
        let content = self.tag_content()?;
        Cid::from_bytes(content).map_err(|_| Error::new(ErrorCode::ForbiddenCid, self.start))
    }

    /// The unvalidated CID bytes carried by this tag-42 item.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for non-tag items.
    pub fn raw_cid(&self) -> Result<RawCid, Error> {
        Ok(RawCid::new(self.tag_content()?.to_vec()))
    }
}

/// Sequential access to array elements.
pub struct ArrayRef<'de> {
    data: &'de [u8],
    pos: usize,
    remaining: usize,
    opts: DecOptions,
}

impl<'de> ArrayRef<'de> {
    /// Number of elements not yet visited.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.remaining
    }

    /// Returns true when no elements remain.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Advance to the next element.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying buffer is corrupt.
    pub fn next(&mut self) -> Result<Option<ValueRef<'de>>, Error> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let item = ValueRef::new(self.data, self.pos, self.opts);
        self.pos = skip_trusted(self.data, self.pos)?;
        Ok(Some(item))
    }
}

/// Sequential access to map entries in canonical key order.
pub struct MapRef<'de> {
    data: &'de [u8],
    pos: usize,
    remaining: usize,
    opts: DecOptions,
}

impl<'de> MapRef<'de> {
    /// Number of entries not yet visited.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.remaining
    }

    /// Returns true when no entries remain.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Advance to the next entry.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying buffer is corrupt.
    pub fn next(&mut self) -> Result<Option<(&'de str, ValueRef<'de>)>, Error> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let key = ValueRef::new(self.data, self.pos, self.opts).text()?;
        self.pos = skip_trusted(self.data, self.pos)?;
        let value = ValueRef::new(self.data, self.pos, self.opts);
        self.pos = skip_trusted(self.data, self.pos)?;
        Ok(Some((key, value)))
    }
}
