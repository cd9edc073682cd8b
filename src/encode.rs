//! The canonical encoder.
//!
//! Output is canonical by construction: heads are shortest-form, floats are
//! binary64, and map entries are buffered, sorted by encoded key, and checked
//! for duplicates before the map head is written. Raw fragments are spliced
//! only after passing the strict scanner.

use chrono::{DateTime, FixedOffset};

use crate::cid::{Cid, RawCid, CID_TAG};
use crate::codec::{Encode, RawValue};
use crate::float;
use crate::options::{DecOptions, EncOptions};
use crate::order::cmp_encoded_keys;
use crate::scan;
use crate::time;
use crate::value::Int;
use crate::wire::{
    write_head, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_UNSIGNED,
};
use crate::{Error, ErrorCode};

/// A canonical DRISL encoder writing into an owned buffer.
pub struct Encoder {
    buf: Vec<u8>,
    opts: EncOptions,
}

impl Encoder {
    /// Create an encoder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EncOptions::default())
    }

    /// Create an encoder with the given options.
    #[must_use]
    pub const fn with_options(opts: EncOptions) -> Self {
        Self {
            buf: Vec::new(),
            opts,
        }
    }

    /// The active encoding options.
    #[must_use]
    pub const fn options(&self) -> EncOptions {
        self.opts
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the bytes emitted so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume and return the encoded bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Encode null.
    pub fn null(&mut self) {
        self.buf.push(0xf6);
    }

    /// Encode a boolean.
    pub fn bool(&mut self, v: bool) {
        self.buf.push(if v { 0xf5 } else { 0xf4 });
    }

    /// Encode an integer.
    ///
    /// # Errors
    ///
    /// Returns `IntegerOutOfRange` if `Int64RangeOnly` is set and the value
    /// does not fit an `i64`.
    pub fn int(&mut self, v: Int) -> Result<(), Error> {
        if self.opts.int64_range_only && v.as_i64().is_none() {
            return Err(Error::new(ErrorCode::IntegerOutOfRange, self.buf.len()));
        }
        let raw = v.as_i128();
        if raw >= 0 {
            write_head(&mut self.buf, MAJOR_UNSIGNED, raw as u64);
        } else {
            let n = (-1 - raw) as u64;
            write_head(&mut self.buf, MAJOR_NEGATIVE, n);
        }
        Ok(())
    }

    /// Encode a float as binary64.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFloat` for NaN or an infinity.
    pub fn float(&mut self, v: f64) -> Result<(), Error> {
        float::validate_f64_bits(v.to_bits())
            .map_err(|code| Error::new(code, self.buf.len()))?;
        self.buf.push(0xfb);
        self.buf.extend_from_slice(&v.to_bits().to_be_bytes());
        Ok(())
    }

    /// Encode a text string.
    pub fn text(&mut self, s: &str) {
        write_head(&mut self.buf, MAJOR_TEXT, s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Encode a byte string.
    pub fn bytes(&mut self, b: &[u8]) {
        write_head(&mut self.buf, MAJOR_BYTES, b.len() as u64);
        self.buf.extend_from_slice(b);
    }

    /// Encode a CID as tag 42 wrapping its `0x00`-prefixed binary form.
    ///
    /// # Errors
    ///
    /// Returns `ForbiddenCid` if the CID is undefined.
    pub fn cid(&mut self, c: &Cid) -> Result<(), Error> {
        if !c.defined() {
            return Err(Error::new(ErrorCode::ForbiddenCid, self.buf.len()));
        }
        write_head(&mut self.buf, MAJOR_TAG, CID_TAG);
        write_head(&mut self.buf, MAJOR_BYTES, 1 + c.as_bytes().len() as u64);
        self.buf.push(0x00);
        self.buf.extend_from_slice(c.as_bytes());
        Ok(())
    }

    /// Encode an unvalidated CID the same way as [`Encoder::cid`].
    pub fn raw_cid(&mut self, c: &RawCid) {
        write_head(&mut self.buf, MAJOR_TAG, CID_TAG);
        write_head(&mut self.buf, MAJOR_BYTES, 1 + c.as_bytes().len() as u64);
        self.buf.push(0x00);
        self.buf.extend_from_slice(c.as_bytes());
    }

    /// Encode a time value according to the active [`TimeMode`].
    ///
    /// [`TimeMode`]: crate::TimeMode
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` under `TimeMode::Reject`.
    pub fn time(&mut self, t: &DateTime<FixedOffset>) -> Result<(), Error> {
        time::encode_time(self, t)
    }

    /// Splice a pre-encoded fragment, validating that it is itself canonical.
    ///
    /// # Errors
    ///
    /// Returns `MarshalerViolatedCanonicity` wrapping the decoder error if
    /// the fragment is not a single canonical item.
    pub fn raw(&mut self, raw: &RawValue) -> Result<(), Error> {
        let opts = DecOptions::default();
        scan::validate(raw.as_bytes(), &opts).map_err(|e| {
            Error::caused_by(ErrorCode::MarshalerViolatedCanonicity, e)
        })?;
        self.buf.extend_from_slice(raw.as_bytes());
        Ok(())
    }

    /// Encode a definite-length array, filling it via the builder.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` if the builder emits a different number of
    /// elements than declared, or any error from the builder itself.
    pub fn array<F>(&mut self, len: usize, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ArrayEncoder<'_>) -> Result<(), Error>,
    {
        let start = self.buf.len();
        write_head(&mut self.buf, MAJOR_ARRAY, len as u64);
        let mut a = ArrayEncoder {
            enc: self,
            remaining: len,
        };
        let res = f(&mut a);
        let remaining = a.remaining;
        if let Err(err) = res {
            self.buf.truncate(start);
            return Err(err);
        }
        if remaining != 0 {
            let err = Error::new(ErrorCode::LengthMismatch, self.buf.len());
            self.buf.truncate(start);
            return Err(err);
        }
        Ok(())
    }

    /// Encode a map, filling it via the builder.
    ///
    /// Entries may be supplied in any order; they are sorted by the bytewise
    /// order of their encoded keys before the map is written.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if two entries share a key, or any error from
    /// the builder itself.
    pub fn map<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut MapEncoder) -> Result<(), Error>,
    {
        let mut m = MapEncoder {
            opts: self.opts,
            entries: Vec::new(),
        };
        f(&mut m)?;
        m.finish(self)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for writing array elements.
pub struct ArrayEncoder<'a> {
    enc: &'a mut Encoder,
    remaining: usize,
}

impl ArrayEncoder<'_> {
    fn consume_one(&mut self) -> Result<(), Error> {
        if self.remaining == 0 {
            return Err(Error::new(
                ErrorCode::LengthMismatch,
                self.enc.buf.len(),
            ));
        }
        self.remaining -= 1;
        Ok(())
    }

    /// Encode the next element using its [`Encode`] impl.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` past the declared length, or any encoding
    /// error from the value.
    pub fn value<T: Encode + ?Sized>(&mut self, v: &T) -> Result<(), Error> {
        self.consume_one()?;
        v.encode(self.enc)
    }

    /// Encode a nested array.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` past the declared length, or any error from
    /// the nested builder.
    pub fn array<F>(&mut self, len: usize, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ArrayEncoder<'_>) -> Result<(), Error>,
    {
        self.consume_one()?;
        self.enc.array(len, f)
    }

    /// Encode a nested map.
    ///
    /// # Errors
    ///
    /// Returns `LengthMismatch` past the declared length, or any error from
    /// the nested builder.
    pub fn map<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut MapEncoder) -> Result<(), Error>,
    {
        self.consume_one()?;
        self.enc.map(f)
    }
}

/// Builder for map entries. Entries are buffered and emitted in canonical
/// order when the builder finishes.
pub struct MapEncoder {
    opts: EncOptions,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MapEncoder {
    /// Insert an entry. The value is produced by a nested encoder sharing
    /// the outer options.
    ///
    /// # Errors
    ///
    /// Returns any encoding error from the value closure.
    pub fn entry<F>(&mut self, key: &str, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Encoder) -> Result<(), Error>,
    {
        let mut key_buf = Vec::with_capacity(key.len() + 2);
        write_head(&mut key_buf, MAJOR_TEXT, key.len() as u64);
        key_buf.extend_from_slice(key.as_bytes());

        let mut sub = Encoder::with_options(self.opts);
        f(&mut sub)?;
        self.entries.push((key_buf, sub.into_vec()));
        Ok(())
    }

    /// Insert an entry whose value is encoded via its [`Encode`] impl.
    ///
    /// # Errors
    ///
    /// Returns any encoding error from the value.
    pub fn value_entry<T: Encode + ?Sized>(&mut self, key: &str, v: &T) -> Result<(), Error> {
        self.entry(key, |enc| v.encode(enc))
    }

    fn finish(mut self, enc: &mut Encoder) -> Result<(), Error> {
        self.entries
            .sort_by(|(a, _), (b, _)| cmp_encoded_keys(a, b));
        for pair in self.entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(Error::new(ErrorCode::DuplicateKey, enc.buf.len()));
            }
        }
        write_head(&mut enc.buf, MAJOR_MAP, self.entries.len() as u64);
        for (key, value) in &self.entries {
            enc.buf.extend_from_slice(key);
            enc.buf.extend_from_slice(value);
        }
        Ok(())
    }
}
