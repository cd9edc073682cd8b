//! Streaming interfaces: one top-level item per call over `std::io` sources
//! and sinks.

use std::io;

use crate::codec::{marshal_with, Decode, Encode};
use crate::de::ValueRef;
use crate::options::{DecOptions, EncOptions};
use crate::scan;
use crate::{Error, ErrorCode};

/// A streaming encoder writing canonical items to an output sink.
///
/// Each call to [`StreamEncoder::encode`] appends one complete item; outputs
/// are concatenated.
pub struct StreamEncoder<W: io::Write> {
    sink: W,
    opts: EncOptions,
}

impl<W: io::Write> StreamEncoder<W> {
    /// Wrap an output sink with default encoding options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, EncOptions::default())
    }

    /// Wrap an output sink with the given options.
    pub const fn with_options(sink: W, opts: EncOptions) -> Self {
        Self { sink, opts }
    }

    /// Encode one value and write it to the sink.
    ///
    /// # Errors
    ///
    /// Returns an encoding error, or `Io` if the sink fails.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let bytes = marshal_with(value, self.opts)?;
        self.sink
            .write_all(&bytes)
            .map_err(|_| Error::new(ErrorCode::Io, 0))
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

const READ_CHUNK: usize = 4096;

/// A streaming decoder consuming exactly one top-level item per call.
///
/// [`StreamDecoder::decode`] returns `Ok(None)` when the source is exhausted
/// at an item boundary and `UnexpectedEnd` when it ends in the middle of an
/// item. After any error the decoder is poisoned and keeps returning that
/// error; recovery from a corrupt item is not offered.
///
/// The decoder binds to one input source and is not safe for concurrent use
/// by multiple callers.
pub struct StreamDecoder<R: io::Read> {
    src: R,
    opts: DecOptions,
    buf: Vec<u8>,
    consumed: usize,
    poisoned: Option<Error>,
    source_done: bool,
}

impl<R: io::Read> StreamDecoder<R> {
    /// Wrap an input source with default decoding options.
    pub fn new(src: R) -> Self {
        Self::with_options(src, DecOptions::default())
    }

    /// Wrap an input source with the given options.
    pub const fn with_options(src: R, opts: DecOptions) -> Self {
        Self {
            src,
            opts,
            buf: Vec::new(),
            consumed: 0,
            poisoned: None,
            source_done: false,
        }
    }

    fn fill(&mut self) -> Result<usize, Error> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self
            .src
            .read(&mut chunk)
            .map_err(|_| Error::new(ErrorCode::Io, self.buf.len()))?;
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    /// Decode the next item from the source.
    ///
    /// Returns `Ok(None)` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns the first decoding or I/O error; the decoder then keeps
    /// returning that same error.
    pub fn decode<T: for<'a> Decode<'a>>(&mut self) -> Result<Option<T>, Error> {
        if let Some(err) = self.poisoned {
            return Err(err);
        }
        self.opts.check()?;
        match self.next_item() {
            Ok(v) => Ok(v),
            Err(err) => {
                self.poisoned = Some(err);
                Err(err)
            }
        }
    }

    fn next_item<T: for<'a> Decode<'a>>(&mut self) -> Result<Option<T>, Error> {
        loop {
            self.buf.drain(..self.consumed);
            self.consumed = 0;

            if !self.buf.is_empty() {
                match scan::scan_one(&self.buf, 0, &self.opts) {
                    Ok(end) => {
                        let value = T::decode(ValueRef::new(&self.buf[..end], 0, self.opts))?;
                        self.consumed = end;
                        return Ok(Some(value));
                    }
                    Err(err) if err.code == ErrorCode::UnexpectedEnd && !self.source_done => {}
                    Err(err) => return Err(err),
                }
            } else if self.source_done {
                return Ok(None);
            }

            if self.fill()? == 0 {
                self.source_done = true;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                // One last scan decides between a complete trailing item and
                // a truncated one.
                let end = scan::scan_one(&self.buf, 0, &self.opts)?;
                let value = T::decode(ValueRef::new(&self.buf[..end], 0, self.opts))?;
                self.consumed = end;
                return Ok(Some(value));
            }
        }
    }

    /// Unwrap the underlying source, dropping any in-flight item state.
    pub fn into_inner(self) -> R {
        self.src
    }
}
