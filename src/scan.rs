//! The strict decoder core: a validator that rejects any byte sequence
//! deviating from the canonical form before anything is bound to a target.
//!
//! Violating inputs fail rather than being silently normalized.

use crate::cid::{Cid, CID_TAG};
use crate::float::validate_f64_bits;
use crate::options::DecOptions;
use crate::order::is_strictly_increasing;
use crate::utf8;
use crate::wire::{
    len_to_usize, read_be_u64, read_exact, read_u8, read_uint_minimal, MAJOR_ARRAY, MAJOR_BYTES,
    MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG, MAJOR_TEXT, MAJOR_UNSIGNED,
};
use crate::{Error, ErrorCode};

/// Validate that `bytes` contain exactly one canonical DRISL item.
///
/// This is the allocation-free hot path: every rule of the profile is
/// enforced, including head minimality, map key ordering, nesting and element
/// caps, and CID tag contents.
///
/// # Errors
///
/// Returns the first violation encountered, with its byte offset.
pub fn validate(bytes: &[u8], opts: &DecOptions) -> Result<(), Error> {
    opts.check()?;
    let end = scan_one(bytes, 0, opts)?;
    if end != bytes.len() {
        return Err(Error::new(ErrorCode::TrailingData, end));
    }
    Ok(())
}

/// Validate one item starting at `start` and return the offset just past it.
///
/// Trailing bytes are left for the caller; the streaming decoder relies on
/// this to consume one item per call.
pub(crate) fn scan_one(bytes: &[u8], start: usize, opts: &DecOptions) -> Result<usize, Error> {
    let mut s = Scanner {
        data: bytes,
        pos: start,
        opts,
    };
    s.skip_value(0)?;
    Ok(s.pos)
}

struct Scanner<'a, 'o> {
    data: &'a [u8],
    pos: usize,
    opts: &'o DecOptions,
}

impl Scanner<'_, '_> {
    fn ensure_depth(&self, next_depth: u32, off: usize) -> Result<(), Error> {
        if next_depth > self.opts.max_nested_levels {
            return Err(Error::new(ErrorCode::DepthLimitExceeded, off));
        }
        Ok(())
    }

    fn read_len(
        &mut self,
        ai: u8,
        off: usize,
        max_len: usize,
        limit_code: ErrorCode,
    ) -> Result<usize, Error> {
        if ai == 31 {
            return Err(Error::new(ErrorCode::IndefiniteLengthForbidden, off));
        }
        let len_u64 = read_uint_minimal(self.data, &mut self.pos, ai, off)?;
        let len = len_to_usize(len_u64, off)?;
        if len > max_len {
            return Err(Error::new(limit_code, off));
        }
        Ok(len)
    }

    fn check_int_range(&self, major: u8, v: u64, off: usize) -> Result<(), Error> {
        if self.opts.int64_range_only {
            let fits = if major == MAJOR_UNSIGNED {
                v <= i64::MAX as u64
            } else {
                // major 1 encodes -1 - v
                v < i64::MAX as u64 + 1
            };
            if !fits {
                return Err(Error::new(ErrorCode::IntegerOutOfRange, off));
            }
        }
        Ok(())
    }

    fn check_text(&mut self, ai: u8, off: usize) -> Result<(usize, usize), Error> {
        let len = self.read_len(
            ai,
            off,
            self.opts.max_array_elements,
            ErrorCode::TextLimitExceeded,
        )?;
        let payload_start = self.pos;
        let payload = read_exact(self.data, &mut self.pos, len)?;
        utf8::validate(payload).map_err(|()| Error::new(ErrorCode::InvalidUtf8, off))?;
        Ok((payload_start, self.pos))
    }

    fn check_cid_tag(&mut self, off: usize) -> Result<(), Error> {
        let c_off = self.pos;
        let ib = read_u8(self.data, &mut self.pos)?;
        let major = ib >> 5;
        let ai = ib & 0x1f;
        if major != MAJOR_BYTES {
            return Err(Error::new(ErrorCode::UnknownTag, off));
        }
        let len = self.read_len(
            ai,
            c_off,
            self.opts.max_array_elements,
            ErrorCode::BytesLimitExceeded,
        )?;
        let content = read_exact(self.data, &mut self.pos, len)?;
        if content.is_empty() || content[0] != 0x00 {
            return Err(Error::new(ErrorCode::UnknownTag, c_off));
        }
        if !self.opts.use_raw_cid {
            Cid::from_bytes(&content[1..])
                .map_err(|_| Error::new(ErrorCode::ForbiddenCid, c_off))?;
        }
        Ok(())
    }

    fn skip_value(&mut self, depth: u32) -> Result<(), Error> {
        let off = self.pos;
        let ib = read_u8(self.data, &mut self.pos)?;
        let major = ib >> 5;
        let ai = ib & 0x1f;

        match major {
            MAJOR_UNSIGNED | MAJOR_NEGATIVE => {
                if ai == 31 {
                    return Err(Error::new(ErrorCode::InvalidHead, off));
                }
                let v = read_uint_minimal(self.data, &mut self.pos, ai, off)?;
                self.check_int_range(major, v, off)
            }
            MAJOR_BYTES => {
                let len = self.read_len(
                    ai,
                    off,
                    self.opts.max_array_elements,
                    ErrorCode::BytesLimitExceeded,
                )?;
                let _ = read_exact(self.data, &mut self.pos, len)?;
                Ok(())
            }
            MAJOR_TEXT => {
                let _ = self.check_text(ai, off)?;
                Ok(())
            }
            MAJOR_ARRAY => {
                let len = self.read_len(
                    ai,
                    off,
                    self.opts.max_array_elements,
                    ErrorCode::ArrayLimitExceeded,
                )?;
                self.ensure_depth(depth + 1, off)?;
                for _ in 0..len {
                    self.skip_value(depth + 1)?;
                }
                Ok(())
            }
            MAJOR_MAP => {
                let len = self.read_len(
                    ai,
                    off,
                    self.opts.max_map_pairs,
                    ErrorCode::MapLimitExceeded,
                )?;
                self.ensure_depth(depth + 1, off)?;

                let mut prev_key: Option<(usize, usize)> = None;
                for _ in 0..len {
                    let k_off = self.pos;
                    let key_first = read_u8(self.data, &mut self.pos)?;
                    if key_first >> 5 != MAJOR_TEXT {
                        return Err(Error::new(ErrorCode::InvalidMapKey, k_off));
                    }
                    let _ = self.check_text(key_first & 0x1f, k_off)?;
                    let k_end = self.pos;

                    if let Some((ps, pe)) = prev_key {
                        let prev = &self.data[ps..pe];
                        let curr = &self.data[k_off..k_end];
                        if prev == curr {
                            return Err(Error::new(ErrorCode::DuplicateKey, k_off));
                        }
                        if !is_strictly_increasing(prev, curr) {
                            return Err(Error::new(ErrorCode::UnsortedKeys, k_off));
                        }
                    }
                    prev_key = Some((k_off, k_end));

                    self.skip_value(depth + 1)?;
                }
                Ok(())
            }
            MAJOR_TAG => {
                if ai == 31 {
                    return Err(Error::new(ErrorCode::InvalidHead, off));
                }
                let tag = read_uint_minimal(self.data, &mut self.pos, ai, off)?;
                if tag != CID_TAG {
                    return Err(Error::new(ErrorCode::UnknownTag, off));
                }
                // Tags count toward nesting depth.
                self.ensure_depth(depth + 1, off)?;
                self.check_cid_tag(off)
            }
            MAJOR_SIMPLE => match ai {
                20 | 21 | 22 => Ok(()),
                23 => {
                    if self.opts.allow_undefined {
                        Ok(())
                    } else {
                        Err(Error::new(ErrorCode::InvalidSimpleValue, off))
                    }
                }
                24 => {
                    let v = read_u8(self.data, &mut self.pos)?;
                    if v < 24 {
                        Err(Error::new(ErrorCode::NonMinimalHead, off))
                    } else {
                        Err(Error::new(ErrorCode::InvalidSimpleValue, off))
                    }
                }
                25 | 26 => Err(Error::new(ErrorCode::NarrowFloatForbidden, off)),
                27 => {
                    let bits = read_be_u64(self.data, &mut self.pos)?;
                    validate_f64_bits(bits).map_err(|code| Error::new(code, off))?;
                    Ok(())
                }
                0..=19 => Err(Error::new(ErrorCode::InvalidSimpleValue, off)),
                _ => Err(Error::new(ErrorCode::InvalidHead, off)),
            },
            _ => unreachable!("major out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(bytes: &[u8]) -> Result<(), Error> {
        validate(bytes, &DecOptions::default())
    }

    #[test]
    fn accepts_simple_items() {
        for item in [
            &[0xf4][..],
            &[0xf5],
            &[0xf6],
            &[0x00],
            &[0x17],
            &[0x18, 0x18],
            &[0x20],
            &[0x60],
            &[0x40],
            &[0x80],
            &[0xa0],
        ] {
            assert!(check(item).is_ok(), "{item:02x?}");
        }
    }

    #[test]
    fn rejects_non_minimal_heads() {
        assert_eq!(check(&[0x18, 0x00]).unwrap_err().code, ErrorCode::NonMinimalHead);
        assert_eq!(
            check(&[0x19, 0x00, 0x01]).unwrap_err().code,
            ErrorCode::NonMinimalHead
        );
        assert_eq!(
            check(&[0x1a, 0x00, 0x00, 0x00, 0x01]).unwrap_err().code,
            ErrorCode::NonMinimalHead
        );
    }

    #[test]
    fn rejects_indefinite_lengths() {
        for item in [&[0x5f, 0xff][..], &[0x7f, 0xff], &[0x9f, 0xff], &[0xbf, 0xff]] {
            assert_eq!(
                check(item).unwrap_err().code,
                ErrorCode::IndefiniteLengthForbidden,
                "{item:02x?}"
            );
        }
    }

    #[test]
    fn rejects_narrow_floats_and_non_finite() {
        assert_eq!(
            check(&[0xf9, 0x3c, 0x00]).unwrap_err().code,
            ErrorCode::NarrowFloatForbidden
        );
        assert_eq!(
            check(&[0xfa, 0x3f, 0xc0, 0x00, 0x00]).unwrap_err().code,
            ErrorCode::NarrowFloatForbidden
        );
        // binary64 NaN
        let mut nan = vec![0xfb];
        nan.extend_from_slice(&f64::NAN.to_bits().to_be_bytes());
        assert_eq!(check(&nan).unwrap_err().code, ErrorCode::InvalidFloat);
    }

    #[test]
    fn rejects_map_key_violations() {
        // non-text key
        assert_eq!(
            check(&[0xa1, 0x01, 0x01]).unwrap_err().code,
            ErrorCode::InvalidMapKey
        );
        // null key
        assert_eq!(
            check(&[0xa1, 0xf6, 0x01]).unwrap_err().code,
            ErrorCode::InvalidMapKey
        );
        // duplicate
        assert_eq!(
            check(&[0xa2, 0x61, b'a', 0x01, 0x61, b'a', 0x02])
                .unwrap_err()
                .code,
            ErrorCode::DuplicateKey
        );
        // out of order
        assert_eq!(
            check(&[0xa2, 0x61, b'b', 0x01, 0x61, b'a', 0x02])
                .unwrap_err()
                .code,
            ErrorCode::UnsortedKeys
        );
    }

    #[test]
    fn rejects_foreign_tags() {
        // tag 0 (RFC 3339 time)
        assert_eq!(
            check(&[0xc0, 0x61, b'x']).unwrap_err().code,
            ErrorCode::UnknownTag
        );
        // tag 1 (epoch time)
        assert_eq!(check(&[0xc1, 0x00]).unwrap_err().code, ErrorCode::UnknownTag);
        // tag 2 (bignum)
        assert_eq!(
            check(&[0xc2, 0x41, 0x01]).unwrap_err().code,
            ErrorCode::UnknownTag
        );
    }

    #[test]
    fn undefined_requires_opt_in() {
        assert_eq!(
            check(&[0xf7]).unwrap_err().code,
            ErrorCode::InvalidSimpleValue
        );
        let opts = DecOptions {
            allow_undefined: true,
            ..DecOptions::default()
        };
        assert!(validate(&[0xf7], &opts).is_ok());
    }

    #[test]
    fn rejects_trailing_data() {
        assert_eq!(check(&[0xf5, 0x00]).unwrap_err().code, ErrorCode::TrailingData);
    }

    #[test]
    fn depth_cap_counts_tags() {
        let opts = DecOptions {
            max_nested_levels: 4,
            ..DecOptions::default()
        };
        // 4 nested arrays: ok
        assert!(validate(&[0x81, 0x81, 0x81, 0x80], &opts).is_ok());
        // 5 nested arrays: too deep
        assert_eq!(
            validate(&[0x81, 0x81, 0x81, 0x81, 0x80], &opts)
                .unwrap_err()
                .code,
            ErrorCode::DepthLimitExceeded
        );
    }

    #[test]
    fn truncated_input_is_unexpected_end() {
        assert_eq!(check(&[0x82, 0x01]).unwrap_err().code, ErrorCode::UnexpectedEnd);
        assert_eq!(check(&[0x19, 0x01]).unwrap_err().code, ErrorCode::UnexpectedEnd);
        assert_eq!(check(&[]).unwrap_err().code, ErrorCode::UnexpectedEnd);
    }

    #[test]
    fn cid_tag_contents_are_validated() {
        // tag 42 wrapping a text string
        assert_eq!(
            check(&[0xd8, 0x2a, 0x61, b'x']).unwrap_err().code,
            ErrorCode::UnknownTag
        );
        // tag 42 wrapping bytes without the 0x00 prefix
        assert_eq!(
            check(&[0xd8, 0x2a, 0x41, 0x01]).unwrap_err().code,
            ErrorCode::UnknownTag
        );
        // tag 42 wrapping a malformed CID body
        assert_eq!(
            check(&[0xd8, 0x2a, 0x43, 0x00, 0x01, 0x02]).unwrap_err().code,
            ErrorCode::ForbiddenCid
        );
    }

    #[test]
    fn raw_cid_mode_skips_dasl_validation() {
        let opts = DecOptions {
            use_raw_cid: true,
            ..DecOptions::default()
        };
        assert!(validate(&[0xd8, 0x2a, 0x43, 0x00, 0x01, 0x02], &opts).is_ok());
    }
}
