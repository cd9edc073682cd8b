use crate::time::TimeMode;
use crate::{Error, ErrorCode};

/// Default maximum nesting depth for arrays, maps, and tags combined.
pub const DEFAULT_MAX_NESTED_LEVELS: u32 = 32;

/// Default maximum element/pair count for arrays and maps.
pub const DEFAULT_MAX_CONTAINER_ELEMENTS: usize = 128 * 1024;

const MIN_NESTED_LEVELS: u32 = 4;
const MAX_NESTED_LEVELS: u32 = 65_535;
const MIN_CONTAINER_ELEMENTS: usize = 16;
const MAX_CONTAINER_ELEMENTS: usize = i32::MAX as usize;

/// Decoding options.
///
/// The bundle is plain data: decoders built from it hold only this immutable
/// configuration and are safe to share across parallel workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecOptions {
    /// Max nested levels allowed for any combination of arrays, maps, and
    /// tags. Default is 32 and it can be set to `[4, 65535]`. Higher maximum
    /// levels of nesting can require larger amounts of stack to deserialize;
    /// don't increase this higher than you require.
    pub max_nested_levels: u32,

    /// Max number of elements for arrays. Also caps the byte length of byte
    /// and text strings. Default is `128*1024` and it can be set to
    /// `[16, 2147483647]`.
    pub max_array_elements: usize,

    /// Max number of key-value pairs for maps.
    /// Default is `128*1024` and it can be set to `[16, 2147483647]`.
    pub max_map_pairs: usize,

    /// Reduces the range of valid integers when decoding to the range
    /// supported by `i64`: `[-(2^63), 2^63-1]`.
    pub int64_range_only: bool,

    /// Accepts CBOR's `undefined` simple value when decoding, silently
    /// folding it into null.
    pub allow_undefined: bool,

    /// Decodes CIDs into [`RawCid`](crate::RawCid) instead of
    /// [`Cid`](crate::Cid), skipping DASL validation. Useful when decoding a
    /// document from the wider IPFS ecosystem.
    pub use_raw_cid: bool,
}

impl Default for DecOptions {
    fn default() -> Self {
        Self {
            max_nested_levels: DEFAULT_MAX_NESTED_LEVELS,
            max_array_elements: DEFAULT_MAX_CONTAINER_ELEMENTS,
            max_map_pairs: DEFAULT_MAX_CONTAINER_ELEMENTS,
            int64_range_only: false,
            allow_undefined: false,
            use_raw_cid: false,
        }
    }
}

impl DecOptions {
    /// Validate the option values against their permitted ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOptions` if any cap is outside its documented range.
    pub fn check(&self) -> Result<(), Error> {
        if self.max_nested_levels < MIN_NESTED_LEVELS
            || self.max_nested_levels > MAX_NESTED_LEVELS
        {
            return Err(Error::new(ErrorCode::InvalidOptions, 0));
        }
        for cap in [self.max_array_elements, self.max_map_pairs] {
            if !(MIN_CONTAINER_ELEMENTS..=MAX_CONTAINER_ELEMENTS).contains(&cap) {
                return Err(Error::new(ErrorCode::InvalidOptions, 0));
            }
        }
        Ok(())
    }
}

/// Encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncOptions {
    /// How to encode time values. The default is an RFC 3339 string with
    /// nanosecond precision.
    pub time: TimeMode,

    /// Reduces the range of valid integers when encoding to the range
    /// supported by `i64`: `[-(2^63), 2^63-1]`.
    pub int64_range_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_caps_are_within_range() {
        assert!(DecOptions::default().check().is_ok());
    }

    #[test]
    fn caps_at_documented_boundaries() {
        let mut opts = DecOptions {
            max_nested_levels: 4,
            max_array_elements: 16,
            max_map_pairs: 16,
            ..DecOptions::default()
        };
        assert!(opts.check().is_ok());

        opts.max_nested_levels = 65_535;
        opts.max_array_elements = i32::MAX as usize;
        opts.max_map_pairs = i32::MAX as usize;
        assert!(opts.check().is_ok());

        opts.max_nested_levels = 3;
        assert_eq!(
            opts.check().unwrap_err().code,
            ErrorCode::InvalidOptions
        );

        opts.max_nested_levels = 32;
        opts.max_array_elements = 15;
        assert_eq!(
            opts.check().unwrap_err().code,
            ErrorCode::InvalidOptions
        );
    }
}
