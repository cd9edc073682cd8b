use core::fmt;

/// A structured error code identifying the reason an operation was rejected.
///
/// This enum is intentionally stable and string-free so that callers can match
/// on failure classes without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Option bundle values outside their permitted ranges.
    InvalidOptions,

    /// Unexpected end-of-input while decoding an item.
    UnexpectedEnd,
    /// Arithmetic overflow while computing a length or offset.
    LengthOverflow,
    /// Input contains trailing bytes after the single top-level item.
    TrailingData,
    /// Array builder emitted a different number of elements than declared.
    LengthMismatch,

    /// Reserved additional-info value (28..=30) or a stray break byte.
    InvalidHead,
    /// Integer or length argument was not encoded in its shortest form.
    NonMinimalHead,
    /// Indefinite-length strings, arrays, and maps are forbidden.
    IndefiniteLengthForbidden,

    /// Text string payload is not valid UTF-8.
    InvalidUtf8,
    /// NaN or an infinity on either codec path.
    InvalidFloat,
    /// Half/single-precision float head on the wire, or a binary64 value that
    /// does not survive narrowing to the requested 32-bit target.
    NarrowFloatForbidden,
    /// Integer outside `[-(2^64), 2^64-1]`, or a narrowing conversion that
    /// does not fit the target type.
    IntegerOverflow,
    /// Integer outside `[-(2^63), 2^63-1]` while `Int64RangeOnly` is set.
    IntegerOutOfRange,

    /// Map key was not a text string.
    InvalidMapKey,
    /// Duplicate map key.
    DuplicateKey,
    /// Map keys are not in ascending bytewise order of their encoding.
    UnsortedKeys,

    /// Any tag other than 42, or tag 42 with malformed content.
    UnknownTag,
    /// Simple value other than false, true, null (and undefined when allowed).
    InvalidSimpleValue,

    /// Nesting depth of arrays, maps, and tags exceeds `MaxNestedLevels`.
    DepthLimitExceeded,
    /// Array length exceeds `MaxArrayElements`.
    ArrayLimitExceeded,
    /// Map pair count exceeds `MaxMapPairs`.
    MapLimitExceeded,
    /// Byte string length exceeds the element cap.
    BytesLimitExceeded,
    /// Text string length exceeds the element cap.
    TextLimitExceeded,

    /// CID does not conform to the DASL CID shape.
    ForbiddenCid,
    /// Value cannot be represented in the profile (e.g. time under
    /// `TimeMode::Reject`).
    UnsupportedType,
    /// Wire item kind does not match the requested target.
    TypeMismatch,
    /// A pre-encoded fragment or marshal hook produced non-canonical bytes.
    MarshalerViolatedCanonicity,

    /// An underlying reader or writer failed.
    Io,
}

/// A codec error with a stable code and the byte offset where it was detected.
///
/// For encode-path errors the offset refers to the output position; for
/// decode-path errors it refers to the input position. When a raw fragment is
/// rejected, `cause` carries the decoder error code that failed inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset where the error was detected.
    pub offset: usize,
    /// Underlying code for wrapped failures, if any.
    pub cause: Option<ErrorCode>,
}

impl Error {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self {
            code,
            offset,
            cause: None,
        }
    }

    /// Construct an error wrapping an underlying failure.
    #[inline]
    #[must_use]
    pub const fn caused_by(code: ErrorCode, cause: Error) -> Self {
        Self {
            code,
            offset: cause.offset,
            cause: Some(cause.code),
        }
    }
}

fn describe(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InvalidOptions => "option value outside permitted range",

        ErrorCode::UnexpectedEnd => "unexpected end of input",
        ErrorCode::LengthOverflow => "length overflow",
        ErrorCode::TrailingData => "trailing bytes after top-level item",
        ErrorCode::LengthMismatch => "container length mismatch",

        ErrorCode::InvalidHead => "invalid head byte",
        ErrorCode::NonMinimalHead => "head not encoded in shortest form",
        ErrorCode::IndefiniteLengthForbidden => "indefinite length forbidden",

        ErrorCode::InvalidUtf8 => "text must be valid UTF-8",
        ErrorCode::InvalidFloat => "NaN and infinities forbidden",
        ErrorCode::NarrowFloatForbidden => "float narrower than binary64 forbidden",
        ErrorCode::IntegerOverflow => "integer exceeds 64-bit range",
        ErrorCode::IntegerOutOfRange => "integer outside int64 range",

        ErrorCode::InvalidMapKey => "map keys must be text strings",
        ErrorCode::DuplicateKey => "duplicate map key",
        ErrorCode::UnsortedKeys => "map keys not in canonical order",

        ErrorCode::UnknownTag => "only tag 42 is supported",
        ErrorCode::InvalidSimpleValue => "unsupported simple value",

        ErrorCode::DepthLimitExceeded => "nesting depth limit exceeded",
        ErrorCode::ArrayLimitExceeded => "array length exceeds limit",
        ErrorCode::MapLimitExceeded => "map pair count exceeds limit",
        ErrorCode::BytesLimitExceeded => "byte string length exceeds limit",
        ErrorCode::TextLimitExceeded => "text string length exceeds limit",

        ErrorCode::ForbiddenCid => "does not conform to the DASL CID specification",
        ErrorCode::UnsupportedType => "value cannot be encoded in this profile",
        ErrorCode::TypeMismatch => "wire item does not match target type",
        ErrorCode::MarshalerViolatedCanonicity => "marshaler produced non-canonical bytes",

        ErrorCode::Io => "underlying I/O failure",
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drisl error at {}: {}", self.offset, describe(self.code))?;
        if let Some(cause) = self.cause {
            write!(f, " ({})", describe(cause))?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
