//! The RASL URL scheme for retrieving content-addressed resources.
//!
//! Example:
//!
//! ```text
//! rasl://bafkreifn5yxi7nkftsn46b6x26grda57ict7md2xuvfbsgkiahe2e7vnq4/?hint=berjon.com&hint=bsky.app
//! ```
//!
//! The HTTP handlers and the hint-racing fetch client live with the
//! application; this module provides the URL shape, the well-known retrieval
//! locations, and the digest-verifying stream wrapper they share.

use core::fmt;
use std::io;

use crate::cid::{Cid, Hasher};

/// Prefix of the retrieval path on a hint host.
pub const WELL_KNOWN_PREFIX: &str = "/.well-known/rasl/";

/// Why a RASL URL failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UrlError {
    /// The URL does not start with `rasl://`.
    InvalidScheme,
    /// The URL is not syntactically valid.
    Malformed,
    /// User info is not allowed.
    UserInfoForbidden,
    /// Fragments are not allowed.
    FragmentForbidden,
    /// The authority must be a bare CID string.
    InvalidCid,
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidScheme => "invalid scheme",
            Self::Malformed => "malformed url",
            Self::UserInfoForbidden => "user info not allowed",
            Self::FragmentForbidden => "fragment not allowed",
            Self::InvalidCid => "authority is not a valid cid",
        };
        write!(f, "rasl: {msg}")
    }
}

impl std::error::Error for UrlError {}

/// All the information carried by a RASL URL.
///
/// Construct manually or use [`Url::parse`]; manual construction skips
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    /// The content identifier.
    pub cid: Cid,

    /// Hint hosts where the content may be found.
    /// Examples: `domain.com`, `1.2.3.4:1234`, `[::1]`.
    pub hints: Vec<String>,

    /// Optional URL path, used when the CID resolves to MASL data.
    pub path: String,
}

fn valid_hint(hint: &str) -> bool {
    if hint.is_empty() {
        return false;
    }
    // A hint is a bare host with an optional port; piggyback on URL parsing
    // and require that nothing else appears.
    match url::Url::parse(&format!("https://{hint}/")) {
        Ok(u) => {
            u.host_str().is_some()
                && u.username().is_empty()
                && u.password().is_none()
                && u.path() == "/"
                && u.query().is_none()
                && u.fragment().is_none()
        }
        Err(_) => false,
    }
}

impl Url {
    /// Parse a RASL URL string.
    ///
    /// Invalid hints are silently dropped, as the specification requires;
    /// everything else that deviates is an error.
    ///
    /// # Errors
    ///
    /// Returns a [`UrlError`] describing the first violation.
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        if !raw.starts_with("rasl://") {
            return Err(UrlError::InvalidScheme);
        }
        let u = url::Url::parse(raw).map_err(|_| UrlError::Malformed)?;
        if !u.username().is_empty() || u.password().is_some() {
            return Err(UrlError::UserInfoForbidden);
        }
        if u.fragment().is_some() {
            return Err(UrlError::FragmentForbidden);
        }
        if u.port().is_some() {
            return Err(UrlError::InvalidCid);
        }

        let host = u.host_str().ok_or(UrlError::InvalidCid)?;
        let cid = Cid::from_string(host).map_err(|_| UrlError::InvalidCid)?;

        let hints: Vec<String> = u
            .query_pairs()
            .filter(|(k, _)| k == "hint")
            .map(|(_, v)| v.into_owned())
            .filter(|h| valid_hint(h))
            .collect();

        Ok(Self {
            cid,
            hints,
            path: u.path().to_owned(),
        })
    }

    /// The retrieval URL on one hint host:
    /// `https://<hint>/.well-known/rasl/<cid>`.
    #[must_use]
    pub fn location(&self, hint: &str) -> String {
        format!("https://{hint}{WELL_KNOWN_PREFIX}{}", self.cid)
    }

    /// Retrieval URLs for every hint, in order.
    #[must_use]
    pub fn locations(&self) -> Vec<String> {
        self.hints.iter().map(|h| self.location(h)).collect()
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rasl://{}{}", self.cid, self.path)?;
        if !self.hints.is_empty() {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            for hint in &self.hints {
                query.append_pair("hint", hint);
            }
            write!(f, "?{}", query.finish())?;
        }
        Ok(())
    }
}

/// A reader that verifies content against a CID's digest as it streams.
///
/// Bytes pass through untouched while the matching hasher runs over them.
/// When the source reaches end-of-file the digest is checked: on mismatch the
/// terminal read returns an `InvalidData` error instead of the usual clean
/// end-of-stream.
///
/// This is the validation half of a RASL fetch; wrap the winning response
/// body with it and hand the wrapper to the caller.
pub struct VerifyingReader<R: io::Read> {
    src: R,
    cid: Cid,
    hasher: Option<Hasher>,
    failed: bool,
}

impl<R: io::Read> VerifyingReader<R> {
    /// Wrap a content stream to be verified against `cid`.
    #[must_use]
    pub fn new(cid: Cid, src: R) -> Self {
        let hasher = cid.hasher();
        Self {
            src,
            cid,
            hasher: Some(hasher),
            failed: false,
        }
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.src
    }
}

/// Error message carried by the `InvalidData` error on digest mismatch.
pub const CID_VALIDATION_ERROR: &str = "rasl: data doesn't match CID";

impl<R: io::Read> io::Read for VerifyingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                CID_VALIDATION_ERROR,
            ));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.src.read(buf)?;
        if n > 0 {
            if let Some(hasher) = &mut self.hasher {
                hasher.update(&buf[..n]);
            }
            return Ok(n);
        }
        // End of stream: all bytes have been read, check the digest.
        if let Some(hasher) = self.hasher.take() {
            if hasher.finalize() != self.cid.digest() {
                self.failed = true;
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    CID_VALIDATION_ERROR,
                ));
            }
        }
        Ok(0)
    }
}
