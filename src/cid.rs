//! Content Identifiers, specifically the restricted DASL subset of CIDs.
//!
//! A DASL CID is always exactly 36 bytes: a version byte, a codec byte, a
//! hash-type byte, a hash-size byte fixed at 32, and a 32-byte digest.

use core::fmt;
use std::io;

use sha2::{Digest as _, Sha256};

use crate::{Error, ErrorCode};

/// The tag number used to encode a CID in CBOR.
pub const CID_TAG: u64 = 42;

/// CID version byte, always 1.
pub const CID_VERSION: u8 = 0x01;

/// Length of the binary CID form.
pub const CID_LEN: usize = 36;

/// Length of the hash digest embedded in a CID.
pub const HASH_LEN: usize = 32;

/// Length of the string CID form: multibase prefix plus 58 base32 characters.
pub const CID_STR_LEN: usize = 59;

/// The encoding of the data represented by a CID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Codec {
    /// Raw bytes.
    Raw = 0x55,
    /// DRISL (dag-cbor) data.
    Drisl = 0x71,
}

impl Codec {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x55 => Some(Self::Raw),
            0x71 => Some(Self::Drisl),
            _ => None,
        }
    }
}

/// The algorithm of the hash digest embedded in a CID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HashType {
    /// SHA-256.
    Sha256 = 0x12,
    /// BLAKE3 with a 32-byte output.
    Blake3 = 0x1e,
}

impl HashType {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x12 => Some(Self::Sha256),
            0x1e => Some(Self::Blake3),
            _ => None,
        }
    }
}

/// An incremental hasher matching a CID's hash type.
///
/// Used to verify content digests while streaming, without the caller caring
/// which algorithm the CID names.
pub enum Hasher {
    /// SHA-256 state.
    Sha256(Sha256),
    /// BLAKE3 state.
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    /// Feed data into the hash state.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Finish and return the 32-byte digest.
    #[must_use]
    pub fn finalize(self) -> [u8; HASH_LEN] {
        match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        }
    }
}

// RFC 4648 base32, lowercase, no padding. This is the multibase encoding
// referred to by "base32" or the prefix "b".
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

fn base32_encode(data: &[u8], out: &mut String) {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in data {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
    }
}

fn base32_value(c: u8) -> Option<u32> {
    match c {
        b'a'..=b'z' => Some(u32::from(c - b'a')),
        b'A'..=b'Z' => Some(u32::from(c - b'A')),
        b'2'..=b'7' => Some(u32::from(c - b'2') + 26),
        _ => None,
    }
}

fn base32_decode(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &c in s.as_bytes() {
        acc = (acc << 5) | base32_value(c)?;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    // Leftover bits are padding and must be zero.
    if bits > 0 && (acc & ((1 << bits) - 1)) != 0 {
        return None;
    }
    Some(out)
}

/// A DASL CID.
///
/// The value is a fixed 36-byte array; every constructor enforces the DASL
/// shape, so a `Cid` obtained from one of them is always valid. The one
/// exception is [`Cid::default`], which produces an undefined placeholder for
/// use as a record zero value; check with [`Cid::defined`] before using a CID
/// that may have come from a default.
///
/// CIDs are plain `Copy` values; store and pass them by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid([u8; CID_LEN]);

impl Default for Cid {
    fn default() -> Self {
        Self([0u8; CID_LEN])
    }
}

impl Cid {
    /// The raw SHA-256 CID of the empty byte string.
    ///
    /// Try not to use it as a sentinel value.
    pub const EMPTY: Self = Self([
        0x01, 0x55, 0x12, 0x20, 0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb,
        0xf4, 0xc8, 0x99, 0x6f, 0xb9, 0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c,
        0xa4, 0x95, 0x99, 0x1b, 0x78, 0x52, 0xb8, 0x55,
    ]);

    /// Create a CID from its 36-byte binary form.
    ///
    /// Note this is not the same as the bytes for a CID encoded in DRISL.
    ///
    /// # Errors
    ///
    /// Returns `ForbiddenCid` if the input is not exactly 36 bytes or any
    /// field does not conform to DASL.
    pub fn from_bytes(input: &[u8]) -> Result<Self, Error> {
        let arr: &[u8; CID_LEN] = input
            .try_into()
            .map_err(|_| Error::new(ErrorCode::ForbiddenCid, 0))?;
        if arr[0] != CID_VERSION {
            return Err(Error::new(ErrorCode::ForbiddenCid, 0));
        }
        if Codec::from_byte(arr[1]).is_none() {
            return Err(Error::new(ErrorCode::ForbiddenCid, 1));
        }
        if HashType::from_byte(arr[2]).is_none() {
            return Err(Error::new(ErrorCode::ForbiddenCid, 2));
        }
        if arr[3] != HASH_LEN as u8 {
            return Err(Error::new(ErrorCode::ForbiddenCid, 3));
        }
        Ok(Self(*arr))
    }

    /// Read a binary CID from a reader, consuming exactly 36 bytes.
    ///
    /// Surplus bytes on the reader are permitted and left unread.
    ///
    /// # Errors
    ///
    /// Returns `ForbiddenCid` for invalid CID data, `UnexpectedEnd` if the
    /// reader ends early, and `Io` for other reader failures.
    pub fn from_reader<R: io::Read>(r: &mut R) -> Result<Self, Error> {
        let mut buf = [0u8; CID_LEN];
        r.read_exact(&mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::new(ErrorCode::UnexpectedEnd, 0)
            } else {
                Error::new(ErrorCode::Io, 0)
            }
        })?;
        Self::from_bytes(&buf)
    }

    /// Create a CID from its string form.
    ///
    /// The string must be 59 characters: a `b` multibase prefix followed by
    /// 58 base32 characters. Uppercase input is accepted; output is always
    /// lowercase.
    ///
    /// # Errors
    ///
    /// Returns `ForbiddenCid` if the string or the decoded bytes are invalid.
    pub fn from_string(s: &str) -> Result<Self, Error> {
        if s.len() != CID_STR_LEN || !s.starts_with('b') {
            return Err(Error::new(ErrorCode::ForbiddenCid, 0));
        }
        let bytes =
            base32_decode(&s[1..]).ok_or(Error::new(ErrorCode::ForbiddenCid, 1))?;
        Self::from_bytes(&bytes)
    }

    /// Create a CID manually from its parts. The fixed shape makes this
    /// infallible: both enums only hold conforming values and the digest
    /// length is fixed by the type.
    #[must_use]
    pub fn from_parts(codec: Codec, hash_type: HashType, digest: &[u8; HASH_LEN]) -> Self {
        let mut b = [0u8; CID_LEN];
        b[0] = CID_VERSION;
        b[1] = codec as u8;
        b[2] = hash_type as u8;
        b[3] = HASH_LEN as u8;
        b[4..].copy_from_slice(digest);
        Self(b)
    }

    /// Create a raw SHA-256 CID by hashing the provided bytes.
    #[must_use]
    pub fn hash_bytes(data: &[u8]) -> Self {
        let digest: [u8; HASH_LEN] = Sha256::digest(data).into();
        Self::from_parts(Codec::Raw, HashType::Sha256, &digest)
    }

    /// Create a raw SHA-256 CID by hashing all the data in the reader.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the reader fails.
    pub fn hash_reader<R: io::Read>(r: &mut R) -> Result<Self, Error> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = r.read(&mut buf).map_err(|_| Error::new(ErrorCode::Io, 0))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let digest: [u8; HASH_LEN] = hasher.finalize().into();
        Ok(Self::from_parts(Codec::Raw, HashType::Sha256, &digest))
    }

    /// The CID in binary form.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; CID_LEN] {
        self.0
    }

    /// Borrow the binary form.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CID_LEN] {
        &self.0
    }

    /// The codec of the CID.
    ///
    /// # Panics
    ///
    /// Panics if the CID is undefined (constructed via `Default`).
    #[must_use]
    pub fn codec(&self) -> Codec {
        match Codec::from_byte(self.0[1]) {
            Some(c) => c,
            None => panic!("undefined cid"),
        }
    }

    /// The hash type of the CID.
    ///
    /// # Panics
    ///
    /// Panics if the CID is undefined (constructed via `Default`).
    #[must_use]
    pub fn hash_type(&self) -> HashType {
        match HashType::from_byte(self.0[2]) {
            Some(h) => h,
            None => panic!("undefined cid"),
        }
    }

    /// The hash digest stored in the CID.
    #[must_use]
    pub fn digest(&self) -> [u8; HASH_LEN] {
        let mut d = [0u8; HASH_LEN];
        d.copy_from_slice(&self.0[4..]);
        d
    }

    /// A fresh hasher matching this CID's hash type.
    ///
    /// # Panics
    ///
    /// Panics if the CID is undefined (constructed via `Default`).
    #[must_use]
    pub fn hasher(&self) -> Hasher {
        match self.hash_type() {
            HashType::Sha256 => Hasher::Sha256(Sha256::new()),
            HashType::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// Returns false iff this CID was created via `Default` rather than one
    /// of the validating constructors.
    #[must_use]
    pub fn defined(&self) -> bool {
        self.0[0] == CID_VERSION
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(CID_STR_LEN);
        s.push('b');
        base32_encode(&self.0, &mut s);
        f.write_str(&s)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.defined() {
            write!(f, "Cid({self})")
        } else {
            f.write_str("Cid(undefined)")
        }
    }
}

impl std::str::FromStr for Cid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// An unvalidated CID.
///
/// Used to carry CID information when decoding non-DASL CIDs from DRISL is
/// enabled via `UseRawCid`, and to encode such CIDs. Only do this if you are
/// not working in a DASL-compliant ecosystem.
///
/// It holds the bytes of a binary CID (not the CID-in-CBOR bytes). There are
/// no guarantees this is a valid CID by any spec; pass it to
/// [`Cid::from_bytes`] to validate it as a DASL CID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RawCid(Vec<u8>);

impl RawCid {
    /// Wrap binary CID bytes without validation.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the binary CID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the binary CID bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for RawCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(1 + self.0.len() * 8 / 5 + 1);
        s.push('b');
        base32_encode(&self.0, &mut s);
        f.write_str(&s)
    }
}

impl From<Cid> for RawCid {
    fn from(c: Cid) -> Self {
        Self(c.to_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    const TEST_STR: &str = "bafkreifn5yxi7nkftsn46b6x26grda57ict7md2xuvfbsgkiahe2e7vnq4";
    const TEST_HEX: &str = "01551220adee2e8fb5459c9bcf07d7d78d1183bf40a7f60f57a54a19194801c9a27ead87";

    #[test]
    fn from_string_round_trips() {
        let c = Cid::from_string(TEST_STR).unwrap();
        assert_eq!(c.to_string(), TEST_STR);
        assert_eq!(c.to_bytes().to_vec(), hex(TEST_HEX));
    }

    #[test]
    fn from_bytes_round_trips() {
        let b = hex(TEST_HEX);
        let c = Cid::from_bytes(&b).unwrap();
        assert_eq!(c.to_bytes().to_vec(), b);
        assert_eq!(c.to_string(), TEST_STR);
        assert_eq!(c.codec(), Codec::Raw);
        assert_eq!(c.hash_type(), HashType::Sha256);
        assert_eq!(c.digest().to_vec(), hex(&TEST_HEX[8..]));
    }

    #[test]
    fn from_string_is_case_insensitive() {
        let c = Cid::from_string(&TEST_STR.to_uppercase().replace('B', "b")).unwrap();
        assert_eq!(c.to_string(), TEST_STR);
    }

    #[test]
    fn rejects_malformed_inputs() {
        for bad in [
            "",
            "x",
            &TEST_STR[..58],
            "cafkreifn5yxi7nkftsn46b6x26grda57ict7md2xuvfbsgkiahe2e7vnq4",
        ] {
            assert!(Cid::from_string(bad).is_err(), "{bad:?}");
        }

        let mut b = hex(TEST_HEX);
        b[0] = 0x02;
        assert!(Cid::from_bytes(&b).is_err());
        b[0] = 0x01;
        b[1] = 0x70;
        assert!(Cid::from_bytes(&b).is_err());
        b[1] = 0x55;
        b[2] = 0x13;
        assert!(Cid::from_bytes(&b).is_err());
        b[2] = 0x12;
        b[3] = 0x21;
        assert!(Cid::from_bytes(&b).is_err());

        assert!(Cid::from_bytes(&hex(TEST_HEX)[..35]).is_err());
    }

    #[test]
    fn hash_bytes_matches_reference() {
        assert_eq!(Cid::hash_bytes(b"").to_bytes(), Cid::EMPTY.to_bytes());
        let c = Cid::hash_bytes(b"test content");
        assert_eq!(c.codec(), Codec::Raw);
        assert_eq!(c.to_string().len(), CID_STR_LEN);
        assert!(c.to_string().starts_with("bafkrei"));
    }

    #[test]
    fn hash_reader_matches_hash_bytes() {
        let data = b"some streamed content";
        let mut r = &data[..];
        assert_eq!(Cid::hash_reader(&mut r).unwrap(), Cid::hash_bytes(data));
    }

    #[test]
    fn from_reader_leaves_surplus() {
        let mut data = hex(TEST_HEX);
        data.extend_from_slice(b"extra");
        let mut r = &data[..];
        let c = Cid::from_reader(&mut r).unwrap();
        assert_eq!(c.to_string(), TEST_STR);
        assert_eq!(r, b"extra");
    }

    #[test]
    fn default_is_undefined() {
        let c = Cid::default();
        assert!(!c.defined());
        assert!(Cid::from_string(TEST_STR).unwrap().defined());
    }

    #[test]
    fn raw_cid_displays_base32() {
        let raw = RawCid::new(hex(TEST_HEX));
        assert_eq!(raw.to_string(), TEST_STR);
    }
}
