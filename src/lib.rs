//! # drisl
//!
//! An implementation of **DRISL**, the strict canonical CBOR profile from the
//! DASL family of content-addressed formats, together with its companion
//! 36-byte [`Cid`] type, the [`masl`] metadata schema, and the [`rasl`]
//! retrieval URL scheme.
//!
//! ## Design principles
//!
//! - **One value, one encoding.** The encoder is a function of its input:
//!   shortest-form heads, binary64 floats, definite lengths, and map keys in
//!   bytewise order of their encoding. Output is byte-identical across runs
//!   and platforms.
//! - **The decoder rejects, it never normalizes.** Every input deviating from
//!   the canonical form fails with a structured [`Error`]; for every byte
//!   string the decoder accepts, re-encoding reproduces it exactly.
//! - **Resource caps are the defense.** Nesting, array, and map limits bound
//!   the cost of a single call; capacity hints read from the wire are checked
//!   against them before any allocation.
//!
//! ## Quick start
//!
//! ```
//! use drisl::{marshal, unmarshal, Value};
//!
//! let bytes = marshal(&true).unwrap();
//! assert_eq!(bytes, [0xf5]);
//! let v: Value = unmarshal(&bytes).unwrap();
//! assert_eq!(v, Value::Bool(true));
//! ```
//!
//! Record types derive their wire shape:
//!
//! ```
//! use drisl::{marshal, unmarshal, Encode, Decode};
//!
//! #[derive(Debug, Default, PartialEq, Encode, Decode)]
//! struct Post {
//!     title: String,
//!     #[cbor(omitempty)]
//!     tags: Vec<String>,
//! }
//!
//! let post = Post { title: "hello".into(), tags: Vec::new() };
//! let bytes = marshal(&post).unwrap();
//! assert_eq!(unmarshal::<Post>(&bytes).unwrap(), post);
//! ```
//!
//! ## Concurrency
//!
//! Encoding and decoding are pure functions of their inputs plus an options
//! bundle; both bundles are small `Copy` structs safe to share across
//! threads. A [`StreamDecoder`] binds to one input source and is not safe
//! for concurrent use.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc
)]

// Lets the derive macros refer to `::drisl` from inside this crate.
extern crate self as drisl;

mod cid;
mod codec;
mod de;
mod encode;
mod error;
mod float;
mod options;
mod order;
mod scan;
mod stream;
mod time;
mod utf8;
mod value;
mod wire;

pub mod masl;
pub mod rasl;

pub use crate::cid::{
    Cid, Codec, HashType, Hasher, RawCid, CID_LEN, CID_STR_LEN, CID_TAG, CID_VERSION, HASH_LEN,
};
pub use crate::codec::{
    cid_for_value, marshal, marshal_with, unmarshal, unmarshal_with, valid, ArrayElem, Decode,
    Encode, IsEmpty, RawValue,
};
pub use crate::de::{ArrayRef, Kind, MapRef, ValueRef};
pub use crate::encode::{ArrayEncoder, Encoder, MapEncoder};
pub use crate::error::{Error, ErrorCode};
pub use crate::options::{
    DecOptions, EncOptions, DEFAULT_MAX_CONTAINER_ELEMENTS, DEFAULT_MAX_NESTED_LEVELS,
};
pub use crate::scan::validate;
pub use crate::stream::{StreamDecoder, StreamEncoder};
pub use crate::time::TimeMode;
pub use crate::value::{Int, Value, ValueMap};

/// Derive macro for [`Encode`].
pub use drisl_derive::Encode;

/// Derive macro for [`Decode`].
pub use drisl_derive::Decode;
