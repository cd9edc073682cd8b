//! Procedural macro derives for `drisl`.

#![deny(clippy::all)]
#![deny(missing_docs)]

extern crate proc_macro;

mod attrs;
mod decode;
mod encode;
mod types;
mod util;

use proc_macro::TokenStream;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput};

use crate::attrs::parse_container_attrs;
use crate::decode::{decode_struct, decode_toarray};
use crate::encode::{encode_struct, encode_toarray};

#[proc_macro_derive(Encode, attributes(cbor))]
/// Derive canonical DRISL encoding for structs with named fields.
///
/// Field directives: `#[cbor(rename = "...")]`, `#[cbor(omitempty)]`,
/// `#[cbor(omitzero)]`, `#[cbor(skip)]`, `#[cbor(unknown)]`. The container
/// directive `#[cbor(toarray)]` encodes the record as an array in declared
/// field order.
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let out = (|| -> syn::Result<proc_macro2::TokenStream> {
        let container = parse_container_attrs(&input.attrs)?;
        match &input.data {
            Data::Struct(data) => {
                if container.toarray {
                    encode_toarray(&input.ident, &input.generics, data)
                } else {
                    encode_struct(&input.ident, &input.generics, data)
                }
            }
            Data::Enum(e) => Err(syn::Error::new(
                e.enum_token.span(),
                "Encode is derived for structs with named fields",
            )),
            Data::Union(u) => Err(syn::Error::new(
                u.union_token.span(),
                "Encode is not supported for unions",
            )),
        }
    })();

    match out {
        Ok(ts) => TokenStream::from(ts),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

#[proc_macro_derive(Decode, attributes(cbor))]
/// Derive canonical DRISL decoding for structs with named fields.
///
/// Map keys bind to fields by exact match against the resolved key first,
/// then case-insensitively. Keys matching no field are discarded, or
/// accumulated into a `#[cbor(unknown)]` map field when one exists. Absent
/// fields take their `Default` value.
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let out = (|| -> syn::Result<proc_macro2::TokenStream> {
        let container = parse_container_attrs(&input.attrs)?;
        match &input.data {
            Data::Struct(data) => {
                if container.toarray {
                    decode_toarray(&input.ident, &input.generics, data)
                } else {
                    decode_struct(&input.ident, &input.generics, data)
                }
            }
            Data::Enum(e) => Err(syn::Error::new(
                e.enum_token.span(),
                "Decode is derived for structs with named fields",
            )),
            Data::Union(u) => Err(syn::Error::new(
                u.union_token.span(),
                "Decode is not supported for unions",
            )),
        }
    })();

    match out {
        Ok(ts) => TokenStream::from(ts),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}
