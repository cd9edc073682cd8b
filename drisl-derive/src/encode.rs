use quote::quote;
use syn::{spanned::Spanned, DataStruct, Fields, Generics, Ident, LitStr};

use crate::attrs::{ensure_no_cbor_attrs, parse_field_attrs};
use crate::types::type_mentions_self;
use crate::util::add_where_bound;

fn empty_where_clause() -> syn::WhereClause {
    syn::WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    }
}

pub(crate) fn encode_struct(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "Encode requires named fields (or `#[cbor(toarray)]` on a tuple struct)",
        ));
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let mut where_clause = where_clause.cloned().unwrap_or_else(empty_where_clause);

    let mut entries = Vec::new();
    let mut unknown_field: Option<Ident> = None;

    for field in &fields.named {
        let attr = parse_field_attrs(&field.attrs)?;
        let ident = field.ident.as_ref().unwrap();
        let ty = &field.ty;

        if attr.skip {
            continue;
        }

        if attr.unknown {
            if unknown_field.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field may carry `cbor(unknown)`",
                ));
            }
            unknown_field = Some(ident.clone());
            continue;
        }

        let key = attr
            .rename
            .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

        if !type_mentions_self(ty, name) {
            add_where_bound(&mut where_clause, ty, quote!(::drisl::Encode));
            if attr.omitempty {
                add_where_bound(&mut where_clause, ty, quote!(::drisl::IsEmpty));
            }
            if attr.omitzero {
                add_where_bound(
                    &mut where_clause,
                    ty,
                    quote!(::core::default::Default + ::core::cmp::PartialEq),
                );
            }
        }

        let entry = quote! {
            m.entry(#key, |enc| ::drisl::Encode::encode(&self.#ident, enc))?;
        };
        if attr.omitempty {
            entries.push(quote! {
                if !::drisl::IsEmpty::is_empty_value(&self.#ident) {
                    #entry
                }
            });
        } else if attr.omitzero {
            entries.push(quote! {
                if self.#ident != <#ty as ::core::default::Default>::default() {
                    #entry
                }
            });
        } else {
            entries.push(entry);
        }
    }

    let unknown = unknown_field.map(|ident| {
        quote! {
            for (k, v) in ::drisl::ValueMap::iter(&self.#ident) {
                m.entry(k, |enc| ::drisl::Encode::encode(v, enc))?;
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::drisl::Encode for #name #ty_generics #where_clause {
            fn encode(&self, enc: &mut ::drisl::Encoder) -> Result<(), ::drisl::Error> {
                enc.map(|m| {
                    #(#entries)*
                    #unknown
                    Ok(())
                })
            }
        }

        impl #impl_generics ::drisl::ArrayElem for #name #ty_generics #where_clause {}
    })
}

pub(crate) fn encode_toarray(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let mut where_clause = where_clause.cloned().unwrap_or_else(empty_where_clause);

    let mut items = Vec::new();

    match &data.fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                let attr = parse_field_attrs(&field.attrs)?;
                if attr.unknown {
                    return Err(syn::Error::new(
                        field.span(),
                        "`cbor(unknown)` is meaningless inside `cbor(toarray)`",
                    ));
                }
                if attr.skip {
                    continue;
                }
                // omitempty/omitzero are disabled by toarray so the element
                // count stays fixed.
                let ident = field.ident.as_ref().unwrap();
                if !type_mentions_self(&field.ty, name) {
                    add_where_bound(&mut where_clause, &field.ty, quote!(::drisl::Encode));
                }
                items.push(quote! { a.value(&self.#ident)?; });
            }
        }
        Fields::Unnamed(fields) => {
            for (idx, field) in fields.unnamed.iter().enumerate() {
                ensure_no_cbor_attrs(&field.attrs, "tuple struct fields")?;
                let index = syn::Index::from(idx);
                if !type_mentions_self(&field.ty, name) {
                    add_where_bound(&mut where_clause, &field.ty, quote!(::drisl::Encode));
                }
                items.push(quote! { a.value(&self.#index)?; });
            }
        }
        Fields::Unit => {}
    }

    let len = items.len();

    Ok(quote! {
        impl #impl_generics ::drisl::Encode for #name #ty_generics #where_clause {
            fn encode(&self, enc: &mut ::drisl::Encoder) -> Result<(), ::drisl::Error> {
                enc.array(#len, |a| {
                    #(#items)*
                    Ok(())
                })
            }
        }

        impl #impl_generics ::drisl::ArrayElem for #name #ty_generics #where_clause {}
    })
}
