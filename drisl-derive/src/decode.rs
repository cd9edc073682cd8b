use quote::{format_ident, quote};
use syn::{
    spanned::Spanned, DataStruct, Fields, GenericParam, Generics, Ident, Lifetime, LifetimeParam,
    LitStr,
};

use crate::attrs::{ensure_no_cbor_attrs, parse_field_attrs};
use crate::types::type_mentions_self;
use crate::util::add_where_bound;

// Pick a decode lifetime name that cannot collide with the struct's own
// lifetimes, and make every existing lifetime outlive it so borrowed fields
// can bind to the input buffer.
fn decode_lifetime(generics: &Generics) -> (Generics, Lifetime) {
    let mut out = generics.clone();
    let mut name = "__cbor".to_string();
    let mut counter = 0usize;
    loop {
        let probe = Ident::new(&name, proc_macro2::Span::call_site());
        if !out.lifetimes().any(|lt| lt.lifetime.ident == probe) {
            break;
        }
        counter += 1;
        name = format!("__cbor{counter}");
    }
    let lt = Lifetime::new(&format!("'{name}"), proc_macro2::Span::call_site());
    out.params
        .insert(0, GenericParam::Lifetime(LifetimeParam::new(lt.clone())));

    let wc = out.make_where_clause();
    for lifetime in generics.lifetimes() {
        let lt_ident = &lifetime.lifetime;
        wc.predicates.push(syn::parse_quote!(#lt: #lt_ident));
    }

    (out, lt)
}

pub(crate) fn decode_struct(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "Decode requires named fields (or `#[cbor(toarray)]` on a tuple struct)",
        ));
    };

    let (generics_with_lt, decode_lt) = decode_lifetime(generics);
    let (impl_generics, _, where_clause) = generics_with_lt.split_for_impl();
    let (_, ty_generics, _) = generics.split_for_impl();

    let mut where_clause = where_clause.cloned().unwrap_or_else(|| syn::WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    });

    let mut inits = Vec::new();
    let mut exact_arms = Vec::new();
    let mut ci_arms = Vec::new();
    let mut finals = Vec::new();
    let mut unknown_field: Option<Ident> = None;

    for field in &fields.named {
        let attr = parse_field_attrs(&field.attrs)?;
        let ident = field.ident.as_ref().unwrap();
        let ty = &field.ty;

        if attr.skip {
            if !type_mentions_self(ty, name) {
                add_where_bound(&mut where_clause, ty, quote!(::core::default::Default));
            }
            finals.push(quote! { #ident: ::core::default::Default::default(), });
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
        let var = format_ident!("__{ident}");

        if !type_mentions_self(ty, name) {
            add_where_bound(&mut where_clause, ty, quote!(::drisl::Decode<#decode_lt>));
            add_where_bound(&mut where_clause, ty, quote!(::core::default::Default));
        }

        inits.push(quote! {
            let mut #var: ::core::option::Option<#ty> = ::core::option::Option::None;
        });
        exact_arms.push(quote! {
            #key => #var = ::core::option::Option::Some(::drisl::Decode::decode(__item)?),
        });
        ci_arms.push(quote! {
            if #var.is_none() && __key.eq_ignore_ascii_case(#key) {
                #var = ::core::option::Option::Some(::drisl::Decode::decode(__item)?);
                continue;
            }
        });
        finals.push(quote! { #ident: #var.unwrap_or_default(), });
    }

    let (unknown_init, unknown_sink, unknown_final) = match unknown_field {
        Some(ident) => {
            let var = format_ident!("__{ident}");
            (
                quote! { let mut #var = ::drisl::ValueMap::new(); },
                quote! {
                    ::drisl::ValueMap::insert(
                        &mut #var,
                        ::std::borrow::ToOwned::to_owned(__key),
                        ::drisl::Decode::decode(__item)?,
                    )?;
                },
                quote! { #ident: #var, },
            )
        }
        None => (quote! {}, quote! {}, quote! {}),
    };

    Ok(quote! {
        impl #impl_generics ::drisl::Decode<#decode_lt> for #name #ty_generics #where_clause {
            fn decode(value: ::drisl::ValueRef<#decode_lt>) -> Result<Self, ::drisl::Error> {
                let mut __map = value.map()?;
                #(#inits)*
                #unknown_init
                while let ::core::option::Option::Some((__key, __item)) = __map.next()? {
                    match __key {
                        #(#exact_arms)*
                        _ => {
                            #(#ci_arms)*
                            #unknown_sink
                        }
                    }
                }
                Ok(Self {
                    #(#finals)*
                    #unknown_final
                })
            }
        }
    })
}

pub(crate) fn decode_toarray(
    name: &Ident,
    generics: &Generics,
    data: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let (generics_with_lt, decode_lt) = decode_lifetime(generics);
    let (impl_generics, _, where_clause) = generics_with_lt.split_for_impl();
    let (_, ty_generics, _) = generics.split_for_impl();

    let mut where_clause = where_clause.cloned().unwrap_or_else(|| syn::WhereClause {
        where_token: Default::default(),
        predicates: Default::default(),
    });

    let mut binds = Vec::new();
    let mut finals = Vec::new();

    match &data.fields {
        Fields::Named(fields) => {
            for field in &fields.named {
                let attr = parse_field_attrs(&field.attrs)?;
                let ident = field.ident.as_ref().unwrap();
                let ty = &field.ty;

                if !type_mentions_self(ty, name) {
                    add_where_bound(&mut where_clause, ty, quote!(::core::default::Default));
                }
                if attr.skip {
                    finals.push(quote! { #ident: ::core::default::Default::default(), });
                    continue;
                }
                if !type_mentions_self(ty, name) {
                    add_where_bound(&mut where_clause, ty, quote!(::drisl::Decode<#decode_lt>));
                }

                let var = format_ident!("__{ident}");
                // Missing elements remain at their zero value; surplus
                // elements are discarded below.
                binds.push(quote! {
                    let #var: #ty = match __arr.next()? {
                        ::core::option::Option::Some(item) => ::drisl::Decode::decode(item)?,
                        ::core::option::Option::None => ::core::default::Default::default(),
                    };
                });
                finals.push(quote! { #ident: #var, });
            }
        }
        Fields::Unnamed(fields) => {
            let mut ctor = Vec::new();
            for (idx, field) in fields.unnamed.iter().enumerate() {
                ensure_no_cbor_attrs(&field.attrs, "tuple struct fields")?;
                let ty = &field.ty;
                if !type_mentions_self(ty, name) {
                    add_where_bound(&mut where_clause, ty, quote!(::drisl::Decode<#decode_lt>));
                    add_where_bound(&mut where_clause, ty, quote!(::core::default::Default));
                }
                let var = format_ident!("__v{idx}");
                binds.push(quote! {
                    let #var: #ty = match __arr.next()? {
                        ::core::option::Option::Some(item) => ::drisl::Decode::decode(item)?,
                        ::core::option::Option::None => ::core::default::Default::default(),
                    };
                });
                ctor.push(quote! { #var });
            }
            return Ok(quote! {
                impl #impl_generics ::drisl::Decode<#decode_lt> for #name #ty_generics #where_clause {
                    fn decode(value: ::drisl::ValueRef<#decode_lt>) -> Result<Self, ::drisl::Error> {
                        let mut __arr = value.array()?;
                        #(#binds)*
                        while __arr.next()?.is_some() {}
                        Ok(Self(#(#ctor),*))
                    }
                }
            });
        }
        Fields::Unit => {}
    }

    Ok(quote! {
        impl #impl_generics ::drisl::Decode<#decode_lt> for #name #ty_generics #where_clause {
            fn decode(value: ::drisl::ValueRef<#decode_lt>) -> Result<Self, ::drisl::Error> {
                let mut __arr = value.array()?;
                #(#binds)*
                while __arr.next()?.is_some() {}
                Ok(Self {
                    #(#finals)*
                })
            }
        }
    })
}
