use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, LitStr};

#[derive(Default, Clone)]
pub(crate) struct FieldAttr {
    pub(crate) rename: Option<LitStr>,
    pub(crate) omitempty: bool,
    pub(crate) omitzero: bool,
    pub(crate) skip: bool,
    pub(crate) unknown: bool,
}

#[derive(Default, Clone, Copy)]
pub(crate) struct ContainerAttr {
    pub(crate) toarray: bool,
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("cbor") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            for (name, flag) in [
                ("omitempty", &mut out.omitempty),
                ("omitzero", &mut out.omitzero),
                ("skip", &mut out.skip),
                ("unknown", &mut out.unknown),
            ] {
                if meta.path.is_ident(name) {
                    if *flag {
                        return Err(meta.error(format!("duplicate `cbor({name})`")));
                    }
                    *flag = true;
                    return Ok(());
                }
            }
            if meta.path.is_ident("rename") {
                if out.rename.is_some() {
                    return Err(meta.error("duplicate `cbor(rename=...)`"));
                }
                let lit: LitStr = meta.value()?.parse()?;
                out.rename = Some(lit);
                return Ok(());
            }
            if meta.path.is_ident("toarray") {
                return Err(meta.error("`cbor(toarray)` is a container attribute"));
            }
            Err(meta.error(
                "unsupported `cbor(...)` field attribute \
                 (allowed: rename, omitempty, omitzero, skip, unknown)",
            ))
        })?;
    }

    if out.skip && (out.rename.is_some() || out.omitempty || out.omitzero || out.unknown) {
        return Err(syn::Error::new(
            Span::call_site(),
            "`cbor(skip)` cannot be combined with other directives",
        ));
    }
    if out.unknown && (out.rename.is_some() || out.omitzero) {
        return Err(syn::Error::new(
            Span::call_site(),
            "`cbor(unknown)` cannot be combined with `rename` or `omitzero`",
        ));
    }
    if out.omitempty && out.omitzero {
        return Err(syn::Error::new(
            Span::call_site(),
            "`cbor(omitempty)` and `cbor(omitzero)` are mutually exclusive",
        ));
    }

    Ok(out)
}

pub(crate) fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttr> {
    let mut out = ContainerAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("cbor") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("toarray") {
                if out.toarray {
                    return Err(meta.error("duplicate `cbor(toarray)`"));
                }
                out.toarray = true;
                return Ok(());
            }
            Err(meta.error("unsupported `cbor(...)` container attribute (allowed: toarray)"))
        })?;
    }
    Ok(out)
}

pub(crate) fn ensure_no_cbor_attrs(attrs: &[Attribute], ctx: &str) -> syn::Result<()> {
    for a in attrs {
        if a.path().is_ident("cbor") {
            return Err(syn::Error::new(
                a.span(),
                format!("`#[cbor(...)]` is not supported on {ctx}"),
            ));
        }
    }
    Ok(())
}
