use syn::{GenericArgument, Ident, PathArguments, Type};

/// Returns true when `ty` mentions the deriving type itself, in which case a
/// trait bound on it would be cyclic.
pub(crate) fn type_mentions_self(ty: &Type, this: &Ident) -> bool {
    match ty {
        Type::Path(p) => {
            if p.qself.is_some() {
                return true;
            }
            p.path.segments.iter().any(|seg| {
                if seg.ident == *this || seg.ident == "Self" {
                    return true;
                }
                match &seg.arguments {
                    PathArguments::AngleBracketed(args) => args.args.iter().any(|a| match a {
                        GenericArgument::Type(t) => type_mentions_self(t, this),
                        _ => false,
                    }),
                    PathArguments::Parenthesized(args) => {
                        args.inputs.iter().any(|t| type_mentions_self(t, this))
                    }
                    PathArguments::None => false,
                }
            })
        }
        Type::Reference(r) => type_mentions_self(&r.elem, this),
        Type::Slice(s) => type_mentions_self(&s.elem, this),
        Type::Array(a) => type_mentions_self(&a.elem, this),
        Type::Tuple(t) => t.elems.iter().any(|e| type_mentions_self(e, this)),
        Type::Paren(p) => type_mentions_self(&p.elem, this),
        Type::Group(g) => type_mentions_self(&g.elem, this),
        _ => false,
    }
}
