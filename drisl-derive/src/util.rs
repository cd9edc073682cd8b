use syn::{Type, WhereClause};

pub(crate) fn add_where_bound(
    wc: &mut WhereClause,
    ty: &Type,
    bound: proc_macro2::TokenStream,
) {
    wc.predicates.push(syn::parse_quote!(#ty: #bound));
}
