//! Derive macro for the `urlstruct::UrlStruct` trait.
//!
//! The derive emits a `describe` function that visits every declared field
//! of a struct, in declaration order, so that the runtime can build the
//! struct's descriptor once and decode into it afterwards.
//!
//! # Usage
//!
//! ```ignore
//! use urlstruct::UrlStruct;
//!
//! #[derive(Default, UrlStruct)]
//! struct Filter {
//!     table_name: (),
//!
//!     #[urlstruct("q")]
//!     query: String,
//!     ids: Vec<i64>,
//!     created_at_gte: Option<chrono::DateTime<chrono::Utc>>,
//!
//!     #[urlstruct(embed)]
//!     pager: Pager,
//!
//!     #[urlstruct(",unknown")]
//!     rest: std::collections::HashMap<String, Vec<String>>,
//! }
//! ```
//!
//! # Struct Attributes
//!
//! - `#[urlstruct(unmarshaler)]`: the type implements
//!   `urlstruct::Unmarshaler`, invoked after its fields are decoded.
//! - `#[urlstruct_crate(path)]`: the path of the `urlstruct` crate, for
//!   crates that re-export it. Defaults to `::urlstruct`.
//!
//! # Field Attributes
//!
//! All field options go in one `#[urlstruct(...)]` attribute:
//!
//! - a string literal: the declaration tag, `"name,opt1,opt2"`.
//! - `embed`: the field is an embedded record whose fields are flattened
//!   into this one.
//! - `nested`: the field is a named record decoded from `name[field]`.
//! - `text`: the field type implements `urlstruct::TextUnmarshaler`.
//!
//! A field named `table_name` is not decoded; its tag names the record.
//!
//! # Restrictions
//!
//! - Only structs with named fields and unit structs are supported.
//! - Lifetime and const parameters are not allowed; type parameters are
//!   bound by `'static`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, LitStr, Token,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

/// The identifier of the record-name sentinel field.
const TABLE_NAME: &str = "table_name";

/// Derives `urlstruct::UrlStruct` and `urlstruct::Embed` for a struct.
#[proc_macro_derive(UrlStruct, attributes(urlstruct, urlstruct_crate))]
pub fn derive_url_struct(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    implements_url_struct(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Scalar,
    Embed,
    Nested,
    Text,
}

enum FieldOption {
    Tag(LitStr),
    Kind(syn::Ident, FieldKind),
}

impl Parse for FieldOption {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            return input.parse().map(Self::Tag);
        }

        let ident: syn::Ident = input.parse()?;
        let kind = match ident.to_string().as_str() {
            "embed" => FieldKind::Embed,
            "nested" => FieldKind::Nested,
            "text" => FieldKind::Text,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "unknown urlstruct field option, expected a tag string, \
                     `embed`, `nested` or `text`",
                ));
            }
        };

        Ok(Self::Kind(ident, kind))
    }
}

struct FieldAttributes {
    tag: String,
    kind: FieldKind,
}

fn parse_field_attributes(field: &syn::Field) -> syn::Result<FieldAttributes> {
    let mut tag: Option<LitStr> = None;
    let mut kind: Option<(syn::Ident, FieldKind)> = None;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("urlstruct"))
    {
        let options = attr.parse_args_with(
            Punctuated::<FieldOption, Token![,]>::parse_terminated,
        )?;

        for option in options {
            match option {
                FieldOption::Tag(lit) => {
                    if tag.is_some() {
                        return Err(syn::Error::new_spanned(
                            lit,
                            "duplicate urlstruct tag",
                        ));
                    }
                    tag = Some(lit);
                }
                FieldOption::Kind(ident, new) => {
                    if let Some((previous, _)) = &kind {
                        return Err(syn::Error::new_spanned(
                            &ident,
                            format!("`{ident}` conflicts with `{previous}`"),
                        ));
                    }
                    kind = Some((ident, new));
                }
            }
        }
    }

    Ok(FieldAttributes {
        tag: tag.map(|lit| lit.value()).unwrap_or_default(),
        kind: kind.map_or(FieldKind::Scalar, |(_, kind)| kind),
    })
}

fn is_unmarshaler(input: &DeriveInput) -> syn::Result<bool> {
    let mut unmarshaler = false;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("urlstruct"))
    {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("unmarshaler") {
                unmarshaler = true;
                Ok(())
            } else {
                Err(meta.error("unknown urlstruct attribute"))
            }
        })?;
    }

    Ok(unmarshaler)
}

fn crate_path(input: &DeriveInput) -> syn::Result<syn::Path> {
    match input.attrs.iter().find(|attr| attr.path().is_ident("urlstruct_crate"))
    {
        Some(attr) => attr.parse_args::<syn::Path>(),
        None => Ok(syn::parse_quote!(::urlstruct)),
    }
}

#[allow(clippy::too_many_lines)]
fn implements_url_struct(
    input: &DeriveInput,
) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                fields.named.iter().collect::<Vec<_>>()
            }
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "UrlStruct cannot be derived for tuple structs, fields \
                     must be named",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "UrlStruct can only be derived for structs",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "UrlStruct can only be derived for structs",
            ));
        }
    };

    let mut generics = input.generics.clone();
    if let Some(lt_param) = generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lt_param,
            "lifetime parameters are not allowed in url structs",
        ));
    }
    if let Some(const_param) = generics.const_params().next() {
        return Err(syn::Error::new_spanned(
            const_param,
            "constant parameters are not allowed in url structs",
        ));
    }
    for ty_param in generics.type_params_mut() {
        ty_param.bounds.push(syn::parse_quote!('static));
    }

    let krate = crate_path(input)?;
    let unmarshaler = is_unmarshaler(input)?;

    let mut visits = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        let attributes = parse_field_attributes(field)?;
        let Some(ident) = &field.ident else { continue };
        let ty = &field.ty;
        let tag = &attributes.tag;

        // the runtime skips excluded fields too, skipping here spares the
        // kind-specific trait bounds
        if tag == "-" {
            continue;
        }

        let ident_name = ident.to_string();
        let ident_name = ident_name.strip_prefix("r#").unwrap_or(&ident_name);

        if ident_name == TABLE_NAME && attributes.kind == FieldKind::Scalar {
            visits.push(quote! { scope.table_name(#tag); });
            continue;
        }

        let method = match attributes.kind {
            FieldKind::Scalar => quote!(field),
            FieldKind::Embed => quote!(embed),
            FieldKind::Nested => quote!(nested),
            FieldKind::Text => quote!(text),
        };

        visits.push(quote! {
            scope.#method::<#ty>(
                #ident_name,
                #tag,
                #index,
                |this| &mut this.#ident,
            );
        });
    }

    let unmarshaler_items = unmarshaler.then(|| {
        quote! {
            const IS_UNMARSHALER: bool = true;

            fn as_unmarshaler(
                &mut self,
            ) -> ::std::option::Option<&mut dyn #krate::Unmarshaler> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics #krate::UrlStruct for #name #ty_generics
            #where_clause
        {
            #unmarshaler_items

            #[allow(unused_variables)]
            fn describe<__R: 'static>(
                scope: &mut #krate::Scope<'_, __R, Self>,
            ) {
                #(#visits)*
            }
        }

        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics #krate::Embed for #name #ty_generics
            #where_clause
        {
            type Target = Self;

            fn embedded_mut(&mut self) -> &mut Self { self }
        }
    })
}
