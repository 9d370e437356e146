//! Conversion of declared field identifiers into canonical wire names.

use heck::ToSnakeCase;

/// Converts a declared field identifier into its canonical wire name.
///
/// Raw identifiers lose their `r#` prefix. Identifiers are folded to
/// `snake_case`, so `FieldLT` and `field_lt` both become `field_lt`.
#[must_use]
pub fn snake_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    ident.to_snake_case()
}
