//! # urlstruct - URL query values into typed structs
//!
//! `urlstruct` decodes a multi-valued parameter mapping, as produced by
//! parsing an HTTP query string, into a statically typed record. A record
//! type is declared once with `#[derive(UrlStruct)]`; decoding then needs no
//! per-endpoint glue.
//!
//! ```ignore
//! use urlstruct::{UrlStruct, Values};
//!
//! #[derive(Debug, Default, UrlStruct)]
//! struct BookFilter {
//!     title: String,
//!     author_id: Vec<i64>,
//!     price_lt: Option<f64>,
//! }
//!
//! let values = Values::parse("title=Dune&author_id[]=1&author_id[]=2&price__lt=9.5");
//! let filter: BookFilter = urlstruct::from_values(&values)?;
//!
//! assert_eq!(filter.author_id, [1, 2]);
//! assert_eq!(filter.price_lt, Some(9.5));
//! ```
//!
//! ## Naming
//!
//! A field is named by its tag, `#[urlstruct("name")]`, or by its
//! identifier folded to `snake_case`. At decode time a parameter name is
//! matched after stripping a leading `:` and a trailing `[]`. A name like
//! `price__lt` falls back to the field `price_lt` when `lt` is one of the
//! configured operators.
//!
//! Map-shaped names, `attrs[color]=red`, are gathered per base name and
//! decoded together into map fields or `nested` records.
//!
//! ## Descriptors
//!
//! The first decode of a type walks its fields into a [`StructInfo`] that is
//! cached in a [`StructInfoMap`] and shared by every later decode, from any
//! thread. [`describe_struct`] exposes the cached descriptor.
//!
//! ## Hooks
//!
//! Types implementing [`Unmarshaler`] see the full mapping after field
//! decoding: embedded ones first, in declaration order, the decoded record
//! itself last. Types implementing [`TextUnmarshaler`] decode single
//! values. Other scalar types are added with [`register`] or
//! [`register_from_str`].

extern crate self as urlstruct;

pub mod casing;
pub mod config;
pub mod error;
pub mod field;
pub mod hook;
pub mod scan;
pub mod struct_info;
pub mod struct_info_map;
pub mod tag;
pub mod values;

mod decoder;

use std::sync::Arc;

pub use config::Configuration;
pub use error::{BoxError, Error, ScanError};
pub use field::Field;
pub use hook::{TextUnmarshaler, Unmarshaler};
pub use scan::{Scan, register, register_from_str};
pub use struct_info::{Embed, Scope, StructInfo, UnknownValues, UrlStruct};
pub use struct_info_map::StructInfoMap;
pub use tag::Tag;
pub use urlstruct_derive::UrlStruct;
pub use values::Values;

/// Returns the cached descriptor of `T` from the global
/// [`StructInfoMap`], building it on first use.
///
/// # Panics
///
/// Panics if `T` has a field tagged `unknown` whose type is not
/// [`UnknownValues`].
pub fn describe_struct<T: UrlStruct>() -> Arc<StructInfo<T>> {
    StructInfoMap::global().describe::<T>()
}

/// Decodes `values` into `strct` using the global [`StructInfoMap`].
///
/// Fields whose names are absent keep their current value.
///
/// # Errors
///
/// Returns the first conversion error, or the first error returned by an
/// [`Unmarshaler`]. The record may then be partially decoded.
pub fn decode<T: UrlStruct>(strct: &mut T, values: &Values) -> Result<(), Error> {
    StructInfoMap::global().decode(strct, values)
}

/// Decodes `values` into a new `T::default()`.
///
/// # Errors
///
/// See [`decode`].
pub fn from_values<T: UrlStruct + Default>(values: &Values) -> Result<T, Error> {
    let mut strct = T::default();
    decode(&mut strct, values)?;
    Ok(strct)
}
