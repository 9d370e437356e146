//! Shared record types for the `urlstruct` integration tests.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::{collections::HashMap, sync::Once};

use chrono::{DateTime, Utc};
use urlstruct::{
    BoxError, TextUnmarshaler, UnknownValues, Unmarshaler, UrlStruct, Values,
};
use uuid::Uuid;

/// Registers the scalar types the fixtures use beyond the built-ins.
///
/// Must run before the first decode of [`Filter`].
pub fn register_types() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(urlstruct::register_from_str::<Uuid>);
}

// ============================================================================
// Hooks
// ============================================================================

/// A value decoded through its own text hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomField {
    pub s: String,
}

impl TextUnmarshaler for CustomField {
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        self.s = std::str::from_utf8(text)?.to_owned();
        Ok(())
    }
}

/// Counts how many times its hook ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, UrlStruct)]
#[urlstruct(unmarshaler)]
pub struct SubFilter {
    pub count: i32,
}

impl Unmarshaler for SubFilter {
    fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
        self.count += 1;
        Ok(())
    }
}

/// A nested record with a catch-all field.
#[derive(Debug, Clone, Default, PartialEq, Eq, UrlStruct)]
pub struct StructMap {
    pub foo: String,
    pub bar: String,
    #[urlstruct(",unknown")]
    pub unknown_map: UnknownValues,
}

// ============================================================================
// Filter
// ============================================================================

/// A filter exercising every decoding path.
#[derive(Debug, Clone, Default, PartialEq, UrlStruct)]
#[urlstruct(unmarshaler)]
pub struct Filter {
    #[urlstruct(embed)]
    pub sub_filter: SubFilter,
    #[urlstruct(nested)]
    pub sub: SubFilter,
    #[urlstruct(nested)]
    pub s_map: StructMap,
    pub count: i32,

    pub field: String,
    pub field_neq: String,
    pub field_lt: i8,
    pub field_lte: i16,
    pub field_gt: i32,
    pub field_gte: i64,

    pub multi: Vec<String>,
    pub multi_neq: Vec<i32>,

    pub time: DateTime<Utc>,
    pub start_time_gte: DateTime<Utc>,

    pub null_bool: Option<bool>,
    pub null_int64: Option<i64>,
    pub null_float64: Option<f64>,
    pub null_string: Option<String>,

    pub map: HashMap<String, String>,
    #[urlstruct(text)]
    pub custom: CustomField,

    #[urlstruct("-")]
    pub omit: Vec<u8>,

    pub uuid: Vec<Uuid>,
}

impl Unmarshaler for Filter {
    fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
        self.count += 1;
        Ok(())
    }
}

/// A record carrying only a name.
#[derive(Debug, Default, UrlStruct)]
pub struct MyStruct {
    #[urlstruct("myname")]
    pub table_name: (),
}

/// Builds [`Values`] from literal pairs.
pub fn values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Values {
    pairs.into_iter().collect()
}
