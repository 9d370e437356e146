//! Tests for the order and failure of `Unmarshaler` hooks.

#![allow(missing_docs)]

use std::cell::RefCell;

use urlstruct::{BoxError, Error, Unmarshaler, UrlStruct, Values};
use urlstruct_integration_test::values;

thread_local! {
    static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn record(call: &'static str) { CALLS.with(|calls| calls.borrow_mut().push(call)); }

fn take_calls() -> Vec<&'static str> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

#[derive(Debug, Default, UrlStruct)]
#[urlstruct(unmarshaler)]
struct First {
    seen_limit: bool,
}

impl Unmarshaler for First {
    fn unmarshal_values(&mut self, values: &Values) -> Result<(), BoxError> {
        record("first");

        if values.contains("fail") {
            return Err("first refused".into());
        }

        // hooks see names already consumed by fields
        self.seen_limit = values.contains("limit");
        Ok(())
    }
}

#[derive(Debug, Default, UrlStruct)]
#[urlstruct(unmarshaler)]
struct Second;

impl Unmarshaler for Second {
    fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
        record("second");
        Ok(())
    }
}

#[derive(Debug, Default, UrlStruct)]
#[urlstruct(unmarshaler)]
struct Outer {
    #[urlstruct(embed)]
    first: First,
    #[urlstruct(embed)]
    second: Option<Box<Second>>,
    limit: u32,
    limit_at_hook: u32,
}

impl Unmarshaler for Outer {
    fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
        record("outer");
        self.limit_at_hook = self.limit;
        Ok(())
    }
}

#[test]
fn embedded_hooks_run_before_the_root_hook() {
    take_calls();

    let outer: Outer = urlstruct::from_values(&values([("limit", "5")])).unwrap();

    assert_eq!(take_calls(), ["first", "second", "outer"]);
    assert!(outer.first.seen_limit);
    assert_eq!(outer.limit_at_hook, 5);
}

#[test]
fn hooks_run_on_empty_input() {
    take_calls();

    let outer: Outer = urlstruct::from_values(&Values::new()).unwrap();

    assert_eq!(take_calls(), ["first", "second", "outer"]);
    // unset embedded hook records are allocated to be invoked
    assert!(outer.second.is_some());
}

#[test]
fn hook_error_stops_later_hooks() {
    take_calls();

    let error =
        urlstruct::from_values::<Outer>(&values([("fail", "")])).unwrap_err();

    assert_eq!(take_calls(), ["first"]);
    assert!(matches!(error, Error::Unmarshal(_)));
    assert_eq!(error.to_string(), "first refused");
    assert_eq!(error.field(), None);
}

#[test]
fn hook_error_is_reported_once_in_its_chain() {
    take_calls();

    let error =
        urlstruct::from_values::<Outer>(&values([("fail", "")])).unwrap_err();

    let mut chain = vec![error.to_string()];
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }

    assert_eq!(chain, ["first refused"]);
}

#[test]
fn field_error_stops_before_hooks() {
    take_calls();

    let error =
        urlstruct::from_values::<Outer>(&values([("limit", "-1")])).unwrap_err();

    assert!(take_calls().is_empty());
    assert_eq!(error.field(), Some("limit"));
}

#[derive(Debug, Default, UrlStruct)]
#[urlstruct(unmarshaler)]
struct Rejecting {
    name: String,
}

impl Unmarshaler for Rejecting {
    fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
        if self.name.is_empty() {
            return Err("name is required".into());
        }
        Ok(())
    }
}

#[test]
fn root_hook_error_is_returned() {
    let error = urlstruct::from_values::<Rejecting>(&Values::new()).unwrap_err();
    assert_eq!(error.to_string(), "name is required");

    let ok: Rejecting =
        urlstruct::from_values(&values([("name", "x")])).unwrap();
    assert_eq!(ok.name, "x");
}
