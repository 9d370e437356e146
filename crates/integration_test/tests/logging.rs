//! Tests for the diagnostics emitted while describing and decoding.

#![allow(missing_docs)]

use tracing_test::traced_test;
use urlstruct::UrlStruct;
use urlstruct_integration_test::values;

struct Opaque;

#[derive(Default, UrlStruct)]
struct Logged {
    name: String,
    opaque: Option<Opaque>,
}

#[test]
#[traced_test]
fn describe_and_drop_are_traced() {
    let logged: Logged =
        urlstruct::from_values(&values([("name", "x"), ("other", "y")]))
            .unwrap();

    assert_eq!(logged.name, "x");
    assert!(logs_contain("described struct"));
    assert!(logs_contain("no scanner for field type"));
    assert!(logs_contain("dropped parameter matching no field"));
}
