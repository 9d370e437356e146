use std::collections::HashMap;

use crate::{
    BoxError, Configuration, StructInfo, Unmarshaler, UnknownValues, UrlStruct,
    Values,
};

struct Opaque;

#[derive(Default, UrlStruct)]
struct Base {
    table_name: (),

    id: i64,
    #[urlstruct("-")]
    secret: String,
}

#[derive(Default, UrlStruct)]
struct Pager {
    limit: u32,
    offset: u32,
}

#[derive(Default, UrlStruct)]
#[urlstruct(unmarshaler)]
struct Touched {
    touched: bool,
}

impl Unmarshaler for Touched {
    fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
        self.touched = true;
        Ok(())
    }
}

#[derive(UrlStruct)]
#[allow(non_snake_case)]
struct Filter {
    table_name: (),

    #[urlstruct(embed)]
    base: Base,
    #[urlstruct(embed)]
    pager: Option<Box<Pager>>,
    #[urlstruct(embed)]
    touched: Touched,

    #[urlstruct("q")]
    query: String,
    createdAtLT: Option<i64>,
    opaque: Opaque,
    #[urlstruct("raw,nodecode")]
    raw: String,
    #[urlstruct(",unknown")]
    rest: UnknownValues,
}

#[test]
fn canonical_names() {
    let info = StructInfo::<Filter>::new();
    let names: Vec<_> = info.fields().iter().map(|f| f.name()).collect();

    assert_eq!(names, [
        "id",
        "limit",
        "offset",
        "q",
        "created_at_lt",
        "raw",
        "rest"
    ]);
}

#[test]
fn excluded_and_unscannable_fields_are_left_out() {
    let info = StructInfo::<Filter>::new();

    assert!(info.field("secret").is_none());
    assert!(info.field("opaque").is_none());
    assert!(info.field("query").is_none());
}

#[test]
fn embedded_fields_carry_their_index_path() {
    let info = StructInfo::<Filter>::new();

    assert_eq!(info.field("id").unwrap().index(), [1, 1]);
    assert_eq!(info.field("offset").unwrap().index(), [2, 1]);
    assert_eq!(info.field("q").unwrap().index(), [4]);
    assert_eq!(info.field("q").unwrap().ident(), "query");
}

#[test]
fn unmarshaler_embeds_become_hooks() {
    let info = StructInfo::<Filter>::new();

    assert!(info.field("touched").is_none());
    assert_eq!(info.unmarshaler_indexes().collect::<Vec<_>>(), [&[3][..]]);
    assert!(!info.is_unmarshaler());
    assert!(StructInfo::<Touched>::new().is_unmarshaler());
}

#[test]
fn unknown_and_nodecode() {
    let info = StructInfo::<Filter>::new();

    assert_eq!(info.unknown_field_index(), Some(&[8][..]));
    assert!(info.field("rest").is_some());
    assert!(info.field("raw").unwrap().no_decode());
    assert!(!info.field("q").unwrap().no_decode());
}

#[test]
fn table_name_of_embedded_record() {
    assert_eq!(StructInfo::<Filter>::new().table_name(), None);

    #[derive(UrlStruct)]
    struct Named {
        #[urlstruct("'named'")]
        table_name: (),
        #[urlstruct(embed)]
        inner: Inner,
    }

    #[derive(UrlStruct)]
    struct Inner {
        #[urlstruct("inner")]
        table_name: (),
    }

    #[derive(UrlStruct)]
    struct Outer {
        #[urlstruct(embed)]
        inner: Inner,
    }

    assert_eq!(StructInfo::<Named>::new().table_name(), Some("named"));
    assert_eq!(StructInfo::<Outer>::new().table_name(), Some("inner"));
}

#[test]
fn later_field_shadows_earlier_one() {
    #[derive(UrlStruct)]
    struct Shadowed {
        #[urlstruct(embed)]
        pager: Pager,
        #[urlstruct("limit")]
        max: u64,
    }

    let info = StructInfo::<Shadowed>::new();

    assert_eq!(info.fields().len(), 3);
    assert_eq!(info.field("limit").unwrap().ident(), "max");
}

#[test]
fn operator_lookup() {
    let info = StructInfo::<Filter>::new();
    let configuration = Configuration::default();

    let field = info.lookup("created_at__lt", &configuration).unwrap();
    assert_eq!(field.name(), "created_at_lt");

    assert!(info.lookup("created_at__foo", &configuration).is_none());
    assert!(info.lookup("__lt", &configuration).is_none());

    let custom = Configuration::builder()
        .operator_separator("..")
        .operators(&["lt"])
        .build();
    assert!(info.lookup("created_at..lt", &custom).is_some());
    assert!(info.lookup("created_at__lt", &custom).is_none());

    let disabled = Configuration::builder().operator_separator("").build();
    assert!(info.lookup("created_at__lt", &disabled).is_none());
}

#[test]
#[should_panic(expected = "tagged `unknown`")]
fn unknown_field_must_be_multi_map() {
    #[derive(UrlStruct)]
    struct Misdeclared {
        #[urlstruct(",unknown")]
        rest: HashMap<String, String>,
    }

    let _ = StructInfo::<Misdeclared>::new();
}

#[test]
fn map_and_nested_fields_are_map_only() {
    #[derive(UrlStruct)]
    struct Shaped {
        plain: String,
        labels: HashMap<String, String>,
        #[urlstruct(nested)]
        pager: Pager,
        #[urlstruct(",unknown")]
        rest: UnknownValues,
    }

    let info = StructInfo::<Shaped>::new();

    assert!(!info.field("plain").unwrap().map_only());
    assert!(info.field("labels").unwrap().map_only());
    assert!(info.field("pager").unwrap().map_only());
    assert!(info.field("rest").unwrap().map_only());
}
