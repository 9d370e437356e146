//! The scanner registry: conversions from raw values into field types.
//!
//! A scanner is a plain function that writes into a type-erased field slot
//! from the raw values of one parameter name. Scanners are looked up by the
//! field's [`TypeId`] once, when a struct is described, and bound to the
//! field. A field whose type has no scanner is left out of the descriptor.
//!
//! For every scalar type `T` the registry holds three scanners:
//!
//! - `T` reads the first raw value, ignoring the rest.
//! - `Option<T>` is the nullable form: an empty value yields
//!   `Some(T::default())`, anything else is parsed. A name that is absent
//!   leaves the field `None`.
//! - `Vec<T>` parses every raw value, preserving order.
//!
//! Map types receive alternating key/value entries built from map-shaped
//! parameter names (`name[key]`).

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
    marker::PhantomData,
    str::FromStr,
    sync::LazyLock,
};

use chrono::{DateTime, FixedOffset, Utc};
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;

use crate::{BoxError, ScanError, TextUnmarshaler};

/// A conversion from raw values into a type-erased field slot.
pub type ScanFn = fn(&mut dyn Any, &[String]) -> Result<(), ScanError>;

/// A scalar that can be parsed from a single raw value.
///
/// Implement this for your own types and call [`register`] to make them
/// decodable.
pub trait Scan: Default + 'static {
    /// Parses one raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` does not encode a valid value.
    fn scan(text: &str) -> Result<Self, BoxError>;
}

macro_rules! scan_from_str {
    ($($ty:ty)*) => {
        $(
            impl Scan for $ty {
                fn scan(text: &str) -> Result<Self, BoxError> {
                    Ok(text.parse::<$ty>()?)
                }
            }
        )*
    };
}

scan_from_str! {
    char
    i8 i16 i32 i64 i128 isize
    u8 u16 u32 u64 u128 usize
    f32 f64
}

impl Scan for String {
    fn scan(text: &str) -> Result<Self, BoxError> { Ok(text.to_owned()) }
}

impl Scan for bool {
    fn scan(text: &str) -> Result<Self, BoxError> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err("invalid boolean".into()),
        }
    }
}

impl Scan for DateTime<FixedOffset> {
    fn scan(text: &str) -> Result<Self, BoxError> {
        Ok(DateTime::parse_from_rfc3339(text)?)
    }
}

impl Scan for DateTime<Utc> {
    fn scan(text: &str) -> Result<Self, BoxError> {
        Ok(DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc))
    }
}

/// Returns the scanner bound to a field type, if any.
#[must_use]
pub fn scanner(type_id: TypeId) -> Option<ScanFn> {
    REGISTRY.scanners.read().get(&type_id).copied()
}

/// Returns `true` if the type is decoded from alternating key/value entries,
/// which only map-shaped names (`name[key]`) produce.
#[must_use]
pub fn is_map(type_id: TypeId) -> bool {
    REGISTRY.map_types.read().contains(&type_id)
}

/// Registers `T`, `Option<T>` and `Vec<T>` as decodable field types.
///
/// Structs described before the call are not affected.
pub fn register<T: Scan>() { REGISTRY.insert::<ScanParser<T>>(); }

/// Registers a [`FromStr`] type, together with its `Option` and `Vec`
/// forms, as a decodable field type.
///
/// Structs described before the call are not affected.
pub fn register_from_str<T>()
where
    T: FromStr + Default + 'static,
    T::Err: Into<BoxError>,
{
    REGISTRY.insert::<FromStrParser<T>>();
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::with_builtins);

struct Registry {
    scanners: RwLock<FxHashMap<TypeId, ScanFn>>,
    map_types: RwLock<FxHashSet<TypeId>>,
}

macro_rules! register_builtins {
    ($registry:ident; $($ty:ty),* $(,)?) => {
        $( $registry.insert::<ScanParser<$ty>>(); )*
    };
}

impl Registry {
    fn with_builtins() -> Self {
        let registry = Self {
            scanners: RwLock::new(FxHashMap::default()),
            map_types: RwLock::new(FxHashSet::default()),
        };

        register_builtins! {
            registry;
            String, char, bool,
            i8, i16, i32, i64, i128, isize,
            u8, u16, u32, u64, u128, usize,
            f32, f64,
            DateTime<Utc>, DateTime<FixedOffset>,
        }

        registry.insert_map::<HashMap<String, String>>(scan_string_map);
        registry.insert_map::<BTreeMap<String, String>>(scan_string_btree_map);
        registry.insert_map::<HashMap<String, Vec<String>>>(scan_multi_map);

        registry
    }

    fn insert<P: Parser>(&self) {
        let mut scanners = self.scanners.write();

        scanners.insert(TypeId::of::<P::Output>(), scan_scalar::<P>);
        scanners.insert(TypeId::of::<Option<P::Output>>(), scan_nullable::<P>);
        scanners.insert(TypeId::of::<Vec<P::Output>>(), scan_slice::<P>);
    }

    fn insert_map<M: 'static>(&self, scan: ScanFn) {
        self.scanners.write().insert(TypeId::of::<M>(), scan);
        self.map_types.write().insert(TypeId::of::<M>());
    }
}

/// Parses one raw value into `Output`. Lets the generic scanners serve both
/// [`Scan`] and [`FromStr`] types.
trait Parser: 'static {
    type Output: Default + 'static;

    fn parse(text: &str) -> Result<Self::Output, BoxError>;
}

struct ScanParser<T>(PhantomData<fn() -> T>);

impl<T: Scan> Parser for ScanParser<T> {
    type Output = T;

    fn parse(text: &str) -> Result<T, BoxError> { T::scan(text) }
}

struct FromStrParser<T>(PhantomData<fn() -> T>);

impl<T> Parser for FromStrParser<T>
where
    T: FromStr + Default + 'static,
    T::Err: Into<BoxError>,
{
    type Output = T;

    fn parse(text: &str) -> Result<T, BoxError> {
        text.parse().map_err(Into::into)
    }
}

fn parse<P: Parser>(text: &str) -> Result<P::Output, ScanError> {
    P::parse(text).map_err(|source| ScanError::new(text, source))
}

fn slot<T: 'static>(dst: &mut dyn Any) -> &mut T {
    dst.downcast_mut::<T>().expect("scanner bound to a field of another type")
}

fn scan_scalar<P: Parser>(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let Some(text) = values.first() else { return Ok(()) };

    *slot::<P::Output>(dst) = parse::<P>(text)?;
    Ok(())
}

fn scan_nullable<P: Parser>(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let Some(text) = values.first() else { return Ok(()) };

    let value =
        if text.is_empty() { P::Output::default() } else { parse::<P>(text)? };

    *slot::<Option<P::Output>>(dst) = Some(value);
    Ok(())
}

fn scan_slice<P: Parser>(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let parsed: Vec<P::Output> =
        values.iter().map(|text| parse::<P>(text)).collect::<Result<_, _>>()?;

    *slot::<Vec<P::Output>>(dst) = parsed;
    Ok(())
}

/// Yields `(key, value)` from alternating entries; a trailing unpaired entry
/// is ignored.
pub(crate) fn pairs(
    values: &[String],
) -> impl Iterator<Item = (&String, &String)> {
    values.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
}

fn scan_string_map(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let map = slot::<HashMap<String, String>>(dst);
    for (key, value) in pairs(values) {
        map.insert(key.clone(), value.clone());
    }
    Ok(())
}

fn scan_string_btree_map(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let map = slot::<BTreeMap<String, String>>(dst);
    for (key, value) in pairs(values) {
        map.insert(key.clone(), value.clone());
    }
    Ok(())
}

fn scan_multi_map(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let map = slot::<HashMap<String, Vec<String>>>(dst);
    for (key, value) in pairs(values) {
        map.entry(key.clone()).or_default().push(value.clone());
    }
    Ok(())
}

/// Scanner for `#[urlstruct(text)]` fields.
pub(crate) fn scan_text<T: TextUnmarshaler + 'static>(
    dst: &mut dyn Any,
    values: &[String],
) -> Result<(), ScanError> {
    let Some(text) = values.first() else { return Ok(()) };

    slot::<T>(dst)
        .unmarshal_text(text.as_bytes())
        .map_err(|source| ScanError::new(text.as_str(), source))
}
