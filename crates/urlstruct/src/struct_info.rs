//! Describing record types: the [`UrlStruct`] trait, the [`Scope`] that
//! derived implementations populate, and the resulting [`StructInfo`].
//!
//! Describing a type walks its declared fields depth-first:
//!
//! 1. The `table_name` sentinel field sets [`StructInfo::table_name`].
//! 2. An embedded record (`#[urlstruct(embed)]`) that implements
//!    [`Unmarshaler`] is recorded as a hook; any other embedded record has
//!    its fields flattened into the parent, without a prefix.
//! 3. A field tagged `"-"` is skipped.
//! 4. Every other field is named by its tag or by its snake-cased
//!    identifier and bound to a scanner. A field whose type has no scanner
//!    is left out, as if tagged `"-"`.
//!
//! The result is immutable and cached per type by
//! [`StructInfoMap`](crate::StructInfoMap).

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use fxhash::FxHashMap;

use crate::{
    Configuration, Error, TextUnmarshaler, Unmarshaler,
    casing::snake_case,
    decoder::StructDecoder,
    field::{Access, DecodeFn, Field, FieldPath, access, decode_fn},
    scan::{self, pairs},
    tag::{self, Tag},
};

/// The catch-all sink type of a field tagged `unknown`.
pub type UnknownValues = HashMap<String, Vec<String>>;

/// A record type that can be decoded from [`Values`](crate::Values).
///
/// Implement it with `#[derive(UrlStruct)]`; the derive emits a
/// [`describe`](Self::describe) that visits every declared field.
pub trait UrlStruct: Sized + 'static {
    /// Whether the type implements [`Unmarshaler`] and wants it invoked.
    const IS_UNMARSHALER: bool = false;

    /// Visits the declared fields of `Self`, registering them into `scope`.
    fn describe<R: 'static>(scope: &mut Scope<'_, R, Self>);

    /// Returns `self` as an [`Unmarshaler`] when
    /// [`IS_UNMARSHALER`](Self::IS_UNMARSHALER) is set.
    fn as_unmarshaler(&mut self) -> Option<&mut dyn Unmarshaler> { None }
}

/// A field type that holds an embedded record, possibly behind an owning
/// pointer.
///
/// `Option` wrappers are filled with `Default::default()` the first time the
/// embedded record is reached, so that its fields and hooks can be written.
pub trait Embed: 'static {
    /// The embedded record.
    type Target: UrlStruct;

    /// Returns the embedded record, allocating it if it is unset.
    fn embedded_mut(&mut self) -> &mut Self::Target;
}

impl<T: UrlStruct> Embed for Box<T> {
    type Target = T;

    fn embedded_mut(&mut self) -> &mut T { self }
}

impl<E: Embed + Default> Embed for Option<E> {
    type Target = E::Target;

    fn embedded_mut(&mut self) -> &mut E::Target {
        self.get_or_insert_with(E::default).embedded_mut()
    }
}

type UnmarshalerFn<R> = Arc<
    dyn for<'a> Fn(&'a mut R) -> Option<&'a mut dyn Unmarshaler> + Send + Sync,
>;

fn unmarshaler_fn<R, F>(f: F) -> UnmarshalerFn<R>
where
    F: for<'a> Fn(&'a mut R) -> Option<&'a mut dyn Unmarshaler>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// A nested record whose [`Unmarshaler`] runs after field decoding.
pub(crate) struct Hook<R> {
    index: Box<[usize]>,
    unmarshaler: UnmarshalerFn<R>,
}

impl<R> Hook<R> {
    pub(crate) fn get<'a>(
        &self,
        strct: &'a mut R,
    ) -> Option<&'a mut dyn Unmarshaler> {
        (self.unmarshaler)(strct)
    }
}

/// The field collecting parameter names that match no other field.
pub(crate) struct UnknownField<R> {
    index: Box<[usize]>,
    access: Access<R, UnknownValues>,
}

impl<R> UnknownField<R> {
    pub(crate) fn get<'a>(&self, strct: &'a mut R) -> &'a mut UnknownValues {
        (self.access)(strct)
    }
}

struct Builder<R> {
    table_name: Option<String>,
    fields: Vec<Field<R>>,
    hooks: Vec<Hook<R>>,
    unknown: Option<UnknownField<R>>,
}

impl<R: 'static> Builder<R> {
    fn push_hook<T: UrlStruct>(&mut self, path: &FieldPath<R, T>) {
        let target = path.access.clone();
        self.hooks.push(Hook {
            index: path.index.clone().into_boxed_slice(),
            unmarshaler: unmarshaler_fn(move |strct: &mut R| {
                target(strct).as_unmarshaler()
            }),
        });
    }

    fn set_unknown<T: 'static>(
        &mut self,
        ident: &'static str,
        path: &FieldPath<R, T>,
    ) {
        assert!(
            TypeId::of::<T>() == TypeId::of::<UnknownValues>(),
            "urlstruct: field `{ident}` is tagged `unknown` and must be \
             HashMap<String, Vec<String>>, got {}",
            std::any::type_name::<T>(),
        );

        let target = path.access.clone();
        self.unknown = Some(UnknownField {
            index: path.index.clone().into_boxed_slice(),
            access: access(move |strct: &mut R| {
                let slot: &mut dyn Any = target(strct);
                slot.downcast_mut::<UnknownValues>()
                    .expect("unknown field type checked when described")
            }),
        });
    }
}

/// The view of one record, at some depth inside the root record `R`, that
/// a [`UrlStruct::describe`] implementation registers its fields into.
///
/// `S` is the record being described. Its fields are reached from the root
/// through the accessor path accumulated while descending into embedded
/// records.
pub struct Scope<'b, R, S> {
    builder: &'b mut Builder<R>,
    path: FieldPath<R, S>,
}

impl<R: 'static, S: 'static> Scope<'_, R, S> {
    /// Registers the `table_name` sentinel; its tag names the record.
    ///
    /// The root record's sentinel takes precedence over those of embedded
    /// records.
    pub fn table_name(&mut self, tag: &'static str) {
        let tag = Tag::parse(tag);
        if tag.name().is_empty() || tag.is_excluded() {
            return;
        }

        if self.path.index.is_empty() || self.builder.table_name.is_none() {
            self.builder.table_name = Some(tag.name().to_owned());
        }
    }

    /// Registers a field decoded by the scanner registered for `T`.
    ///
    /// The field is silently left out when no scanner exists for `T`.
    ///
    /// # Panics
    ///
    /// Panics if the field is tagged `unknown` and `T` is not
    /// [`UnknownValues`].
    pub fn field<T: 'static>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        index: usize,
        project: fn(&mut S) -> &mut T,
    ) {
        let tag = Tag::parse(tag);
        if tag.is_excluded() {
            return;
        }

        let path = self.path.join(index, project);
        if tag.has_option(tag::UNKNOWN) {
            self.builder.set_unknown(ident, &path);
        }

        let Some(scan) = scan::scanner(TypeId::of::<T>()) else {
            tracing::trace!(
                field = ident,
                ty = std::any::type_name::<T>(),
                "no scanner for field type, field is not decodable"
            );
            return;
        };

        let map_only = scan::is_map(TypeId::of::<T>());
        self.bind_scanner(ident, tag, path, scan, map_only);
    }

    /// Registers a field decoded by its own [`TextUnmarshaler`].
    pub fn text<T: TextUnmarshaler + 'static>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        index: usize,
        project: fn(&mut S) -> &mut T,
    ) {
        let tag = Tag::parse(tag);
        if tag.is_excluded() {
            return;
        }

        let path = self.path.join(index, project);
        self.bind_scanner(ident, tag, path, scan::scan_text::<T>, false);
    }

    /// Registers a named record field decoded from map-shaped names:
    /// `name[key]=value` decodes `value` into the field `key` of the nested
    /// record. A plain `name` does not reach it.
    ///
    /// A nested record implementing [`Unmarshaler`] is also invoked as a
    /// hook.
    pub fn nested<E: Embed>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        index: usize,
        project: fn(&mut S) -> &mut E,
    ) {
        let tag = Tag::parse(tag);
        if tag.is_excluded() {
            return;
        }

        let path = self.path.join(index, project).embedded();
        if <E::Target as UrlStruct>::IS_UNMARSHALER {
            self.builder.push_hook(&path);
        }

        let name = canonical_name(&tag, ident);
        let outer = name.clone();
        let target = path.access.clone();
        let decode = decode_fn(move |strct: &mut R, values, map| {
            let info = map.describe::<E::Target>();
            let mut decoder = StructDecoder::new(target(strct), &info, map);

            for (key, value) in pairs(values) {
                decoder
                    .decode_field(key, std::slice::from_ref(value))
                    .map_err(|err| err.nested_in(&outer))?;
            }

            Ok(())
        });

        self.push::<E>(name, ident, path.index, tag, true, decode);
    }

    /// Registers an embedded record.
    ///
    /// Its fields are flattened into the current record, unless it
    /// implements [`Unmarshaler`], in which case it is recorded as a hook
    /// instead.
    pub fn embed<E: Embed>(
        &mut self,
        _ident: &'static str,
        tag: &'static str,
        index: usize,
        project: fn(&mut S) -> &mut E,
    ) {
        if Tag::parse(tag).is_excluded() {
            return;
        }

        let path = self.path.join(index, project).embedded();
        if <E::Target as UrlStruct>::IS_UNMARSHALER {
            self.builder.push_hook(&path);
            return;
        }

        let mut scope = Scope { builder: &mut *self.builder, path };
        <E::Target as UrlStruct>::describe(&mut scope);
    }

    fn bind_scanner<T: 'static>(
        &mut self,
        ident: &'static str,
        tag: Tag,
        path: FieldPath<R, T>,
        scan: scan::ScanFn,
        map_only: bool,
    ) {
        let name = canonical_name(&tag, ident);
        let field = name.clone();
        let target = path.access.clone();
        let decode = decode_fn(move |strct: &mut R, values, _| {
            let slot: &mut dyn Any = target(strct);
            scan(slot, values).map_err(|err| Error::scan(&field, err))
        });

        self.push::<T>(name, ident, path.index, tag, map_only, decode);
    }

    fn push<T: 'static>(
        &mut self,
        name: String,
        ident: &'static str,
        index: Vec<usize>,
        tag: Tag,
        map_only: bool,
        decode: DecodeFn<R>,
    ) {
        self.builder
            .fields
            .push(Field::new::<T>(name, ident, index, tag, map_only, decode));
    }
}

fn canonical_name(tag: &Tag, ident: &'static str) -> String {
    if tag.name().is_empty() {
        snake_case(ident)
    } else {
        tag.name().to_owned()
    }
}

/// The decodable description of the record type `R`.
pub struct StructInfo<R> {
    table_name: Option<String>,
    fields: Vec<Field<R>>,
    field_map: FxHashMap<String, usize>,
    hooks: Vec<Hook<R>>,
    unknown: Option<UnknownField<R>>,
    is_unmarshaler: bool,
}

impl<R: UrlStruct> StructInfo<R> {
    /// Describes `R` by walking its declared fields.
    ///
    /// # Panics
    ///
    /// Panics if a field tagged `unknown` is not [`UnknownValues`].
    #[must_use]
    pub fn new() -> Self {
        let mut builder = Builder {
            table_name: None,
            fields: Vec::new(),
            hooks: Vec::new(),
            unknown: None,
        };

        R::describe(&mut Scope { builder: &mut builder, path: FieldPath::root() });

        // a later field with the same name shadows an earlier one
        let field_map = builder
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name().to_owned(), i))
            .collect();

        Self {
            table_name: builder.table_name,
            fields: builder.fields,
            field_map,
            hooks: builder.hooks,
            unknown: builder.unknown,
            is_unmarshaler: R::IS_UNMARSHALER,
        }
    }
}

impl<R: UrlStruct> Default for StructInfo<R> {
    fn default() -> Self { Self::new() }
}

impl<R> StructInfo<R> {
    /// The record name set by the `table_name` sentinel field.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> { self.table_name.as_deref() }

    /// The decodable fields in discovery order.
    #[must_use]
    pub fn fields(&self) -> &[Field<R>] { &self.fields }

    /// Looks up a field by its exact canonical name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field<R>> {
        self.field_map.get(name).map(|&i| &self.fields[i])
    }

    /// Looks up a field by canonical name, falling back to the
    /// `base{separator}op` convention, which resolves to the field named
    /// `base_op` when `op` is a configured operator.
    #[must_use]
    pub fn lookup(
        &self,
        name: &str,
        configuration: &Configuration,
    ) -> Option<&Field<R>> {
        if let Some(field) = self.field(name) {
            return Some(field);
        }

        if configuration.operator_separator.is_empty() {
            return None;
        }

        let (base, op) = name.rsplit_once(configuration.operator_separator)?;
        if base.is_empty()
            || !configuration.operators.iter().any(|known| *known == op)
        {
            return None;
        }

        self.field(&format!("{base}_{op}"))
    }

    /// Index paths of nested records invoked as [`Unmarshaler`] hooks, in
    /// the order they run.
    pub fn unmarshaler_indexes(&self) -> impl Iterator<Item = &[usize]> {
        self.hooks.iter().map(|hook| &*hook.index)
    }

    /// Index path of the field collecting unmatched names.
    #[must_use]
    pub fn unknown_field_index(&self) -> Option<&[usize]> {
        self.unknown.as_ref().map(|unknown| &*unknown.index)
    }

    /// Whether the record itself is invoked as an [`Unmarshaler`] last.
    #[must_use]
    pub fn is_unmarshaler(&self) -> bool { self.is_unmarshaler }

    pub(crate) fn hooks(&self) -> &[Hook<R>] { &self.hooks }

    pub(crate) fn unknown_field(&self) -> Option<&UnknownField<R>> {
        self.unknown.as_ref()
    }
}

impl<R> fmt::Debug for StructInfo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInfo")
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .field("hooks", &self.hooks.len())
            .field("is_unmarshaler", &self.is_unmarshaler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test;
