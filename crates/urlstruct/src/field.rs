//! Field descriptors and the accessor paths that locate them.

use std::{any::TypeId, fmt, sync::Arc};

use crate::{Embed, Error, StructInfoMap, tag::Tag};

/// Projects the root record onto one of its (possibly deeply embedded)
/// fields.
pub(crate) type Access<R, T> =
    Arc<dyn for<'a> Fn(&'a mut R) -> &'a mut T + Send + Sync>;

/// Decodes raw values into the field of a root record.
pub(crate) type DecodeFn<R> = Arc<
    dyn Fn(&mut R, &[String], &StructInfoMap) -> Result<(), Error>
        + Send
        + Sync,
>;

pub(crate) fn access<R, T: ?Sized, F>(f: F) -> Access<R, T>
where
    F: for<'a> Fn(&'a mut R) -> &'a mut T + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn decode_fn<R, F>(f: F) -> DecodeFn<R>
where
    F: Fn(&mut R, &[String], &StructInfoMap) -> Result<(), Error>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// The location of a value of type `T` inside the root record `R`: the
/// declaration indices leading to it and the accessor that reaches it.
pub(crate) struct FieldPath<R, T: ?Sized> {
    pub(crate) index: Vec<usize>,
    pub(crate) access: Access<R, T>,
}

impl<R, T: ?Sized> Clone for FieldPath<R, T> {
    fn clone(&self) -> Self {
        Self { index: self.index.clone(), access: self.access.clone() }
    }
}

impl<R: 'static> FieldPath<R, R> {
    pub(crate) fn root() -> Self {
        Self { index: Vec::new(), access: access(|strct: &mut R| strct) }
    }
}

impl<R: 'static, T: 'static> FieldPath<R, T> {
    /// Extends the path by one declared field of `T`.
    pub(crate) fn join<U: 'static>(
        &self,
        index: usize,
        project: fn(&mut T) -> &mut U,
    ) -> FieldPath<R, U> {
        let mut joined = self.index.clone();
        joined.push(index);

        let parent = self.access.clone();
        FieldPath {
            index: joined,
            access: access(move |strct: &mut R| project(parent(strct))),
        }
    }
}

impl<R: 'static, E: Embed> FieldPath<R, E> {
    /// Steps through an embedding wrapper, allocating it if it is unset.
    pub(crate) fn embedded(self) -> FieldPath<R, E::Target> {
        let parent = self.access;
        FieldPath {
            index: self.index,
            access: access(move |strct: &mut R| parent(strct).embedded_mut()),
        }
    }
}

/// Describes one decodable field of the record `R`.
pub struct Field<R> {
    name: String,
    ident: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    index: Box<[usize]>,
    tag: Tag,
    no_decode: bool,
    map_only: bool,
    decode: DecodeFn<R>,
}

impl<R> Field<R> {
    pub(crate) fn new<T: 'static>(
        name: String,
        ident: &'static str,
        index: Vec<usize>,
        tag: Tag,
        map_only: bool,
        decode: DecodeFn<R>,
    ) -> Self {
        let no_decode = tag.has_option(crate::tag::NO_DECODE);

        Self {
            name,
            ident,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            index: index.into_boxed_slice(),
            tag,
            no_decode,
            map_only,
            decode,
        }
    }

    /// The canonical wire name.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// The identifier the field is declared with.
    #[must_use]
    pub fn ident(&self) -> &'static str { self.ident }

    /// The [`TypeId`] of the declared field type.
    #[must_use]
    pub fn type_id(&self) -> TypeId { self.type_id }

    /// The name of the declared field type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str { self.type_name }

    /// Declaration indices from the root record down to the field, one per
    /// level of embedding.
    #[must_use]
    pub fn index(&self) -> &[usize] { &self.index }

    /// The parsed declaration tag.
    #[must_use]
    pub fn tag(&self) -> &Tag { &self.tag }

    /// Whether the field was tagged `nodecode`.
    #[must_use]
    pub fn no_decode(&self) -> bool { self.no_decode }

    /// Whether the field only accepts map-shaped names, `name[key]`.
    #[must_use]
    pub fn map_only(&self) -> bool { self.map_only }

    pub(crate) fn decode(
        &self,
        strct: &mut R,
        values: &[String],
        map: &StructInfoMap,
    ) -> Result<(), Error> {
        (self.decode)(strct, values, map)
    }
}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("index", &self.index)
            .field("no_decode", &self.no_decode)
            .field("map_only", &self.map_only)
            .finish_non_exhaustive()
    }
}
