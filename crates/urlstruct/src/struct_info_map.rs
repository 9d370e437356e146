//! The process-wide cache of struct descriptors.

use std::{
    any::{Any, TypeId},
    sync::{Arc, LazyLock},
};

use dashmap::{DashMap, mapref::entry::Entry};
use fxhash::FxBuildHasher;

use crate::{
    Configuration, Error, StructInfo, UrlStruct, Values, decoder::StructDecoder,
};

/// Caches one [`StructInfo`] per record type.
///
/// Descriptors are built on first use and shared afterwards. Concurrent
/// first uses of the same type may each build a descriptor, but only the
/// first one stored is ever returned.
pub struct StructInfoMap {
    infos: DashMap<TypeId, Arc<dyn Any + Send + Sync>, FxBuildHasher>,
    configuration: Configuration,
}

static GLOBAL: LazyLock<StructInfoMap> =
    LazyLock::new(|| StructInfoMap::new(Configuration::default()));

impl StructInfoMap {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(configuration: Configuration) -> Self {
        Self {
            infos: DashMap::with_hasher_and_shard_amount(
                FxBuildHasher::default(),
                configuration.shard_amount.max(2).next_power_of_two(),
            ),
            configuration,
        }
    }

    /// The cache used by [`decode`](crate::decode) and
    /// [`describe_struct`](crate::describe_struct), with the default
    /// [`Configuration`].
    #[must_use]
    pub fn global() -> &'static Self { &GLOBAL }

    /// The configuration this cache decodes with.
    #[must_use]
    pub fn configuration(&self) -> &Configuration { &self.configuration }

    /// Returns the descriptor of `T`, building it on first use.
    ///
    /// # Panics
    ///
    /// Panics if `T` has a field tagged `unknown` whose type is not
    /// [`UnknownValues`](crate::UnknownValues).
    pub fn describe<T: UrlStruct>(&self) -> Arc<StructInfo<T>> {
        let type_id = TypeId::of::<T>();

        let cached = self.infos.get(&type_id).map(|info| info.value().clone());
        let erased = cached.unwrap_or_else(|| {
            // built outside the shard lock
            let built: Arc<dyn Any + Send + Sync> =
                Arc::new(StructInfo::<T>::new());

            match self.infos.entry(type_id) {
                Entry::Occupied(entry) => entry.get().clone(),
                Entry::Vacant(entry) => {
                    let stored = entry.insert(built).value().clone();
                    tracing::debug!(
                        ty = std::any::type_name::<T>(),
                        "described struct"
                    );
                    stored
                }
            }
        });

        erased
            .downcast::<StructInfo<T>>()
            .expect("struct info cached under another type id")
    }

    /// Decodes `values` into `strct`.
    ///
    /// # Errors
    ///
    /// Returns the first scan error or the first error returned by an
    /// [`Unmarshaler`](crate::Unmarshaler) hook.
    pub fn decode<T: UrlStruct>(
        &self,
        strct: &mut T,
        values: &Values,
    ) -> Result<(), Error> {
        let info = self.describe::<T>();
        StructDecoder::new(strct, &info, self).decode(values)
    }
}

impl Default for StructInfoMap {
    fn default() -> Self { Self::new(Configuration::default()) }
}

impl std::fmt::Debug for StructInfoMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructInfoMap")
            .field("len", &self.infos.len())
            .field("configuration", &self.configuration)
            .finish()
    }
}
