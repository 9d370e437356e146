//! The per-call decode of raw values into one record.

use fxhash::FxHashMap;

use crate::{Error, StructInfo, StructInfoMap, UrlStruct, Values};

/// Splits a map-shaped name `base[key]` into `(base, key)`.
///
/// The name must end in `]` and the brackets, starting at the first `[`,
/// must enclose a non-empty key. `name[]` is not map-shaped.
pub(crate) fn map_key(name: &str) -> Option<(&str, &str)> {
    let open = name.find('[')?;
    let inner = name.strip_suffix(']')?.get(open + 1..)?;

    if inner.is_empty() {
        return None;
    }

    Some((&name[..open], inner))
}

/// Decodes into one record using its descriptor.
pub(crate) struct StructDecoder<'a, T> {
    strct: &'a mut T,
    info: &'a StructInfo<T>,
    map: &'a StructInfoMap,
}

impl<'a, T: UrlStruct> StructDecoder<'a, T> {
    pub(crate) fn new(
        strct: &'a mut T,
        info: &'a StructInfo<T>,
        map: &'a StructInfoMap,
    ) -> Self {
        Self { strct, info, map }
    }

    /// Decodes every parameter, then runs the hooks.
    ///
    /// Plain names are decoded as they are met. Map-shaped names are first
    /// gathered per base name into alternating key/value entries, taking
    /// the first value of every raw key, and decoded afterwards. The order
    /// of the entries follows the iteration order of `values`, which is
    /// unspecified.
    pub(crate) fn decode(mut self, values: &Values) -> Result<(), Error> {
        let mut maps: FxHashMap<&str, Vec<String>> = FxHashMap::default();

        for (name, raw) in values.iter() {
            if let Some((base, key)) = map_key(name) {
                if let Some(first) = raw.first() {
                    maps.entry(base)
                        .or_default()
                        .extend([key.to_owned(), first.clone()]);
                }
                continue;
            }

            self.decode_field(name, raw)?;
        }

        for (base, entries) in maps {
            self.decode_named(base, &entries, true)?;
        }

        for hook in self.info.hooks() {
            if let Some(unmarshaler) = hook.get(self.strct) {
                unmarshaler.unmarshal_values(values).map_err(Error::Unmarshal)?;
            }
        }

        if self.info.is_unmarshaler()
            && let Some(unmarshaler) = self.strct.as_unmarshaler()
        {
            unmarshaler.unmarshal_values(values).map_err(Error::Unmarshal)?;
        }

        Ok(())
    }

    /// Decodes the values of one plain parameter name.
    ///
    /// A leading `:` and a trailing `[]` are stripped first. A name that
    /// resolves to no decodable field goes to the `unknown` field, if any,
    /// and is dropped otherwise. Map and nested record fields only take
    /// map-shaped names, so a plain name never reaches them.
    pub(crate) fn decode_field(
        &mut self,
        name: &str,
        values: &[String],
    ) -> Result<(), Error> {
        self.decode_named(name, values, false)
    }

    fn decode_named(
        &mut self,
        name: &str,
        values: &[String],
        map_shaped: bool,
    ) -> Result<(), Error> {
        let name = name.strip_prefix(':').unwrap_or(name);
        let name = name.strip_suffix("[]").unwrap_or(name);

        if let Some(field) = self.info.lookup(name, self.map.configuration())
            && !field.no_decode()
            && (map_shaped || !field.map_only())
        {
            return field.decode(self.strct, values, self.map);
        }

        let Some(unknown) = self.info.unknown_field() else {
            tracing::trace!(name, "dropped parameter matching no field");
            return Ok(());
        };

        unknown
            .get(self.strct)
            .entry(name.to_owned())
            .or_default()
            .extend_from_slice(values);

        Ok(())
    }
}
