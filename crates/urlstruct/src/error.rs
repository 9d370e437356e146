//! Error types returned by decoding.

/// A boxed error, used for errors produced by user hooks and parsers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error raised by a scanner when a raw value can't be converted.
///
/// The decoder wraps it into [`Error::Scan`] together with the name of the
/// field being decoded.
#[derive(Debug, thiserror::Error)]
#[error("can't parse {value:?}: {source}")]
pub struct ScanError {
    value: String,
    #[source]
    source: BoxError,
}

impl ScanError {
    /// Creates a new scan error for the offending raw value.
    pub fn new(value: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self { value: value.into(), source: source.into() }
    }

    /// Returns the raw value that failed to convert.
    #[must_use]
    pub fn value(&self) -> &str { &self.value }
}

/// The error returned by a failed decode.
///
/// Decoding stops at the first error. Fields decoded before it are not
/// rolled back, so the destination must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw value could not be converted into the field's type.
    #[error("urlstruct: can't decode {field}={value:?}: {source}")]
    Scan {
        /// Canonical name of the field, with the enclosing field prepended
        /// as `outer[inner]` for nested records.
        field: String,
        /// The offending raw value.
        value: String,
        /// The underlying parse error.
        #[source]
        source: BoxError,
    },

    /// An [`Unmarshaler`](crate::Unmarshaler) hook returned an error.
    #[error(transparent)]
    Unmarshal(BoxError),
}

impl Error {
    pub(crate) fn scan(field: &str, error: ScanError) -> Self {
        Self::Scan {
            field: field.to_owned(),
            value: error.value,
            source: error.source,
        }
    }

    /// Prefixes the field name of a scan error with the enclosing field.
    pub(crate) fn nested_in(self, outer: &str) -> Self {
        match self {
            Self::Scan { field, value, source } => Self::Scan {
                field: format!("{outer}[{field}]"),
                value,
                source,
            },
            other @ Self::Unmarshal(_) => other,
        }
    }

    /// Returns the name of the field that failed to decode, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Scan { field, .. } => Some(field),
            Self::Unmarshal(_) => None,
        }
    }
}
