//! Hook traits that let types take over parts of decoding.

use crate::{BoxError, Values};

/// A record that post-processes the full parameter mapping.
///
/// The hook runs after every field has been decoded, receiving the original
/// mapping rather than the subset that matched no field. Implementors
/// declare conformance with `#[urlstruct(unmarshaler)]` next to the derive:
///
/// ```ignore
/// #[derive(Default, UrlStruct)]
/// #[urlstruct(unmarshaler)]
/// struct Pager {
///     limit: u32,
///     touched: bool,
/// }
///
/// impl Unmarshaler for Pager {
///     fn unmarshal_values(&mut self, _: &Values) -> Result<(), BoxError> {
///         self.touched = true;
///         Ok(())
///     }
/// }
/// ```
///
/// Embedded records with this hook are not flattened into their parent;
/// they are invoked with the whole mapping instead.
pub trait Unmarshaler {
    /// Decodes whatever the field table could not express.
    ///
    /// # Errors
    ///
    /// Any error aborts the decode and is returned to the caller as
    /// [`Error::Unmarshal`](crate::Error::Unmarshal).
    fn unmarshal_values(&mut self, values: &Values) -> Result<(), BoxError>;
}

/// A field type that decodes itself from the text of the first raw value.
///
/// Fields of such types are declared with `#[urlstruct(text)]`.
pub trait TextUnmarshaler {
    /// Replaces `self` with the value encoded by `text`.
    ///
    /// # Errors
    ///
    /// Returns an error when `text` is not a valid encoding.
    fn unmarshal_text(&mut self, text: &[u8]) -> Result<(), BoxError>;
}
