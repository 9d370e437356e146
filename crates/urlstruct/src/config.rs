//! Decoder configuration.

use std::sync::LazyLock;

use bon::Builder;

/// The separator between a field name and an operator suffix by default.
pub const DEFAULT_OPERATOR_SEPARATOR: &str = "__";

/// The operator suffixes recognized by default, as in `age__gte=18`.
pub const DEFAULT_OPERATORS: &[&str] =
    &["neq", "lt", "lte", "gt", "gte", "ieq", "match", "exclude", "include"];

/// Returns the default number of shards for the descriptor cache.
///
/// The default is calculated as `4 * available_parallelism`, rounded up to
/// the next power of two. The value is computed once and cached.
pub(crate) fn default_shard_amount() -> usize {
    static DEFAULT_SHARD_AMOUNT: LazyLock<usize> = LazyLock::new(|| {
        (std::thread::available_parallelism().map_or(1, usize::from) * 4)
            .next_power_of_two()
    });

    *DEFAULT_SHARD_AMOUNT
}

/// Configuration options for a [`StructInfoMap`](crate::StructInfoMap).
///
/// ```ignore
/// use urlstruct::{Configuration, StructInfoMap};
///
/// let map = StructInfoMap::new(
///     Configuration::builder().operator_separator("..").build(),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Builder)]
pub struct Configuration {
    /// Separates a field name from an operator suffix in a parameter name.
    ///
    /// `name{separator}op` decodes into the field named `name_op` when `op`
    /// is one of [`operators`](Self::operators). An empty separator turns
    /// the fallback off.
    #[builder(default = DEFAULT_OPERATOR_SEPARATOR)]
    pub operator_separator: &'static str,

    /// The operator suffixes accepted after the separator.
    #[builder(default = DEFAULT_OPERATORS)]
    pub operators: &'static [&'static str],

    /// The number of shards of the descriptor cache.
    #[builder(default = default_shard_amount())]
    pub shard_amount: usize,
}

impl Default for Configuration {
    fn default() -> Self { Self::builder().build() }
}
