//! Parsing of `urlstruct` declaration tags.
//!
//! A tag is the raw string attached to a field with
//! `#[urlstruct("name,opt1,opt2:value")]`. The first comma-separated segment
//! is the field's wire name (empty means "derive it from the identifier"),
//! the remaining segments are options. An option may carry a value after a
//! colon. Single or double quotes protect commas and colons inside a segment
//! and are stripped from the result.
//!
//! ```ignore
//! let tag = Tag::parse("'start,time',nodecode");
//! assert_eq!(tag.name(), "start,time");
//! assert!(tag.has_option("nodecode"));
//! ```

use fxhash::FxHashMap;

/// Tag value that excludes a field from the descriptor entirely.
pub const EXCLUDE: &str = "-";

/// Option marking a field that is described but never written by decode.
pub const NO_DECODE: &str = "nodecode";

/// Option marking the catch-all sink for unmatched parameter names.
pub const UNKNOWN: &str = "unknown";

/// A parsed declaration tag: a display name plus a set of options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    name: String,
    options: FxHashMap<String, String>,
}

impl Tag {
    /// Parses a raw declaration tag.
    ///
    /// Parsing never fails; malformed quoting is taken literally up to the
    /// end of the input.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut segments = split_segments(raw).into_iter();

        let name = segments.next().map(|s| unquote(&s)).unwrap_or_default();

        let options = segments
            .filter(|segment| !segment.is_empty())
            .map(|segment| match split_option(&segment) {
                Some((key, value)) => (unquote(key), unquote(value)),
                None => (unquote(&segment), String::new()),
            })
            .collect();

        Self { name, options }
    }

    /// Returns the name override, empty when the tag does not supply one.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Returns `true` if the tag is exactly [`EXCLUDE`].
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        self.name == EXCLUDE && self.options.is_empty()
    }

    /// Returns `true` if the option is present, with or without a value.
    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Returns the value of an option, `""` for a bare option.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// Splits on commas that are not inside quotes. Quote characters are kept so
/// that option values can be split on `:` afterwards.
fn split_segments(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote = None;

    for c in raw.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => segments.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }

    segments.push(current);
    segments
}

/// Splits `key:value` on the first colon outside quotes.
fn split_option(segment: &str) -> Option<(&str, &str)> {
    let mut quote = None;

    for (i, c) in segment.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ':' => return Some((&segment[..i], &segment[i + 1..])),
            None => {}
        }
    }

    None
}

fn unquote(s: &str) -> String {
    for q in ['\'', '"'] {
        if let Some(inner) =
            s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q))
        {
            return inner.to_owned();
        }
    }

    s.to_owned()
}
