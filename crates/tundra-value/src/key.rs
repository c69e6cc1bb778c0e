//! Property keys for addressing within value graphs
//!
//! Provides [`Key`], the single addressing unit used by every accessor
//! (`get`, `set`, `delete`) on records, arrays and wrapper views.

use std::fmt::{self, Display, Formatter};

/// Key of one property within a record or array
///
/// Keys are canonical: a string that spells a decimal index without leading
/// zeros is always an [`Key::Index`], so `"3"` and `3usize` address the same
/// slot. Records store every key in its string form.
///
/// # Examples
/// - `"name"` → `Key::Name("name")`
/// - `"0"` → `Key::Index(0)`
/// - `"007"` → `Key::Name("007")`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Array slot, or a record field spelled as a number
    Index(usize),
    /// Any other record field
    Name(String),
}

impl Key {
    /// Parse a key from its string form
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(index) if index.to_string() == raw => Self::Index(index),
            _ => Self::Name(raw.to_string()),
        }
    }

    /// Index form, if this key addresses an array slot
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }

    /// String form used as a record field name
    #[inline]
    #[must_use]
    pub fn to_field(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::Name(name) => name.clone(),
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Key {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_are_indices() {
        assert_eq!(Key::from("0"), Key::Index(0));
        assert_eq!(Key::from("42"), Key::Index(42));
        assert_eq!(Key::from(String::from("7")), Key::from(7_usize));
    }

    #[test]
    fn non_canonical_numbers_stay_names() {
        assert_eq!(Key::from("007"), Key::Name("007".to_string()));
        assert_eq!(Key::from("-1"), Key::Name("-1".to_string()));
        assert_eq!(Key::from("1.5"), Key::Name("1.5".to_string()));
    }

    #[test]
    fn field_form_round_trips_through_display() {
        let keys = [Key::from("outer"), Key::from(3_usize)];
        for key in keys {
            assert_eq!(Key::from(key.to_field()), key);
            assert_eq!(key.to_string(), key.to_field());
        }
    }

    #[test]
    fn as_index_only_for_indices() {
        assert_eq!(Key::Index(2).as_index(), Some(2));
        assert_eq!(Key::from("name").as_index(), None);
    }
}
