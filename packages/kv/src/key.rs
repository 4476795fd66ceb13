//! Store keys and key ranges.

use std::fmt;
use std::ops::Bound;

use hostshim_core::Value;

/// A record key. Numbers order before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Number(i64),
    Text(String),
}

impl Key {
    /// Interpret a value as a key. Only integers and strings qualify.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Integer(n) => Some(Key::Number(*n)),
            Value::String(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Number(n) => Value::Integer(*n),
            Key::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Text(s) => Some(s),
            Key::Number(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Number(n) => write!(f, "{}", n),
            Key::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Number(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Number(i64::from(v))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Text(v)
    }
}

/// A range of keys, each end optionally bounded and open or closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Bound<Key>,
    upper: Bound<Key>,
}

fn bound(key: Key, open: bool) -> Bound<Key> {
    if open {
        Bound::Excluded(key)
    } else {
        Bound::Included(key)
    }
}

impl KeyRange {
    /// Exactly one key.
    pub fn only(key: impl Into<Key>) -> Self {
        let key = key.into();
        Self {
            lower: Bound::Included(key.clone()),
            upper: Bound::Included(key),
        }
    }

    pub fn lower_bound(lower: impl Into<Key>, open: bool) -> Self {
        Self {
            lower: bound(lower.into(), open),
            upper: Bound::Unbounded,
        }
    }

    pub fn upper_bound(upper: impl Into<Key>, open: bool) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: bound(upper.into(), open),
        }
    }

    pub fn bound(
        lower: impl Into<Key>,
        upper: impl Into<Key>,
        lower_open: bool,
        upper_open: bool,
    ) -> Self {
        Self {
            lower: bound(lower.into(), lower_open),
            upper: bound(upper.into(), upper_open),
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        let above = match &self.lower {
            Bound::Included(l) => key >= l,
            Bound::Excluded(l) => key > l,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(u) => key <= u,
            Bound::Excluded(u) => key < u,
            Bound::Unbounded => true,
        };
        above && below
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_sort_before_text() {
        let mut keys = vec![Key::from("a"), Key::from(10), Key::from("B"), Key::from(-1)];
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::from(-1), Key::from(10), Key::from("B"), Key::from("a")]
        );
    }

    #[test]
    fn from_value_accepts_integers_and_strings() {
        assert_eq!(Key::from_value(&Value::from(7i64)), Some(Key::Number(7)));
        assert_eq!(Key::from_value(&Value::from("x")), Some(Key::from("x")));
        assert_eq!(Key::from_value(&Value::Bool(true)), None);
        assert_eq!(Key::from_value(&Value::Float(1.5)), None);
    }

    #[test]
    fn range_bounds() {
        let closed = KeyRange::bound(1, 3, false, false);
        assert!(closed.contains(&Key::from(1)));
        assert!(closed.contains(&Key::from(3)));
        assert!(!closed.contains(&Key::from(4)));

        let open = KeyRange::bound(1, 3, true, true);
        assert!(!open.contains(&Key::from(1)));
        assert!(open.contains(&Key::from(2)));
        assert!(!open.contains(&Key::from(3)));

        let only = KeyRange::only("k");
        assert!(only.contains(&Key::from("k")));
        assert!(!only.contains(&Key::from("l")));

        assert!(KeyRange::lower_bound(5, false).contains(&Key::from("any text")));
        assert!(!KeyRange::upper_bound(5, true).contains(&Key::from(5)));
    }

    #[test]
    fn empty_range_contains_nothing() {
        let inverted = KeyRange::bound(3, 1, false, false);
        assert!(!inverted.contains(&Key::from(2)));
    }
}
