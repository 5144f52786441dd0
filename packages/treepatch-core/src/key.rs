use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity token that tracks a child across reorderings of its sibling list.
///
/// Keys only need to be unique among siblings. Strings and integers are both accepted so
/// callers can key by whatever their data already uses.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Key {
    Num(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Num(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Num(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Num(value.into())
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Num(value.into())
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        // Sibling indices never get near i64::MAX; saturate rather than wrap if they do.
        Key::Num(i64::try_from(value).unwrap_or(i64::MAX))
    }
}
