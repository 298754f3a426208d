//! Three-state record fields.
//!
//! The API omits fields it has nothing to report for (a stopped guest has no
//! `uptime`, an HDD has no `wearout`). That omission must never be read as
//! zero, and both must be told apart from "this coordinator has not produced a
//! record yet".

use serde::{Deserialize, Serialize};

/// One field of a resource record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Field<T> {
    /// The upstream payload carried a value.
    Value(T),
    /// The upstream payload omitted the field (or sent something unusable).
    Absent,
    /// No successful refresh has happened yet.
    NotYetFetched,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::NotYetFetched
    }
}

impl<T> Field<T> {
    /// Present when `Some`, explicitly absent when `None`.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::Absent,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Value(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_not_yet_fetched(&self) -> bool {
        matches!(self, Field::NotYetFetched)
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Value(v) => Field::Value(v),
            Field::Absent => Field::Absent,
            Field::NotYetFetched => Field::NotYetFetched,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Value(v) => Field::Value(f(v)),
            Field::Absent => Field::Absent,
            Field::NotYetFetched => Field::NotYetFetched,
        }
    }

    /// Combines two fields. "Not yet fetched" wins over "absent", which wins
    /// over a value.
    pub fn zip<U>(self, other: Field<U>) -> Field<(T, U)> {
        match (self, other) {
            (Field::Value(a), Field::Value(b)) => Field::Value((a, b)),
            (Field::NotYetFetched, _) | (_, Field::NotYetFetched) => Field::NotYetFetched,
            _ => Field::Absent,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        Field::from_option(value)
    }
}

/// `used / total * 100`, or "no data" when either side is missing or the total
/// is zero.
pub fn percentage(used: &Field<u64>, total: &Field<u64>) -> Field<f64> {
    used.as_ref()
        .zip(total.as_ref())
        .and_then_value(|(used, total)| {
            (*total > 0).then(|| *used as f64 / *total as f64 * 100.0)
        })
}

/// `total - used` when both are present; saturates at zero.
pub fn difference(total: &Field<u64>, used: &Field<u64>) -> Field<u64> {
    total
        .as_ref()
        .zip(used.as_ref())
        .map(|(total, used)| total.saturating_sub(*used))
}

trait AndThenValue<T> {
    fn and_then_value<U>(self, f: impl FnOnce(T) -> Option<U>) -> Field<U>;
}

impl<T> AndThenValue<T> for Field<T> {
    fn and_then_value<U>(self, f: impl FnOnce(T) -> Option<U>) -> Field<U> {
        match self {
            Field::Value(v) => Field::from_option(f(v)),
            Field::Absent => Field::Absent,
            Field::NotYetFetched => Field::NotYetFetched,
        }
    }
}
