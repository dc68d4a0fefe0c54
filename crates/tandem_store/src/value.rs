//! Dynamic value type held by stores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reserved key under which each store records its last engine-driven write.
///
/// No application key may use this name.
pub const SYNC_TIMESTAMP_KEY: &str = "__tandem_sync_timestamp";

/// The full mapping of keys to values held by one store at a point in time.
pub type Snapshot = BTreeMap<String, Value>;

/// A moment in time, as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SyncTimestamp(pub u64);

impl SyncTimestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Converts a wall-clock time. Times before the epoch clamp to zero.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Returns the next representable timestamp, one millisecond later.
    #[must_use]
    pub const fn successor(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SyncTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// An opaque value stored under a key.
///
/// Values are scalars or simple containers of scalars. Stores never look
/// inside them and the engine copies them whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// A point in time.
    Timestamp(SyncTimestamp),
    /// Array of values.
    Array(Vec<Value>),
    /// String-keyed map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the timestamp if this is a `Timestamp` value.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<SyncTimestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Integer` value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(ts) => write!(f, "@{ts}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<SyncTimestamp> for Value {
    fn from(ts: SyncTimestamp) -> Self {
        Value::Timestamp(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(500), Value::Integer(500));
        assert_eq!(Value::from("dark"), Value::Text("dark".into()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
        assert_eq!(
            Value::from(SyncTimestamp(7)).as_timestamp(),
            Some(SyncTimestamp(7))
        );
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(Value::from("7").as_integer(), None);
        assert_eq!(Value::from(7).as_timestamp(), None);
        assert_eq!(Value::from(7).as_text(), None);
        assert_eq!(Value::from(1.5).as_bool(), None);
    }

    #[test]
    fn timestamp_ordering() {
        assert!(SyncTimestamp(2) > SyncTimestamp(1));
        assert_eq!(SyncTimestamp::from_millis(9).as_millis(), 9);
        assert_eq!(SyncTimestamp(9).successor(), SyncTimestamp(10));
        assert_eq!(SyncTimestamp(u64::MAX).successor(), SyncTimestamp(u64::MAX));
    }

    #[test]
    fn timestamp_from_system_time() {
        let time = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(SyncTimestamp::from_system_time(time), SyncTimestamp(1_500));
        assert_eq!(SyncTimestamp::from_system_time(UNIX_EPOCH), SyncTimestamp(0));
    }

    #[test]
    fn display() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::from(1));
        let value = Value::Array(vec![Value::from("x"), Value::Map(map)]);
        assert_eq!(value.to_string(), "[\"x\", {\"a\": 1}]");
        assert_eq!(Value::from(SyncTimestamp(3)).to_string(), "@3ms");
    }
}
