//! Host-side generic value.
//!
//! [`HostValue`] is the tagged union the host uses for property values,
//! command results and event payloads. It is tree-shaped by construction:
//! every node owns its children, so the host can never hand a cycle across
//! the scripting boundary.

use serde_json::Value as JsonValue;
use std::fmt;

/// Tagged generic value exchanged with the host.
///
/// Map entries keep their insertion order and keys are unique; use
/// [`HostValue::map`] or [`HostValue::insert`] to maintain that invariant.
///
/// # Examples
///
/// ```
/// use host_types::HostValue;
///
/// let value = HostValue::map([
///     ("a", HostValue::Int64(1)),
///     ("b", HostValue::Array(vec![HostValue::Flag(true), HostValue::None])),
/// ]);
/// assert_eq!(value.get("a"), Some(&HostValue::Int64(1)));
/// assert_eq!(value.kind_name(), "map");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HostValue {
    /// No value
    #[default]
    None,
    /// Boolean flag
    Flag(bool),
    /// Signed 64 bit integer
    Int64(i64),
    /// IEEE 754 double
    Double(f64),
    /// UTF-8 text
    String(String),
    /// Ordered sequence
    Array(Vec<HostValue>),
    /// Ordered key/value pairs with unique keys
    Map(Vec<(String, HostValue)>),
}

impl HostValue {
    /// Build a map from pairs. A repeated key replaces the earlier value in place.
    pub fn map<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, HostValue)>,
    {
        let mut map = HostValue::Map(Vec::new());
        for (key, value) in pairs {
            map.insert(key, value);
        }
        map
    }

    /// Build an array of strings.
    pub fn strings<S: AsRef<str>>(items: &[S]) -> Self {
        HostValue::Array(
            items
                .iter()
                .map(|s| HostValue::String(s.as_ref().to_string()))
                .collect(),
        )
    }

    /// Insert into a map value, replacing an existing key.
    ///
    /// Does nothing when `self` is not a map.
    pub fn insert(&mut self, key: impl Into<String>, value: HostValue) {
        if let HostValue::Map(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            HostValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::None => "none",
            HostValue::Flag(_) => "flag",
            HostValue::Int64(_) => "int64",
            HostValue::Double(_) => "double",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Map(_) => "map",
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for [`HostValue::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    /// Nesting depth of the tree; scalars have depth 1.
    pub fn depth(&self) -> usize {
        match self {
            HostValue::Array(items) => 1 + items.iter().map(HostValue::depth).max().unwrap_or(0),
            HostValue::Map(entries) => {
                1 + entries.iter().map(|(_, v)| v.depth()).max().unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Convert into a JSON value. Map order is kept.
    pub fn to_json(&self) -> JsonValue {
        match self {
            HostValue::None => JsonValue::Null,
            HostValue::Flag(b) => JsonValue::Bool(*b),
            HostValue::Int64(n) => JsonValue::from(*n),
            HostValue::Double(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            HostValue::String(s) => JsonValue::String(s.clone()),
            HostValue::Array(items) => JsonValue::Array(items.iter().map(HostValue::to_json).collect()),
            HostValue::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&JsonValue> for HostValue {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => HostValue::None,
            JsonValue::Bool(b) => HostValue::Flag(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => HostValue::Int64(i),
                None => HostValue::Double(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => HostValue::String(s.clone()),
            JsonValue::Array(items) => HostValue::Array(items.iter().map(HostValue::from).collect()),
            JsonValue::Object(obj) => {
                HostValue::Map(obj.iter().map(|(k, v)| (k.clone(), HostValue::from(v))).collect())
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Flag(b)
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Int64(n)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Double(n)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

/// String rendering as the host formats property values: flags as
/// `yes`/`no`, doubles with six decimals, containers as JSON.
impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => Ok(()),
            HostValue::Flag(b) => f.write_str(if *b { "yes" } else { "no" }),
            HostValue::Int64(n) => write!(f, "{}", n),
            HostValue::Double(n) => write!(f, "{:.6}", n),
            HostValue::String(s) => f.write_str(s),
            HostValue::Array(_) | HostValue::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}
