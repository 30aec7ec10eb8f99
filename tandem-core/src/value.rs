//! ABOUTME: Tagged-variant value type used at the agent invocation boundary
//! ABOUTME: Replaces the dynamic parameter/result dicts of the source system

use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed value that may cross the agent invocation boundary
/// as a parameter or a result field.
///
/// The source system passes arbitrary language-native mappings into agents
/// and reads arbitrary fields back out (§9 Design Notes). Rust has no
/// equivalent of that without giving up static typing entirely, so this
/// crate models parameters and results as a closed sum type instead of an
/// untyped map of `Any`. Agents that need more structure than `Value`
/// offers are expected to encode/decode their own types at the edges
/// (typically via `Value::Str` holding JSON, or a dedicated `Action`
/// descriptor that validates shape beyond what this type enforces).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Look up a dotted path (`"a.b.c"`) through nested maps, the shape
    /// that binding resolution (`from_field`) walks.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Approximate serialized size in bytes, used to enforce the optional
    /// output-size bound discussed in §9 Open Questions.
    #[must_use]
    pub fn approx_size(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).unwrap_or_default();
                write!(f, "{json}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Ordered string-keyed mapping of parameters or output fields.
pub type Params = BTreeMap<String, Value>;

/// Build a `Params` map from `(key, value)` pairs.
#[must_use]
pub fn params(pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<Value>)>) -> Params {
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
