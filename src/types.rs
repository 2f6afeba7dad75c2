use std::collections::BTreeMap;
use std::fmt;

use blake3::Hasher;
use serde::Deserialize;

/// Name of a task inside its owning runner.
pub type TaskName = String;

/// A scalar, hashable value used for task parameters and for declared
/// namespaces coming from config files.
///
/// Floats are deliberately absent: every parameter must be usable as part of
/// a task's hash signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ParamValue {
    /// Short description of the value's kind, used in type errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Str(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// Declared task parameters.
///
/// Keys are kept sorted, so equality and hashing follow the sorted
/// key/value pairs regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable hex fingerprint of the sorted key/value pairs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Hasher::new();
        for (key, value) in self.0.iter() {
            hasher.update(key.as_bytes());
            hasher.update(b"\0");
            hasher.update(value.kind().as_bytes());
            hasher.update(b"\0");
            hasher.update(value.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Equality/hash signature of a task: its kind plus its parameters.
///
/// Two instances of the same task type with different parameters are
/// different tasks; the name a runner assigns is not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskIdentity {
    pub kind: String,
    pub params: Params,
}

impl TaskIdentity {
    pub fn new(kind: impl Into<String>, params: Params) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// `kind` plus the parameter fingerprint, e.g. for logs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Hasher::new();
        hasher.update(self.kind.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.params.fingerprint().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Policy deciding whether a task that already exists still gets expanded
/// while scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePolicy {
    /// A task whose own resolved overwrite flag is set is scheduled even if
    /// it already exists, and its dependencies are expanded.
    #[default]
    OwnOverwriteFlag,
    /// Existence alone short-circuits scheduling; overwrite flags only
    /// affect whether writes may replace artifacts.
    ExistenceOnly,
}
