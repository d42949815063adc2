//! Flag type tags and the tagged value union stored for each parsed flag.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use super::duration::format_duration;

/// Declared type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    String,
    Int,
    Int64,
    Float64,
    Bool,
    Duration,
    StringList,
    IntList,
}

impl FlagType {
    /// Value returned by typed accessors when a flag is neither supplied nor defaulted.
    pub fn zero_value(self) -> FlagValue {
        match self {
            FlagType::String => FlagValue::String(String::new()),
            FlagType::Int => FlagValue::Int(0),
            FlagType::Int64 => FlagValue::Int64(0),
            FlagType::Float64 => FlagValue::Float64(0.0),
            FlagType::Bool => FlagValue::Bool(false),
            FlagType::Duration => FlagValue::Duration(Duration::ZERO),
            FlagType::StringList => FlagValue::StringList(Vec::new()),
            FlagType::IntList => FlagValue::IntList(Vec::new()),
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlagType::String => "string",
            FlagType::Int => "int",
            FlagType::Int64 => "int64",
            FlagType::Float64 => "float64",
            FlagType::Bool => "bool",
            FlagType::Duration => "duration",
            FlagType::StringList => "string list",
            FlagType::IntList => "int list",
        };
        f.write_str(name)
    }
}

/// A coerced flag value.
///
/// Each variant corresponds to exactly one [`FlagType`]; `value.flag_type()` is
/// what schema checks and typed accessors compare against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    String(String),
    Int(i64),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    #[serde(serialize_with = "serialize_duration")]
    Duration(Duration),
    StringList(Vec<String>),
    IntList(Vec<i64>),
}

impl FlagValue {
    pub fn flag_type(&self) -> FlagType {
        match self {
            FlagValue::String(_) => FlagType::String,
            FlagValue::Int(_) => FlagType::Int,
            FlagValue::Int64(_) => FlagType::Int64,
            FlagValue::Float64(_) => FlagType::Float64,
            FlagValue::Bool(_) => FlagType::Bool,
            FlagValue::Duration(_) => FlagType::Duration,
            FlagValue::StringList(_) => FlagType::StringList,
            FlagValue::IntList(_) => FlagType::IntList,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::String(s) => f.write_str(s),
            FlagValue::Int(n) | FlagValue::Int64(n) => write!(f, "{}", n),
            FlagValue::Float64(n) => write!(f, "{}", n),
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Duration(d) => f.write_str(&format_duration(*d)),
            FlagValue::StringList(items) => write!(f, "[{}]", items.join(" ")),
            FlagValue::IntList(items) => {
                let parts: Vec<String> = items.iter().map(|n| n.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
        }
    }
}

fn serialize_duration<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*d))
}

// Conversions used by `FlagDefinition::default_value`. Plain integers become
// `Int`; use `FlagValue::Int64` explicitly for int64 flags.

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        FlagValue::String(s.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        FlagValue::String(s)
    }
}

impl From<i64> for FlagValue {
    fn from(n: i64) -> Self {
        FlagValue::Int(n)
    }
}

impl From<i32> for FlagValue {
    fn from(n: i32) -> Self {
        FlagValue::Int(i64::from(n))
    }
}

impl From<f64> for FlagValue {
    fn from(n: f64) -> Self {
        FlagValue::Float64(n)
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Bool(b)
    }
}

impl From<Duration> for FlagValue {
    fn from(d: Duration) -> Self {
        FlagValue::Duration(d)
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(items: Vec<String>) -> Self {
        FlagValue::StringList(items)
    }
}

impl From<Vec<&str>> for FlagValue {
    fn from(items: Vec<&str>) -> Self {
        FlagValue::StringList(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for FlagValue {
    fn from(items: Vec<i64>) -> Self {
        FlagValue::IntList(items)
    }
}
