//! Typed named values.
//!
//! A [`Value`] always carries the [`ValueSpec`] that declares it. The payload
//! is a closed tagged union so that leaves which need text (prompt
//! substitution) or a specific shape (HTTP status) convert explicitly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic shape of a value.
///
/// Not enforced at runtime; leaves that convert do so via [`Payload::coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    #[serde(alias = "int")]
    Integer,
    Boolean,
    Object,
    List,
    Any,
}

impl ValueType {
    /// Whether a payload has the shape this type describes.
    ///
    /// `Null` is admitted by every type.
    pub fn admits(&self, payload: &Payload) -> bool {
        matches!(
            (self, payload),
            (ValueType::Any, _)
                | (_, Payload::Null)
                | (ValueType::String, Payload::String(_))
                | (ValueType::Integer, Payload::Integer(_))
                | (ValueType::Boolean, Payload::Boolean(_))
                | (ValueType::Object, Payload::Object(_))
                | (ValueType::List, Payload::List(_))
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Object => write!(f, "object"),
            ValueType::List => write!(f, "list"),
            ValueType::Any => write!(f, "any"),
        }
    }
}

/// Declaration of a named value within a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: ValueType,
    /// An optional input may stay unbound even under the strict policy.
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_value_type() -> ValueType {
    ValueType::Any
}

impl ValueSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl fmt::Display for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.optional { "?" } else { "" };
        write!(f, "{}{}: {}", self.name, marker, self.value_type)
    }
}

/// Dynamically typed payload of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Payload {
    #[default]
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Object(BTreeMap<String, Payload>),
    List(Vec<Payload>),
}

impl Payload {
    /// The tag this payload carries. `Null` reports `Any`.
    pub fn value_type(&self) -> ValueType {
        match self {
            Payload::Null => ValueType::Any,
            Payload::String(_) => ValueType::String,
            Payload::Integer(_) => ValueType::Integer,
            Payload::Boolean(_) => ValueType::Boolean,
            Payload::Object(_) => ValueType::Object,
            Payload::List(_) => ValueType::List,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Payload::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    /// Parse command-line text into a payload of the declared type.
    ///
    /// `string` keeps the text verbatim. `object`, `list` and `any` accept
    /// JSON; `any` falls back to the raw text when it is not valid JSON.
    pub fn parse_as(text: &str, value_type: ValueType) -> Result<Payload> {
        match value_type {
            ValueType::String => Ok(Payload::String(text.to_string())),
            ValueType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Payload::Integer)
                .map_err(|_| Error::Parse(format!("'{}' is not an integer", text))),
            ValueType::Boolean => match text.trim().to_lowercase().as_str() {
                "true" => Ok(Payload::Boolean(true)),
                "false" => Ok(Payload::Boolean(false)),
                _ => Err(Error::Parse(format!("'{}' is not a boolean", text))),
            },
            ValueType::Object => {
                let parsed: serde_json::Value = serde_json::from_str(text)?;
                if !parsed.is_object() {
                    return Err(Error::Parse(format!("'{}' is not a JSON object", text)));
                }
                Ok(parsed.into())
            }
            ValueType::List => {
                let parsed: serde_json::Value = serde_json::from_str(text)?;
                if !parsed.is_array() {
                    return Err(Error::Parse(format!("'{}' is not a JSON array", text)));
                }
                Ok(parsed.into())
            }
            ValueType::Any => Ok(serde_json::from_str::<serde_json::Value>(text)
                .map(Payload::from)
                .unwrap_or_else(|_| Payload::String(text.to_string()))),
        }
    }

    /// Convert this payload towards the given type where a lossless or
    /// textual conversion exists; otherwise return it unchanged.
    pub fn coerce(self, value_type: ValueType) -> Payload {
        match (value_type, self) {
            (ValueType::String, Payload::String(s)) => Payload::String(s),
            (ValueType::String, other) => Payload::String(other.to_string()),
            (ValueType::Integer, Payload::String(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Payload::Integer(i),
                Err(_) => Payload::String(s),
            },
            (ValueType::Boolean, Payload::String(s)) => match s.trim() {
                "true" => Payload::Boolean(true),
                "false" => Payload::Boolean(false),
                _ => Payload::String(s),
            },
            (_, other) => other,
        }
    }
}

/// Canonical text form used for prompt substitution.
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Null => write!(f, "null"),
            Payload::String(s) => write!(f, "{}", s),
            Payload::Integer(i) => write!(f, "{}", i),
            Payload::Boolean(b) => write!(f, "{}", b),
            Payload::Object(_) | Payload::List(_) => {
                write!(f, "{}", serde_json::Value::from(self.clone()))
            }
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Payload::Null,
            serde_json::Value::Bool(b) => Payload::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Payload::Integer(i),
                None => Payload::String(n.to_string()),
            },
            serde_json::Value::String(s) => Payload::String(s),
            serde_json::Value::Array(items) => {
                Payload::List(items.into_iter().map(Payload::from).collect())
            }
            serde_json::Value::Object(map) => Payload::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Payload::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Payload> for serde_json::Value {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Null => serde_json::Value::Null,
            Payload::String(s) => serde_json::Value::String(s),
            Payload::Integer(i) => serde_json::Value::from(i),
            Payload::Boolean(b) => serde_json::Value::Bool(b),
            Payload::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
            Payload::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::String(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::String(s)
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Payload::Integer(i)
    }
}

impl From<i32> for Payload {
    fn from(i: i32) -> Self {
        Payload::Integer(i64::from(i))
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Boolean(b)
    }
}

/// A named, typed runtime datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub spec: ValueSpec,
    pub payload: Payload,
}

impl Value {
    pub fn new(spec: ValueSpec, payload: impl Into<Payload>) -> Self {
        Self {
            spec,
            payload: payload.into(),
        }
    }

    /// A string value named `name`.
    pub fn string(name: impl Into<String>, s: impl Into<String>) -> Self {
        Self::new(ValueSpec::new(name, ValueType::String), Payload::String(s.into()))
    }

    /// An integer value named `name`.
    pub fn integer(name: impl Into<String>, i: i64) -> Self {
        Self::new(ValueSpec::new(name, ValueType::Integer), Payload::Integer(i))
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Same payload under another declaration (used when a value crosses a
    /// signature boundary, possibly under a new name).
    pub fn rebind(&self, spec: &ValueSpec) -> Value {
        Value {
            spec: spec.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// Ordered collection of named values.
///
/// Used as the "current values" accumulator of a sequential run: merging a
/// value whose name already exists replaces it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    values: Vec<Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or overwrite by name. The later value always wins.
    pub fn merge(&mut self, value: Value) {
        match self.values.iter_mut().find(|v| v.name() == value.name()) {
            Some(existing) => *existing = value,
            None => self.values.push(value),
        }
    }

    pub fn merge_all(&mut self, values: impl IntoIterator<Item = Value>) {
        for value in values {
            self.merge(value);
        }
    }

    /// Values matching `specs`, in `specs` order, re-bound to each spec.
    /// Names with no bound value are skipped.
    pub fn project(&self, specs: &[ValueSpec]) -> Vec<Value> {
        specs
            .iter()
            .filter_map(|spec| self.get(&spec.name).map(|v| v.rebind(spec)))
            .collect()
    }

    /// Names declared in `specs` that have no bound value.
    pub fn missing<'a>(&self, specs: &'a [ValueSpec]) -> Vec<&'a str> {
        specs
            .iter()
            .filter(|spec| !self.contains(&spec.name))
            .map(|spec| spec.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for ValueSet {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
