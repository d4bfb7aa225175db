//! # Variant
//!
//! Closed set of values an item role can hold.
//!
//! Two variants are *compatible* when both are empty or both hold the same
//! kind. Role assignments must stay compatible with the current value unless
//! the current value is empty, so the first write fixes the kind of a role.
//! Assigning the empty variant resets a role to that initial state.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    FloatArray(Vec<f64>),
}

/// Discriminant of a [`Variant`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Empty,
    Bool,
    Int,
    Float,
    String,
    FloatArray,
}

impl VariantKind {
    pub fn name(self) -> &'static str {
        match self {
            VariantKind::Empty => "empty",
            VariantKind::Bool => "bool",
            VariantKind::Int => "int",
            VariantKind::Float => "float",
            VariantKind::String => "string",
            VariantKind::FloatArray => "float_array",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "empty" => Some(VariantKind::Empty),
            "bool" => Some(VariantKind::Bool),
            "int" => Some(VariantKind::Int),
            "float" => Some(VariantKind::Float),
            "string" => Some(VariantKind::String),
            "float_array" => Some(VariantKind::FloatArray),
            _ => None,
        }
    }
}

impl Variant {
    pub fn kind(&self) -> VariantKind {
        match self {
            Variant::Empty => VariantKind::Empty,
            Variant::Bool(_) => VariantKind::Bool,
            Variant::Int(_) => VariantKind::Int,
            Variant::Float(_) => VariantKind::Float,
            Variant::String(_) => VariantKind::String,
            Variant::FloatArray(_) => VariantKind::FloatArray,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// Both empty, or both holding the same kind
    pub fn is_compatible(&self, other: &Variant) -> bool {
        self.kind() == other.kind()
    }

    /// Whether `self` may replace `current` in a role
    pub fn can_replace(&self, current: &Variant) -> bool {
        self.is_empty() || current.is_empty() || self.is_compatible(current)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Variant::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float_array(&self) -> Option<&[f64]> {
        match self {
            Variant::FloatArray(v) => Some(v),
            _ => None,
        }
    }

    /// Render the payload as text, the inverse of [`Variant::parse`]
    pub fn to_text(&self) -> String {
        match self {
            Variant::Empty => String::new(),
            Variant::Bool(v) => v.to_string(),
            Variant::Int(v) => v.to_string(),
            Variant::Float(v) => v.to_string(),
            Variant::String(v) => v.clone(),
            Variant::FloatArray(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Rebuild a variant of `kind` from its text form
    pub fn parse(kind: VariantKind, text: &str) -> Option<Variant> {
        match kind {
            VariantKind::Empty => Some(Variant::Empty),
            VariantKind::Bool => text.parse().ok().map(Variant::Bool),
            VariantKind::Int => text.parse().ok().map(Variant::Int),
            VariantKind::Float => text.parse().ok().map(Variant::Float),
            VariantKind::String => Some(Variant::String(text.to_string())),
            VariantKind::FloatArray => {
                if text.is_empty() {
                    return Some(Variant::FloatArray(Vec::new()));
                }
                text.split(',')
                    .map(|part| part.trim().parse::<f64>().ok())
                    .collect::<Option<Vec<_>>>()
                    .map(Variant::FloatArray)
            }
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => write!(f, "<empty>"),
            Variant::FloatArray(_) => write!(f, "[{}]", self.to_text()),
            _ => write!(f, "{}", self.to_text()),
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int(v as i64)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Float(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

impl From<Vec<f64>> for Variant {
    fn from(v: Vec<f64>) -> Self {
        Variant::FloatArray(v)
    }
}
