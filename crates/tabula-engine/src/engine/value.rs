//! Evaluated cell values and their display formatting.

use rhai::Dynamic;
use serde::{Deserialize, Serialize};

/// Result of evaluating a cell: a number or a string, never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Number(0.0)
    }
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s),
        }
    }

    /// Convert into a Rhai value for binding into an evaluation scope.
    pub fn to_dynamic(&self) -> Dynamic {
        match self {
            Value::Number(n) => Dynamic::from_float(*n),
            Value::Text(s) => Dynamic::from(s.clone()),
        }
    }

    /// Convert a Rhai result into a cell value.
    /// Booleans become 1/0; unit becomes 0. Arrays and maps are rejected.
    pub fn from_dynamic(value: Dynamic) -> Option<Value> {
        if value.is_unit() {
            Some(Value::Number(0.0))
        } else if let Ok(n) = value.as_float() {
            Some(Value::Number(n))
        } else if let Ok(n) = value.as_int() {
            Some(Value::Number(n as f64))
        } else if let Ok(b) = value.as_bool() {
            Some(Value::Number(if b { 1.0 } else { 0.0 }))
        } else if let Ok(c) = value.as_char() {
            Some(Value::Text(c.to_string()))
        } else if value.is_string() {
            value.into_string().ok().map(Value::Text)
        } else {
            None
        }
    }

    /// Format for display with the given number of decimals.
    pub fn display(&self, precision: usize) -> String {
        match self {
            Value::Number(n) => format_number(*n, precision),
            Value::Text(s) => s.clone(),
        }
    }
}

/// Format a number for display.
pub fn format_number(n: f64, precision: usize) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{:.*}", precision, n)
    }
}
