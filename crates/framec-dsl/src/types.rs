//! Literal type inference and strict value validation.
//!
//! Everything here is pure. Values are the literal text as written in the
//! source (strings already stripped of their quotes).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexer::{MAX_FLOAT_FRACTION_DIGITS, MAX_INT_DIGITS};

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid regex"));
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+\.\d+$").expect("valid regex"));

// ── ValueType ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    String,
    Int,
    Long,
    Float,
    Double,
    Boolean,
}

impl ValueType {
    pub const ALL: [ValueType; 6] = [
        ValueType::String,
        ValueType::Int,
        ValueType::Long,
        ValueType::Float,
        ValueType::Double,
        ValueType::Boolean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "STRING",
            ValueType::Int => "INT",
            ValueType::Long => "LONG",
            ValueType::Float => "FLOAT",
            ValueType::Double => "DOUBLE",
            ValueType::Boolean => "BOOLEAN",
        }
    }

    /// Whether a value of `self` may be described as `other`.
    ///
    /// Not symmetric: `INT` is compatible with `LONG` but not the reverse.
    pub fn is_compatible(self, other: ValueType) -> bool {
        self == other
            || matches!(
                (self, other),
                (ValueType::Int, ValueType::Long) | (ValueType::Float, ValueType::Double)
            )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type: {0}")]
pub struct UnknownType(pub String);

impl FromStr for ValueType {
    type Err = UnknownType;

    /// Case-insensitive: `int`, `Int` and `INT` all name [`ValueType::Int`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

// ── Inference ─────────────────────────────────────────────────────────────

fn is_integer(s: &str) -> bool {
    INTEGER.is_match(s)
}

fn is_decimal(s: &str) -> bool {
    DECIMAL.is_match(s)
}

fn digit_count(s: &str) -> usize {
    s.strip_prefix('-').unwrap_or(s).len()
}

/// Infer the type of a literal using the same shape rules as the lexer.
pub fn infer(value: &str) -> ValueType {
    let value = value.trim();

    if value == "true" || value == "false" {
        return ValueType::Boolean;
    }
    if is_integer(value) {
        return if digit_count(value) > MAX_INT_DIGITS { ValueType::Long } else { ValueType::Int };
    }
    if is_decimal(value) {
        let fraction = value.split_once('.').map(|(_, f)| f.len()).unwrap_or(0);
        return if fraction > MAX_FLOAT_FRACTION_DIGITS { ValueType::Double } else { ValueType::Float };
    }
    ValueType::String
}

// ── Validation ────────────────────────────────────────────────────────────

/// Check `value` against `expected`. No implicit widening: an integer literal
/// is not a valid `FLOAT`, and anything numeric or boolean is not a `STRING`.
pub fn validate(value: &str, expected: ValueType) -> Result<(), String> {
    let value = value.trim();

    match expected {
        ValueType::Boolean => {
            if value != "true" && value != "false" {
                return Err(format!("'{value}' is not a valid boolean. Expected 'true' or 'false'"));
            }
        }
        ValueType::Int => {
            if !is_integer(value) {
                return Err(format!("'{value}' is not a valid integer"));
            }
            if value.parse::<i32>().is_err() {
                return Err(format!("'{value}' is out of range for INT. Consider using LONG"));
            }
            if digit_count(value) > MAX_INT_DIGITS {
                return Err(format!(
                    "'{value}' might be too large for INT (max {MAX_INT_DIGITS} digits). Consider using LONG"
                ));
            }
        }
        ValueType::Long => {
            if !is_integer(value) {
                return Err(format!("'{value}' is not a valid integer"));
            }
            if value.parse::<i64>().is_err() {
                return Err(format!("'{value}' is out of range for LONG"));
            }
        }
        ValueType::Float | ValueType::Double => {
            let name = expected.name();
            if !is_decimal(value) {
                if is_integer(value) {
                    return Err(format!(
                        "'{value}' is an integer. {name} requires decimal point (e.g., {value}.0)"
                    ));
                }
                return Err(format!("'{value}' is not a valid {name} value. {name} requires decimal point"));
            }
            let finite = if expected == ValueType::Float {
                value.parse::<f32>().map(f32::is_finite).unwrap_or(false)
            } else {
                value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
            };
            if !finite {
                return Err(format!("'{value}' is out of range for {name}"));
            }
        }
        ValueType::String => {
            if is_integer(value) || is_decimal(value) {
                return Err(format!(
                    "'{value}' is a numeric value. Cannot assign to STRING type. Use quotes for string values"
                ));
            }
            if value == "true" || value == "false" {
                return Err(format!(
                    "'{value}' is a boolean literal. Cannot assign to STRING type. Use quotes for string values"
                ));
            }
        }
    }
    Ok(())
}
