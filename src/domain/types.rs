//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - carried inside immutable model specifications
//! - printed by the CLI reports
//! - written to and read back from spec JSON files

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task category a model is configured for.
///
/// `Unset` is the starting mode of model types that can serve several tasks;
/// it must be replaced before a spec can be finalized.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Unset,
    Regression,
    Classification,
    CensoredRegression,
    Unsupervised,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Unset,
        Mode::Regression,
        Mode::Classification,
        Mode::CensoredRegression,
        Mode::Unsupervised,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Unset => "unset",
            Mode::Regression => "regression",
            Mode::Classification => "classification",
            Mode::CensoredRegression => "censored-regression",
            Mode::Unsupervised => "unsupervised",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete scalar argument value.
///
/// Serialized untagged, so a JSON `2000` is an `Int`, `0.5` a `Float`, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Parse a value from command-line text.
    ///
    /// Integers win over floats (`2000` is an `Int`); surrounding quotes force a string.
    pub fn parse(text: &str) -> Value {
        let text = text.trim();
        if let Some(inner) = strip_quotes(text) {
            return Value::Str(inner.to_string());
        }
        match text {
            "true" | "TRUE" => return Value::Bool(true),
            "false" | "FALSE" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(v) = text.parse::<i64>() {
            return Value::Int(v);
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => return Value::Float(v),
            _ => {}
        }
        Value::Str(text.to_string())
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; floats are accepted only when they hold a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            // `as` saturates, so out-of-range floats must not reach it.
            Value::Float(v)
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                Some(*v as i64)
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "number",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
        }
    }
}

fn strip_quotes(text: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Some(&text[1..text.len() - 1]);
        }
    }
    None
}

/// An argument slot in a model specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ArgValue {
    /// Leave the argument to the engine's own default.
    #[default]
    UseDefault,
    /// Deliberately unresolved; must be filled in before finalizing.
    Placeholder,
    Concrete(Value),
}

impl ArgValue {
    /// Text form of [`ArgValue::Placeholder`] on the command line and in spec files.
    pub const PLACEHOLDER_TOKEN: &'static str = "tune()";

    /// Parse command-line text: the placeholder token, or a concrete value.
    pub fn parse(text: &str) -> ArgValue {
        if is_placeholder_token(text) {
            ArgValue::Placeholder
        } else {
            ArgValue::Concrete(Value::parse(text))
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ArgValue::Placeholder)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ArgValue::UseDefault)
    }

    pub fn concrete(&self) -> Option<&Value> {
        match self {
            ArgValue::Concrete(v) => Some(v),
            _ => None,
        }
    }
}

/// `tune()` and the older `varying()` spelling both mark a placeholder.
pub fn is_placeholder_token(text: &str) -> bool {
    matches!(text.trim(), "tune()" | "varying()")
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::UseDefault => f.write_str("<default>"),
            ArgValue::Placeholder => f.write_str(Self::PLACEHOLDER_TOKEN),
            ArgValue::Concrete(v) => write!(f, "{v}"),
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        ArgValue::Concrete(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Concrete(Value::Int(i64::from(value)))
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Concrete(Value::Int(value))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Concrete(Value::Float(value))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Concrete(Value::Bool(value))
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Concrete(Value::Str(value.to_string()))
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Concrete(Value::Str(value))
    }
}

/// Engine-native argument name → concrete value, ordered for stable output.
pub type NativeArgs = BTreeMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefers_integers_then_floats() {
        assert_eq!(Value::parse("2000"), Value::Int(2000));
        assert_eq!(Value::parse("0.25"), Value::Float(0.25));
        assert_eq!(Value::parse("TRUE"), Value::Bool(true));
        assert_eq!(Value::parse("impurity"), Value::Str("impurity".into()));
        assert_eq!(Value::parse("'42'"), Value::Str("42".into()));
    }

    #[test]
    fn non_finite_numbers_stay_strings() {
        assert_eq!(Value::parse("nan"), Value::Str("nan".into()));
        assert_eq!(Value::parse("inf"), Value::Str("inf".into()));
        assert_eq!(Value::parse("-Infinity"), Value::Str("-Infinity".into()));
        assert_eq!(Value::parse("1e400"), Value::Str("1e400".into()));
    }

    #[test]
    fn placeholder_tokens_parse_to_placeholder() {
        assert_eq!(ArgValue::parse("tune()"), ArgValue::Placeholder);
        assert_eq!(ArgValue::parse(" varying() "), ArgValue::Placeholder);
        assert_eq!(ArgValue::parse("7"), ArgValue::Concrete(Value::Int(7)));
    }

    #[test]
    fn as_i64_accepts_whole_floats_only() {
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::Float(1e300).as_i64(), None);
        assert_eq!(Value::Float(-1e19).as_i64(), None);
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
        assert_eq!(Value::Str("3".into()).as_i64(), None);
    }

    #[test]
    fn mode_names_match_cli_spelling() {
        for mode in Mode::ALL {
            let parsed = Mode::from_str(mode.as_str(), false).unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn value_json_is_untagged() {
        let v: Value = serde_json::from_str("2000").unwrap();
        assert_eq!(v, Value::Int(2000));
        let v: Value = serde_json::from_str("0.5").unwrap();
        assert_eq!(v, Value::Float(0.5));
        assert_eq!(serde_json::to_string(&Value::Str("x".into())).unwrap(), "\"x\"");
    }
}
