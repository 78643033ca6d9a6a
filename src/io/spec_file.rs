//! Read/write specification JSON files.
//!
//! ```json
//! {
//!   "model_type": "rand_forest",
//!   "mode": "regression",
//!   "args": { "trees": 2000, "mtry": "tune()", "min_n": null },
//!   "engine_args": { "seed": 63233 }
//! }
//! ```
//!
//! `null` (or leaving a canonical argument out) means "engine default";
//! `"tune()"` is a placeholder.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::domain::{ArgValue, Mode, Value, is_placeholder_token};
use crate::error::AppError;
use crate::registry::Registry;
use crate::spec::ModelSpecification;

/// On-disk shape of a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecFile {
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub args: BTreeMap<String, Json>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub engine_args: BTreeMap<String, Json>,
}

impl SpecFile {
    pub fn from_spec(spec: &ModelSpecification) -> Self {
        Self {
            model_type: spec.model_type().to_string(),
            mode: Some(spec.mode()),
            args: spec
                .args()
                .map(|(name, value)| (name.to_string(), arg_to_json(value)))
                .collect(),
            engine_args: spec
                .engine_args()
                .iter()
                .map(|(name, value)| (name.clone(), arg_to_json(value)))
                .collect(),
        }
    }

    /// Build a specification, validating names against the registry catalog.
    pub fn to_spec(&self, registry: &Registry) -> Result<ModelSpecification, AppError> {
        let mut spec = registry.create(&self.model_type)?;
        if let Some(mode) = self.mode {
            spec = spec.with_mode(mode);
        }
        for (name, json) in &self.args {
            let value = json_to_arg(name, json)?;
            spec = spec.with_arg(name, value)?;
        }
        for (name, json) in &self.engine_args {
            let value = json_to_arg(name, json)?;
            spec = spec.with_engine_arg(name, value);
        }
        Ok(spec)
    }
}

/// Read a spec JSON file.
pub fn read_spec_json(path: &Path, registry: &Registry) -> Result<ModelSpecification, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open spec JSON '{}': {e}", path.display())))?;
    let raw: SpecFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid spec JSON: {e}")))?;
    raw.to_spec(registry)
}

/// Write a spec JSON file.
pub fn write_spec_json(path: &Path, spec: &ModelSpecification) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create spec JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &SpecFile::from_spec(spec))
        .map_err(|e| AppError::new(2, format!("Failed to write spec JSON: {e}")))?;
    Ok(())
}

fn arg_to_json(value: &ArgValue) -> Json {
    match value {
        ArgValue::UseDefault => Json::Null,
        ArgValue::Placeholder => Json::String(ArgValue::PLACEHOLDER_TOKEN.to_string()),
        ArgValue::Concrete(Value::Bool(v)) => Json::Bool(*v),
        ArgValue::Concrete(Value::Int(v)) => Json::from(*v),
        ArgValue::Concrete(Value::Float(v)) => Json::from(*v),
        ArgValue::Concrete(Value::Str(v)) => Json::String(v.clone()),
    }
}

fn json_to_arg(name: &str, json: &Json) -> Result<ArgValue, AppError> {
    let value = match json {
        Json::Null => return Ok(ArgValue::UseDefault),
        Json::String(s) if is_placeholder_token(s) => return Ok(ArgValue::Placeholder),
        Json::String(s) => Value::Str(s.clone()),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().ok_or_else(|| {
                AppError::new(2, format!("Argument `{name}` is not a representable number."))
            })?),
        },
        Json::Array(_) | Json::Object(_) => {
            return Err(AppError::new(
                2,
                format!("Argument `{name}` must be a scalar, \"tune()\" or null."),
            ));
        }
    };
    Ok(ArgValue::Concrete(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::with_builtin_engines().unwrap()
    }

    fn parse(text: &str) -> Result<ModelSpecification, AppError> {
        let raw: SpecFile = serde_json::from_str(text).map_err(|e| AppError::new(2, e.to_string()))?;
        raw.to_spec(&registry())
    }

    #[test]
    fn reads_placeholders_defaults_and_scalars() {
        let spec = parse(
            r#"{"model_type":"rand_forest","mode":"classification",
                "args":{"trees":2000,"mtry":"tune()","min_n":null},
                "engine_args":{"seed":63233,"replace":false,"sample.fraction":"varying()"}}"#,
        )
        .unwrap();
        assert_eq!(spec.mode(), Mode::Classification);
        assert_eq!(spec.arg("trees"), Some(&ArgValue::Concrete(Value::Int(2000))));
        assert_eq!(spec.arg("mtry"), Some(&ArgValue::Placeholder));
        assert_eq!(spec.arg("min_n"), Some(&ArgValue::UseDefault));
        assert_eq!(spec.engine_arg("replace"), Some(&ArgValue::Concrete(Value::Bool(false))));
        assert_eq!(spec.engine_arg("sample.fraction"), Some(&ArgValue::Placeholder));
    }

    #[test]
    fn missing_mode_uses_catalog_default() {
        let spec = parse(r#"{"model_type":"linear_reg","args":{"penalty":0.5}}"#).unwrap();
        assert_eq!(spec.mode(), Mode::Regression);
        assert_eq!(spec.arg("penalty"), Some(&ArgValue::Concrete(Value::Float(0.5))));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = parse(r#"{"model_type":"rand_forest","args":{"depth":3}}"#).unwrap_err();
        assert!(err.to_string().contains("depth"));
        let err = parse(r#"{"model_type":"svm","args":{}}"#).unwrap_err();
        assert!(err.to_string().contains("svm"));
        let err = parse(r#"{"model_type":"rand_forest","args":{"trees":[1,2]}}"#).unwrap_err();
        assert!(err.to_string().contains("scalar"));
    }

    #[test]
    fn file_form_survives_a_write_and_read() {
        let registry = registry();
        let spec = registry
            .create("rand_forest")
            .unwrap()
            .with_mode(Mode::Regression)
            .with_arg("trees", 300)
            .unwrap()
            .with_arg("mtry", ArgValue::Placeholder)
            .unwrap()
            .with_engine_arg("sample.fraction", 0.5);
        let text = serde_json::to_string(&SpecFile::from_spec(&spec)).unwrap();
        assert!(text.contains(r#""mtry":"tune()""#));
        assert!(text.contains(r#""min_n":null"#));
        assert_eq!(parse(&text).unwrap(), spec);
    }
}
