//! Immutable model specifications.
//!
//! A specification names a model type and a mode and carries one slot per
//! canonical argument, plus any engine-native extras. Every setter returns a
//! new specification; a spec handed to another thread or stored by a tuner is
//! never changed behind its back.

use std::collections::BTreeMap;

use crate::domain::{ArgValue, Mode};
use crate::error::SpecError;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpecification {
    model_type: String,
    mode: Mode,
    /// Canonical arguments in catalog order.
    args: Vec<(String, ArgValue)>,
    /// Engine-native extras; values are concrete or placeholders, never defaults.
    engine_args: BTreeMap<String, ArgValue>,
}

impl ModelSpecification {
    /// Start a specification with every canonical argument left to the engine default.
    ///
    /// Most callers go through [`crate::registry::Registry::create`], which
    /// supplies the canonical names and default mode from the model catalog.
    pub fn new<I, S>(model_type: impl Into<String>, canonical_args: I, mode: Mode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<(String, ArgValue)> = Vec::new();
        for name in canonical_args {
            let name = name.into();
            if !args.iter().any(|(n, _)| *n == name) {
                args.push((name, ArgValue::UseDefault));
            }
        }
        Self {
            model_type: model_type.into(),
            mode,
            args,
            engine_args: BTreeMap::new(),
        }
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Canonical arguments in catalog order.
    pub fn args(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.args.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn arg(&self, name: &str) -> Option<&ArgValue> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.arg(name).is_some()
    }

    pub fn engine_args(&self) -> &BTreeMap<String, ArgValue> {
        &self.engine_args
    }

    pub fn engine_arg(&self, name: &str) -> Option<&ArgValue> {
        self.engine_args.get(name)
    }

    /// Return a copy with canonical argument `name` set to `value`.
    ///
    /// Fails with [`SpecError::UnknownArgument`] when `name` is not a canonical
    /// argument of this model type. Whether an engine accepts it is checked
    /// later, by the finalizer.
    pub fn with_arg(&self, name: &str, value: impl Into<ArgValue>) -> Result<Self, SpecError> {
        let Some(idx) = self.args.iter().position(|(n, _)| n == name) else {
            return Err(SpecError::UnknownArgument {
                model_type: self.model_type.clone(),
                name: name.to_string(),
            });
        };
        let mut next = self.clone();
        next.args[idx].1 = value.into();
        Ok(next)
    }

    /// Return a copy with the given mode. Engine support is checked at finalize time.
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Return a copy with engine-native argument `name` set to `value`.
    ///
    /// Setting [`ArgValue::UseDefault`] removes the argument.
    pub fn with_engine_arg(&self, name: &str, value: impl Into<ArgValue>) -> Self {
        let mut next = self.clone();
        match value.into() {
            ArgValue::UseDefault => {
                next.engine_args.remove(name);
            }
            other => {
                next.engine_args.insert(name.to_string(), other);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    fn forest() -> ModelSpecification {
        ModelSpecification::new("rand_forest", ["mtry", "trees", "min_n"], Mode::Unset)
    }

    #[test]
    fn new_spec_defaults_every_argument() {
        let spec = forest();
        assert_eq!(spec.args().count(), 3);
        assert!(spec.args().all(|(_, v)| v.is_default()));
        assert!(spec.engine_args().is_empty());
        assert_eq!(spec.mode(), Mode::Unset);
    }

    #[test]
    fn with_arg_returns_new_value_and_leaves_original() {
        let base = forest();
        let set = base.with_arg("trees", 2000).unwrap();
        assert_eq!(set.arg("trees"), Some(&ArgValue::Concrete(Value::Int(2000))));
        assert_eq!(base.arg("trees"), Some(&ArgValue::UseDefault));
    }

    #[test]
    fn with_arg_rejects_unknown_names() {
        let err = forest().with_arg("bogus_name", 1).unwrap_err();
        assert_eq!(
            err,
            SpecError::UnknownArgument {
                model_type: "rand_forest".into(),
                name: "bogus_name".into(),
            }
        );
    }

    #[test]
    fn with_mode_always_succeeds() {
        let spec = forest().with_mode(Mode::Unsupervised);
        assert_eq!(spec.mode(), Mode::Unsupervised);
    }

    #[test]
    fn engine_arg_default_removes_entry() {
        let spec = forest().with_engine_arg("seed", 63233);
        assert!(spec.engine_arg("seed").is_some());
        let spec = spec.with_engine_arg("seed", ArgValue::UseDefault);
        assert!(spec.engine_arg("seed").is_none());
    }

    #[test]
    fn duplicate_canonical_names_collapse() {
        let spec = ModelSpecification::new("m", ["a", "a", "b"], Mode::Regression);
        let names: Vec<&str> = spec.args().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
