//! Placeholder ("varying") detection and substitution.
//!
//! A spec with any placeholder left in a canonical or engine argument is not
//! resolved; the finalizer and the dispatcher both refuse it. Filling the
//! placeholders in is the job of whatever searches over candidate values; this
//! module only gives that search a single call to do it with.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{ArgValue, Value};
use crate::error::SpecError;
use crate::spec::ModelSpecification;

/// True iff no canonical or engine argument holds a placeholder.
pub fn is_resolved(spec: &ModelSpecification) -> bool {
    !spec.args().any(|(_, v)| v.is_placeholder())
        && !spec.engine_args().values().any(ArgValue::is_placeholder)
}

/// Names of all arguments (canonical and engine) still holding a placeholder.
pub fn unresolved_fields(spec: &ModelSpecification) -> BTreeSet<String> {
    let canonical = spec
        .args()
        .filter(|(_, v)| v.is_placeholder())
        .map(|(name, _)| name.to_string());
    let engine = spec
        .engine_args()
        .iter()
        .filter(|(_, v)| v.is_placeholder())
        .map(|(name, _)| name.clone());
    canonical.chain(engine).collect()
}

/// The error the finalizer and dispatcher raise for an unresolved spec, if any.
pub(crate) fn ensure_resolved(spec: &ModelSpecification) -> Result<(), SpecError> {
    let fields = unresolved_fields(spec);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(SpecError::HasVaryingParameters {
            fields: fields.into_iter().collect(),
        })
    }
}

/// Replace placeholders with concrete values.
///
/// Every key of `values` must name a field that is currently a placeholder;
/// anything else fails with [`SpecError::UnknownArgument`]. A name that is
/// both a canonical and an engine placeholder fills both. Placeholders not
/// named in `values` are left as they are.
pub fn fill_placeholders(
    spec: &ModelSpecification,
    values: &BTreeMap<String, Value>,
) -> Result<ModelSpecification, SpecError> {
    let mut next = spec.clone();
    for (name, value) in values {
        let mut filled = false;
        if spec.arg(name).is_some_and(ArgValue::is_placeholder) {
            next = next.with_arg(name, value.clone())?;
            filled = true;
        }
        if spec.engine_arg(name).is_some_and(ArgValue::is_placeholder) {
            next = next.with_engine_arg(name, value.clone());
            filled = true;
        }
        if !filled {
            return Err(SpecError::UnknownArgument {
                model_type: spec.model_type().to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mode;

    fn spec() -> ModelSpecification {
        ModelSpecification::new("rand_forest", ["mtry", "trees", "min_n"], Mode::Regression)
    }

    #[test]
    fn fresh_spec_is_resolved() {
        assert!(is_resolved(&spec()));
        assert!(unresolved_fields(&spec()).is_empty());
    }

    #[test]
    fn placeholders_in_both_maps_are_reported() {
        let s = spec()
            .with_arg("mtry", ArgValue::Placeholder)
            .unwrap()
            .with_arg("trees", 500)
            .unwrap()
            .with_engine_arg("sample.fraction", ArgValue::Placeholder);
        assert!(!is_resolved(&s));
        let fields: Vec<String> = unresolved_fields(&s).into_iter().collect();
        assert_eq!(fields, ["mtry", "sample.fraction"]);

        let err = ensure_resolved(&s).unwrap_err();
        assert_eq!(
            err,
            SpecError::HasVaryingParameters {
                fields: vec!["mtry".into(), "sample.fraction".into()],
            }
        );
    }

    #[test]
    fn fill_placeholders_resolves_named_fields() {
        let s = spec()
            .with_arg("mtry", ArgValue::Placeholder)
            .unwrap()
            .with_engine_arg("seed", ArgValue::Placeholder);
        let values = BTreeMap::from([
            ("mtry".to_string(), Value::Int(3)),
            ("seed".to_string(), Value::Int(11)),
        ]);
        let filled = fill_placeholders(&s, &values).unwrap();
        assert!(is_resolved(&filled));
        assert_eq!(filled.arg("mtry"), Some(&ArgValue::Concrete(Value::Int(3))));
        assert_eq!(filled.engine_arg("seed"), Some(&ArgValue::Concrete(Value::Int(11))));
    }

    #[test]
    fn fill_placeholders_rejects_fields_that_are_not_placeholders() {
        let s = spec().with_arg("mtry", ArgValue::Placeholder).unwrap();
        let values = BTreeMap::from([("trees".to_string(), Value::Int(10))]);
        let err = fill_placeholders(&s, &values).unwrap_err();
        assert!(matches!(err, SpecError::UnknownArgument { ref name, .. } if name == "trees"));
    }

    #[test]
    fn partial_fill_leaves_other_placeholders() {
        let s = spec()
            .with_arg("mtry", ArgValue::Placeholder)
            .unwrap()
            .with_arg("min_n", ArgValue::Placeholder)
            .unwrap();
        let values = BTreeMap::from([("mtry".to_string(), Value::Int(2))]);
        let filled = fill_placeholders(&s, &values).unwrap();
        let left: Vec<String> = unresolved_fields(&filled).into_iter().collect();
        assert_eq!(left, ["min_n"]);
    }
}
