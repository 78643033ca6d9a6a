//! Translation of a specification into one engine's native call.

use serde::Serialize;

use crate::domain::{Mode, NativeArgs};
use crate::error::SpecError;
use crate::registry::Registry;
use crate::spec::ModelSpecification;
use crate::spec::varying::ensure_resolved;

/// A validated, engine-native call: what the dispatcher hands to `fit_fn`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedInvocation {
    pub model_type: String,
    pub engine: String,
    pub mode: Mode,
    pub native_args: NativeArgs,
}

/// Validate `spec` against `engine` and translate its arguments.
///
/// Checks run in a fixed order: placeholders, engine lookup, mode, canonical
/// arguments, engine arguments. The first failure is returned. When an engine
/// argument and a translated canonical argument land on the same native name,
/// the engine argument wins.
pub fn finalize(
    registry: &Registry,
    spec: &ModelSpecification,
    engine: &str,
) -> Result<FinalizedInvocation, SpecError> {
    ensure_resolved(spec)?;

    let descriptor = registry.lookup(spec.model_type(), engine)?;

    if !descriptor.supports_mode(spec.mode()) {
        return Err(SpecError::UnsupportedMode {
            model_type: spec.model_type().to_string(),
            engine: engine.to_string(),
            mode: spec.mode(),
        });
    }

    let mut native_args = NativeArgs::new();
    for (name, value) in spec.args() {
        let Some(value) = value.concrete() else {
            continue;
        };
        let Some(native) = descriptor.native_name(name) else {
            return Err(SpecError::UnsupportedArgumentForEngine {
                argument: name.to_string(),
                engine: engine.to_string(),
            });
        };
        log::trace!("{engine}: {name} -> {native} = {value}");
        native_args.insert(native.to_string(), value.clone());
    }

    for (name, value) in spec.engine_args() {
        if !descriptor.valid_native_args.contains(name) {
            return Err(SpecError::UnsupportedArgumentForEngine {
                argument: name.clone(),
                engine: engine.to_string(),
            });
        }
        // Resolved above, so every engine argument is concrete.
        if let Some(value) = value.concrete() {
            if let Some(previous) = native_args.insert(name.clone(), value.clone()) {
                log::trace!("{engine}: engine argument {name} = {value} overrides {previous}");
            } else {
                log::trace!("{engine}: {name} = {value}");
            }
        }
    }

    Ok(FinalizedInvocation {
        model_type: spec.model_type().to_string(),
        engine: engine.to_string(),
        mode: spec.mode(),
        native_args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArgValue, Value};

    fn registry() -> Registry {
        Registry::with_builtin_engines().unwrap()
    }

    fn forest(registry: &Registry) -> ModelSpecification {
        registry
            .create("rand_forest")
            .unwrap()
            .with_arg("trees", 2000)
            .unwrap()
            .with_mode(Mode::Regression)
    }

    #[test]
    fn trees_translate_per_engine() {
        let registry = registry();
        let spec = forest(&registry);

        let ranger = finalize(&registry, &spec, "ranger").unwrap();
        assert_eq!(ranger.native_args.get("num.trees"), Some(&Value::Int(2000)));
        assert_eq!(ranger.native_args.len(), 1);

        let rf = finalize(&registry, &spec, "randomForest").unwrap();
        assert_eq!(rf.native_args.get("ntree"), Some(&Value::Int(2000)));
        assert_eq!(rf.mode, Mode::Regression);
    }

    #[test]
    fn seed_is_ranger_only() {
        let registry = registry();
        let spec = forest(&registry).with_engine_arg("seed", 63233);

        let err = finalize(&registry, &spec, "randomForest").unwrap_err();
        assert_eq!(
            err,
            SpecError::UnsupportedArgumentForEngine {
                argument: "seed".into(),
                engine: "randomForest".into(),
            }
        );

        let ok = finalize(&registry, &spec, "ranger").unwrap();
        assert_eq!(ok.native_args.get("seed"), Some(&Value::Int(63233)));
    }

    #[test]
    fn placeholders_block_finalize_before_lookup() {
        let registry = registry();
        let spec = forest(&registry)
            .with_arg("mtry", ArgValue::Placeholder)
            .unwrap()
            .with_engine_arg("seed", ArgValue::Placeholder);
        // An unknown engine would also fail; placeholders are reported first.
        let err = finalize(&registry, &spec, "xgboost").unwrap_err();
        assert_eq!(
            err,
            SpecError::HasVaryingParameters {
                fields: vec!["mtry".into(), "seed".into()],
            }
        );
    }

    #[test]
    fn unset_mode_is_unsupported() {
        let registry = registry();
        let spec = registry.create("rand_forest").unwrap();
        let err = finalize(&registry, &spec, "ranger").unwrap_err();
        assert!(matches!(err, SpecError::UnsupportedMode { mode: Mode::Unset, .. }));

        let spec = spec.with_mode(Mode::CensoredRegression);
        assert!(matches!(
            finalize(&registry, &spec, "ranger"),
            Err(SpecError::UnsupportedMode { .. })
        ));
    }

    #[test]
    fn unknown_engine_is_reported() {
        let registry = registry();
        let err = finalize(&registry, &forest(&registry), "glmnet").unwrap_err();
        assert_eq!(
            err,
            SpecError::UnknownEngine {
                model_type: "rand_forest".into(),
                engine: "glmnet".into(),
            }
        );
    }

    #[test]
    fn canonical_argument_without_mapping_is_unsupported() {
        let registry = registry();
        let spec = registry.create("linear_reg").unwrap().with_arg("penalty", 0.1).unwrap();
        let err = finalize(&registry, &spec, "lm").unwrap_err();
        assert_eq!(
            err,
            SpecError::UnsupportedArgumentForEngine {
                argument: "penalty".into(),
                engine: "lm".into(),
            }
        );
        let ok = finalize(&registry, &spec, "glmnet").unwrap();
        assert_eq!(ok.native_args.get("lambda"), Some(&Value::Float(0.1)));
    }

    #[test]
    fn engine_argument_wins_collision() {
        let registry = registry();
        let spec = forest(&registry).with_engine_arg("num.trees", 10);
        let inv = finalize(&registry, &spec, "ranger").unwrap();
        assert_eq!(inv.native_args.get("num.trees"), Some(&Value::Int(10)));
    }

    #[test]
    fn defaults_are_left_to_the_engine() {
        let registry = registry();
        let spec = registry.create("linear_reg").unwrap();
        let inv = finalize(&registry, &spec, "lm").unwrap();
        assert!(inv.native_args.is_empty());
    }
}
