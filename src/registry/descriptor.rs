//! Model-type definitions and backend descriptors.
//!
//! A [`ModelDefinition`] is the catalog entry for a model type: its canonical
//! argument names and defaults. A [`BackendDescriptor`] says how one engine
//! spells those arguments, which extra native arguments it takes, which modes
//! it serves, and how to call it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::data::Dataset;
use crate::domain::{Mode, NativeArgs};
use crate::models::FittedModel;

/// Everything a backend's fit callable receives.
#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    pub native_args: &'a NativeArgs,
    pub mode: Mode,
    pub data: &'a Dataset,
}

/// A backend's fit entry point.
pub type FitFn = Arc<dyn Fn(&FitRequest<'_>) -> anyhow::Result<Box<dyn FittedModel>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub model_type: String,
    /// Human-readable name used in reports, e.g. "Random Forest".
    pub title: String,
    pub canonical_args: Vec<String>,
    pub default_mode: Mode,
    pub default_engine: Option<String>,
}

impl ModelDefinition {
    pub fn new<I, S>(model_type: &str, title: &str, canonical_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model_type: model_type.to_string(),
            title: title.to_string(),
            canonical_args: canonical_args.into_iter().map(Into::into).collect(),
            default_mode: Mode::Unset,
            default_engine: None,
        }
    }

    pub fn default_mode(mut self, mode: Mode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn default_engine(mut self, engine: &str) -> Self {
        self.default_engine = Some(engine.to_string());
        self
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.canonical_args.iter().any(|a| a == name)
    }
}

#[derive(Clone)]
pub struct BackendDescriptor {
    pub engine: String,
    pub model_type: String,
    pub supported_modes: BTreeSet<Mode>,
    /// Canonical argument name → this engine's native name.
    pub arg_name_map: BTreeMap<String, String>,
    /// Native names accepted as engine arguments.
    pub valid_native_args: BTreeSet<String>,
    pub fit_fn: FitFn,
}

impl BackendDescriptor {
    pub fn new<F>(model_type: &str, engine: &str, fit_fn: F) -> Self
    where
        F: Fn(&FitRequest<'_>) -> anyhow::Result<Box<dyn FittedModel>> + Send + Sync + 'static,
    {
        Self {
            engine: engine.to_string(),
            model_type: model_type.to_string(),
            supported_modes: BTreeSet::new(),
            arg_name_map: BTreeMap::new(),
            valid_native_args: BTreeSet::new(),
            fit_fn: Arc::new(fit_fn),
        }
    }

    pub fn modes(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        self.supported_modes.extend(modes);
        self
    }

    pub fn map_arg(mut self, canonical: &str, native: &str) -> Self {
        self.arg_name_map.insert(canonical.to_string(), native.to_string());
        self
    }

    pub fn native_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_native_args.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn supports_mode(&self, mode: Mode) -> bool {
        mode != Mode::Unset && self.supported_modes.contains(&mode)
    }

    pub fn native_name(&self, canonical: &str) -> Option<&str> {
        self.arg_name_map.get(canonical).map(String::as_str)
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("engine", &self.engine)
            .field("model_type", &self.model_type)
            .field("supported_modes", &self.supported_modes)
            .field("arg_name_map", &self.arg_name_map)
            .field("valid_native_args", &self.valid_native_args)
            .finish_non_exhaustive()
    }
}
