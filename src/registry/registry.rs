//! The backend registry.
//!
//! Built once at start-up (single-threaded), then shared read-only: lookups
//! take `&self`, so a `Registry` behind an `Arc` or a plain reference can
//! serve any number of concurrent finalize/fit calls.

use std::collections::BTreeMap;

use crate::error::SpecError;
use crate::registry::{BackendDescriptor, ModelDefinition};
use crate::spec::ModelSpecification;

#[derive(Debug, Default)]
pub struct Registry {
    models: BTreeMap<String, ModelDefinition>,
    /// model type → engine name → descriptor
    backends: BTreeMap<String, BTreeMap<String, BackendDescriptor>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in model catalog and engines.
    pub fn with_builtin_engines() -> Result<Self, SpecError> {
        let mut registry = Self::new();
        crate::engines::register_builtin(&mut registry)?;
        Ok(registry)
    }

    /// Add a model type to the catalog, replacing any previous definition.
    ///
    /// A replacement is refused when an engine already registered for the
    /// type maps an argument the new definition no longer has.
    pub fn register_model(&mut self, definition: ModelDefinition) -> Result<(), SpecError> {
        log::debug!(
            "registering model type '{}' ({} canonical args)",
            definition.model_type,
            definition.canonical_args.len()
        );
        if let Some(engines) = self.backends.get(&definition.model_type) {
            let stale = engines.values().find_map(|desc| {
                desc.arg_name_map
                    .keys()
                    .find(|name| !definition.is_canonical(name))
            });
            if let Some(name) = stale {
                return Err(SpecError::UnknownArgument {
                    model_type: definition.model_type.clone(),
                    name: name.clone(),
                });
            }
        }
        if self
            .models
            .insert(definition.model_type.clone(), definition)
            .is_some()
        {
            log::debug!("model type definition replaced");
        }
        Ok(())
    }

    /// Add or replace the descriptor for `(model_type, engine)`.
    ///
    /// The model type must already be in the catalog and every key of the
    /// descriptor's argument map must be one of its canonical arguments.
    pub fn register(&mut self, descriptor: BackendDescriptor) -> Result<(), SpecError> {
        let definition = self.model(&descriptor.model_type)?;
        if let Some(bad) = descriptor
            .arg_name_map
            .keys()
            .find(|name| !definition.is_canonical(name))
        {
            return Err(SpecError::UnknownArgument {
                model_type: descriptor.model_type.clone(),
                name: bad.clone(),
            });
        }

        let engines = self.backends.entry(descriptor.model_type.clone()).or_default();
        let key = descriptor.engine.clone();
        if engines.insert(key.clone(), descriptor).is_some() {
            log::debug!("replaced engine '{key}'");
        } else {
            log::debug!("registered engine '{key}'");
        }
        Ok(())
    }

    /// Descriptor for `(model_type, engine)`.
    pub fn lookup(&self, model_type: &str, engine: &str) -> Result<&BackendDescriptor, SpecError> {
        self.backends
            .get(model_type)
            .and_then(|engines| engines.get(engine))
            .ok_or_else(|| SpecError::UnknownEngine {
                model_type: model_type.to_string(),
                engine: engine.to_string(),
            })
    }

    pub fn model(&self, model_type: &str) -> Result<&ModelDefinition, SpecError> {
        self.models
            .get(model_type)
            .ok_or_else(|| SpecError::UnknownModelType(model_type.to_string()))
    }

    /// Catalog entries in model-type order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }

    /// Engines registered for `model_type`, in name order.
    pub fn engines(&self, model_type: &str) -> Vec<&BackendDescriptor> {
        self.backends
            .get(model_type)
            .map(|engines| engines.values().collect())
            .unwrap_or_default()
    }

    /// A fresh specification with every canonical argument at its default.
    pub fn create(&self, model_type: &str) -> Result<ModelSpecification, SpecError> {
        let definition = self.model(model_type)?;
        Ok(ModelSpecification::new(
            &definition.model_type,
            &definition.canonical_args,
            definition.default_mode,
        ))
    }

    /// Engine used when the caller does not name one: the catalog default,
    /// else the only registered engine.
    pub fn default_engine(&self, model_type: &str) -> Option<&str> {
        if let Some(engine) = self
            .models
            .get(model_type)
            .and_then(|d| d.default_engine.as_deref())
        {
            return Some(engine);
        }
        match self.engines(model_type).as_slice() {
            [only] => Some(only.engine.as_str()),
            _ => None,
        }
    }
}
