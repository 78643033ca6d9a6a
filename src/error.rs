use thiserror::Error;

use crate::domain::Mode;

/// Errors raised while building, finalizing, or fitting a model specification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpecError {
    #[error("unknown model type '{0}'")]
    UnknownModelType(String),

    #[error("no engine '{engine}' is registered for model type '{model_type}'")]
    UnknownEngine { model_type: String, engine: String },

    #[error("'{name}' is not an argument of model type '{model_type}'")]
    UnknownArgument { model_type: String, name: String },

    #[error("engine '{engine}' for '{model_type}' does not support mode '{mode}'")]
    UnsupportedMode {
        model_type: String,
        engine: String,
        mode: Mode,
    },

    #[error("specification has varying parameters: {}", fields.join(", "))]
    HasVaryingParameters { fields: Vec<String> },

    #[error("argument '{argument}' is not supported by engine '{engine}'")]
    UnsupportedArgumentForEngine { argument: String, engine: String },

    #[error("engine '{engine}' failed: {message}")]
    BackendExecutionError { engine: String, message: String },
}

impl SpecError {
    /// Exit code used when this error ends the `unifit` process.
    pub fn exit_code(&self) -> u8 {
        match self {
            SpecError::HasVaryingParameters { .. } => 3,
            SpecError::BackendExecutionError { .. } => 4,
            _ => 2,
        }
    }
}

/// Error type at the application boundary: a message plus a process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SpecError> for AppError {
    fn from(err: SpecError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varying_error_lists_fields() {
        let err = SpecError::HasVaryingParameters {
            fields: vec!["mtry".into(), "seed".into()],
        };
        assert_eq!(err.to_string(), "specification has varying parameters: mtry, seed");
        assert_eq!(AppError::from(err).exit_code(), 3);
    }

    #[test]
    fn backend_failures_map_to_exit_code_4() {
        let err = SpecError::BackendExecutionError {
            engine: "glmnet".into(),
            message: "lambda is required".into(),
        };
        let app = AppError::from(err);
        assert_eq!(app.exit_code(), 4);
        assert_eq!(app.to_string(), "engine 'glmnet' failed: lambda is required");
    }
}
