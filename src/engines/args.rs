//! Typed access to a backend's native arguments.

use anyhow::{anyhow, bail};

use crate::domain::{NativeArgs, Value};

/// Read-only view over finalized native arguments with typed getters.
///
/// Getters return `Ok(None)` when the argument is absent and an error naming
/// the argument when it is present with the wrong type or range.
#[derive(Debug, Clone, Copy)]
pub struct NativeArgReader<'a> {
    engine: &'a str,
    args: &'a NativeArgs,
}

impl<'a> NativeArgReader<'a> {
    pub fn new(engine: &'a str, args: &'a NativeArgs) -> Self {
        Self { engine, args }
    }

    pub fn usize(&self, name: &str) -> anyhow::Result<Option<usize>> {
        let Some(value) = self.args.get(name) else {
            return Ok(None);
        };
        let n = value
            .as_i64()
            .ok_or_else(|| self.wrong_type(name, "an integer", value))?;
        let n = usize::try_from(n)
            .map_err(|_| anyhow!("{}: '{name}' must not be negative, got {n}", self.engine))?;
        Ok(Some(n))
    }

    /// Like [`usize`](Self::usize), with an inclusive upper bound.
    pub fn usize_at_most(&self, name: &str, max: usize) -> anyhow::Result<Option<usize>> {
        match self.usize(name)? {
            Some(n) if n > max => bail!("{}: '{name}' must be at most {max}, got {n}", self.engine),
            other => Ok(other),
        }
    }

    pub fn u64(&self, name: &str) -> anyhow::Result<Option<u64>> {
        Ok(self.usize(name)?.map(|n| n as u64))
    }

    pub fn f64(&self, name: &str) -> anyhow::Result<Option<f64>> {
        match self.args.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "a number", value)),
        }
    }

    pub fn bool(&self, name: &str) -> anyhow::Result<Option<bool>> {
        match self.args.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "a boolean", value)),
        }
    }

    /// Like [`f64`](Self::f64), but absence is an error.
    pub fn required_f64(&self, name: &str) -> anyhow::Result<f64> {
        match self.f64(name)? {
            Some(v) => Ok(v),
            None => bail!("{}: argument '{name}' is required", self.engine),
        }
    }

    fn wrong_type(&self, name: &str, expected: &str, got: &Value) -> anyhow::Error {
        anyhow!(
            "{}: '{name}' must be {expected}, got {} {got}",
            self.engine,
            got.type_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, Value)]) -> NativeArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn absent_arguments_read_as_none() {
        let native = NativeArgs::new();
        let reader = NativeArgReader::new("ranger", &native);
        assert_eq!(reader.usize("num.trees").unwrap(), None);
        assert_eq!(reader.bool("replace").unwrap(), None);
    }

    #[test]
    fn integers_and_whole_floats_read_as_counts() {
        let native = args(&[("ntree", Value::Int(200)), ("nodesize", Value::Float(3.0))]);
        let reader = NativeArgReader::new("randomForest", &native);
        assert_eq!(reader.usize("ntree").unwrap(), Some(200));
        assert_eq!(reader.usize("nodesize").unwrap(), Some(3));
    }

    #[test]
    fn wrong_types_name_the_argument() {
        let native = args(&[
            ("mtry", Value::Str("all".into())),
            ("num.trees", Value::Int(-5)),
            ("replace", Value::Int(1)),
        ]);
        let reader = NativeArgReader::new("ranger", &native);
        let err = reader.usize("mtry").unwrap_err().to_string();
        assert!(err.contains("'mtry'") && err.contains("integer"), "{err}");
        assert!(reader.usize("num.trees").unwrap_err().to_string().contains("negative"));
        assert!(reader.bool("replace").is_err());
    }

    #[test]
    fn bounded_counts_name_the_argument() {
        let native = args(&[("num.trees", Value::Int(i64::MAX)), ("mtry", Value::Int(3))]);
        let reader = NativeArgReader::new("ranger", &native);
        assert_eq!(reader.usize_at_most("mtry", 3).unwrap(), Some(3));
        let err = reader.usize_at_most("num.trees", 1000).unwrap_err().to_string();
        assert!(err.contains("'num.trees'") && err.contains("at most 1000"), "{err}");
    }

    #[test]
    fn required_argument_must_be_present() {
        let native = args(&[("alpha", Value::Float(0.5))]);
        let reader = NativeArgReader::new("glmnet", &native);
        assert_eq!(reader.required_f64("alpha").unwrap(), 0.5);
        let err = reader.required_f64("lambda").unwrap_err().to_string();
        assert_eq!(err, "glmnet: argument 'lambda' is required");
    }
}
