//! Adapter construction with parameter validation.

use crate::classifier::adapter::ClassifierAdapter;
use crate::classifier::params::Parameters;
use crate::error::{BenchError, Result};

/// Builds [`ClassifierAdapter`]s by backend name.
pub trait AdapterFactory: Send + Sync {
    /// Names of every backend this factory can build.
    fn backends(&self) -> Vec<&'static str>;

    /// Parameter names accepted by `backend`.
    ///
    /// Fails with a configuration error when the backend is unknown.
    fn accepted_parameters(&self, backend: &str) -> Result<&'static [&'static str]>;

    /// Construct the adapter without validating parameter names.
    ///
    /// Must not perform any network call.
    fn construct(
        &self,
        backend: &str,
        language: &str,
        params: &Parameters,
    ) -> Result<Box<dyn ClassifierAdapter>>;

    /// Validate `params` against the backend's accepted set, then construct.
    fn build(
        &self,
        backend: &str,
        language: &str,
        params: &Parameters,
    ) -> Result<Box<dyn ClassifierAdapter>> {
        let accepted = self.accepted_parameters(backend)?;
        check_parameters(backend, accepted, params)?;
        self.construct(backend, language, params)
    }
}

/// Reject any parameter name absent from `accepted`.
pub fn check_parameters(backend: &str, accepted: &[&str], params: &Parameters) -> Result<()> {
    for name in params.keys() {
        if !accepted.contains(&name.as_str()) {
            return Err(BenchError::config(
                "params",
                format!("'{name}' is not a parameter of {backend}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ParamValue;

    #[test]
    fn test_check_parameters() {
        let mut params = Parameters::new();
        params.insert("strictness".to_string(), ParamValue::Integer(50));

        assert!(check_parameters("recast", &["strictness"], &params).is_ok());

        let err = check_parameters("apiai", &[], &params).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("'strictness' is not a parameter of apiai"));
    }

    #[test]
    fn test_empty_parameters_always_pass() {
        assert!(check_parameters("luis", &[], &Parameters::new()).is_ok());
    }
}
