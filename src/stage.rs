//! Pre-flight staging checks.
//!
//! Validation and projection may run in separate process invocations, so
//! the projection core re-validates file presence at the point of use; the
//! helpers here give those checks (and the pipeline's own pre-flight
//! passes over staged products) uniform error messages naming the file and
//! its role.
//!
//! [`ExtractionTools`] locates the external extraction executables this
//! crate stages inputs for. The directory is resolved once, at startup,
//! and injected into whatever component launches the tools; nothing here
//! reads process-wide environment state at call sites. Invoking the
//! executables is out of scope.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::PrepError;

/// Ensure a staged file exists, e.g.
/// `require_file(&dpp, "Drizzle prepare product")`.
pub fn require_file(path: &Path, what: &str) -> Result<(), PrepError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PrepError::missing(what, path))
    }
}

/// The directory holding the external extraction executables, plus the
/// executables a pipeline declares it needs.
#[derive(Debug, Clone)]
pub struct ExtractionTools {
    bin_dir: PathBuf,
    executables: Vec<String>,
}

impl ExtractionTools {
    pub fn new(
        bin_dir: impl Into<PathBuf>,
        executables: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            executables: executables.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve the directory from an environment variable, once at
    /// startup. An unset or empty variable is a configuration error.
    pub fn from_env(
        var: &str,
        executables: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, PrepError> {
        match env::var(var) {
            Ok(dir) if !dir.trim().is_empty() => Ok(Self::new(dir, executables)),
            _ => Err(PrepError::Configuration(format!(
                "The environment variable {var} must name the extraction executable directory!"
            ))),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Full path of a named executable; fails if it is not present.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, PrepError> {
        let path = self.bin_dir.join(name);
        require_file(&path, "Extraction executable")?;
        Ok(path)
    }

    /// Verify that every declared executable is present.
    pub fn verify(&self) -> Result<(), PrepError> {
        for name in &self.executables {
            self.resolve(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn require_file_names_role_and_path() {
        let err = require_file(Path::new("missing.dpp"), "Drizzle prepare product")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Drizzle prepare product missing.dpp does not exist!"
        );
    }

    #[test]
    fn verify_reports_the_first_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trace_extract"), "").unwrap();

        let tools = ExtractionTools::new(dir.path(), ["trace_extract", "contam_model"]);
        let err = tools.verify().unwrap_err();
        assert!(err.to_string().contains("contam_model"), "{err}");

        assert!(tools.resolve("trace_extract").is_ok());
    }

    #[test]
    fn from_env_requires_the_variable() {
        let err =
            ExtractionTools::from_env("GRISMPREP_TEST_UNSET_BIN", ["x"]).unwrap_err();
        assert!(matches!(err, PrepError::Configuration(_)), "{err}");
    }
}
