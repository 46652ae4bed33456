//! Error taxonomy for input staging and catalog projection.
//!
//! Every variant carries enough context (file path, frame, parameter) to
//! diagnose a failed batch without re-running at higher verbosity. All
//! errors are fatal under the default batch policy; none are transient.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    /// A caller-supplied parameter is malformed (margin term, tool
    /// directory, environment variable).
    #[error("{0}")]
    Configuration(String),

    /// A mosaic provenance entry could not be parsed into a frame
    /// descriptor.
    #[error("Malformed frame descriptor '{descriptor}': {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    /// A referenced image, catalog, or executable is absent.
    #[error("{what} {} does not exist!", path.display())]
    MissingFile { what: String, path: PathBuf },

    /// A WCS computation failed or no usable WCS solution is available.
    #[error("Transform failed for {context}: {reason}")]
    Transform { context: String, reason: String },

    /// A catalog violates the expected schema.
    #[error("Format error in catalog {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Underlying file I/O failure while reading or writing a catalog.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PrepError {
    /// A missing-file error naming the file's role, e.g.
    /// `PrepError::missing("Mosaic image", path)`.
    pub fn missing(what: &str, path: &Path) -> Self {
        Self::MissingFile {
            what: what.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn transform(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transform {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn format(path: &Path, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
