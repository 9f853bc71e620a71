//! Application error types using thiserror
//!
//! Error hierarchy:
//! - SpecError: Invalid compatibility spec configuration or loading failures
//! - WheelError: Wheel filename/tag parsing and metadata extraction failures
//! - ResolveError: Wheel resolution and package index communication failures
//! - ProjectError: chubproject.toml configuration failures
//! - BundleError: Archive assembly and manifest validation failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Compatibility spec related errors
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Wheel parsing related errors
    #[error(transparent)]
    Wheel(#[from] WheelError),

    /// Wheel resolution related errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Project configuration related errors
    #[error(transparent)]
    Project(#[from] ProjectError),

    /// Bundle assembly related errors
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Errors raised while building or loading a compatibility spec
#[derive(Error, Debug)]
pub enum SpecError {
    /// PythonVersions.min could not be parsed
    #[error("invalid PythonVersions.min: '{value}'")]
    InvalidMin { value: String },

    /// PythonVersions.max could not be parsed
    #[error("invalid PythonVersions.max: '{value}'")]
    InvalidMax { value: String },

    /// PythonVersions.max = "*" is explicitly unsupported
    #[error("PythonVersions.max='*' is not supported (unbounded upper range)")]
    UnboundedMax,

    /// Spec file not found
    #[error("compatibility spec file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a spec file
    #[error("failed to read compatibility spec {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a spec document
    #[error("failed to parse compatibility spec from {origin}: {message}")]
    ParseError { origin: String, message: String },
}

/// Errors related to wheel filenames, tags, and metadata
#[derive(Error, Debug)]
pub enum WheelError {
    /// Filename does not follow the wheel naming grammar
    #[error("invalid wheel filename: {filename}")]
    InvalidFilename { filename: String },

    /// Tag string is not an interpreter-abi-platform triple
    #[error("invalid wheel tag: '{value}'")]
    InvalidTag { value: String },

    /// Wheel file not found on disk
    #[error("wheel not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read a wheel file
    #[error("failed to read wheel {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Wheel archive or METADATA could not be processed
    #[error("failed to read metadata from {filename}: {message}")]
    MetadataError { filename: String, message: String },
}

/// Errors related to wheel resolution and package index communication
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No resolver claimed the spec
    #[error("no resolver can handle spec '{spec}'")]
    UnhandledSpec { spec: String },

    /// A resolver claimed the spec but failed to produce a wheel
    #[error("failed to resolve '{spec}' with {resolver}: {message}")]
    ResolutionFailed {
        spec: String,
        resolver: String,
        message: String,
    },

    /// Package not found in the index
    #[error("package '{package}' not found in index {index}")]
    PackageNotFound { package: String, index: String },

    /// Network request failed
    #[error("failed to fetch '{package}' from {index}: {message}")]
    NetworkError {
        package: String,
        index: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for index {index}")]
    RateLimitExceeded { index: String },

    /// Timeout
    #[error("timeout while fetching '{package}' from {index}")]
    Timeout { package: String, index: String },

    /// Invalid response from the index
    #[error("invalid response from {index} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        index: String,
        message: String,
    },

    /// No installable wheel among the release files
    #[error("no wheel available for '{package}' {version}")]
    NoWheelAvailable { package: String, version: String },

    /// Wheel parsing error during resolution
    #[error(transparent)]
    Wheel(#[from] WheelError),

    /// Filesystem error while staging wheels
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to chubproject.toml handling
#[derive(Error, Debug)]
pub enum ProjectError {
    /// Nothing to package
    #[error("no wheels specified (use --wheel or a chubproject)")]
    NoWheels,

    /// Project file not found
    #[error("chubproject file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read the project file
    #[error("failed to read chubproject {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the project file
    #[error("failed to parse chubproject {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Configured table is missing from the document
    #[error("table '{table}' not found in {path}")]
    TableNotFound { path: PathBuf, table: String },

    /// Refusing to overwrite an existing file
    #[error("refusing to overwrite existing file: {path}")]
    AlreadyExists { path: PathBuf },

    /// Failed to write the project file
    #[error("failed to write chubproject {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to manifest validation and archive assembly
#[derive(Error, Debug)]
pub enum BundleError {
    /// No combo satisfies every wheel
    #[error("no common compatibility target across wheels")]
    NoCommonTarget,

    /// A required manifest field is empty
    #[error("manifest field '{field}' is required")]
    MissingField { field: String },

    /// A wheel entry does not end in .whl
    #[error("wheel entry must end with .whl: {name}")]
    InvalidWheelName { name: String },

    /// Entrypoint is not a single module:function token
    #[error("entrypoint must be a single 'module:function' token: '{value}'")]
    InvalidEntrypoint { value: String },

    /// A staged input file is missing
    #[error("bundle input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Filesystem error during assembly
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip archive error
    #[error("archive error for {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Manifest serialization error
    #[error("failed to serialize manifest: {message}")]
    Serialize { message: String },
}

impl WheelError {
    /// Creates a new InvalidFilename error
    pub fn invalid_filename(filename: impl Into<String>) -> Self {
        WheelError::InvalidFilename {
            filename: filename.into(),
        }
    }

    /// Creates a new InvalidTag error
    pub fn invalid_tag(value: impl Into<String>) -> Self {
        WheelError::InvalidTag {
            value: value.into(),
        }
    }

    /// Creates a new MetadataError
    pub fn metadata_error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        WheelError::MetadataError {
            filename: filename.into(),
            message: message.into(),
        }
    }
}

impl ResolveError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, index: impl Into<String>) -> Self {
        ResolveError::PackageNotFound {
            package: package.into(),
            index: index.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        index: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ResolveError::NetworkError {
            package: package.into(),
            index: index.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, index: impl Into<String>) -> Self {
        ResolveError::Timeout {
            package: package.into(),
            index: index.into(),
        }
    }

    /// Creates a new ResolutionFailed error
    pub fn resolution_failed(
        spec: impl Into<String>,
        resolver: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ResolveError::ResolutionFailed {
            spec: spec.into(),
            resolver: resolver.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_unbounded_max() {
        let err = SpecError::UnboundedMax;
        let msg = format!("{}", err);
        assert!(msg.contains("not supported"));
        assert!(msg.contains("*"));
    }

    #[test]
    fn test_spec_error_invalid_min() {
        let err = SpecError::InvalidMin {
            value: "abc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("PythonVersions.min"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_wheel_error_invalid_filename() {
        let err = WheelError::invalid_filename("not-a-wheel.txt");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid wheel filename"));
        assert!(msg.contains("not-a-wheel.txt"));
    }

    #[test]
    fn test_wheel_error_invalid_tag() {
        let err = WheelError::invalid_tag("cp311");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid wheel tag"));
    }

    #[test]
    fn test_resolve_error_package_not_found() {
        let err = ResolveError::package_not_found("missing-pkg", "https://pypi.org/pypi");
        let msg = format!("{}", err);
        assert!(msg.contains("'missing-pkg' not found"));
    }

    #[test]
    fn test_resolve_error_unhandled_spec() {
        let err = ResolveError::UnhandledSpec {
            spec: "???".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("no resolver can handle"));
    }

    #[test]
    fn test_bundle_error_invalid_entrypoint() {
        let err = BundleError::InvalidEntrypoint {
            value: "mod:fn extra".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("single 'module:function'"));
    }

    #[test]
    fn test_app_error_from_spec_error() {
        let spec_err = SpecError::UnboundedMax;
        let app_err: AppError = spec_err.into();
        let msg = format!("{}", app_err);
        assert!(msg.contains("unbounded upper range"));
    }

    #[test]
    fn test_app_error_from_wheel_error() {
        let wheel_err = WheelError::invalid_filename("x");
        let app_err: AppError = wheel_err.into();
        let msg = format!("{}", app_err);
        assert!(msg.contains("invalid wheel filename"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = WheelError::invalid_filename("x.whl");
        let debug = format!("{:?}", err);
        assert!(debug.contains("InvalidFilename"));
    }
}
