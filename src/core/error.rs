//! Error handling for cyplan.
//!
//! All fallible operations in this crate return [`CyplanError`]. The variants
//! fall into two classes, mirroring how the resolver treats them:
//!
//! - **Configuration errors** - the declarative configuration is structurally
//!   invalid. See [`CyplanError::is_config_error`].
//! - **Dependency-resolution errors** - a declared dependency provider cannot
//!   be satisfied. See [`CyplanError::is_dependency_error`].
//!
//! Both classes are fatal and abort the configuration parse. There are no
//! retries anywhere: every operation is local and deterministic. The only
//! failures that are deliberately *not* surfaced as errors are file-system
//! existence checks for platform-default paths - a probe that fails (missing
//! directory, permission error, race) is treated as "path absent" because
//! default-path injection is best-effort.
//!
//! # Conversions
//!
//! Common library errors convert automatically:
//! - [`std::io::Error`] → [`CyplanError::IoError`]
//! - [`toml::de::Error`] → [`CyplanError::TomlError`]
//! - [`serde_json::Error`] → [`CyplanError::JsonError`]
//! - [`semver::Error`] → [`CyplanError::SemverError`]

use thiserror::Error;

/// The error type for all cyplan operations.
///
/// Variants carry enough context to produce actionable messages for the user
/// of the build backend (the offending key, module, accessor, or marker text).
#[derive(Error, Debug)]
pub enum CyplanError {
    /// Generic configuration structure error
    ///
    /// Raised when a recognized `[options]` key has the wrong shape, e.g.
    /// `includes` is not an array of strings or `directives` is not a table.
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description of the structural problem
        message: String,
    },

    /// A flag entry list (`compile_args` / `extra_link_args`) failed to parse
    #[error("invalid flag entry in '{key}': {reason}")]
    InvalidFlagEntry {
        /// The configuration key holding the entry list
        key: String,
        /// Deserialization failure detail
        reason: String,
    },

    /// A marker expression could not be parsed into a predicate
    ///
    /// The supported grammar is `<identifier> <comparator> <version literal>`,
    /// e.g. `python_version >= '3.10'`.
    #[error("invalid marker expression '{marker}': {reason}")]
    MarkerParseError {
        /// The marker text as written in the configuration
        marker: String,
        /// Why it was rejected
        reason: String,
    },

    /// A marker references an identifier outside the supported vocabulary
    ///
    /// Unknown identifiers fail the parse instead of silently evaluating to
    /// false, so a typo like `pythonversion` cannot quietly drop a flag.
    #[error("unknown marker identifier '{identifier}' (supported: python_version)")]
    UnknownMarkerIdentifier {
        /// The identifier that was not recognized
        identifier: String,
    },

    /// A dependency provider declaration (`include_<name>`) is malformed
    #[error("invalid dependency spec '{name}': {reason}")]
    DependencySpecError {
        /// The declaration name, without the `include_` prefix
        name: String,
        /// Missing field or type mismatch detail
        reason: String,
    },

    /// No provider is registered (or constructible) for a declared dependency
    #[error("no dependency provider available for '{name}'")]
    ProviderNotFound {
        /// The provider identifier that was looked up
        name: String,
    },

    /// The provider's Python module could not be imported
    #[error("dependency module '{module}' is not importable: {reason}")]
    ModuleNotFound {
        /// The module/package that failed to import
        module: String,
        /// The interpreter's import error message
        reason: String,
    },

    /// A named accessor is missing from the provider's module
    #[error("module '{module}' has no accessor '{accessor}'")]
    AccessorMissing {
        /// The module that was imported successfully
        module: String,
        /// The attribute that was not found on it
        accessor: String,
    },

    /// An accessor ran but failed or produced output that cannot be used
    #[error("accessor '{accessor}' of module '{module}' failed: {reason}")]
    AccessorFailed {
        /// The module the accessor belongs to
        module: String,
        /// The accessor that failed
        accessor: String,
        /// Stderr output or value classification detail
        reason: String,
    },

    /// No Python interpreter found on PATH
    #[error("python interpreter not found in PATH")]
    PythonNotFound,

    /// A Python interpreter invocation failed
    #[error("python invocation failed: {operation}")]
    PythonCommandError {
        /// What the interpreter was asked to do
        operation: String,
        /// The error output of the interpreter process
        stderr: String,
    },

    /// I/O error from [`std::io::Error`]
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML deserialization error from [`toml::de::Error`]
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON deserialization error from [`serde_json::Error`]
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Version parsing error from [`semver::Error`]
    #[error("version parsing error: {0}")]
    SemverError(#[from] semver::Error),
}

impl CyplanError {
    /// Whether this error denotes a structurally invalid configuration.
    ///
    /// Configuration errors mean the TOML input itself must be fixed; no
    /// environment change can make the parse succeed.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. }
                | Self::InvalidFlagEntry { .. }
                | Self::MarkerParseError { .. }
                | Self::UnknownMarkerIdentifier { .. }
                | Self::DependencySpecError { .. }
                | Self::TomlError(_)
                | Self::SemverError(_)
        )
    }

    /// Whether this error denotes an unsatisfiable dependency provider.
    ///
    /// Dependency errors usually mean the declared native dependency is not
    /// installed in the target interpreter environment.
    #[must_use]
    pub const fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderNotFound { .. }
                | Self::ModuleNotFound { .. }
                | Self::AccessorMissing { .. }
                | Self::AccessorFailed { .. }
                | Self::PythonNotFound
                | Self::PythonCommandError { .. }
        )
    }
}
