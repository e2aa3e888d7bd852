//! Target environment snapshot used to filter scoped flag entries.
//!
//! A [`BuildContext`] captures everything the resolution engine is allowed to
//! know about the build environment: the target interpreter version, the OS
//! name, and the CPU architecture. The engine never queries ambient global
//! state itself - a context is always passed in explicitly, which keeps
//! resolution deterministic and lets tests evaluate the same configuration
//! under arbitrary hypothetical platforms.
//!
//! The vocabulary follows the configuration format rather than Rust's target
//! naming: macOS is `"darwin"` and Apple Silicon is `"arm64"`.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::CyplanError;
use crate::python::PythonInterpreter;

/// Target operating system, in the configuration's platform vocabulary.
///
/// `platforms = ["darwin", "linux"]` entries in the configuration are matched
/// against [`OsName::name`]. Operating systems outside the recognized set
/// collapse into [`OsName::Other`], which only matches entries scoped to the
/// literal string `"other"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsName {
    /// Windows (`std::env::consts::OS == "windows"`)
    Windows,
    /// Linux
    Linux,
    /// macOS - named `darwin` throughout the configuration format
    Darwin,
    /// Any other operating system
    Other,
}

impl OsName {
    /// The OS the library itself was compiled for.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os_str(std::env::consts::OS)
    }

    /// Maps an OS identifier to the configuration vocabulary.
    ///
    /// Accepts both Rust's `"macos"` and Python's `"darwin"` spelling.
    #[must_use]
    pub fn from_os_str(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" | "darwin" => Self::Darwin,
            _ => Self::Other,
        }
    }

    /// The string used to match `platforms` lists in flag entries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for OsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpreter version as a `(major, minor)` pair.
///
/// Marker predicates compare against this tuple; the patch component is not
/// part of the snapshot and pads to zero during comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PythonVersion {
    /// Major version (the `3` in 3.11)
    pub major: u64,
    /// Minor version (the `11` in 3.11)
    pub minor: u64,
}

impl PythonVersion {
    /// Creates a version pair.
    #[must_use]
    pub const fn new(major: u64, minor: u64) -> Self {
        Self {
            major,
            minor,
        }
    }

    /// The version padded to a full [`semver::Version`] for comparisons.
    #[must_use]
    pub const fn as_semver(self) -> Version {
        Version::new(self.major, self.minor, 0)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Read-only snapshot of the build environment at resolution time.
///
/// A context is cheap to construct and freely cloneable; resolution results
/// are never cached across contexts, so querying one [`crate::ResolvedConfig`]
/// under several contexts is well-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    /// Target interpreter version
    pub python_version: PythonVersion,
    /// Target operating system
    pub os: OsName,
    /// Target CPU architecture (`"x86_64"`, `"arm64"`, ...); empty means
    /// unspecified, which matches entries scoped to the `"anon"` wildcard
    pub arch: String,
}

impl BuildContext {
    /// Creates a context from explicit components.
    pub fn new(python_version: PythonVersion, os: OsName, arch: impl Into<String>) -> Self {
        Self {
            python_version,
            os,
            arch: arch.into(),
        }
    }

    /// Builds a snapshot of the host environment.
    ///
    /// The OS and architecture come from the compile-time target; the
    /// interpreter version is queried from `interpreter` because the target
    /// Python is not knowable at compile time.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be invoked or reports an
    /// unparseable version.
    pub fn detect(interpreter: &PythonInterpreter) -> Result<Self, CyplanError> {
        let python_version = interpreter.version()?;
        let context = Self::new(python_version, OsName::current(), host_arch());
        tracing::debug!(
            os = %context.os,
            arch = %context.arch,
            python = %context.python_version,
            "detected build context"
        );
        Ok(context)
    }

    /// Whether the context has no architecture information.
    #[must_use]
    pub fn arch_unspecified(&self) -> bool {
        self.arch.is_empty()
    }
}

/// Host CPU architecture in the configuration vocabulary.
///
/// Rust reports Apple Silicon and other 64-bit ARM targets as `aarch64`; the
/// configuration format follows `platform.machine()` and calls it `arm64`.
#[must_use]
pub fn host_arch() -> String {
    normalize_arch(std::env::consts::ARCH)
}

fn normalize_arch(arch: &str) -> String {
    match arch {
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}
