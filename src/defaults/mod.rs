//! OS-conditional default include/library directories.
//!
//! macOS toolchains do not search the package-manager prefixes by default, so
//! the resolver injects them when they exist: `/opt/homebrew` on Apple
//! Silicon, `/usr/local` everywhere else (including builds with no
//! architecture information). All other platforms get no defaults.
//!
//! Existence checks are delegated through [`PathProbe`] so resolution stays a
//! pure function of the build context; the real [`FsProbe`] is a single
//! `stat` per candidate, and tests substitute closures. A candidate that
//! fails the probe is silently omitted - injection is best-effort and a
//! missing prefix is not an error.


use std::path::Path;

use crate::context::{BuildContext, OsName};

/// Delegated file-system existence check.
///
/// Implemented by [`FsProbe`] for real resolution; any `Fn(&Path) -> bool`
/// closure also implements it, which is how tests pin down hypothetical
/// file systems.
pub trait PathProbe {
    /// Whether `path` exists. Failures (permissions, races) count as absent.
    fn exists(&self, path: &Path) -> bool;
}

/// [`PathProbe`] backed by the real file system.
///
/// Uses [`Path::exists`], which already folds I/O errors into `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl<F> PathProbe for F
where
    F: Fn(&Path) -> bool,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Default include/library directories for one build context.
///
/// Produced by [`platform_defaults`]; consumed as a prefix of the compile
/// argument list and a suffix of the link argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformDefaults {
    /// Default include directories, probe-verified
    pub includes: Vec<String>,
    /// Default library search directories, probe-verified
    pub library_dirs: Vec<String>,
}

impl PlatformDefaults {
    /// The includes rendered as `-I<dir>` compiler flags.
    #[must_use]
    pub fn include_flags(&self) -> Vec<String> {
        self.includes.iter().map(|dir| format!("-I{dir}")).collect()
    }

    /// The library directories rendered as `-L<dir>` linker flags.
    #[must_use]
    pub fn library_dir_flags(&self) -> Vec<String> {
        self.library_dirs.iter().map(|dir| format!("-L{dir}")).collect()
    }
}

/// Computes the platform-default directories for `context`.
///
/// | context | include candidate | lib candidate |
/// |---|---|---|
/// | darwin / arm64 | `/opt/homebrew/include` | `/opt/homebrew/lib` |
/// | darwin / other or unspecified | `/usr/local/include` | `/usr/local/lib` |
/// | anything else | - | - |
///
/// Each candidate is included only if `probe` confirms it exists.
#[must_use]
pub fn platform_defaults(context: &BuildContext, probe: &dyn PathProbe) -> PlatformDefaults {
    if context.os != OsName::Darwin {
        return PlatformDefaults::default();
    }

    let (include, lib) = if context.arch == "arm64" {
        ("/opt/homebrew/include", "/opt/homebrew/lib")
    } else {
        ("/usr/local/include", "/usr/local/lib")
    };

    let mut defaults = PlatformDefaults::default();
    if probe.exists(Path::new(include)) {
        defaults.includes.push(include.to_string());
    } else {
        tracing::debug!(candidate = include, "default include dir absent, skipping");
    }
    if probe.exists(Path::new(lib)) {
        defaults.library_dirs.push(lib.to_string());
    } else {
        tracing::debug!(candidate = lib, "default lib dir absent, skipping");
    }
    defaults
}
