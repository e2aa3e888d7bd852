//! cyplan - build-plan resolution for Cython/native Python extension modules
//!
//! A build backend compiling native extension modules needs to turn a declarative
//! configuration block (compiler flags, linker flags, include/library directories,
//! compiler directives, extra build kwargs) into a concrete plan for one target
//! platform and architecture. cyplan implements that resolution step: it consumes
//! an already-parsed TOML tree and produces a [`ResolvedConfig`] whose argument
//! lists are filtered for an explicit [`BuildContext`].
//!
//! # Architecture Overview
//!
//! Resolution is a one-way pipeline over an in-memory configuration snapshot:
//!
//! 1. Dependency providers declared in the configuration are resolved through a
//!    [`ProviderRegistry`], contributing include paths, library names, and
//!    library directories (and running their setup hook at most once per parse).
//! 2. Platform-default include/library directories are computed for the target
//!    OS/architecture, gated by delegated file-system existence checks.
//! 3. Scoped flag entries are filtered against the build context (platform set,
//!    architecture set, optional marker predicate) in declared order.
//!
//! Everything is synchronous and deterministic: the engine never reads ambient
//! global state, so the same [`ResolvedConfig`] can be queried under arbitrary
//! hypothetical contexts (which is exactly what the test suite does).
//!
//! # Core Modules
//!
//! - [`config`] - Configuration assembly: `[options]` parsing and [`ResolvedConfig`]
//! - [`flags`] - Scoped flag entries and the platform filtering engine
//! - [`marker`] - Typed marker predicates (`python_version == '3.9'`)
//! - [`providers`] - Dependency provider trait, registry, and built-ins
//! - [`defaults`] - OS-conditional default include/library directories
//! - [`context`] - Target platform/architecture/interpreter snapshot
//! - [`python`] - Synchronous wrapper around the target Python interpreter
//! - [`core`] - Error types shared across the crate
//!
//! # Example
//!
//! ```rust,no_run
//! use cyplan::{BuildContext, FsProbe, ProviderRegistry, PythonInterpreter, ResolvedConfig};
//!
//! # fn example() -> Result<(), cyplan::CyplanError> {
//! let interpreter = PythonInterpreter::find()?;
//! let registry = ProviderRegistry::with_builtins(interpreter.clone());
//! let context = BuildContext::detect(&interpreter)?;
//!
//! let config = ResolvedConfig::from_str(
//!     r#"
//!     [options]
//!     include_numpy = true
//!     compile_args = [
//!         { platforms = ["linux", "darwin"], arg = "-Wcpp" },
//!         { arch = ["arm64"], arg = "-O3" },
//!         { arg = "-py39", marker = "python_version == '3.9'" },
//!     ]
//!     "#,
//!     &registry,
//! )?;
//!
//! let compile_args = config.compile_args_for_platform(&context, &FsProbe);
//! let link_args = config.compile_links_for_platform(&context, &FsProbe);
//! # let _ = (compile_args, link_args);
//! # Ok(())
//! # }
//! ```

// Resolution pipeline
pub mod config;
pub mod defaults;
pub mod flags;
pub mod marker;
pub mod providers;

// Environment collaborators
pub mod context;
pub mod python;

// Shared types
pub mod core;

pub use crate::config::ResolvedConfig;
pub use crate::context::{BuildContext, OsName, PythonVersion};
pub use crate::core::CyplanError;
pub use crate::defaults::{FsProbe, PathProbe, PlatformDefaults, platform_defaults};
pub use crate::flags::{FlagEntry, resolve_for_platform};
pub use crate::marker::{Comparator, Marker};
pub use crate::providers::{
    DependencyProvider, DependencyProviderSpec, ProviderRegistry, PythonModuleProvider,
    ResolvedDependency,
};
pub use crate::python::PythonInterpreter;
