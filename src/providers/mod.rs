//! Dependency providers: pluggable sources of include paths, library names,
//! and library directories.
//!
//! A native dependency (numpy, pyarrow, an in-house library) knows where its
//! headers and libraries live; the build plan has to ask it. Each dependency
//! is represented by a [`DependencyProvider`] - a capability-typed interface
//! with three accessors and an optional one-time setup hook - and looked up
//! through a [`ProviderRegistry`].
//!
//! Registration is explicit. Built-ins for numpy and pyarrow are registered
//! statically by [`ProviderRegistry::with_builtins`]; embedders can register
//! arbitrary implementations under any identifier. Configuration declarations
//! (`include_<name> = { pkg = ..., ... }`) that name an unregistered provider
//! fall back to an interpreter-backed [`PythonModuleProvider`] built from the
//! declared [`DependencyProviderSpec`].
//!
//! Provider failures are fatal to the configuration parse: a build plan with
//! a missing native dependency is guaranteed to fail at compile time, so the
//! resolver fails fast instead.

mod python_module;

pub use python_module::PythonModuleProvider;

use serde::Deserialize;
use std::collections::HashMap;

use crate::core::CyplanError;
use crate::python::PythonInterpreter;

/// A declared dependency provider, as written in the configuration.
///
/// One spec per `include_<name>` table. The accessor fields name
/// zero-argument functions on `pkg`; all three are required for user-declared
/// providers (a missing one is a deserialization error surfaced as a config
/// error). `required_call` optionally names a setup hook invoked once per
/// parse before the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencyProviderSpec {
    /// Declaration name - the `include_<name>` key without its prefix
    #[serde(skip)]
    pub name: String,
    /// The Python package/module to resolve
    pub pkg: String,
    /// Accessor returning the include path (a single path or a list)
    pub include: String,
    /// Accessor returning the list of library names to link
    pub libraries: String,
    /// Accessor returning the list of library search directories
    pub library_dirs: String,
    /// Optional setup hook, invoked at most once per configuration parse
    #[serde(default)]
    pub required_call: Option<String>,
}

/// What one provider contributes to the build plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Include directories (folded into the config-wide include set)
    pub includes: Vec<String>,
    /// Library names to link
    pub libraries: Vec<String>,
    /// Library search directories
    pub library_dirs: Vec<String>,
}

/// Capability-typed interface to one native dependency.
///
/// Accessors take no arguments and are expected to complete immediately.
/// Every method has a default empty implementation so a provider only
/// implements the capabilities its dependency actually has (numpy, for
/// instance, contributes headers but no libraries).
pub trait DependencyProvider {
    /// Identifier the provider is registered under.
    fn name(&self) -> &str;

    /// Include directories contributed by the dependency.
    fn includes(&self) -> Result<Vec<String>, CyplanError> {
        Ok(Vec::new())
    }

    /// Library names the extension must link against.
    fn libraries(&self) -> Result<Vec<String>, CyplanError> {
        Ok(Vec::new())
    }

    /// Library search directories.
    fn library_dirs(&self) -> Result<Vec<String>, CyplanError> {
        Ok(Vec::new())
    }

    /// One-time setup hook, run before the accessors.
    ///
    /// Must be safe to call once per configuration parse (it is never called
    /// twice within one parse, but a process may parse more than once).
    fn setup(&self) -> Result<(), CyplanError> {
        Ok(())
    }
}

/// Registry of dependency providers, keyed by identifier.
///
/// # Examples
///
/// ```rust,no_run
/// use cyplan::{ProviderRegistry, PythonInterpreter, PythonModuleProvider};
///
/// # fn example() -> Result<(), cyplan::CyplanError> {
/// let interpreter = PythonInterpreter::find()?;
/// let mut registry = ProviderRegistry::with_builtins(interpreter.clone());
///
/// // An embedder-supplied provider under a custom identifier.
/// registry.register(Box::new(PythonModuleProvider::numpy(interpreter)));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn DependencyProvider>>,
    interpreter: Option<PythonInterpreter>,
}

impl ProviderRegistry {
    /// Creates an empty registry with no interpreter fallback.
    ///
    /// Useful for tests and for embedders that register every provider
    /// themselves; spec declarations naming anything unregistered will fail
    /// with [`CyplanError::ProviderNotFound`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the numpy/pyarrow built-ins registered and
    /// `interpreter` as the fallback for user-declared specs.
    #[must_use]
    pub fn with_builtins(interpreter: PythonInterpreter) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            interpreter: Some(interpreter.clone()),
        };
        registry.register(Box::new(PythonModuleProvider::numpy(interpreter.clone())));
        registry.register(Box::new(PythonModuleProvider::pyarrow(interpreter)));
        registry
    }

    /// Registers `provider` under its own name, replacing any previous
    /// registration with that identifier.
    pub fn register(&mut self, provider: Box<dyn DependencyProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Whether an identifier has a registered provider.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Resolves a registered provider by identifier.
    ///
    /// Runs the setup hook (once), then the three accessors.
    ///
    /// # Errors
    ///
    /// [`CyplanError::ProviderNotFound`] for unknown identifiers; otherwise
    /// whatever the provider's hook or accessors fail with.
    pub fn resolve(&self, name: &str) -> Result<ResolvedDependency, CyplanError> {
        let provider = self.providers.get(name).ok_or_else(|| CyplanError::ProviderNotFound {
            name: name.to_string(),
        })?;
        Self::run(provider.as_ref())
    }

    /// Resolves a configuration-declared spec.
    ///
    /// A provider registered under `spec.pkg` wins; otherwise the spec is
    /// turned into an interpreter-backed provider, provided the registry has
    /// an interpreter to hand it.
    pub fn resolve_spec(&self, spec: &DependencyProviderSpec) -> Result<ResolvedDependency, CyplanError> {
        if let Some(provider) = self.providers.get(spec.pkg.as_str()) {
            tracing::debug!(pkg = %spec.pkg, "resolving dependency via registered provider");
            return Self::run(provider.as_ref());
        }
        let interpreter =
            self.interpreter.clone().ok_or_else(|| CyplanError::ProviderNotFound {
                name: spec.pkg.clone(),
            })?;
        tracing::debug!(pkg = %spec.pkg, "resolving dependency via target interpreter");
        Self::run(&PythonModuleProvider::from_spec(interpreter, spec))
    }

    fn run(provider: &dyn DependencyProvider) -> Result<ResolvedDependency, CyplanError> {
        provider.setup()?;
        Ok(ResolvedDependency {
            includes: provider.includes()?,
            libraries: provider.libraries()?,
            library_dirs: provider.library_dirs()?,
        })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .field("interpreter", &self.interpreter)
            .finish()
    }
}
