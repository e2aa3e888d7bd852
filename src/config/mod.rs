//! Configuration assembly: parsing the `[options]` section into a
//! [`ResolvedConfig`].
//!
//! The raw TOML tree is handed in by the build backend already parsed; this
//! module walks it once, resolving every declared dependency provider and
//! collecting flag entries, directives, and pass-through build kwargs.
//!
//! # Recognized keys
//!
//! ```toml
//! [options]
//! includes = ["/explicit/include/dir"]
//!
//! # Built-in provider shortcuts; any registered provider works by name.
//! include_numpy = true
//! include_pyarrow = false
//!
//! # User-declared provider: pkg plus the three accessor names.
//! include_somelib = { pkg = "somelib", include = "gets_include", libraries = "gets_libraries", library_dirs = "gets_library_dirs", required_call = "some_setup_op" }
//!
//! compile_args = [
//!     { platforms = ["linux", "darwin"], arg = "-Wcpp" },
//!     { arch = ["arm64"], arg = "-O3" },
//! ]
//! extra_link_args = [
//!     { platforms = ["darwin"], arg = "-L/usr/local/opt/llvm/lib" },
//! ]
//!
//! directives = { boundscheck = false, language_level = 3 }
//!
//! # Anything unrecognized passes through verbatim as a build kwarg.
//! abc_compile_kwarg = "test"
//! ```
//!
//! Parsing is fail-fast: the first structural problem or unsatisfiable
//! dependency aborts the whole parse, because downstream flags may depend on
//! earlier contributions and a partial plan is worthless.

#[cfg(test)]
mod config_tests;

use toml::Table;
use toml::Value;

use crate::context::BuildContext;
use crate::core::CyplanError;
use crate::defaults::{PathProbe, platform_defaults};
use crate::flags::{FlagEntry, resolve_for_platform};
use crate::providers::{DependencyProviderSpec, ProviderRegistry};

/// Root section holding the resolver's configuration.
pub const OPTIONS_SECTION: &str = "options";

/// Key prefix declaring a dependency provider.
const PROVIDER_PREFIX: &str = "include_";

/// The fully resolved build configuration.
///
/// The aggregate is context-independent: flag entries keep their scoping, and
/// the per-platform argument lists are computed lazily by
/// [`compile_args_for_platform`](Self::compile_args_for_platform) /
/// [`compile_links_for_platform`](Self::compile_links_for_platform) so one
/// parse can be queried under any number of hypothetical contexts. Provider
/// accessors and setup hooks, by contrast, ran exactly once, during the parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Compiler directives, defaults merged with user overrides
    pub directives: Table,
    /// Declared compile flag entries, scoping intact, declaration order
    pub compile_args: Vec<FlagEntry>,
    /// Declared link flag entries, scoping intact, declaration order
    pub compile_links: Vec<FlagEntry>,
    /// Include directories: explicit `includes` plus provider contributions,
    /// declaration order, deduplicated
    pub includes: Vec<String>,
    /// Library names contributed by providers, declaration order
    pub libraries: Vec<String>,
    /// Library search directories contributed by providers, declaration order
    pub library_dirs: Vec<String>,
    /// Unrecognized `[options]` keys, passed through verbatim
    pub compile_kwargs: Table,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            directives: default_directives(),
            compile_args: default_compile_args(),
            compile_links: Vec::new(),
            includes: Vec::new(),
            libraries: Vec::new(),
            library_dirs: Vec::new(),
            compile_kwargs: Table::new(),
        }
    }
}

impl ResolvedConfig {
    /// Parses TOML text and resolves its `[options]` section.
    ///
    /// Convenience over [`from_document`](Self::from_document) for callers
    /// (and tests) holding unparsed text.
    pub fn from_str(text: &str, registry: &ProviderRegistry) -> Result<Self, CyplanError> {
        let document: Table = toml::from_str(text)?;
        Self::from_document(&document, registry)
    }

    /// Resolves the `[options]` section of an already-parsed document.
    ///
    /// A document without an `[options]` section yields the pure defaults:
    /// default directives, the default compile args, and nothing else.
    pub fn from_document(document: &Table, registry: &ProviderRegistry) -> Result<Self, CyplanError> {
        match document.get(OPTIONS_SECTION) {
            None => Ok(Self::default()),
            Some(Value::Table(options)) => Self::from_options(options, registry),
            Some(other) => Err(CyplanError::ConfigError {
                message: format!("[{OPTIONS_SECTION}] must be a table, got {}", other.type_str()),
            }),
        }
    }

    /// Resolves an `[options]` table.
    ///
    /// Keys are processed in declaration order; provider contributions are
    /// appended once each, in that order.
    ///
    /// # Errors
    ///
    /// Configuration errors for structural problems (wrong type, missing
    /// accessor name, malformed marker); dependency-resolution errors when a
    /// declared provider cannot deliver.
    pub fn from_options(options: &Table, registry: &ProviderRegistry) -> Result<Self, CyplanError> {
        let mut config = Self::default();

        for (key, value) in options {
            match key.as_str() {
                "includes" => {
                    for path in string_sequence(key, value)? {
                        push_unique(&mut config.includes, path);
                    }
                }
                "compile_args" => {
                    config.compile_args = flag_entries(key, value)?;
                }
                "extra_link_args" => {
                    config.compile_links = flag_entries(key, value)?;
                }
                "directives" => {
                    let Value::Table(overrides) = value else {
                        return Err(CyplanError::ConfigError {
                            message: format!("'{key}' must be a table, got {}", value.type_str()),
                        });
                    };
                    for (directive, setting) in overrides {
                        config.directives.insert(directive.clone(), setting.clone());
                    }
                }
                other if other.starts_with(PROVIDER_PREFIX) => {
                    let name = &other[PROVIDER_PREFIX.len()..];
                    config.apply_provider(name, key, value, registry)?;
                }
                _ => {
                    config.compile_kwargs.insert(key.clone(), value.clone());
                }
            }
        }

        tracing::debug!(
            compile_args = config.compile_args.len(),
            compile_links = config.compile_links.len(),
            includes = config.includes.len(),
            libraries = config.libraries.len(),
            "resolved configuration"
        );
        Ok(config)
    }

    /// Resolves one `include_<name>` declaration and merges its contribution.
    fn apply_provider(
        &mut self,
        name: &str,
        key: &str,
        value: &Value,
        registry: &ProviderRegistry,
    ) -> Result<(), CyplanError> {
        let resolved = match value {
            // Boolean shortcut: resolve the registered provider by name.
            Value::Boolean(false) => return Ok(()),
            Value::Boolean(true) => registry.resolve(name)?,
            // Full spec: registered provider wins, interpreter fallback otherwise.
            Value::Table(_) => {
                let mut spec: DependencyProviderSpec =
                    value.clone().try_into().map_err(|err: toml::de::Error| {
                        CyplanError::DependencySpecError {
                            name: name.to_string(),
                            reason: err.to_string(),
                        }
                    })?;
                spec.name = name.to_string();
                registry.resolve_spec(&spec)?
            }
            other => {
                return Err(CyplanError::ConfigError {
                    message: format!(
                        "'{key}' must be a boolean or a dependency table, got {}",
                        other.type_str()
                    ),
                });
            }
        };

        for include in resolved.includes {
            push_unique(&mut self.includes, include);
        }
        self.libraries.extend(resolved.libraries);
        self.library_dirs.extend(resolved.library_dirs);
        Ok(())
    }

    /// Compile arguments filtered for `context`.
    ///
    /// Platform-default include flags are *prepended* - defaults must be
    /// visible before user overrides. Computed fresh on every call; nothing
    /// is cached across contexts.
    #[must_use]
    pub fn compile_args_for_platform(
        &self,
        context: &BuildContext,
        probe: &dyn PathProbe,
    ) -> Vec<String> {
        let defaults = platform_defaults(context, probe);
        resolve_for_platform(&self.compile_args, context, &defaults.include_flags(), &[])
    }

    /// Link arguments filtered for `context`.
    ///
    /// Platform-default library search paths are *appended* - a fallback
    /// consulted after user-specified directories.
    #[must_use]
    pub fn compile_links_for_platform(
        &self,
        context: &BuildContext,
        probe: &dyn PathProbe,
    ) -> Vec<String> {
        let defaults = platform_defaults(context, probe);
        resolve_for_platform(&self.compile_links, context, &[], &defaults.library_dir_flags())
    }
}

/// Directive defaults applied before user overrides.
///
/// `language_level = 3` and `binding = true`, the baseline any modern
/// Cython extension wants.
#[must_use]
pub fn default_directives() -> Table {
    let mut directives = Table::new();
    directives.insert("language_level".to_string(), Value::Integer(3));
    directives.insert("binding".to_string(), Value::Boolean(true));
    directives
}

/// Compile args used when the configuration declares none: a bare `-O2`.
#[must_use]
pub fn default_compile_args() -> Vec<FlagEntry> {
    vec![FlagEntry::new("-O2")]
}

fn string_sequence(key: &str, value: &Value) -> Result<Vec<String>, CyplanError> {
    let wrong_shape = || CyplanError::ConfigError {
        message: format!("'{key}' must be an array of strings"),
    };
    let Value::Array(items) = value else {
        return Err(wrong_shape());
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(wrong_shape()),
        })
        .collect()
}

fn flag_entries(key: &str, value: &Value) -> Result<Vec<FlagEntry>, CyplanError> {
    value.clone().try_into().map_err(|err: toml::de::Error| CyplanError::InvalidFlagEntry {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

fn push_unique(paths: &mut Vec<String>, path: String) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}
