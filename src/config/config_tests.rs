use std::cell::Cell;
use std::rc::Rc;

use super::{ResolvedConfig, default_compile_args, default_directives};
use crate::context::{BuildContext, OsName, PythonVersion};
use crate::core::CyplanError;
use crate::flags::FlagEntry;
use crate::providers::{DependencyProvider, ProviderRegistry};

struct StaticProvider {
    name: String,
    includes: Vec<String>,
    libraries: Vec<String>,
    library_dirs: Vec<String>,
    setup_calls: Rc<Cell<usize>>,
}

impl DependencyProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }
    fn includes(&self) -> Result<Vec<String>, CyplanError> {
        Ok(self.includes.clone())
    }
    fn libraries(&self) -> Result<Vec<String>, CyplanError> {
        Ok(self.libraries.clone())
    }
    fn library_dirs(&self) -> Result<Vec<String>, CyplanError> {
        Ok(self.library_dirs.clone())
    }
    fn setup(&self) -> Result<(), CyplanError> {
        self.setup_calls.set(self.setup_calls.get() + 1);
        Ok(())
    }
}

fn registry_with(name: &str, includes: &[&str]) -> (ProviderRegistry, Rc<Cell<usize>>) {
    let setup_calls = Rc::new(Cell::new(0));
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(StaticProvider {
        name: name.to_string(),
        includes: includes.iter().map(ToString::to_string).collect(),
        libraries: vec!["lib-a".to_string()],
        library_dirs: vec!["dir-a".to_string()],
        setup_calls: Rc::clone(&setup_calls),
    }));
    (registry, setup_calls)
}

fn ctx(os: OsName, arch: &str) -> BuildContext {
    BuildContext::new(PythonVersion::new(3, 11), os, arch)
}

#[test]
fn test_empty_document_yields_defaults() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str("", &registry).unwrap();
    assert_eq!(config, ResolvedConfig::default());
    assert_eq!(config.directives, default_directives());
    assert_eq!(config.compile_args, default_compile_args());
    assert!(config.compile_kwargs.is_empty());
    assert!(config.includes.is_empty());
    assert!(config.libraries.is_empty());
    assert!(config.library_dirs.is_empty());
}

#[test]
fn test_empty_options_section_yields_defaults() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str("[options]\n", &registry).unwrap();
    assert_eq!(config, ResolvedConfig::default());
}

#[test]
fn test_default_directives_content() {
    let directives = default_directives();
    assert_eq!(directives["language_level"], toml::Value::Integer(3));
    assert_eq!(directives["binding"], toml::Value::Boolean(true));
}

#[test]
fn test_user_directives_merge_over_defaults() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        directives = { boundscheck = false, nonecheck = false }
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.directives["language_level"], toml::Value::Integer(3));
    assert_eq!(config.directives["binding"], toml::Value::Boolean(true));
    assert_eq!(config.directives["boundscheck"], toml::Value::Boolean(false));
    assert_eq!(config.directives["nonecheck"], toml::Value::Boolean(false));
}

#[test]
fn test_user_directives_can_override_defaults() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        directives = { language_level = 2, binding = false }
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.directives["language_level"], toml::Value::Integer(2));
    assert_eq!(config.directives["binding"], toml::Value::Boolean(false));
}

#[test]
fn test_unrecognized_keys_pass_through_as_kwargs() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        abc_compile_kwarg = "test"
        parallel = true
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.compile_kwargs.len(), 2);
    assert_eq!(config.compile_kwargs["abc_compile_kwarg"], toml::Value::String("test".into()));
    assert_eq!(config.compile_kwargs["parallel"], toml::Value::Boolean(true));
}

#[test]
fn test_explicit_includes_are_deduplicated() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        includes = ["/a", "/b", "/a"]
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.includes, vec!["/a", "/b"]);
}

#[test]
fn test_declared_compile_args_replace_default() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        compile_args = [{ arg = "-Wall" }]
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.compile_args, vec![FlagEntry::new("-Wall")]);
}

#[test]
fn test_boolean_shortcut_resolves_registered_provider() {
    let (registry, setup_calls) = registry_with("numpy", &["/numpy/include"]);
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        include_numpy = true
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.includes, vec!["/numpy/include"]);
    assert_eq!(setup_calls.get(), 1);
}

#[test]
fn test_disabled_shortcut_is_skipped() {
    let (registry, setup_calls) = registry_with("numpy", &["/numpy/include"]);
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        include_numpy = false
        include_pyarrow = false
        "#,
        &registry,
    )
    .unwrap();
    assert!(config.includes.is_empty());
    assert_eq!(setup_calls.get(), 0);
}

#[test]
fn test_spec_declaration_resolves_by_pkg_and_runs_hook_once() {
    let (registry, setup_calls) = registry_with("somelib", &["abc"]);
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        include_somelib = { pkg = "somelib", include = "gets_include", libraries = "gets_libraries", library_dirs = "gets_library_dirs", required_call = "some_setup_op" }
        "#,
        &registry,
    )
    .unwrap();
    assert!(config.includes.contains(&"abc".to_string()));
    assert_eq!(config.libraries, vec!["lib-a"]);
    assert_eq!(config.library_dirs, vec!["dir-a"]);
    assert_eq!(setup_calls.get(), 1);
}

#[test]
fn test_provider_includes_merge_without_duplication() {
    let (registry, _) = registry_with("somelib", &["/a", "/c"]);
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        includes = ["/a", "/b"]
        include_somelib = { pkg = "somelib", include = "i", libraries = "l", library_dirs = "d" }
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.includes, vec!["/a", "/b", "/c"]);
}

#[test]
fn test_providers_contribute_in_declaration_order() {
    // Declaration order must survive even when it disagrees with the
    // alphabetical order of the keys.
    let mut registry = ProviderRegistry::new();
    for name in ["zzz", "aaa"] {
        registry.register(Box::new(StaticProvider {
            name: name.to_string(),
            includes: vec![format!("/{name}/include")],
            libraries: vec![format!("{name}-lib")],
            library_dirs: vec![format!("/{name}/lib")],
            setup_calls: Rc::new(Cell::new(0)),
        }));
    }
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        include_zzz = true
        includes = ["/explicit"]
        include_aaa = true
        "#,
        &registry,
    )
    .unwrap();
    assert_eq!(config.includes, vec!["/zzz/include", "/explicit", "/aaa/include"]);
    assert_eq!(config.libraries, vec!["zzz-lib", "aaa-lib"]);
    assert_eq!(config.library_dirs, vec!["/zzz/lib", "/aaa/lib"]);
}

#[test]
fn test_unregistered_shortcut_is_a_dependency_error() {
    let registry = ProviderRegistry::new();
    let err = ResolvedConfig::from_str(
        r#"
        [options]
        include_numpy = true
        "#,
        &registry,
    )
    .unwrap_err();
    assert!(err.is_dependency_error());
}

#[test]
fn test_options_must_be_a_table() {
    let registry = ProviderRegistry::new();
    let err = ResolvedConfig::from_str("options = 3\n", &registry).unwrap_err();
    assert!(matches!(err, CyplanError::ConfigError { .. }));
}

#[test]
fn test_includes_must_be_string_array() {
    let registry = ProviderRegistry::new();
    for text in ["[options]\nincludes = 3\n", "[options]\nincludes = [3]\n"] {
        let err = ResolvedConfig::from_str(text, &registry).unwrap_err();
        assert!(matches!(err, CyplanError::ConfigError { .. }), "input: {text}");
    }
}

#[test]
fn test_malformed_flag_entries_are_config_errors() {
    let registry = ProviderRegistry::new();
    for text in [
        // not an array
        "[options]\ncompile_args = \"-O2\"\n",
        // entry is not a table
        "[options]\ncompile_args = [\"-O2\"]\n",
        // entry missing its argument
        "[options]\ncompile_args = [{ platforms = [\"linux\"] }]\n",
        // malformed marker inside an entry
        "[options]\nextra_link_args = [{ arg = \"-x\", marker = \"nonsense\" }]\n",
    ] {
        let err = ResolvedConfig::from_str(text, &registry).unwrap_err();
        assert!(err.is_config_error(), "input: {text}");
    }
}

#[test]
fn test_spec_missing_accessor_is_a_config_error() {
    let registry = ProviderRegistry::new();
    let err = ResolvedConfig::from_str(
        r#"
        [options]
        include_somelib = { pkg = "somelib", include = "gets_include" }
        "#,
        &registry,
    )
    .unwrap_err();
    assert!(matches!(&err, CyplanError::DependencySpecError { name, .. } if name == "somelib"));
    assert!(err.is_config_error());
}

#[test]
fn test_provider_key_with_wrong_type_is_a_config_error() {
    let registry = ProviderRegistry::new();
    let err = ResolvedConfig::from_str(
        r#"
        [options]
        include_somelib = "yes please"
        "#,
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, CyplanError::ConfigError { .. }));
}

#[test]
fn test_directives_must_be_a_table() {
    let registry = ProviderRegistry::new();
    let err = ResolvedConfig::from_str("[options]\ndirectives = 3\n", &registry).unwrap_err();
    assert!(matches!(err, CyplanError::ConfigError { .. }));
}

#[test]
fn test_platform_lists_never_cache_across_contexts() {
    let registry = ProviderRegistry::new();
    let config = ResolvedConfig::from_str(
        r#"
        [options]
        compile_args = [
            { platforms = ["windows"], arg = "-std=c++17" },
            { platforms = ["linux"], arg = "-Wcpp" },
        ]
        "#,
        &registry,
    )
    .unwrap();
    let nothing = |_: &std::path::Path| false;
    assert_eq!(
        config.compile_args_for_platform(&ctx(OsName::Windows, "x86_64"), &nothing),
        vec!["-std=c++17"]
    );
    assert_eq!(
        config.compile_args_for_platform(&ctx(OsName::Linux, "x86_64"), &nothing),
        vec!["-Wcpp"]
    );
    assert_eq!(
        config.compile_args_for_platform(&ctx(OsName::Windows, "x86_64"), &nothing),
        vec!["-std=c++17"]
    );
}
