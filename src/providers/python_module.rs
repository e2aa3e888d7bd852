//! Interpreter-backed dependency provider.
//!
//! Resolves a provider spec by importing the package inside the target
//! interpreter and calling the named accessors. Each accessor call is one
//! short `python -c` script that prints its result as JSON; failure classes
//! are encoded in the exit status so the Rust side can tell "package not
//! installed" from "accessor missing" from "accessor blew up".

use serde_json::Value;

use super::{DependencyProvider, DependencyProviderSpec};
use crate::core::CyplanError;
use crate::python::{PythonInterpreter, parse_json_line, stderr_text};

/// Exit status signalling the module could not be imported.
const EXIT_IMPORT_ERROR: i32 = 23;
/// Exit status signalling the module lacks the named attribute.
const EXIT_ATTR_ERROR: i32 = 24;

/// [`DependencyProvider`] that asks the target interpreter.
///
/// Built-ins use the accessor tables the packages actually expose:
/// numpy has `get_include` and nothing else; pyarrow has all three.
#[derive(Debug, Clone)]
pub struct PythonModuleProvider {
    name: String,
    interpreter: PythonInterpreter,
    module: String,
    include_attr: Option<String>,
    libraries_attr: Option<String>,
    library_dirs_attr: Option<String>,
    setup_attr: Option<String>,
}

impl PythonModuleProvider {
    /// Builds a provider from a configuration-declared spec.
    #[must_use]
    pub fn from_spec(interpreter: PythonInterpreter, spec: &DependencyProviderSpec) -> Self {
        Self {
            name: spec.pkg.clone(),
            interpreter,
            module: spec.pkg.clone(),
            include_attr: Some(spec.include.clone()),
            libraries_attr: Some(spec.libraries.clone()),
            library_dirs_attr: Some(spec.library_dirs.clone()),
            setup_attr: spec.required_call.clone(),
        }
    }

    /// The built-in numpy shortcut (`include_numpy = true`).
    #[must_use]
    pub fn numpy(interpreter: PythonInterpreter) -> Self {
        Self {
            name: "numpy".to_string(),
            interpreter,
            module: "numpy".to_string(),
            include_attr: Some("get_include".to_string()),
            libraries_attr: None,
            library_dirs_attr: None,
            setup_attr: None,
        }
    }

    /// The built-in pyarrow shortcut (`include_pyarrow = true`).
    #[must_use]
    pub fn pyarrow(interpreter: PythonInterpreter) -> Self {
        Self {
            name: "pyarrow".to_string(),
            interpreter,
            module: "pyarrow".to_string(),
            include_attr: Some("get_include".to_string()),
            libraries_attr: Some("get_libraries".to_string()),
            library_dirs_attr: Some("get_library_dirs".to_string()),
            setup_attr: None,
        }
    }

    fn call_accessor(&self, accessor: &str) -> Result<Value, CyplanError> {
        let script = accessor_script(&self.module, accessor);
        let output = self.interpreter.run(&script)?;
        match output.status.code() {
            Some(0) => parse_json_line(&output.stdout),
            Some(EXIT_IMPORT_ERROR) => Err(CyplanError::ModuleNotFound {
                module: self.module.clone(),
                reason: stderr_text(&output),
            }),
            Some(EXIT_ATTR_ERROR) => Err(CyplanError::AccessorMissing {
                module: self.module.clone(),
                accessor: accessor.to_string(),
            }),
            _ => Err(CyplanError::AccessorFailed {
                module: self.module.clone(),
                accessor: accessor.to_string(),
                reason: stderr_text(&output),
            }),
        }
    }

    fn string_list(&self, accessor: Option<&str>) -> Result<Vec<String>, CyplanError> {
        match accessor {
            None => Ok(Vec::new()),
            Some(accessor) => {
                let value = self.call_accessor(accessor)?;
                coerce_string_list(value).map_err(|reason| CyplanError::AccessorFailed {
                    module: self.module.clone(),
                    accessor: accessor.to_string(),
                    reason,
                })
            }
        }
    }
}

impl DependencyProvider for PythonModuleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn includes(&self) -> Result<Vec<String>, CyplanError> {
        self.string_list(self.include_attr.as_deref())
    }

    fn libraries(&self) -> Result<Vec<String>, CyplanError> {
        self.string_list(self.libraries_attr.as_deref())
    }

    fn library_dirs(&self) -> Result<Vec<String>, CyplanError> {
        self.string_list(self.library_dirs_attr.as_deref())
    }

    fn setup(&self) -> Result<(), CyplanError> {
        let Some(hook) = self.setup_attr.as_deref() else {
            return Ok(());
        };
        tracing::debug!(module = %self.module, hook, "running dependency setup hook");
        self.call_accessor(hook).map(|_| ())
    }
}

/// The `-c` script calling one zero-argument accessor.
///
/// Non-callable attributes are passed through as values, matching how
/// packages sometimes expose plain constants next to accessor functions.
fn accessor_script(module: &str, accessor: &str) -> String {
    format!(
        r#"import importlib
import json
import sys
try:
    mod = importlib.import_module({module:?})
except ImportError as exc:
    sys.stderr.write(str(exc))
    sys.exit({import_exit})
try:
    attr = getattr(mod, {accessor:?})
except AttributeError as exc:
    sys.stderr.write(str(exc))
    sys.exit({attr_exit})
value = attr() if callable(attr) else attr
print(json.dumps(value))
"#,
        import_exit = EXIT_IMPORT_ERROR,
        attr_exit = EXIT_ATTR_ERROR,
    )
}

/// Folds an accessor result into a list of path/name strings.
///
/// Accepts a single string (numpy's `get_include`), a list of strings, or
/// null/absent (no contribution).
fn coerce_string_list(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(single) => Ok(vec![single]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(format!("expected a string, got {other}")),
            })
            .collect(),
        other => Err(format!("expected a path or list of paths, got {other}")),
    }
}
