//! Synchronous wrapper around the target Python interpreter.
//!
//! Dependency providers and context detection need answers only the target
//! interpreter can give (its version, `numpy.get_include()`, ...). Like a
//! package manager shelling out to the system `git`, cyplan shells out to the
//! system `python`: each query runs a short `-c` script that prints a single
//! line of JSON on stdout, which keeps the protocol trivial to parse with
//! `serde_json` and independent of the interpreter's minor version.
//!
//! All invocations are synchronous [`std::process::Command`] calls with no
//! timeout or retry: resolution happens once per configuration parse and each
//! script is a handful of in-memory lookups inside the interpreter.


use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::context::PythonVersion;
use crate::core::CyplanError;

/// Handle to a Python interpreter executable.
///
/// The handle is just a program path; every method spawns a fresh process.
///
/// # Examples
///
/// ```rust,no_run
/// use cyplan::PythonInterpreter;
///
/// # fn example() -> Result<(), cyplan::CyplanError> {
/// let interpreter = PythonInterpreter::find()?;
/// let version = interpreter.version()?;
/// println!("building against Python {version}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonInterpreter {
    program: PathBuf,
}

impl PythonInterpreter {
    /// Wraps an explicit interpreter path, e.g. one from a virtualenv.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locates an interpreter on `PATH`, preferring `python3` over `python`.
    ///
    /// # Errors
    ///
    /// Returns [`CyplanError::PythonNotFound`] if neither name resolves.
    pub fn find() -> Result<Self, CyplanError> {
        which::which("python3")
            .or_else(|_| which::which("python"))
            .map(Self::new)
            .map_err(|_| CyplanError::PythonNotFound)
    }

    /// The wrapped executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Queries the interpreter's `(major, minor)` version.
    pub fn version(&self) -> Result<PythonVersion, CyplanError> {
        let value = self.eval_json(
            "import sys",
            "[sys.version_info.major, sys.version_info.minor]",
        )?;
        let components: [u64; 2] = serde_json::from_value(value)?;
        Ok(PythonVersion::new(components[0], components[1]))
    }

    /// Evaluates one expression in the interpreter and parses the JSON result.
    ///
    /// `preamble` runs before the expression (imports, typically). The
    /// expression's value must be JSON-encodable.
    ///
    /// # Errors
    ///
    /// Returns [`CyplanError::PythonCommandError`] when the interpreter exits
    /// non-zero, and a JSON error when the output is unparseable.
    pub fn eval_json(&self, preamble: &str, expr: &str) -> Result<serde_json::Value, CyplanError> {
        let script = format!("import json\n{preamble}\nprint(json.dumps({expr}))");
        let output = self.run(&script)?;
        if !output.status.success() {
            return Err(CyplanError::PythonCommandError {
                operation: expr.to_string(),
                stderr: stderr_text(&output),
            });
        }
        parse_json_line(&output.stdout)
    }

    /// Runs a `-c` script and returns the raw process output.
    ///
    /// The exit status is *not* checked; callers that encode failure classes
    /// in exit codes (the provider accessor protocol) classify it themselves.
    ///
    /// # Errors
    ///
    /// Only spawn-level failures error here. A missing executable maps to
    /// [`CyplanError::PythonNotFound`].
    pub fn run(&self, script: &str) -> Result<Output, CyplanError> {
        tracing::trace!(program = %self.program.display(), "invoking python");
        Command::new(&self.program).arg("-c").arg(script).output().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                CyplanError::PythonNotFound
            } else {
                CyplanError::IoError(err)
            }
        })
    }
}

/// Extracts the interpreter's JSON payload: the last non-empty stdout line.
///
/// Imported modules are free to print noise during import (build banners,
/// deprecation chatter routed to stdout); only the final line is ours.
pub(crate) fn parse_json_line(stdout: &[u8]) -> Result<serde_json::Value, CyplanError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text.lines().filter(|line| !line.trim().is_empty()).next_back().unwrap_or("");
    Ok(serde_json::from_str(line)?)
}

/// Trimmed stderr of a finished process, for error messages.
pub(crate) fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
