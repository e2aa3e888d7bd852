//! Typed marker predicates gating flag entries on the build environment.
//!
//! A marker is a single comparison such as `python_version == '3.9'` or
//! `python_version >= "3.10"`. Markers are parsed exactly once - at
//! configuration-parse time - into a structured [`Marker`] predicate rather
//! than being re-evaluated as text, so a malformed expression aborts the
//! parse immediately and evaluation is a trivial version comparison.
//!
//! # Grammar
//!
//! ```text
//! marker     = identifier comparator literal
//! identifier = "python_version"
//! comparator = "==" | "!=" | "<" | "<=" | ">" | ">="
//! literal    = optionally quoted dotted version, 1-3 numeric components
//! ```
//!
//! Version literals are loose: `'3'`, `'3.9'`, and `'3.9.1'` are all valid
//! and are zero-padded to three components, as is the context's
//! `(major, minor)` pair, so comparisons behave like component-wise tuple
//! comparison.
//!
//! An identifier outside the vocabulary is a parse error, not a silently
//! false predicate: a typo in a marker must not quietly drop a compiler flag.


use semver::Version;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::context::BuildContext;
use crate::core::CyplanError;

/// Comparison operator of a marker predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparator {
    /// Applies the comparison to an ordering of `left` versus `right`.
    #[must_use]
    pub fn compare(self, left: &Version, right: &Version) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
        }
    }

    const fn token(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The environment value a marker compares against.
///
/// Currently restricted to interpreter version components; the enum exists so
/// the vocabulary can grow without touching the evaluation call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerField {
    /// The target interpreter's `(major, minor)` version
    PythonVersion,
}

impl MarkerField {
    fn parse(identifier: &str) -> Result<Self, CyplanError> {
        match identifier {
            "python_version" => Ok(Self::PythonVersion),
            other => Err(CyplanError::UnknownMarkerIdentifier {
                identifier: other.to_string(),
            }),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::PythonVersion => "python_version",
        }
    }

    fn value(self, context: &BuildContext) -> Version {
        match self {
            Self::PythonVersion => context.python_version.as_semver(),
        }
    }
}

/// A parsed marker predicate.
///
/// Constructed from the textual form via [`FromStr`] (or serde, on flag
/// entries); evaluation never re-parses the expression.
///
/// # Examples
///
/// ```rust
/// use cyplan::{BuildContext, Marker, OsName, PythonVersion};
///
/// let marker: Marker = "python_version >= '3.10'".parse()?;
/// let py39 = BuildContext::new(PythonVersion::new(3, 9), OsName::Linux, "x86_64");
/// let py311 = BuildContext::new(PythonVersion::new(3, 11), OsName::Linux, "x86_64");
/// assert!(!marker.evaluate(&py39));
/// assert!(marker.evaluate(&py311));
/// # Ok::<(), cyplan::CyplanError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Marker {
    field: MarkerField,
    op: Comparator,
    value: Version,
}

impl Marker {
    /// Evaluates the predicate against a build context.
    ///
    /// Absent markers are handled by the caller ([`crate::FlagEntry`] stores
    /// `Option<Marker>` and treats `None` as always true).
    #[must_use]
    pub fn evaluate(&self, context: &BuildContext) -> bool {
        self.op.compare(&self.field.value(context), &self.value)
    }
}

impl FromStr for Marker {
    type Err = CyplanError;

    fn from_str(marker: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| CyplanError::MarkerParseError {
            marker: marker.to_string(),
            reason: reason.to_string(),
        };

        // Two-character comparators must be tried before their one-character
        // prefixes, or "<=" would split as "<" with a dangling "=".
        let (op, position, width) = ["==", "!=", "<=", ">=", "<", ">"]
            .iter()
            .find_map(|token| marker.find(token).map(|at| (*token, at, token.len())))
            .ok_or_else(|| malformed("no comparator found"))?;

        let identifier = marker[..position].trim();
        if identifier.is_empty() {
            return Err(malformed("missing identifier before comparator"));
        }
        let field = MarkerField::parse(identifier)?;

        let op = match op {
            "==" => Comparator::Eq,
            "!=" => Comparator::Ne,
            "<=" => Comparator::Le,
            ">=" => Comparator::Ge,
            "<" => Comparator::Lt,
            ">" => Comparator::Gt,
            _ => unreachable!(),
        };

        let literal = unquote(marker[position + width..].trim())
            .ok_or_else(|| malformed("unbalanced quotes around version literal"))?;
        if literal.is_empty() {
            return Err(malformed("missing version literal after comparator"));
        }
        let value = parse_loose_version(literal).map_err(|reason| malformed(&reason))?;

        Ok(Self {
            field,
            op,
            value,
        })
    }
}

impl TryFrom<String> for Marker {
    type Error = CyplanError;

    fn try_from(marker: String) -> Result<Self, Self::Error> {
        marker.parse()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '{}'", self.field.name(), self.op, self.value)
    }
}

/// Strips one matching pair of single or double quotes, if present.
///
/// Returns `None` for unbalanced quoting (`'3.9` or `3.9"`).
fn unquote(literal: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        let starts = literal.starts_with(quote);
        let ends = literal.len() > 1 && literal.ends_with(quote);
        match (starts, ends) {
            (true, true) => return Some(&literal[1..literal.len() - 1]),
            (true, false) | (false, true) => return None,
            (false, false) => {}
        }
    }
    Some(literal)
}

/// Parses a loose dotted version (`3`, `3.9`, `3.9.1`) into a padded
/// [`semver::Version`].
fn parse_loose_version(literal: &str) -> Result<Version, String> {
    let mut components = [0_u64; 3];
    let parts: Vec<&str> = literal.split('.').collect();
    if parts.len() > 3 {
        return Err(format!("version literal '{literal}' has more than 3 components"));
    }
    for (slot, part) in components.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| format!("non-numeric version component '{part}'"))?;
    }
    Ok(Version::new(components[0], components[1], components[2]))
}
