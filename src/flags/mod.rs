//! Scoped flag entries and the platform filtering engine.
//!
//! A [`FlagEntry`] is one compiler or linker argument plus optional scoping:
//! a platform set, an architecture set, and a marker predicate. The engine
//! ([`resolve_for_platform`]) filters an ordered entry list against a
//! [`BuildContext`] and flattens it into the final argument list.
//!
//! Scoping is conjunctive across the three predicates and disjunctive within
//! each set: an entry applies when *every* declared scope matches, and a set
//! matches when *any* of its members does. Entry order is significant - the
//! output preserves declaration order, never re-sorts, and never deduplicates
//! declared arguments (only injected platform-default paths are deduplicated).
//!
//! ```toml
//! compile_args = [
//!     { platforms = ["windows"], arg = "-std=c++17" },
//!     { platforms = ["linux", "darwin"], arg = "-Wcpp" },
//!     { arch = ["anon"], arg = "-O1" },
//!     { arch = ["arm64"], arg = "-O3" },
//!     { arg = "-py39", marker = "python_version == '3.9'" },
//! ]
//! ```

#[cfg(test)]
mod flags_tests;

use serde::Deserialize;

use crate::context::BuildContext;
use crate::marker::Marker;

/// Architecture wildcard matching contexts with no architecture information.
///
/// `arch = ["anon"]` scopes an entry to builds where the architecture could
/// not be determined; it does *not* match any concrete architecture.
pub const ANON_ARCH: &str = "anon";

/// One compiler/linker argument with optional platform/arch/marker scoping.
///
/// Immutable once parsed. Empty scope sets mean "applies everywhere".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlagEntry {
    /// The literal argument contributed when the entry applies
    pub arg: String,
    /// Target platforms (`windows` / `linux` / `darwin` / `other`); empty = all
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Target architectures; empty = all, [`ANON_ARCH`] = unspecified-arch only
    #[serde(default)]
    pub arch: Vec<String>,
    /// Optional predicate over the build environment
    #[serde(default)]
    pub marker: Option<Marker>,
}

impl FlagEntry {
    /// Creates an unscoped entry that applies to every context.
    pub fn new(arg: impl Into<String>) -> Self {
        Self {
            arg: arg.into(),
            platforms: Vec::new(),
            arch: Vec::new(),
            marker: None,
        }
    }

    /// Whether this entry applies under `context`.
    ///
    /// The three scope predicates compose with AND; membership within each
    /// set composes with OR.
    #[must_use]
    pub fn applies_to(&self, context: &BuildContext) -> bool {
        self.matches_platform(context) && self.matches_arch(context) && self.matches_marker(context)
    }

    fn matches_platform(&self, context: &BuildContext) -> bool {
        self.platforms.is_empty() || self.platforms.iter().any(|p| p == context.os.name())
    }

    fn matches_arch(&self, context: &BuildContext) -> bool {
        if self.arch.is_empty() {
            return true;
        }
        if self.arch.iter().any(|a| a == &context.arch) {
            return true;
        }
        context.arch_unspecified() && self.arch.iter().any(|a| a == ANON_ARCH)
    }

    fn matches_marker(&self, context: &BuildContext) -> bool {
        self.marker.as_ref().is_none_or(|m| m.evaluate(context))
    }
}

/// Filters `entries` against `context` and flattens them into argument form.
///
/// The result is `prefix ++ filtered ++ suffix`, in declared order. Declared
/// arguments pass through verbatim, duplicates included. Prefix and suffix
/// elements are the injected platform defaults; an injected flag already
/// present in the output is skipped rather than duplicated.
///
/// Compile arguments use `prefix` for default include flags (defaults must be
/// visible before user overrides); link arguments use `suffix` for default
/// library search paths (consulted as a fallback after user-specified ones).
#[must_use]
pub fn resolve_for_platform(
    entries: &[FlagEntry],
    context: &BuildContext,
    prefix: &[String],
    suffix: &[String],
) -> Vec<String> {
    let declared: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.applies_to(context))
        .map(|entry| entry.arg.as_str())
        .collect();
    tracing::trace!(
        total = entries.len(),
        kept = declared.len(),
        os = %context.os,
        arch = %context.arch,
        "filtered flag entries"
    );

    let mut resolved = Vec::with_capacity(prefix.len() + declared.len() + suffix.len());
    for flag in prefix {
        if !declared.contains(&flag.as_str()) && !resolved.iter().any(|existing| existing == flag) {
            resolved.push(flag.clone());
        }
    }
    resolved.extend(declared.iter().map(ToString::to_string));
    for flag in suffix {
        if !resolved.iter().any(|existing| existing == flag) {
            resolved.push(flag.clone());
        }
    }
    resolved
}
