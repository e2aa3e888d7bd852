//! Core types shared across the resolution pipeline.
//!
//! This module currently hosts the error system. cyplan distinguishes two
//! failure classes (see [`error`]):
//!
//! - **Configuration errors**: the parsed TOML tree has the wrong shape - a
//!   flag entry that is not a table, a malformed marker expression, a
//!   dependency spec missing a required accessor name. These abort the parse
//!   immediately; no partial result is usable because later flags may depend
//!   on earlier ones.
//! - **Dependency-resolution errors**: a declared provider cannot deliver its
//!   include/library information - the provider is not registered, the Python
//!   module is not importable, or a named accessor is missing. These are also
//!   fatal: a build plan with a missing native dependency is guaranteed to
//!   fail later, so the parse fails fast instead.

pub mod error;

pub use error::CyplanError;
