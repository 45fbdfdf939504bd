//! Error types for the tiercache library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods on the store and the tier manager,
//!   and the minimum-level resolution when tier bookkeeping is inconsistent).
//! - [`ConfigError`]: Returned when cache configuration parameters are
//!   invalid (e.g. zero capacity passed to the strict builder path).
//!
//! Absence of a key is never an error anywhere in this crate; lookups signal
//! it with `Option::None`.
//!
//! ## Example Usage
//!
//! ```
//! use tiercache::builder::{CacheBuilder, CachePolicy};
//! use tiercache::error::ConfigError;
//!
//! // The strict path rejects a zero capacity instead of coercing it.
//! let err: ConfigError = CacheBuilder::new(0)
//!     .try_build::<u64, String>(CachePolicy::Lru)
//!     .unwrap_err();
//! assert!(err.to_string().contains("capacity"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods on
/// [`RecencyStore`](crate::ds::RecencyStore) and
/// [`LfuCore`](crate::policy::lfu::LfuCore), and surfaced (logged, never
/// panicked on in release builds) when minimum-level resolution finds no
/// occupied tier while keys remain tracked. Carries a human-readable
/// description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// The non-strict [`build`](crate::builder::CacheBuilder::build) path coerces
/// a zero capacity to the default instead of returning this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("chain length mismatch");
        assert_eq!(err.to_string(), "chain length mismatch");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("tier 3 tracked but empty");
        assert_eq!(err.message(), "tier 3 tracked but empty");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be greater than zero");
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn both_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
        assert_error::<ConfigError>();
    }
}
