//! # Tandem Testkit
//!
//! Test utilities for Tandem.
//!
//! This crate provides:
//! - Store pair fixtures wired to a deterministic clock
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tandem_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_engine() {
//!     let pair = StorePair::new().with_local([("budget", 500)]);
//!     let engine = pair.engine();
//!     engine.sync().unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
