//! Test support utilities for the relational operator workspace.
//!
//! This crate provides:
//! - Isolated databases in temporary directories
//! - Sample schemas and attribute value builders
//! - Assertion helpers for statuses and relation contents
//! - Property-based test generators for attribute text and operators
//!
//! # Example Usage
//!
//! ```no_run
//! use testsupport::prelude::*;
//!
//! let mut ctx = TestContext::new().unwrap();
//! ctx.db_mut().create_relation("emp", &emp_schema()).unwrap();
//! ctx.db().insert("emp", &emp_values("1", "ann", "2.5")).unwrap();
//! assert_relation_len(ctx.db(), "emp", 1);
//! ```

pub mod assertions;
pub mod context;
pub mod fixtures;
pub mod macros;
pub mod proptest_generators;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::context::*;
    pub use crate::fixtures::*;
}
