//! FORMA Catalog - Exercise definitions as validated data
//!
//! Every exercise is a named set of stages, every stage a named set of
//! joint-angle rules. The catalog is built once at startup, validated in full,
//! and never mutated afterwards; share it behind an `Arc`.
//!
//! Sources:
//! - `ExerciseCatalog::builtin()` - the bundled exercises
//! - `ExerciseCatalog::from_json()` / `from_path()` - external configuration

pub mod builtin;
pub mod catalog;
pub mod definition;
pub mod naming;
pub mod raw;
pub mod rule;

pub use catalog::*;
pub use definition::*;
pub use naming::*;
pub use rule::*;
