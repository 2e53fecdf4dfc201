//! C code generation from a normalized block graph.
//!
//! This module provides:
//! - [`registry`] – block type → lowering rule table.
//! - [`rules`] – the built-in rules for every supported block kind.
//! - [`numeric`] – coercion of raw parameter text into C literals.
//! - [`program`] – assembles scheduled block statements into a full program.

pub mod numeric;
pub mod program;
pub mod registry;
pub mod rules;

pub use program::{CodeGenerator, Plan};
pub use registry::{BlockContext, BlockRule, BusAccess, PortKind, Registry, StateVar};
