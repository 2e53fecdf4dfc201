//! Simulink model to C converter.
//!
//! The pipeline is: an importer ([`parser`]) turns a `.slx` archive or a
//! `.mdl` text model into a [`model::Model`]; [`graph::Graph`] validates it and
//! builds adjacency; [`schedule`] orders the blocks; [`generator`] lowers
//! every block through a rule table into one C program with a step function,
//! an initializer and a demonstration `main`.
//!
//! [`convert`] wraps the whole pipeline for a file on disk or uploaded bytes.
//! The binary `simtoc` is a thin CLI over it.

pub mod config;
pub mod convert;
pub mod error;
pub mod generator;
pub mod graph;
pub mod logging;
pub mod model;
pub mod parser;
pub mod sanitize;
pub mod schedule;

pub use config::{Config, GeneratorConfig};
pub use convert::{Conversion, convert_path, convert_upload};
pub use error::{ConvertError, ImportError};
pub use graph::Graph;
pub use model::{Block, Connection, Model};
