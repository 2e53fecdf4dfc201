//! Model importers.
//!
//! Each importer turns one kind of source artifact into the canonical
//! [`Model`]. Sub-modules:
//!
//! - [`source`] – Archive member access (ZIP vs. in-memory)
//! - [`helpers`] – Position / endpoint parsing
//! - [`archive`] – `.slx` (ZIP + XML) importer
//! - [`sections`] – Nested `Keyword { ... }` section scanner
//! - [`text`] – `.mdl` (brace-delimited text) importer

pub mod archive;
pub mod helpers;
pub mod sections;
pub mod source;
pub mod text;

pub use archive::import_archive;
pub use source::*;
pub use text::{import_text_file, normalize_block_type, parse_text};

use crate::error::ImportError;
use crate::model::Model;
use camino::Utf8Path;

/// Sections holding template blocks rather than model blocks.
pub(crate) const DEFAULTS_SECTIONS: [&str; 2] = ["BlockParameterDefaults", "BlockDefaults"];

/// Anything that can turn an artifact on disk into the canonical graph.
///
/// Importers for other artifact kinds (rendered images, text-extracted
/// documents) plug in here and feed the same normalizer and generator.
pub trait Importer {
    fn import(&self, path: &Utf8Path) -> Result<Model, ImportError>;
}

/// `.slx` importer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveImporter;

impl Importer for ArchiveImporter {
    fn import(&self, path: &Utf8Path) -> Result<Model, ImportError> {
        let mut source = ZipSource::open(path)?;
        Ok(import_archive(&mut source))
    }
}

/// `.mdl` importer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextImporter;

impl Importer for TextImporter {
    fn import(&self, path: &Utf8Path) -> Result<Model, ImportError> {
        import_text_file(path)
    }
}

/// Source artifact formats handled in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Archive,
    Text,
}

impl SourceFormat {
    /// Format for a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "slx" => Some(SourceFormat::Archive),
            "mdl" => Some(SourceFormat::Text),
            _ => None,
        }
    }

    pub fn importer(self) -> &'static dyn Importer {
        match self {
            SourceFormat::Archive => &ArchiveImporter,
            SourceFormat::Text => &TextImporter,
        }
    }
}
