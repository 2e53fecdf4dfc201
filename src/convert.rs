//! One-shot conversion: artifact in, program and diagram summary out.
//!
//! Each call owns its own importer state, graph and symbol space, so
//! conversions can run concurrently. An uploaded artifact lives in a named
//! temporary file for exactly the duration of one conversion.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::error::ConvertError;
use crate::generator::CodeGenerator;
use crate::graph::Graph;
use crate::model::{Block, Connection};
use crate::parser::SourceFormat;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl From<&Block> for BlockSummary {
    fn from(b: &Block) -> Self {
        Self {
            id: b.id.clone(),
            block_type: b.block_type.clone(),
            name: b.name.clone(),
            x: b.x,
            y: b.y,
        }
    }
}

/// The normalized graph as the caller sees it (positions included). Dropped
/// connections and duplicate blocks are not reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub blocks: Vec<BlockSummary>,
    pub connections: Vec<Connection>,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub success: bool,
    pub c_code: String,
    pub diagram: Diagram,
    pub block_count: usize,
    pub connection_count: usize,
}

impl Conversion {
    fn new(graph: &Graph, c_code: String) -> Self {
        Self {
            success: true,
            c_code,
            diagram: Diagram {
                blocks: graph.blocks().iter().map(BlockSummary::from).collect(),
                connections: graph.connections().to_vec(),
            },
            block_count: graph.len(),
            connection_count: graph.connections().len(),
        }
    }
}

/// Extension of `file_name` as the dispatcher sees it: the text after the
/// last `.`, lower-cased (the whole name when there is no `.`).
fn extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_ascii_lowercase()
}

fn format_for(file_name: &str) -> Result<SourceFormat, ConvertError> {
    let ext = extension(file_name);
    SourceFormat::from_extension(&ext)
        .ok_or_else(|| ConvertError::Input(format!("Unsupported file type: .{}", ext)))
}

/// Import `path` and generate the program for it.
pub fn convert_path(path: &Utf8Path, config: &GeneratorConfig) -> Result<Conversion, ConvertError> {
    let format = format_for(path.file_name().unwrap_or(path.as_str()))?;
    convert_as(format, path, config)
}

fn convert_as(
    format: SourceFormat,
    path: &Utf8Path,
    config: &GeneratorConfig,
) -> Result<Conversion, ConvertError> {
    tracing::debug!(%path, ?format, "importing model");
    let graph = Graph::new(format.importer().import(path)?);
    let c_code = CodeGenerator::new(config.clone()).generate(&graph);
    Ok(Conversion::new(&graph, c_code))
}

/// Convert uploaded bytes. The bytes are stored in a temporary file that is
/// removed when this function returns, whatever the outcome.
pub fn convert_upload(
    file_name: &str,
    bytes: &[u8],
    config: &GeneratorConfig,
) -> Result<Conversion, ConvertError> {
    if file_name.trim().is_empty() {
        return Err(ConvertError::Input("Empty filename".to_string()));
    }
    let format = format_for(file_name)?;
    if bytes.is_empty() {
        return Err(ConvertError::Input("No file uploaded".to_string()));
    }

    let mut upload = tempfile::Builder::new()
        .prefix("simtoc-")
        .suffix(&format!(".{}", extension(file_name)))
        .tempfile()?;
    upload.write_all(bytes)?;
    upload.flush()?;

    let path = Utf8PathBuf::from_path_buf(upload.path().to_path_buf())
        .map_err(|p| std::io::Error::other(format!("temporary path {} is not UTF-8", p.display())))?;
    let result = convert_as(format, &path, config);
    // Dropping `upload` deletes the file; close() surfaces deletion errors.
    if let Err(e) = upload.close() {
        tracing::warn!(error = %e, "failed to remove uploaded model");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch() {
        assert_eq!(extension("Model.SLX"), "slx");
        assert_eq!(extension("a.b.mdl"), "mdl");
        assert_eq!(extension("noext"), "noext");
        assert!(matches!(format_for("x.mdl"), Ok(SourceFormat::Text)));
        let err = format_for("diagram.pdf").unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Unsupported file type: .pdf");
    }
}
