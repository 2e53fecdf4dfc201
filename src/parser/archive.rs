//! Archive (`.slx`) importer.
//!
//! An `.slx` file is a ZIP archive of XML documents. Every member ending in
//! `.xml` is scanned for block-like elements (tag contains "block" and a
//! `BlockType` attribute is present) and line-like elements (tag contains
//! "line"). A member that fails to parse is skipped; only an archive that
//! cannot be opened at all aborts the import.

use super::helpers::{endpoint_block, parse_position};
use super::source::ContentSource;
use super::DEFAULTS_SECTIONS;
use crate::model::{Block, Connection, IdSequence, Model};
use indexmap::IndexMap;
use roxmltree::{Document, Node};
use std::collections::HashMap;

/// Endpoints as written in the archive, resolved once every member is read.
struct PendingLine {
    src: String,
    dsts: Vec<String>,
}

/// Import every XML member of `source` into one canonical [`Model`].
///
/// Falls back to [`Model::demo`] when no member yields a block.
pub fn import_archive<S: ContentSource>(source: &mut S) -> Model {
    let mut ids = IdSequence::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut sid_to_id: HashMap<String, String> = HashMap::new();
    let mut lines: Vec<PendingLine> = Vec::new();

    let members = match source.list_files() {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("failed to list archive members: {:#}", e);
            Vec::new()
        }
    };

    for member in members
        .iter()
        .filter(|p| p.as_str().to_ascii_lowercase().ends_with(".xml"))
    {
        let text = match source.read_to_string(member) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(member = %member, "skipping unreadable member: {:#}", e);
                continue;
            }
        };
        let doc = match Document::parse(&text) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(member = %member, "skipping malformed XML member: {}", e);
                continue;
            }
        };
        for node in doc.descendants().filter(|n| n.is_element()) {
            let tag = node.tag_name().name().to_ascii_lowercase();
            if tag.contains("block") && !in_defaults(node) {
                if let Some(block_type) = node.attribute("BlockType") {
                    let block = parse_block(node, block_type, &mut ids);
                    if let Some(sid) = node.attribute("SID") {
                        sid_to_id.entry(sid.to_string()).or_insert_with(|| block.id.clone());
                    }
                    blocks.push(block);
                }
            }
            if tag.contains("line") {
                if let Some(line) = parse_line(node) {
                    lines.push(line);
                }
            }
        }
    }

    if blocks.is_empty() {
        tracing::info!("archive contains no blocks, using demonstration model");
        return Model::demo();
    }

    let resolve = |raw: &str| -> String {
        let reference = endpoint_block(raw);
        sid_to_id
            .get(reference)
            .cloned()
            .unwrap_or_else(|| reference.to_string())
    };
    let mut connections = Vec::new();
    for line in &lines {
        let from = resolve(&line.src);
        for dst in &line.dsts {
            connections.push(Connection::new(from.clone(), resolve(dst)));
        }
    }

    Model::new(blocks, connections)
}

/// Template blocks under `<BlockParameterDefaults>` are not part of the model.
fn in_defaults(node: Node) -> bool {
    node.ancestors()
        .any(|a| DEFAULTS_SECTIONS.iter().any(|d| a.has_tag_name(*d)))
}

fn parse_block(node: Node, block_type: &str, ids: &mut IdSequence) -> Block {
    let id = ids.next_id();
    let name = node
        .attribute("Name")
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Block_{}", id));
    let mut params: IndexMap<String, String> = IndexMap::new();
    let mut position: Option<String> = None;

    for child in node.children().filter(|c| c.is_element()) {
        match child.tag_name().name() {
            "P" => collect_param(child, &mut params),
            "InstanceData" => {
                for p in child
                    .children()
                    .filter(|c| c.is_element() && c.has_tag_name("P"))
                {
                    collect_param(p, &mut params);
                }
            }
            "Position" => position = child.text().map(|t| t.trim().to_string()),
            _ => {}
        }
    }
    let position = position.or_else(|| params.get("Position").cloned());
    let (x, y) = position.as_deref().map(parse_position).unwrap_or((0.0, 0.0));

    Block {
        id,
        block_type: block_type.to_string(),
        name,
        x,
        y,
        params,
    }
}

fn collect_param(p: Node, params: &mut IndexMap<String, String>) {
    if let (Some(name), Some(text)) = (p.attribute("Name"), p.text()) {
        if !name.is_empty() {
            params.insert(name.to_string(), text.trim().to_string());
        }
    }
}

/// Read `Src`/`Dst` from attributes, falling back to `<P Name="Src">` style
/// children. `Branch` children contribute extra destinations.
fn parse_line(node: Node) -> Option<PendingLine> {
    let src = endpoint(node, "Src")?;
    let mut dsts: Vec<String> = endpoint(node, "Dst").into_iter().collect();
    for branch in node
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("Branch"))
    {
        if let Some(dst) = endpoint(branch, "Dst") {
            dsts.push(dst);
        }
    }
    if dsts.is_empty() {
        return None;
    }
    Some(PendingLine { src, dsts })
}

fn endpoint(node: Node, key: &str) -> Option<String> {
    if let Some(v) = node.attribute(key).filter(|v| !v.is_empty()) {
        return Some(v.to_string());
    }
    node.children()
        .filter(|c| c.is_element() && c.has_tag_name("P"))
        .find(|c| c.attribute("Name") == Some(key))
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
