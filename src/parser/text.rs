//! Legacy text (`.mdl`) importer.
//!
//! Blocks and lines live in nested `Block { ... }` / `Line { ... }` sections.
//! Lines refer to blocks by *name*, so connections are resolved only after
//! every block has been read.

use super::helpers::parse_position;
use super::sections::{Section, entries, entry, find_sections};
use super::DEFAULTS_SECTIONS;
use crate::error::ImportError;
use crate::model::{Block, Connection, IdSequence, Model};
use camino::Utf8Path;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Keys consumed by the block header rather than stored as parameters.
const HEADER_KEYS: [&str; 3] = ["BlockType", "Name", "Position"];

/// Spellings normalized to the canonical block type tag.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("S-Function", "SFunction"),
    ("Transfer Fcn", "TransferFcn"),
    ("TransferFunction", "TransferFcn"),
    ("Sine Wave", "SineWave"),
    ("Zero-Order Hold", "ZeroOrderHold"),
    ("Unit Delay", "UnitDelay"),
    ("PID Controller", "PIDController"),
    ("Subsystem", "SubSystem"),
    ("Relational Operator", "RelationalOperator"),
    ("Discrete Filter", "DiscreteFilter"),
    ("Pulse Generator", "PulseGenerator"),
    ("Discrete-Time Integrator", "DiscreteIntegrator"),
    ("MATLAB Function", "MATLABFunction"),
    ("Transport Delay", "TransportDelay"),
];

/// Canonical tag for a block type spelling; unknown spellings pass through.
pub fn normalize_block_type(raw: &str) -> String {
    let raw = raw.trim();
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Read and import a text model file.
pub fn import_text_file(path: &Utf8Path) -> Result<Model, ImportError> {
    let raw = std::fs::read(path.as_std_path()).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&raw);
    if content.trim().is_empty() {
        return Err(ImportError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(parse_text(&content))
}

/// Parse the contents of a text model into a canonical [`Model`].
pub fn parse_text(content: &str) -> Model {
    let defaults: Vec<Section> = DEFAULTS_SECTIONS
        .iter()
        .flat_map(|kw| find_sections(content, kw))
        .collect();
    let in_defaults = |s: &Section| defaults.iter().any(|d| d.contains(s.start));

    let mut ids = IdSequence::new();
    let mut blocks = Vec::new();
    for section in find_sections(content, "Block") {
        if in_defaults(&section) {
            continue;
        }
        match parse_block(section.body, &mut ids) {
            Some(block) => blocks.push(block),
            None => tracing::debug!(offset = section.start, "Block section without BlockType skipped"),
        }
    }

    let resolver = NameResolver::new(&blocks);
    let mut connections = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for section in find_sections(content, "Line") {
        for (src, dst) in line_endpoints(section.body) {
            let (Some(from), Some(to)) = (resolver.resolve(&src), resolver.resolve(&dst)) else {
                tracing::debug!(%src, %dst, "dropping connection with unresolved endpoint");
                continue;
            };
            if from == to {
                tracing::debug!(%src, "dropping self-loop");
                continue;
            }
            if seen.insert((from.to_string(), to.to_string())) {
                connections.push(Connection::new(from, to));
            }
        }
    }

    Model::new(blocks, connections)
}

fn parse_block(body: &str, ids: &mut IdSequence) -> Option<Block> {
    let fields = entries(body);
    let block_type = fields
        .iter()
        .find(|(k, _)| *k == "BlockType")
        .map(|(_, v)| normalize_block_type(v))?;
    let id = ids.next_id();
    let name = fields
        .iter()
        .find(|(k, _)| *k == "Name")
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| format!("Block_{}", id));
    let (x, y) = fields
        .iter()
        .find(|(k, _)| *k == "Position")
        .map(|(_, v)| parse_position(v))
        .unwrap_or((0.0, 0.0));

    let mut params = IndexMap::new();
    for (key, value) in fields {
        if !HEADER_KEYS.contains(&key) {
            params.insert(key.to_string(), value);
        }
    }

    Some(Block {
        id,
        block_type,
        name,
        x,
        y,
        params,
    })
}

/// `(SrcBlock, DstBlock)` name pairs of one Line section: its own
/// destination first, then every Branch destination in textual order.
fn line_endpoints(body: &str) -> Vec<(String, String)> {
    let Some(src) = entry(body, "SrcBlock") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if let Some(dst) = entry(body, "DstBlock") {
        out.push((src.clone(), dst));
    }
    for branch in find_sections(body, "Branch") {
        if let Some(dst) = entry(branch.body, "DstBlock") {
            out.push((src.clone(), dst));
        }
    }
    out
}

/// Name → id lookup: exact match first, then a whitespace-trimmed match.
/// When names repeat, the last declared block wins.
struct NameResolver<'a> {
    exact: HashMap<&'a str, &'a str>,
    trimmed: HashMap<&'a str, &'a str>,
}

impl<'a> NameResolver<'a> {
    fn new(blocks: &'a [Block]) -> Self {
        let mut exact = HashMap::new();
        let mut trimmed = HashMap::new();
        for b in blocks {
            exact.insert(b.name.as_str(), b.id.as_str());
            trimmed.insert(b.name.trim(), b.id.as_str());
        }
        Self { exact, trimmed }
    }

    fn resolve(&self, name: &str) -> Option<&'a str> {
        self.exact
            .get(name)
            .or_else(|| self.trimmed.get(name.trim()))
            .copied()
    }
}
