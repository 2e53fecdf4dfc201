use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

/// One simulation unit of a block diagram.
///
/// `params` holds the raw parameter text exactly as found in the source
/// artifact. Nothing is coerced at import time; the lowering rules decide
/// which keys are numeric and how to fall back when they are not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique within one conversion, assigned in discovery order.
    pub id: String,
    /// Block kind (e.g. "Gain", "Integrator", "SFunction"). Unknown kinds are kept verbatim.
    #[serde(rename = "type")]
    pub block_type: String,
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

impl Block {
    pub fn new(
        id: impl Into<String>,
        block_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            name: name.into(),
            x: 0.0,
            y: 0.0,
            params: IndexMap::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Raw parameter value, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Connection
// ────────────────────────────────────────────────────────────────────────────

/// A directed wire from one block's output to another block's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

impl Connection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model
// ────────────────────────────────────────────────────────────────────────────

/// Raw importer output: blocks and connections before normalization.
///
/// Every importer (archive, text, and any external one) produces this shape;
/// [`crate::graph::Graph::new`] takes it from there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
}

impl Model {
    pub fn new(blocks: Vec<Block>, connections: Vec<Connection>) -> Self {
        Self {
            blocks,
            connections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The fixed Inport → Gain → Integrator → Outport graph returned by the
    /// archive importer when no XML member yields any block.
    pub fn demo() -> Self {
        let blocks = vec![
            Block::new("1", "Inport", "Input").at(50.0, 100.0),
            Block::new("2", "Gain", "Gain1")
                .at(200.0, 100.0)
                .with_param("Gain", "2.0"),
            Block::new("3", "Integrator", "Int1")
                .at(350.0, 100.0)
                .with_param("InitialCondition", "0"),
            Block::new("4", "Outport", "Output").at(500.0, 100.0),
        ];
        let connections = vec![
            Connection::new("1", "2"),
            Connection::new("2", "3"),
            Connection::new("3", "4"),
        ];
        Self {
            blocks,
            connections,
        }
    }
}

/// Per-conversion block id generator: "1", "2", "3", ...
///
/// Each importer run owns its own sequence, so ids never leak between
/// conversions.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: u32,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.last += 1;
        self.last.to_string()
    }
}
