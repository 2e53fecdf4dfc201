//! Graph normalization: validated connections plus forward/reverse adjacency.
//!
//! Blocks live in a `Vec` in declaration order and are referred to by their
//! index there; adjacency lists hold indices, never ids.

use crate::model::{Block, Connection, Model};
use std::collections::{HashMap, HashSet};

/// Immutable, validated block graph.
#[derive(Debug, Clone)]
pub struct Graph {
    blocks: Vec<Block>,
    index: HashMap<String, usize>,
    connections: Vec<Connection>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl Graph {
    /// Normalize an importer's output.
    ///
    /// - blocks with an id already seen are dropped
    /// - connections to unknown blocks, self-loops and repeated pairs are dropped
    ///
    /// Both adjacency lists keep first-seen connection order, which fixes the
    /// operand order of multi-input blocks.
    pub fn new(model: Model) -> Self {
        let mut blocks = Vec::with_capacity(model.blocks.len());
        let mut index = HashMap::with_capacity(model.blocks.len());
        for block in model.blocks {
            if index.contains_key(&block.id) {
                tracing::warn!(id = %block.id, name = %block.name, "duplicate block id dropped");
                continue;
            }
            index.insert(block.id.clone(), blocks.len());
            blocks.push(block);
        }

        let mut connections = Vec::with_capacity(model.connections.len());
        let mut successors = vec![Vec::new(); blocks.len()];
        let mut predecessors = vec![Vec::new(); blocks.len()];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for conn in model.connections {
            let (Some(&from), Some(&to)) = (index.get(&conn.from), index.get(&conn.to)) else {
                tracing::debug!(from = %conn.from, to = %conn.to, "dangling connection dropped");
                continue;
            };
            if from == to {
                tracing::debug!(id = %conn.from, "self-loop dropped");
                continue;
            }
            if !seen.insert((from, to)) {
                continue;
            }
            successors[from].push(to);
            predecessors[to].push(from);
            connections.push(conn);
        }

        Self {
            blocks,
            index,
            connections,
            successors,
            predecessors,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> &Block {
        &self.blocks[index]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Accepted connections, in first-seen order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Destinations fed by block `index`, first-seen order.
    pub fn successors(&self, index: usize) -> &[usize] {
        &self.successors[index]
    }

    /// Sources feeding block `index`, first-seen order.
    pub fn predecessors(&self, index: usize) -> &[usize] {
        &self.predecessors[index]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
