//! Lowering rule registry.
//!
//! A [`Registry`] maps a block type tag to a [`BlockRule`]: a bundle of pure
//! functions describing what the block contributes to each section of the
//! generated program. Supporting a new block kind means registering a rule;
//! the importers, normalizer and scheduler never change.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::rules;

/// Everything a rule may look at when lowering one block.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub block_type: &'a str,
    /// Raw display name (comments only).
    pub display_name: &'a str,
    /// Unique sanitized identifier of the block.
    pub name: &'a str,
    /// Wire this block writes (`sig_<name>`).
    pub output: &'a str,
    /// First input wire, or `"0.0"` when unconnected.
    pub input: &'a str,
    /// All input wires in connection order.
    pub inputs: &'a [String],
    pub params: &'a IndexMap<String, String>,
}

impl BlockContext<'_> {
    /// Raw value of the first present key.
    pub fn raw(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.params.get(*k))
            .map(|s| s.as_str())
    }

    /// Input wire `i`, or `"0.0"` when fewer inputs are connected.
    pub fn input_at(&self, i: usize) -> &str {
        self.inputs.get(i).map(|s| s.as_str()).unwrap_or("0.0")
    }
}

/// A persistent variable owned by one block.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVar {
    /// C type of the variable (or of its elements).
    pub c_type: &'static str,
    pub name: String,
    /// Element count for array state.
    pub len: Option<usize>,
    /// Value assigned by the initializer function (scalars only; arrays are zeroed).
    pub init: String,
}

impl StateVar {
    pub fn scalar(name: String, init: impl Into<String>) -> Self {
        Self {
            c_type: "Signal",
            name,
            len: None,
            init: init.into(),
        }
    }

    pub fn clock(name: String) -> Self {
        Self {
            c_type: "double",
            name,
            len: None,
            init: "0.0".into(),
        }
    }

    pub fn array(name: String, len: usize) -> Self {
        Self {
            c_type: "Signal",
            name,
            len: Some(len),
            init: "0.0".into(),
        }
    }

    pub fn declaration(&self) -> String {
        match self.len {
            Some(n) => format!("static {} {}[{}] = {{0}};", self.c_type, self.name, n),
            None => format!("static {} {} = 0.0;", self.c_type, self.name),
        }
    }

    pub fn reset(&self) -> String {
        match self.len {
            Some(_) => format!("memset({0}, 0, sizeof({0}));", self.name),
            None => format!("{} = {};", self.name, self.init),
        }
    }
}

/// Whether a block is part of the step function's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Input,
    Output,
}

/// Participation in a named bus cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusAccess {
    Write(String),
    Read(String),
}

impl BusAccess {
    pub fn tag(&self) -> &str {
        match self {
            BusAccess::Write(t) | BusAccess::Read(t) => t,
        }
    }
}

fn no_state(_: &BlockContext) -> Vec<StateVar> {
    Vec::new()
}

fn no_constants(_: &BlockContext) -> Vec<String> {
    Vec::new()
}

fn no_bus(_: &BlockContext) -> Option<BusAccess> {
    None
}

/// How one block kind is lowered.
#[derive(Clone, Copy)]
pub struct BlockRule {
    pub port: Option<PortKind>,
    /// State the block owns; declared once and reset by the initializer.
    pub state: fn(&BlockContext) -> Vec<StateVar>,
    /// File-scope constant declarations.
    pub constants: fn(&BlockContext) -> Vec<String>,
    pub bus: fn(&BlockContext) -> Option<BusAccess>,
    /// Statements for the step function body.
    pub lower: fn(&BlockContext) -> Vec<String>,
}

impl BlockRule {
    pub fn new(lower: fn(&BlockContext) -> Vec<String>) -> Self {
        Self {
            port: None,
            state: no_state,
            constants: no_constants,
            bus: no_bus,
            lower,
        }
    }

    pub fn port(mut self, kind: PortKind) -> Self {
        self.port = Some(kind);
        self
    }

    pub fn state(mut self, state: fn(&BlockContext) -> Vec<StateVar>) -> Self {
        self.state = state;
        self
    }

    pub fn constants(mut self, constants: fn(&BlockContext) -> Vec<String>) -> Self {
        self.constants = constants;
        self
    }

    pub fn bus(mut self, bus: fn(&BlockContext) -> Option<BusAccess>) -> Self {
        self.bus = bus;
        self
    }
}

impl std::fmt::Debug for BlockRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRule").field("port", &self.port).finish_non_exhaustive()
    }
}

/// Block type tag → rule.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: HashMap<String, BlockRule>,
    fallback: Option<BlockRule>,
}

static BUILTIN: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::default();
    rules::register_all(&mut registry);
    registry
});

impl Registry {
    /// The shared registry with every built-in block kind.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Register (or replace) the rule for `block_type`.
    pub fn register(&mut self, block_type: impl Into<String>, rule: BlockRule) -> &mut Self {
        self.rules.insert(block_type.into(), rule);
        self
    }

    /// Register the same rule under several tags.
    pub fn register_all(&mut self, block_types: &[&str], rule: BlockRule) -> &mut Self {
        for t in block_types {
            self.register(*t, rule);
        }
        self
    }

    /// Rule for types no entry matches.
    pub fn set_fallback(&mut self, rule: BlockRule) -> &mut Self {
        self.fallback = Some(rule);
        self
    }

    pub fn get(&self, block_type: &str) -> Option<&BlockRule> {
        self.rules.get(block_type)
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.rules.contains_key(block_type)
    }

    /// Rule for a block type, degrading to the marked pass-through rule.
    pub fn rule_for(&self, block_type: &str) -> BlockRule {
        self.get(block_type)
            .copied()
            .or(self.fallback)
            .unwrap_or_else(|| BlockRule::new(rules::unknown))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
