//! C program emitter.
//!
//! Sections are written in a fixed order: banner, includes, typedefs, static
//! state, constants and gains, bus cells, the step function, the initializer
//! and a demonstration `main`. Block statements follow the schedule; every
//! other section follows declaration order, so the output is a pure function
//! of the graph.

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;

use super::numeric::{c_float, comment_safe};
use super::registry::{BlockContext, BlockRule, BusAccess, PortKind, Registry, StateVar};
use super::rules::bus_cell;
use crate::config::GeneratorConfig;
use crate::graph::Graph;
use crate::sanitize::SymbolTable;
use crate::schedule::{Schedule, schedule_with};

const INCLUDES: [&str; 5] = ["stdio.h", "math.h", "stdlib.h", "string.h", "stdint.h"];
const INDENT: &str = "    ";

/// Everything derived from the graph before any text is emitted.
#[derive(Debug)]
pub struct Plan {
    /// Unique identifier per block index.
    pub symbols: SymbolTable,
    /// Output wire per block index.
    pub wires: Vec<String>,
    /// Input wires per block index, in connection order.
    pub inputs: Vec<Vec<String>>,
    pub rules: Vec<BlockRule>,
    pub buses: Vec<Option<BusAccess>>,
    pub schedule: Schedule,
}

impl Plan {
    pub fn context<'a>(&'a self, graph: &'a Graph, index: usize) -> BlockContext<'a> {
        let block = graph.block(index);
        let inputs = &self.inputs[index];
        BlockContext {
            block_type: &block.block_type,
            display_name: &block.name,
            name: self.symbols.get(index),
            output: &self.wires[index],
            input: inputs.first().map(|s| s.as_str()).unwrap_or("0.0"),
            inputs,
            params: &block.params,
        }
    }

    fn with_port(&self, kind: PortKind) -> impl Iterator<Item = usize> + '_ {
        (0..self.rules.len()).filter(move |&i| self.rules[i].port == Some(kind))
    }

    /// Bus cell names in declaration order, without repeats.
    pub fn bus_cells(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.buses
            .iter()
            .flatten()
            .map(|access| bus_cell(access.tag()))
            .filter(|cell| seen.insert(cell.clone()))
            .collect()
    }
}

/// Every writer of a bus tag must run before every reader of the same tag.
fn bus_edges(buses: &[Option<BusAccess>]) -> Vec<(usize, usize)> {
    let mut by_cell: IndexMap<String, (Vec<usize>, Vec<usize>)> = IndexMap::new();
    for (i, access) in buses.iter().enumerate() {
        let Some(access) = access else { continue };
        let entry = by_cell.entry(bus_cell(access.tag())).or_default();
        match access {
            BusAccess::Write(_) => entry.0.push(i),
            BusAccess::Read(_) => entry.1.push(i),
        }
    }
    let mut edges = Vec::new();
    for (writers, readers) in by_cell.values() {
        for &w in writers {
            for &r in readers {
                edges.push((w, r));
            }
        }
    }
    edges
}

/// Lowers a [`Graph`] to a C translation unit.
#[derive(Debug, Clone)]
pub struct CodeGenerator<'r> {
    registry: &'r Registry,
    config: GeneratorConfig,
}

impl CodeGenerator<'static> {
    /// Generator over the built-in block rules.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_registry(Registry::builtin(), config)
    }
}

impl Default for CodeGenerator<'static> {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl<'r> CodeGenerator<'r> {
    pub fn with_registry(registry: &'r Registry, config: GeneratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Resolve names, wires, rules and the processing order.
    pub fn plan(&self, graph: &Graph) -> Plan {
        let symbols = SymbolTable::assign(graph.blocks().iter().map(|b| b.name.as_str()));
        let wires: Vec<String> = (0..graph.len())
            .map(|i| format!("sig_{}", symbols.get(i)))
            .collect();
        let inputs: Vec<Vec<String>> = (0..graph.len())
            .map(|i| graph.predecessors(i).iter().map(|&p| wires[p].clone()).collect())
            .collect();
        let rules: Vec<BlockRule> = graph
            .blocks()
            .iter()
            .map(|b| self.registry.rule_for(&b.block_type))
            .collect();

        for block in graph.blocks() {
            if !self.registry.contains(&block.block_type) {
                tracing::warn!(
                    block_type = %block.block_type,
                    name = %block.name,
                    "no lowering rule, emitting pass-through"
                );
            }
        }

        let mut plan = Plan {
            symbols,
            wires,
            inputs,
            rules,
            buses: Vec::new(),
            schedule: Schedule {
                order: Vec::new(),
                cyclic: Vec::new(),
            },
        };
        plan.buses = (0..graph.len())
            .map(|i| (plan.rules[i].bus)(&plan.context(graph, i)))
            .collect();
        plan.schedule = schedule_with(graph, &bus_edges(&plan.buses));

        if !plan.schedule.cyclic.is_empty() {
            let names: Vec<&str> = plan.schedule.cyclic.iter().map(|&i| plan.symbols.get(i)).collect();
            tracing::warn!(
                blocks = ?names,
                "feedback loop scheduled in declaration order; loop wires carry the previous step's value"
            );
        }
        plan
    }

    /// Generate the complete program text.
    pub fn generate(&self, graph: &Graph) -> String {
        let plan = self.plan(graph);
        let mut code = String::new();

        code.push_str(&self.generate_header(graph));
        code.push_str(&self.generate_state(graph, &plan));
        code.push_str(&self.generate_constants(graph, &plan));
        code.push_str(&self.generate_buses(&plan));
        code.push_str(&self.generate_step(graph, &plan));
        code.push_str(&self.generate_init(graph, &plan));
        code.push_str(&self.generate_main(&plan));

        tracing::info!(
            blocks = graph.len(),
            connections = graph.connections().len(),
            cyclic = plan.schedule.cyclic.len(),
            bytes = code.len(),
            "generated C program"
        );
        code
    }

    fn generate_header(&self, graph: &Graph) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "/* ================================================");
        let _ = writeln!(s, "   Auto-generated C Code - SimToC Converter");
        let _ = writeln!(
            s,
            "   Blocks: {}  Connections: {}",
            graph.len(),
            graph.connections().len()
        );
        let _ = writeln!(s, "   ================================================ */");
        s.push('\n');
        for header in INCLUDES {
            let _ = writeln!(s, "#include <{}>", header);
        }
        s.push('\n');
        s.push_str("typedef double Signal;\n\n");
        s
    }

    fn state_vars(&self, graph: &Graph, plan: &Plan) -> Vec<StateVar> {
        (0..graph.len())
            .flat_map(|i| (plan.rules[i].state)(&plan.context(graph, i)))
            .collect()
    }

    fn generate_state(&self, graph: &Graph, plan: &Plan) -> String {
        let mut s = String::from("/* ---- State variables ---- */\n");
        for var in self.state_vars(graph, plan) {
            let _ = writeln!(s, "{}", var.declaration());
        }
        // Wires keep their value between steps and are reset with the state.
        for wire in &plan.wires {
            let _ = writeln!(s, "static Signal {} = 0.0;", wire);
        }
        s.push('\n');
        s
    }

    fn generate_constants(&self, graph: &Graph, plan: &Plan) -> String {
        let mut s = String::from("/* ---- Constants and gains ---- */\n");
        for i in 0..graph.len() {
            for line in (plan.rules[i].constants)(&plan.context(graph, i)) {
                let _ = writeln!(s, "{}", line);
            }
        }
        s.push('\n');
        s
    }

    fn generate_buses(&self, plan: &Plan) -> String {
        let mut s = String::from("/* ---- Bus cells (Goto/From) ---- */\n");
        for cell in plan.bus_cells() {
            let _ = writeln!(s, "static Signal {} = 0.0;", cell);
        }
        s.push('\n');
        s
    }

    fn step_signature(&self, plan: &Plan) -> String {
        let mut params: Vec<String> = plan
            .with_port(PortKind::Input)
            .map(|i| format!("Signal in_{}", plan.symbols.get(i)))
            .collect();
        params.extend(
            plan.with_port(PortKind::Output)
                .map(|i| format!("Signal* out_{}", plan.symbols.get(i))),
        );
        if params.is_empty() {
            "void model_step(void)".to_string()
        } else {
            format!("void model_step({})", params.join(", "))
        }
    }

    fn generate_step(&self, graph: &Graph, plan: &Plan) -> String {
        let mut s = String::new();
        s.push_str("/* ================================================\n");
        s.push_str("   Model step function - call once per sample\n");
        s.push_str("   ================================================ */\n");
        let _ = writeln!(s, "{} {{", self.step_signature(plan));
        let _ = writeln!(
            s,
            "{INDENT}static const double dt = {};  /* Sample time in seconds */",
            c_float(self.config.sample_time)
        );

        for &i in &plan.schedule.order {
            let ctx = plan.context(graph, i);
            s.push('\n');
            let _ = writeln!(
                s,
                "{INDENT}/* [{}] {} */",
                comment_safe(ctx.block_type),
                comment_safe(ctx.display_name)
            );
            for stmt in (plan.rules[i].lower)(&ctx) {
                let _ = writeln!(s, "{INDENT}{}", stmt);
            }
        }

        let outputs: Vec<usize> = plan.with_port(PortKind::Output).collect();
        if !outputs.is_empty() {
            s.push('\n');
            let _ = writeln!(s, "{INDENT}/* Outputs */");
            for i in outputs {
                let ctx = plan.context(graph, i);
                let _ = writeln!(s, "{INDENT}*out_{} = {};", ctx.name, ctx.input);
            }
        }
        s.push_str("}\n\n");
        s
    }

    fn generate_init(&self, graph: &Graph, plan: &Plan) -> String {
        let mut s = String::new();
        s.push_str("/* ================================================\n");
        s.push_str("   Initialize model state - call once before stepping\n");
        s.push_str("   ================================================ */\n");
        s.push_str("void model_init(void) {\n");
        for var in self.state_vars(graph, plan) {
            let _ = writeln!(s, "{INDENT}{}", var.reset());
        }
        for wire in &plan.wires {
            let _ = writeln!(s, "{INDENT}{} = 0.0;", wire);
        }
        for cell in plan.bus_cells() {
            let _ = writeln!(s, "{INDENT}{} = 0.0;", cell);
        }
        s.push_str("}\n\n");
        s
    }

    fn generate_main(&self, plan: &Plan) -> String {
        let inports: Vec<&str> = plan.with_port(PortKind::Input).map(|i| plan.symbols.get(i)).collect();
        let outports: Vec<&str> = plan.with_port(PortKind::Output).map(|i| plan.symbols.get(i)).collect();

        let mut s = String::new();
        s.push_str("/* ================================================\n");
        s.push_str("   main() - example usage\n");
        s.push_str("   Compile: gcc model_output.c -lm -o model && ./model\n");
        s.push_str("   ================================================ */\n");
        s.push_str("int main(void) {\n");
        let _ = writeln!(s, "{INDENT}model_init();");
        let _ = writeln!(s, "{INDENT}double t = 0.0;");
        let _ = writeln!(s, "{INDENT}const double dt = {};", c_float(self.config.sample_time));
        let _ = writeln!(s, "{INDENT}const double T = {};", c_float(self.config.stop_time));
        s.push('\n');
        for name in &outports {
            let _ = writeln!(s, "{INDENT}Signal {}_result = 0.0;", name);
        }
        if !outports.is_empty() {
            s.push('\n');
        }
        let _ = writeln!(s, "{INDENT}while (t < T) {{");
        for name in &inports {
            let _ = writeln!(
                s,
                "{INDENT}{INDENT}Signal {}_val = {};  /* demo input */",
                name,
                c_float(self.config.demo_input)
            );
        }
        let args: Vec<String> = inports
            .iter()
            .map(|n| format!("{}_val", n))
            .chain(outports.iter().map(|n| format!("&{}_result", n)))
            .collect();
        let _ = writeln!(s, "{INDENT}{INDENT}model_step({});", args.join(", "));
        for name in &outports {
            let _ = writeln!(
                s,
                "{INDENT}{INDENT}printf(\"t=%.4f  {0}=%.6f\\n\", t, {0}_result);",
                name
            );
        }
        let _ = writeln!(s, "{INDENT}{INDENT}t += dt;");
        let _ = writeln!(s, "{INDENT}}}");
        let _ = writeln!(s, "{INDENT}return 0;");
        s.push_str("}\n");
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Connection, Model};

    #[test]
    fn writers_precede_readers_of_the_same_bus() {
        let buses = vec![
            Some(BusAccess::Read("T".into())),
            Some(BusAccess::Write("T".into())),
            None,
            Some(BusAccess::Write("T".into())),
            Some(BusAccess::Write("U".into())),
        ];
        assert_eq!(bus_edges(&buses), vec![(1, 0), (3, 0)]);
    }

    #[test]
    fn step_without_ports_takes_void() {
        let model = Model::new(
            vec![
                Block::new("1", "Constant", "c"),
                Block::new("2", "Scope", "s"),
            ],
            vec![Connection::new("1", "2")],
        );
        let code = CodeGenerator::default().generate(&Graph::new(model));
        assert!(code.contains("void model_step(void) {"));
        assert!(code.contains("        model_step();"));
        assert!(code.contains("#define CONST_C (1.0)"));
    }
}
