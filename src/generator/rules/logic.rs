//! Logic, comparison and switching blocks.
//!
//! Boolean results are emitted as `1.0` / `0.0` so every wire stays a
//! `Signal`.

use super::{annotated, assign, passthrough, tokens};
use crate::generator::numeric::{param, parse_number};
use crate::generator::registry::BlockContext;

fn boolean(expr: &str) -> String {
    format!("({}) ? 1.0 : 0.0", expr)
}

fn truthy(sig: &str) -> String {
    format!("({} != 0.0)", sig)
}

fn c_binary_op(op: &str) -> Option<&'static str> {
    match op {
        "AND" | "NAND" => Some("&&"),
        "OR" | "NOR" => Some("||"),
        "XOR" | "NXOR" => Some("!="),
        _ => None,
    }
}

fn negated(op: &str) -> bool {
    matches!(op, "NAND" | "NOR" | "NXOR")
}

/// Combine inputs with a logic descriptor. A single operator applies to all
/// inputs; a list names one operator per adjacent pair and pads with AND.
pub fn logic(ctx: &BlockContext) -> Vec<String> {
    let ops: Vec<String> = ctx
        .raw(&["Operator", "LogicOp"])
        .map(tokens)
        .unwrap_or_default()
        .into_iter()
        .map(|t| t.to_ascii_uppercase())
        .collect();

    if ops.first().map(String::as_str) == Some("NOT") {
        return vec![assign(ctx, boolean(&format!("{} == 0.0", ctx.input)))];
    }
    if ctx.inputs.is_empty() {
        return vec![assign(ctx, format!("{} ? 1.0 : 0.0", truthy(ctx.input)))];
    }

    let pairs = ctx.inputs.len().saturating_sub(1);
    let (per_pair, negate): (Vec<&str>, bool) = match ops.as_slice() {
        [] => (vec!["AND"; pairs], false),
        [single] => (vec![single.as_str(); pairs], negated(single)),
        list => {
            let mut v: Vec<&str> = list.iter().map(String::as_str).collect();
            v.resize(pairs.max(v.len()), "AND");
            (v, false)
        }
    };

    let mut inputs = ctx.inputs.iter();
    let mut expr = match inputs.next() {
        Some(first) => truthy(first),
        None => truthy(ctx.input),
    };
    for (sig, op) in inputs.zip(per_pair.iter()) {
        let Some(c_op) = c_binary_op(op) else {
            return passthrough(ctx, &format!("Logic operator '{}' not supported", op));
        };
        expr = format!("({} {} {})", expr, c_op, truthy(sig));
    }
    if negate {
        expr = format!("!{}", expr);
    }
    vec![assign(ctx, format!("{} ? 1.0 : 0.0", expr))]
}

fn c_relop(op: &str) -> Option<&'static str> {
    match op.trim() {
        "==" => Some("=="),
        "~=" | "!=" => Some("!="),
        "<" => Some("<"),
        "<=" => Some("<="),
        ">" => Some(">"),
        ">=" => Some(">="),
        _ => None,
    }
}

/// Compare adjacent inputs pairwise; chains are joined with `&&`.
pub fn relational(ctx: &BlockContext) -> Vec<String> {
    let raw = ctx.raw(&["Operator", "RelOp"]).unwrap_or("<=");
    let Some(op) = c_relop(raw) else {
        return passthrough(ctx, &format!("Relational operator '{}' not supported", raw));
    };
    let lhs = ctx.input_at(0);
    let rhs = ctx.input_at(1);
    let mut terms = vec![format!("{} {} {}", lhs, op, rhs)];
    for pair in ctx.inputs.windows(2).skip(1) {
        terms.push(format!("{} {} {}", pair[0], op, pair[1]));
    }
    let expr = terms.join(" && ");
    vec![assign(ctx, boolean(&expr))]
}

pub fn compare_to_constant(ctx: &BlockContext) -> Vec<String> {
    let raw = ctx.raw(&["relop"]).unwrap_or("<=");
    let Some(op) = c_relop(raw) else {
        return passthrough(ctx, &format!("Relational operator '{}' not supported", raw));
    };
    let c = param(ctx.params, &["const"], "3.0");
    let stmt = assign(ctx, boolean(&format!("{} {} {}", ctx.input, op, c)));
    vec![annotated(stmt, &[&c])]
}

pub fn compare_to_zero(ctx: &BlockContext) -> Vec<String> {
    let raw = ctx.raw(&["relop"]).unwrap_or("<=");
    let Some(op) = c_relop(raw) else {
        return passthrough(ctx, &format!("Relational operator '{}' not supported", raw));
    };
    vec![assign(ctx, boolean(&format!("{} {} 0.0", ctx.input, op)))]
}

/// Three-port switch: first input when the control (second input) meets the
/// criterion, else the third input.
pub fn switch(ctx: &BlockContext) -> Vec<String> {
    let thr = param(ctx.params, &["Threshold"], "0.5");
    let ctrl = if ctx.inputs.len() > 1 {
        ctx.input_at(1)
    } else {
        ctx.input
    };
    let criteria = ctx.raw(&["Criteria"]).unwrap_or("u2 >= Threshold").trim();
    let cond = match criteria {
        "u2 > Threshold" => format!("{} > {}", ctrl, thr),
        "u2 ~= 0" => format!("{} != 0.0", ctrl),
        _ => format!("{} >= {}", ctrl, thr),
    };
    let stmt = assign(
        ctx,
        format!("({}) ? {} : {}", cond, ctx.input, ctx.input_at(2)),
    );
    vec![annotated(stmt, &[&thr])]
}

/// The first input selects among the remaining data inputs.
pub fn multiport_switch(ctx: &BlockContext) -> Vec<String> {
    if ctx.inputs.len() < 2 {
        return passthrough(ctx, "MultiPortSwitch has no data inputs");
    }
    let ctrl = &ctx.inputs[0];
    let data = &ctx.inputs[1..];
    let base = match ctx.raw(&["DataPortOrder"]).map(str::trim) {
        Some("Zero-based contiguous") => 0,
        _ => 1,
    };
    let last = &data[data.len() - 1];
    let expr = data[..data.len() - 1]
        .iter()
        .enumerate()
        .rev()
        .fold(last.clone(), |acc, (i, sig)| {
            format!("({} == {}.0) ? {} : ({})", ctrl, i + base, sig, acc)
        });
    vec![assign(ctx, expr)]
}

pub fn manual_switch(ctx: &BlockContext) -> Vec<String> {
    let sw = ctx.raw(&["sw"]).and_then(parse_number).unwrap_or(1.0);
    let chosen = if sw == 1.0 {
        ctx.input_at(0)
    } else {
        ctx.input_at(1)
    };
    vec![format!(
        "{} = {};  /* ManualSwitch position {} */",
        ctx.output,
        chosen,
        if sw == 1.0 { "up" } else { "down" }
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn ctx<'a>(params: &'a IndexMap<String, String>, inputs: &'a [String]) -> BlockContext<'a> {
        BlockContext {
            block_type: "Logic",
            display_name: "l",
            name: "l",
            output: "sig_l",
            input: inputs.first().map(|s| s.as_str()).unwrap_or("0.0"),
            inputs,
            params,
        }
    }

    fn wires(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn logic_defaults_to_conjunction() {
        let params = IndexMap::new();
        let inputs = wires(&["sig_a", "sig_b", "sig_c"]);
        assert_eq!(
            logic(&ctx(&params, &inputs)),
            vec!["sig_l = (((sig_a != 0.0) && (sig_b != 0.0)) && (sig_c != 0.0)) ? 1.0 : 0.0;"]
        );
    }

    #[test]
    fn logic_pads_operator_list_with_and() {
        let mut params = IndexMap::new();
        params.insert("Operator".to_string(), "OR, ".to_string());
        let inputs = wires(&["sig_a", "sig_b"]);
        assert_eq!(
            logic(&ctx(&params, &inputs)),
            vec!["sig_l = ((sig_a != 0.0) || (sig_b != 0.0)) ? 1.0 : 0.0;"]
        );
        params.insert("Operator".to_string(), "OR AND".to_string());
        let inputs = wires(&["sig_a", "sig_b", "sig_c"]);
        assert_eq!(
            logic(&ctx(&params, &inputs)),
            vec!["sig_l = (((sig_a != 0.0) || (sig_b != 0.0)) && (sig_c != 0.0)) ? 1.0 : 0.0;"]
        );
    }

    #[test]
    fn relational_translates_not_equal() {
        let mut params = IndexMap::new();
        params.insert("Operator".to_string(), "~=".to_string());
        let inputs = wires(&["sig_a", "sig_b"]);
        assert_eq!(
            relational(&ctx(&params, &inputs)),
            vec!["sig_l = (sig_a != sig_b) ? 1.0 : 0.0;"]
        );
    }

    #[test]
    fn switch_selects_on_second_input() {
        let params = IndexMap::new();
        let inputs = wires(&["sig_a", "sig_c", "sig_b"]);
        assert_eq!(
            switch(&ctx(&params, &inputs)),
            vec!["sig_l = (sig_c >= 0.5) ? sig_a : sig_b;"]
        );
    }

    #[test]
    fn multiport_switch_nests_ternaries() {
        let params = IndexMap::new();
        let inputs = wires(&["sig_k", "sig_a", "sig_b"]);
        assert_eq!(
            multiport_switch(&ctx(&params, &inputs)),
            vec!["sig_l = (sig_k == 1.0) ? sig_a : (sig_b);"]
        );
    }
}
