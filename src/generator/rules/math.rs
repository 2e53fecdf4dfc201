use super::{annotated, assign, passthrough, tokens};
use crate::generator::numeric::param;
use crate::generator::registry::BlockContext;

fn gain_name(ctx: &BlockContext) -> String {
    format!("GAIN_{}", ctx.name.to_ascii_uppercase())
}

pub fn gain_decl(ctx: &BlockContext) -> Vec<String> {
    let v = param(ctx.params, &["Gain"], "1.0");
    vec![v.annotate(format!("static const Signal {} = {};", gain_name(ctx), v))]
}

pub fn gain(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, format!("{} * {}", gain_name(ctx), ctx.input))]
}

/// Per-input operator characters from a descriptor, padded with `identity`
/// up to the input count. An absent or operator-free descriptor means
/// `identity` for every input.
fn operators(raw: Option<&str>, allowed: &[char], identity: char, count: usize) -> Vec<char> {
    let mut ops: Vec<char> = raw
        .unwrap_or("")
        .chars()
        .filter(|c| allowed.contains(c))
        .collect();
    if ops.len() < count {
        ops.resize(count, identity);
    }
    ops
}

pub fn sum(ctx: &BlockContext) -> Vec<String> {
    if ctx.inputs.is_empty() {
        return vec![assign(ctx, ctx.input)];
    }
    let signs = operators(ctx.raw(&["Inputs", "Signs", "ListOfSigns"]), &['+', '-'], '+', ctx.inputs.len());
    let mut expr = String::new();
    for (i, (sig, sign)) in ctx.inputs.iter().zip(signs.iter().copied()).enumerate() {
        match (i, sign) {
            (0, '-') => expr.push_str(&format!("-{}", sig)),
            (0, _) => expr.push_str(sig),
            (_, '-') => expr.push_str(&format!(" - {}", sig)),
            _ => expr.push_str(&format!(" + {}", sig)),
        }
    }
    vec![assign(ctx, expr)]
}

fn product_with(ctx: &BlockContext, default_ops: &str) -> Vec<String> {
    if ctx.inputs.is_empty() {
        return vec![assign(ctx, ctx.input)];
    }
    let raw = ctx.raw(&["Inputs"]).or(Some(default_ops));
    let ops = operators(raw, &['*', '/'], '*', ctx.inputs.len());
    let mut expr = String::new();
    for (i, (sig, op)) in ctx.inputs.iter().zip(ops.iter().copied()).enumerate() {
        match (i, op) {
            (0, '/') => expr.push_str(&format!("1.0 / {}", sig)),
            (0, _) => expr.push_str(sig),
            (_, '/') => expr.push_str(&format!(" / {}", sig)),
            _ => expr.push_str(&format!(" * {}", sig)),
        }
    }
    vec![assign(ctx, expr)]
}

pub fn product(ctx: &BlockContext) -> Vec<String> {
    product_with(ctx, "")
}

pub fn divide(ctx: &BlockContext) -> Vec<String> {
    product_with(ctx, "*/")
}

pub fn abs(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, format!("fabs({})", ctx.input))]
}

pub fn sqrt(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, format!("sqrt(fabs({}))", ctx.input))]
}

pub fn math_function(ctx: &BlockContext) -> Vec<String> {
    let op = ctx.raw(&["Operator"]).unwrap_or("exp").trim();
    let u = ctx.input;
    let u1 = ctx.input_at(1);
    let expr = match op {
        "exp" => format!("exp({u})"),
        "log" => format!("log({u})"),
        "10^u" => format!("pow(10.0, {u})"),
        "log10" => format!("log10({u})"),
        "magnitude^2" | "square" => format!("({u} * {u})"),
        "sqrt" => format!("sqrt({u})"),
        "pow" => format!("pow({u}, {u1})"),
        "reciprocal" => format!("(1.0 / {u})"),
        "hypot" => format!("hypot({u}, {u1})"),
        "rem" => format!("fmod({u}, {u1})"),
        "mod" => format!("(({u1}) == 0.0 ? {u} : {u} - floor({u} / {u1}) * {u1})"),
        "conj" | "transpose" | "hermitian" => u.to_string(),
        other => return passthrough(ctx, &format!("Math function '{}' not supported", other)),
    };
    vec![assign(ctx, expr)]
}

pub fn trigonometry(ctx: &BlockContext) -> Vec<String> {
    let op = ctx.raw(&["Operator"]).unwrap_or("sin").trim();
    let expr = match op {
        "sin" | "cos" | "tan" | "asin" | "acos" | "atan" | "sinh" | "cosh" | "tanh" | "asinh"
        | "acosh" | "atanh" => format!("{}({})", op, ctx.input),
        "atan2" => format!("atan2({}, {})", ctx.input, ctx.input_at(1)),
        other => return passthrough(ctx, &format!("Trigonometric function '{}' not supported", other)),
    };
    vec![assign(ctx, expr)]
}

pub fn bias(ctx: &BlockContext) -> Vec<String> {
    let b = param(ctx.params, &["Bias"], "0.0");
    let stmt = assign(ctx, format!("{} + {}", ctx.input, b));
    vec![annotated(stmt, &[&b])]
}

pub fn unary_minus(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, format!("-{}", ctx.input))]
}

pub fn min_max(ctx: &BlockContext) -> Vec<String> {
    let func = match ctx.raw(&["Function"]).map(str::trim) {
        Some("max") => "fmax",
        _ => "fmin",
    };
    let mut inputs = ctx.inputs.iter();
    let Some(first) = inputs.next() else {
        return vec![assign(ctx, ctx.input)];
    };
    let expr = inputs.fold(first.clone(), |acc, sig| format!("{}({}, {})", func, acc, sig));
    vec![assign(ctx, expr)]
}

pub fn signum(ctx: &BlockContext) -> Vec<String> {
    let u = ctx.input;
    vec![assign(ctx, format!("({u} > 0.0) ? 1.0 : (({u} < 0.0) ? -1.0 : 0.0)"))]
}

pub fn rounding(ctx: &BlockContext) -> Vec<String> {
    let op = ctx
        .raw(&["Operator"])
        .and_then(|raw| tokens(raw).into_iter().next())
        .unwrap_or_else(|| "floor".to_string());
    let func = match op.as_str() {
        "floor" => "floor",
        "ceil" => "ceil",
        "round" => "round",
        "fix" => "trunc",
        other => return passthrough(ctx, &format!("Rounding function '{}' not supported", other)),
    };
    vec![assign(ctx, format!("{}({})", func, ctx.input))]
}
