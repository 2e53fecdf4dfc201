use super::{annotated, assign, owned};
use crate::generator::numeric::{param, parse_number, scalar};
use crate::generator::registry::{BlockContext, StateVar};

pub fn saturation(ctx: &BlockContext) -> Vec<String> {
    let hi = param(ctx.params, &["UpperLimit", "Upper"], "1.0");
    let lo = param(ctx.params, &["LowerLimit", "Lower"], "-1.0");
    let out = ctx.output;
    vec![
        assign(ctx, ctx.input),
        hi.annotate(format!("if ({out} > {hi}) {out} = {hi};")),
        lo.annotate(format!("if ({out} < {lo}) {out} = {lo};")),
    ]
}

pub fn dead_zone(ctx: &BlockContext) -> Vec<String> {
    let lo = param(ctx.params, &["LowerValue", "Start"], "-0.5");
    let hi = param(ctx.params, &["UpperValue", "End"], "0.5");
    let u = ctx.input;
    let stmt = assign(
        ctx,
        format!("({u} > {hi}) ? ({u} - {hi}) : (({u} < {lo}) ? ({u} - {lo}) : 0.0)"),
    );
    vec![annotated(stmt, &[&lo, &hi])]
}

pub fn relay_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::scalar(owned("relay", ctx), "0.0")]
}

/// Hysteresis switch; the state holds 1.0 while the relay is on.
pub fn relay(ctx: &BlockContext) -> Vec<String> {
    let on = param(ctx.params, &["OnSwitchValue"], "0.0");
    let off = param(ctx.params, &["OffSwitchValue"], "0.0");
    let on_out = param(ctx.params, &["OnOutputValue"], "1.0");
    let off_out = param(ctx.params, &["OffOutputValue"], "0.0");
    let state = owned("relay", ctx);
    let u = ctx.input;
    vec![
        annotated(format!("if ({u} >= {on}) {state} = 1.0;"), &[&on]),
        annotated(format!("else if ({u} <= {off}) {state} = 0.0;"), &[&off]),
        annotated(
            assign(ctx, format!("({state} > 0.5) ? {on_out} : {off_out}")),
            &[&on_out, &off_out],
        ),
    ]
}

pub fn rate_limiter_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::scalar(owned("rate", ctx), "0.0")]
}

pub fn rate_limiter(ctx: &BlockContext) -> Vec<String> {
    let rise = param(ctx.params, &["RisingSlewLimit"], "1.0");
    let fall = param(ctx.params, &["FallingSlewLimit"], "-1.0");
    let last = owned("rate", ctx);
    let delta = owned("slew", ctx);
    let u = ctx.input;
    vec![
        format!("Signal {delta} = {u} - {last};"),
        rise.annotate(format!("if ({delta} > {rise} * dt) {delta} = {rise} * dt;")),
        fall.annotate(format!("if ({delta} < {fall} * dt) {delta} = {fall} * dt;")),
        format!("{last} += {delta};"),
        assign(ctx, &last),
    ]
}

/// Rounds to the nearest multiple of the interval; a zero interval uses 0.5.
pub fn quantizer(ctx: &BlockContext) -> Vec<String> {
    let raw = ctx.raw(&["QuantizationInterval"]);
    let q = match raw.and_then(parse_number) {
        Some(v) if v == 0.0 => scalar(None, "0.5"),
        _ => param(ctx.params, &["QuantizationInterval"], "0.5"),
    };
    let stmt = assign(ctx, format!("{q} * round({} / {q})", ctx.input));
    vec![annotated(stmt, &[&q])]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn ctx<'a>(params: &'a IndexMap<String, String>, inputs: &'a [String]) -> BlockContext<'a> {
        BlockContext {
            block_type: "Saturation",
            display_name: "sat",
            name: "sat",
            output: "sig_sat",
            input: inputs.first().map(|s| s.as_str()).unwrap_or("0.0"),
            inputs,
            params,
        }
    }

    #[test]
    fn saturation_clamps_both_sides() {
        let mut params = IndexMap::new();
        params.insert("UpperLimit".to_string(), "5".to_string());
        params.insert("LowerLimit".to_string(), "oops".to_string());
        let inputs = vec!["sig_u".to_string()];
        assert_eq!(
            saturation(&ctx(&params, &inputs)),
            vec![
                "sig_sat = sig_u;",
                "if (sig_sat > 5) sig_sat = 5;",
                "if (sig_sat < -1.0) sig_sat = -1.0;",
            ]
        );
    }

    #[test]
    fn quantizer_rejects_zero_interval() {
        let mut params = IndexMap::new();
        params.insert("QuantizationInterval".to_string(), "0".to_string());
        let inputs = vec!["sig_u".to_string()];
        assert_eq!(
            quantizer(&ctx(&params, &inputs)),
            vec!["sig_sat = 0.5 * round(sig_u / 0.5);"]
        );
    }
}
