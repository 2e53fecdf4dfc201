//! Continuous and discrete dynamic blocks.
//!
//! Continuous blocks integrate with forward Euler over the step function's
//! `dt`. Discrete blocks update once per call.

use super::{annotated, assign, owned, passthrough};
use crate::generator::numeric::{c_float, coefficients, comment_safe, param, parse_number};
use crate::generator::registry::{BlockContext, StateVar};

// ────────────────────────────────────────────────────────────────────────────
// Integrator / Derivative
// ────────────────────────────────────────────────────────────────────────────

pub fn integrator_state(ctx: &BlockContext) -> Vec<StateVar> {
    let ic = param(ctx.params, &["InitialCondition"], "0.0");
    vec![StateVar::scalar(owned("state", ctx), ic.literal)]
}

pub fn integrator(ctx: &BlockContext) -> Vec<String> {
    let state = owned("state", ctx);
    let mut out = vec![format!("{} += {} * dt;", state, ctx.input)];
    if ctx.raw(&["LimitOutput"]).map(str::trim) == Some("on") {
        let upper = ctx.raw(&["UpperSaturationLimit"]).and_then(parse_number);
        let lower = ctx.raw(&["LowerSaturationLimit"]).and_then(parse_number);
        if let Some(hi) = upper {
            out.push(format!("if ({0} > {1}) {0} = {1};", state, c_float(hi)));
        }
        if let Some(lo) = lower {
            out.push(format!("if ({0} < {1}) {0} = {1};", state, c_float(lo)));
        }
    }
    out.push(assign(ctx, &state));
    out
}

pub fn derivative_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::scalar(owned("prev", ctx), "0.0")]
}

pub fn derivative(ctx: &BlockContext) -> Vec<String> {
    let prev = owned("prev", ctx);
    vec![
        assign(ctx, format!("({} - {}) / dt", ctx.input, prev)),
        format!("{} = {};", prev, ctx.input),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Transfer functions
// ────────────────────────────────────────────────────────────────────────────

/// Fixed length of transfer-function state vectors.
pub const TF_STATE_LEN: usize = 8;

pub fn transfer_fcn_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::array(owned("tf_state", ctx), TF_STATE_LEN)]
}

fn coefficient_note(kind: &str, ctx: &BlockContext) -> String {
    format!(
        "/* {} Num:{} Den:{} */",
        kind,
        comment_safe(ctx.raw(&["Numerator"]).unwrap_or("[1]")),
        comment_safe(ctx.raw(&["Denominator"]).unwrap_or("[1 1]")),
    )
}

/// Continuous `num(s)/den(s)` realised as a first-order controllable form
/// using the two lowest-order denominator terms.
pub fn transfer_fcn(ctx: &BlockContext) -> Vec<String> {
    let num = coefficients(ctx.raw(&["Numerator"]), &[1.0]);
    let den = coefficients(ctx.raw(&["Denominator"]), &[1.0, 1.0]);
    let x = owned("tf_state", ctx);
    let u = ctx.input;

    if num.len() > den.len() {
        return passthrough(ctx, "TransferFcn is improper");
    }
    if den.len() == 1 {
        if den[0] == 0.0 {
            return passthrough(ctx, "TransferFcn has a zero denominator");
        }
        let k = num[num.len() - 1] / den[0];
        return vec![
            coefficient_note("TransferFcn", ctx),
            assign(ctx, format!("{} * {}", c_float(k), u)),
        ];
    }

    let n = den.len();
    let (a1, a0) = (den[n - 2], den[n - 1]);
    if a1 == 0.0 {
        return passthrough(ctx, "TransferFcn has a zero leading coefficient");
    }
    let padded: Vec<f64> = std::iter::repeat_n(0.0, n - num.len()).chain(num).collect();
    let (b1, b0) = (padded[n - 2], padded[n - 1]);

    let p = -a0 / a1;
    let c = (b0 - b1 * a0 / a1) / a1;
    let d = b1 / a1;
    let note = if n > 2 {
        "first-order approximation of a higher-order system"
    } else {
        "first-order realisation"
    };
    vec![
        format!("{}  /* {} */", coefficient_note("TransferFcn", ctx), note),
        format!("{x}[0] += ({} * {x}[0] + {u}) * dt;", c_float(p)),
        assign(ctx, format!("{} * {x}[0] + {} * {u}", c_float(c), c_float(d))),
    ]
}

pub fn state_space(ctx: &BlockContext) -> Vec<String> {
    vec![
        format!(
            "/* StateSpace {} - configure A,B,C,D matrices manually */",
            comment_safe(ctx.display_name)
        ),
        assign(ctx, ctx.input),
    ]
}

pub fn discrete_filter_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::array(owned("df_state", ctx), TF_STATE_LEN)]
}

/// First-order section in direct form II, normalised by `den[0]`.
pub fn discrete_filter(ctx: &BlockContext) -> Vec<String> {
    let mut num = coefficients(ctx.raw(&["Numerator"]), &[1.0]);
    let mut den = coefficients(ctx.raw(&["Denominator"]), &[1.0, 0.5]);
    if den[0] == 0.0 {
        return passthrough(ctx, "DiscreteFilter has a zero leading coefficient");
    }
    let higher = num.len() > 2 || den.len() > 2;
    num.resize(2, 0.0);
    den.resize(2, 0.0);
    let a0 = den[0];
    let (nb0, nb1, na1) = (num[0] / a0, num[1] / a0, den[1] / a0);

    let w = owned("df_state", ctx);
    let mut head = coefficient_note("DiscreteFilter", ctx);
    if higher {
        head.push_str("  /* truncated to first order */");
    }
    vec![
        head,
        format!("{w}[1] = {} - {} * {w}[0];", ctx.input, c_float(na1)),
        assign(ctx, format!("{} * {w}[1] + {} * {w}[0]", c_float(nb0), c_float(nb1))),
        format!("{w}[0] = {w}[1];"),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// PID
// ────────────────────────────────────────────────────────────────────────────

pub fn pid_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![
        StateVar::scalar(owned("pid_int", ctx), "0.0"),
        StateVar::scalar(owned("pid_prev", ctx), "0.0"),
    ]
}

pub fn pid(ctx: &BlockContext) -> Vec<String> {
    let kp = param(ctx.params, &["P", "Kp"], "1.0");
    let ki = param(ctx.params, &["I", "Ki"], "0.1");
    let kd = param(ctx.params, &["D", "Kd"], "0.01");
    let (int, prev, d) = (owned("pid_int", ctx), owned("pid_prev", ctx), owned("pid_d", ctx));
    let u = ctx.input;
    let law = assign(ctx, format!("{kp} * {u} + {ki} * {int} + {kd} * {d}"));
    vec![
        format!("{int} += {u} * dt;"),
        format!("Signal {d} = ({u} - {prev}) / dt;"),
        annotated(law, &[&kp, &ki, &kd]),
        format!("{prev} = {u};"),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Delays and holds
// ────────────────────────────────────────────────────────────────────────────

pub fn transport_delay_state(ctx: &BlockContext) -> Vec<StateVar> {
    let init = param(ctx.params, &["InitialOutput"], "0.0");
    vec![StateVar::scalar(owned("tdelay", ctx), init.literal)]
}

pub fn transport_delay(ctx: &BlockContext) -> Vec<String> {
    let cell = owned("tdelay", ctx);
    vec![
        format!("{} = {};  /* TransportDelay approximated by one step */", ctx.output, cell),
        format!("{} = {};", cell, ctx.input),
    ]
}

pub fn delay_state(ctx: &BlockContext) -> Vec<StateVar> {
    let ic = param(ctx.params, &["InitialCondition", "X0"], "0.0");
    vec![StateVar::scalar(owned("delay", ctx), ic.literal)]
}

pub fn unit_delay(ctx: &BlockContext) -> Vec<String> {
    let cell = owned("delay", ctx);
    vec![assign(ctx, &cell), format!("{} = {};", cell, ctx.input)]
}

pub fn hold_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::scalar(owned("hold", ctx), "0.0")]
}

pub fn zero_order_hold(ctx: &BlockContext) -> Vec<String> {
    let cell = owned("hold", ctx);
    vec![format!("{} = {};", cell, ctx.input), assign(ctx, &cell)]
}

pub fn memory_state(ctx: &BlockContext) -> Vec<StateVar> {
    let ic = param(ctx.params, &["InitialCondition", "X0"], "0.0");
    vec![StateVar::scalar(owned("mem", ctx), ic.literal)]
}

pub fn memory(ctx: &BlockContext) -> Vec<String> {
    let cell = owned("mem", ctx);
    vec![assign(ctx, &cell), format!("{} = {};", cell, ctx.input)]
}

pub fn discrete_integrator_state(ctx: &BlockContext) -> Vec<StateVar> {
    let ic = param(ctx.params, &["InitialCondition"], "0.0");
    vec![StateVar::scalar(owned("dint", ctx), ic.literal)]
}

/// Forward Euler. A missing or non-positive sample time uses the step's `dt`.
pub fn discrete_integrator(ctx: &BlockContext) -> Vec<String> {
    let k = param(ctx.params, &["gainval"], "1.0");
    let ts = ctx
        .raw(&["SampleTime"])
        .and_then(parse_number)
        .filter(|v| *v > 0.0)
        .map(c_float)
        .unwrap_or_else(|| "dt".to_string());
    let cell = owned("dint", ctx);
    vec![
        assign(ctx, &cell),
        annotated(format!("{} += {} * {} * {};", cell, k, ctx.input, ts), &[&k]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn ctx<'a>(
        block_type: &'a str,
        params: &'a IndexMap<String, String>,
        inputs: &'a [String],
    ) -> BlockContext<'a> {
        BlockContext {
            block_type,
            display_name: "blk",
            name: "blk",
            output: "sig_blk",
            input: inputs.first().map(|s| s.as_str()).unwrap_or("0.0"),
            inputs,
            params,
        }
    }

    #[test]
    fn integrator_falls_back_on_bad_initial_condition() {
        let mut params = IndexMap::new();
        params.insert("InitialCondition".to_string(), "not_a_number".to_string());
        let inputs = vec!["sig_u".to_string()];
        let c = ctx("Integrator", &params, &inputs);
        let state = integrator_state(&c);
        assert_eq!(state[0].reset(), "state_blk = 0.0;");
        assert_eq!(
            integrator(&c),
            vec!["state_blk += sig_u * dt;", "sig_blk = state_blk;"]
        );
    }

    #[test]
    fn integrator_clamps_when_limited() {
        let mut params = IndexMap::new();
        params.insert("LimitOutput".to_string(), "on".to_string());
        params.insert("UpperSaturationLimit".to_string(), "2".to_string());
        let inputs = vec!["sig_u".to_string()];
        let lines = integrator(&ctx("Integrator", &params, &inputs));
        assert_eq!(lines[1], "if (state_blk > 2.0) state_blk = 2.0;");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn first_order_transfer_function() {
        let mut params = IndexMap::new();
        params.insert("Numerator".to_string(), "[1]".to_string());
        params.insert("Denominator".to_string(), "[2 4]".to_string());
        let inputs = vec!["sig_u".to_string()];
        let lines = transfer_fcn(&ctx("TransferFcn", &params, &inputs));
        assert_eq!(lines[1], "tf_state_blk[0] += (-2.0 * tf_state_blk[0] + sig_u) * dt;");
        assert_eq!(lines[2], "sig_blk = 0.5 * tf_state_blk[0] + 0.0 * sig_u;");
    }

    #[test]
    fn discrete_filter_normalises_by_leading_coefficient() {
        let mut params = IndexMap::new();
        params.insert("Numerator".to_string(), "[2]".to_string());
        params.insert("Denominator".to_string(), "[2 1]".to_string());
        let inputs = vec!["sig_u".to_string()];
        let lines = discrete_filter(&ctx("DiscreteFilter", &params, &inputs));
        assert_eq!(lines[1], "df_state_blk[1] = sig_u - 0.5 * df_state_blk[0];");
        assert_eq!(lines[2], "sig_blk = 1.0 * df_state_blk[1] + 0.0 * df_state_blk[0];");
    }

    #[test]
    fn discrete_integrator_uses_dt_without_sample_time() {
        let params = IndexMap::new();
        let inputs = vec!["sig_u".to_string()];
        let lines = discrete_integrator(&ctx("DiscreteIntegrator", &params, &inputs));
        assert_eq!(lines[1], "dint_blk += 1.0 * sig_u * dt;");
    }
}
