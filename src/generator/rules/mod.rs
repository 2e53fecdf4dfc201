//! Built-in lowering rules, grouped by block library.
//!
//! Every rule is a pure function of its [`BlockContext`]. Rules only name
//! state derived from their own block identifier, so no rule can touch
//! another block's state.

mod dynamics;
mod logic;
mod math;
mod nonlinear;
mod routing;
mod sinks;
mod sources;

use super::numeric::{Scalar, comment_safe};
use super::registry::{BlockContext, PortKind, Registry};

pub use routing::bus_cell;

pub(crate) fn register_all(r: &mut Registry) {
    use super::registry::BlockRule as Rule;

    // Sources
    r.register_all(&["Inport", "In"], Rule::new(sources::inport).port(PortKind::Input));
    r.register("Constant", Rule::new(sources::constant).constants(sources::constant_decl));
    r.register("SineWave", Rule::new(sources::sine_wave).state(sources::clock_state));
    r.register("Step", Rule::new(sources::step).state(sources::clock_state));
    r.register("PulseGenerator", Rule::new(sources::pulse_generator).state(sources::clock_state));
    r.register("Ramp", Rule::new(sources::ramp).state(sources::clock_state));
    r.register("Clock", Rule::new(sources::clock).state(sources::clock_state));
    r.register("Ground", Rule::new(sources::ground));

    // Sinks
    r.register_all(&["Outport", "Out"], Rule::new(sinks::outport).port(PortKind::Output));
    r.register("Scope", Rule::new(sinks::scope));
    r.register("Display", Rule::new(sinks::display));
    r.register("Terminator", Rule::new(sinks::terminator));
    r.register("ToWorkspace", Rule::new(sinks::to_workspace));

    // Math operations
    r.register("Gain", Rule::new(math::gain).constants(math::gain_decl));
    r.register_all(&["Sum", "Add", "Subtract"], Rule::new(math::sum));
    r.register("Product", Rule::new(math::product));
    r.register("Divide", Rule::new(math::divide));
    r.register("Abs", Rule::new(math::abs));
    r.register("Sqrt", Rule::new(math::sqrt));
    r.register("Math", Rule::new(math::math_function));
    r.register("Trigonometry", Rule::new(math::trigonometry));
    r.register("Bias", Rule::new(math::bias));
    r.register("UnaryMinus", Rule::new(math::unary_minus));
    r.register("MinMax", Rule::new(math::min_max));
    r.register("Signum", Rule::new(math::signum));
    r.register("Rounding", Rule::new(math::rounding));

    // Continuous
    r.register("Integrator", Rule::new(dynamics::integrator).state(dynamics::integrator_state));
    r.register("Derivative", Rule::new(dynamics::derivative).state(dynamics::derivative_state));
    r.register_all(
        &["TransferFcn", "TransferFunction"],
        Rule::new(dynamics::transfer_fcn).state(dynamics::transfer_fcn_state),
    );
    r.register("StateSpace", Rule::new(dynamics::state_space));
    r.register("PIDController", Rule::new(dynamics::pid).state(dynamics::pid_state));
    r.register(
        "TransportDelay",
        Rule::new(dynamics::transport_delay).state(dynamics::transport_delay_state),
    );

    // Discrete
    r.register("UnitDelay", Rule::new(dynamics::unit_delay).state(dynamics::delay_state));
    r.register("ZeroOrderHold", Rule::new(dynamics::zero_order_hold).state(dynamics::hold_state));
    r.register("Memory", Rule::new(dynamics::memory).state(dynamics::memory_state));
    r.register(
        "DiscreteIntegrator",
        Rule::new(dynamics::discrete_integrator).state(dynamics::discrete_integrator_state),
    );
    r.register_all(
        &["DiscreteFilter", "DiscreteTransferFcn"],
        Rule::new(dynamics::discrete_filter).state(dynamics::discrete_filter_state),
    );

    // Discontinuities
    r.register("Saturation", Rule::new(nonlinear::saturation));
    r.register("DeadZone", Rule::new(nonlinear::dead_zone));
    r.register("Relay", Rule::new(nonlinear::relay).state(nonlinear::relay_state));
    r.register("RateLimiter", Rule::new(nonlinear::rate_limiter).state(nonlinear::rate_limiter_state));
    r.register("Quantizer", Rule::new(nonlinear::quantizer));

    // Logic and switching
    r.register("Logic", Rule::new(logic::logic));
    r.register("RelationalOperator", Rule::new(logic::relational));
    r.register("CompareToConstant", Rule::new(logic::compare_to_constant));
    r.register("CompareToZero", Rule::new(logic::compare_to_zero));
    r.register("Switch", Rule::new(logic::switch));
    r.register("MultiPortSwitch", Rule::new(logic::multiport_switch));
    r.register("ManualSwitch", Rule::new(logic::manual_switch));

    // Signal routing
    r.register("Goto", Rule::new(routing::goto).bus(routing::goto_bus));
    r.register("From", Rule::new(routing::from).bus(routing::from_bus));
    r.register_all(&["Mux", "Demux", "BusCreator", "BusSelector"], Rule::new(routing::first_signal));
    r.register("Selector", Rule::new(routing::selector));
    r.register("Merge", Rule::new(routing::merge));
    r.register("DataTypeConversion", Rule::new(routing::data_type_conversion));
    r.register("SignalConversion", Rule::new(routing::signal_conversion));
    r.register_all(
        &["SubSystem", "Subsystem", "Reference", "ModelReference", "SFunction", "MATLABFunction"],
        Rule::new(routing::opaque),
    );

    r.set_fallback(Rule::new(unknown));
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// `<output> = <expr>;`
pub(crate) fn assign(ctx: &BlockContext, expr: impl std::fmt::Display) -> String {
    format!("{} = {};", ctx.output, expr)
}

/// State variable name owned by this block.
pub(crate) fn owned(prefix: &str, ctx: &BlockContext) -> String {
    format!("{}_{}", prefix, ctx.name)
}

/// Attach every simplification marker of `scalars` to `statement`.
pub(crate) fn annotated(statement: String, scalars: &[&Scalar]) -> String {
    scalars.iter().fold(statement, |s, sc| sc.annotate(s))
}

/// Marked pass-through used when a block cannot be lowered faithfully.
pub(crate) fn passthrough(ctx: &BlockContext, note: &str) -> Vec<String> {
    vec![format!(
        "{} = {};  /* {} */",
        ctx.output,
        ctx.input,
        comment_safe(note)
    )]
}

/// Fallback for block types without a rule.
pub fn unknown(ctx: &BlockContext) -> Vec<String> {
    vec![
        format!(
            "/* Unknown block '{}' - pass-through */",
            comment_safe(ctx.block_type)
        ),
        assign(ctx, ctx.input),
    ]
}

/// Operator tokens of a descriptor like `"AND OR"` or `"<=, >"`.
pub(crate) fn tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == '|' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
