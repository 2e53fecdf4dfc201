use super::{annotated, assign, owned};
use crate::generator::numeric::param;
use crate::generator::registry::{BlockContext, StateVar};

const TWO_PI: &str = "2.0 * 3.14159265358979";

pub fn inport(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, format!("in_{}", ctx.name))]
}

fn constant_name(ctx: &BlockContext) -> String {
    format!("CONST_{}", ctx.name.to_ascii_uppercase())
}

pub fn constant_decl(ctx: &BlockContext) -> Vec<String> {
    let v = param(ctx.params, &["Value"], "1.0");
    vec![v.annotate(format!("#define {} ({})", constant_name(ctx), v))]
}

pub fn constant(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, constant_name(ctx))]
}

/// Time-driven sources keep their own simulated clock.
pub fn clock_state(ctx: &BlockContext) -> Vec<StateVar> {
    vec![StateVar::clock(owned("time", ctx))]
}

fn tick(ctx: &BlockContext) -> String {
    format!("{} += dt;", owned("time", ctx))
}

pub fn sine_wave(ctx: &BlockContext) -> Vec<String> {
    let amp = param(ctx.params, &["Amplitude"], "1.0");
    let freq = param(ctx.params, &["Frequency"], "1.0");
    let bias = param(ctx.params, &["Bias"], "0.0");
    let phase = param(ctx.params, &["Phase"], "0.0");
    let t = owned("time", ctx);
    let stmt = assign(
        ctx,
        format!("{bias} + {amp} * sin({TWO_PI} * {freq} * {t} + {phase})"),
    );
    vec![annotated(stmt, &[&amp, &freq, &bias, &phase]), tick(ctx)]
}

pub fn step(ctx: &BlockContext) -> Vec<String> {
    let at = param(ctx.params, &["Time"], "1.0");
    let before = param(ctx.params, &["Before"], "0.0");
    let after = param(ctx.params, &["After"], "1.0");
    let t = owned("time", ctx);
    let stmt = assign(ctx, format!("({t} >= {at}) ? {after} : {before}"));
    vec![annotated(stmt, &[&at, &before, &after]), tick(ctx)]
}

pub fn pulse_generator(ctx: &BlockContext) -> Vec<String> {
    let amp = param(ctx.params, &["Amplitude"], "1.0");
    let period = param(ctx.params, &["Period"], "10.0");
    let width = param(ctx.params, &["PulseWidth"], "5.0");
    let delay = param(ctx.params, &["PhaseDelay"], "0.0");
    let t = owned("time", ctx);
    let stmt = assign(
        ctx,
        format!(
            "({t} >= {delay} && fmod({t} - {delay}, {period}) < {period} * {width} / 100.0) ? {amp} : 0.0"
        ),
    );
    vec![annotated(stmt, &[&amp, &period, &width, &delay]), tick(ctx)]
}

pub fn ramp(ctx: &BlockContext) -> Vec<String> {
    let slope = param(ctx.params, &["slope", "Slope"], "1.0");
    let start = param(ctx.params, &["start", "Start"], "0.0");
    let initial = param(ctx.params, &["InitialOutput"], "0.0");
    let t = owned("time", ctx);
    let stmt = assign(
        ctx,
        format!("({t} >= {start}) ? {initial} + {slope} * ({t} - {start}) : {initial}"),
    );
    vec![annotated(stmt, &[&slope, &start, &initial]), tick(ctx)]
}

pub fn clock(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, owned("time", ctx)), tick(ctx)]
}

pub fn ground(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, "0.0")]
}
