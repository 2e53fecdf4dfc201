//! Signal routing, buses and opaque containers.

use super::{assign, passthrough};
use crate::generator::numeric::comment_safe;
use crate::generator::registry::{BlockContext, BusAccess};
use crate::sanitize::sanitize;

/// Name of the global cell carrying bus `tag`.
pub fn bus_cell(tag: &str) -> String {
    format!("bus_{}", sanitize(tag))
}

/// Explicit tag parameter, else the block's own display name.
fn bus_tag(ctx: &BlockContext) -> String {
    ctx.raw(&["GotoTag", "Tag"])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(ctx.display_name)
        .to_string()
}

pub fn goto_bus(ctx: &BlockContext) -> Option<BusAccess> {
    Some(BusAccess::Write(bus_tag(ctx)))
}

pub fn from_bus(ctx: &BlockContext) -> Option<BusAccess> {
    Some(BusAccess::Read(bus_tag(ctx)))
}

pub fn goto(ctx: &BlockContext) -> Vec<String> {
    vec![format!("{} = {};", bus_cell(&bus_tag(ctx)), ctx.input)]
}

pub fn from(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, bus_cell(&bus_tag(ctx)))]
}

pub fn first_signal(ctx: &BlockContext) -> Vec<String> {
    vec![format!(
        "{} = {};  /* {}: using first signal */",
        ctx.output,
        ctx.input,
        comment_safe(ctx.block_type)
    )]
}

/// Picks one element of a vector; scalar wires pass through.
pub fn selector(ctx: &BlockContext) -> Vec<String> {
    let idx = ctx.raw(&["Indices", "IndexParamArray"]).unwrap_or("1");
    passthrough(ctx, &format!("Selector indices {} on a scalar signal", idx))
}

/// Every input writes the shared output; the last one in port order wins.
pub fn merge(ctx: &BlockContext) -> Vec<String> {
    if ctx.inputs.len() <= 1 {
        return vec![assign(ctx, ctx.input)];
    }
    let last = &ctx.inputs[ctx.inputs.len() - 1];
    vec![format!(
        "{} = {};  /* Merge of {} inputs: last input wins */",
        ctx.output,
        last,
        ctx.inputs.len()
    )]
}

pub fn data_type_conversion(ctx: &BlockContext) -> Vec<String> {
    let target = ctx.raw(&["OutDataTypeStr"]).unwrap_or("double").trim();
    let u = ctx.input;
    let expr = match target {
        "boolean" => format!("({u} != 0.0) ? 1.0 : 0.0"),
        "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16" | "uint32" | "uint64" => {
            format!("(Signal)({}_t)({u})", target)
        }
        "single" => format!("(Signal)(float)({u})"),
        _ => u.to_string(),
    };
    vec![assign(ctx, expr)]
}

pub fn signal_conversion(ctx: &BlockContext) -> Vec<String> {
    vec![assign(ctx, ctx.input)]
}

/// Containers whose contents are not expanded in place.
pub fn opaque(ctx: &BlockContext) -> Vec<String> {
    let detail = ctx
        .raw(&["SourceBlock", "ModelName", "FunctionName"])
        .map(|d| format!(" ({})", comment_safe(d)))
        .unwrap_or_default();
    vec![format!(
        "{} = {};  /* {} {}{} - expand manually */",
        ctx.output,
        ctx.input,
        comment_safe(ctx.block_type),
        comment_safe(ctx.display_name),
        detail
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn bus_tag_falls_back_to_block_name() {
        let params = IndexMap::new();
        let ctx = BlockContext {
            block_type: "Goto",
            display_name: "my goto",
            name: "my_goto",
            output: "sig_my_goto",
            input: "sig_x",
            inputs: &[],
            params: &params,
        };
        assert_eq!(goto(&ctx), vec!["bus_my_goto = sig_x;"]);
        assert_eq!(goto_bus(&ctx), Some(BusAccess::Write("my goto".into())));
    }

    #[test]
    fn integer_conversion_casts_through_stdint() {
        let mut params = IndexMap::new();
        params.insert("OutDataTypeStr".to_string(), "int16".to_string());
        let ctx = BlockContext {
            block_type: "DataTypeConversion",
            display_name: "c",
            name: "c",
            output: "sig_c",
            input: "sig_x",
            inputs: &[],
            params: &params,
        };
        assert_eq!(
            data_type_conversion(&ctx),
            vec!["sig_c = (Signal)(int16_t)(sig_x);"]
        );
    }
}
