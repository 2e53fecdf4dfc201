use super::comment_safe;
use crate::generator::registry::BlockContext;

/// Outports are written after the whole step has run.
pub fn outport(_ctx: &BlockContext) -> Vec<String> {
    vec!["/* output assigned after step */".to_string()]
}

pub fn scope(ctx: &BlockContext) -> Vec<String> {
    vec![format!(
        r#"printf("SCOPE {}: %f\n", (double){});"#,
        ctx.name, ctx.input
    )]
}

pub fn display(ctx: &BlockContext) -> Vec<String> {
    vec![format!(
        r#"printf("DISPLAY {}: %f\n", (double){});"#,
        ctx.name, ctx.input
    )]
}

pub fn terminator(ctx: &BlockContext) -> Vec<String> {
    vec![format!("(void){};  /* terminated */", ctx.input)]
}

pub fn to_workspace(ctx: &BlockContext) -> Vec<String> {
    let var = ctx.raw(&["VariableName"]).unwrap_or("simout");
    vec![format!(
        "(void){};  /* ToWorkspace '{}' is not logged */",
        ctx.input,
        comment_safe(var)
    )]
}
