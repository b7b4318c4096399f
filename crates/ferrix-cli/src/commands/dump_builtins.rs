//! `ferrix dump-builtins`: list the `builtins` record.

use std::io::Write;

use ferrix_expr::{EvalSettings, EvalState, PrimOpRegistry, Value};

use crate::error::Result;

/// Builds an evaluator from the standard registry and prints every
/// `builtins` entry in name order.
pub fn run_dump_builtins(
    settings: EvalSettings,
    show_stats: bool,
    out: &mut impl Write,
) -> Result<()> {
    let state = EvalState::new(settings, PrimOpRegistry::with_builtins())?;
    write_builtins(&state, out)?;

    if show_stats {
        state.report_stats();
        writeln!(out)?;
        writeln!(out, "{}", state.stats())?;
    }
    Ok(())
}

fn write_builtins(state: &EvalState, out: &mut impl Write) -> Result<()> {
    let symbols = state.symbols();

    for attr in state.builtins().lexicographic_order(symbols) {
        let name = &symbols[attr.name];
        match state.value(attr.value) {
            Value::PrimOp(primop) => {
                write!(out, "{name} (arity {})", primop.arity)?;
                if !primop.args.is_empty() {
                    write!(out, ": {}", primop.args.join(" "))?;
                }
                writeln!(out)?;
                if let Some(doc) = primop.doc {
                    writeln!(out, "    {doc}")?;
                }
            }
            constant => writeln!(out, "{name} = {constant}")?,
        }
    }
    Ok(())
}
