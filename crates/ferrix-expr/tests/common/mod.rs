// Common test utilities for integration tests
//
// Shared evaluator fixtures and value helpers.

#![allow(dead_code)]

use std::rc::Rc;

use ferrix_expr::{
    EvalSettings, EvalState, PosIdx, PrimOpRegistry, Result, Value, ValueId,
};

/// Installs the terminal logger once; `FERRIX_LOG` picks the level.
pub fn init_logging() {
    ferrix_log::init();
}

/// Evaluator with no primops beyond the reserved constants.
pub fn bare_state() -> EvalState {
    EvalState::new(EvalSettings::default(), PrimOpRegistry::new())
        .expect("Failed to create bare evaluator")
}

/// Evaluator with the standard builtins.
pub fn std_state() -> EvalState {
    std_state_with(EvalSettings::default())
}

pub fn std_state_with(settings: EvalSettings) -> EvalState {
    EvalState::new(settings, PrimOpRegistry::with_builtins())
        .expect("Failed to create evaluator")
}

/// Allocates a sorted record from `(name, value)` pairs.
pub fn record(state: &mut EvalState, entries: &[(&str, Value)]) -> ValueId {
    let mut builder = state
        .build_bindings(entries.len())
        .expect("Failed to open record builder");
    for (name, value) in entries {
        *builder.alloc(*name, PosIdx::NONE) = value.clone();
    }
    let bindings = builder.finish();
    state.alloc_value_with(Value::Attrs(bindings))
}

/// Allocates a list of freshly allocated values.
pub fn list(state: &mut EvalState, items: Vec<Value>) -> ValueId {
    let ids: Vec<ValueId> = items
        .into_iter()
        .map(|item| state.alloc_value_with(item))
        .collect();
    state.alloc_value_with(Value::List(Rc::from(ids)))
}

pub fn string(state: &mut EvalState, text: &str) -> ValueId {
    state.alloc_value_with(Value::from(text))
}

/// Looks up `name` in the `builtins` record and applies it.
pub fn call_builtin(state: &mut EvalState, name: &str, args: &[ValueId]) -> Result<Value> {
    let symbol = state
        .symbols()
        .lookup(name)
        .unwrap_or_else(|| panic!("builtin {name} was never interned"));
    let function = state
        .builtins()
        .get(symbol)
        .unwrap_or_else(|| panic!("builtin {name} is not bound"))
        .value;
    state.call(function, args)
}

/// Names of a record in lexicographic order.
pub fn names(state: &EvalState, value: &Value) -> Vec<String> {
    let bindings = value.as_attrs().expect("value is not a record");
    bindings
        .lexicographic_order(state.symbols())
        .into_iter()
        .map(|attr| state.symbols()[attr.name].to_string())
        .collect()
}

/// Strings held by a list value.
pub fn strings(state: &EvalState, value: &Value) -> Vec<String> {
    value
        .as_list()
        .expect("value is not a list")
        .iter()
        .map(|&id| {
            state
                .value(id)
                .as_str()
                .expect("list item is not a string")
                .to_string()
        })
        .collect()
}
