//! Standard builtins over already evaluated values.

use std::rc::Rc;

use ferrix_mem::Symbol;
use hashbrown::HashSet;

use super::{PrimOpInfo, expect_args, expect_string, prim_exec, prim_import_native};
use crate::attr_set::{Attr, Bindings, BindingsBuilder};
use crate::error::{EvalError, Result};
use crate::eval::EvalState;
use crate::value::{PosIdx, Value, ValueId};

/// Language version reported by `builtins.langVersion`.
pub const LANG_VERSION: i64 = 6;

pub const BUILTINS: &[PrimOpInfo] = &[
    PrimOpInfo::with_args("__typeOf", &["e"], type_of)
        .doc("Return a string naming the type of *e*: `int`, `bool`, `string`, `null`, `set`, `list`, `lambda` or `float`."),
    PrimOpInfo::with_args("isAttrs", &["e"], is_attrs)
        .doc("Return `true` if *e* evaluates to a set, and `false` otherwise."),
    PrimOpInfo::with_args("__hasAttr", &["s", "set"], has_attr)
        .doc("Return `true` if *set* has an attribute named *s*."),
    PrimOpInfo::with_args("__getAttr", &["s", "set"], get_attr)
        .doc("Return the attribute named *s* from *set*. Fails if the attribute does not exist."),
    PrimOpInfo::with_args("__attrNames", &["set"], attr_names)
        .doc("Return the names of the attributes in *set*, sorted alphabetically."),
    PrimOpInfo::with_args("__attrValues", &["set"], attr_values)
        .doc("Return the values of the attributes in *set*, in the order of their sorted names."),
    PrimOpInfo::with_args("removeAttrs", &["set", "list"], remove_attrs)
        .doc("Remove the attributes listed in *list* from *set*. Names that do not exist are ignored."),
    PrimOpInfo::with_args("__listToAttrs", &["e"], list_to_attrs)
        .doc("Construct a set from a list of `{ name, value }` sets. The first occurrence of a name wins."),
    PrimOpInfo::with_args("__intersectAttrs", &["e1", "e2"], intersect_attrs)
        .doc("Return the attributes of *e2* whose names also appear in *e1*."),
    PrimOpInfo::with_args("__length", &["e"], length)
        .doc("Return the length of the list *e*."),
    PrimOpInfo::new("__currentSystem", 0, current_system)
        .doc("The platform the evaluator runs on, e.g. `\"x86_64-linux\"`."),
    PrimOpInfo::new("__langVersion", 0, lang_version)
        .doc("The current version of the language."),
    PrimOpInfo::with_args("__importNative", &["path", "symbol"], prim_import_native)
        .doc("Load *symbol* from the shared object at *path* and return the value it initializes.")
        .native_code(),
    PrimOpInfo::with_args("__exec", &["arguments"], prim_exec)
        .doc("Run the program named by the first element of *arguments* and parse its output.")
        .native_code(),
];

fn type_error(expected: &'static str, got: &Value) -> EvalError {
    EvalError::TypeError {
        expected,
        got: got.type_name(),
    }
}

fn expect_attrs(state: &EvalState, id: ValueId) -> Result<Rc<Bindings>> {
    match state.value(id) {
        Value::Attrs(bindings) => Ok(Rc::clone(bindings)),
        other => Err(type_error("set", other)),
    }
}

fn expect_list(state: &EvalState, id: ValueId) -> Result<Rc<[ValueId]>> {
    match state.value(id) {
        Value::List(items) => Ok(Rc::clone(items)),
        other => Err(type_error("list", other)),
    }
}

/// Finishes a record whose slots were copied, in order, from `source`.
fn finish_filtered(builder: BindingsBuilder<'_>, source: &Bindings) -> Rc<Bindings> {
    if source.is_sorted() {
        builder.already_sorted()
    } else {
        builder.finish()
    }
}

fn type_of(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("typeOf", args, 1)?;
    Ok(Value::from(state.value(args[0]).type_name()))
}

fn is_attrs(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("isAttrs", args, 1)?;
    Ok(Value::Bool(state.value(args[0]).is_attrs()))
}

fn has_attr(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("hasAttr", args, 2)?;
    let name = expect_string(state, args[0])?;
    let set = expect_attrs(state, args[1])?;

    // text that was never interned cannot be an attribute name
    let found = state
        .symbols()
        .lookup(&name)
        .is_some_and(|symbol| set.contains(symbol));
    Ok(Value::Bool(found))
}

fn get_attr(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("getAttr", args, 2)?;
    let name = expect_string(state, args[0])?;
    let set = expect_attrs(state, args[1])?;

    let attr = state
        .symbols()
        .lookup(&name)
        .and_then(|symbol| set.get(symbol))
        .ok_or(EvalError::MissingAttribute { name })?;
    Ok(state.value(attr.value).clone())
}

fn attr_names(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("attrNames", args, 1)?;
    let set = expect_attrs(state, args[0])?;
    let names: Vec<Rc<str>> = set
        .lexicographic_order(state.symbols())
        .into_iter()
        .map(|attr| Rc::from(&state.symbols()[attr.name]))
        .collect();

    let items: Vec<ValueId> = names
        .into_iter()
        .map(|name| state.alloc_value_with(Value::String(name)))
        .collect();
    Ok(Value::List(items.into()))
}

fn attr_values(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("attrValues", args, 1)?;
    let set = expect_attrs(state, args[0])?;
    let items: Vec<ValueId> = set
        .lexicographic_order(state.symbols())
        .into_iter()
        .map(|attr| attr.value)
        .collect();
    Ok(Value::List(items.into()))
}

fn remove_attrs(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("removeAttrs", args, 2)?;
    let set = expect_attrs(state, args[0])?;
    let list = expect_list(state, args[1])?;

    let mut removed = HashSet::with_capacity(list.len());
    for &item in list.iter() {
        let name = expect_string(state, item)?;
        if let Some(symbol) = state.symbols().lookup(&name) {
            removed.insert(symbol);
        }
    }

    let mut builder = state.build_bindings(set.len())?;
    for attr in set.iter().filter(|attr| !removed.contains(&attr.name)) {
        builder.insert(*attr);
    }
    Ok(Value::Attrs(finish_filtered(builder, &set)))
}

fn list_to_attrs(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("listToAttrs", args, 1)?;
    let list = expect_list(state, args[0])?;
    let name_sym = state.statics().name;
    let value_sym = state.statics().value;

    let mut seen: HashSet<Symbol> = HashSet::with_capacity(list.len());
    let mut attrs: Vec<Attr> = Vec::with_capacity(list.len());
    for &item in list.iter() {
        let entry = expect_attrs(state, item)?;
        let name_attr = entry.get(name_sym).ok_or_else(|| EvalError::MissingAttribute {
            name: "name".to_string(),
        })?;
        let name = expect_string(state, name_attr.value)?;
        let symbol = state.symbols_mut().create(&name);

        if seen.insert(symbol) {
            let value = entry.get(value_sym).ok_or_else(|| EvalError::MissingAttribute {
                name: "value".to_string(),
            })?;
            attrs.push(Attr::new(symbol, value.value, name_attr.pos));
        }
    }

    let mut builder = state.build_bindings(attrs.len())?;
    for attr in attrs {
        builder.insert(attr);
    }
    Ok(Value::Attrs(builder.finish()))
}

fn intersect_attrs(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("intersectAttrs", args, 2)?;
    let left = expect_attrs(state, args[0])?;
    let right = expect_attrs(state, args[1])?;

    let mut builder = state.build_bindings(left.len().min(right.len()))?;
    for attr in right.iter().filter(|attr| left.contains(attr.name)) {
        builder.insert(*attr);
    }
    Ok(Value::Attrs(finish_filtered(builder, &right)))
}

fn length(state: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("length", args, 1)?;
    let list = expect_list(state, args[0])?;
    // a list can never exceed i64::MAX cells
    Ok(Value::Int(list.len() as i64))
}

/// Platform string in `<arch>-<os>` form.
#[must_use]
pub fn current_system_name() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    format!("{}-{os}", std::env::consts::ARCH)
}

fn current_system(_: &mut EvalState, _: PosIdx, _: &[ValueId]) -> Result<Value> {
    Ok(Value::from(current_system_name().as_str()))
}

fn lang_version(_: &mut EvalState, _: PosIdx, _: &[ValueId]) -> Result<Value> {
    Ok(Value::Int(LANG_VERSION))
}
