// Primop registry and builtin integration tests
//
// Base environment population, feature gating, native-code gating and
// the standard builtins.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use ferrix_expr::{
    EvalError, EvalSettings, EvalState, ExperimentalFeature, NativeHost, PosIdx, PrimOpInfo,
    PrimOpRegistry, Result, Value, ValueId, prim_exec, prim_import_native,
};

fn pipe(_: &mut EvalState, _: PosIdx, args: &[ValueId]) -> Result<Value> {
    Ok(Value::Int(args.len() as i64))
}

fn gated_registry() -> PrimOpRegistry {
    let mut registry = PrimOpRegistry::new();
    registry.register(
        PrimOpInfo::with_args("__pipe", &["f", "x"], pipe)
            .doc("Apply *f* to *x*.")
            .feature(ExperimentalFeature::PipeOperators),
    );
    registry
}

/// Feature-gated primops only appear when the feature is enabled
#[test]
fn test_feature_gated_primop() {
    common::init_logging();

    let disabled = EvalState::new(EvalSettings::default(), gated_registry()).unwrap();
    assert!(disabled.symbols().lookup("pipe").is_none());
    assert_eq!(common::names(&disabled, disabled.value(disabled.builtins_value())).len(), 4);

    let settings = EvalSettings::default().with_feature(ExperimentalFeature::PipeOperators);
    let enabled = EvalState::new(settings, gated_registry()).unwrap();

    let pipe = enabled.symbols().lookup("pipe").unwrap();
    let slot = enabled.builtins().get(pipe).unwrap();
    let Value::PrimOp(primop) = enabled.value(slot.value) else {
        panic!("pipe is not a primop");
    };
    assert_eq!(primop.name, "pipe");
    assert_eq!(primop.arity, 2);
    assert_eq!(primop.args, &["f", "x"]);
    assert_eq!(primop.doc, Some("Apply *f* to *x*."));

    let dunder = enabled.symbols().lookup("__pipe").unwrap();
    assert_eq!(enabled.base_env().get(dunder).unwrap().value, slot.value);
    assert!(!enabled.base_env().contains(pipe));
}

/// Plain names are bound in both records, `__` names only stripped in builtins
#[test]
fn test_base_env_naming() {
    let state = common::std_state();
    let scope = common::names(&state, state.value(state.base_env_value()));
    let builtins = common::names(&state, state.value(state.builtins_value()));

    assert!(scope.contains(&"isAttrs".to_string()));
    assert!(scope.contains(&"removeAttrs".to_string()));
    assert!(scope.contains(&"__typeOf".to_string()));
    assert!(!scope.contains(&"typeOf".to_string()));
    for reserved in ["true", "false", "null", "builtins"] {
        assert!(scope.contains(&reserved.to_string()));
        assert!(builtins.contains(&reserved.to_string()));
    }

    assert!(builtins.contains(&"typeOf".to_string()));
    assert!(builtins.contains(&"isAttrs".to_string()));
    assert!(!builtins.iter().any(|name| name.starts_with("__")));
}

/// Native-code primops are hidden unless enabled
#[test]
fn test_native_code_gating() {
    let state = common::std_state();
    assert!(state.symbols().lookup("exec").is_none());
    assert!(state.symbols().lookup("importNative").is_none());

    let state = common::std_state_with(EvalSettings::default().enable_native_code(true));
    let exec = state.symbols().lookup("exec").unwrap();
    assert!(state.builtins().contains(exec));
    let import = state.symbols().lookup("__importNative").unwrap();
    assert!(state.base_env().contains(import));
}

/// Constants are evaluated once at construction
#[test]
fn test_constants() {
    let state = common::std_state();
    let version = state.symbols().lookup("langVersion").unwrap();
    let slot = state.builtins().get(version).unwrap();
    assert!(matches!(state.value(slot.value), Value::Int(6)));

    let system = state.symbols().lookup("currentSystem").unwrap();
    let slot = state.builtins().get(system).unwrap();
    assert_eq!(state.value(slot.value).type_name(), "string");

    let stats = state.stats();
    let primops = PrimOpRegistry::with_builtins()
        .iter()
        .filter(|info| !info.is_constant() && !info.requires_native_code)
        .count();
    assert_eq!(stats.nr_primops, primops);
}

#[test]
fn test_type_of_and_is_attrs() {
    let mut state = common::std_state();
    let set = common::record(&mut state, &[("a", Value::Int(1))]);
    let number = state.alloc_value_with(Value::Int(3));

    let result = common::call_builtin(&mut state, "typeOf", &[set]).unwrap();
    assert_eq!(result.as_str(), Some("set"));
    let result = common::call_builtin(&mut state, "typeOf", &[number]).unwrap();
    assert_eq!(result.as_str(), Some("int"));

    let result = common::call_builtin(&mut state, "isAttrs", &[set]).unwrap();
    assert!(matches!(result, Value::Bool(true)));
    let result = common::call_builtin(&mut state, "isAttrs", &[number]).unwrap();
    assert!(matches!(result, Value::Bool(false)));
}

#[test]
fn test_has_attr_and_get_attr() {
    let mut state = common::std_state();
    let set = common::record(&mut state, &[("present", Value::Int(7))]);
    let present = common::string(&mut state, "present");
    let absent = common::string(&mut state, "never-interned-name");

    let result = common::call_builtin(&mut state, "hasAttr", &[present, set]).unwrap();
    assert!(matches!(result, Value::Bool(true)));
    let result = common::call_builtin(&mut state, "hasAttr", &[absent, set]).unwrap();
    assert!(matches!(result, Value::Bool(false)));

    let result = common::call_builtin(&mut state, "getAttr", &[present, set]).unwrap();
    assert!(matches!(result, Value::Int(7)));
    let err = common::call_builtin(&mut state, "getAttr", &[absent, set]).unwrap_err();
    assert_eq!(
        err,
        EvalError::MissingAttribute {
            name: "never-interned-name".into()
        }
    );
}

#[test]
fn test_attr_names_and_values_are_lexicographic() {
    let mut state = common::std_state();
    let set = common::record(
        &mut state,
        &[
            ("zebra", Value::Int(3)),
            ("apple", Value::Int(1)),
            ("mango", Value::Int(2)),
        ],
    );

    let names = common::call_builtin(&mut state, "attrNames", &[set]).unwrap();
    assert_eq!(common::strings(&state, &names), vec!["apple", "mango", "zebra"]);

    let values = common::call_builtin(&mut state, "attrValues", &[set]).unwrap();
    let ints: Vec<i64> = values
        .as_list()
        .unwrap()
        .iter()
        .map(|&id| match state.value(id) {
            Value::Int(n) => *n,
            other => panic!("unexpected {other}"),
        })
        .collect();
    assert_eq!(ints, vec![1, 2, 3]);
}

#[test]
fn test_remove_attrs() {
    let mut state = common::std_state();
    let set = common::record(
        &mut state,
        &[("a", Value::Int(1)), ("b", Value::Int(2)), ("c", Value::Int(3))],
    );
    let names = common::list(&mut state, vec![Value::from("b"), Value::from("missing")]);

    let result = common::call_builtin(&mut state, "removeAttrs", &[set, names]).unwrap();
    assert_eq!(common::names(&state, &result), vec!["a", "c"]);
    assert!(result.as_attrs().unwrap().is_sorted());

    let everything = common::list(&mut state, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
    let result = common::call_builtin(&mut state, "removeAttrs", &[set, everything]).unwrap();
    assert!(result.as_attrs().unwrap().is_empty());
}

/// Appends a record filled with `alloc_attr` in decreasing symbol order.
fn unsorted_record(state: &mut EvalState, names: &[&str]) -> ValueId {
    let symbols: Vec<_> = names.iter().map(|name| state.symbols_mut().create(name)).collect();
    let bindings = state.alloc_bindings(names.len()).unwrap();
    let record = state.alloc_value_with(Value::Attrs(bindings));
    for (i, &symbol) in symbols.iter().enumerate().rev() {
        *state.alloc_attr(record, symbol) = Value::Int(i as i64);
    }
    record
}

fn assert_searchable(state: &EvalState, value: &Value, names: &[&str]) {
    let attrs = value.as_attrs().unwrap();
    assert!(attrs.is_sorted());
    let ids: Vec<u32> = attrs.iter().map(|attr| attr.name.as_u32()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "out of order: {ids:?}");
    for name in names {
        let symbol = state.symbols().lookup(name).unwrap();
        assert!(attrs.contains(symbol), "{name} not found");
    }
}

#[test]
fn test_remove_attrs_on_appended_record() {
    let mut state = common::std_state();
    let record = unsorted_record(&mut state, &["rec_a", "rec_b", "rec_c"]);
    assert!(!state.value(record).as_attrs().unwrap().is_sorted());

    let nothing = common::list(&mut state, vec![]);
    let result = common::call_builtin(&mut state, "removeAttrs", &[record, nothing]).unwrap();
    assert_searchable(&state, &result, &["rec_a", "rec_b", "rec_c"]);

    let result_id = state.alloc_value_with(result);
    let name = common::string(&mut state, "rec_c");
    let found = common::call_builtin(&mut state, "hasAttr", &[name, result_id]).unwrap();
    assert!(matches!(found, Value::Bool(true)));
}

#[test]
fn test_intersect_attrs_on_appended_record() {
    let mut state = common::std_state();
    let left = common::record(&mut state, &[("int_a", Value::Null), ("int_c", Value::Null)]);
    let right = unsorted_record(&mut state, &["int_a", "int_b", "int_c"]);

    let result = common::call_builtin(&mut state, "intersectAttrs", &[left, right]).unwrap();
    assert_searchable(&state, &result, &["int_a", "int_c"]);
    assert_eq!(common::names(&state, &result), vec!["int_a", "int_c"]);
}

/// Builtins check their argument count even when called directly
#[test]
fn test_builtin_called_directly_checks_arity() {
    let mut state = common::std_state();
    for name in ["typeOf", "isAttrs", "hasAttr", "getAttr", "attrNames", "removeAttrs", "length"] {
        let symbol = state.symbols().lookup(name).unwrap();
        let slot = state.builtins().get(symbol).unwrap().value;
        let Value::PrimOp(primop) = state.value(slot).clone() else {
            panic!("{name} is not a primop");
        };

        let err = (primop.fun)(&mut state, PosIdx::NONE, &[]).unwrap_err();
        assert!(
            matches!(err, EvalError::WrongArgumentCount { got: 0, .. }),
            "{name}: {err:?}"
        );
    }
}

#[test]
fn test_list_to_attrs_first_occurrence_wins() {
    let mut state = common::std_state();
    let first = common::record(&mut state, &[("name", Value::from("x")), ("value", Value::Int(1))]);
    let second = common::record(&mut state, &[("name", Value::from("y")), ("value", Value::Int(2))]);
    let shadowed = common::record(&mut state, &[("name", Value::from("x")), ("value", Value::Int(3))]);
    let list = state.alloc_value_with(Value::List(Rc::from(vec![first, second, shadowed])));

    let result = common::call_builtin(&mut state, "listToAttrs", &[list]).unwrap();
    assert_eq!(common::names(&state, &result), vec!["x", "y"]);

    let x = state.symbols().lookup("x").unwrap();
    let slot = result.as_attrs().unwrap().get(x).unwrap().value;
    assert!(matches!(state.value(slot), Value::Int(1)));
}

#[test]
fn test_list_to_attrs_requires_name() {
    let mut state = common::std_state();
    let entry = common::record(&mut state, &[("value", Value::Int(1))]);
    let list = state.alloc_value_with(Value::List(Rc::from(vec![entry])));

    let err = common::call_builtin(&mut state, "listToAttrs", &[list]).unwrap_err();
    assert_eq!(err, EvalError::MissingAttribute { name: "name".into() });
}

#[test]
fn test_intersect_attrs() {
    let mut state = common::std_state();
    let left = common::record(&mut state, &[("a", Value::Null), ("b", Value::Null)]);
    let right = common::record(
        &mut state,
        &[("b", Value::Int(2)), ("c", Value::Int(3)), ("a", Value::Int(1))],
    );

    let result = common::call_builtin(&mut state, "intersectAttrs", &[left, right]).unwrap();
    assert_eq!(common::names(&state, &result), vec!["a", "b"]);

    let b = state.symbols().lookup("b").unwrap();
    let slot = result.as_attrs().unwrap().get(b).unwrap().value;
    assert!(matches!(state.value(slot), Value::Int(2)));
}

#[test]
fn test_length_and_type_errors() {
    let mut state = common::std_state();
    let items = common::list(&mut state, vec![Value::Null, Value::Null, Value::Null]);
    let result = common::call_builtin(&mut state, "length", &[items]).unwrap();
    assert!(matches!(result, Value::Int(3)));

    let number = state.alloc_value_with(Value::Int(1));
    let err = common::call_builtin(&mut state, "length", &[number]).unwrap_err();
    assert_eq!(
        err,
        EvalError::TypeError {
            expected: "list",
            got: "int"
        }
    );

    let err = common::call_builtin(&mut state, "length", &[]).unwrap_err();
    assert!(matches!(err, EvalError::WrongArgumentCount { expected: 1, got: 0, .. }));
}

#[derive(Default)]
struct RecordingHost {
    calls: Rc<RefCell<Vec<String>>>,
}

impl NativeHost for RecordingHost {
    fn import_native(&mut self, _: &mut EvalState, path: &str, symbol: &str) -> Result<Value> {
        self.calls.borrow_mut().push(format!("import {path} {symbol}"));
        Ok(Value::Int(1))
    }

    fn exec(&mut self, _: &mut EvalState, program: &str, args: &[String]) -> Result<Value> {
        self.calls
            .borrow_mut()
            .push(format!("exec {program} {}", args.join(" ")));
        Ok(Value::from("done"))
    }
}

/// Native primops stay callable directly even when hidden from the scope
#[test]
fn test_native_primops_without_host() {
    let mut state = common::std_state();
    let path = common::string(&mut state, "/lib/plugin.so");
    let symbol = common::string(&mut state, "init");

    let err = prim_import_native(&mut state, PosIdx::NONE, &[path, symbol]).unwrap_err();
    assert_eq!(
        err,
        EvalError::NativeCodeUnavailable {
            primop: "importNative"
        }
    );
}

#[test]
fn test_native_primops_with_host() {
    let mut state = common::std_state();
    let host = RecordingHost::default();
    let calls = Rc::clone(&host.calls);
    state.set_native_host(Box::new(host));

    let path = common::string(&mut state, "/lib/plugin.so");
    let symbol = common::string(&mut state, "init");
    let result = prim_import_native(&mut state, PosIdx::NONE, &[path, symbol]).unwrap();
    assert!(matches!(result, Value::Int(1)));

    let argv = common::list(&mut state, vec![Value::from("echo"), Value::from("hi")]);
    let result = prim_exec(&mut state, PosIdx::NONE, &[argv]).unwrap();
    assert_eq!(result.as_str(), Some("done"));

    let empty = common::list(&mut state, Vec::new());
    let err = prim_exec(&mut state, PosIdx::NONE, &[empty]).unwrap_err();
    assert!(matches!(err, EvalError::Native(_)));

    assert_eq!(
        *calls.borrow(),
        vec!["import /lib/plugin.so init".to_string(), "exec echo hi".to_string()]
    );
}

fn builtins_size(state: &mut EvalState, _: PosIdx, _: &[ValueId]) -> Result<Value> {
    let scope = state.base_env().len() as i64;
    Ok(Value::Int(scope + state.builtins().len() as i64))
}

/// Constants see an empty scope while the base environment is built
#[test]
fn test_constant_reads_scope_during_construction() {
    let mut registry = PrimOpRegistry::new();
    registry.register(PrimOpInfo::new("__builtinsSize", 0, builtins_size).doc("Size."));

    let state = EvalState::new(EvalSettings::default(), registry).unwrap();
    let symbol = state.symbols().lookup("builtinsSize").unwrap();
    let slot = state.builtins().get(symbol).unwrap().value;
    assert!(matches!(state.value(slot), Value::Int(0)));

    // true, false, null, builtins and the constant itself
    assert_eq!(state.builtins().len(), 5);
}

/// Builder-declared primops carry the operator flag
#[test]
fn test_alloc_primop() {
    let mut state = common::bare_state();
    let info = PrimOpInfo::with_args("__pipe", &["f", "x"], pipe).doc("Apply.");

    let mut builder = state.build_bindings(1).unwrap();
    builder.alloc_primop("|>", &info);
    let record = builder.finish();

    let op = state.symbols().lookup("|>").unwrap();
    let slot = record.get(op).unwrap().value;
    let Value::PrimOp(primop) = state.value(slot) else {
        panic!("slot is not a primop");
    };
    assert!(primop.is_op);
    assert_eq!(primop.arity, 2);
    assert_eq!(primop.name, "__pipe");

    let args = [state.alloc_value(), state.alloc_value()];
    let result = state.call(slot, &args).unwrap();
    assert!(matches!(result, Value::Int(2)));
}
