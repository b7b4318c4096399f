//! `ferrix` evaluator core
//!
//! Records (attribute sets), the record builder and the primop registry of
//! a lazy configuration-language evaluator, on top of the symbol table and
//! cell arena from [`ferrix_mem`].
//!
//! - [`Bindings`]: fixed-capacity record, sorted once, searched by symbol
//! - [`BindingsBuilder`]: reserve slots, fill them, finish
//! - [`PrimOpRegistry`]: primops collected before the evaluator exists
//! - [`EvalState`]: owns all of the above and the top-level scope
//!
//! # Example
//!
//! ```
//! use ferrix_expr::{EvalSettings, EvalState, PosIdx, PrimOpRegistry, Value};
//!
//! let mut state = EvalState::new(EvalSettings::default(), PrimOpRegistry::with_builtins())?;
//!
//! let mut builder = state.build_bindings(1)?;
//! *builder.alloc("answer", PosIdx::NONE) = Value::Int(42);
//! let record = builder.finish();
//! let record = state.alloc_value_with(Value::Attrs(record));
//!
//! let type_of = state.symbols().lookup("typeOf").unwrap();
//! let type_of = state.builtins().get(type_of).unwrap().value;
//! let result = state.call(type_of, &[record])?;
//! assert_eq!(result.as_str(), Some("set"));
//! # Ok::<(), ferrix_expr::EvalError>(())
//! ```

pub mod attr_set;
pub mod error;
pub mod eval;
pub mod primops;
pub mod settings;
pub mod value;

pub use attr_set::{Attr, Bindings, BindingsBuilder, MAX_CAPACITY};
pub use error::{EvalError, Result, SettingsError};
pub use eval::{EvalState, EvalStats, IntoSymbol, NativeHost};
pub use primops::{PrimOpFn, PrimOpInfo, PrimOpRegistry, prim_exec, prim_import_native};
pub use settings::{EvalSettings, ExperimentalFeature};
pub use value::{PosIdx, PrimOp, Value, ValueId};
