//! Primop descriptors and the registry that feeds the top-level scope.
//!
//! Embedders collect [`PrimOpInfo`] descriptors into a [`PrimOpRegistry`]
//! before the evaluator exists, then move the registry into
//! [`EvalState::new`](crate::EvalState::new), which drains it once.
//!
//! ```
//! use ferrix_expr::{EvalSettings, EvalState, PrimOpInfo, PrimOpRegistry, Value};
//!
//! fn answer(_: &mut EvalState, _: ferrix_expr::PosIdx, _: &[ferrix_expr::ValueId])
//!     -> ferrix_expr::Result<Value> {
//!     Ok(Value::Int(42))
//! }
//!
//! let mut registry = PrimOpRegistry::with_builtins();
//! registry.register(PrimOpInfo::new("__answer", 0, answer).doc("The answer."));
//!
//! let state = EvalState::new(EvalSettings::default(), registry).unwrap();
//! assert!(state.builtins().contains(state.symbols().lookup("answer").unwrap()));
//! ```

pub mod builtins;

use crate::error::{EvalError, Result};
use crate::eval::EvalState;
use crate::settings::ExperimentalFeature;
use crate::value::{PosIdx, Value, ValueId};

/// Native function behind a primop.
///
/// Arguments arrive already evaluated. Constants (arity 0) are called once,
/// with no arguments, while the evaluator is being built.
pub type PrimOpFn = fn(&mut EvalState, PosIdx, &[ValueId]) -> Result<Value>;

/// Registration record for one primop.
#[derive(Debug, Clone, Copy)]
pub struct PrimOpInfo {
    /// Name in the top-level scope. A `__` prefix is dropped for the
    /// `builtins` record.
    pub name: &'static str,
    pub args: &'static [&'static str],
    /// Number of arguments; 0 registers a constant.
    pub arity: usize,
    pub doc: Option<&'static str>,
    pub fun: PrimOpFn,
    /// Only exposed when this feature is enabled.
    pub experimental_feature: Option<ExperimentalFeature>,
    /// Only exposed when native code is enabled.
    pub requires_native_code: bool,
}

impl PrimOpInfo {
    /// Describes a primop by arity alone.
    #[must_use]
    pub const fn new(name: &'static str, arity: usize, fun: PrimOpFn) -> Self {
        PrimOpInfo {
            name,
            args: &[],
            arity,
            doc: None,
            fun,
            experimental_feature: None,
            requires_native_code: false,
        }
    }

    /// Describes a primop by its argument names; the arity is their count.
    #[must_use]
    pub const fn with_args(
        name: &'static str,
        args: &'static [&'static str],
        fun: PrimOpFn,
    ) -> Self {
        PrimOpInfo {
            args,
            arity: args.len(),
            ..Self::new(name, 0, fun)
        }
    }

    #[must_use]
    pub const fn doc(self, doc: &'static str) -> Self {
        PrimOpInfo {
            doc: Some(doc),
            ..self
        }
    }

    #[must_use]
    pub const fn feature(self, feature: ExperimentalFeature) -> Self {
        PrimOpInfo {
            experimental_feature: Some(feature),
            ..self
        }
    }

    #[must_use]
    pub const fn native_code(self) -> Self {
        PrimOpInfo {
            requires_native_code: true,
            ..self
        }
    }

    /// Name inside the `builtins` record.
    #[must_use]
    pub fn builtin_name(&self) -> &'static str {
        builtin_name(self.name)
    }

    #[must_use]
    pub const fn is_constant(&self) -> bool {
        self.arity == 0
    }
}

/// Strips the `__` prefix that hides a primop from the top-level scope.
#[must_use]
pub fn builtin_name(name: &str) -> &str {
    name.strip_prefix("__").unwrap_or(name)
}

/// Primops collected for one evaluator.
///
/// Order is irrelevant: the evaluator sorts what it binds.
#[derive(Debug, Clone, Default)]
pub struct PrimOpRegistry {
    entries: Vec<PrimOpInfo>,
}

impl PrimOpRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the standard builtins.
    #[must_use]
    pub fn with_builtins() -> Self {
        builtins::BUILTINS.iter().copied().collect()
    }

    /// Adds `info`.
    ///
    /// An entry with the same `builtins` name is replaced, since both would
    /// bind the same attribute.
    pub fn register(&mut self, info: PrimOpInfo) -> &mut Self {
        let key = info.builtin_name();
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.builtin_name() == key)
        {
            Some(existing) => {
                log::warn!(
                    "primop '{}' registered twice, replacing '{}'",
                    info.name,
                    existing.name
                );
                *existing = info;
            }
            None => self.entries.push(info),
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry registered under `name` (with or without `__`).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PrimOpInfo> {
        let key = builtin_name(name);
        self.entries.iter().find(|entry| entry.builtin_name() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrimOpInfo> {
        self.entries.iter()
    }
}

impl IntoIterator for PrimOpRegistry {
    type Item = PrimOpInfo;
    type IntoIter = std::vec::IntoIter<PrimOpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Extend<PrimOpInfo> for PrimOpRegistry {
    fn extend<I: IntoIterator<Item = PrimOpInfo>>(&mut self, iter: I) {
        for info in iter {
            self.register(info);
        }
    }
}

impl FromIterator<PrimOpInfo> for PrimOpRegistry {
    fn from_iter<I: IntoIterator<Item = PrimOpInfo>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

pub(crate) fn expect_args(primop: &'static str, args: &[ValueId], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::WrongArgumentCount {
            primop,
            expected,
            got: args.len(),
        })
    }
}

pub(crate) fn expect_string(state: &EvalState, id: ValueId) -> Result<String> {
    match state.value(id) {
        Value::String(text) => Ok(text.to_string()),
        other => Err(EvalError::TypeError {
            expected: "string",
            got: other.type_name(),
        }),
    }
}

/// `importNative path symbol`: loads `symbol` from the shared object at
/// `path` through the installed [`NativeHost`](crate::NativeHost).
///
/// Hidden from the top-level scope unless native code is enabled, but
/// callable directly by embedders.
pub fn prim_import_native(state: &mut EvalState, _pos: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("importNative", args, 2)?;
    let path = expect_string(state, args[0])?;
    let symbol = expect_string(state, args[1])?;

    log::debug!("importNative: loading '{symbol}' from {path}");
    state.with_native_host("importNative", |host, state| {
        host.import_native(state, &path, &symbol)
    })
}

/// `exec [program args...]`: runs a program through the installed
/// [`NativeHost`](crate::NativeHost), which turns its output into a value.
pub fn prim_exec(state: &mut EvalState, _pos: PosIdx, args: &[ValueId]) -> Result<Value> {
    expect_args("exec", args, 1)?;
    let argv = match state.value(args[0]) {
        Value::List(items) => items.clone(),
        other => {
            return Err(EvalError::TypeError {
                expected: "list",
                got: other.type_name(),
            });
        }
    };
    let argv = argv
        .iter()
        .map(|&item| expect_string(state, item))
        .collect::<Result<Vec<String>>>()?;

    let Some((program, rest)) = argv.split_first() else {
        return Err(EvalError::Native(
            "at least one argument to 'exec' required".to_string(),
        ));
    };

    log::debug!("exec: running {program} with {} argument(s)", rest.len());
    state.with_native_host("exec", |host, state| host.exec(state, program, rest))
}
