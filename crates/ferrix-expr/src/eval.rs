//! Evaluator state: symbols, value cells, records and the top-level scope.
//!
//! [`EvalState`] is the allocation facility every record and value comes
//! from. Building one drains a [`PrimOpRegistry`] into two records:
//!
//! - the top-level scope, holding each primop under its registered name
//!   plus `true`, `false`, `null` and `builtins`
//! - `builtins`, holding each primop with a leading `__` removed, and the
//!   `builtins` record itself
//!
//! The state is single-threaded. Run one `EvalState` per thread if needed.

use std::fmt;
use std::rc::Rc;

use ferrix_mem::{ArenaStats, CellArena, StaticSymbols, Symbol, SymbolTable};

use crate::attr_set::{Attr, Bindings, BindingsBuilder, MAX_CAPACITY};
use crate::error::{EvalError, Result};
use crate::primops::{PrimOpInfo, PrimOpRegistry};
use crate::settings::EvalSettings;
use crate::value::{PosIdx, PrimOp, Value, ValueId};

/// Names bound as either interned text or an existing symbol.
pub trait IntoSymbol {
    fn into_symbol(self, symbols: &mut SymbolTable) -> Symbol;
}

impl IntoSymbol for Symbol {
    fn into_symbol(self, _: &mut SymbolTable) -> Symbol {
        self
    }
}

impl IntoSymbol for &str {
    fn into_symbol(self, symbols: &mut SymbolTable) -> Symbol {
        symbols.create(self)
    }
}

impl IntoSymbol for &String {
    fn into_symbol(self, symbols: &mut SymbolTable) -> Symbol {
        symbols.create(self)
    }
}

/// Embedder hooks behind `importNative` and `exec`.
///
/// Without a host both primops fail with
/// [`EvalError::NativeCodeUnavailable`].
pub trait NativeHost {
    /// Loads `symbol` from the shared object at `path` and returns the value
    /// it initializes.
    fn import_native(&mut self, state: &mut EvalState, path: &str, symbol: &str)
    -> Result<Value>;

    /// Runs `program` with `args` and turns its output into a value.
    fn exec(&mut self, state: &mut EvalState, program: &str, args: &[String]) -> Result<Value>;
}

/// Allocation counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvalStats {
    pub nr_values: usize,
    pub nr_attrsets: usize,
    pub nr_attrs_in_attrsets: usize,
    pub nr_primops: usize,
    pub nr_symbols: usize,
    pub symbol_bytes: usize,
}

impl fmt::Display for EvalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "values allocated:      {}", self.nr_values)?;
        writeln!(f, "attribute sets:        {}", self.nr_attrsets)?;
        writeln!(f, "attribute slots:       {}", self.nr_attrs_in_attrsets)?;
        writeln!(f, "primops:               {}", self.nr_primops)?;
        writeln!(f, "symbols:               {}", self.nr_symbols)?;
        write!(f, "symbol bytes:          {}", self.symbol_bytes)
    }
}

/// The evaluator's allocation facility and top-level scope.
pub struct EvalState {
    symbols: SymbolTable,
    statics: StaticSymbols,
    values: CellArena<Value>,
    settings: EvalSettings,
    stats: EvalStats,
    empty_bindings: Rc<Bindings>,
    base_env: ValueId,
    builtins: ValueId,
    native_host: Option<Box<dyn NativeHost>>,
}

impl EvalState {
    /// Builds an evaluator and binds the primops of `registry`.
    ///
    /// Descriptors gated by a disabled feature, and native-code descriptors
    /// when native code is off, are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a constant's initializer.
    pub fn new(settings: EvalSettings, registry: PrimOpRegistry) -> Result<Self> {
        let mut symbols = SymbolTable::new();
        let statics = StaticSymbols::new(&mut symbols);

        let mut values = CellArena::new(settings.value_chunk_size);
        let base_env = values.alloc(Value::Uninit);
        let builtins = values.alloc(Value::Uninit);

        let mut state = EvalState {
            symbols,
            statics,
            values,
            settings,
            stats: EvalStats {
                nr_values: 2,
                ..EvalStats::default()
            },
            empty_bindings: Rc::new(Bindings::empty()),
            base_env,
            builtins,
            native_host: None,
        };
        state.create_base_env(registry)?;
        Ok(state)
    }

    fn is_exposed(&self, info: &PrimOpInfo) -> bool {
        if let Some(feature) = info.experimental_feature {
            if !self.settings.is_enabled(feature) {
                log::debug!("skipping primop '{}': feature '{feature}' disabled", info.name);
                return false;
            }
        }
        if info.requires_native_code && !self.settings.enable_native_code {
            log::debug!("skipping primop '{}': native code disabled", info.name);
            return false;
        }
        true
    }

    fn create_base_env(&mut self, registry: PrimOpRegistry) -> Result<()> {
        const RESERVED: [&str; 4] = ["true", "false", "null", "builtins"];

        let mut entries: Vec<(&'static str, ValueId)> = vec![
            ("true", self.alloc_value_with(Value::Bool(true))),
            ("false", self.alloc_value_with(Value::Bool(false))),
            ("null", self.alloc_value_with(Value::Null)),
        ];

        for info in registry {
            if !self.is_exposed(&info) {
                continue;
            }
            if RESERVED.contains(&info.builtin_name()) {
                log::warn!("primop '{}' shadows a reserved name, skipping", info.name);
                continue;
            }

            let value = if info.is_constant() {
                // constants are initialized before builtins is complete
                (info.fun)(self, PosIdx::NONE, &[])?
            } else {
                self.stats.nr_primops += 1;
                Value::PrimOp(Rc::new(PrimOp {
                    name: info.builtin_name(),
                    args: info.args,
                    arity: info.arity,
                    doc: info.doc,
                    fun: info.fun,
                    is_op: false,
                }))
            };
            entries.push((info.name, self.alloc_value_with(value)));
        }

        let scope_attrs: Vec<(Symbol, ValueId)> = entries
            .iter()
            .map(|&(name, value)| (self.symbols.create(name), value))
            .collect();
        let builtin_attrs: Vec<(Symbol, ValueId)> = entries
            .iter()
            .map(|&(name, value)| {
                let name = crate::primops::builtin_name(name);
                (self.symbols.create(name), value)
            })
            .collect();
        let builtins_sym = self.symbols.create("builtins");
        let builtins_value = self.builtins;

        let mut scope = self.build_bindings(scope_attrs.len() + 1)?;
        for (name, value) in scope_attrs {
            scope.insert(Attr::new(name, value, PosIdx::NONE));
        }
        scope.insert(Attr::new(builtins_sym, builtins_value, PosIdx::NONE));
        let scope = scope.finish();

        let mut builtins = self.build_bindings(builtin_attrs.len() + 1)?;
        for (name, value) in builtin_attrs {
            builtins.insert(Attr::new(name, value, PosIdx::NONE));
        }
        builtins.insert(Attr::new(builtins_sym, builtins_value, PosIdx::NONE));
        let builtins = builtins.finish();

        log::debug!(
            "base environment: {} scope entries, {} builtins",
            scope.len(),
            builtins.len()
        );
        self.values[self.base_env] = Value::Attrs(scope);
        self.values[self.builtins] = Value::Attrs(builtins);
        Ok(())
    }

    /// Installs the host used by `importNative` and `exec`.
    pub fn set_native_host(&mut self, host: Box<dyn NativeHost>) {
        self.native_host = Some(host);
    }

    pub(crate) fn with_native_host<T>(
        &mut self,
        primop: &'static str,
        call: impl FnOnce(&mut dyn NativeHost, &mut EvalState) -> Result<T>,
    ) -> Result<T> {
        let Some(mut host) = self.native_host.take() else {
            return Err(EvalError::NativeCodeUnavailable { primop });
        };
        let result = call(host.as_mut(), self);
        self.native_host = Some(host);
        result
    }

    #[must_use]
    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Well-known names interned at construction.
    #[must_use]
    pub fn statics(&self) -> &StaticSymbols {
        &self.statics
    }

    /// Reserves an uninitialised value cell.
    pub fn alloc_value(&mut self) -> ValueId {
        self.alloc_value_with(Value::Uninit)
    }

    /// Moves `value` into a fresh cell.
    pub fn alloc_value_with(&mut self, value: Value) -> ValueId {
        self.stats.nr_values += 1;
        self.values.alloc(value)
    }

    /// Returns the value in cell `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this evaluator.
    #[must_use]
    #[track_caller]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id]
    }

    #[track_caller]
    pub fn value_mut(&mut self, id: ValueId) -> &mut Value {
        &mut self.values[id]
    }

    /// Allocates a record with room for `capacity` attributes.
    ///
    /// A capacity of zero returns the shared empty record without
    /// allocating.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::AttrSetTooBig`] if `capacity` exceeds
    /// [`MAX_CAPACITY`]. Nothing is allocated or counted in that case.
    pub fn alloc_bindings(&mut self, capacity: usize) -> Result<Rc<Bindings>> {
        if capacity == 0 {
            return Ok(Rc::clone(&self.empty_bindings));
        }
        let Ok(slots) = u32::try_from(capacity) else {
            return Err(EvalError::AttrSetTooBig {
                requested: capacity,
            });
        };
        debug_assert!(capacity <= MAX_CAPACITY);

        self.stats.nr_attrsets += 1;
        self.stats.nr_attrs_in_attrsets += capacity;
        Ok(Rc::new(Bindings::with_capacity(slots)))
    }

    /// Opens a builder over a fresh record of `capacity` slots.
    ///
    /// # Errors
    ///
    /// Fails like [`alloc_bindings`](Self::alloc_bindings).
    pub fn build_bindings(&mut self, capacity: usize) -> Result<BindingsBuilder<'_>> {
        let bindings = self.alloc_bindings(capacity)?;
        Ok(BindingsBuilder::new(self, bindings))
    }

    /// Appends a fresh slot named `name` to the record in cell `record`,
    /// outside the builder protocol.
    ///
    /// The record is left unsorted; call [`Bindings::sort`] before the next
    /// lookup.
    ///
    /// # Panics
    ///
    /// Panics if `record` does not hold a record, if the record is full, if
    /// it already has an attribute named `name`, or if it is shared with
    /// another value.
    #[track_caller]
    pub fn alloc_attr(&mut self, record: ValueId, name: impl IntoSymbol) -> &mut Value {
        let name = name.into_symbol(&mut self.symbols);
        let value = self.alloc_value();

        match &mut self.values[record] {
            Value::Attrs(bindings) => match Rc::get_mut(bindings) {
                Some(bindings) => {
                    if bindings.has_slot(name) {
                        panic!(
                            "duplicate attribute '{}' appended to attribute set",
                            self.symbols.resolve(name)
                        );
                    }
                    bindings.push(Attr::new(name, value, PosIdx::NONE));
                }
                None => panic!("cannot append to a shared attribute set"),
            },
            other => panic!(
                "cannot append an attribute to a value of type {}",
                other.type_name()
            ),
        }
        &mut self.values[value]
    }

    /// Applies the primop in cell `function` to `args`.
    ///
    /// # Errors
    ///
    /// Fails if `function` is not a primop, if the argument count does not
    /// match its arity, or with whatever the primop itself returns.
    pub fn call(&mut self, function: ValueId, args: &[ValueId]) -> Result<Value> {
        let primop = match &self.values[function] {
            Value::PrimOp(primop) => Rc::clone(primop),
            other => {
                return Err(EvalError::TypeError {
                    expected: "lambda",
                    got: other.type_name(),
                });
            }
        };
        crate::primops::expect_args(primop.name, args, primop.arity)?;
        (primop.fun)(self, PosIdx::NONE, args)
    }

    /// Cell holding the top-level scope record.
    #[must_use]
    pub fn base_env_value(&self) -> ValueId {
        self.base_env
    }

    /// The top-level scope record.
    ///
    /// Empty while constant primops are being initialized.
    #[must_use]
    pub fn base_env(&self) -> &Rc<Bindings> {
        self.record(self.base_env)
    }

    /// Cell holding the `builtins` record.
    #[must_use]
    pub fn builtins_value(&self) -> ValueId {
        self.builtins
    }

    /// The `builtins` record.
    ///
    /// Empty while constant primops are being initialized.
    #[must_use]
    pub fn builtins(&self) -> &Rc<Bindings> {
        self.record(self.builtins)
    }

    /// Constants run while the scope is still being built and see the
    /// empty record there.
    fn record(&self, id: ValueId) -> &Rc<Bindings> {
        match &self.values[id] {
            Value::Attrs(bindings) => bindings,
            Value::Uninit => &self.empty_bindings,
            other => unreachable!("scope cell holds a {}", other.type_name()),
        }
    }

    pub(crate) fn count_primop(&mut self) {
        self.stats.nr_primops += 1;
    }

    /// Returns allocation counters, including symbol table totals.
    #[must_use]
    pub fn stats(&self) -> EvalStats {
        EvalStats {
            nr_symbols: self.symbols.len(),
            symbol_bytes: self.symbols.total_size(),
            ..self.stats
        }
    }

    /// Arena counters for the value cells.
    #[must_use]
    pub fn value_arena_stats(&self) -> ArenaStats {
        self.values.stats()
    }

    /// Logs [`stats`](Self::stats) at `info` level.
    pub fn report_stats(&self) {
        let stats = self.stats();
        let arena = self.values.stats();
        log::info!(
            "values: {} ({} bytes in {} chunks)",
            stats.nr_values,
            arena.bytes_allocated,
            arena.chunk_count
        );
        log::info!(
            "attribute sets: {} with {} slots",
            stats.nr_attrsets,
            stats.nr_attrs_in_attrsets
        );
        log::info!("primops: {}", stats.nr_primops);
        log::info!(
            "symbols: {} ({} bytes in {} chunks)",
            stats.nr_symbols,
            stats.symbol_bytes,
            self.symbols.chunk_count()
        );
    }
}

impl fmt::Debug for EvalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalState")
            .field("symbols", &self.symbols)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .field("native_host", &self.native_host.is_some())
            .finish_non_exhaustive()
    }
}
