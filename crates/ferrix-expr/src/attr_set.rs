//! Attribute records and the two-phase record builder.
//!
//! A [`Bindings`] is allocated with a fixed capacity, filled by appending
//! [`Attr`] triples, then sorted by symbol once. Only sorted records answer
//! lookups. [`BindingsBuilder`] wraps that protocol: reserve a slot, fill it
//! in place, finish.
//!
//! # Examples
//!
//! ```
//! use ferrix_expr::{EvalSettings, EvalState, PosIdx, PrimOpRegistry, Value};
//!
//! let mut state = EvalState::new(EvalSettings::default(), PrimOpRegistry::new()).unwrap();
//!
//! let mut builder = state.build_bindings(2).unwrap();
//! *builder.alloc("name", PosIdx::NONE) = Value::from("hello");
//! *builder.alloc("version", PosIdx::NONE) = Value::from(2);
//! let attrs = builder.finish();
//!
//! let version = state.symbols_mut().create("version");
//! let attr = attrs.get(version).unwrap();
//! assert!(matches!(state.value(attr.value), Value::Int(2)));
//! ```

use std::rc::Rc;

use ferrix_mem::{Symbol, SymbolTable};

use crate::eval::{EvalState, IntoSymbol};
use crate::primops::PrimOpInfo;
use crate::value::{PosIdx, PrimOp, Value, ValueId};

/// Largest number of slots a record can hold.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

/// One record entry. Records order their entries by `name` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub name: Symbol,
    pub value: ValueId,
    pub pos: PosIdx,
}

impl Attr {
    #[must_use]
    pub const fn new(name: Symbol, value: ValueId, pos: PosIdx) -> Self {
        Attr { name, value, pos }
    }
}

/// Fixed-capacity record of attributes.
///
/// The slot array is allocated once with exactly the declared capacity and
/// never grows. Appending past capacity is a bug in the caller and panics.
#[derive(Debug)]
pub struct Bindings {
    attrs: Vec<Attr>,
    capacity: u32,
    sorted: bool,
}

impl Bindings {
    /// The zero-capacity record. The evaluator keeps exactly one of these.
    pub(crate) fn empty() -> Self {
        Bindings {
            attrs: Vec::new(),
            capacity: 0,
            sorted: true,
        }
    }

    pub(crate) fn with_capacity(capacity: u32) -> Self {
        Bindings {
            attrs: Vec::with_capacity(capacity as usize),
            capacity,
            sorted: false,
        }
    }

    /// Appends `attr` in the next free slot.
    ///
    /// # Panics
    ///
    /// Panics if the record is full. Debug builds also reject a name that
    /// is already present; release builds leave that to the final sort.
    pub(crate) fn push(&mut self, attr: Attr) {
        if self.attrs.len() == self.capacity as usize {
            capacity_exceeded(self.capacity);
        }
        debug_assert!(
            self.attrs.iter().all(|existing| existing.name != attr.name),
            "duplicate attribute {} appended to attribute set",
            attr.name
        );
        self.attrs.push(attr);
        self.sorted = false;
    }

    /// Sorts the entries by symbol, making the record searchable.
    ///
    /// Records extended with
    /// [`EvalState::alloc_attr`](crate::EvalState::alloc_attr) after their
    /// first sort must be sorted again before lookups.
    ///
    /// # Panics
    ///
    /// Panics if two entries share a name.
    pub fn sort(&mut self) {
        if let Err(name) = self.sort_checked() {
            panic!("duplicate attribute {name} in attribute set");
        }
    }

    /// Sorts the entries and returns the first duplicated name, if any.
    pub(crate) fn sort_checked(&mut self) -> Result<(), Symbol> {
        if !self.attrs.is_empty() {
            self.attrs.sort_unstable_by_key(|attr| attr.name);
            if let Some(pair) = self.attrs.windows(2).find(|pair| pair[0].name == pair[1].name) {
                return Err(pair[0].name);
            }
        }
        self.sorted = true;
        Ok(())
    }

    pub(crate) fn mark_sorted(&mut self) {
        assert!(
            self.attrs.windows(2).all(|pair| pair[0].name < pair[1].name),
            "attribute set marked sorted but it is not"
        );
        self.sorted = true;
    }

    /// Linear scan for `name` that works in either sort state.
    pub(crate) fn has_slot(&self, name: Symbol) -> bool {
        self.attrs.iter().any(|attr| attr.name == name)
    }

    /// Returns the entry for `name`.
    ///
    /// # Panics
    ///
    /// Panics if the record has not been sorted.
    #[must_use]
    #[track_caller]
    pub fn get(&self, name: Symbol) -> Option<&Attr> {
        self.find(name).map(|index| &self.attrs[index])
    }

    /// Returns the slot index of `name` by binary search.
    ///
    /// # Panics
    ///
    /// Panics if the record has not been sorted.
    #[must_use]
    #[track_caller]
    pub fn find(&self, name: Symbol) -> Option<usize> {
        assert!(self.sorted, "lookup on an unsorted attribute set");
        self.attrs.binary_search_by_key(&name, |attr| attr.name).ok()
    }

    /// Returns true if the record has an entry for `name`.
    #[must_use]
    #[track_caller]
    pub fn contains(&self, name: Symbol) -> bool {
        self.find(name).is_some()
    }

    /// Number of filled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Number of slots declared at allocation.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Iterates over the entries front to back.
    ///
    /// Before the first sort this is insertion order; afterwards it is
    /// increasing symbol order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.attrs.iter()
    }

    /// The filled slots as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Attr] {
        &self.attrs
    }

    /// Returns the entries ordered by the text of their names.
    ///
    /// Symbol order follows interning order, so anything user-visible
    /// (`attrNames`, printing) goes through this instead.
    #[must_use]
    pub fn lexicographic_order<'a>(&'a self, symbols: &SymbolTable) -> Vec<&'a Attr> {
        let mut attrs: Vec<&Attr> = self.attrs.iter().collect();
        attrs.sort_by(|a, b| symbols[a.name].cmp(&symbols[b.name]));
        attrs
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

#[cold]
#[track_caller]
fn capacity_exceeded(capacity: u32) -> ! {
    panic!("attribute set capacity {capacity} exceeded")
}

/// Builds one record: reserve slots, fill them, then [`finish`].
///
/// The builder holds the evaluator mutably for its whole life so it can
/// intern names and allocate value cells. Use [`state_mut`] to evaluate
/// slot contents in between.
///
/// [`finish`]: BindingsBuilder::finish
/// [`state_mut`]: BindingsBuilder::state_mut
pub struct BindingsBuilder<'a> {
    state: &'a mut EvalState,
    bindings: Rc<Bindings>,
}

impl<'a> BindingsBuilder<'a> {
    pub(crate) fn new(state: &'a mut EvalState, bindings: Rc<Bindings>) -> Self {
        BindingsBuilder { state, bindings }
    }

    fn bindings_mut(&mut self) -> &mut Bindings {
        match Rc::get_mut(&mut self.bindings) {
            Some(bindings) => bindings,
            None => panic!("attribute set under construction is shared"),
        }
    }

    /// Appends a prepared attribute.
    ///
    /// # Panics
    ///
    /// Panics if every declared slot is already used.
    #[track_caller]
    pub fn insert(&mut self, attr: Attr) {
        if self.bindings.len() == self.bindings.capacity() {
            capacity_exceeded(self.bindings.capacity);
        }
        self.bindings_mut().push(attr);
    }

    /// Reserves a slot for `name` and returns its value cell to fill.
    ///
    /// # Panics
    ///
    /// Panics if every declared slot is already used.
    #[track_caller]
    pub fn alloc(&mut self, name: impl IntoSymbol, pos: PosIdx) -> &mut Value {
        let name = name.into_symbol(self.state.symbols_mut());
        let value = self.state.alloc_value();
        self.insert(Attr::new(name, value, pos));
        self.state.value_mut(value)
    }

    /// Declares a primop named `name` built from `info`.
    pub fn alloc_primop(&mut self, name: impl IntoSymbol, info: &PrimOpInfo) {
        let primop = PrimOp {
            name: info.name,
            args: info.args,
            arity: info.arity,
            doc: info.doc,
            fun: info.fun,
            is_op: true,
        };
        self.state.count_primop();
        self.alloc(name, PosIdx::NONE).mk_primop(primop);
    }

    /// Returns the evaluator for work between slot declarations.
    pub fn state_mut(&mut self) -> &mut EvalState {
        self.state
    }

    /// Number of slots declared so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bindings.capacity()
    }

    /// Sorts the record and hands it over.
    ///
    /// The record may hold fewer entries than its capacity.
    ///
    /// # Panics
    ///
    /// Panics if two slots were declared with the same name.
    pub fn finish(mut self) -> Rc<Bindings> {
        if !self.bindings.is_sorted() {
            if let Err(name) = self.bindings_mut().sort_checked() {
                panic!(
                    "duplicate attribute '{}' in attribute set",
                    self.state.symbols().resolve(name)
                );
            }
        }
        self.bindings
    }

    /// Hands the record over without sorting.
    ///
    /// The caller guarantees the slots were declared in increasing symbol
    /// order, e.g. when filtering an already sorted record.
    ///
    /// # Panics
    ///
    /// Panics if the slots are out of order or a name repeats.
    pub fn already_sorted(mut self) -> Rc<Bindings> {
        if !self.bindings.is_sorted() {
            self.bindings_mut().mark_sorted();
        }
        self.bindings
    }
}
