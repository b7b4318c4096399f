//! Evaluated values.
//!
//! Values live in the evaluator's [`CellArena`](ferrix_mem::CellArena) and
//! are referred to by [`ValueId`]. Records and lists hold ids, not values,
//! so several records can share one cell.

use std::fmt;
use std::rc::Rc;

use ferrix_mem::CellId;

use crate::attr_set::{Bindings, BindingsBuilder};
use crate::primops::PrimOpFn;

/// Handle to a value cell.
pub type ValueId = CellId;

/// Opaque source-position tag. Only diagnostics look at it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PosIdx(u32);

impl PosIdx {
    /// No position.
    pub const NONE: PosIdx = PosIdx(0);

    #[must_use]
    pub const fn new(raw: u32) -> Self {
        PosIdx(raw)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A native function attached to a value.
#[derive(Debug, Clone)]
pub struct PrimOp {
    pub name: &'static str,
    pub args: &'static [&'static str],
    pub arity: usize,
    pub doc: Option<&'static str>,
    pub fun: PrimOpFn,
    /// Set for primops declared through
    /// [`BindingsBuilder::alloc_primop`](crate::BindingsBuilder::alloc_primop).
    pub is_op: bool,
}

/// An evaluated value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A reserved cell that has not been filled yet.
    #[default]
    Uninit,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<str>),
    Attrs(Rc<Bindings>),
    List(Rc<[ValueId]>),
    PrimOp(Rc<PrimOp>),
}

impl Value {
    /// Returns the language-level type name, as reported by `typeOf`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Uninit => "uninitialised",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Attrs(_) => "set",
            Value::List(_) => "list",
            Value::PrimOp(_) => "lambda",
        }
    }

    /// Finishes `builder` and makes this value the resulting record.
    pub fn mk_attrs(&mut self, builder: BindingsBuilder<'_>) -> &mut Self {
        *self = Value::Attrs(builder.finish());
        self
    }

    pub fn mk_string(&mut self, text: &str) -> &mut Self {
        *self = Value::String(Rc::from(text));
        self
    }

    pub fn mk_primop(&mut self, primop: PrimOp) -> &mut Self {
        *self = Value::PrimOp(Rc::new(primop));
        self
    }

    /// Returns the record if this is an attribute set.
    #[must_use]
    pub fn as_attrs(&self) -> Option<&Rc<Bindings>> {
        match self {
            Value::Attrs(bindings) => Some(bindings),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Rc<[ValueId]>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_attrs(&self) -> bool {
        matches!(self, Value::Attrs(_))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(Rc::from(text))
    }
}

impl fmt::Display for Value {
    /// Shallow rendering for diagnostics; records and lists are summarised.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uninit => f.write_str("<uninitialised>"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(text) => write!(f, "{text:?}"),
            Value::Attrs(bindings) => write!(f, "{{ {} attributes }}", bindings.len()),
            Value::List(items) => write!(f, "[ {} items ]", items.len()),
            Value::PrimOp(op) => write!(f, "<primop {}>", op.name),
        }
    }
}
