//! Well-known attribute names, interned once per table.
//!
//! The evaluator compares against these names constantly (`outPath`,
//! `__functor`, ...), so they are interned when the evaluator is built and
//! kept as plain [`Symbol`] fields.

use crate::symbol::Symbol;
use crate::table::SymbolTable;

macro_rules! static_symbols {
    ($( $(#[$doc:meta])* $field:ident => $text:literal, )*) => {
        /// Symbols for names the evaluator looks up by identity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct StaticSymbols {
            $( $(#[$doc])* pub $field: Symbol, )*
        }

        impl StaticSymbols {
            /// Every pre-interned name, in interning order.
            pub const NAMES: &'static [&'static str] = &[$($text),*];

            /// Interns the well-known names into `table`.
            ///
            /// On an empty table the names take ids `1..=NAMES.len()` in
            /// declaration order. On a table that already holds text they go
            /// through [`SymbolTable::create`] and keep any existing ids.
            pub fn new(table: &mut SymbolTable) -> Self {
                if table.is_empty() {
                    log::debug!("interning {} static symbols", Self::NAMES.len());
                    StaticSymbols {
                        $( $field: table.insert($text), )*
                    }
                } else {
                    StaticSymbols {
                        $( $field: table.create($text), )*
                    }
                }
            }
        }
    };
}

static_symbols! {
    out_path => "outPath",
    drv_path => "drvPath",
    name => "name",
    type_ => "type",
    value => "value",
    meta => "meta",
    system => "system",
    outputs => "outputs",
    output_name => "outputName",
    description => "description",
    /// Makes an attribute set callable.
    functor => "__functor",
    /// Custom string coercion hook.
    to_string => "__toString",
    /// Type tag used by library code (`_type = "option"`).
    underscore_type => "_type",
    overrides => "__overrides",
    ignore_nulls => "__ignoreNulls",
    file => "file",
    line => "line",
    column => "column",
    args => "args",
    body => "body",
    self_ => "self",
    prefix => "prefix",
    path => "path",
    key => "key",
    recurse_for_derivations => "recurseForDerivations",
    /// The empty attribute name.
    epsilon => "",
    /// Pseudo name for variables bound by `with`.
    with => "<with>",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_table_ids_follow_declaration_order() {
        let mut table = SymbolTable::new();
        let symbols = StaticSymbols::new(&mut table);

        assert_eq!(table.len(), StaticSymbols::NAMES.len());
        assert_eq!(symbols.out_path.as_u32(), 1);
        assert_eq!(table.resolve(symbols.functor), "__functor");
        assert_eq!(table.resolve(symbols.epsilon), "");
        assert_eq!(table.resolve(symbols.with), "<with>");

        for (id, &name) in (1u32..).zip(StaticSymbols::NAMES) {
            assert_eq!(table.lookup(name).map(Symbol::as_u32), Some(id));
        }
    }

    #[test]
    fn test_populated_table_keeps_existing_ids() {
        let mut table = SymbolTable::new();
        let meta = table.create("meta");
        let user = table.create("myAttr");

        let symbols = StaticSymbols::new(&mut table);

        assert_eq!(symbols.meta, meta);
        assert_eq!(meta.as_u32(), 1);
        assert_eq!(table.resolve(user), "myAttr");
        assert_eq!(table.len(), StaticSymbols::NAMES.len() + 1);
    }

    #[test]
    fn test_reinterning_is_stable() {
        let mut table = SymbolTable::new();
        let first = StaticSymbols::new(&mut table);
        let second = StaticSymbols::new(&mut table);

        assert_eq!(first, second);
        assert_eq!(table.len(), StaticSymbols::NAMES.len());
    }
}
