//! `ferrix symbols`: intern words and dump the resulting table.

use std::io::{BufRead, Write};

use ferrix_mem::SymbolTable;

use crate::error::Result;

/// Interns `words` into a fresh table, or every line of `input` when no
/// words are given, then writes one `id<TAB>text` line per symbol.
pub fn run_symbols(
    words: &[String],
    input: impl BufRead,
    show_stats: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut table = SymbolTable::new();

    if words.is_empty() {
        for line in input.lines() {
            table.create(&line?);
        }
    } else {
        for word in words {
            table.create(word);
        }
    }

    for (symbol, text) in table.iter() {
        writeln!(out, "{}\t{}", symbol.as_u32(), text)?;
    }
    writeln!(out, "{} symbols, {} bytes", table.len(), table.total_size())?;

    if show_stats {
        writeln!(out, "chunks: {}", table.chunk_count())?;
    }
    log::debug!("interned {} symbols", table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(words: &[&str], input: &str) -> String {
        let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        let mut out = Vec::new();
        run_symbols(&words, input.as_bytes(), false, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_symbols_from_args() {
        let text = dump(&["foo", "bar", "foo"], "ignored\n");
        assert_eq!(text, "1\tfoo\n2\tbar\n2 symbols, 6 bytes\n");
    }

    #[test]
    fn test_symbols_from_input() {
        let text = dump(&[], "x\nyy\n\nx\n");
        assert_eq!(text, "1\tx\n2\tyy\n3\t\n3 symbols, 3 bytes\n");
    }

    #[test]
    fn test_symbols_empty() {
        assert_eq!(dump(&[], ""), "0 symbols, 0 bytes\n");
    }

    #[test]
    fn test_symbols_stats() {
        let mut out = Vec::new();
        run_symbols(&["a".to_string()], "".as_bytes(), true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("chunks: 1\n"));
    }
}
