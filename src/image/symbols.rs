// Copyright (C) 2025, 2026 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Symbol table

use std::sync::Arc;

use elf::ElfBytes;
use elf::abi;
use elf::endian::AnyEndian;

use super::{Error, Label};

/// A named address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: Arc<str>,
    pub address: u64,
    /// Size in bytes, `0` if unknown
    pub size: u64,
    /// Whether the symbol denotes a function
    pub function: bool,
}

impl Symbol {
    /// Create a new symbol for a function
    pub fn function(name: &str, address: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            address,
            size,
            function: true,
        }
    }

    /// Create a new symbol for anything but a function
    pub fn object(name: &str, address: u64, size: u64) -> Self {
        Self {
            function: false,
            ..Self::function(name, address, size)
        }
    }
}

/// Symbols ordered for address lookup
#[derive(Clone, Debug, Default)]
pub(super) struct Table {
    symbols: Vec<Symbol>,
    /// Function address ranges, ordered by start address
    functions: Vec<(u64, u64, Arc<str>)>,
}

impl Table {
    pub fn new(mut symbols: Vec<Symbol>) -> Self {
        // Functions sort after other symbols at the same address and are thus
        // preferred as labels.
        symbols.sort_by(|a, b| (a.address, a.function).cmp(&(b.address, b.function)));

        let starts: Vec<_> = symbols.iter().filter(|s| s.function).collect();
        let functions = starts
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let end = if s.size != 0 {
                    s.address.saturating_add(s.size)
                } else {
                    starts[i + 1..]
                        .iter()
                        .map(|n| n.address)
                        .find(|a| *a > s.address)
                        .unwrap_or(u64::MAX)
                };
                (s.address, end, s.name.clone())
            })
            .collect();

        Self { symbols, functions }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Retrieve the closest symbol at or before the address
    pub fn label(&self, address: u64) -> Option<Label> {
        let idx = self.symbols.partition_point(|s| s.address <= address);
        idx.checked_sub(1).map(|i| {
            let symbol = &self.symbols[i];
            Label {
                name: symbol.name.clone(),
                offset: address - symbol.address,
            }
        })
    }

    /// Retrieve the name of the function enclosing the address
    pub fn function(&self, address: u64) -> Option<Arc<str>> {
        let idx = self.functions.partition_point(|f| f.0 <= address);
        self.functions[..idx]
            .iter()
            .rev()
            .find(|(_, end, _)| address < *end)
            .map(|(_, _, name)| name.clone())
    }
}

/// Extract relevant symbols from an ELF file's symbol table
///
/// Undefined symbols, section and file symbols as well as mapping symbols
/// such as `$x` are omitted.
pub(super) fn from_elf(file: &ElfBytes<'_, AnyEndian>) -> Result<Vec<Symbol>, Error> {
    let Some((table, names)) = file.symbol_table()? else {
        return Ok(Default::default());
    };

    let mut symbols = Vec::new();
    for symbol in table.iter() {
        let kind = symbol.st_symtype();
        if symbol.is_undefined() || !matches!(kind, abi::STT_FUNC | abi::STT_OBJECT | abi::STT_NOTYPE)
        {
            continue;
        }
        let name = names.get(symbol.st_name as usize)?;
        if name.is_empty() || name.starts_with('$') || name.starts_with(".L") {
            continue;
        }
        symbols.push(Symbol {
            name: name.into(),
            address: symbol.st_value,
            size: symbol.st_size,
            function: kind == abi::STT_FUNC,
        });
    }
    Ok(symbols)
}
