// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use crate::error::{ResolveError, Result};
use crate::registry::{OptionDef, OptionKind};
use crate::resolver::Binding;
use crate::value::Value;

#[derive(Debug)]
pub struct Entry {
    pub def: OptionDef,
    pub symbol: String,
    pub binding: Binding,
}

/// The fully resolved configuration of one board. Only the resolver builds
/// one, and it has no way to change afterwards.
#[derive(Debug)]
pub struct BoardProfile {
    board: String,
    // registry order
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl BoardProfile {
    pub(crate) fn new(board: String, entries: Vec<Entry>) -> Self {
        let index = entries.iter().enumerate()
            .map(|(i, e)| (e.def.name.clone(), i))
            .collect();
        Self { board, entries, index }
    }

    /// Board identifier, the `board` key of the board file
    pub fn board(&self) -> &str {
        &self.board
    }

    pub fn board_name(&self) -> Option<&str> {
        self.get("BOARD_NAME").ok().and_then(Value::as_str)
    }

    pub fn mcu_name(&self) -> Option<&str> {
        self.get("MCU_NAME").ok().and_then(Value::as_str)
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        self.index.get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ResolveError::UnknownOption(name.to_string()))
    }

    pub fn binding(&self, name: &str) -> Result<&Binding> {
        self.entry(name).map(|e| &e.binding)
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.binding(name).map(|b| &b.value)
    }

    fn typed<'a, T>(&'a self, name: &str, kind: OptionKind, f: impl FnOnce(&'a Value) -> Option<T>) -> Result<T> {
        let value = self.get(name)?;
        f(value).ok_or_else(|| ResolveError::invalid_value(name, kind, value))
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        self.typed(name, OptionKind::String, Value::as_str)
    }

    pub fn pin(&self, name: &str) -> Result<u32> {
        self.typed(name, OptionKind::IntegerPin, Value::as_pin)
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        self.typed(name, OptionKind::Boolean, Value::as_bool)
    }

    pub fn count(&self, name: &str) -> Result<u64> {
        self.typed(name, OptionKind::IntegerCount, Value::as_count)
    }

    pub fn iter(&self) -> impl Iterator<Item=&Entry> {
        self.entries.iter()
    }
}
