// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_yaml::Value as Yaml;

use crate::config::{self, BoardConfig};
use crate::error::{ResolveError, Result};
use crate::profile::{BoardProfile, Entry};
use crate::registry::Registry;
use crate::value::Value;

// Number of set_if_absent/force_set calls processed, shown in the log prefix
pub static NUM_DECLARATIONS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Label of the override source, e.g. "command line"
    Override(String),
    Board,
    Default,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Override(source) => write!(f, "override ({})", source),
            Origin::Board => write!(f, "board"),
            Origin::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub value: Value,
    pub origin: Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Empty,
    Accumulating,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Bound,
    /// Another source bound the option first
    Shadowed,
}

/// A board declaration that lost to an earlier binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub name: String,
    pub attempted: Value,
    pub winner: Binding,
}

pub struct Resolver<'a> {
    registry: &'a Registry,
    board: Option<String>,
    bindings: HashMap<String, Binding>,
    shadowed: Vec<Shadow>,
    state: State,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            board: None,
            bindings: HashMap::new(),
            shadowed: vec![],
            state: State::Empty,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn shadowed(&self) -> &[Shadow] {
        &self.shadowed
    }

    fn check_value(&self, name: &str, value: &Value) -> Result<()> {
        if self.state == State::Finalized {
            error!("Attempt to bind {} after finalization", name);
            return Err(ResolveError::AlreadyFinalized);
        }

        let option = self.registry.lookup(name)?;
        if option.kind != value.kind() {
            return Err(ResolveError::invalid_value(name, option.kind, value));
        }
        Ok(())
    }

    /// Binds `value` unless `name` is already bound. This is what every board
    /// declaration does, so whoever runs first wins.
    pub fn set_if_absent(&mut self, name: &str, value: Value) -> Result<Bound> {
        self.check_value(name, &value)?;
        NUM_DECLARATIONS.fetch_add(1, Ordering::Relaxed);
        self.state = State::Accumulating;

        if let Some(winner) = self.bindings.get(name) {
            debug!("{} = {} shadowed by {} from {}", name, value, winner.value, winner.origin);
            self.shadowed.push(Shadow {
                name: name.to_string(),
                attempted: value,
                winner: winner.clone(),
            });
            return Ok(Bound::Shadowed);
        }

        trace!("{} = {} (board)", name, value);
        self.bindings.insert(name.to_string(), Binding { value, origin: Origin::Board });
        Ok(Bound::Bound)
    }

    /// Always binds. Only override sources call this, before the board file runs.
    pub fn force_set(&mut self, name: &str, value: Value, source: &str) -> Result<()> {
        self.check_value(name, &value)?;
        NUM_DECLARATIONS.fetch_add(1, Ordering::Relaxed);
        self.state = State::Accumulating;

        let binding = Binding { value, origin: Origin::Override(source.to_string()) };
        trace!("{} = {} ({})", name, binding.value, binding.origin);

        if let Some(old) = self.bindings.insert(name.to_string(), binding) {
            debug!("{} = {} from {} replaced by {}", name, old.value, old.origin, source);
        }
        Ok(())
    }

    /// Converts a YAML scalar to the option's kind, then `set_if_absent`.
    pub fn declare(&mut self, name: &str, yaml: &Yaml) -> Result<Bound> {
        let kind = self.registry.lookup(name)?.kind;
        let value = Value::from_yaml(name, kind, yaml)?;
        self.set_if_absent(name, value)
    }

    /// Runs all declarations of a board file, in file order.
    pub fn declare_board(&mut self, board: &BoardConfig) -> Result<()> {
        if self.state == State::Finalized {
            return Err(ResolveError::AlreadyFinalized);
        }

        info!("Resolving board={} declarations={}", board.board, board.options.len());
        self.board = Some(board.board.clone());

        for (name, yaml) in config::declarations(&board.options) {
            self.declare(name?, yaml)?;
        }
        Ok(())
    }

    /// Fills unbound options with their registry defaults and hands out the
    /// immutable profile. Fails if a mandatory option was never set.
    pub fn finalize(&mut self) -> Result<BoardProfile> {
        if self.state == State::Finalized {
            error!("Board profile finalized twice");
            return Err(ResolveError::AlreadyFinalized);
        }

        let missing: Vec<&str> = self.registry.iter()
            .filter(|o| o.is_mandatory() && !self.bindings.contains_key(&o.name))
            .map(|o| o.name.as_str())
            .collect();

        for name in &missing {
            error!("Mandatory option {} is not set", name);
        }
        if let Some(name) = missing.first() {
            return Err(ResolveError::MissingMandatoryOption(name.to_string()));
        }

        let mut entries = Vec::with_capacity(self.registry.len());
        for option in self.registry.iter() {
            let binding = match (self.bindings.remove(&option.name), &option.default) {
                (Some(binding), _) => binding,
                (None, Some(default)) => {
                    debug!("{} = {} (default)", option.name, default);
                    Binding { value: default.clone(), origin: Origin::Default }
                }
                (None, None) => unreachable!("mandatory options are checked above"),
            };
            entries.push(Entry {
                symbol: self.registry.symbol(option),
                def: option.clone(),
                binding,
            });
        }

        self.state = State::Finalized;
        let board = self.board.clone().unwrap_or_default();
        info!("Resolved board={} options={} shadowed={}", board, entries.len(), self.shadowed.len());

        Ok(BoardProfile::new(board, entries))
    }
}
