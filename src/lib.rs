// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolves a board's configuration options into one immutable profile.
//!
//! Override sources run first and always bind. The board file's declarations
//! then only bind options that are still unbound, and the registry defaults
//! fill in whatever is left. The result is emitted as compile-time constants.

#[macro_use]
extern crate log;

pub mod codegen;
pub mod config;
pub mod error;
pub mod overrides;
pub mod profile;
pub mod registry;
pub mod resolver;
pub mod util;
pub mod value;
