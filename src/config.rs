// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_yaml::Value as Yaml;

use crate::error::{ResolveError, Result};
use crate::registry::OptionKind;
use crate::value::yaml_repr;

#[derive(Debug, Deserialize)]
pub struct OptionConfig {
    pub name: String,
    pub kind: OptionKind,
    pub default: Option<Yaml>,
    pub description: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    pub prefix: Option<String>,
    pub options: Vec<OptionConfig>,
}

/// A board configuration unit. Declarations are applied in file order.
#[derive(Debug, Deserialize)]
pub struct BoardConfig {
    pub board: String,
    #[serde(default)]
    pub options: Declarations,
}

/// Values supplied ahead of the board file, e.g. by the board-selection script.
#[derive(Debug, Deserialize, Default)]
pub struct OverridesConfig {
    #[serde(default)]
    pub options: Declarations,
}

/// The `NAME: value` pairs of an `options` mapping, in file order.
/// A repeated key is kept as a separate declaration rather than replacing
/// the earlier one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Declarations(Vec<(Yaml, Yaml)>);

impl Declarations {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct DeclarationsVisitor;

impl<'de> Visitor<'de> for DeclarationsVisitor {
    type Value = Declarations;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of option names to values")
    }

    fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Declarations, E> {
        Ok(Declarations::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Declarations, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<Yaml, Yaml>()? {
            entries.push(entry);
        }
        Ok(Declarations(entries))
    }
}

impl<'de> Deserialize<'de> for Declarations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(DeclarationsVisitor)
    }
}

/// Iterates the declarations in file order. Non-string keys are reported
/// as invalid option names.
pub fn declarations(options: &Declarations) -> impl Iterator<Item=(Result<&str>, &Yaml)> {
    options.0.iter().map(|(k, v)| {
        let name = k.as_str()
            .ok_or_else(|| ResolveError::InvalidOptionName(yaml_repr(k)));
        (name, v)
    })
}
