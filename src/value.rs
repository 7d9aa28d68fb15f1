// SPDX-License-Identifier: GPL-3.0-or-later

use serde::Serialize;
use serde_yaml::Value as Yaml;

use crate::error::{ResolveError, Result};
use crate::registry::OptionKind;

/// A value bound to an option. There is one variant per `OptionKind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Pin(u32),
    Bool(bool),
    Count(u64),
}

impl Value {
    pub fn kind(&self) -> OptionKind {
        match self {
            Value::Str(_) => OptionKind::String,
            Value::Pin(_) => OptionKind::IntegerPin,
            Value::Bool(_) => OptionKind::Boolean,
            Value::Count(_) => OptionKind::IntegerCount,
        }
    }

    /// Parses a value given as text, as found on the command line or in the environment.
    pub fn parse(name: &str, kind: OptionKind, text: &str) -> Result<Self> {
        let err = || ResolveError::invalid_value(name, kind, format!("'{}'", text));
        let trimmed = text.trim();

        match kind {
            OptionKind::String => {
                let s = text.strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(text);
                Ok(Value::Str(s.to_string()))
            }
            OptionKind::IntegerPin => {
                // board headers write pins as "(47)"
                let s = trimmed.strip_prefix('(')
                    .and_then(|s| s.strip_suffix(')'))
                    .unwrap_or(trimmed);
                s.trim().parse().map(Value::Pin).map_err(|_| err())
            }
            OptionKind::Boolean => {
                let s = trimmed.strip_prefix('(')
                    .and_then(|s| s.strip_suffix(')'))
                    .unwrap_or(trimmed)
                    .trim()
                    .to_ascii_lowercase();
                match s.as_str() {
                    "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
                    "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
                    _ => Err(err()),
                }
            }
            OptionKind::IntegerCount => {
                let v = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => trimmed.parse(),
                };
                v.map(Value::Count).map_err(|_| err())
            }
        }
    }

    /// Converts a YAML scalar from a board, registry or overrides file.
    pub fn from_yaml(name: &str, kind: OptionKind, yaml: &Yaml) -> Result<Self> {
        let err = || ResolveError::invalid_value(name, kind, yaml_repr(yaml));

        match (kind, yaml) {
            (OptionKind::String, Yaml::String(s)) => Ok(Value::Str(s.clone())),
            (OptionKind::IntegerPin, Yaml::Number(n)) => {
                n.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .map(Value::Pin)
                    .ok_or_else(err)
            }
            (OptionKind::Boolean, Yaml::Bool(b)) => Ok(Value::Bool(*b)),
            (OptionKind::Boolean, Yaml::Number(n)) => {
                match n.as_u64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => Err(err()),
                }
            }
            (OptionKind::IntegerCount, Yaml::Number(n)) => {
                n.as_u64().map(Value::Count).ok_or_else(err)
            }
            // Accept the textual forms too, e.g. `UART_REPL_BAUD: "0x1c200"`
            (OptionKind::IntegerPin, Yaml::String(s))
            | (OptionKind::Boolean, Yaml::String(s))
            | (OptionKind::IntegerCount, Yaml::String(s)) => {
                Self::parse(name, kind, s)
            }
            _ => Err(err()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pin(&self) -> Option<u32> {
        match self {
            Value::Pin(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            Value::Count(c) => Some(*c),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Pin(p) => write!(f, "{}", p),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Count(c) => write!(f, "{}", c),
        }
    }
}

pub fn yaml_repr(yaml: &Yaml) -> String {
    match yaml {
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::String(s) => format!("{:?}", s),
        Yaml::Sequence(_) => "a sequence".to_string(),
        Yaml::Mapping(_) => "a mapping".to_string(),
    }
}
