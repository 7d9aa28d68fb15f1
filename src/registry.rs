// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;

use regex::Regex;
use serde::Deserialize;

use crate::config::{RegistryConfig, OptionConfig};
use crate::error::{ResolveError, Result};
use crate::value::Value;

lazy_static::lazy_static! {
    pub static ref OPTION_NAME: Regex = Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap();
    static ref MACRO_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref BUILTIN: Registry = builtin_registry()
        .expect("built-in registry must be valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[serde(alias = "str")]
    String,
    #[serde(rename = "pin", alias = "integer_pin")]
    IntegerPin,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(rename = "count", alias = "integer_count")]
    IntegerCount,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OptionKind::String => "string",
            OptionKind::IntegerPin => "pin",
            OptionKind::Boolean => "boolean",
            OptionKind::IntegerCount => "count",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    pub name: String,
    pub kind: OptionKind,
    /// None means the option is mandatory
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Emitted macro name, when it doesn't follow the registry prefix
    pub symbol: Option<String>,
}

impl OptionDef {
    pub fn new(name: &str, kind: OptionKind, default: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default,
            description: None,
            symbol: None,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn is_mandatory(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, PartialEq)]
pub enum DefaultValue<'a> {
    Value(&'a Value),
    NoDefault,
}

/// The closed set of options a board may declare.
#[derive(Debug)]
pub struct Registry {
    prefix: String,
    options: Vec<OptionDef>,
    // name -> index in options
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new(prefix: &str, options: Vec<OptionDef>) -> Result<Self> {
        let mut index = HashMap::new();
        // every emitted macro must be a distinct C identifier
        let mut symbols = HashSet::new();

        for (i, option) in options.iter().enumerate() {
            if !OPTION_NAME.is_match(&option.name) {
                return Err(ResolveError::InvalidOptionName(option.name.clone()));
            }
            if let Some(ref default) = option.default {
                if default.kind() != option.kind {
                    return Err(ResolveError::invalid_value(&option.name, option.kind, default));
                }
            }
            if index.insert(option.name.clone(), i).is_some() {
                return Err(ResolveError::DuplicateOption(option.name.clone()));
            }

            let symbol = symbol_of(prefix, option);
            if !MACRO_NAME.is_match(&symbol) {
                return Err(ResolveError::InvalidOptionName(symbol));
            }
            if !symbols.insert(symbol.clone()) {
                return Err(ResolveError::DuplicateOption(symbol));
            }
        }

        debug!("Registry prefix={} options={}", prefix, options.len());

        Ok(Self { prefix: prefix.to_string(), options, index })
    }

    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn lookup(&self, name: &str) -> Result<&OptionDef> {
        self.index.get(name)
            .map(|&i| &self.options[i])
            .ok_or_else(|| ResolveError::UnknownOption(name.to_string()))
    }

    pub fn default_for(&self, name: &str) -> Result<DefaultValue> {
        let option = self.lookup(name)?;
        Ok(match option.default {
            Some(ref v) => DefaultValue::Value(v),
            None => DefaultValue::NoDefault,
        })
    }

    pub fn symbol(&self, option: &OptionDef) -> String {
        symbol_of(&self.prefix, option)
    }

    /// Options in declaration order
    pub fn iter(&self) -> impl Iterator<Item=&OptionDef> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }
}

fn symbol_of(prefix: &str, option: &OptionDef) -> String {
    option.symbol.clone()
        .unwrap_or_else(|| format!("{}{}", prefix, option.name))
}

impl TryFrom<OptionConfig> for OptionDef {
    type Error = ResolveError;

    fn try_from(config: OptionConfig) -> Result<Self> {
        let default = config.default.as_ref()
            .map(|yaml| Value::from_yaml(&config.name, config.kind, yaml))
            .transpose()?;

        Ok(Self {
            name: config.name,
            kind: config.kind,
            default,
            description: config.description,
            symbol: config.symbol,
        })
    }
}

impl TryFrom<RegistryConfig> for Registry {
    type Error = ResolveError;

    fn try_from(config: RegistryConfig) -> Result<Self> {
        let options = config.options.into_iter()
            .map(|config| config.try_into())
            .collect::<Result<_>>()?;

        Registry::new(&config.prefix.unwrap_or_default(), options)
    }
}

fn builtin_registry() -> Result<Registry> {
    let options = vec![
        OptionDef::new("BOARD_NAME", OptionKind::String, None)
            .describe("Human readable board name"),
        OptionDef::new("MCU_NAME", OptionKind::String, None)
            .describe("Compiled variant: CPU and enabled subsystems"),
        OptionDef::new("ENABLE_UART_REPL", OptionKind::Boolean, Some(Value::Bool(false)))
            .describe("UART REPL for modules with an external USB-UART and no native USB"),
        OptionDef::new("ENABLE_USBDEVICE", OptionKind::Boolean, Some(Value::Bool(false)))
            .describe("Native USB device console"),
        OptionDef::new("UART_REPL_BAUD", OptionKind::IntegerCount, Some(Value::Count(115200)))
            .describe("Baudrate of the UART REPL"),
        OptionDef::new("I2C0_SCL", OptionKind::IntegerPin, None)
            .describe("I2C bus 0 clock line"),
        OptionDef::new("I2C0_SDA", OptionKind::IntegerPin, None)
            .describe("I2C bus 0 data line"),
        OptionDef::new("I2C1_SCL", OptionKind::IntegerPin, Some(Value::Pin(18)))
            .describe("I2C bus 1 clock line"),
        OptionDef::new("I2C1_SDA", OptionKind::IntegerPin, Some(Value::Pin(19)))
            .describe("I2C bus 1 data line"),
        OptionDef::new("MACHINE_DAC", OptionKind::Boolean, Some(Value::Bool(true)))
            .describe("machine.DAC support")
            .with_symbol("MICROPY_PY_MACHINE_DAC"),
    ];

    Registry::new("MICROPY_HW_", options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let registry = Registry::builtin();
        assert_eq!(registry.prefix(), "MICROPY_HW_");
        assert!(registry.lookup("BOARD_NAME").is_ok());
        assert!(registry.lookup("MCU_NAME").unwrap().is_mandatory());
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let registry = Registry::builtin();
        let first = registry.lookup("I2C0_SCL").unwrap().clone();
        let _ = registry.lookup("BOARD_NAME").unwrap();
        let _ = registry.lookup("NOT_A_REAL_OPTION");
        for _ in 0..3 {
            assert_eq!(registry.lookup("I2C0_SCL").unwrap(), &first);
        }
    }

    #[test]
    fn test_unknown_option() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.lookup("I2C0_SLC").unwrap_err(),
            ResolveError::UnknownOption("I2C0_SLC".to_string()),
        );
        assert!(registry.default_for("I2C0_SLC").is_err());
    }

    #[test]
    fn test_default_for() {
        let registry = Registry::builtin();
        assert_eq!(registry.default_for("ENABLE_UART_REPL").unwrap(), DefaultValue::Value(&Value::Bool(false)));
        assert_eq!(registry.default_for("BOARD_NAME").unwrap(), DefaultValue::NoDefault);
    }

    #[test]
    fn test_symbol() {
        let registry = Registry::builtin();
        let scl = registry.lookup("I2C0_SCL").unwrap();
        assert_eq!(registry.symbol(scl), "MICROPY_HW_I2C0_SCL");
        let dac = registry.lookup("MACHINE_DAC").unwrap();
        assert_eq!(registry.symbol(dac), "MICROPY_PY_MACHINE_DAC");
    }

    #[test]
    fn test_duplicate_option() {
        let options = vec![
            OptionDef::new("BOARD_NAME", OptionKind::String, None),
            OptionDef::new("BOARD_NAME", OptionKind::String, None),
        ];
        assert_eq!(
            Registry::new("", options).unwrap_err(),
            ResolveError::DuplicateOption("BOARD_NAME".to_string()),
        );
    }

    #[test]
    fn test_invalid_name_and_default() {
        let options = vec![OptionDef::new("board_name", OptionKind::String, None)];
        assert!(matches!(Registry::new("", options), Err(ResolveError::InvalidOptionName(_))));

        let options = vec![OptionDef::new("I2C0_SCL", OptionKind::IntegerPin, Some(Value::Bool(true)))];
        assert!(matches!(Registry::new("", options), Err(ResolveError::InvalidValue { .. })));
    }

    #[test]
    fn test_symbol_collision() {
        let options = vec![
            OptionDef::new("A", OptionKind::IntegerCount, Some(Value::Count(1)))
                .with_symbol("MICROPY_HW_B"),
            OptionDef::new("B", OptionKind::IntegerCount, Some(Value::Count(2))),
        ];
        assert_eq!(
            Registry::new("MICROPY_HW_", options).unwrap_err(),
            ResolveError::DuplicateOption("MICROPY_HW_B".to_string()),
        );
    }

    #[test]
    fn test_invalid_symbol() {
        let options = vec![
            OptionDef::new("A", OptionKind::Boolean, None).with_symbol("NOT A MACRO"),
        ];
        assert_eq!(
            Registry::new("MICROPY_HW_", options).unwrap_err(),
            ResolveError::InvalidOptionName("NOT A MACRO".to_string()),
        );

        // the prefix is part of the emitted name
        let options = vec![OptionDef::new("A", OptionKind::Boolean, None)];
        assert!(matches!(Registry::new("1BAD_", options), Err(ResolveError::InvalidOptionName(_))));
        let options = vec![OptionDef::new("A", OptionKind::Boolean, None)];
        assert!(Registry::new("", options).is_ok());
    }

    #[test]
    fn test_from_config() {
        let config: RegistryConfig = serde_yaml::from_str(r#"
prefix: MICROPY_HW_
options:
  - name: BOARD_NAME
    kind: string
  - name: I2C0_SCL
    kind: pin
  - name: ENABLE_UART_REPL
    kind: boolean
    default: false
"#).unwrap();

        let registry = Registry::try_from(config).unwrap();
        assert_eq!(registry.len(), 3);
        let names: Vec<_> = registry.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["BOARD_NAME", "I2C0_SCL", "ENABLE_UART_REPL"]);
        assert_eq!(registry.default_for("ENABLE_UART_REPL").unwrap(), DefaultValue::Value(&Value::Bool(false)));
        assert_eq!(registry.default_for("I2C0_SCL").unwrap(), DefaultValue::NoDefault);
    }

    #[test]
    fn test_shipped_registry_matches_builtin() {
        let config: RegistryConfig = serde_yaml::from_str(
            include_str!("../boards/registry.yaml")).unwrap();
        let shipped = Registry::try_from(config).unwrap();
        let builtin = Registry::builtin();

        assert_eq!(shipped.prefix(), builtin.prefix());
        assert!(shipped.iter().eq(builtin.iter()));
    }
}
