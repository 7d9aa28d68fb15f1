// SPDX-License-Identifier: GPL-3.0-or-later

use regex::Regex;

use crate::config::{self, OverridesConfig};
use crate::error::{ResolveError, Result};
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::value::Value;

lazy_static::lazy_static! {
    static ref DEFINE: Regex = Regex::new(r"^\s*([^=\s]+)\s*=(.*)$").unwrap();
}

pub const SOURCE_ENV: &str = "environment";
pub const SOURCE_CMDLINE: &str = "command line";

#[derive(Debug, PartialEq)]
pub struct Override {
    pub name: String,
    pub value: Value,
    pub source: String,
}

/// Values to force before the board file runs. They are applied in the order
/// they were collected, so later sources replace earlier ones.
#[derive(Debug)]
pub struct Overrides<'a> {
    registry: &'a Registry,
    entries: Vec<Override>,
}

impl<'a> Overrides<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry, entries: vec![] }
    }

    fn push(&mut self, name: &str, value: Value, source: &str) {
        debug!("Override {}={} from {}", name, value, source);
        self.entries.push(Override { name: name.to_string(), value, source: source.to_string() });
    }

    /// `<prefix><NAME>=value` variables. The environment is shared with the
    /// rest of the build, so names the registry doesn't know are skipped.
    pub fn env(&mut self, prefix: &str, vars: impl IntoIterator<Item=(String, String)>) -> Result<&mut Self> {
        let registry = self.registry;
        let mut vars: Vec<_> = vars.into_iter()
            .filter_map(|(k, v)| k.strip_prefix(prefix).map(|name| (name.to_string(), v)))
            .collect();
        // env order is unspecified
        vars.sort();

        for (name, text) in vars {
            match registry.lookup(&name) {
                Ok(option) => {
                    let value = Value::parse(&name, option.kind, &text)?;
                    self.push(&name, value, SOURCE_ENV);
                }
                Err(_) => debug!("Ignoring {}{}: not a registry option", prefix, name),
            }
        }
        Ok(self)
    }

    pub fn file(&mut self, config: &OverridesConfig, label: &str) -> Result<&mut Self> {
        let registry = self.registry;
        for (name, yaml) in config::declarations(&config.options) {
            let name = name?;
            let option = registry.lookup(name)?;
            let value = Value::from_yaml(name, option.kind, yaml)?;
            self.push(name, value, label);
        }
        Ok(self)
    }

    /// `NAME=VALUE` pairs given with -D
    pub fn defines(&mut self, defines: &[String]) -> Result<&mut Self> {
        let registry = self.registry;
        for define in defines {
            let caps = DEFINE.captures(define)
                .ok_or_else(|| ResolveError::InvalidOptionName(define.clone()))?;
            let name = &caps[1];
            let option = registry.lookup(name)?;
            let value = Value::parse(name, option.kind, caps[2].trim_start())?;
            self.push(name, value, SOURCE_CMDLINE);
        }
        Ok(self)
    }

    pub fn entries(&self) -> &[Override] {
        &self.entries
    }

    pub fn apply(&self, resolver: &mut Resolver) -> Result<()> {
        for o in &self.entries {
            resolver.force_set(&o.name, o.value.clone(), &o.source)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(v: &[(&str, &str)]) -> Vec<(String, String)> {
        v.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_env() {
        let registry = Registry::builtin();
        let mut overrides = Overrides::new(registry);
        overrides.env("BOARD_", vars(&[
            ("PATH", "/usr/bin"),
            ("BOARD_MCU_NAME", "ESP32S3_REV2"),
            ("BOARD_NOT_AN_OPTION", "1"),
            ("BOARD_ENABLE_UART_REPL", "0"),
        ])).unwrap();

        assert_eq!(overrides.entries(), &[
            Override { name: "ENABLE_UART_REPL".to_string(), value: Value::Bool(false), source: SOURCE_ENV.to_string() },
            Override { name: "MCU_NAME".to_string(), value: Value::Str("ESP32S3_REV2".to_string()), source: SOURCE_ENV.to_string() },
        ]);
    }

    #[test]
    fn test_env_bad_value() {
        let mut overrides = Overrides::new(Registry::builtin());
        let err = overrides.env("BOARD_", vars(&[("BOARD_I2C0_SCL", "scl")])).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidValue { .. }));
    }

    #[test]
    fn test_defines() {
        let mut overrides = Overrides::new(Registry::builtin());
        overrides.defines(&[
            "BOARD_NAME=\"Override Name\"".to_string(),
            "I2C0_SCL = 5".to_string(),
        ]).unwrap();

        let values: Vec<_> = overrides.entries().iter().map(|o| o.value.clone()).collect();
        assert_eq!(values, [Value::Str("Override Name".to_string()), Value::Pin(5)]);
    }

    #[test]
    fn test_defines_errors() {
        let mut overrides = Overrides::new(Registry::builtin());
        assert_eq!(
            overrides.defines(&["BOARD_NAME".to_string()]).unwrap_err(),
            ResolveError::InvalidOptionName("BOARD_NAME".to_string()),
        );
        assert_eq!(
            overrides.defines(&["NOT_A_REAL_OPTION=1".to_string()]).unwrap_err(),
            ResolveError::UnknownOption("NOT_A_REAL_OPTION".to_string()),
        );
    }

    #[test]
    fn test_file_unknown_is_fatal() {
        let config: OverridesConfig = serde_yaml::from_str("options:\n  I2C9_SCL: 4\n").unwrap();
        let mut overrides = Overrides::new(Registry::builtin());
        assert_eq!(
            overrides.file(&config, "overrides.yaml").unwrap_err(),
            ResolveError::UnknownOption("I2C9_SCL".to_string()),
        );
    }

    #[test]
    fn test_file_repeated_key_later_wins() {
        let config: OverridesConfig = serde_yaml::from_str("options:\n  I2C0_SCL: 4\n  I2C0_SCL: 6\n").unwrap();
        let registry = Registry::builtin();
        let mut overrides = Overrides::new(registry);
        overrides.file(&config, "overrides.yaml").unwrap();
        assert_eq!(overrides.entries().len(), 2);

        let mut resolver = Resolver::new(registry);
        overrides.apply(&mut resolver).unwrap();
        resolver.set_if_absent("I2C0_SCL", Value::Pin(47)).unwrap();
        assert_eq!(resolver.shadowed()[0].winner.value, Value::Pin(6));
    }

    #[test]
    fn test_sources_apply_in_order() {
        let config: OverridesConfig = serde_yaml::from_str("options:\n  BOARD_NAME: From file\n").unwrap();
        let registry = Registry::builtin();
        let mut overrides = Overrides::new(registry);
        overrides
            .env("BOARD_", vars(&[("BOARD_BOARD_NAME", "From env")])).unwrap()
            .file(&config, "overrides.yaml").unwrap()
            .defines(&["BOARD_NAME=From command line".to_string()]).unwrap();

        let mut resolver = Resolver::new(registry);
        overrides.apply(&mut resolver).unwrap();
        resolver.set_if_absent("BOARD_NAME", Value::Str("From board".to_string())).unwrap();
        resolver.set_if_absent("MCU_NAME", Value::Str("ESP32S3".to_string())).unwrap();
        resolver.set_if_absent("I2C0_SCL", Value::Pin(47)).unwrap();
        resolver.set_if_absent("I2C0_SDA", Value::Pin(48)).unwrap();

        let profile = resolver.finalize().unwrap();
        assert_eq!(profile.board_name(), Some("From command line"));
    }
}
