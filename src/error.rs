// SPDX-License-Identifier: GPL-3.0-or-later

use std::error::Error;

use crate::registry::OptionKind;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    UnknownOption(String),
    MissingMandatoryOption(String),
    AlreadyFinalized,
    DuplicateOption(String),
    InvalidOptionName(String),
    InvalidValue {
        name: String,
        kind: OptionKind,
        value: String,
    },
}

impl ResolveError {
    pub fn invalid_value(name: &str, kind: OptionKind, value: impl ToString) -> Self {
        Self::InvalidValue { name: name.to_string(), kind, value: value.to_string() }
    }
}

impl core::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOption(name) =>
                write!(f, "Unknown option {} (not declared in the registry)", name),
            Self::MissingMandatoryOption(name) =>
                write!(f, "Mandatory option {} has no default and was never set", name),
            Self::AlreadyFinalized =>
                write!(f, "Board profile is already finalized"),
            Self::DuplicateOption(name) =>
                write!(f, "Option {} is declared more than once", name),
            Self::InvalidOptionName(name) =>
                write!(f, "Invalid option name '{}'", name),
            Self::InvalidValue { name, kind, value } =>
                write!(f, "Invalid value for option {}: expected {}, got {}", name, kind, value),
        }
    }
}

impl Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_option() {
        let e = ResolveError::MissingMandatoryOption("I2C0_SCL".to_string());
        assert!(e.to_string().contains("I2C0_SCL"));

        let e = ResolveError::invalid_value("I2C0_SDA", OptionKind::IntegerPin, "\"abc\"");
        assert_eq!(e.to_string(), "Invalid value for option I2C0_SDA: expected pin, got \"abc\"");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let e: anyhow::Error = ResolveError::UnknownOption("NOT_A_REAL_OPTION".to_string()).into();
        assert_eq!(
            e.downcast_ref::<ResolveError>(),
            Some(&ResolveError::UnknownOption("NOT_A_REAL_OPTION".to_string())),
        );
    }
}
