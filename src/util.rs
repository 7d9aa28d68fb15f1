// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::prelude::*;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub fn read_file(path: &str) -> Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path))?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .with_context(|| format!("Failed to read {}", path))?;

    Ok(buf)
}

pub fn read_file_str(path: &str) -> Result<String> {
    let content = read_file(path)?;
    let str = String::from_utf8(content)
        .with_context(|| format!("{} is not valid UTF-8", path))?;
    Ok(str)
}

pub fn read_yaml<T: DeserializeOwned>(path: &str) -> Result<T> {
    serde_yaml::from_str(&read_file_str(path)?)
        .with_context(|| format!("Failed to parse {}", path))
}

/// Writes to `path`, or to stdout when there is none
pub fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write {}", path))?;
        }
        None => {
            std::io::stdout().write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
