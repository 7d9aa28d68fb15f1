// SPDX-License-Identifier: GPL-3.0-or-later

use std::fmt::{self, Write as _};

use anyhow::Result;
use serde::Serialize;
use serde_yaml::{Mapping, Value as Yaml};

use crate::profile::BoardProfile;
use crate::value::Value;

#[derive(clap::ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// C header with one #define per option
    Header,
    /// Rust module with one pub const per option
    Rust,
    /// YAML dump of the resolved profile
    Yaml,
}

// Column where header values start, as in hand written board headers
const HEADER_VALUE_COLUMN: usize = 36;

fn c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            // \x is greedy in C, octal stops after three digits
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn c_value(value: &Value) -> String {
    match value {
        Value::Str(s) => c_string(s),
        Value::Pin(p) => format!("({})", p),
        Value::Bool(b) => format!("({})", *b as u8),
        Value::Count(c) => format!("({})", c),
    }
}

fn guard_name(board: &str) -> String {
    let board: String = board.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if board.is_empty() {
        "BOARD_PROFILE_H".to_string()
    } else {
        format!("BOARD_PROFILE_{}_H", board)
    }
}

fn write_header(out: &mut String, profile: &BoardProfile) -> fmt::Result {
    let guard = guard_name(profile.board());

    writeln!(out, "// Generated by board-resolver for board {}. Do not edit.", profile.board())?;
    writeln!(out, "#ifndef {}", guard)?;
    writeln!(out, "#define {}", guard)?;
    writeln!(out)?;

    for entry in profile.iter() {
        let define = format!("#define {}", entry.symbol);
        writeln!(out, "{:<width$}{}", define, c_value(&entry.binding.value),
            width = HEADER_VALUE_COLUMN.max(define.len() + 1))?;
    }

    writeln!(out)?;
    writeln!(out, "#endif // {}", guard)
}

fn write_rust(out: &mut String, profile: &BoardProfile) -> fmt::Result {
    writeln!(out, "// Generated by board-resolver for board {}. Do not edit.", profile.board())?;

    for entry in profile.iter() {
        writeln!(out)?;
        if let Some(ref description) = entry.def.description {
            for line in description.lines() {
                writeln!(out, "/// {}", line.trim_end())?;
            }
        }
        let (ty, value) = match &entry.binding.value {
            Value::Str(s) => ("&str", format!("{:?}", s)),
            Value::Pin(p) => ("u32", p.to_string()),
            Value::Bool(b) => ("bool", b.to_string()),
            Value::Count(c) => ("u64", c.to_string()),
        };
        writeln!(out, "pub const {}: {} = {};", entry.def.name, ty, value)?;
    }
    Ok(())
}

pub fn generate_header(profile: &BoardProfile) -> Result<String> {
    let mut out = String::new();
    write_header(&mut out, profile)?;
    Ok(out)
}

pub fn generate_rust(profile: &BoardProfile) -> Result<String> {
    let mut out = String::new();
    write_rust(&mut out, profile)?;
    Ok(out)
}

#[derive(Serialize)]
struct ProfileDump<'a> {
    board: &'a str,
    options: Mapping,
}

pub fn generate_yaml(profile: &BoardProfile) -> Result<String> {
    let mut options = Mapping::new();
    for entry in profile.iter() {
        options.insert(Yaml::String(entry.def.name.clone()), serde_yaml::to_value(&entry.binding.value)?);
    }

    let dump = ProfileDump { board: profile.board(), options };
    Ok(serde_yaml::to_string(&dump)?)
}

pub fn generate(profile: &BoardProfile, format: Format) -> Result<String> {
    Ok(match format {
        Format::Header => generate_header(profile)?,
        Format::Rust => generate_rust(profile)?,
        Format::Yaml => generate_yaml(profile)?,
    })
}
