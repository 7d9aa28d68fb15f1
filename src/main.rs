// SPDX-License-Identifier: GPL-3.0-or-later

use std::convert::TryFrom;
use std::io::prelude::*;
use std::sync::atomic::Ordering::Relaxed;
use clap::Parser;
use clap::AppSettings;
use anyhow::{Result, Context};
use env_logger::fmt::Color;
use log::LevelFilter;
use termcolor::{ColorChoice, ColorSpec, StandardStream, WriteColor};

use board_resolver::codegen::{self, Format};
use board_resolver::config::{BoardConfig, OverridesConfig, RegistryConfig};
use board_resolver::overrides::Overrides;
use board_resolver::profile::BoardProfile;
use board_resolver::registry::Registry;
use board_resolver::resolver::{self, Origin, Resolver, Shadow};
use board_resolver::util::{read_yaml, write_output};


#[macro_use]
extern crate log;

/// Resolve a board configuration into compile-time constants
#[derive(Parser, Debug)]
#[clap(
    global_setting(AppSettings::DeriveDisplayOrder)
)]
pub struct Args {
    /// Board configuration file
    board: String,

    /// Option registry file. The built-in registry is used when omitted
    #[clap(short, long)]
    registry: Option<String>,

    /// Overrides file, applied before the board declarations
    #[clap(long)]
    overrides: Option<String>,

    /// Override an option, NAME=VALUE. Can be repeated
    #[clap(short = 'D', long = "define")]
    defines: Vec<String>,

    /// Read overrides from <PREFIX><NAME> environment variables
    #[clap(long)]
    env_prefix: Option<String>,

    /// Output format
    #[clap(short, long, arg_enum, default_value = "header")]
    format: Format,

    /// Output file. Defaults to stdout
    #[clap(short, long)]
    output: Option<String>,

    /// Print each option with where its value came from
    #[clap(long)]
    explain: bool,

    /// Verbosity. Can be repeated
    #[clap(short, long, parse(from_occurrences))]
    verbose: u8,
}


fn init_logging(level: u8) {
    let lf = match level {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(lf)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            let num_declarations = resolver::NUM_DECLARATIONS.load(Relaxed);

            let mut style = buf.style();
            let level = match record.level() {
                log::Level::Error => style.set_color(Color::Red).set_intense(true).value("ERROR"),
                log::Level::Warn =>  style.set_color(Color::Yellow).set_intense(true).value("WARN "),
                log::Level::Info =>  style.set_color(Color::Green).set_intense(true).value("INFO "),
                log::Level::Debug => style.set_color(Color::Cyan).set_intense(true).value("DEBUG"),
                log::Level::Trace => style.set_color(Color::Blue).set_intense(true).value("TRACE"),
            };

            writeln!(buf, "[{:04}] {} {}", num_declarations, level, record.args())
        })
        .init();
}

fn origin_color(origin: &Origin) -> termcolor::Color {
    match origin {
        Origin::Override(_) => termcolor::Color::Yellow,
        Origin::Board => termcolor::Color::Green,
        Origin::Default => termcolor::Color::Cyan,
    }
}

fn explain(profile: &BoardProfile, shadowed: &[Shadow]) -> Result<()> {
    let mut out = StandardStream::stderr(ColorChoice::Auto);

    let width = profile.iter().map(|e| e.def.name.len()).max().unwrap_or(0);
    writeln!(out, "Board {}", profile.board())?;

    for entry in profile.iter() {
        write!(out, "  {:<width$} {:<28} ", entry.def.name, entry.binding.value.to_string(), width = width)?;
        out.set_color(ColorSpec::new().set_fg(Some(origin_color(&entry.binding.origin))))?;
        writeln!(out, "{}", entry.binding.origin)?;
        out.reset()?;
    }

    for shadow in shadowed {
        out.set_color(ColorSpec::new().set_fg(Some(termcolor::Color::Magenta)).set_bold(true))?;
        write!(out, "  shadowed")?;
        out.reset()?;
        writeln!(out, " {} = {} lost to {} from {}",
            shadow.name, shadow.attempted, shadow.winner.value, shadow.winner.origin)?;
    }

    Ok(())
}

fn env_vars() -> impl Iterator<Item=(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let loaded_registry;
    let registry = match args.registry {
        Some(ref path) => {
            let config: RegistryConfig = read_yaml(path)?;
            loaded_registry = Registry::try_from(config)
                .with_context(|| format!("Invalid registry {}", path))?;
            &loaded_registry
        }
        None => Registry::builtin(),
    };

    let board: BoardConfig = read_yaml(&args.board)?;
    if board.options.is_empty() {
        warn!("{} declares no options", args.board);
    }

    let mut overrides = Overrides::new(registry);
    if let Some(ref prefix) = args.env_prefix {
        overrides.env(prefix, env_vars())
            .context("Invalid override in the environment")?;
    }
    if let Some(ref path) = args.overrides {
        let config: OverridesConfig = read_yaml(path)?;
        overrides.file(&config, path)
            .with_context(|| format!("Invalid override in {}", path))?;
    }
    overrides.defines(&args.defines)
        .context("Invalid override on the command line")?;

    debug!("Collected {} overrides", overrides.entries().len());

    let mut resolver = Resolver::new(registry);
    overrides.apply(&mut resolver)?;
    resolver.declare_board(&board)
        .with_context(|| format!("Invalid declaration in {}", args.board))?;

    let profile = resolver.finalize()
        .with_context(|| format!("Failed to resolve {}", args.board))?;

    if args.explain {
        explain(&profile, resolver.shadowed())?;
    }

    let output = codegen::generate(&profile, args.format)?;
    write_output(args.output.as_deref(), &output)?;

    if let Some(ref path) = args.output {
        info!("Wrote {:?} output for board={} to {}", args.format, profile.board(), path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "board-resolver", "boards/ESP32_GENERIC_S3/board.yaml",
            "-D", "BOARD_NAME=Override Name",
            "--define", "I2C0_SCL=5",
            "-f", "rust",
            "-vv",
        ]).unwrap();

        assert_eq!(args.board, "boards/ESP32_GENERIC_S3/board.yaml");
        assert_eq!(args.defines, ["BOARD_NAME=Override Name", "I2C0_SCL=5"]);
        assert_eq!(args.format, Format::Rust);
        assert_eq!(args.verbose, 2);
        assert!(args.registry.is_none());
    }

    #[test]
    fn test_default_format() {
        let args = Args::try_parse_from(["board-resolver", "board.yaml"]).unwrap();
        assert_eq!(args.format, Format::Header);
        assert!(!args.explain);
    }
}
