//! # Cli
//!
//! Command line interface of the calltrace binary: the main options and the
//! offline subcommands.

use std::{ffi::OsString, str::FromStr};

use anyhow::Result;
use clap::{builder::PossibleValuesParser, error::Error as ClapError, Args, Parser, Subcommand};
use log::LevelFilter;

pub mod print;
pub use print::*;
pub mod symbolicate;
pub use symbolicate::*;

/// Trait implemented by all subcommands.
pub trait SubCommandParserRunner {
    fn run(&mut self, main_config: &MainConfig) -> Result<()>;
}

/// Main options, shared by all subcommands.
#[derive(Args, Debug, Default)]
pub struct MainConfig {
    #[arg(
        long,
        global = true,
        value_parser=PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"]),
        default_value = "info",
        help = "Log level",
    )]
    pub log_level: String,
}

impl MainConfig {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        Ok(LevelFilter::from_str(&self.log_level)?)
    }
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    /// Print recorded events to stdout.
    Print(Print),
    /// Resolve addresses against the modules of a process.
    Symbolicate(Symbolicate),
}

impl SubCommands {
    fn runner(&mut self) -> &mut dyn SubCommandParserRunner {
        match self {
            SubCommands::Print(cmd) => cmd,
            SubCommands::Symbolicate(cmd) => cmd,
        }
    }
}

/// Trace function calls of threads and probe addresses
///
/// calltrace manages call tracing sessions on top of an instrumentation
/// engine. The binary provides offline tools to work with its output.
#[derive(Parser, Debug)]
#[command(name = "calltrace", version, disable_help_subcommand = true)]
pub struct CalltraceCli {
    #[command(flatten)]
    pub main_config: MainConfig,
    #[command(subcommand)]
    pub subcommand: SubCommands,
}

impl CalltraceCli {
    /// Parse a given list of arguments.
    pub fn build_from<I, T>(args: I) -> Result<Self, ClapError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Run the selected subcommand.
    pub fn run(mut self) -> Result<()> {
        self.subcommand.runner().run(&self.main_config)
    }
}
