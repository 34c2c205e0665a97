//! CLI module for nativize
//!
//! This module provides the command-line driver around the backend.
//!
//! ## Commands
//!
//! - `translate <MODEL.json>` - Translate a unit and write its C++ files
//! - `check <MODEL.json>` - Translate without writing; report diagnostics and cycle status
//! - `hash <TEXT>...` - Print the switch hash of each text
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// An error diagnostic, an invalid model or an I/O failure.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The backend hit an internal defect.
    pub const DEFECT: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create an internal-defect error (exit code 2).
    pub fn defect(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::DEFECT)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Translate a managed object model into native C++ source
#[derive(Parser, Debug)]
#[command(name = "nativize")]
#[command(version = VERSION)]
#[command(about = "Translate a managed object model into native C++ source", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by the commands that translate a model.
#[derive(Args, Debug, Clone)]
pub struct TranslateOptions {
    /// JSON model of the unit to translate
    #[arg(value_name = "MODEL.json")]
    pub model: PathBuf,

    /// Also write one .h/.cpp pair per type
    #[arg(long = "file-per-type")]
    pub file_per_type: bool,

    /// Newline-separated list of managed type names not to generate
    #[arg(long, value_name = "FILE")]
    pub exclude: Option<PathBuf>,

    /// Spaces per indentation level
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub indent: usize,

    /// Do not emit enums ahead of the other types
    #[arg(long = "no-enum-prepass")]
    pub no_enum_prepass: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate a unit and write its C++ files
    Translate {
        #[command(flatten)]
        options: TranslateOptions,
        /// Output directory (default: nativize_output)
        #[arg(short = 'o', long = "output", value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Translate without writing; report diagnostics and cycle status
    Check {
        #[command(flatten)]
        options: TranslateOptions,
    },

    /// Print the switch hash of each text (debugging aid)
    Hash {
        #[arg(value_name = "TEXT", required = true)]
        texts: Vec<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Translate { options, output_dir } => commands::translate(&options, output_dir.as_deref()),
        Command::Check { options } => commands::check(&options),
        Command::Hash { texts } => Ok(commands::hash(&texts)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_translate() {
        let cli = Cli::try_parse_from([
            "nativize",
            "translate",
            "app.json",
            "-o",
            "out",
            "--file-per-type",
            "--indent",
            "2",
        ])
        .unwrap();
        if let Command::Translate { options, output_dir } = cli.command {
            assert_eq!(options.model, PathBuf::from("app.json"));
            assert!(options.file_per_type);
            assert_eq!(options.indent, 2);
            assert_eq!(output_dir, Some(PathBuf::from("out")));
        } else {
            panic!("Expected Translate command");
        }
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::try_parse_from(["nativize", "check", "app.json", "--json", "--exclude", "skip.txt"]).unwrap();
        if let Command::Check { options } = cli.command {
            assert!(options.json);
            assert_eq!(options.exclude, Some(PathBuf::from("skip.txt")));
            assert_eq!(options.indent, 4);
            assert!(!options.no_enum_prepass);
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_parse_hash() {
        let cli = Cli::try_parse_from(["nativize", "hash", "a", "b"]).unwrap();
        if let Command::Hash { texts } = cli.command {
            assert_eq!(texts, vec!["a".to_string(), "b".to_string()]);
        } else {
            panic!("Expected Hash command");
        }
    }

    #[test]
    fn test_cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["nativize"]).is_err());
        assert!(Cli::try_parse_from(["nativize", "hash"]).is_err());
    }
}
