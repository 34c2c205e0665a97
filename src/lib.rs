#![forbid(unsafe_code)]
//! nativize: managed object model to native C++ source
//!
//! This crate turns an already type-checked managed object model (see [`nativize_model`]) into C++ source text
//! that links against the CrossNet-style runtime. It provides the backend, its configuration and the CLI driver.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Degraded input**: Constructs the target cannot express are reported as [`backend::Diagnostic`]s and
//!   translated to placeholders; only broken model guarantees abort a unit with a [`backend::TranslateError`].

pub mod backend;
pub mod cli;
pub mod config;

pub use backend::{Backend, Diagnostic, DiagnosticCode, OutputFile, Severity, TranslateError, UnitOutput};
pub use config::{BackendConfig, OutputLayout};
