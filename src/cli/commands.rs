//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;

use nativize_core::strings::switch_hash;
use nativize_model::Assembly;
use serde::Serialize;

use crate::backend::{Backend, Diagnostic, TranslateError, UnitOutput};
use crate::config::{BackendConfig, OutputLayout, load_exclusion_list};

use super::{CliError, CliResult, ExitCode, TranslateOptions};

/// Maximum model file size (256 MB)
const MAX_MODEL_SIZE: u64 = 256 * 1024 * 1024;

/// Output directory used when `-o` is not given.
const DEFAULT_OUTPUT_DIR: &str = "nativize_output";

// ============================================================================
// Fatal unit report
// ============================================================================

/// A unit that could not be translated, rendered through miette.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("cannot translate `{unit}`: {reason}")]
#[diagnostic(code(nativize::unit_failed))]
struct UnitFailure {
    unit: String,
    reason: String,
    #[help]
    help: Option<String>,
}

impl UnitFailure {
    fn into_cli_error(self, exit_code: ExitCode) -> CliError {
        CliError::new(format!("{:?}", miette::Report::new(self)), exit_code)
    }
}

fn translate_error(unit: &str, err: TranslateError) -> CliError {
    let defect = err.is_internal_defect();
    let failure = UnitFailure {
        unit: unit.to_string(),
        reason: err.to_string(),
        help: Some(if defect {
            "this is a backend bug or a model that broke its resolution guarantees".to_string()
        } else {
            "add the missing type to the model's references".to_string()
        }),
    };
    failure.into_cli_error(if defect { ExitCode::DEFECT } else { ExitCode::FAILURE })
}

// ============================================================================
// Model loading
// ============================================================================

/// Read and deserialize a JSON model.
///
/// ## Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_MODEL_SIZE`
/// - The JSON does not match the model contract
pub fn load_model(path: &Path) -> CliResult<Assembly> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;
    if metadata.len() > MAX_MODEL_SIZE {
        return Err(CliError::failure(format!(
            "Model file '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_MODEL_SIZE
        )));
    }
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::failure(format!("Error reading '{}': {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::failure(format!("Invalid model '{}': {}", path.display(), e)))
}

/// Build the backend configuration from the shared flags.
pub fn backend_config(options: &TranslateOptions) -> CliResult<BackendConfig> {
    let layout = if options.file_per_type {
        OutputLayout::FilePerType
    } else {
        OutputLayout::Single
    };
    let mut config = BackendConfig::new()
        .with_layout(layout)
        .with_indent(options.indent)
        .with_enum_prepass(!options.no_enum_prepass);
    if let Some(path) = &options.exclude {
        let excluded = load_exclusion_list(path).map_err(|e| {
            CliError::failure(format!("Error reading exclusion list '{}': {}", path.display(), e))
        })?;
        tracing::debug!(count = excluded.len(), "loaded exclusion list");
        config = config.with_excluded(excluded);
    }
    Ok(config)
}

/// Load, configure and translate.
fn translate_model(options: &TranslateOptions) -> CliResult<UnitOutput> {
    let config = backend_config(options)?;
    let model = load_model(&options.model)?;
    Backend::new(config)
        .translate_unit(&model)
        .map_err(|e| translate_error(&model.name, e))
}

// ============================================================================
// Output writing
// ============================================================================

/// Validate output directory path for safety.
fn validate_output_dir(out_dir: &Path) -> CliResult<()> {
    for component in out_dir.components() {
        if let std::path::Component::ParentDir = component {
            return Err(CliError::failure(format!(
                "Output directory '{}' contains path traversal (..)",
                out_dir.display()
            )));
        }
    }

    if out_dir.is_absolute() {
        tracing::warn!("Using absolute output path: {}. Consider using a relative path.", out_dir.display());
    }

    Ok(())
}

/// Write every output file below `out_dir`, creating per-type subdirectories.
pub fn write_output(output: &UnitOutput, out_dir: &Path) -> CliResult<()> {
    for file in &output.files {
        let path = out_dir.join(&file.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CliError::failure(format!("Error creating '{}': {}", parent.display(), e)))?;
        }
        fs::write(&path, &file.contents)
            .map_err(|e| CliError::failure(format!("Error writing '{}': {}", path.display(), e)))?;
        tracing::debug!(file = %path.display(), bytes = file.contents.len(), "wrote output file");
    }
    Ok(())
}

// ============================================================================
// Reporting
// ============================================================================

/// Machine-readable result of `translate`/`check`.
#[derive(Debug, Serialize)]
pub struct Summary<'o> {
    pub unit: &'o str,
    pub emitted: usize,
    pub forced: &'o [String],
    pub files: Vec<&'o str>,
    pub diagnostics: &'o [Diagnostic],
    pub errors: bool,
}

impl<'o> Summary<'o> {
    pub fn new(output: &'o UnitOutput) -> Self {
        Self {
            unit: &output.unit,
            emitted: output.emitted.len(),
            forced: &output.forced,
            files: output.files.iter().map(|f| f.name.as_str()).collect(),
            diagnostics: &output.diagnostics,
            errors: output.has_errors(),
        }
    }
}

/// Print diagnostics and a summary; returns the exit code the result deserves.
fn report(output: &UnitOutput, json: bool, written_to: Option<&Path>) -> CliResult<ExitCode> {
    if json {
        let text = serde_json::to_string_pretty(&Summary::new(output))
            .map_err(|e| CliError::failure(format!("Error serializing summary: {}", e)))?;
        println!("{}", text);
    } else {
        for diagnostic in &output.diagnostics {
            eprintln!("{}", diagnostic);
        }
        if output.has_cycles() {
            println!(
                "{} types emitted, {} forced through a dependency cycle: {}",
                output.emitted.len(),
                output.forced.len(),
                output.forced.join(", ")
            );
        } else {
            println!("{} types emitted, no dependency cycles", output.emitted.len());
        }
        if let Some(dir) = written_to {
            println!("Wrote {} files to {}", output.files.len(), dir.display());
        }
    }
    Ok(if output.has_errors() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

// ============================================================================
// Commands
// ============================================================================

/// `nativize translate`: translate and write the unit's files.
#[tracing::instrument(skip_all, fields(model = %options.model.display()))]
pub fn translate(options: &TranslateOptions, output_dir: Option<&Path>) -> CliResult<ExitCode> {
    let out_dir = output_dir.unwrap_or(Path::new(DEFAULT_OUTPUT_DIR));
    validate_output_dir(out_dir)?;
    let output = translate_model(options)?;
    write_output(&output, out_dir)?;
    report(&output, options.json, Some(out_dir))
}

/// `nativize check`: translate without writing.
#[tracing::instrument(skip_all, fields(model = %options.model.display()))]
pub fn check(options: &TranslateOptions) -> CliResult<ExitCode> {
    let output = translate_model(options)?;
    report(&output, options.json, None)
}

/// `nativize hash`: print `text<TAB>hash` per argument.
pub fn hash(texts: &[String]) -> ExitCode {
    for text in texts {
        println!("{}\t{}", text, switch_hash(text));
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn options(model: &str) -> TranslateOptions {
        TranslateOptions {
            model: PathBuf::from(model),
            file_per_type: false,
            exclude: None,
            indent: 4,
            no_enum_prepass: false,
            json: false,
        }
    }

    #[test]
    fn test_validate_output_dir_rejects_traversal() {
        assert!(validate_output_dir(Path::new("out/../../etc")).is_err());
        assert!(validate_output_dir(Path::new("out/cpp")).is_ok());
    }

    #[test]
    fn test_backend_config_from_flags() {
        let mut opts = options("app.json");
        opts.file_per_type = true;
        opts.indent = 2;
        opts.no_enum_prepass = true;
        let config = backend_config(&opts).unwrap();
        assert_eq!(config.layout, OutputLayout::FilePerType);
        assert_eq!(config.indent, 2);
        assert!(!config.enum_prepass);
    }

    #[test]
    fn test_missing_exclusion_list_is_a_failure() {
        let mut opts = options("app.json");
        opts.exclude = Some(PathBuf::from("definitely/not/here.txt"));
        let err = backend_config(&opts).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }

    #[test]
    fn test_missing_model_is_a_failure() {
        let err = load_model(Path::new("definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("Cannot access file"));
    }

    #[test]
    fn test_internal_defect_maps_to_exit_code_two() {
        let err = translate_error("App", TranslateError::defect("App.W::Run", "unbalanced"));
        assert_eq!(err.exit_code, ExitCode::DEFECT);
        assert!(err.message.contains("unbalanced"));
        let err = translate_error("App", TranslateError::InvalidModel("unknown base".into()));
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }

    #[test]
    fn test_summary_serializes() {
        let output = Backend::default().translate_unit(&Assembly::new("App")).unwrap();
        let value = serde_json::to_value(Summary::new(&output)).unwrap();
        assert_eq!(value["unit"], "App");
        assert_eq!(value["emitted"], 0);
        assert_eq!(value["errors"], false);
        assert_eq!(value["files"].as_array().unwrap().len(), 3);
    }
}
