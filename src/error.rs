//! Error handling for poja.
//! Every stage of the generation pipeline has its own error type; the
//! top-level [`Error`] wraps them so the orchestrator can fail fast with `?`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid, missing or contradictory configuration.
///
/// Always reported before any file is read or written.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration source could not be parsed.
    #[error("Configuration error: {0}.")]
    Parse(String),

    /// A mandatory option was not provided.
    #[error("Configuration error: '{field}' is required.")]
    MissingRequiredField { field: &'static str },

    /// An option required by another enabled option was not provided.
    #[error("Configuration error: '{field}' is required when '{required_by}' is set.")]
    MissingDependentField { field: &'static str, required_by: &'static str },

    /// Boolean options only accept the literal strings "true" and "false".
    #[error("Configuration error: '{field}' must be \"true\" or \"false\", got '{value}'.")]
    InvalidBoolean { field: &'static str, value: String },

    /// An enumerated option received a value outside its choices.
    #[error("Configuration error: '{field}' must be one of [{expected}], got '{value}'.")]
    InvalidEnum { field: &'static str, value: String, expected: String },

    /// The value is syntactically wrong for its option.
    #[error("Configuration error: invalid '{field}' value '{value}': {reason}.")]
    InvalidValue { field: &'static str, value: String, reason: String },
}

/// Inconsistency between the template catalog and its manifest.
///
/// These point to a defect in the template set rather than in the user input.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Catalog error: {0}.")]
    InvalidCatalog(String),

    #[error("Catalog error: condition on '{path}' refers to unknown option '{field}'.")]
    UnknownField { path: String, field: String },

    #[error("Resolution error: '{output}' is produced by both '{first}' and '{second}'.")]
    ConflictingVariant { output: String, first: String, second: String },

    #[error("Resolution error: no template provides '{output}' ({reason}).")]
    MissingRequiredFile { output: String, reason: String },
}

/// Failure while turning a resolved entry into final content.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render error: unknown placeholder in '{template}': {detail}.")]
    UnknownPlaceholder { template: String, detail: String },

    #[error("Render error: '{template}' is not a valid template: {detail}.")]
    Template { template: String, detail: String },

    #[error("Render error: '{template}' renders to invalid path '{path}'.")]
    InvalidPath { template: String, path: String },

    #[error("Render error: auxiliary file '{}' not found.", path.display())]
    AuxFileNotFound { path: PathBuf },

    #[error("Render error: {}:{line_number}: invalid {kind} entry '{line}'.", path.display())]
    InvalidAuxEntry { path: PathBuf, kind: &'static str, line_number: usize, line: String },

    #[error("Render error: expected one '{kind}' merge marker in '{template}', found {found}.")]
    MergeMarker { template: String, kind: &'static str, found: usize },

    #[error("Render error: cannot read '{}': {source}.", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Failure while materializing the output tree.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Write error: '{}' is targeted by more than one entry.", path.display())]
    PathConflict { path: PathBuf },

    #[error("Write error: '{}': {source}.", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Any error produced by a generation run.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
