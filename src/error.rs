//! Error handling for the fheforge application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for fheforge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// The requested base template does not exist in the template store
    #[error("Base template '{name}' was not found in the template store.")]
    BaseNotFound { name: String },

    /// The requested module does not exist in the template store
    #[error("Module '{id}' was not found in the template store.")]
    ModuleNotFound { id: String },

    /// A module identifier did not follow the `category/name` format
    #[error("Invalid module identifier '{id}': expected 'category/name'.")]
    InvalidModuleId { id: String },

    /// A metadata document could not be read or parsed
    #[error("Metadata error in '{path}': {message}.")]
    MetadataError { path: String, message: String },

    /// Represents errors that occur during template processing
    #[error("Template error: {0}.")]
    TemplateError(String),

    /// Represents errors raised by the expression renderer
    #[error("Render error: {0}.")]
    RenderError(#[from] minijinja::Error),

    /// The output directory already exists and --force was not given
    #[error("Output directory '{output_dir}' already exists. Use --force to overwrite.")]
    OutputDirectoryExistsError { output_dir: String },

    /// A `--set` override did not follow the KEY=VALUE format
    #[error("Invalid parameter override '{value}': expected KEY=VALUE.")]
    InvalidParamOverride { value: String },

    /// The requested combination failed validation; nothing was generated
    #[error("Merge refused: the requested combination failed validation with {error_count} error(s).")]
    MergeRefused { error_count: usize },
}

/// Convenience type alias for Results with fheforge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(1);
}
