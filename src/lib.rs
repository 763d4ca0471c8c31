//! poja generates serverless Java projects: build files, infrastructure
//! definitions, CI workflows and application scaffolding, chosen and rendered
//! from a declarative set of options.

/// Command-line interface module for the poja application
pub mod cli;

/// Generation options, defaults and validation
/// Supports discrete flags and poja.yml files
pub mod config;

/// Template catalog and its .poja-catalog.yml manifest
pub mod catalog;

/// Common constants
pub mod constants;

/// Error types and handling for the poja application
pub mod error;

/// Auxiliary fragment files merged into templates
/// (custom Java dependencies, repositories and environment variables)
pub mod fragments;

/// Core generation orchestration
pub mod generator;

pub mod logger;

/// Template rendering
pub mod renderer;

/// Selection of the files and directories to generate
pub mod resolver;

/// Output tree writing
pub mod writer;
