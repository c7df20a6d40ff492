//! fheforge assembles confidential (FHE-enabled) smart contracts from
//! reusable base templates and module fragments. It validates a requested
//! combination under a multi-phase rule set and deterministically merges
//! base template slots with module-provided code into a ready-to-compile
//! project.

/// Block-level contract sketch builder
pub mod builder;

/// Command-line interface module for the fheforge application
pub mod cli;

/// Common constants: metadata file names, store layout, rule tables
pub mod constants;

/// Error types and handling for the fheforge application
pub mod error;

/// The merge engine facade: merge, validate-only, preview
pub mod forge;

/// Template store loading
/// Supports JSON and YAML metadata (forge.json, forge.yml, forge.yaml)
pub mod loader;

pub mod logger;

/// Writes merged results to disk and copies the shared project skeleton
pub mod materializer;

/// Slot injection and final text assembly
pub mod merger;

/// Shared data model: bases, modules, requests, results
pub mod model;

/// Expression rendering for module fragments and conditions
pub mod renderer;

/// Multi-phase dependency and conflict resolution
pub mod resolver;

/// Slot parsing and type-parameter substitution
pub mod slots;
