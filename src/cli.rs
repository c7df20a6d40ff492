//! Command-line interface implementation for fheforge.
//! Provides argument parsing and help text formatting using clap.

use crate::error::{Error, Result};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::PathBuf;

/// Command-line arguments structure for fheforge.
#[derive(Parser, Debug)]
#[command(author, version, about = "fheforge: composable confidential contract scaffolding tool", long_about = None)]
pub struct Args {
    /// Directory containing bases, modules, and the shared project skeleton
    #[arg(long, global = true, value_name = "DIR", default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a project from a base template and selected modules
    New {
        /// Base template name
        #[arg(value_name = "BASE")]
        base: String,

        /// Directory where the generated project will be created
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Module identifier (category/name) to apply; repeatable, in order
        #[arg(short = 'm', long = "module", value_name = "MODULE")]
        modules: Vec<String>,

        /// Project name; defaults to the output directory name
        #[arg(long)]
        name: Option<String>,

        /// Type-parameter override; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Force overwrite of existing output directory
        #[arg(short, long)]
        force: bool,

        /// Validate and assemble without writing any files
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a combination without generating anything
    Check {
        /// Base template name
        #[arg(value_name = "BASE")]
        base: String,

        /// Module identifier (category/name) to apply; repeatable, in order
        #[arg(short = 'm', long = "module", value_name = "MODULE")]
        modules: Vec<String>,

        /// Type-parameter override; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Print the merged contract source without writing files
    Preview {
        /// Base template name
        #[arg(value_name = "BASE")]
        base: String,

        /// Module identifier (category/name) to apply; repeatable, in order
        #[arg(short = 'm', long = "module", value_name = "MODULE")]
        modules: Vec<String>,

        /// Project name used in the rendered output
        #[arg(long)]
        name: Option<String>,

        /// Type-parameter override; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// List available bases and modules
    List,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help()
                    .unwrap();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

/// Parses `--set KEY=VALUE` overrides. Values are read as JSON when
/// possible so numbers and booleans keep their type; anything else is
/// taken as a string.
pub fn parse_param_overrides(values: &[String]) -> Result<IndexMap<String, Value>> {
    let mut overrides = IndexMap::new();
    for value in values {
        match value.split_once('=') {
            Some((key, raw)) if !key.is_empty() => {
                let parsed = serde_json::from_str(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string()));
                overrides.insert(key.to_string(), parsed);
            }
            _ => return Err(Error::InvalidParamOverride { value: value.clone() }),
        }
    }
    Ok(overrides)
}
