//! fheforge's main application entry point and orchestration logic.
//! Handles command-line argument parsing and coordinates the template
//! store, the merge engine, and the materializer.

use fheforge::{
    cli::{get_args, parse_param_overrides, Args, Command},
    error::{default_error_handler, Error, Result},
    forge::Forge,
    loader::TemplateStore,
    logger::init_logger,
    materializer,
    model::MergeRequest,
    resolver::ValidationReport,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn print_report(report: &ValidationReport) {
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for error in &report.errors {
        eprintln!("error: {}", error);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Constructs the template store for this invocation
/// 2. Loads the full catalog of bases and modules
/// 3. Resolves and validates the requested combination
/// 4. Merges slots and module fragments into final text
/// 5. Writes the result and the shared skeleton to the output directory
fn run(args: Args) -> Result<()> {
    let store = TemplateStore::new(&args.templates_dir);

    match args.command {
        Command::List => {
            let catalog = store.load_catalog()?;
            println!("Available bases:");
            for base in catalog.bases.values() {
                println!("  {} ({}) - {}", base.name, base.version, base.description);
            }
            println!();
            println!("Available modules:");
            for module in catalog.modules.values() {
                println!("  {} - {}", module.id, module.description);
            }
            Ok(())
        }
        Command::Check { base, modules, params } => {
            let catalog = store.load_catalog()?;
            let forge = Forge::new(&catalog);
            let request = MergeRequest {
                base,
                modules,
                project_name: "check".to_string(),
                param_overrides: parse_param_overrides(&params)?,
                dry_run: true,
            };
            let report = forge.validate_only(&request)?;
            print_report(&report);
            if !report.valid() {
                return Err(Error::MergeRefused { error_count: report.errors.len() });
            }
            println!("Combination is valid.");
            Ok(())
        }
        Command::Preview { base, modules, name, params } => {
            let catalog = store.load_catalog()?;
            let forge = Forge::new(&catalog);
            let project_name = name.unwrap_or_else(|| base.clone());
            let request = MergeRequest {
                base,
                modules,
                project_name,
                param_overrides: parse_param_overrides(&params)?,
                dry_run: true,
            };
            let text = forge.preview(&request)?;
            println!("{}", text);
            Ok(())
        }
        Command::New { base, output_dir, modules, name, params, force, dry_run } => {
            let output_root = if dry_run {
                output_dir.clone()
            } else {
                materializer::ensure_output_dir(&output_dir, force)?
            };
            let catalog = store.load_catalog()?;
            let forge = Forge::new(&catalog);
            let project_name = name.unwrap_or_else(|| {
                output_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| base.clone())
            });
            let request = MergeRequest {
                base,
                modules,
                project_name,
                param_overrides: parse_param_overrides(&params)?,
                dry_run,
            };

            let result = forge.merge(&request)?;
            print_report(&result.report);
            if !result.success {
                return Err(Error::MergeRefused {
                    error_count: result.report.errors.len(),
                });
            }

            let written = materializer::materialize(
                &result,
                &output_root,
                Some(&store.skeleton_dir()),
                dry_run,
            )?;
            let action = if dry_run { "would write" } else { "wrote" };
            for path in &written {
                println!("{}: '{}'", action, path.display());
            }
            println!("Project generated successfully in {}.", output_root.display());
            Ok(())
        }
    }
}
