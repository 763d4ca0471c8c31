//! poja's main application entry point.
//! Parses arguments, sets up logging and runs the generation pipeline.

use poja::{
    cli::{get_args, Args},
    error::{default_error_handler, Result},
    generator::generate,
    logger::init_logger,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Merges options from --poja-conf and explicit flags
/// 2. Generates the project into the output directory
/// 3. Reports every written file
fn run(args: Args) -> Result<()> {
    let raw = args.raw_options()?;
    let generation = generate(raw, args.resolved_template_root(), &args.output_dir)?;

    for file in &generation.files {
        println!("Generated: '{}'", file.display());
    }
    println!(
        "Project '{}' generated successfully in {}.",
        generation.config.app_name,
        args.output_dir.display()
    );
    Ok(())
}
