//! Endpoint Suite Runner - Main CLI Application
//!
//! Runs the end-to-end test suite against one or more server endpoints,
//! negotiating the protocol per endpoint and writing every line of runner
//! output to a single timestamped log.

use clap::Parser;
use endpoint_suite_runner::{
    app::App,
    cli::Cli,
    config::load_config,
    error::{AppError, ErrorReporter, Result},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("Debug mode enabled");
        println!();
    }

    let config = load_config(cli)?;
    App::new(config).run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Endpoints are host:port pairs, comma separated (e.g. localhost:8080)");
            eprintln!("  - Pass --token or set PDFDANCER_TOKEN in the environment or a .env file");
            eprintln!("  - --workers must be at least 1");
        }
        AppError::Capability(_) => {
            eprintln!();
            eprintln!("Parallel execution help:");
            eprintln!("  - Install pytest-xdist for the interpreter given by --python");
            eprintln!("  - Or install GNU parallel and make sure it is on PATH");
            eprintln!("  - Or run sequentially with --workers 1");
        }
        AppError::Connectivity(_) => {
            eprintln!();
            eprintln!("Connectivity help:");
            eprintln!("  - Check that the server is running and listening on the given port");
            eprintln!("  - The readiness path is probed over http first, then https");
            eprintln!("  - Raise --probe-timeout for slow servers");
        }
        AppError::TestExecution(_) => {
            eprintln!();
            eprintln!("See the run log for the failing endpoint's output.");
        }
        _ => {}
    }
}
