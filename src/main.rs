//! passthesalt release pipeline binary.
//!
//! Runs the pipeline to completion, printing the error banner and
//! recovery suggestions on failure. A user interrupt is caught here
//! only, to exit with a short message instead of the banner.

use passthesalt_release::cli;
use passthesalt_release::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::init();

    tokio::select! {
        result = cli::run() => match result {
            Ok(exit_code) => {
                process::exit(exit_code);
            }
            Err(e) => {
                // Never quiet for fatal errors
                let output = OutputManager::new(false, false);
                output.error(&e.to_string());

                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    output.println("Recovery suggestions:");
                    for suggestion in suggestions {
                        output.indent(&suggestion);
                    }
                }

                process::exit(1);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted. Exiting.");
            process::exit(130);
        }
    }
}
