//! shipwatch CLI entry point.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use shipwatch::cli::{self, CliError, EXIT_FAILED, EXIT_OK, exit_code_for, render_error};
use shipwatch::commands;
use shipwatch::tracing::{TracingConfig, init_tracing};
use tracing::instrument;

/// Exit code for SIGINT (128 + signal number 2)
const EXIT_SIGINT: i32 = 130;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    // A `.env` next to the invocation may carry the Jenkins and AWS settings.
    let _ = dotenvy::dotenv();

    // Prompts block the main thread on stdin, so Ctrl-C is handled off it.
    let _ = ctrlc::set_handler(|| std::process::exit(EXIT_SIGINT));

    let cli = cli::parse();
    let json = cli.json;

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        ..Default::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("{e:?}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            render_error(
                &CliError::other(format!("Failed to create tokio runtime: {e}")),
                json,
            );
            std::process::exit(EXIT_FAILED);
        }
    };

    let code = match runtime.block_on(real_main(cli)) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, json);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

#[instrument(name = "shipwatch_main", skip_all)]
async fn real_main(cli: cli::Cli) -> Result<String, CliError> {
    commands::run(cli).await
}
