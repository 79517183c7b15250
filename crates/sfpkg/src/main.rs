//! sfpkg command line entry point.

use sfpkg::cli::{self, CliError, EXIT_OK, exit_code_for, render_error};
use sfpkg::commands::{self, CommandContext};
use sfpkg::tracing::{TracingConfig, init_tracing};

/// Exit code for SIGINT (128 + signal number 2)
const EXIT_SIGINT: i32 = 130;

fn main() {
    // NOTE: tracing may be unusable during a panic, write straight to stderr.
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let err = CliError::other(format!("Failed to create tokio runtime: {e}"));
            render_error(&err, cli.json);
            std::process::exit(exit_code_for(&err));
        }
    };

    let exit_code = rt.block_on(run(cli));
    std::process::exit(exit_code);
}

async fn run(cli: cli::Cli) -> i32 {
    let json = cli.json;
    tokio::select! {
        biased;

        _ = tokio::signal::ctrl_c() => EXIT_SIGINT,
        result = real_main(cli) => match result {
            Ok(()) => EXIT_OK,
            Err(err) => {
                render_error(&err, json);
                exit_code_for(&err)
            }
        }
    }
}

async fn real_main(cli: cli::Cli) -> Result<(), CliError> {
    // A second subscriber (e.g. under a test harness) is not fatal
    let _ = init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        filter: None,
    });

    let ctx = CommandContext::production(cli.json);
    commands::execute(&ctx, cli.command).await?;
    Ok(())
}
