//! Result writer binary - submits integer results to the background writer
//!
//! Usage:
//!   cargo run --bin result_writer                           # Writes 10, 20, 30 to output.txt
//!   cargo run --bin result_writer -- 1 2 3 --console        # Also echo to stdout
//!   cargo run --bin result_writer -- --config writer.toml --stdin

use anyhow::Context;
use clap::Parser;
use result_writer::common::cli::ResultWriterArgs;
use result_writer::common::shutdown::{setup_shutdown, ShutdownReceiver};
use result_writer::config::Config;
use result_writer::lifecycle::{LifecycleController, ShutdownOutcome, Submitter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("result_writer=info".parse()?),
        )
        .init();

    let args = ResultWriterArgs::parse();

    // Build configuration
    let mut config = match &args.common.config_file {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("loading configuration from {}", path))?;
            info!(config_file = %path, "Loaded configuration");
            config
        }
        None => Config::default(),
    };
    config.apply_overrides(args.output.clone(), args.console, args.timeout_ms);
    config.validate()?;

    let sink = config.build_sink()?;
    let mut controller = LifecycleController::spawn(sink, config.writer_config())?;

    for value in args.values_to_submit() {
        controller.submit(value)?;
    }

    if args.stdin {
        let (_shutdown_tx, shutdown_rx) = setup_shutdown();
        read_stdin(controller.submitter()?, shutdown_rx).await?;
    }

    // shutdown blocks the calling thread, keep it off the runtime workers
    let timeout = config.shutdown_timeout();
    let (mut controller, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = controller.shutdown(timeout);
        (controller, outcome)
    })
    .await?;

    let stats = controller.stats();
    match outcome {
        Ok(ShutdownOutcome::Terminated) | Ok(ShutdownOutcome::AlreadyTerminated) => {
            info!(
                written = stats.written,
                failed = stats.failed,
                "Result writer finished"
            );
            println!("{}", stats.summary());
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, outstanding = stats.outstanding(), "Shutdown incomplete");
            // Already waited once; don't let Drop wait again
            controller.detach();
            Err(e.into())
        }
    }
}

/// Submit one integer per stdin line until EOF or Ctrl+C
async fn read_stdin(submitter: Submitter, mut shutdown: ShutdownReceiver) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                info!("Input interrupted");
                break;
            }

            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match trimmed.parse::<i64>() {
                            Ok(value) => {
                                submitter.submit(value)?;
                            }
                            Err(e) => {
                                warn!(line = %trimmed, error = %e, "Skipping non-integer input");
                            }
                        }
                    }
                    None => {
                        info!("End of input");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
