// src/main.rs

use clap::Parser;
use gitsnap::cli::Cli;
use gitsnap::config::ConfigBuilder;
use gitsnap::errors::Error;
use gitsnap::events::LogSink;
#[cfg(feature = "progress")]
use gitsnap::progress::IndicatifProgress;
use gitsnap::progress::ProgressReporter;
use gitsnap::run;
use std::sync::Arc;

fn main() {
    let cli = Cli::parse();

    // Initialize logging. Default to 'info' if RUST_LOG is not set.
    let directive = if cli.verbose || cfg!(debug_assertions) {
        "gitsnap=debug"
    } else {
        "gitsnap=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .init();

    log::debug!("Starting gitsnap v{}...", env!("CARGO_PKG_VERSION"));
    log::debug!("Raw arguments: {:?}", std::env::args().collect::<Vec<_>>());

    // Decide whether to show a progress bar. Show it if stderr is a TTY.
    let progress_reporter: Option<Arc<dyn ProgressReporter>> = {
        #[cfg(feature = "progress")]
        {
            if atty::is(atty::Stream::Stderr) {
                Some(Arc::new(IndicatifProgress::new()))
            } else {
                None
            }
        }
        #[cfg(not(feature = "progress"))]
        {
            None
        }
    };

    let result = ConfigBuilder::from_cli(cli)
        .build()
        .and_then(|config| run(&config, progress_reporter, &LogSink));

    if let Err(e) = result {
        report(e);
        std::process::exit(1);
    }
}

fn report(e: Error) {
    let code = e.code();
    eprintln!("Error [{}]: {:#}", code, anyhow::Error::new(e));
}
