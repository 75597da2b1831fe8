#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code; test code may use it.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::io::{self, Write};

use multiway::config::DriverConfig;
use multiway::driver::{DriverError, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Logs go to stderr so stdout carries only the session output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "multiway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load configuration from environment variables
    let config = match DriverConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: degree={}, seed={:?}, bench_size={}",
        config.degree,
        config.seed,
        config.bench_size
    );

    let mut session = Session::new(config);
    if let Err(e) = run(&mut session) {
        tracing::error!("Session ended with error: {e}");
        std::process::exit(1);
    }
}

fn run(session: &mut Session) -> Result<(), DriverError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    session.run(stdin.lock(), &mut out)?;
    out.flush()?;
    Ok(())
}
