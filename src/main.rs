mod cmd;

use std::process::ExitCode;

use clap::Parser;

use crate::cmd::Cmd;

fn main() -> ExitCode {
    human_panic::setup_panic!();
    init_tracing();

    match Cmd::parse().run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Installs a `tracing` subscriber, but only when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}
