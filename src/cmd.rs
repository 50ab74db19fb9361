use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use lox_common::diagnostic::{CodespanReporter, Diagnostics, LineReporter, Reporter};
use termcolor::{ColorChoice, StandardStream};

/// Exit code for a program with syntax or resolution errors.
const EXIT_STATIC_ERROR: u8 = 65;
/// Exit code for a program aborted by a runtime error.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(Debug, Parser)]
#[clap(about, author, disable_help_subcommand = true, propagate_version = true, version)]
pub enum Cmd {
    /// Run a Lox script.
    Run {
        path: PathBuf,
        /// Report errors as plain `[line N] Error ...` lines.
        #[clap(long)]
        plain: bool,
    },
}

impl Cmd {
    pub fn run(&self) -> Result<ExitCode> {
        match self {
            Cmd::Run { path, plain } => run(path, *plain),
        }
    }
}

fn run(path: &Path, plain: bool) -> Result<ExitCode> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read file: {}", path.display()))?;
    let name = path.display().to_string();

    let (had_error, had_runtime_error) = if plain {
        run_source(&name, &source, LineReporter::new(io::stderr().lock()))
    } else {
        let stderr = StandardStream::stderr(ColorChoice::Auto);
        run_source(&name, &source, CodespanReporter::new(stderr))
    };

    let code = if had_error {
        ExitCode::from(EXIT_STATIC_ERROR)
    } else if had_runtime_error {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else {
        ExitCode::SUCCESS
    };
    Ok(code)
}

fn run_source<R: Reporter>(name: &str, source: &str, reporter: R) -> (bool, bool) {
    let mut diagnostics = Diagnostics::new(name, source, reporter);
    let stdout = lox_interpreter::run(source, io::stdout().lock(), &mut diagnostics);
    drop(stdout);
    (diagnostics.had_error(), diagnostics.had_runtime_error())
}
