#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use kirin_cli::args::CliArgs;
use kirin_cli::driver;

fn main() -> Result<()> {
    // Only initialised when KIRIN_LOG or RUST_LOG is set.
    kirin_cli::tracing_config::init_tracing();

    let mut args = CliArgs::parse();
    if !std::io::stdout().is_terminal() {
        args.no_color = true;
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    let mut stdout = std::io::stdout().lock();
    let code = match driver::run(&args, &cwd, &mut stdout) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };
    stdout.flush().context("failed to flush stdout")?;
    std::process::exit(code)
}
