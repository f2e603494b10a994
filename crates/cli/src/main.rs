use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use pagegen_cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = pagegen_cli::run(cli).await;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", result.output).context("failed to write command outcome")?;
    Ok(ExitCode::from(result.exit_code))
}
