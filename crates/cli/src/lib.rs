pub mod commands;
pub mod logging;

use clap::Parser;
use pagegen_core::config::LoadOptions;

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "pagegen",
    version,
    about = "Generate FAQ, product, and comparison pages for a product",
    long_about = "Runs the four-step generation pipeline for the built-in GlowBoost sample and \
                  writes faq.json, product_page.json, and comparison_page.json.\n\
                  Configuration comes from pagegen.toml, PAGEGEN_* variables, and .env.",
    after_help = "Examples:\n  GROQ_API_KEY=gsk_... pagegen\n  PAGEGEN_OUTPUT_DIRECTORY=out PAGEGEN_LOG_FORMAT=json pagegen"
)]
pub struct Cli {}

pub async fn run(_cli: Cli) -> CommandResult {
    commands::generate::run(LoadOptions::default()).await
}
