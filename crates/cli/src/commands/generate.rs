use std::sync::Arc;

use pagegen_agent::{
    CallLimits, ChatCompletionsClient, CompletionService, LlmClient, PageSteps, Pipeline,
    PromptLibrary,
};
use pagegen_core::config::{AppConfig, LoadOptions};
use pagegen_core::{ArtifactWriter, ProductRecord};
use tracing::{error, info};

use crate::commands::CommandResult;
use crate::logging;

pub const COMMAND: &str = "generate";

pub const EXIT_PIPELINE_FAILURE: u8 = 1;
pub const EXIT_CONFIG_FAILURE: u8 = 2;
pub const EXIT_WRITE_FAILURE: u8 = 3;

/// Loads configuration, installs logging, and runs one generation pass
/// against the configured chat-completions endpoint.
pub async fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            logging::init_logging(&AppConfig::default().logging);
            error!(event_name = "cli.config.invalid", error = %error, "configuration issue; nothing generated");
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG_FAILURE,
            );
        }
    };
    logging::init_logging(&config.logging);

    let Some(api_key) = config.api_key().cloned() else {
        error!(event_name = "cli.config.invalid", "llm.api_key is missing after validation");
        return CommandResult::failure(
            COMMAND,
            "config_validation",
            "configuration issue: llm.api_key is required",
            EXIT_CONFIG_FAILURE,
        );
    };
    let client = match ChatCompletionsClient::from_config(&config.llm, api_key) {
        Ok(client) => client,
        Err(error) => {
            error!(event_name = "cli.client.init_failed", error = %error, "completion client unavailable");
            return CommandResult::failure(
                COMMAND,
                "client_init",
                error.to_string(),
                EXIT_CONFIG_FAILURE,
            );
        }
    };
    info!(
        event_name = "cli.generate.configured",
        endpoint = client.endpoint(),
        model = %config.llm.model,
        output_directory = %config.output.directory.display(),
        "completion client ready"
    );

    execute(&config, Arc::new(client)).await
}

/// Runs the pipeline for the built-in sample product with an already
/// constructed client and maps the outcome onto an exit code.
pub async fn execute(config: &AppConfig, client: Arc<dyn LlmClient>) -> CommandResult {
    let prompts = match PromptLibrary::new() {
        Ok(prompts) => prompts,
        Err(error) => {
            error!(event_name = "cli.prompts.invalid", error = %error, "prompt templates failed to compile");
            return CommandResult::failure(COMMAND, "prompt", error.to_string(), EXIT_PIPELINE_FAILURE);
        }
    };

    let service = CompletionService::new(client, CallLimits::from(&config.llm));
    let steps = PageSteps::new(service, prompts, config.pipeline.target_question_count);
    let pipeline = Pipeline::new(steps, ArtifactWriter::new(&config.output.directory));
    let product = ProductRecord::glowboost_sample();

    let report = match pipeline.run(&product).await {
        Ok(report) => report,
        Err(error) => {
            let stage = error.stage().map(|stage| stage.as_str()).unwrap_or("unknown");
            return CommandResult::failure(
                COMMAND,
                error.error_class(),
                format!("generation failed during {stage}: {error}"),
                EXIT_PIPELINE_FAILURE,
            );
        }
    };

    let failures = report.write_failures().map(ToString::to_string).collect::<Vec<_>>();
    if !failures.is_empty() {
        error!(
            event_name = "cli.generate.write_failed",
            run_id = %report.run_id,
            failed = failures.len(),
            "one or more artifacts could not be written"
        );
        return CommandResult::failure(
            COMMAND,
            "artifact_write",
            failures.join("; "),
            EXIT_WRITE_FAILURE,
        );
    }

    CommandResult::success(
        COMMAND,
        format!(
            "wrote {} artifacts for `{}` ({} FAQ entries) to {}",
            report.artifacts.len(),
            product.name,
            report.faq_page.faqs.len(),
            config.output.directory.display()
        ),
    )
}
