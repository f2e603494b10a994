use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_concurrency: usize,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub target_question_count: usize,
}

#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub output_directory: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                temperature: 0.1,
                timeout_secs: 60,
                max_retries: 2,
                max_concurrency: 8,
            },
            pipeline: PipelineConfig { target_question_count: 15 },
            output: OutputConfig { directory: PathBuf::from(".") },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The credential, once `validate` has guaranteed it is present.
    pub fn api_key(&self) -> Option<&SecretString> {
        self.llm.api_key.as_ref()
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
            if let Some(max_concurrency) = llm.max_concurrency {
                self.llm.max_concurrency = max_concurrency;
            }
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(target_question_count) = pipeline.target_question_count {
                self.pipeline.target_question_count = target_question_count;
            }
        }

        if let Some(output) = patch.output {
            if let Some(directory) = output.directory {
                self.output.directory = directory;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let api_key = read_env("PAGEGEN_LLM_API_KEY").or_else(|| read_env("GROQ_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PAGEGEN_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("PAGEGEN_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("PAGEGEN_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("PAGEGEN_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("PAGEGEN_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("PAGEGEN_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PAGEGEN_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("PAGEGEN_LLM_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("PAGEGEN_LLM_MAX_CONCURRENCY") {
            self.llm.max_concurrency = parse_usize("PAGEGEN_LLM_MAX_CONCURRENCY", &value)?;
        }

        if let Some(value) = read_env("PAGEGEN_PIPELINE_TARGET_QUESTION_COUNT") {
            self.pipeline.target_question_count =
                parse_usize("PAGEGEN_PIPELINE_TARGET_QUESTION_COUNT", &value)?;
        }

        if let Some(value) = read_env("PAGEGEN_OUTPUT_DIRECTORY") {
            self.output.directory = PathBuf::from(value);
        }

        let log_level =
            read_env("PAGEGEN_LOGGING_LEVEL").or_else(|| read_env("PAGEGEN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PAGEGEN_LOGGING_FORMAT").or_else(|| read_env("PAGEGEN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(base_url) = overrides.base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(output_directory) = overrides.output_directory {
            self.output.directory = output_directory;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_pipeline(&self.pipeline)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("pagegen.toml"), PathBuf::from("config/pagegen.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    let missing_key =
        llm.api_key.as_ref().map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true);
    if missing_key {
        return Err(ConfigError::Validation(
            "llm.api_key is required. Set PAGEGEN_LLM_API_KEY or GROQ_API_KEY".to_string(),
        ));
    }

    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.max_concurrency == 0 {
        return Err(ConfigError::Validation(
            "llm.max_concurrency must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline(pipeline: &PipelineConfig) -> Result<(), ConfigError> {
    if pipeline.target_question_count == 0 {
        return Err(ConfigError::Validation(
            "pipeline.target_question_count must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| invalid_override(key, value))
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    pipeline: Option<PipelinePatch>,
    output: Option<OutputPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    max_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    target_question_count: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    directory: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, DEFAULT_MODEL};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "PAGEGEN_LLM_API_KEY",
        "GROQ_API_KEY",
        "PAGEGEN_LLM_MODEL",
        "PAGEGEN_LLM_TEMPERATURE",
        "PAGEGEN_LLM_TIMEOUT_SECS",
        "PAGEGEN_LLM_MAX_CONCURRENCY",
        "PAGEGEN_PIPELINE_TARGET_QUESTION_COUNT",
        "PAGEGEN_LOG_LEVEL",
        "PAGEGEN_LOG_FORMAT",
        "TEST_PAGEGEN_KEY",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn missing_api_key_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure without api key".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("llm.api_key")),
            "validation failure should mention llm.api_key",
        )
    }

    #[test]
    fn groq_api_key_is_accepted_as_fallback() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("GROQ_API_KEY", "gsk-from-env");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.api_key().map(|key| key.expose_secret() == "gsk-from-env").unwrap_or(false),
                "GROQ_API_KEY should populate llm.api_key",
            )?;
            ensure(config.llm.model == DEFAULT_MODEL, "default model should be kept")?;
            ensure(config.pipeline.target_question_count == 15, "default target is 15")?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("TEST_PAGEGEN_KEY", "gsk-interpolated");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("pagegen.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "${TEST_PAGEGEN_KEY}"
model = "llama-3.1-8b-instant"

[pipeline]
target_question_count = 5
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.api_key().map(|key| key.expose_secret() == "gsk-interpolated").unwrap_or(false),
                "api key should be interpolated from environment",
            )?;
            ensure(config.llm.model == "llama-3.1-8b-instant", "model should come from file")?;
            ensure(config.pipeline.target_question_count == 5, "target should come from file")?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("PAGEGEN_LLM_API_KEY", "gsk-from-env");
        env::set_var("PAGEGEN_LLM_MODEL", "model-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("pagegen.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "gsk-from-file"
model = "model-from-file"

[logging]
level = "warn"
format = "json"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    model: Some("model-from-override".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "model-from-override", "override model should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "file log format should survive when nothing overrides it",
            )?;
            ensure(
                config.api_key().map(|key| key.expose_secret() == "gsk-from-env").unwrap_or(false),
                "env api key should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("PAGEGEN_LLM_API_KEY", "gsk-test");
        env::set_var("PAGEGEN_LLM_MAX_CONCURRENCY", "many");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "PAGEGEN_LLM_MAX_CONCURRENCY"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("PAGEGEN_LLM_API_KEY", "gsk-test");
        env::set_var("PAGEGEN_LOG_LEVEL", "warn");
        env::set_var("PAGEGEN_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("PAGEGEN_LLM_API_KEY", "gsk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("gsk-secret-value"), "debug output should not contain api key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn out_of_range_values_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let cases: &[(&str, &str, &str)] = &[
            ("PAGEGEN_LLM_TEMPERATURE", "2.5", "llm.temperature"),
            ("PAGEGEN_LLM_TEMPERATURE", "-0.1", "llm.temperature"),
            ("PAGEGEN_LLM_TIMEOUT_SECS", "0", "llm.timeout_secs"),
            ("PAGEGEN_LLM_TIMEOUT_SECS", "301", "llm.timeout_secs"),
            ("PAGEGEN_LLM_MAX_CONCURRENCY", "0", "llm.max_concurrency"),
            ("PAGEGEN_PIPELINE_TARGET_QUESTION_COUNT", "0", "pipeline.target_question_count"),
        ];

        let result = cases.iter().try_for_each(|(var, value, key)| {
            clear_vars(MANAGED_VARS);
            env::set_var("PAGEGEN_LLM_API_KEY", "gsk-test");
            env::set_var(var, value);

            match AppConfig::load(LoadOptions::default()) {
                Ok(_) => Err(format!("{var}={value} should be rejected")),
                Err(ConfigError::Validation(message)) if message.contains(key) => Ok(()),
                Err(other) => Err(format!("{var}={value} failed for the wrong reason: {other}")),
            }
        });

        clear_vars(MANAGED_VARS);
        result
    }

    #[test]
    fn range_boundaries_are_accepted() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(MANAGED_VARS);
        env::set_var("PAGEGEN_LLM_API_KEY", "gsk-test");
        env::set_var("PAGEGEN_LLM_TEMPERATURE", "2.0");
        env::set_var("PAGEGEN_LLM_TIMEOUT_SECS", "300");
        env::set_var("PAGEGEN_LLM_MAX_CONCURRENCY", "1");
        env::set_var("PAGEGEN_PIPELINE_TARGET_QUESTION_COUNT", "1");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.temperature == 2.0, "upper temperature bound is inclusive")?;
            ensure(config.llm.timeout_secs == 300, "upper timeout bound is inclusive")?;
            ensure(config.llm.max_concurrency == 1, "a single concurrent call is allowed")?;
            ensure(config.pipeline.target_question_count == 1, "a single question is allowed")?;
            Ok(())
        })();

        clear_vars(MANAGED_VARS);
        result
    }
}
