use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

use crate::generation::{DEFAULT_QUESTIONS, MAX_QUESTIONS, MIN_QUESTIONS};

// Import logging macros
use crate::log_validation;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub quiz: QuizConfig,
    pub logging: LoggingConfig,
}

/// Remote quiz service location
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
}

/// Defaults offered to the user when generating a quiz
#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfig {
    pub default_num_questions: u32,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    ///
    /// Runs before the subscriber is installed, so it does not log; callers log the outcome.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            service: ServiceConfig::from_env()?,
            quiz: QuizConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Log a summary of loaded configuration (credentials masked)
    pub fn log_configuration_summary(&self) {
        info!(
            service_url = %mask_credentials(&self.service.base_url),
            default_num_questions = self.quiz.default_num_questions,
            log_level = %self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let base_url = self.service.base_url.trim();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(anyhow!(
                "QUIZ_API_BASE_URL must start with 'http://' or 'https://', got '{}'",
                base_url
            ));
        }

        let count = self.quiz.default_num_questions;
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
            return Err(anyhow!(
                "QUIZ_DEFAULT_QUESTIONS must be between {} and {}, got {}",
                MIN_QUESTIONS,
                MAX_QUESTIONS,
                count
            ));
        }

        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|level| self.logging.level.to_lowercase().starts_with(level))
            && !self.logging.level.contains('=')
        {
            warn!("Invalid log level '{}', using 'info' as fallback", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: ServiceConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
            },
            quiz: QuizConfig {
                default_num_questions: DEFAULT_QUESTIONS,
            },
            logging: LoggingConfig {
                level: "info,wiki_quiz_client=debug".to_string(),
                file_enabled: true,
                console_enabled: true,
                log_directory: "logs".to_string(),
            },
        }
    }
}

impl ServiceConfig {
    fn from_env() -> Result<Self> {
        let base_url = env::var("QUIZ_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(ServiceConfig { base_url })
    }
}

impl QuizConfig {
    fn from_env() -> Result<Self> {
        let count_str = env::var("QUIZ_DEFAULT_QUESTIONS")
            .unwrap_or_else(|_| DEFAULT_QUESTIONS.to_string());

        let default_num_questions = count_str.trim().parse::<u32>().map_err(|_| {
            anyhow!(
                "Invalid QUIZ_DEFAULT_QUESTIONS value: '{}'. Must be a number between {}-{}",
                count_str,
                MIN_QUESTIONS,
                MAX_QUESTIONS
            )
        })?;

        Ok(QuizConfig { default_num_questions })
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,wiki_quiz_client=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY")
            .unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}

/// Hide `user:password@` credentials embedded in a URL before logging it
fn mask_credentials(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", &url[..scheme_end], &rest[at + 1..]),
        None => url.to_string(),
    }
}
