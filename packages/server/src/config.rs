use anyhow::{Context, Result};
use catastro::{ExtractionConfig, GenerativeCredentials};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub catastral_api_url: String,
    /// Absent key leaves the fallback chain unconfigured
    pub openai: Option<GenerativeCredentials>,
    pub openai_model: Option<String>,
    pub openai_fallback_model: Option<String>,
    pub openai_temperature: Option<f32>,
    pub openai_max_tokens: Option<u32>,
    pub primary_timeout_secs: Option<u64>,
    pub health_timeout_secs: Option<u64>,
    pub text_extraction_url: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let openai_base_url = optional("OPENAI_BASE_URL");
        let openai = GenerativeCredentials::from_env().map(|credentials| match openai_base_url {
            Some(url) => credentials.with_base_url(url),
            None => credentials,
        });

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            catastral_api_url: env::var("CATASTRAL_API_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            openai,
            openai_model: optional("OPENAI_MODEL"),
            openai_fallback_model: optional("OPENAI_FALLBACK_MODEL"),
            openai_temperature: parsed("OPENAI_TEMPERATURE")?,
            openai_max_tokens: parsed("OPENAI_MAX_TOKENS")?,
            primary_timeout_secs: parsed("PRIMARY_TIMEOUT_SECS")?,
            health_timeout_secs: parsed("HEALTH_TIMEOUT_SECS")?,
            text_extraction_url: optional("TEXT_EXTRACTION_URL"),
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Pipeline settings with environment overrides applied.
    pub fn extraction_config(&self) -> ExtractionConfig {
        let mut config = ExtractionConfig::default();

        if self.openai_model.is_some() || self.openai_fallback_model.is_some() {
            let defaults = config.fallback_models.clone();
            let primary = self
                .openai_model
                .clone()
                .or_else(|| defaults.first().cloned());
            let secondary = self
                .openai_fallback_model
                .clone()
                .or_else(|| defaults.get(1).cloned());
            config = config.with_fallback_models(primary.into_iter().chain(secondary));
        }
        if let Some(temperature) = self.openai_temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.openai_max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(secs) = self.primary_timeout_secs {
            config = config.with_primary_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.health_timeout_secs {
            config = config.with_connectivity_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a valid number", key))
        })
        .transpose()
}
