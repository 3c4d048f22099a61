//! Environment-driven configuration.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_IMAGE_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not set. Please provide your OpenAI API key.")]
    MissingApiKey,
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the remote illustration service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub timeout: Duration,
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            size: DEFAULT_IMAGE_SIZE.to_string(),
            timeout: Duration::from_secs(DEFAULT_IMAGE_TIMEOUT_SECS),
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryConfig {
    pub illustration: IllustrationConfig,
    /// Directory whose `templates.ron` / `word_bank.ron` are layered over
    /// the built-in catalog.
    pub catalog_dir: Option<PathBuf>,
    /// Fixed RNG seed; entropy when unset.
    pub seed: Option<u64>,
}

impl StoryConfig {
    /// Read the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = IllustrationConfig::default();

        let timeout = match get("STORY_IMAGE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_u64("STORY_IMAGE_TIMEOUT_SECS", &raw)?),
            None => defaults.timeout,
        };
        let seed = get("STORY_SEED")
            .map(|raw| parse_u64("STORY_SEED", &raw))
            .transpose()?;

        Ok(Self {
            illustration: IllustrationConfig {
                api_key: get("OPENAI_API_KEY"),
                base_url: get("STORY_IMAGE_BASE_URL").unwrap_or(defaults.base_url),
                model: get("STORY_IMAGE_MODEL").unwrap_or(defaults.model),
                size: get("STORY_IMAGE_SIZE").unwrap_or(defaults.size),
                timeout,
            },
            catalog_dir: get("STORY_CATALOG_DIR").map(PathBuf::from),
            seed,
        })
    }
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = StoryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoryConfig::default());
        assert_eq!(config.illustration.model, "gpt-image-1");
        assert_eq!(config.illustration.timeout, Duration::from_secs(60));
        assert!(config.illustration.api_key.is_none());
    }

    #[test]
    fn reads_all_keys() {
        let config = StoryConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("STORY_IMAGE_BASE_URL", "http://localhost:9000/v1"),
            ("STORY_IMAGE_MODEL", "dall-e-3"),
            ("STORY_IMAGE_SIZE", "512x512"),
            ("STORY_IMAGE_TIMEOUT_SECS", "15"),
            ("STORY_CATALOG_DIR", "/srv/catalog"),
            ("STORY_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.illustration.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.illustration.base_url, "http://localhost:9000/v1");
        assert_eq!(config.illustration.model, "dall-e-3");
        assert_eq!(config.illustration.size, "512x512");
        assert_eq!(config.illustration.timeout, Duration::from_secs(15));
        assert_eq!(config.catalog_dir, Some(PathBuf::from("/srv/catalog")));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn blank_api_key_is_unset() {
        let config = StoryConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.illustration.api_key.is_none());
    }

    #[test]
    fn invalid_number_rejected() {
        let err = StoryConfig::from_lookup(lookup(&[("STORY_SEED", "forty-two")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STORY_SEED", .. }));

        let err = StoryConfig::from_lookup(lookup(&[("STORY_IMAGE_TIMEOUT_SECS", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "STORY_IMAGE_TIMEOUT_SECS", .. }));
    }
}
