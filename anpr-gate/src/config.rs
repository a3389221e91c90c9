//! Configuration resolution for anpr-gate
//!
//! Provides multi-tier credential resolution with ENV → TOML priority.

use anpr_common::config::TomlConfig;
use anpr_common::{Error, Result};
use tracing::{info, warn};

/// Settings required to talk to the plate recognition backend.
#[derive(Debug, Clone)]
pub struct RecognitionSettings {
    pub api_key: String,
    pub model_id: String,
}

/// Resolve Mindee credentials from 2-tier configuration
///
/// **Priority:** ENV → TOML
pub fn resolve_recognition_settings(toml_config: &TomlConfig) -> Result<RecognitionSettings> {
    let mut sources = Vec::new();

    // Tier 1: Environment variable
    let env_key = std::env::var("ANPR_MINDEE_API_KEY").ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    // Tier 2: TOML config
    let toml_key = toml_config.api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "Mindee API key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    let api_key = if let Some(key) = env_key.filter(|k| is_valid_key(k)) {
        info!("Mindee API key loaded from environment variable");
        key
    } else if let Some(key) = toml_key.filter(|k| is_valid_key(k)) {
        info!("Mindee API key loaded from TOML config");
        key.clone()
    } else {
        return Err(Error::Config(
            "Mindee API key not configured. Please configure using one of:\n\
             1. Environment: ANPR_MINDEE_API_KEY=your-key-here\n\
             2. TOML config: ~/.config/anpr/config.toml (api_key = \"your-key\")\n\
             \n\
             Obtain API key at: https://platform.mindee.com"
                .to_string(),
        ));
    };

    let model_id = std::env::var("ANPR_MINDEE_MODEL_ID")
        .ok()
        .filter(|m| is_valid_key(m))
        .or_else(|| toml_config.model_id.clone().filter(|m| is_valid_key(m)))
        .ok_or_else(|| {
            Error::Config(
                "Mindee model id not configured. Please configure using one of:\n\
                 1. Environment: ANPR_MINDEE_MODEL_ID=your-model-id\n\
                 2. TOML config: ~/.config/anpr/config.toml (model_id = \"your-model-id\")\n\
                 \n\
                 The model id is shown on your model page at: https://platform.mindee.com"
                    .to_string(),
            )
        })?;

    Ok(RecognitionSettings { api_key, model_id })
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_resolve_from_toml() {
        // Env vars would shadow the TOML tier, so only assert when they are unset.
        if std::env::var("ANPR_MINDEE_API_KEY").is_ok()
            || std::env::var("ANPR_MINDEE_MODEL_ID").is_ok()
        {
            return;
        }
        let config = TomlConfig {
            root_folder: None,
            api_key: Some("toml-key".to_string()),
            model_id: Some("toml-model".to_string()),
        };
        let settings = resolve_recognition_settings(&config).unwrap();
        assert_eq!(settings.api_key, "toml-key");
        assert_eq!(settings.model_id, "toml-model");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        if std::env::var("ANPR_MINDEE_API_KEY").is_ok() {
            return;
        }
        let config = TomlConfig::default();
        let err = resolve_recognition_settings(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_blank_toml_key_rejected() {
        if std::env::var("ANPR_MINDEE_API_KEY").is_ok() {
            return;
        }
        let config = TomlConfig {
            root_folder: None,
            api_key: Some("   ".to_string()),
            model_id: None,
        };
        assert!(resolve_recognition_settings(&config).is_err());
    }

    #[test]
    fn test_missing_model_is_config_error() {
        if std::env::var("ANPR_MINDEE_API_KEY").is_ok()
            || std::env::var("ANPR_MINDEE_MODEL_ID").is_ok()
        {
            return;
        }
        let config = TomlConfig {
            root_folder: None,
            api_key: Some("key".to_string()),
            model_id: None,
        };
        let err = resolve_recognition_settings(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
