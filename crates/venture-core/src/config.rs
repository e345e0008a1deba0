//! Runtime configuration for the Venture client.
//!
//! Configuration comes from the environment: the API base URL (with a
//! local default) and the identity backend endpoint/credential. Strict
//! deployments fail fast when identity settings are missing; permissive
//! deployments log a warning and run with an inert identity placeholder.

use std::env;

use crate::error::{CoreError, Result};

const DEFAULT_API_URL: &str = "http://localhost:8000";

const ENV_API_URL: &str = "VENTURE_API_URL";
const ENV_IDENTITY_URL: &str = "VENTURE_IDENTITY_URL";
const ENV_IDENTITY_KEY: &str = "VENTURE_IDENTITY_KEY";
const ENV_STRICT: &str = "VENTURE_STRICT";

/// How the deployment treats missing identity configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Fail fast at startup if the identity backend is not configured.
    Strict,
    /// Warn and continue signed out (development default).
    #[default]
    Permissive,
}

/// Environment-provided settings for the client runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Base URL for the HTTP transport. Endpoints are paths relative to it.
    pub api_base_url: String,
    /// Identity backend endpoint.
    pub identity_url: Option<String>,
    /// Identity backend publishable key.
    pub identity_key: Option<String>,
    /// Deployment policy for missing identity settings.
    pub strictness: Strictness,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            identity_url: None,
            identity_key: None,
            strictness: Strictness::default(),
        }
    }
}

impl RuntimeConfig {
    /// Reads configuration from the environment.
    ///
    /// `VENTURE_API_URL` falls back to `http://localhost:8000` when unset;
    /// `VENTURE_STRICT=1` (or `true`) selects the strict policy.
    pub fn from_env() -> Self {
        let strictness = match env::var(ENV_STRICT).ok().as_deref() {
            Some("1") | Some("true") => Strictness::Strict,
            _ => Strictness::Permissive,
        };

        Self {
            api_base_url: env::var(ENV_API_URL)
                .ok()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            identity_url: env::var(ENV_IDENTITY_URL).ok().filter(|v| !v.is_empty()),
            identity_key: env::var(ENV_IDENTITY_KEY).ok().filter(|v| !v.is_empty()),
            strictness,
        }
    }

    /// True when both identity settings are present.
    pub fn has_identity_config(&self) -> bool {
        self.identity_url.is_some() && self.identity_key.is_some()
    }

    /// Names of the identity settings that are missing, if any.
    fn missing_identity_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.identity_url.is_none() {
            missing.push(ENV_IDENTITY_URL);
        }
        if self.identity_key.is_none() {
            missing.push(ENV_IDENTITY_KEY);
        }
        missing
    }

    /// Applies the deployment policy to missing identity settings.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` in strict deployments when the identity
    /// backend is not fully configured. Permissive deployments only log a
    /// warning and continue.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_identity_vars();
        if missing.is_empty() {
            return Ok(());
        }

        match self.strictness {
            Strictness::Strict => Err(CoreError::config(format!(
                "Missing identity configuration: {}",
                missing.join(", ")
            ))),
            Strictness::Permissive => {
                log::warn!(
                    "Missing environment variables: {}; identity features disabled",
                    missing.join(", ")
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_url() {
        let config = RuntimeConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert!(!config.has_identity_config());
    }

    #[test]
    fn test_strict_fails_fast_without_identity_config() {
        let config = RuntimeConfig {
            strictness: Strictness::Strict,
            ..RuntimeConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains(ENV_IDENTITY_URL));
        assert!(err.to_string().contains(ENV_IDENTITY_KEY));
    }

    #[test]
    fn test_permissive_accepts_missing_identity_config() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_passes_with_identity_config() {
        let config = RuntimeConfig {
            identity_url: Some("https://id.example.com".to_string()),
            identity_key: Some("publishable-key".to_string()),
            strictness: Strictness::Strict,
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.has_identity_config());
    }

    #[test]
    fn test_from_env_defaults() {
        // No VENTURE_* variables are set in the test environment, so the
        // defaults apply.
        let config = RuntimeConfig::from_env();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.strictness, Strictness::Permissive);
    }
}
