//! # Configuration Module
//!
//! Configuration for isolation load balancing: the feature switch, the local
//! instance tag value, and the environment gate restricting where isolation
//! selection may be wired in.
//!
//! ## Key Features
//! - YAML/JSON configuration parsing with serde
//! - Environment variable override support (`ISOLATION_*`)
//! - Validation with detailed error messages
//! - Deployment-profile gate evaluated once at wiring time

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::error::{IsolationError, IsolationResult};

const DEFAULT_LOCAL_INSTANCE_ID: &str = "local-instance";

/// Configuration surface of the isolation balancer
///
/// All fields have serde defaults so a missing section deserializes to the
/// disabled state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// Master switch for isolation mode. Off by default.
    pub enabled: bool,

    /// Value stamped under the `local-instance-id` metadata key when a local
    /// instance registers itself.
    pub local_instance_id: String,

    /// Deployment profiles isolation is allowed to activate in.
    pub active_env: Vec<String>,

    /// Reserved: directed instance-to-instance calls by fixed IP. Read and
    /// validated but never consulted by the matching algorithm.
    pub target_ip: String,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            local_instance_id: DEFAULT_LOCAL_INSTANCE_ID.to_string(),
            active_env: vec!["dev".to_string(), "test".to_string()],
            target_ip: "127.0.0.1".to_string(),
        }
    }
}

impl IsolationConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> IsolationResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IsolationError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: IsolationConfig = serde_yaml::from_str(&content)
            .map_err(|e| IsolationError::config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub async fn load_from_json<P: AsRef<Path>>(path: P) -> IsolationResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IsolationError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: IsolationConfig = serde_json::from_str(&content)
            .map_err(|e| IsolationError::config(format!("Failed to parse JSON config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Variables follow the pattern `ISOLATION_<FIELD>`, e.g.
    /// `ISOLATION_ENABLED=true` or `ISOLATION_ACTIVE_ENV=dev,staging`.
    pub fn apply_env_overrides(&mut self) -> IsolationResult<()> {
        use std::env;

        if let Ok(enabled) = env::var("ISOLATION_ENABLED") {
            self.enabled = enabled
                .parse()
                .map_err(|e| IsolationError::config(format!("Invalid ISOLATION_ENABLED: {}", e)))?;
        }

        if let Ok(id) = env::var("ISOLATION_LOCAL_INSTANCE_ID") {
            self.local_instance_id = id;
        }

        if let Ok(envs) = env::var("ISOLATION_ACTIVE_ENV") {
            self.active_env = envs
                .split(',')
                .map(|env| env.trim().to_string())
                .filter(|env| !env.is_empty())
                .collect();
        }

        if let Ok(ip) = env::var("ISOLATION_TARGET_IP") {
            self.target_ip = ip;
        }

        Ok(())
    }

    /// Configuration validation with detailed error messages
    pub fn validate(&self) -> IsolationResult<()> {
        let mut errors = Vec::new();

        if self.local_instance_id.trim().is_empty() {
            errors.push("local_instance_id cannot be empty".to_string());
        }

        if self.enabled && self.active_env.is_empty() {
            errors.push(
                "active_env cannot be empty when isolation is enabled".to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IsolationError::config(errors.join("; ")))
        }
    }

    /// Environment gate: whether isolation selection should be wired in for
    /// the given set of active deployment profiles.
    ///
    /// True only when the feature is enabled and the active profile set
    /// intersects `active_env`. Evaluated once at startup by the integration
    /// layer; a failure to evaluate must leave isolation off, never break
    /// startup.
    pub fn is_active_for<I, S>(&self, active_profiles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.enabled {
            return false;
        }
        let matched = active_profiles
            .into_iter()
            .any(|profile| self.active_env.iter().any(|env| env == profile.as_ref()));
        if !matched {
            debug!(active_env = ?self.active_env, "active profiles do not intersect active_env, isolation stays off");
        }
        matched
    }
}
