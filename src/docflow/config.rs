// SPDX-License-Identifier: MIT

//! Runtime configuration
//!
//! Values come from an optional YAML file, then `DOCFLOW_*` environment
//! variables, then command-line flags (applied by the binary).

use crate::adk::error::DocflowError;
use crate::adk::model::ModelProvider;
use crate::docflow::workflow::steps::StepSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Notification channel settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct NotifyConfig {
    /// Webhook receiving the message and attachment; logs only when unset
    pub webhook_url: Option<String>,
    pub recipient: Option<String>,
    #[serde(default = "default_notify_temperature")]
    pub temperature: f32,
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DocflowConfig {
    /// Inferred from `model` when absent
    pub provider: Option<ModelProvider>,
    pub model: String,
    pub temperature: f32,
    pub output_dir: PathBuf,
    pub classify_prefix_chars: usize,
    pub review_preview_chars: usize,
    pub notify_preview_chars: usize,
    pub progress_interval_ms: u64,
    pub notify: NotifyConfig,
}

fn default_notify_temperature() -> f32 {
    0.4
}

impl Default for DocflowConfig {
    fn default() -> Self {
        let steps = StepSettings::default();
        Self {
            provider: None,
            model: "command-r-plus".to_string(),
            temperature: 0.3,
            output_dir: PathBuf::from("output"),
            classify_prefix_chars: steps.classify_prefix_chars,
            review_preview_chars: steps.review_preview_chars,
            notify_preview_chars: steps.notify_preview_chars,
            progress_interval_ms: 50,
            notify: NotifyConfig {
                webhook_url: None,
                recipient: None,
                temperature: default_notify_temperature(),
            },
        }
    }
}

impl DocflowConfig {
    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, DocflowError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from an optional file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, DocflowError> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    DocflowError::config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_yaml(&content)?
            }
            None => Self::default(),
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        config.apply_env(&env)?;
        Ok(config)
    }

    /// Apply `DOCFLOW_*` overrides from the given variables
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), DocflowError> {
        if let Some(provider) = env.get("DOCFLOW_PROVIDER") {
            self.provider = Some(parse_provider(provider)?);
        }
        if let Some(model) = env.get("DOCFLOW_MODEL") {
            self.model = model.clone();
        }
        if let Some(dir) = env.get("DOCFLOW_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(url) = env.get("DOCFLOW_WEBHOOK_URL") {
            self.notify.webhook_url = Some(url.clone());
        }
        if let Some(recipient) = env.get("DOCFLOW_RECIPIENT") {
            self.notify.recipient = Some(recipient.clone());
        }
        Ok(())
    }

    /// Explicit provider, or the one implied by the model name
    pub fn resolved_provider(&self) -> ModelProvider {
        self.provider
            .unwrap_or_else(|| ModelProvider::infer(&self.model))
    }

    pub fn step_settings(&self) -> StepSettings {
        StepSettings {
            classify_prefix_chars: self.classify_prefix_chars,
            review_preview_chars: self.review_preview_chars,
            notify_preview_chars: self.notify_preview_chars,
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

/// Parse a provider name given on the command line or in the environment
pub fn parse_provider(name: &str) -> Result<ModelProvider, DocflowError> {
    ModelProvider::parse(name)
        .ok_or_else(|| DocflowError::config(format!("unknown model provider '{}'", name)))
}
