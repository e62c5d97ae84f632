// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and implementations
//!
//! This module provides the core Model trait and shared types.
//! Model implementations are in their own submodules:
//! - [anthropic] - Anthropic's Claude API
//! - [cohere] - Cohere's Command API
//! - [openai] - OpenAI's ChatGPT API

pub mod anthropic;
pub mod cohere;
pub mod openai;

use crate::adk::error::BoxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl GenerationConfig {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub text: String,
}

impl Content {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            text: text.into(),
        }
    }
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    /// Generate a text completion for the given conversation
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<String, BoxError>;
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Cohere,
    OpenAI,
    Anthropic,
}

impl ModelProvider {
    /// Infer the provider from a model name
    pub fn infer(model_name: &str) -> Self {
        if model_name.starts_with("gpt") || model_name.starts_with("o1") {
            Self::OpenAI
        } else if model_name.starts_with("claude") {
            Self::Anthropic
        } else {
            Self::Cohere
        }
    }

    /// Parse a provider name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "cohere" => Some(Self::Cohere),
            "openai" => Some(Self::OpenAI),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// Construct a model client for the given provider
pub fn create_model(provider: ModelProvider, model_name: String) -> Result<Arc<dyn Model>, BoxError> {
    let model: Arc<dyn Model> = match provider {
        ModelProvider::Cohere => Arc::new(cohere::CohereModel::new(model_name)?),
        ModelProvider::OpenAI => Arc::new(openai::OpenAIModel::new(model_name)?),
        ModelProvider::Anthropic => Arc::new(anthropic::AnthropicModel::new(model_name)?),
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_provider() {
        assert_eq!(ModelProvider::infer("gpt-4o-mini"), ModelProvider::OpenAI);
        assert_eq!(
            ModelProvider::infer("claude-3-5-sonnet-latest"),
            ModelProvider::Anthropic
        );
        assert_eq!(ModelProvider::infer("command-r-plus"), ModelProvider::Cohere);
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(ModelProvider::parse("OpenAI"), Some(ModelProvider::OpenAI));
        assert_eq!(ModelProvider::parse("cohere"), Some(ModelProvider::Cohere));
        assert_eq!(ModelProvider::parse("mistral"), None);
    }

    #[test]
    fn test_provider_deserialize() {
        let provider: ModelProvider = serde_yaml::from_str("anthropic").unwrap();
        assert_eq!(provider, ModelProvider::Anthropic);
    }
}
