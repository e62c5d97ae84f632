// SPDX-License-Identifier: MIT

//! OpenAI Model - ChatGPT API implementation

use super::{Content, GenerationConfig, Model};
use crate::adk::error::BoxError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;

/// OpenAI ChatGPT model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, BoxError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY must be set")?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    fn content_to_openai_message(content: &Content) -> serde_json::Value {
        let role = match content.role.as_str() {
            "model" => "assistant",
            other => other,
        };
        json!({ "role": role, "content": content.text })
    }

    fn parse_openai_response(response: &serde_json::Value) -> Result<String, BoxError> {
        let message = &response["choices"][0]["message"];
        if message.is_null() {
            return Err("No choices in OpenAI response".into());
        }
        Ok(message["content"].as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<String, BoxError> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(Self::content_to_openai_message)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(format!("OpenAI API error: {}", text).into());
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}
