// SPDX-License-Identifier: MIT

//! Cohere Model - Command chat API (v2) implementation

use super::{Content, GenerationConfig, Model};
use crate::adk::error::BoxError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;

/// Cohere Command model implementation
pub struct CohereModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl CohereModel {
    /// Create a new CohereModel
    ///
    /// Requires `COHERE_API_KEY` environment variable to be set.
    /// Optionally uses `COHERE_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, BoxError> {
        let api_key = env::var("COHERE_API_KEY").map_err(|_| "COHERE_API_KEY must be set")?;
        let base_url =
            env::var("COHERE_BASE_URL").unwrap_or_else(|_| "https://api.cohere.com/v2".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    fn build_body(&self, history: &[Content], config: Option<&GenerationConfig>) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(|c| {
                let role = if c.role == "model" { "assistant" } else { c.role.as_str() };
                json!({ "role": role, "content": c.text })
            })
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
                body["p"] = json!(top_p);
            }
        }

        body
    }

    /// Cohere v2 returns `message.content` as a list of typed blocks
    fn parse_cohere_response(response: &serde_json::Value) -> Result<String, BoxError> {
        let blocks = response["message"]["content"]
            .as_array()
            .ok_or("No message content in Cohere response")?;

        Ok(blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect())
    }
}

#[async_trait]
impl Model for CohereModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<String, BoxError> {
        let url = format!("{}/chat", self.base_url);
        let body = self.build_body(history, config);

        log::debug!(
            "Cohere request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(format!("Cohere API error: {}", text).into());
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Cohere response: {}", resp_json);

        Self::parse_cohere_response(&resp_json)
    }
}
