//! Anthropic Model - Claude API implementation

use super::{Content, GenerationConfig, Model};
use crate::adk::error::BoxError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;

/// Anthropic Claude model implementation
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl AnthropicModel {
    /// Create a new AnthropicModel
    ///
    /// Requires `ANTHROPIC_API_KEY` environment variable to be set.
    /// Optionally uses `ANTHROPIC_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, BoxError> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| "ANTHROPIC_API_KEY must be set")?;
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Build the request body; system turns go into the top-level `system` field
    fn build_body(&self, history: &[Content], config: Option<&GenerationConfig>) -> serde_json::Value {
        let system: Vec<&str> = history
            .iter()
            .filter(|c| c.role == "system")
            .map(|c| c.text.as_str())
            .collect();

        let messages: Vec<serde_json::Value> = history
            .iter()
            .filter(|c| c.role != "system")
            .map(|c| {
                let role = if c.role == "model" { "assistant" } else { c.role.as_str() };
                json!({ "role": role, "content": c.text })
            })
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages,
            "max_tokens": config.and_then(|c| c.max_output_tokens).unwrap_or(4096)
        });

        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        body
    }

    /// Concatenate the text blocks of an Anthropic response
    fn parse_anthropic_response(response: &serde_json::Value) -> Result<String, BoxError> {
        let blocks = response["content"]
            .as_array()
            .ok_or("No content in Anthropic response")?;

        let text: String = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect();

        if let Some(stop_reason) = response["stop_reason"].as_str() {
            log::debug!("Anthropic stop reason: {}", stop_reason);
        }

        Ok(text)
    }
}

#[async_trait]
impl Model for AnthropicModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<String, BoxError> {
        let url = format!("{}/messages", self.base_url);
        let body = self.build_body(history, config);

        log::debug!(
            "Anthropic request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(format!("Anthropic API error: {}", text).into());
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Anthropic response: {}", resp_json);

        Self::parse_anthropic_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> AnthropicModel {
        AnthropicModel {
            client: Client::new(),
            api_key: "test".to_string(),
            model_name: "claude-3-5-haiku-latest".to_string(),
            base_url: "http://localhost".to_string(),
        }
    }

    #[test]
    fn test_system_message_is_lifted() {
        let history = vec![Content::system("Be brief."), Content::user("Hello")];
        let body = model().build_body(&history, Some(&GenerationConfig::with_temperature(0.3)));

        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 4096);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_parse_text_blocks() {
        let response = json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "report"}
            ],
            "stop_reason": "end_turn"
        });
        let text = AnthropicModel::parse_anthropic_response(&response).unwrap();
        assert_eq!(text, "report");
    }

    #[test]
    fn test_parse_missing_content() {
        let response = json!({"error": {"message": "overloaded"}});
        assert!(AnthropicModel::parse_anthropic_response(&response).is_err());
    }
}
