//! Type-specific document transforms

use super::Transformer;
use crate::adk::error::BoxError;
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::docflow::workflow::state::DocumentType;
use async_trait::async_trait;
use std::sync::Arc;

/// System instruction for each document kind
pub fn instruction_for(kind: DocumentType) -> &'static str {
    match kind {
        DocumentType::Report => {
            "You are an expert report summarizer. Create a concise summary \
             that captures the key points, findings, and recommendations. \
             Keep it under 500 words."
        }
        DocumentType::Form => {
            "You are a document classifier. Analyze this form/template and:\n\
             1. Identify its purpose\n\
             2. Extract all field names\n\
             3. Tag with relevant categories\n\n\
             Return this as a structured analysis."
        }
        DocumentType::Draft => {
            "You are an editor. Improve this draft by:\n\
             1. Correcting grammar/spelling\n\
             2. Improving clarity and flow\n\
             3. Adding structure if needed\n\
             4. Keeping the original meaning\n\n\
             Return the enhanced version."
        }
    }
}

/// Transformer backed by a language model
pub struct LlmTransformer {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl LlmTransformer {
    pub fn new(model: Arc<dyn Model>, temperature: f32) -> Self {
        Self {
            model,
            config: GenerationConfig::with_temperature(temperature),
        }
    }
}

#[async_trait]
impl Transformer for LlmTransformer {
    async fn transform(&self, kind: DocumentType, full_text: &str) -> Result<String, BoxError> {
        let history = [Content::system(instruction_for(kind)), Content::user(full_text)];
        self.model
            .generate_content(&history, Some(&self.config))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_differ_per_kind() {
        assert!(instruction_for(DocumentType::Report).contains("summarizer"));
        assert!(instruction_for(DocumentType::Form).contains("field names"));
        assert!(instruction_for(DocumentType::Draft).contains("grammar"));
    }

    struct Upper;

    #[async_trait]
    impl Model for Upper {
        async fn generate_content(
            &self,
            history: &[Content],
            config: Option<&GenerationConfig>,
        ) -> Result<String, BoxError> {
            assert_eq!(config.and_then(|c| c.temperature), Some(0.3));
            Ok(history[1].text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_transform_uses_full_text() {
        let transformer = LlmTransformer::new(Arc::new(Upper), 0.3);
        let out = transformer
            .transform(DocumentType::Draft, "teh draft")
            .await
            .unwrap();
        assert_eq!(out, "TEH DRAFT");
    }
}
