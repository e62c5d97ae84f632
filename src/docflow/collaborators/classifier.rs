//! Document classification

use super::Classifier;
use crate::adk::error::BoxError;
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::docflow::workflow::state::DocumentType;
use async_trait::async_trait;
use std::sync::Arc;

const CLASSIFY_INSTRUCTION: &str = r#"Analyze the document content and classify it as one of:
- "report" (structured content with sections/headings)
- "form" (templates, applications, standardized documents)
- "draft" (poorly written, needs enhancement)

Return JUST the type."#;

/// Ordered substring rules; first match wins, `Draft` when nothing matches
const LABEL_RULES: &[(&[&str], DocumentType)] = &[
    (&["report"], DocumentType::Report),
    (&["form", "template"], DocumentType::Form),
];

/// Map a free-text classifier answer onto a document type
pub fn classify_label(answer: &str) -> DocumentType {
    let answer = answer.to_lowercase();
    LABEL_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| answer.contains(*n)))
        .map(|(_, kind)| *kind)
        .unwrap_or(DocumentType::Draft)
}

/// Classifier backed by a language model
pub struct LlmClassifier {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl LlmClassifier {
    pub fn new(model: Arc<dyn Model>, temperature: f32) -> Self {
        Self {
            model,
            config: GenerationConfig::with_temperature(temperature),
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text_prefix: &str) -> Result<String, BoxError> {
        let history = [Content::system(CLASSIFY_INSTRUCTION), Content::user(text_prefix)];
        let answer = self
            .model
            .generate_content(&history, Some(&self.config))
            .await?;
        log::debug!("Classifier answered '{}'", answer.trim());
        Ok(answer)
    }
}
