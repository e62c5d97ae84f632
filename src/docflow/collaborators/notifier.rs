// SPDX-License-Identifier: MIT

//! Delivery of the persisted artifact
//!
//! The message text is composed by the model when one is configured and
//! falls back to a fixed wording otherwise.

use super::{Delivery, Notifier};
use crate::adk::error::BoxError;
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::docflow::workflow::state::DocumentType;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;

const COMPOSE_INSTRUCTION: &str = "You're composing a short, friendly email from one person to another. \
You're simply sharing a document, not completing any task or providing detailed analysis.\n\n\
Based on the content, generate:\n\
1. A natural, human-sounding subject line\n\
2. A warm, professional body text. You can include a one-line summary of the document content if helpful.\n\n\
Always follow these rules:\n\
- Begin the email with 'Hi,' (not with the recipient's name)\n\
- End the email with 'Best,\nDocument Delivery'\n\
- You are just a messenger, not the one who created or worked on the content.\n\n\
Respond in the format:\n\
Subject: <subject line>\n\nBody:\n<body content>";

/// Subject and body of an outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

impl Message {
    /// Wording used when the model is unavailable or its answer has no structure
    pub fn fallback(document_type: Option<DocumentType>) -> Self {
        let kind = document_type.map(|t| t.as_str()).unwrap_or("processed");
        Self {
            subject: format!("Here's the finalized {} document", kind),
            body: format!(
                "Hi,\n\nThe {} you asked for is finished and attached. \
                 Take a look when you get a chance.\n\nBest,\nDocument Delivery",
                kind
            ),
        }
    }

    /// Parse a `Subject: ... Body: ...` answer
    pub fn parse(answer: &str) -> Option<Self> {
        let (_, rest) = answer.split_once("Subject:")?;
        let (subject, body) = rest.split_once("Body:")?;
        let subject = subject.trim();
        let body = body.trim();
        if subject.is_empty() || body.is_empty() {
            return None;
        }
        Some(Self {
            subject: subject.to_string(),
            body: body.to_string(),
        })
    }
}

async fn compose(
    model: Option<&Arc<dyn Model>>,
    config: &GenerationConfig,
    delivery: &Delivery<'_>,
) -> Message {
    let Some(model) = model else {
        return Message::fallback(delivery.document_type);
    };

    let history = [
        Content::system(COMPOSE_INSTRUCTION),
        Content::user(format!("Content Preview:\n{}", delivery.content_preview)),
    ];
    match model.generate_content(&history, Some(config)).await {
        Ok(answer) => Message::parse(&answer).unwrap_or_else(|| {
            log::debug!("Composed message had no Subject/Body, using fallback");
            Message::fallback(delivery.document_type)
        }),
        Err(e) => {
            log::warn!("Failed to compose message, using fallback: {}", e);
            Message::fallback(delivery.document_type)
        }
    }
}

#[derive(Serialize)]
struct Attachment<'a> {
    filename: String,
    content: &'a str,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipient: Option<&'a str>,
    #[serde(flatten)]
    message: &'a Message,
    attachment: Attachment<'a>,
}

/// POSTs the message and the artifact as JSON to a webhook
pub struct WebhookNotifier {
    client: Client,
    url: String,
    recipient: Option<String>,
    model: Option<Arc<dyn Model>>,
    config: GenerationConfig,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            recipient: None,
            model: None,
            config: GenerationConfig::with_temperature(0.4),
        }
    }

    pub fn with_recipient(mut self, recipient: Option<String>) -> Self {
        self.recipient = recipient;
        self
    }

    /// Compose subject and body with `model`
    pub fn with_model(mut self, model: Arc<dyn Model>, temperature: f32) -> Self {
        self.model = Some(model);
        self.config = GenerationConfig::with_temperature(temperature);
        self
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, delivery: Delivery<'_>) -> Result<(), BoxError> {
        let content = tokio::fs::read_to_string(delivery.artifact)
            .await
            .map_err(|e| format!("artifact '{}' unreadable: {}", delivery.artifact.display(), e))?;

        let message = compose(self.model.as_ref(), &self.config, &delivery).await;
        let filename = delivery
            .artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let payload = WebhookPayload {
            recipient: self.recipient.as_deref(),
            message: &message,
            attachment: Attachment {
                filename,
                content: &content,
            },
        };

        let resp = self.client.post(&self.url).json(&payload).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("webhook returned {}: {}", status, text).into());
        }

        log::info!("Delivered '{}' to {}", message.subject, self.url);
        Ok(())
    }
}

/// Logs the message instead of sending it; used when no webhook is configured
pub struct LogNotifier {
    model: Option<Arc<dyn Model>>,
    config: GenerationConfig,
}

impl LogNotifier {
    pub fn new(model: Option<Arc<dyn Model>>, temperature: f32) -> Self {
        Self {
            model,
            config: GenerationConfig::with_temperature(temperature),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, delivery: Delivery<'_>) -> Result<(), BoxError> {
        if !tokio::fs::try_exists(delivery.artifact).await.unwrap_or(false) {
            return Err(format!("artifact '{}' is missing", delivery.artifact.display()).into());
        }
        let message = compose(self.model.as_ref(), &self.config, &delivery).await;
        log::info!(
            "No delivery channel configured; '{}' with attachment {}",
            message.subject,
            delivery.artifact.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_subject_and_body() {
        let answer = "Subject: Your summary is ready\n\nBody:\nHi,\nHere it is.\n\nBest,\nDocument Delivery";
        let message = Message::parse(answer).unwrap();
        assert_eq!(message.subject, "Your summary is ready");
        assert!(message.body.starts_with("Hi,"));
        assert!(message.body.ends_with("Document Delivery"));
    }

    #[test]
    fn test_parse_unstructured_answer() {
        assert_eq!(Message::parse("Hi, here is the file."), None);
        assert_eq!(Message::parse("Subject: only a subject"), None);
    }

    #[test]
    fn test_fallback_mentions_type() {
        let message = Message::fallback(Some(DocumentType::Report));
        assert_eq!(message.subject, "Here's the finalized report document");
    }

    struct Failing;

    #[async_trait]
    impl Model for Failing {
        async fn generate_content(
            &self,
            _history: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<String, BoxError> {
            Err("rate limited".into())
        }
    }

    #[tokio::test]
    async fn test_compose_falls_back_on_model_error() {
        let model: Arc<dyn Model> = Arc::new(Failing);
        let delivery = Delivery {
            artifact: Path::new("out.txt"),
            document_type: Some(DocumentType::Form),
            content_preview: "fields",
        };
        let message = compose(Some(&model), &GenerationConfig::default(), &delivery).await;
        assert_eq!(message, Message::fallback(Some(DocumentType::Form)));
    }

    #[tokio::test]
    async fn test_log_notifier_requires_artifact() {
        let notifier = LogNotifier::new(None, 0.4);
        let result = notifier
            .notify(Delivery {
                artifact: Path::new("/no/such/artifact.txt"),
                document_type: None,
                content_preview: "",
            })
            .await;
        assert!(result.is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        let result = notifier
            .notify(Delivery {
                artifact: file.path(),
                document_type: None,
                content_preview: "",
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_notifier_unreadable_artifact() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        let err = notifier
            .notify(Delivery {
                artifact: Path::new("/no/such/artifact.txt"),
                document_type: None,
                content_preview: "",
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unreadable"));
    }
}
