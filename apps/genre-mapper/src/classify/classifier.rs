//! Classifier — turns one story into a validated classification.
//!
//! Flow: build_prompt → model call → taxonomy gate.
//!
//! The model's answer is never trusted on its own: the prompt lists the valid
//! leaves, and `TaxonomyIndex::validate` is the enforced check. A failed call
//! degrades to `[UNMAPPED]` with a diagnostic reasoning instead of an error.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::classify::prompts::build_prompt;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::classification::{ClassificationResult, ModelVerdict, NO_REASONING};
use crate::taxonomy::{MappedCategory, TaxonomyIndex};

/// The text-generation backend behind the classifier. Implement this to swap
/// the service without touching the classifier or the batch driver.
#[async_trait]
pub trait CategoryModel: Send + Sync {
    /// Sends one prompt and returns the parsed `{mapped_category, reasoning}` reply.
    async fn suggest(&self, prompt: &str) -> Result<ModelVerdict, LlmError>;
}

#[async_trait]
impl CategoryModel for LlmClient {
    async fn suggest(&self, prompt: &str) -> Result<ModelVerdict, LlmError> {
        self.call_json(prompt, Some(JSON_ONLY_SYSTEM)).await
    }
}

pub struct Classifier {
    index: TaxonomyIndex,
    model: Box<dyn CategoryModel>,
}

impl Classifier {
    pub fn new(index: TaxonomyIndex, model: Box<dyn CategoryModel>) -> Self {
        Self { index, model }
    }

    pub fn index(&self) -> &TaxonomyIndex {
        &self.index
    }

    pub fn build_prompt(&self, tags: &[String], blurb: &str) -> String {
        build_prompt(&self.index, tags, blurb)
    }

    /// One attempt against the backend. The error branch is handled by
    /// [`resolve`](Self::resolve), never by the caller.
    pub async fn call_model(&self, prompt: &str) -> Result<ModelVerdict, LlmError> {
        self.model.suggest(prompt).await
    }

    /// Passes a call outcome through the taxonomy gate.
    pub fn resolve(&self, outcome: Result<ModelVerdict, LlmError>) -> ClassificationResult {
        match outcome {
            Ok(verdict) => {
                let mapped_category = self.index.validate(verdict.claimed_category());
                if mapped_category == MappedCategory::Unmapped {
                    debug!(
                        claimed = ?verdict.mapped_category,
                        "model answer resolved to unmapped"
                    );
                }
                let reasoning = verdict
                    .reasoning_text()
                    .unwrap_or_else(|| NO_REASONING.to_string());
                ClassificationResult {
                    mapped_category,
                    reasoning,
                }
            }
            Err(e) => {
                warn!(error = %e, "classification call failed, recording as unmapped");
                ClassificationResult {
                    mapped_category: MappedCategory::Unmapped,
                    reasoning: format!("Classification call failed: {e}"),
                }
            }
        }
    }

    pub async fn classify(&self, tags: &[String], blurb: &str) -> ClassificationResult {
        let prompt = self.build_prompt(tags, blurb);
        let outcome = self.call_model(&prompt).await;
        self.resolve(outcome)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Canned reply for [`ScriptedModel`].
    pub(crate) enum Reply {
        Verdict(Option<&'static str>, Option<&'static str>),
        Fail(&'static str),
    }

    /// Replays scripted replies in order and records every prompt it was sent.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedModel {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        pub(crate) prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                prompts: Arc::default(),
            }
        }

        pub(crate) fn sent_prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CategoryModel for ScriptedModel {
        async fn suggest(&self, prompt: &str) -> Result<ModelVerdict, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Verdict(category, reasoning)) => {
                    Ok(ModelVerdict::new(category, reasoning))
                }
                Some(Reply::Fail(message)) => Err(LlmError::Api {
                    status: 503,
                    message: message.to_string(),
                }),
                None => Err(LlmError::EmptyContent),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{Reply, ScriptedModel};
    use super::*;
    use crate::llm_client::LlmSettings;
    use crate::taxonomy::category::UNMAPPED;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hard_scifi_index() -> TaxonomyIndex {
        TaxonomyIndex::from_json_str(r#"{"Sci-Fi": {"Hard Sci-Fi": ["Hard Sci-Fi"]}}"#).unwrap()
    }

    fn classifier(replies: Vec<Reply>) -> (Classifier, ScriptedModel) {
        let model = ScriptedModel::new(replies);
        let classifier = Classifier::new(hard_scifi_index(), Box::new(model.clone()));
        (classifier, model)
    }

    /// A classifier backed by a real `LlmClient` pointed at a mock server.
    fn http_classifier(server: &MockServer) -> Classifier {
        let mut settings = LlmSettings::new("test-key");
        settings.api_url = format!("{}/openai/v1/chat/completions", server.uri());
        let client = LlmClient::new(settings).expect("client should build");
        Classifier::new(hard_scifi_index(), Box::new(client))
    }

    async fn mount_reply(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content.to_string()}}]})
    }

    #[tokio::test]
    async fn test_known_leaf_is_formatted() {
        let (classifier, _) = classifier(vec![Reply::Verdict(
            Some("Hard Sci-Fi"),
            Some("Physics-driven FTL story."),
        )]);
        let result = classifier.classify(&[], "A story exploring FTL physics.").await;
        assert_eq!(
            result.mapped_category.to_string(),
            "Sci-Fi > Hard Sci-Fi > Hard Sci-Fi"
        );
        assert_eq!(result.reasoning, "Physics-driven FTL story.");
    }

    #[tokio::test]
    async fn test_hallucinated_category_is_unmapped() {
        let (classifier, _) = classifier(vec![Reply::Verdict(
            Some("Cyberpunk-Deluxe"),
            Some("Neon and chrome."),
        )]);
        let result = classifier.classify(&[], "Neon city.").await;
        assert_eq!(result.mapped_category, MappedCategory::Unmapped);
        assert_eq!(result.mapped_category.to_string(), UNMAPPED);
        assert_eq!(result.reasoning, "Neon and chrome.");
    }

    #[tokio::test]
    async fn test_model_sentinel_is_kept() {
        let (classifier, _) = classifier(vec![Reply::Verdict(
            Some(UNMAPPED),
            Some("This is a recipe."),
        )]);
        let result = classifier.classify(&[], "Mix flour and sugar.").await;
        assert_eq!(result.mapped_category, MappedCategory::Unmapped);
    }

    #[tokio::test]
    async fn test_call_failure_degrades_to_unmapped_with_diagnostic() {
        let (classifier, _) = classifier(vec![Reply::Fail("upstream overloaded")]);
        let result = classifier.classify(&[], "Anything.").await;
        assert_eq!(result.mapped_category, MappedCategory::Unmapped);
        assert!(!result.reasoning.is_empty());
        assert!(result.reasoning.contains("upstream overloaded"));
    }

    #[tokio::test]
    async fn test_missing_fields_use_defaults() {
        let (classifier, _) = classifier(vec![Reply::Verdict(None, None)]);
        let result = classifier.classify(&[], "Anything.").await;
        assert_eq!(result.mapped_category, MappedCategory::Unmapped);
        assert_eq!(result.reasoning, NO_REASONING);
    }

    #[tokio::test]
    async fn test_blank_reasoning_uses_default() {
        let (classifier, _) = classifier(vec![Reply::Verdict(Some("Hard Sci-Fi"), Some("  "))]);
        let result = classifier.classify(&[], "Orbital mechanics.").await;
        assert!(result.mapped_category.is_mapped());
        assert_eq!(result.reasoning, NO_REASONING);
    }

    #[tokio::test]
    async fn test_prompt_sent_to_model_is_built_from_record() {
        let (classifier, model) = classifier(vec![Reply::Verdict(Some("Hard Sci-Fi"), None)]);
        let tags = vec!["physics".to_string()];
        classifier.classify(&tags, "Relativistic travel.").await;

        let prompts = model.sent_prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], classifier.build_prompt(&tags, "Relativistic travel."));
        assert!(prompts[0].contains("Relativistic travel."));
    }

    #[test]
    fn test_resolve_parse_error_branch() {
        let (classifier, _) = classifier(vec![]);
        let parse_error = serde_json::from_str::<ModelVerdict>("not json").unwrap_err();
        let result = classifier.resolve(Err(LlmError::Parse(parse_error)));
        assert_eq!(result.mapped_category, MappedCategory::Unmapped);
        assert!(result.reasoning.starts_with("Classification call failed: JSON parse error"));
    }

    #[tokio::test]
    async fn test_http_known_leaf_sends_json_only_system_message() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            200,
            completion(json!({"mapped_category": "Hard Sci-Fi", "reasoning": "FTL physics."})),
        )
        .await;

        let classifier = http_classifier(&server);
        let tags = vec!["space".to_string()];
        let result = classifier.classify(&tags, "A story exploring FTL physics.").await;
        assert_eq!(
            result.mapped_category.to_string(),
            "Sci-Fi > Hard Sci-Fi > Hard Sci-Fi"
        );
        assert_eq!(result.reasoning, "FTL physics.");

        let requests = server.received_requests().await.expect("requests are recorded");
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], JSON_ONLY_SYSTEM);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(
            body["messages"][1]["content"],
            classifier.build_prompt(&tags, "A story exploring FTL physics.")
        );
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_http_server_error_degrades_to_unmapped() {
        let server = MockServer::start().await;
        mount_reply(&server, 500, json!({"error": {"message": "internal failure"}})).await;

        let result = http_classifier(&server).classify(&[], "Anything.").await;
        assert_eq!(result.mapped_category.to_string(), UNMAPPED);
        assert!(!result.reasoning.trim().is_empty());
        assert!(result.reasoning.contains("internal failure"));
    }

    #[tokio::test]
    async fn test_http_wrongly_typed_reasoning_keeps_valid_category() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            200,
            completion(json!({"mapped_category": "Hard Sci-Fi", "reasoning": ["a"]})),
        )
        .await;

        let result = http_classifier(&server).classify(&[], "Orbital mechanics.").await;
        assert_eq!(
            result.mapped_category.to_string(),
            "Sci-Fi > Hard Sci-Fi > Hard Sci-Fi"
        );
        assert_eq!(result.reasoning, r#"["a"]"#);
    }

    #[tokio::test]
    async fn test_http_non_string_category_is_unmapped() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            200,
            completion(json!({"mapped_category": {"leaf": "Hard Sci-Fi"}, "reasoning": "nested"})),
        )
        .await;

        let result = http_classifier(&server).classify(&[], "Orbital mechanics.").await;
        assert_eq!(result.mapped_category, MappedCategory::Unmapped);
        assert_eq!(result.reasoning, "nested");
    }
}
