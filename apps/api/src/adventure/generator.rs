//! Adventure generation — runs one request through the whole pipeline.
//!
//! Flow: validate_form → build_prompt → CompletionClient::complete → normalize.
//!
//! Stateless and one-shot: a reroll is simply another call with the same form.
//! Nothing is retried here; parse and schema failures go straight back to the
//! caller.

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::adventure::models::{Adventure, AdventureForm};
use crate::adventure::normalizer::normalize;
use crate::adventure::prompts::build_prompt;
use crate::adventure::validation::validate_form;
use crate::errors::AppError;
use crate::llm_client::{CompletionClient, CompletionRequest};

/// Generates one itinerary. Invalid input fails before the client is called.
pub async fn generate_adventure(
    client: &dyn CompletionClient,
    form: AdventureForm,
) -> Result<Adventure, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate_adventure", %request_id);

    async move {
        let request = validate_form(form)?;
        info!(
            "Generating adventure in {} ({}, vibe={:?})",
            request.location, request.time_window, request.vibe
        );

        let prompt = build_prompt(&request);
        debug!(
            "Prompt built: system={} chars, user={} chars",
            prompt.system.len(),
            prompt.user.len()
        );

        let raw = client
            .complete(&CompletionRequest::json(prompt.system, prompt.user))
            .await?;

        let adventure = normalize(&raw, &request)?;
        info!(
            "Adventure '{}' generated with {} stops",
            adventure.title,
            adventure.stops.len()
        );

        Ok::<_, AppError>(adventure)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::adventure::models::Vibe;
    use crate::llm_client::CompletionError;

    /// Canned completion service that records what it was asked.
    pub(crate) struct FakeCompletionClient {
        reply: Result<String, u16>,
        pub calls: AtomicUsize,
        pub last_request: Mutex<Option<CompletionRequest>>,
    }

    impl FakeCompletionClient {
        pub fn replying(text: impl Into<String>) -> Self {
            Self {
                reply: Ok(text.into()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletionClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(CompletionError::Api {
                    status: *status,
                    message: "provider unavailable".to_string(),
                }),
            }
        }
    }

    pub(crate) fn valid_reply() -> String {
        json!({
            "location": "Seattle",
            "timeWindow": "2 hours",
            "interests": "food, art",
            "vibe": "quirky",
            "title": "Troll Bridges and Chowder",
            "stops": [{
                "time": "1:00 PM",
                "location": "Fremont Troll",
                "activity": "Climb the troll",
                "duration": "30 minutes",
                "quirkyDetail": "It clutches a real VW Beetle"
            }],
            "stats": {"travelTime": "15 minutes", "cost": "$10-20", "funFactor": 9}
        })
        .to_string()
    }

    fn form() -> AdventureForm {
        AdventureForm {
            location: Some("Seattle".to_string()),
            time_window: Some("2 hours".to_string()),
            interests: Some("food, art".to_string()),
            vibe: Some("quirky".to_string()),
            approximation_time: None,
        }
    }

    #[tokio::test]
    async fn test_generate_returns_normalized_adventure() {
        let client = FakeCompletionClient::replying(format!("```json\n{}\n```", valid_reply()));
        let adventure = generate_adventure(&client, form()).await.unwrap();

        assert_eq!(adventure.title, "Troll Bridges and Chowder");
        assert_eq!(adventure.vibe, Some(Vibe::Quirky));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_as_json_request() {
        let client = FakeCompletionClient::replying(valid_reply());
        generate_adventure(&client, form()).await.unwrap();

        let sent = client.last_request.lock().unwrap().clone().unwrap();
        assert!(sent.user.contains("Create a micro-adventure in Seattle"));
        assert!(sent.user.contains("The adventure should have a quirky vibe."));
        assert!((sent.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_invalid_input_never_calls_client() {
        let client = FakeCompletionClient::replying(valid_reply());
        let mut bad = form();
        bad.location = Some(String::new());

        let err = generate_adventure(&client, bad).await.unwrap_err();
        match err {
            AppError::Validation(violations) => assert_eq!(violations[0].field, "location"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_is_not_retried() {
        let client = FakeCompletionClient::failing(503);
        let err = generate_adventure(&client, form()).await.unwrap_err();

        assert!(matches!(err, AppError::Completion(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_error() {
        let client = FakeCompletionClient::replying("I'd love to help! First, go to...");
        let err = generate_adventure(&client, form()).await.unwrap_err();

        assert!(matches!(err, AppError::Parse(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reroll_issues_a_fresh_call() {
        let client = FakeCompletionClient::replying(valid_reply());
        generate_adventure(&client, form()).await.unwrap();
        generate_adventure(&client, form()).await.unwrap();
        assert_eq!(client.call_count(), 2);
    }
}
