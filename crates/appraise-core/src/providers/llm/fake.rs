use super::{CompletionClient, UpstreamError};
use crate::model::{LlmResponse, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Scripted client: replays queued responses (or failures) in order, then
/// falls back to a fixed reply. Records every request it receives.
pub struct FakeClient {
    model: String,
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: String,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl FakeClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: "The statement was received.\nTotal Score: 10/20".to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    pub fn push_response(&self, text: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, reason: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(reason.into()));
    }

    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last_request(&self) -> Option<Vec<Message>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(
        &self,
        messages: &[Message],
    ) -> std::result::Result<LlmResponse, UpstreamError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let text = match next {
            Some(Ok(text)) => text,
            Some(Err(reason)) => return Err(UpstreamError::Unavailable(reason)),
            None => self.fallback.clone(),
        };

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let client = FakeClient::new("m").with_fallback("fallback");
        client.push_response("first");
        client.push_failure("boom");

        assert_eq!(client.complete(&[]).await.unwrap().text, "first");
        assert!(matches!(
            client.complete(&[]).await,
            Err(UpstreamError::Unavailable(_))
        ));
        assert_eq!(client.complete(&[]).await.unwrap().text, "fallback");
        assert_eq!(client.calls(), 3);
    }
}
