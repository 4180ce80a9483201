// SPDX-License-Identifier: MIT

//! Chat model client
//!
//! `ChatModel` is the one capability the text-generation steps depend on;
//! injecting it at construction keeps the step bodies testable without
//! network access. `OpenAiChatModel` talks to any OpenAI-compatible
//! chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::flow::StepError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("OpenAI API error: {0}")]
    Api(String),

    #[error("invalid response from model: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<ModelError> for StepError {
    fn from(err: ModelError) -> Self {
        StepError::service("openai", err)
    }
}

/// A single-turn text generation capability
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system + user prompt pair, return the model's text reply
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, ModelError>;
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: String,
}

impl OpenAiChatModel {
    pub fn new(api_key: String, base_url: String, model_name: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model_name,
        }
    }

    /// Pull the assistant text out of a chat-completions response
    fn parse_completion(response: &Value) -> Result<String, ModelError> {
        let message = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .map(|choice| &choice["message"])
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;

        message["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ModelError::InvalidResponse("missing message content".to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model_name,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": temperature
        });

        log::debug!("chat request to {} (model {})", url, self.model_name);

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
            return Err(ModelError::Api(text));
        }

        let resp_json: Value = resp.json().await?;
        Self::parse_completion(&resp_json)
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns the same reply for every call
    pub struct EchoModel {
        reply: String,
    }

    impl EchoModel {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, ModelError> {
            Ok(self.reply.clone())
        }
    }

    /// Returns queued replies in call order, then a fixed fallback
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        fallback: String,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<&str>, fallback: &str) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                fallback: fallback.to_string(),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, ModelError> {
            let mut replies = self.replies.lock().unwrap();
            Ok(replies.pop_front().unwrap_or_else(|| self.fallback.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_text() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Here is your recipe."
                }
            }]
        });

        let text = OpenAiChatModel::parse_completion(&response).unwrap();
        assert_eq!(text, "Here is your recipe.");
    }

    #[test]
    fn test_parse_completion_no_choices() {
        let response = json!({ "choices": [] });
        let err = OpenAiChatModel::parse_completion(&response).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_completion_missing_content() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        });
        let err = OpenAiChatModel::parse_completion(&response).unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }

    #[test]
    fn test_model_error_converts_to_step_error() {
        let err: StepError = ModelError::Api("rate limited".to_string()).into();
        match err {
            StepError::Service { provider, message } => {
                assert_eq!(provider, "openai");
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected Service, got {:?}", other),
        }
    }
}
