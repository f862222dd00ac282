//! Gemini `generateContent` client.

use crate::config::Settings;
use crate::core::markdown::clean_markdown;
use crate::infrastructure::traits::LanguageModel;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, error};
use reqwest::StatusCode;
use serde::Deserialize;
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;

const UPSTREAM_ERROR_REPLY: &str = "Sorry, Gemini returned an error.";

#[derive(Debug, Error)]
enum LlmError {
    #[error("Gemini responded with status {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    MalformedResponse(String),
}

impl LlmError {
    fn transport(e: reqwest::Error) -> LlmError {
        // The request URL carries the API key, so it must not end up in the message.
        let e = e.without_url();
        let mut detail = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        LlmError::Transport(detail)
    }

    fn user_message(&self) -> String {
        match self {
            LlmError::Status(_) => UPSTREAM_ERROR_REPLY.to_owned(),
            LlmError::Transport(detail) => format!("Error contacting Gemini: {detail}"),
            LlmError::MalformedResponse(detail) => format!("Error: {detail}"),
        }
    }
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Debug)]
struct Part {
    text: String,
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
}

#[injectable(LanguageModel)]
impl GeminiClient {
    #[inject]
    pub fn from_settings(settings: Ref<Settings>) -> GeminiClient {
        GeminiClient::new(
            settings.gemini_api_url.clone(),
            settings.gemini_api_key.clone(),
            settings.gemini_timeout,
        )
    }
}

impl GeminiClient {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> GeminiClient {
        GeminiClient {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            timeout,
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status));
        }

        let body = response.bytes().await.map_err(LlmError::transport)?;
        let parsed: GenerateResponse = serde_json::from_slice(&body)
            .map_err(|e| LlmError::MalformedResponse(format!("unexpected response body: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| LlmError::MalformedResponse("response contained no text".to_owned()))
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> String {
        match self.request(prompt).await {
            Ok(text) => {
                debug!("Gemini replied with {} bytes", text.len());
                clean_markdown(&text)
            }
            Err(e) => {
                error!("Error contacting Gemini: {e}");
                e.user_message()
            }
        }
    }
}
