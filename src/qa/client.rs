//! HTTP client for the remote question-answering endpoint

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;

use super::request::{AnswerOutcome, QaError, QuestionRequest};

pub const DEFAULT_ENDPOINT: &str = "https://api.ragapi.org/question";

/// Anything that can answer a question about a document.
///
/// The question worker owns one of these; tests swap in canned sources.
pub trait AnswerSource: Send {
    fn ask(&self, request: &QuestionRequest) -> Result<AnswerOutcome, QaError>;
}

pub struct QaClient {
    http: Client,
    endpoint: String,
}

impl QaClient {
    /// Build a client. `timeout: None` waits for the service indefinitely.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, QaError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(request: &QuestionRequest) -> Result<Form, QaError> {
        let file = Part::bytes(request.document.upload_bytes())
            .file_name(request.document.name().to_string())
            .mime_str("application/pdf")?;

        Ok(Form::new()
            .part("file", file)
            .text("question", request.question.clone())
            .text("openai_key", request.credentials.model_key.clone()))
    }
}

impl AnswerSource for QaClient {
    fn ask(&self, request: &QuestionRequest) -> Result<AnswerOutcome, QaError> {
        debug!(
            "POST {} ({} bytes, question {} chars)",
            self.endpoint,
            request.document.len(),
            request.question.chars().count()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&request.credentials.service_key)
            .multipart(Self::build_form(request)?)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(QaError::Status(status.as_u16()));
        }

        let body = response.bytes()?;
        interpret_body(&body)
    }
}

/// Map a 2xx response body to an outcome.
///
/// Only a non-empty string `answer` counts as an answer; any other shape is
/// "no answer". Bodies that are not JSON are errors.
pub fn interpret_body(body: &[u8]) -> Result<AnswerOutcome, QaError> {
    let value: Value = serde_json::from_slice(body)?;
    match value.get("answer") {
        Some(Value::String(answer)) if !answer.is_empty() => {
            Ok(AnswerOutcome::Answered(answer.clone()))
        }
        _ => Ok(AnswerOutcome::NoAnswer),
    }
}
