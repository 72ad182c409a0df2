//! Question request and response types

use std::fmt;

use crate::document::PdfDocument;

/// Unique identifier for question requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// The two keys typed into the form, forwarded verbatim.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Sent as `Authorization: Bearer <service_key>`
    pub service_key: String,
    /// Sent as the `openai_key` form field
    pub model_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("service_key", &redact(&self.service_key))
            .field("model_key", &redact(&self.model_key))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "<redacted>" }
}

/// One question about one document
#[derive(Clone, Debug)]
pub struct QuestionRequest {
    pub id: RequestId,
    pub document: PdfDocument,
    pub question: String,
    pub credentials: Credentials,
}

/// What a successful exchange with the service produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered(String),
    NoAnswer,
}

/// Errors from the question service
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service responded with status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl QaError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the question worker
#[derive(Debug)]
pub struct QuestionResponse {
    pub id: RequestId,
    pub result: Result<AnswerOutcome, QaError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_keys() {
        let creds = Credentials {
            service_key: "rag-secret".to_string(),
            model_key: String::new(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("rag-secret"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("<empty>"));
    }
}
