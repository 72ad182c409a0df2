//! Remote question answering

mod client;
mod request;
mod service;

pub use client::{AnswerSource, DEFAULT_ENDPOINT, QaClient, interpret_body};
pub use request::{
    AnswerOutcome, Credentials, QaError, QuestionRequest, QuestionResponse, RequestId,
};
pub use service::{QuestionDispatcher, QuestionService};

/// Shown when the service replied without an answer.
pub const NO_ANSWER_MESSAGE: &str = "No answer found for this question.";
/// Shown for any transport, status or decoding failure.
pub const FAILURE_MESSAGE: &str = "Failed to retrieve an answer. Please try again.";
/// Shown when a question is asked before a document is picked.
pub const NO_DOCUMENT_MESSAGE: &str = "Can't ask a question without a file. Open a PDF first.";
