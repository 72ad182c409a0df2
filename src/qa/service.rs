//! Question service - runs blocking HTTP requests off the UI thread

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::client::AnswerSource;
use super::request::{QuestionRequest, QuestionResponse};

/// Hands questions to a backend and reports finished answers.
///
/// `poll_responses` never blocks; the event loop calls it every tick.
pub trait QuestionDispatcher {
    fn submit(&mut self, request: QuestionRequest);
    fn poll_responses(&mut self) -> Vec<QuestionResponse>;
}

enum QuestionJob {
    Ask(QuestionRequest),
    Shutdown,
}

/// Owns the question worker thread
pub struct QuestionService {
    job_tx: Sender<QuestionJob>,
    response_rx: Receiver<QuestionResponse>,
}

impl QuestionService {
    pub fn new(source: Box<dyn AnswerSource>) -> Self {
        let (job_tx, job_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            question_worker(source, job_rx, response_tx);
        });

        Self {
            job_tx,
            response_rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.job_tx.send(QuestionJob::Shutdown);
    }
}

impl QuestionDispatcher for QuestionService {
    fn submit(&mut self, request: QuestionRequest) {
        if self.job_tx.send(QuestionJob::Ask(request)).is_err() {
            warn!("Question worker is gone, request dropped");
        }
    }

    fn poll_responses(&mut self) -> Vec<QuestionResponse> {
        self.response_rx.try_iter().collect()
    }
}

impl Drop for QuestionService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn question_worker(
    source: Box<dyn AnswerSource>,
    jobs: Receiver<QuestionJob>,
    responses: Sender<QuestionResponse>,
) {
    for job in jobs {
        match job {
            QuestionJob::Ask(request) => {
                debug!("Asking question {:?}", request.id);
                let result = source.ask(&request);
                if responses
                    .send(QuestionResponse {
                        id: request.id,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
            QuestionJob::Shutdown => break,
        }
    }
    debug!("Question worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PdfDocument;
    use crate::qa::{AnswerOutcome, Credentials, QaError, RequestId};
    use std::time::{Duration, Instant};

    struct EchoSource;

    impl AnswerSource for EchoSource {
        fn ask(&self, request: &QuestionRequest) -> Result<AnswerOutcome, QaError> {
            if request.question.is_empty() {
                Err(QaError::generic("empty"))
            } else {
                Ok(AnswerOutcome::Answered(format!("echo: {}", request.question)))
            }
        }
    }

    fn request(id: u64, question: &str) -> QuestionRequest {
        QuestionRequest {
            id: RequestId::new(id),
            document: PdfDocument::new("a.pdf", b"%PDF".to_vec()),
            question: question.to_string(),
            credentials: Credentials::default(),
        }
    }

    fn wait_for(service: &mut QuestionService, count: usize) -> Vec<QuestionResponse> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut collected = Vec::new();
        while collected.len() < count && Instant::now() < deadline {
            collected.extend(service.poll_responses());
            std::thread::sleep(Duration::from_millis(5));
        }
        collected
    }

    #[test]
    fn answers_come_back_in_order() {
        let mut service = QuestionService::new(Box::new(EchoSource));
        service.submit(request(1, "first"));
        service.submit(request(2, ""));

        let responses = wait_for(&mut service, 2);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, RequestId::new(1));
        assert_eq!(
            responses[0].result.as_ref().unwrap(),
            &AnswerOutcome::Answered("echo: first".to_string())
        );
        assert_eq!(responses[1].id, RequestId::new(2));
        assert!(responses[1].result.is_err());
    }

    #[test]
    fn poll_without_work_is_empty() {
        let mut service = QuestionService::new(Box::new(EchoSource));
        assert!(service.poll_responses().is_empty());
    }
}
