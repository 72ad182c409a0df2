//! View state: the single owner of everything the screen shows.
//!
//! All mutation goes through [`ViewState::apply`]. It never does I/O; it
//! returns [`Effect`]s that the app executes against the render and question
//! workers.

use log::{debug, error, info, warn};

use crate::document::PdfDocument;
use crate::notification::NotificationLevel;
use crate::pagination::Pagination;
use crate::qa::{
    AnswerOutcome, Credentials, FAILURE_MESSAGE, NO_ANSWER_MESSAGE, NO_DOCUMENT_MESSAGE, QaError,
    QuestionRequest, RequestId,
};
use crate::widget::text_input::{InputEdit, TextInput};

/// Editable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ServiceKey,
    ModelKey,
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    NoDocument,
    Loading,
    Ready { title: Option<String> },
    Failed(String),
}

/// What the answer area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerView<'a> {
    Idle,
    Loading,
    Answered(&'a str),
}

#[derive(Debug, Clone)]
struct PendingQuestion {
    id: RequestId,
    question: String,
}

#[derive(Debug)]
pub struct ViewState {
    document: Option<PdfDocument>,
    /// Bumped on every document selection
    generation: u64,
    load_status: LoadStatus,
    pagination: Pagination,
    service_key: TextInput,
    model_key: TextInput,
    question_draft: TextInput,
    /// Question copied from the draft at submission time
    active_question: String,
    last_answered: Option<String>,
    answer: String,
    in_flight: Option<PendingQuestion>,
    next_request_id: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            document: None,
            generation: 0,
            load_status: LoadStatus::NoDocument,
            pagination: Pagination::new(),
            service_key: TextInput::new(),
            model_key: TextInput::new(),
            question_draft: TextInput::new(),
            active_question: String::new(),
            last_answered: None,
            answer: String::new(),
            in_flight: None,
            next_request_id: 1,
        }
    }

    pub fn document(&self) -> Option<&PdfDocument> {
        self.document.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count()
    }

    pub fn field(&self, field: Field) -> &TextInput {
        match field {
            Field::ServiceKey => &self.service_key,
            Field::ModelKey => &self.model_key,
            Field::Question => &self.question_draft,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut TextInput {
        match field {
            Field::ServiceKey => &mut self.service_key,
            Field::ModelKey => &mut self.model_key,
            Field::Question => &mut self.question_draft,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            service_key: self.service_key.value().to_string(),
            model_key: self.model_key.value().to_string(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_request(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|p| p.id)
    }

    pub fn active_question(&self) -> &str {
        &self.active_question
    }

    /// The question behind the latest successful answer
    pub fn last_answered_question(&self) -> Option<&str> {
        self.last_answered.as_deref()
    }

    /// Latest answer text, kept while a newer question is loading
    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn answer_view(&self) -> AnswerView<'_> {
        if self.is_loading() {
            AnswerView::Loading
        } else if self.answer.is_empty() {
            AnswerView::Idle
        } else {
            AnswerView::Answered(&self.answer)
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SelectDocument(document) => {
                self.generation += 1;
                self.pagination.select_file();
                self.load_status = LoadStatus::Loading;
                info!(
                    "Selected {} ({} bytes) as document {}",
                    document.name(),
                    document.len(),
                    self.generation
                );
                self.document = Some(document.clone());
                vec![Effect::LoadDocument {
                    generation: self.generation,
                    document,
                }]
            }

            Command::DocumentLoaded {
                generation,
                page_count,
                title,
            } => {
                if generation != self.generation {
                    debug!("Ignoring load result for stale document {generation}");
                    return vec![];
                }
                self.pagination.on_loaded(page_count);
                self.load_status = LoadStatus::Ready { title };
                vec![Effect::RenderPage {
                    generation,
                    page: self.pagination.current_page(),
                }]
            }

            Command::DocumentFailed { generation, reason } => {
                if generation != self.generation {
                    debug!("Ignoring load failure for stale document {generation}");
                    return vec![];
                }
                let name = self
                    .document
                    .as_ref()
                    .map_or_else(String::new, |d| d.name().to_string());
                self.load_status = LoadStatus::Failed(reason.clone());
                vec![Effect::Notify {
                    level: NotificationLevel::Error,
                    message: format!("Could not open {name}: {reason}"),
                }]
            }

            Command::NextPage => {
                if self.pagination.next() {
                    self.render_current_page()
                } else {
                    vec![]
                }
            }

            Command::PreviousPage => {
                if self.pagination.previous() {
                    self.render_current_page()
                } else {
                    vec![]
                }
            }

            Command::Edit(field, edit) => {
                self.field_mut(field).apply(edit);
                vec![]
            }

            Command::Submit => self.submit(),

            Command::AnswerArrived { id, result } => self.answer_arrived(id, result),
        }
    }

    fn render_current_page(&self) -> Vec<Effect> {
        if matches!(self.load_status, LoadStatus::Ready { .. }) {
            vec![Effect::RenderPage {
                generation: self.generation,
                page: self.pagination.current_page(),
            }]
        } else {
            vec![]
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        if let Some(pending) = &self.in_flight {
            warn!(
                "Rejected question while {:?} is still in flight",
                pending.id
            );
            return vec![Effect::Notify {
                level: NotificationLevel::Warning,
                message: "Still waiting for the previous answer".to_string(),
            }];
        }

        let Some(document) = self.document.clone() else {
            info!("Question asked without a document");
            self.answer = NO_DOCUMENT_MESSAGE.to_string();
            return vec![];
        };

        let question = self.question_draft.value().to_string();
        let id = self.next_id();
        self.active_question = question.clone();
        self.in_flight = Some(PendingQuestion {
            id,
            question: question.clone(),
        });

        vec![Effect::SendQuestion(QuestionRequest {
            id,
            document,
            question,
            credentials: self.credentials(),
        })]
    }

    fn answer_arrived(
        &mut self,
        id: RequestId,
        result: Result<AnswerOutcome, QaError>,
    ) -> Vec<Effect> {
        let Some(pending) = self.in_flight.take_if(|p| p.id == id) else {
            debug!("Ignoring answer for {id:?}, not in flight");
            return vec![];
        };

        match result {
            Ok(AnswerOutcome::Answered(text)) => {
                self.answer = text;
                self.last_answered = Some(pending.question);
            }
            Ok(AnswerOutcome::NoAnswer) => {
                self.answer = NO_ANSWER_MESSAGE.to_string();
            }
            Err(e) => {
                error!("Question request failed: {e}");
                self.answer = FAILURE_MESSAGE.to_string();
            }
        }
        vec![]
    }
}

/// Commands that modify view state
#[derive(Debug)]
pub enum Command {
    /// A new document was picked
    SelectDocument(PdfDocument),
    /// The renderer decoded the document
    DocumentLoaded {
        generation: u64,
        page_count: usize,
        title: Option<String>,
    },
    /// The renderer could not decode the document
    DocumentFailed { generation: u64, reason: String },
    NextPage,
    PreviousPage,
    /// Edit one of the form fields
    Edit(Field, InputEdit),
    /// Ask the drafted question
    Submit,
    /// The question worker finished a request
    AnswerArrived {
        id: RequestId,
        result: Result<AnswerOutcome, QaError>,
    },
}

/// Effects produced by state changes
#[derive(Debug)]
pub enum Effect {
    /// Hand a document to the renderer
    LoadDocument {
        generation: u64,
        document: PdfDocument,
    },
    /// Render one page
    RenderPage { generation: u64, page: usize },
    /// Start a question request
    SendQuestion(QuestionRequest),
    /// Show a transient message
    Notify {
        level: NotificationLevel,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> PdfDocument {
        PdfDocument::new(name, b"%PDF-1.7".to_vec())
    }

    fn type_into(state: &mut ViewState, field: Field, text: &str) {
        for c in text.chars() {
            let _ = state.apply(Command::Edit(field, InputEdit::Insert(c)));
        }
    }

    fn loaded_state(pages: usize) -> ViewState {
        let mut state = ViewState::new();
        let _ = state.apply(Command::SelectDocument(doc("paper.pdf")));
        let generation = state.generation();
        let _ = state.apply(Command::DocumentLoaded {
            generation,
            page_count: pages,
            title: None,
        });
        state
    }

    fn submit(state: &mut ViewState) -> RequestId {
        let effects = state.apply(Command::Submit);
        match effects.as_slice() {
            [Effect::SendQuestion(request)] => request.id,
            other => panic!("expected a question to be sent, got {other:?}"),
        }
    }

    #[test]
    fn starts_idle() {
        let state = ViewState::new();
        assert_eq!(state.answer_view(), AnswerView::Idle);
        assert_eq!(state.load_status(), &LoadStatus::NoDocument);
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.page_count(), 1);
        assert!(state.last_answered_question().is_none());
    }

    #[test]
    fn select_document_requests_load() {
        let mut state = ViewState::new();
        let effects = state.apply(Command::SelectDocument(doc("a.pdf")));
        assert_eq!(state.load_status(), &LoadStatus::Loading);
        assert!(matches!(
            effects.as_slice(),
            [Effect::LoadDocument { generation: 1, document }] if document.name() == "a.pdf"
        ));
    }

    #[test]
    fn loaded_document_renders_first_page() {
        let mut state = ViewState::new();
        let _ = state.apply(Command::SelectDocument(doc("a.pdf")));
        let effects = state.apply(Command::DocumentLoaded {
            generation: 1,
            page_count: 12,
            title: Some("A".to_string()),
        });
        assert_eq!(state.page_count(), 12);
        assert!(matches!(
            effects.as_slice(),
            [Effect::RenderPage { generation: 1, page: 1 }]
        ));
    }

    #[test]
    fn page_navigation_is_bounded_and_renders() {
        let mut state = loaded_state(2);
        assert!(state.apply(Command::PreviousPage).is_empty());

        let effects = state.apply(Command::NextPage);
        assert!(matches!(
            effects.as_slice(),
            [Effect::RenderPage { page: 2, .. }]
        ));
        assert!(state.apply(Command::NextPage).is_empty());
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn selecting_new_document_resets_page() {
        let mut state = loaded_state(9);
        for _ in 0..5 {
            let _ = state.apply(Command::NextPage);
        }
        assert_eq!(state.current_page(), 6);

        let _ = state.apply(Command::SelectDocument(doc("other.pdf")));
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn stale_load_results_are_ignored() {
        let mut state = ViewState::new();
        let _ = state.apply(Command::SelectDocument(doc("old.pdf")));
        let _ = state.apply(Command::SelectDocument(doc("new.pdf")));

        let effects = state.apply(Command::DocumentLoaded {
            generation: 1,
            page_count: 40,
            title: None,
        });
        assert!(effects.is_empty());
        assert_eq!(state.page_count(), 1);
        assert_eq!(state.load_status(), &LoadStatus::Loading);
    }

    #[test]
    fn load_failure_is_recoverable_and_visible() {
        let mut state = ViewState::new();
        let _ = state.apply(Command::SelectDocument(doc("broken.pdf")));
        let effects = state.apply(Command::DocumentFailed {
            generation: 1,
            reason: "not a PDF".to_string(),
        });
        assert_eq!(
            state.load_status(),
            &LoadStatus::Failed("not a PDF".to_string())
        );
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify { level: NotificationLevel::Error, message }]
                if message.contains("broken.pdf") && message.contains("not a PDF")
        ));
        assert!(state.apply(Command::NextPage).is_empty());

        // A new document can still be opened
        let effects = state.apply(Command::SelectDocument(doc("good.pdf")));
        assert_eq!(effects.len(), 1);
        assert_eq!(state.load_status(), &LoadStatus::Loading);
    }

    #[test]
    fn submit_without_document_answers_immediately() {
        let mut state = ViewState::new();
        type_into(&mut state, Field::Question, "what is this?");

        let effects = state.apply(Command::Submit);
        assert!(effects.is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.answer_view(), AnswerView::Answered(NO_DOCUMENT_MESSAGE));
    }

    #[test]
    fn submit_carries_question_document_and_credentials() {
        let mut state = loaded_state(3);
        type_into(&mut state, Field::ServiceKey, "rag-key");
        type_into(&mut state, Field::ModelKey, "sk-model");
        type_into(&mut state, Field::Question, "What is the answer?");

        let effects = state.apply(Command::Submit);
        let [Effect::SendQuestion(request)] = effects.as_slice() else {
            panic!("expected SendQuestion, got {effects:?}");
        };
        assert_eq!(request.question, "What is the answer?");
        assert_eq!(request.credentials.service_key, "rag-key");
        assert_eq!(request.credentials.model_key, "sk-model");
        assert!(request.document.same_buffer(state.document().unwrap()));

        assert!(state.is_loading());
        assert_eq!(state.answer_view(), AnswerView::Loading);
        assert_eq!(state.active_question(), "What is the answer?");
    }

    #[test]
    fn successful_answer_replaces_last_question() {
        let mut state = loaded_state(1);
        type_into(&mut state, Field::Question, "first?");
        let id = submit(&mut state);
        let _ = state.apply(Command::AnswerArrived {
            id,
            result: Ok(AnswerOutcome::Answered("42".to_string())),
        });

        assert!(!state.is_loading());
        assert_eq!(state.answer_view(), AnswerView::Answered("42"));
        assert_eq!(state.last_answered_question(), Some("first?"));

        let _ = state.apply(Command::Edit(Field::Question, InputEdit::Clear));
        type_into(&mut state, Field::Question, "second?");
        let id = submit(&mut state);
        // The previous answer is kept while the next one loads
        assert_eq!(state.answer(), "42");
        let _ = state.apply(Command::AnswerArrived {
            id,
            result: Ok(AnswerOutcome::Answered("43".to_string())),
        });
        assert_eq!(state.last_answered_question(), Some("second?"));
        assert_eq!(state.answer(), "43");
    }

    #[test]
    fn no_answer_shows_fixed_message() {
        let mut state = loaded_state(1);
        let id = submit(&mut state);
        let _ = state.apply(Command::AnswerArrived {
            id,
            result: Ok(AnswerOutcome::NoAnswer),
        });
        assert_eq!(state.answer_view(), AnswerView::Answered(NO_ANSWER_MESSAGE));
        assert!(state.last_answered_question().is_none());
    }

    #[test]
    fn failure_shows_fixed_message_and_clears_loading() {
        for error in [QaError::Status(500), QaError::generic("connection reset")] {
            let mut state = loaded_state(1);
            let id = submit(&mut state);
            let _ = state.apply(Command::AnswerArrived {
                id,
                result: Err(error),
            });
            assert!(!state.is_loading());
            assert_eq!(state.answer_view(), AnswerView::Answered(FAILURE_MESSAGE));
        }
    }

    #[test]
    fn second_submission_is_rejected_while_in_flight() {
        let mut state = loaded_state(1);
        type_into(&mut state, Field::Question, "one");
        let first = submit(&mut state);

        let _ = state.apply(Command::Edit(Field::Question, InputEdit::Insert('!')));
        let effects = state.apply(Command::Submit);
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify { level: NotificationLevel::Warning, .. }]
        ));
        assert_eq!(state.in_flight_request(), Some(first));
        assert_eq!(state.active_question(), "one");

        let _ = state.apply(Command::AnswerArrived {
            id: first,
            result: Ok(AnswerOutcome::Answered("first answer".to_string())),
        });
        assert!(!state.is_loading());
        assert_eq!(state.answer(), "first answer");
        assert_eq!(state.last_answered_question(), Some("one"));
    }

    #[test]
    fn unknown_answers_are_ignored() {
        let mut state = loaded_state(1);
        let id = submit(&mut state);
        let _ = state.apply(Command::AnswerArrived {
            id: RequestId::new(id.0 + 100),
            result: Ok(AnswerOutcome::Answered("stray".to_string())),
        });
        assert!(state.is_loading());
        assert_eq!(state.answer(), "");
    }

    #[test]
    fn empty_question_and_keys_are_still_sent() {
        let mut state = loaded_state(1);
        let effects = state.apply(Command::Submit);
        let [Effect::SendQuestion(request)] = effects.as_slice() else {
            panic!("expected SendQuestion");
        };
        assert_eq!(request.question, "");
        assert_eq!(request.credentials, Credentials::default());
    }
}
