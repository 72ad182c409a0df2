pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events.push(SimulatedEventSource::key(code));
            self
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        /// Add a Ctrl+character key press
        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        pub fn type_text(mut self, text: &str) -> Self {
            self.events.extend(SimulatedEventSource::typed(text));
            self
        }

        pub fn paste(mut self, text: &str) -> Self {
            self.events.push(Event::Paste(text.to_string()));
            self
        }

        pub fn press_enter(self) -> Self {
            self.press_key(KeyCode::Enter)
        }

        pub fn press_tab(self) -> Self {
            self.press_key(KeyCode::Tab)
        }

        pub fn press_back_tab(mut self) -> Self {
            self.events.push(SimulatedEventSource::key_event(
                KeyCode::BackTab,
                KeyModifiers::SHIFT,
            ));
            self
        }

        pub fn press_esc(self) -> Self {
            self.press_key(KeyCode::Esc)
        }

        /// Next page (press 'l')
        pub fn next_page(self) -> Self {
            self.press_char('l')
        }

        /// Previous page (press 'h')
        pub fn prev_page(self) -> Self {
            self.press_char('h')
        }

        /// Quit the application (Ctrl+C works from every focus)
        pub fn quit(self) -> Self {
            self.press_ctrl_char('c')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

/// In-process stand-ins for the render worker and the question service.
///
/// Both hand out cloneable handles so a test can keep inspecting and steering
/// a fake after boxing it into an [`App`](crate::App).
pub mod fakes {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard};

    use crate::document::PdfDocument;
    use crate::qa::{AnswerOutcome, QaError, QuestionDispatcher, QuestionRequest, QuestionResponse};
    use crate::render::{DocumentRenderer, PageText, RenderFault, RenderResponse};

    fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Text the fake renderer produces for `page`
    pub fn page_line(page: usize) -> String {
        format!("Text of page {page}")
    }

    #[derive(Default)]
    struct RendererInner {
        page_count: usize,
        fail_next_load: Option<String>,
        loads: Vec<(u64, String)>,
        pages: Vec<(u64, usize)>,
        pending: Vec<RenderResponse>,
    }

    /// Renderer that answers synchronously on the next poll
    #[derive(Clone)]
    pub struct FakeRenderer {
        inner: Arc<Mutex<RendererInner>>,
    }

    impl FakeRenderer {
        pub fn with_pages(page_count: usize) -> Self {
            Self {
                inner: Arc::new(Mutex::new(RendererInner {
                    page_count,
                    ..Default::default()
                })),
            }
        }

        pub fn set_page_count(&self, page_count: usize) {
            lock(&self.inner).page_count = page_count;
        }

        /// The next load reports this failure instead of a page count
        pub fn fail_next_load(&self, reason: &str) {
            lock(&self.inner).fail_next_load = Some(reason.to_string());
        }

        /// Documents handed to `load`, as (generation, name)
        pub fn loads(&self) -> Vec<(u64, String)> {
            lock(&self.inner).loads.clone()
        }

        /// Pages requested, as (generation, page)
        pub fn pages(&self) -> Vec<(u64, usize)> {
            lock(&self.inner).pages.clone()
        }
    }

    impl DocumentRenderer for FakeRenderer {
        fn load(&mut self, generation: u64, document: &PdfDocument) {
            let mut inner = lock(&self.inner);
            inner.loads.push((generation, document.name().to_string()));
            let response = match inner.fail_next_load.take() {
                Some(reason) => RenderResponse::LoadFailed {
                    generation,
                    error: RenderFault::generic(reason),
                },
                None => RenderResponse::Loaded {
                    generation,
                    page_count: inner.page_count,
                    title: None,
                },
            };
            inner.pending.push(response);
        }

        fn request_page(&mut self, generation: u64, page: usize) {
            let mut inner = lock(&self.inner);
            inner.pages.push((generation, page));
            inner.pending.push(RenderResponse::Page {
                generation,
                text: Arc::new(PageText {
                    page,
                    lines: vec![page_line(page)],
                }),
            });
        }

        fn poll_responses(&mut self) -> Vec<RenderResponse> {
            std::mem::take(&mut lock(&self.inner).pending)
        }
    }

    /// One scripted reply
    #[derive(Clone, Debug)]
    pub enum Scripted {
        Answer(String),
        NoAnswer,
        Fail(String),
    }

    impl Scripted {
        fn into_result(self) -> Result<AnswerOutcome, QaError> {
            match self {
                Scripted::Answer(text) => Ok(AnswerOutcome::Answered(text)),
                Scripted::NoAnswer => Ok(AnswerOutcome::NoAnswer),
                Scripted::Fail(detail) => Err(QaError::generic(detail)),
            }
        }
    }

    #[derive(Default)]
    struct AnswersInner {
        script: VecDeque<Scripted>,
        held: bool,
        submitted: Vec<QuestionRequest>,
        waiting: Vec<QuestionRequest>,
        ready: Vec<QuestionResponse>,
    }

    /// Question dispatcher that replies from a script.
    ///
    /// Unscripted questions are answered with `answer to <question>`. While
    /// held, submissions wait until [`ScriptedAnswers::release`].
    #[derive(Clone, Default)]
    pub struct ScriptedAnswers {
        inner: Arc<Mutex<AnswersInner>>,
    }

    impl ScriptedAnswers {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, reply: Scripted) {
            lock(&self.inner).script.push_back(reply);
        }

        pub fn hold(&self) {
            lock(&self.inner).held = true;
        }

        /// Answer everything that is waiting and stop holding
        pub fn release(&self) {
            let mut inner = lock(&self.inner);
            inner.held = false;
            let waiting = std::mem::take(&mut inner.waiting);
            for request in waiting {
                let response = reply_to(&mut inner.script, &request);
                inner.ready.push(response);
            }
        }

        pub fn submitted(&self) -> Vec<QuestionRequest> {
            lock(&self.inner).submitted.clone()
        }
    }

    fn reply_to(script: &mut VecDeque<Scripted>, request: &QuestionRequest) -> QuestionResponse {
        let reply = script
            .pop_front()
            .unwrap_or_else(|| Scripted::Answer(format!("answer to {}", request.question)));
        QuestionResponse {
            id: request.id,
            result: reply.into_result(),
        }
    }

    impl QuestionDispatcher for ScriptedAnswers {
        fn submit(&mut self, request: QuestionRequest) {
            let mut inner = lock(&self.inner);
            inner.submitted.push(request.clone());
            if inner.held {
                inner.waiting.push(request);
            } else {
                let response = reply_to(&mut inner.script, &request);
                inner.ready.push(response);
            }
        }

        fn poll_responses(&mut self) -> Vec<QuestionResponse> {
            std::mem::take(&mut lock(&self.inner).ready)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::test_helpers::*;
    use crate::document::PdfDocument;
    use crate::event_source::Event;
    use crate::qa::{AnswerOutcome, Credentials, QuestionDispatcher, QuestionRequest, RequestId};
    use crate::render::{DocumentRenderer, RenderResponse};

    fn request(id: u64, question: &str) -> QuestionRequest {
        QuestionRequest {
            id: RequestId::new(id),
            document: PdfDocument::new("a.pdf", b"%PDF".to_vec()),
            question: question.to_string(),
            credentials: Credentials::default(),
        }
    }

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .type_text("hey")
            .press_enter()
            .press_tab()
            .next_page()
            .prev_page()
            .paste("pasted")
            .press_back_tab()
            .press_esc()
            .quit()
            .build();

        assert_eq!(scenario.events.len(), 11);
        assert!(matches!(&scenario.events[7], Event::Paste(text) if text == "pasted"));
    }

    #[test]
    fn fake_renderer_answers_loads_and_pages() {
        let mut renderer = FakeRenderer::with_pages(3);
        let handle = renderer.clone();
        renderer.load(1, &PdfDocument::new("a.pdf", b"%PDF".to_vec()));
        renderer.request_page(1, 2);

        let responses = renderer.poll_responses();
        assert!(matches!(
            responses[0],
            RenderResponse::Loaded {
                generation: 1,
                page_count: 3,
                ..
            }
        ));
        assert!(matches!(&responses[1], RenderResponse::Page { text, .. } if text.page == 2));
        assert!(renderer.poll_responses().is_empty());
        assert_eq!(handle.pages(), vec![(1, 2)]);
    }

    #[test]
    fn held_answers_wait_for_release() {
        let mut answers = ScriptedAnswers::new();
        let handle = answers.clone();
        handle.hold();
        handle.push(Scripted::NoAnswer);

        answers.submit(request(1, "why?"));
        assert!(answers.poll_responses().is_empty());

        handle.release();
        let responses = answers.poll_responses();
        assert_eq!(responses.len(), 1);
        assert!(matches!(responses[0].result, Ok(AnswerOutcome::NoAnswer)));

        answers.submit(request(2, "how?"));
        let responses = answers.poll_responses();
        assert_eq!(
            responses[0].result.as_ref().ok(),
            Some(&AnswerOutcome::Answered("answer to how?".to_string()))
        );
    }
}
