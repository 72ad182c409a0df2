use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, error, info};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::document::PdfDocument;
use crate::event_source::EventSource;
use crate::notification::NotificationManager;
use crate::qa::{QaClient, QuestionDispatcher, QuestionService};
use crate::render::{DocumentRenderer, PageText, RenderResponse, RenderService};
use crate::settings::Settings;
use crate::theme::{Base16Palette, current_theme};
use crate::view_state::{AnswerView, Command, Effect, Field, LoadStatus, ViewState};
use crate::widget::file_picker::{FilePicker, FilePickerAction};
use crate::widget::help_popup::{HelpPopup, HelpPopupAction};
use crate::widget::spinner::Spinner;
use crate::widget::text_input::{InputEdit, render_input};

/// Which part of the screen receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Document,
    ServiceKey,
    ModelKey,
    Question,
}

impl Focus {
    const ORDER: [Focus; 4] = [
        Focus::Document,
        Focus::ServiceKey,
        Focus::ModelKey,
        Focus::Question,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn field(self) -> Option<Field> {
        match self {
            Focus::Document => None,
            Focus::ServiceKey => Some(Field::ServiceKey),
            Focus::ModelKey => Some(Field::ModelKey),
            Focus::Question => Some(Field::Question),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App {
    state: ViewState,
    renderer: Box<dyn DocumentRenderer>,
    questions: Box<dyn QuestionDispatcher>,
    focus: Focus,
    file_picker: Option<FilePicker>,
    help_popup: Option<HelpPopup>,
    notifications: NotificationManager,
    /// Latest rendered page of the current document
    page_text: Option<Arc<PageText>>,
    page_error: Option<String>,
    page_scroll: u16,
    spinner: Spinner,
    start_dir: PathBuf,
}

impl App {
    pub fn new(
        renderer: Box<dyn DocumentRenderer>,
        questions: Box<dyn QuestionDispatcher>,
        start_dir: PathBuf,
    ) -> Self {
        Self {
            state: ViewState::new(),
            renderer,
            questions,
            focus: Focus::Document,
            file_picker: None,
            help_popup: None,
            notifications: NotificationManager::new(),
            page_text: None,
            page_error: None,
            page_scroll: 0,
            spinner: Spinner::new(),
            start_dir,
        }
    }

    /// Wire the real render worker and HTTP client
    pub fn with_settings(settings: &Settings) -> Result<Self> {
        let client = QaClient::new(settings.endpoint.clone(), settings.request_timeout())?;
        info!(
            "Questions go to {} (timeout: {:?})",
            client.endpoint(),
            settings.request_timeout()
        );
        let start_dir = settings
            .documents_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self::new(
            Box::new(RenderService::new()),
            Box::new(QuestionService::new(Box::new(client))),
            start_dir,
        ))
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub fn is_file_picker_open(&self) -> bool {
        self.file_picker.is_some()
    }

    pub fn is_help_open(&self) -> bool {
        self.help_popup.is_some()
    }

    /// The rendered text of the page on screen, if it has arrived
    pub fn visible_page(&self) -> Option<&PageText> {
        self.page_text
            .as_deref()
            .filter(|text| text.page == self.state.current_page())
    }

    pub fn open_path(&mut self, path: &Path) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.start_dir = parent.to_path_buf();
        }
        match PdfDocument::open(path) {
            Ok(document) => self.open_document(document),
            Err(e) => {
                error!("{e:#}");
                self.notifications.error(format!("{e:#}"));
            }
        }
    }

    pub fn open_document(&mut self, document: PdfDocument) {
        self.apply(Command::SelectDocument(document));
    }

    /// Apply a command to the view state and run its effects
    pub fn apply(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadDocument {
                    generation,
                    document,
                } => {
                    self.page_text = None;
                    self.page_error = None;
                    self.page_scroll = 0;
                    self.renderer.load(generation, &document);
                }

                Effect::RenderPage { generation, page } => {
                    self.page_error = None;
                    self.renderer.request_page(generation, page);
                }

                Effect::SendQuestion(request) => {
                    self.spinner = Spinner::new();
                    self.questions.submit(request);
                }

                Effect::Notify { level, message } => {
                    self.notifications.notify(message, level);
                }
            }
        }
    }

    fn handle_render_response(&mut self, response: RenderResponse) {
        let current = self.state.generation();
        match response {
            RenderResponse::Loaded {
                generation,
                page_count,
                title,
            } => self.apply(Command::DocumentLoaded {
                generation,
                page_count,
                title,
            }),

            RenderResponse::LoadFailed { generation, error } => {
                self.apply(Command::DocumentFailed {
                    generation,
                    reason: error.to_string(),
                });
            }

            RenderResponse::Page { generation, text } => {
                if generation == current && text.page == self.state.current_page() {
                    self.page_scroll = 0;
                    self.page_text = Some(text);
                } else {
                    debug!("Dropping stale page {} of document {generation}", text.page);
                }
            }

            RenderResponse::PageFailed {
                generation,
                page,
                error,
            } => {
                if generation == current && page == self.state.current_page() {
                    error!("Failed to render page {page}: {error}");
                    self.page_error = Some(error.to_string());
                }
            }
        }
    }

    /// Collect worker results and advance timers. Returns true if the
    /// screen needs a redraw.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;

        for response in self.renderer.poll_responses() {
            self.handle_render_response(response);
            changed = true;
        }

        for response in self.questions.poll_responses() {
            self.apply(Command::AnswerArrived {
                id: response.id,
                result: response.result,
            });
            changed = true;
        }

        if self.state.is_loading() && self.spinner.tick() {
            changed = true;
        }

        if self.notifications.update() {
            changed = true;
        }

        changed
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
            Event::Paste(text) => {
                if let Some(field) = self.focus.field() {
                    for c in text.chars() {
                        self.apply(Command::Edit(field, InputEdit::Insert(c)));
                    }
                }
                None
            }
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppAction::Quit);
        }

        if let Some(popup) = self.help_popup.as_mut() {
            if let Some(HelpPopupAction::Close) = popup.handle_key(key) {
                self.help_popup = None;
            }
            return None;
        }

        if let Some(picker) = self.file_picker.as_mut() {
            let action = picker.handle_key(key);
            let dir = picker.dir().to_path_buf();
            match action {
                Some(FilePickerAction::Open(path)) => {
                    self.file_picker = None;
                    self.open_path(&path);
                }
                Some(FilePickerAction::Close) => {
                    self.file_picker = None;
                    self.start_dir = dir;
                }
                None => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return None;
            }
            KeyCode::Esc => {
                self.focus = Focus::Document;
                return None;
            }
            _ => {}
        }

        match self.focus.field() {
            None => self.handle_document_key(key),
            Some(field) => {
                self.handle_field_key(field, key);
                None
            }
        }
    }

    fn handle_document_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('o') => {
                self.file_picker = Some(FilePicker::new(self.start_dir.clone()));
            }
            KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                self.apply(Command::NextPage);
            }
            KeyCode::Char('h') | KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                self.apply(Command::PreviousPage);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let max = self
                    .visible_page()
                    .map_or(0, |p| p.lines.len().saturating_sub(1));
                self.page_scroll = (self.page_scroll as usize + 1).min(max) as u16;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.page_scroll = self.page_scroll.saturating_sub(1);
            }
            KeyCode::Char('a') | KeyCode::Char('i') | KeyCode::Enter => {
                self.focus = Focus::Question;
            }
            KeyCode::Char('?') => {
                self.help_popup = Some(HelpPopup::new());
            }
            _ => {}
        }
        None
    }

    fn handle_field_key(&mut self, field: Field, key: KeyEvent) {
        let edit = match key.code {
            KeyCode::Enter => {
                if field == Field::Question {
                    self.apply(Command::Submit);
                } else {
                    self.focus = self.focus.next();
                }
                return;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputEdit::Clear
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                InputEdit::Insert(c)
            }
            KeyCode::Backspace => InputEdit::Backspace,
            KeyCode::Delete => InputEdit::Delete,
            KeyCode::Left => InputEdit::Left,
            KeyCode::Right => InputEdit::Right,
            KeyCode::Home => InputEdit::Home,
            KeyCode::End => InputEdit::End,
            _ => return,
        };
        self.apply(Command::Edit(field, edit));
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let palette = current_theme();
        let area = f.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(f, rows[0], palette);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        self.draw_page(f, columns[0], palette);
        self.draw_form(f, columns[1], palette);
        self.draw_footer(f, rows[2], palette);

        if let Some(picker) = self.file_picker.as_mut() {
            picker.render(f, area, palette);
        }
        if let Some(popup) = &self.help_popup {
            popup.render(f, area, palette);
        }
    }

    fn draw_header(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let mut spans = vec![Span::styled(
            " pdfask ",
            Style::default()
                .fg(palette.base_00)
                .bg(palette.base_0d)
                .add_modifier(Modifier::BOLD),
        )];

        if let Some(doc) = self.state.document() {
            let title = match self.state.load_status() {
                LoadStatus::Ready { title: Some(title) } => format!(" {title} ({})", doc.name()),
                _ => format!(" {}", doc.name()),
            };
            spans.push(Span::styled(title, Style::default().fg(palette.base_05)));
        }

        f.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.base_01)),
            area,
        );
    }

    fn draw_page(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let focused = self.focus == Focus::Document;
        let title = match self.state.load_status() {
            LoadStatus::Ready { .. } => format!(
                " Page {} of {} ",
                self.state.current_page(),
                self.state.page_count()
            ),
            _ => " Document ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused {
                palette.base_0c
            } else {
                palette.base_03
            }));

        let muted = Style::default()
            .fg(palette.base_03)
            .add_modifier(Modifier::ITALIC);
        let name = self.state.document().map_or("", |d| d.name());

        let lines: Vec<Line> = match self.state.load_status() {
            LoadStatus::NoDocument => vec![Line::from(Span::styled(
                "No file selected. Press o to open a PDF.",
                muted,
            ))],
            LoadStatus::Loading => {
                vec![Line::from(Span::styled(format!("Loading {name}..."), muted))]
            }
            LoadStatus::Failed(reason) => vec![Line::from(Span::styled(
                format!("Could not open {name}: {reason}"),
                Style::default().fg(palette.base_08),
            ))],
            LoadStatus::Ready { .. } => {
                if let Some(error) = &self.page_error {
                    vec![Line::from(Span::styled(
                        format!("Could not render this page: {error}"),
                        Style::default().fg(palette.base_08),
                    ))]
                } else if let Some(page) = self.visible_page() {
                    if page.lines.is_empty() {
                        vec![Line::from(Span::styled("(no text on this page)", muted))]
                    } else {
                        page.lines
                            .iter()
                            .map(|l| {
                                Line::from(Span::styled(
                                    l.clone(),
                                    Style::default().fg(palette.base_05),
                                ))
                            })
                            .collect()
                    }
                } else {
                    vec![Line::from(Span::styled(
                        format!("Rendering page {}...", self.state.current_page()),
                        muted,
                    ))]
                }
            }
        };

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.page_scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn draw_form(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
            ])
            .split(area);

        render_input(
            f,
            rows[0],
            self.state.field(Field::ServiceKey),
            "RAG API key",
            self.focus == Focus::ServiceKey,
            palette,
        );
        render_input(
            f,
            rows[1],
            self.state.field(Field::ModelKey),
            "OpenAI key",
            self.focus == Focus::ModelKey,
            palette,
        );
        render_input(
            f,
            rows[2],
            self.state.field(Field::Question),
            "Ask a question (Enter)",
            self.focus == Focus::Question,
            palette,
        );

        let question_line = match self.state.last_answered_question() {
            Some(q) => Line::from(vec![
                Span::styled("• ", Style::default().fg(palette.base_0d)),
                Span::styled(q.to_string(), Style::default().fg(palette.base_05)),
            ]),
            None => Line::from(""),
        };
        f.render_widget(
            Paragraph::new(question_line).block(
                Block::default()
                    .title(" Question ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_03)),
            ),
            rows[3],
        );

        let answer_lines: Vec<Line> = match self.state.answer_view() {
            AnswerView::Idle => vec![],
            AnswerView::Loading => vec![
                Line::from(Span::styled(
                    format!("{} Loading...", self.spinner.symbol()),
                    Style::default().fg(palette.base_0a),
                )),
                Line::from(Span::styled(
                    self.state.active_question().to_string(),
                    Style::default()
                        .fg(palette.base_03)
                        .add_modifier(Modifier::ITALIC),
                )),
            ],
            AnswerView::Answered(text) => text
                .lines()
                .map(|l| {
                    Line::from(Span::styled(
                        l.to_string(),
                        Style::default().fg(palette.base_05),
                    ))
                })
                .collect(),
        };
        f.render_widget(
            Paragraph::new(answer_lines)
                .block(
                    Block::default()
                        .title(" Answer ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(palette.base_03)),
                )
                .wrap(Wrap { trim: false }),
            rows[4],
        );
    }

    fn draw_footer(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let line = match self.notifications.current() {
            Some(notification) => notification.styled_line(palette),
            None => {
                let hints = match self.focus {
                    Focus::Document => "o open  h/l page  Tab form  ? help  q quit",
                    Focus::Question => "Enter ask  Tab next  Esc page  Ctrl+C quit",
                    _ => "Enter next  Tab next  Esc page  Ctrl+C quit",
                };
                Line::from(Span::styled(hints, Style::default().fg(palette.base_04)))
            }
        };
        f.render_widget(Paragraph::new(line), area);
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut needs_redraw = true;

    loop {
        if app.tick() {
            needs_redraw = true;
        }
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        if !event_source.poll(tick_rate)? {
            continue;
        }

        let mut events_processed = 0;
        loop {
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(&event) == Some(AppAction::Quit) {
                info!("Quit requested");
                return Ok(());
            }
            needs_redraw = true;
            // Deliver worker results between keystrokes so a burst of input
            // sees the state the previous key produced.
            app.tick();

            if events_processed >= 50 || !event_source.poll(Duration::ZERO)? {
                break;
            }
        }
    }
}
