use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent};
use log::{debug, error};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

use crate::theme::Base16Palette;
use crate::widget::centered_rect;

pub enum FilePickerAction {
    Open(PathBuf),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Directory browser that only lists sub-directories and PDF files
pub struct FilePicker {
    dir: PathBuf,
    entries: Vec<PickerEntry>,
    list_state: ListState,
    error: Option<String>,
}

/// Absolute form of `dir` so ".." always has somewhere to go. Paths that
/// cannot be resolved are kept as given.
fn resolve_dir(dir: PathBuf) -> PathBuf {
    std::fs::canonicalize(&dir).unwrap_or(dir)
}

/// Parent directory, `None` at the root or for a bare relative name
fn parent_dir(dir: &Path) -> Option<&Path> {
    dir.parent().filter(|p| !p.as_os_str().is_empty())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

impl FilePicker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let mut picker = Self {
            dir: resolve_dir(dir.into()),
            entries: Vec::new(),
            list_state: ListState::default(),
            error: None,
        };
        picker.refresh();
        picker
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    pub fn selected(&self) -> Option<&PickerEntry> {
        self.list_state.selected().and_then(|i| self.entries.get(i))
    }

    pub fn refresh(&mut self) {
        self.entries.clear();
        self.error = None;

        if let Some(parent) = parent_dir(&self.dir) {
            self.entries.push(PickerEntry {
                name: "..".to_string(),
                path: parent.to_path_buf(),
                is_dir: true,
            });
        }

        match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => {
                let mut found: Vec<PickerEntry> = read_dir
                    .filter_map(|entry| {
                        let entry = entry.ok()?;
                        let path = entry.path();
                        let name = entry.file_name().to_string_lossy().into_owned();
                        if name.starts_with('.') {
                            return None;
                        }
                        let is_dir = path.is_dir();
                        if !is_dir && !is_pdf(&path) {
                            return None;
                        }
                        Some(PickerEntry { name, path, is_dir })
                    })
                    .collect();
                found.sort_by(|a, b| {
                    b.is_dir
                        .cmp(&a.is_dir)
                        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                });
                self.entries.extend(found);
            }
            Err(e) => {
                error!("Failed to read directory {:?}: {e}", self.dir);
                self.error = Some(format!("Cannot read directory: {e}"));
            }
        }

        // Land on the first real entry rather than ".."
        let first = usize::from(self.entries.first().is_some_and(|e| e.name == ".."));
        let selected = if self.entries.len() > first {
            Some(first)
        } else if self.entries.is_empty() {
            None
        } else {
            Some(0)
        };
        self.list_state.select(selected);
        debug!("File picker at {:?}: {} entries", self.dir, self.entries.len());
    }

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let prev = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(prev));
    }

    fn enter_dir(&mut self, dir: PathBuf) {
        self.dir = resolve_dir(dir);
        self.refresh();
    }

    fn go_up(&mut self) {
        if let Some(parent) = parent_dir(&self.dir).map(Path::to_path_buf) {
            self.enter_dir(parent);
        }
    }

    /// Enter a directory or pick a PDF
    pub fn activate(&mut self) -> Option<FilePickerAction> {
        let entry = self.selected()?.clone();
        if entry.is_dir {
            self.enter_dir(entry.path);
            None
        } else {
            Some(FilePickerAction::Open(entry.path))
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<FilePickerAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.select_next();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select_previous();
                None
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => self.activate(),
            KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => {
                self.go_up();
                None
            }
            KeyCode::Esc | KeyCode::Char('q') => Some(FilePickerAction::Close),
            _ => None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup_area = centered_rect(70, 70, area);
        f.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = if let Some(error) = &self.error {
            vec![ListItem::new(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(palette.base_08),
            )))]
        } else if self.entries.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No PDF files here",
                Style::default().fg(palette.base_03),
            )))]
        } else {
            self.entries
                .iter()
                .map(|entry| {
                    let (label, color) = if entry.is_dir {
                        (format!("{}/", entry.name), palette.base_0d)
                    } else {
                        (entry.name.clone(), palette.base_05)
                    };
                    ListItem::new(Line::from(Span::styled(label, Style::default().fg(color))))
                })
                .collect()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" Open PDF - {} ", self.dir.display()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .highlight_style(
                Style::default()
                    .bg(palette.base_02)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        f.render_stateful_widget(list, popup_area, &mut self.list_state);
    }
}
