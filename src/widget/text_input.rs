use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use crate::theme::Base16Palette;

/// Single-line editable text. The cursor is a char index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEdit {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Clear,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply an edit. Returns true if the value changed.
    pub fn apply(&mut self, edit: InputEdit) -> bool {
        let len = self.value.chars().count();
        match edit {
            InputEdit::Insert(c) => {
                if c.is_control() {
                    return false;
                }
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            InputEdit::Backspace => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            InputEdit::Delete => {
                if self.cursor >= len {
                    return false;
                }
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            InputEdit::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            InputEdit::Right => {
                self.cursor = (self.cursor + 1).min(len);
                false
            }
            InputEdit::Home => {
                self.cursor = 0;
                false
            }
            InputEdit::End => {
                self.cursor = len;
                false
            }
            InputEdit::Clear => {
                let changed = !self.value.is_empty();
                self.value.clear();
                self.cursor = 0;
                changed
            }
        }
    }

    /// Chars to skip so the cursor fits in `width` columns.
    fn scroll_for_width(&self, width: usize) -> usize {
        if width == 0 {
            return self.cursor;
        }
        let widths: Vec<usize> = self
            .value
            .chars()
            .take(self.cursor)
            .map(|c| c.width().unwrap_or(0))
            .collect();
        let mut used: usize = widths.iter().sum();
        let mut skip = 0;
        // keep one column free for the cursor itself
        while used >= width && skip < widths.len() {
            used -= widths[skip];
            skip += 1;
        }
        skip
    }
}

pub fn render_input(
    f: &mut Frame,
    area: Rect,
    input: &TextInput,
    title: &str,
    focused: bool,
    palette: &Base16Palette,
) {
    let border_color = if focused {
        palette.base_0c
    } else {
        palette.base_03
    };
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    let skip = input.scroll_for_width(inner.width as usize);
    let visible: String = input.value().chars().skip(skip).collect();

    let line = if input.is_empty() && !focused {
        Line::from(Span::styled(
            "(empty)",
            Style::default()
                .fg(palette.base_03)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(Span::styled(visible, Style::default().fg(palette.base_05)))
    };

    f.render_widget(Paragraph::new(line).block(block), area);

    if focused && inner.width > 0 && inner.height > 0 {
        let offset: usize = input
            .value()
            .chars()
            .skip(skip)
            .take(input.cursor() - skip)
            .map(|c| c.width().unwrap_or(0))
            .sum();
        let x = inner.x + (offset as u16).min(inner.width - 1);
        f.set_cursor_position((x, inner.y));
    }
}
