use crate::theme::Base16Palette;
use crate::widget::centered_rect;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub enum HelpPopupAction {
    Close,
}

pub struct HelpPopup {
    content: &'static str,
    scroll_offset: usize,
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPopup {
    pub fn new() -> Self {
        HelpPopup {
            content: include_str!("../../readme.txt"),
            scroll_offset: 0,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, palette: &Base16Palette) {
        let popup_area = centered_rect(70, 80, area);
        f.render_widget(Clear, popup_area);

        let lines: Vec<Line> = self
            .content
            .lines()
            .skip(self.scroll_offset)
            .map(|line| {
                Line::from(Span::styled(
                    format!("  {line}"),
                    Style::default().fg(palette.base_05),
                ))
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Help - Press ? or ESC to close ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.base_0c))
                    .style(Style::default().bg(palette.base_00)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, popup_area);
    }

    pub fn scroll_down(&mut self) {
        let max_lines = self.content.lines().count();
        if self.scroll_offset < max_lines.saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Option<HelpPopupAction> {
        use crossterm::event::KeyCode;

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_up();
                None
            }
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Some(HelpPopupAction::Close),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn help_lists_key_bindings() {
        let popup = HelpPopup::new();
        assert!(popup.content.contains("Tab"));
        assert!(popup.content.contains("Enter"));
    }

    #[test]
    fn scroll_is_bounded() {
        let mut popup = HelpPopup::new();
        popup.scroll_up();
        assert_eq!(popup.scroll_offset, 0);
        for _ in 0..1000 {
            popup.scroll_down();
        }
        assert_eq!(popup.scroll_offset, popup.content.lines().count() - 1);
    }

    #[test]
    fn esc_closes() {
        let mut popup = HelpPopup::new();
        let action = popup.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::empty()));
        assert!(matches!(action, Some(HelpPopupAction::Close)));
    }
}
