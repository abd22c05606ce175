use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::popup::PopupState;

/// Bottom status bar showing popup state, viewed channel, and messages.
pub struct StatusBar<'a> {
    pub app: &'a App,
    pub state: &'a PopupState,
}

impl<'a> StatusBar<'a> {
    pub fn new(app: &'a App, state: &'a PopupState) -> Self {
        Self { app, state }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        // Background
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf[(x, area.y)].set_style(bg_style);
        }

        let mut spans = Vec::new();

        // State indicator
        let (label, color) = match self.state {
            PopupState::Loading => (" LOADING ", Color::Yellow),
            PopupState::Error { .. } => (" ERROR ", Color::Red),
            PopupState::Success(_) => (" READY ", Color::Blue),
        };
        let label_style = Style::default()
            .bg(color)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        spans.push(Span::styled(label, label_style));
        spans.push(Span::raw(" "));

        // Context
        let context = match self.app.popup.args().channel {
            Some(ref channel) => format!("#{channel}"),
            None => "chattertui".to_string(),
        };
        spans.push(Span::styled(context, bg_style));

        // Status message (right-aligned)
        if let Some(ref msg) = self.app.status_message {
            let left_width: usize = spans.iter().map(|s| s.width()).sum();
            let msg = truncate_to_width(msg, area.width as usize);
            let padding = (area.width as usize).saturating_sub(left_width + msg.width());
            if padding > 0 {
                spans.push(Span::styled(" ".repeat(padding), bg_style));
            }
            spans.push(Span::styled(
                msg,
                Style::default().bg(Color::DarkGray).fg(Color::Red),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

/// Longest prefix of `text` that fits in `max` terminal columns.
fn truncate_to_width(text: &str, max: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        used += unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used > max {
            return &text[..idx];
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::truncate_to_width;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_to_width("hello", 3), "hel");
        assert_eq!(truncate_to_width("héllo", 2), "hé");
        assert_eq!(truncate_to_width("ok", 10), "ok");
    }

    #[test]
    fn wide_chars_count_double() {
        assert_eq!(truncate_to_width("日本語", 4), "日本");
        assert_eq!(truncate_to_width("日本語", 3), "日");
    }
}
