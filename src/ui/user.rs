use chrono::Utc;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::avatar::{Avatar, DisplayContext};
use crate::popup::state::follow_age;
use crate::popup::{PopupState, UserInfo};
use crate::ui::error_popup::ErrorPopup;

/// Bottom sheet with the user's avatar, name, dates, and actions.
pub struct UserPopupView<'a> {
    state: &'a PopupState,
    avatar: Option<&'a Avatar>,
    avatar_context: DisplayContext,
    viewer_id: &'a str,
    channel: Option<&'a str>,
}

impl<'a> UserPopupView<'a> {
    pub fn new(state: &'a PopupState, viewer_id: &'a str, avatar_context: DisplayContext) -> Self {
        Self {
            state,
            avatar: None,
            avatar_context,
            viewer_id,
            channel: None,
        }
    }

    pub fn avatar(mut self, avatar: Option<&'a Avatar>) -> Self {
        self.avatar = avatar;
        self
    }

    pub fn channel(mut self, channel: Option<&'a str>) -> Self {
        self.channel = channel;
        self
    }

    /// Rows needed to show a loaded user.
    pub fn desired_height(avatar_context: DisplayContext) -> u16 {
        // Borders, details (at least 4 rows), spacer, action row.
        avatar_context.rows.max(4) + 4
    }

    fn details(&self, user: &'a UserInfo) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        let name_style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        let mut name = vec![Span::styled(user.display_name.as_str(), name_style)];
        if !user.display_name.eq_ignore_ascii_case(&user.username) {
            name.push(Span::styled(
                format!(" ({})", user.username),
                Style::default().fg(Color::Gray),
            ));
        }
        lines.push(Line::from(name));

        lines.push(Line::from(Span::styled(
            format!("@{}", user.username),
            Style::default().fg(Color::DarkGray),
        )));

        lines.push(Line::from(vec![
            Span::styled("Account created ", Style::default().fg(Color::DarkGray)),
            Span::raw(user.created_at.as_str()),
        ]));

        if let (Some(since), Some(followed_at)) = (&user.following_since, user.followed_at) {
            let channel = self.channel.unwrap_or("channel");
            lines.push(Line::from(vec![
                Span::styled(
                    format!("Following #{channel} since "),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(since.as_str()),
                Span::styled(
                    format!(" ({})", follow_age(followed_at, Utc::now())),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        } else if self.channel.is_some() {
            lines.push(Line::from(Span::styled(
                "Not following this channel",
                Style::default().fg(Color::DarkGray),
            )));
        }

        if user.is_blocked {
            lines.push(Line::from(Span::styled(
                "Blocked",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }

        lines
    }
}

/// Key hints for the actions available on a loaded user.
pub fn action_hints(user: &UserInfo, viewer_id: &str) -> Vec<(&'static str, &'static str)> {
    let mut hints = Vec::new();
    if user.user_id != viewer_id {
        hints.push(("f", if user.is_following { "Unfollow" } else { "Follow" }));
        hints.push(("b", if user.is_blocked { "Unblock" } else { "Block" }));
    }
    hints.push(("o", "Open channel"));
    hints.push(("q", "Close"));
    hints
}

impl Widget for UserPopupView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let title = match self.state {
            PopupState::Success(user) => format!(" {} ", user.display_name),
            _ => " User ".to_string(),
        };
        let block = Block::default()
            .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
            .title(title)
            .title_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        block.render(area, buf);

        let user = match self.state {
            PopupState::Loading => {
                let [_, mid, _] = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(1),
                    Constraint::Fill(1),
                ])
                .areas(inner);
                Paragraph::new(Span::styled(
                    "Loading\u{2026}",
                    Style::default().fg(Color::DarkGray),
                ))
                .alignment(Alignment::Center)
                .render(mid, buf);
                return;
            }
            PopupState::Error { .. } => {
                ErrorPopup::new("Couldn't load this user").render(inner, buf);
                return;
            }
            PopupState::Success(user) => user,
        };

        let [info_area, _, actions_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        // -- Header: avatar with details beside it --
        let placeholder;
        let avatar = match self.avatar {
            Some(avatar) => avatar,
            None => {
                placeholder = Avatar::placeholder(self.avatar_context);
                &placeholder
            }
        };
        Paragraph::new(avatar.inline(self.details(user))).render(info_area, buf);

        // -- Actions --
        let mut spans = Vec::new();
        for (key, label) in action_hints(user, self.viewer_id) {
            spans.push(Span::styled(
                format!(" {key} "),
                Style::default()
                    .bg(Color::DarkGray)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" {label}   ")));
        }
        Paragraph::new(Line::from(spans)).render(actions_area, buf);
    }
}
