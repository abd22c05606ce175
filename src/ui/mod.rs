pub mod error_popup;
pub mod status_bar;
pub mod user;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;

use status_bar::StatusBar;
use user::UserPopupView;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let state = app.popup.state();

    // Layout: main content + status bar
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    frame.render_widget(StatusBar::new(app, &state), status_area);
    frame.render_widget(background(app), main_area);

    // Bottom sheet anchored to the lower edge of the main area.
    let avatar_context = app.avatar_context();
    let sheet = bottom_sheet(main_area, UserPopupView::desired_height(avatar_context));
    let args = app.popup.args();
    frame.render_widget(
        UserPopupView::new(&state, &args.current_user_id, avatar_context)
            .avatar(app.avatar.as_ref())
            .channel(args.channel.as_deref()),
        sheet,
    );
}

/// Chat pane placeholder the sheet slides over.
fn background(app: &App) -> Paragraph<'static> {
    let title = match app.popup.args().channel {
        Some(ref channel) => format!(" #{channel} "),
        None => " chattertui ".to_string(),
    };
    Paragraph::new(Line::from(Span::styled(
        "q to close",
        Style::default().fg(Color::DarkGray),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
}

/// Full-width rect of `height` rows at the bottom of `area`.
fn bottom_sheet(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect::new(area.x, area.y + area.height - height, area.width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_hugs_the_bottom_edge() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(bottom_sheet(area, 8), Rect::new(0, 16, 80, 8));
    }

    #[test]
    fn sheet_is_clamped_to_small_terminals() {
        let area = Rect::new(0, 2, 40, 5);
        assert_eq!(bottom_sheet(area, 8), area);
    }
}
