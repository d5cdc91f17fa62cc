use crate::app::App;
use crate::timeline::ScreenState;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    // EDGE-001: Guard against zero-width/height areas
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        match app.timeline.state() {
            ScreenState::Loading => Cow::Borrowed("Loading... [q]uit"),
            ScreenState::Refreshing => Cow::Borrowed("Refreshing... [j/k]move [o]pen [q]uit"),
            ScreenState::Ready => Cow::Owned(format!(
                "{} items | [r]efresh [j/k]move [o]pen [b]anner [q]uit | paste a URL to preview",
                app.timeline.items().len()
            )),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
