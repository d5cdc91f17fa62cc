//! Render functions for the TUI.
//!
//! Layout, top to bottom: the timeline list, the banner (only while a copy
//! notification is showing), the status bar.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{banner, status, timeline};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 8;

pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // EDGE-001: zero-sized areas would panic inside layout
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let banner_height = if app.banner.is_visible() {
        banner::HEIGHT
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(banner_height),
            Constraint::Length(1),
        ])
        .split(area);

    timeline::render(f, app, chunks[0]);
    if let Some(content) = app.banner.content() {
        banner::render(f, content, chunks[1]);
    }
    status::render(f, app, chunks[2]);
}
