use crate::app::App;
use crate::feed::Item;
use crate::timeline::{RowBinding, ScreenState};
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use std::ops::Range;

use super::helpers::spinner_frame;

/// Lines per row: title, byline, description.
const ROW_HEIGHT: u16 = 3;

/// Keep `selected` inside a window of `capacity` rows starting near `previous`.
fn scroll_window(previous: usize, selected: usize, capacity: usize, len: usize) -> Range<usize> {
    if capacity == 0 || len == 0 {
        return 0..0;
    }
    let mut start = previous.min(len.saturating_sub(1));
    if selected < start {
        start = selected;
    } else if selected >= start + capacity {
        start = selected + 1 - capacity;
    }
    // Never leave blank rows at the bottom when earlier rows could fill them.
    start = start.min(len.saturating_sub(capacity));
    start..(start + capacity).min(len)
}

fn row_lines(item: &Item, row: Option<&RowBinding>, selected: bool, width: usize) -> ListItem<'static> {
    let icon = match row.and_then(|r| r.favicon.as_ref()) {
        Some(_) => Span::styled("● ", Style::default().fg(Color::Cyan)),
        None => Span::styled("· ", Style::default().fg(Color::DarkGray)),
    };

    let title_style = if selected {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let title = truncate_to_width(&item.title, width.saturating_sub(2)).into_owned();

    let byline = format!("{} · {} · {}", item.author, item.relative_time, item.domain());
    let byline = truncate_to_width(&byline, width.saturating_sub(2)).into_owned();

    let description = item.description.replace(['\n', '\r'], " ");
    let description = truncate_to_width(&description, width.saturating_sub(2)).into_owned();

    ListItem::new(vec![
        Line::from(vec![icon, Span::styled(title, title_style)]),
        Line::from(Span::styled(
            format!("  {}", byline),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            format!("  {}", description),
            Style::default().fg(Color::Gray),
        )),
    ])
}

/// Render the timeline panel and record which rows were drawn.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let screen = &app.timeline;

    let title = match screen.state() {
        ScreenState::Refreshing => format!(" Timeline {} refreshing ", spinner_frame(app.spinner_frame)),
        _ => " Timeline ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if screen.state() == ScreenState::Loading {
        let msg = Paragraph::new(format!("{} Loading timeline...", spinner_frame(app.spinner_frame)))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    if screen.items().is_empty() {
        let msg = Paragraph::new("Nothing here yet. Press r to refresh.")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(msg, area);
        app.timeline.visible_rows = 0..0;
        return;
    }

    let inner_height = area.height.saturating_sub(2);
    let capacity = usize::from(inner_height / ROW_HEIGHT);
    let width = usize::from(area.width.saturating_sub(2));
    let window = scroll_window(
        screen.visible_rows.start,
        screen.selected(),
        capacity,
        screen.items().len(),
    );

    let rows: Vec<ListItem> = window
        .clone()
        .map(|i| {
            row_lines(
                &screen.items()[i],
                screen.rows().get(i),
                i == screen.selected(),
                width,
            )
        })
        .collect();

    f.render_widget(List::new(rows).block(block), area);
    app.timeline.visible_rows = window;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_window_follows_selection() {
        assert_eq!(scroll_window(0, 0, 5, 20), 0..5);
        assert_eq!(scroll_window(0, 7, 5, 20), 3..8);
        assert_eq!(scroll_window(3, 4, 5, 20), 3..8);
        assert_eq!(scroll_window(10, 2, 5, 20), 2..7);
    }

    #[test]
    fn test_scroll_window_clamps_to_len() {
        assert_eq!(scroll_window(0, 1, 5, 3), 0..3);
        assert_eq!(scroll_window(50, 2, 5, 3), 0..3);
        assert_eq!(scroll_window(18, 19, 5, 20), 15..20);
        assert_eq!(scroll_window(0, 0, 0, 3), 0..0);
        assert_eq!(scroll_window(0, 0, 5, 0), 0..0);
    }
}
