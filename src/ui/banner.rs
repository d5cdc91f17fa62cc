use crate::banner::BannerContent;
use crate::favicon::ImageFormat;
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Rows taken by the banner, borders included.
pub(super) const HEIGHT: u16 = 3;

fn icon_label(content: &BannerContent) -> &'static str {
    match content.favicon.as_ref().map(|f| f.format) {
        None => "   ",
        Some(ImageFormat::Svg) => "◆  ",
        Some(_) => "●  ",
    }
}

/// Render the copy-notification banner.
pub fn render(f: &mut Frame, content: &BannerContent, area: Rect) {
    if area.width < 4 || area.height < HEIGHT {
        return;
    }

    let hint = "  ↵ open  esc dismiss";
    let available = usize::from(area.width.saturating_sub(2))
        .saturating_sub(icon_label(content).chars().count() + hint.chars().count());
    let label = truncate_to_width(&content.label, available).into_owned();

    let line = Line::from(vec![
        Span::styled(icon_label(content), Style::default().fg(Color::Cyan)),
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Copied URL ");

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(line).block(block), area);
}
