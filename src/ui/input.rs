//! Input handling for the TUI.
//!
//! Keys drive the timeline and the banner. Bracketed pastes are handled by
//! `App::handle_paste` straight from the event loop.

use crate::app::{App, AppEvent};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::Action;

/// Rows moved by PageUp/PageDown.
const PAGE_SIZE: usize = 10;

/// Main key dispatch.
///
/// While the banner is visible, Enter/`o` act on the banner rather than the
/// selected row, mirroring a tap on a notification that covers the list.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => app.timeline.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.timeline.nav_up(),
        KeyCode::Char('g') | KeyCode::Home => app.timeline.nav_top(),
        KeyCode::Char('G') | KeyCode::End => app.timeline.nav_bottom(),
        KeyCode::PageDown => app.timeline.page_down(PAGE_SIZE),
        KeyCode::PageUp => app.timeline.page_up(PAGE_SIZE),
        KeyCode::Char('r') => {
            if !app.request_refresh(event_tx) {
                tracing::debug!(state = ?app.timeline.state(), "Refresh ignored");
            }
        }
        KeyCode::Enter | KeyCode::Char('o') => {
            if !app.tap_banner() {
                app.open_selected();
            }
        }
        KeyCode::Char('b') => {
            app.tap_banner();
        }
        KeyCode::Esc => {
            app.banner.dismiss();
        }
        _ => {}
    }

    Ok(Action::Continue)
}
