//! Application event handling.
//!
//! Applies background task results (refreshes, favicons, banner timers) and
//! copy notifications to the application state.

use crate::app::{App, AppEvent};
use tokio::sync::mpsc;

/// Handle one event from the background channel.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::RefreshComplete(outcome) => {
            app.handle_refresh_complete(outcome);
        }
        AppEvent::FaviconLoaded { target, favicon } => {
            app.handle_favicon_loaded(target, favicon);
        }
        AppEvent::BannerExpired { generation } => {
            app.handle_banner_expired(generation);
        }
        AppEvent::UrlCopied { url } => {
            app.handle_url_copied(url, event_tx);
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
            app.needs_redraw = true;
        }
    }
}
