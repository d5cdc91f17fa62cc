//! The copy-notification banner.
//!
//! Shown when a URL lands on the clipboard (a terminal paste), hidden again
//! after a timeout or when the user acts on it. There is only ever one banner:
//! a new copy event overwrites the old one and restarts its timer.
//!
//! Each `show` bumps a generation counter. The hide timer and the favicon
//! fetch both carry the generation they were started for, and both handles are
//! aborted whenever the banner is re-shown or dismissed, so at most one hide
//! action is ever pending and no stale icon lands on a newer URL.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::app::AppEvent;
use crate::favicon::{Favicon, FaviconTarget};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the banner is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerContent {
    pub url: Url,
    pub label: String,
    pub favicon: Option<Favicon>,
}

pub struct Banner {
    content: Option<BannerContent>,
    generation: u64,
    timeout: Duration,
    hide_timer: Option<JoinHandle<()>>,
    favicon_fetch: Option<JoinHandle<()>>,
}

impl Banner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            content: None,
            generation: 0,
            timeout,
            hide_timer: None,
            favicon_fetch: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&BannerContent> {
        self.content.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show `url`, clearing any previous icon, and arm a fresh hide timer.
    ///
    /// The previous timer and favicon fetch are aborted first. Returns the
    /// favicon target for this showing; hand the spawned fetch back through
    /// [`Banner::track_favicon_fetch`].
    pub fn show(&mut self, url: Url, event_tx: &mpsc::Sender<AppEvent>) -> FaviconTarget {
        self.cancel_tasks();
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        self.content = Some(BannerContent {
            label: display_url(&url),
            url,
            favicon: None,
        });

        let tx = event_tx.clone();
        let timeout = self.timeout;
        self.hide_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx.send(AppEvent::BannerExpired { generation }).await;
        }));

        tracing::debug!(generation, "Banner shown");
        FaviconTarget::Banner { generation }
    }

    /// Keep the handle of the favicon fetch started for the current showing.
    pub fn track_favicon_fetch(&mut self, handle: Option<JoinHandle<()>>) {
        if let Some(old) = std::mem::replace(&mut self.favicon_fetch, handle) {
            old.abort();
        }
    }

    /// Apply a favicon result. Ignored unless it was fetched for the current showing.
    pub fn apply_favicon(&mut self, generation: u64, favicon: Favicon) -> bool {
        if generation != self.generation {
            return false;
        }
        match &mut self.content {
            Some(content) => {
                content.favicon = Some(favicon);
                self.favicon_fetch = None;
                true
            }
            None => false,
        }
    }

    /// The hide timer for `generation` fired. Returns true if the banner was hidden.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.content.is_none() {
            tracing::debug!(
                generation,
                current = self.generation,
                "Ignoring stale banner timer"
            );
            return false;
        }
        self.hide_timer = None;
        self.hide();
        true
    }

    /// The user acted on the banner: hide it now and hand back its URL.
    pub fn tap(&mut self) -> Option<Url> {
        let content = self.content.take()?;
        self.cancel_tasks();
        Some(content.url)
    }

    /// Hide without navigating. Returns false if nothing was showing.
    pub fn dismiss(&mut self) -> bool {
        if self.content.is_none() {
            return false;
        }
        self.hide();
        true
    }

    fn hide(&mut self) {
        self.content = None;
        self.cancel_tasks();
    }

    fn cancel_tasks(&mut self) {
        if let Some(handle) = self.hide_timer.take() {
            handle.abort();
        }
        if let Some(handle) = self.favicon_fetch.take() {
            handle.abort();
        }
    }
}

/// Textual form of a URL as the user copied it: a bare origin keeps no trailing slash.
fn display_url(url: &Url) -> String {
    let text = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        text.trim_end_matches('/').to_string()
    } else {
        text.to_string()
    }
}

impl Default for Banner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Drop for Banner {
    fn drop(&mut self) {
        self.cancel_tasks();
    }
}
