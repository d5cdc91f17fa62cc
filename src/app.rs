use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::redirect::Policy;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

use crate::banner::Banner;
use crate::favicon::{Favicon, FaviconLoader, FaviconTarget};
use crate::feed::FeedSource;
use crate::timeline::{self, RefreshMode, RefreshOutcome, ScreenState, TimelineScreen};
use crate::util::{parse_copied_url, validate_url_for_open};

/// How long a status line message stays up.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Redirect policy: at most 3 hops, no loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Shared HTTP client for feed and favicon requests.
pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("pinfeed/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

// ============================================================================
// Navigation
// ============================================================================

/// Where activating a row or the banner takes the user.
pub trait Navigator: Send {
    fn open(&self, url: &Url) -> Result<()>;
}

/// Opens URLs in the system browser.
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn open(&self, url: &Url) -> Result<()> {
        // SEC: only http(s) reaches the desktop URL dispatcher
        validate_url_for_open(url)?;
        open::that(url.as_str())?;
        Ok(())
    }
}

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks and external sources, handled on the UI loop.
pub enum AppEvent {
    /// A refresh finished; sent exactly once per started refresh.
    RefreshComplete(RefreshOutcome),
    FaviconLoaded {
        target: FaviconTarget,
        favicon: Favicon,
    },
    /// The banner's hide timer for `generation` fired.
    BannerExpired {
        generation: u64,
    },
    /// A URL was copied (pasted into the terminal, or sent by another producer).
    UrlCopied {
        url: Url,
    },
    /// A background task panicked.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub timeline: TimelineScreen,
    pub banner: Banner,
    pub timeline_source: Arc<dyn FeedSource>,
    pub bookmark_source: Arc<dyn FeedSource>,
    pub refresh_mode: RefreshMode,
    pub favicons: FaviconLoader,
    navigator: Box<dyn Navigator>,
    refresh_handle: Option<JoinHandle<()>>,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(
        timeline_source: Arc<dyn FeedSource>,
        bookmark_source: Arc<dyn FeedSource>,
        favicons: FaviconLoader,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        Self {
            timeline: TimelineScreen::new(),
            banner: Banner::default(),
            timeline_source,
            bookmark_source,
            refresh_mode: RefreshMode::default(),
            favicons,
            navigator,
            refresh_handle: None,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
        }
    }

    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner = Banner::new(timeout);
        self
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message once it is older than three seconds.
    /// Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    pub fn is_busy(&self) -> bool {
        self.timeline.state() != ScreenState::Ready
    }

    /// Kick off the first load. The screen starts in `Loading`, so this
    /// bypasses the manual refresh gate.
    pub fn start_initial_load(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        if self.timeline.state() == ScreenState::Loading && self.refresh_handle.is_none() {
            self.spawn_refresh(event_tx);
        }
    }

    /// Manual refresh (`r`). Returns false when refused.
    pub fn request_refresh(&mut self, event_tx: &mpsc::Sender<AppEvent>) -> bool {
        if !self.timeline.begin_refresh() {
            return false;
        }
        self.spawn_refresh(event_tx);
        true
    }

    fn spawn_refresh(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        let timeline_source = Arc::clone(&self.timeline_source);
        let bookmark_source = Arc::clone(&self.bookmark_source);
        let mode = self.refresh_mode;
        let tx = event_tx.clone();

        tracing::debug!(?mode, "Spawning timeline refresh");

        self.refresh_handle = Some(tokio::spawn(async move {
            let outcome = crate::ui::catch_task_panic(timeline::refresh(
                timeline_source.as_ref(),
                bookmark_source.as_ref(),
                mode,
            ))
            .await;

            let event = match outcome {
                Ok(outcome) => AppEvent::RefreshComplete(outcome),
                Err(error) => {
                    tracing::error!(error = %error, "Refresh task panicked");
                    // Still complete the refresh so the screen leaves its spinner.
                    let _ = tx
                        .send(AppEvent::TaskPanicked {
                            task: "refresh",
                            error,
                        })
                        .await;
                    AppEvent::RefreshComplete(RefreshOutcome {
                        items: timeline::merge_current(
                            timeline_source.as_ref(),
                            bookmark_source.as_ref(),
                        ),
                        failed: vec![
                            timeline_source.name().to_string(),
                            bookmark_source.name().to_string(),
                        ],
                    })
                }
            };

            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Failed to send refresh result (receiver dropped)");
            }
        }));
    }

    /// Install a finished refresh: replace the list, end the spinner, redraw.
    pub fn handle_refresh_complete(&mut self, outcome: RefreshOutcome) {
        self.refresh_handle = None;
        let RefreshOutcome { items, failed } = outcome;
        self.timeline.finish_refresh(items);

        if !failed.is_empty() {
            self.set_status(format!("Refresh failed for {}", failed.join(", ")));
        }
        self.needs_redraw = true;
    }

    /// A URL was copied: show it on the banner and fetch its icon.
    pub fn handle_url_copied(&mut self, url: Url, event_tx: &mpsc::Sender<AppEvent>) {
        tracing::info!(url = %url, "URL copied");
        let target = self.banner.show(url.clone(), event_tx);
        let fetch = self.favicons.load(url.as_str(), target, event_tx);
        self.banner.track_favicon_fetch(fetch);
        self.needs_redraw = true;
    }

    /// Treat pasted text as a copy notification when it is a single http(s)
    /// URL. Handled in place: the loop must never wait on its own channel.
    pub fn handle_paste(&mut self, text: &str, event_tx: &mpsc::Sender<AppEvent>) -> bool {
        match parse_copied_url(text) {
            Some(url) => {
                self.handle_url_copied(url, event_tx);
                true
            }
            None => {
                tracing::debug!(len = text.len(), "Paste ignored, not a URL");
                false
            }
        }
    }

    pub fn handle_favicon_loaded(&mut self, target: FaviconTarget, favicon: Favicon) {
        let applied = match target {
            FaviconTarget::Row { index, generation } => {
                self.timeline.apply_favicon(index, generation, favicon)
            }
            FaviconTarget::Banner { generation } => self.banner.apply_favicon(generation, favicon),
        };
        if applied {
            self.needs_redraw = true;
        }
    }

    pub fn handle_banner_expired(&mut self, generation: u64) {
        if self.banner.expire(generation) {
            self.needs_redraw = true;
        }
    }

    /// Act on the banner: hide it and open its URL.
    pub fn tap_banner(&mut self) -> bool {
        match self.banner.tap() {
            Some(url) => {
                self.navigate(&url);
                self.needs_redraw = true;
                true
            }
            None => false,
        }
    }

    /// Open the selected row.
    pub fn open_selected(&mut self) {
        if let Some(url) = self.timeline.selected_item().map(|item| item.url.clone()) {
            self.navigate(&url);
        }
    }

    fn navigate(&mut self, url: &Url) {
        match self.navigator.open(url) {
            Ok(()) => self.set_status(format!("Opening {}", url)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to open URL");
                self.set_status(format!("Failed to open browser: {}", e));
            }
        }
    }

    pub fn load_visible_favicons(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        self.timeline.load_visible_favicons(&self.favicons, event_tx);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FetchError, Item};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct FixedSource {
        name: &'static str,
        items: Vec<Item>,
    }

    #[async_trait]
    impl FeedSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }
        fn collection(&self) -> Arc<Vec<Item>> {
            Arc::new(self.items.clone())
        }
        async fn fetch(&self) -> Result<usize, FetchError> {
            Ok(self.items.len())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNavigator(Arc<Mutex<Vec<Url>>>);

    impl Navigator for RecordingNavigator {
        fn open(&self, url: &Url) -> Result<()> {
            self.0.lock().unwrap().push(url.clone());
            Ok(())
        }
    }

    fn item(url: &str, hour: u32, minute: u32) -> Item {
        Item {
            url: Url::parse(url).unwrap(),
            title: url.to_string(),
            description: String::new(),
            author: "alice".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0).unwrap(),
            relative_time: String::new(),
        }
    }

    fn app_with(navigator: RecordingNavigator) -> App {
        let timeline = FixedSource {
            name: "timeline",
            items: vec![
                item("https://t.example/10", 10, 0),
                item("https://t.example/9", 9, 0),
            ],
        };
        let bookmarks = FixedSource {
            name: "bookmarks",
            items: vec![item("https://b.example/930", 9, 30)],
        };
        App::new(
            Arc::new(timeline),
            Arc::new(bookmarks),
            FaviconLoader::new(reqwest::Client::new(), "http://127.0.0.1:9"),
            Box::new(navigator),
        )
    }

    async fn next_refresh(rx: &mut mpsc::Receiver<AppEvent>) -> RefreshOutcome {
        loop {
            match rx.recv().await {
                Some(AppEvent::RefreshComplete(outcome)) => return outcome,
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    }

    #[tokio::test]
    async fn test_initial_load_then_manual_refresh() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut app = app_with(RecordingNavigator::default());

        assert!(!app.request_refresh(&tx), "refresh must wait for the initial load");
        app.start_initial_load(&tx);
        let outcome = next_refresh(&mut rx).await;
        app.handle_refresh_complete(outcome);

        assert_eq!(app.timeline.state(), ScreenState::Ready);
        assert_eq!(app.timeline.items().len(), 3);
        assert!(app.status_message.is_none());

        assert!(app.request_refresh(&tx));
        assert_eq!(app.timeline.state(), ScreenState::Refreshing);
        let outcome = next_refresh(&mut rx).await;
        app.handle_refresh_complete(outcome);
        assert_eq!(app.timeline.state(), ScreenState::Ready);
    }

    #[tokio::test]
    async fn test_open_selected_navigates_to_row_url() {
        let (tx, mut rx) = mpsc::channel(16);
        let navigator = RecordingNavigator::default();
        let mut app = app_with(navigator.clone());

        app.start_initial_load(&tx);
        let outcome = next_refresh(&mut rx).await;
        app.handle_refresh_complete(outcome);

        app.timeline.nav_down();
        app.open_selected();
        assert_eq!(
            navigator.0.lock().unwrap().as_slice(),
            &[Url::parse("https://b.example/930").unwrap()]
        );
    }

    #[tokio::test]
    async fn test_copy_then_tap_banner() {
        let (tx, _rx) = mpsc::channel(16);
        let navigator = RecordingNavigator::default();
        let mut app = app_with(navigator.clone());

        app.handle_url_copied(Url::parse("https://example.com").unwrap(), &tx);
        assert!(app.banner.is_visible());

        assert!(app.tap_banner());
        assert!(!app.banner.is_visible());
        assert_eq!(
            navigator.0.lock().unwrap().as_slice(),
            &[Url::parse("https://example.com").unwrap()]
        );
        assert!(!app.tap_banner());
    }

    #[tokio::test]
    async fn test_paste_shows_banner_with_full_channel() {
        let (tx, _rx) = mpsc::channel(1);
        tx.try_send(AppEvent::BannerExpired { generation: 0 }).unwrap();
        let mut app = app_with(RecordingNavigator::default());

        assert!(app.handle_paste("  https://example.com/a\n", &tx));
        assert_eq!(
            app.banner.content().map(|c| c.url.as_str()),
            Some("https://example.com/a")
        );
    }

    #[tokio::test]
    async fn test_paste_of_prose_ignored() {
        let (tx, _rx) = mpsc::channel(1);
        let mut app = app_with(RecordingNavigator::default());

        assert!(!app.handle_paste("hello there", &tx));
        assert!(!app.banner.is_visible());
    }

    #[test]
    fn test_status_expiry() {
        let navigator = RecordingNavigator::default();
        let mut app = app_with(navigator);
        app.set_status("hello");
        assert!(!app.clear_expired_status());
        app.status_message = Some(("old".into(), Instant::now() - Duration::from_secs(4)));
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }
}
