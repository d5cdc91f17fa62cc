//! Timeline screen state and the refresh pipeline.
//!
//! The screen moves through three states: `Loading` (first fetch, nothing to
//! show yet), `Ready`, and `Refreshing` (a manual refresh is in flight while
//! the previous list stays on screen). The visible list is replaced wholesale
//! when a refresh completes.

use std::ops::Range;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::AppEvent;
use crate::favicon::{Favicon, FaviconLoader, FaviconTarget};
use crate::feed::{merge_by_date, FeedSource, Item};

/// How the two sources are fetched during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Timeline first; bookmarks start only after the timeline fetch finished.
    #[default]
    Sequential,
    /// Both fetches in flight at once, joined before merging.
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Loading,
    Ready,
    Refreshing,
}

/// Result of one refresh: the merged list plus the sources that failed.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub items: Vec<Item>,
    pub failed: Vec<String>,
}

/// Fetch both sources and merge their collections newest first.
///
/// Fetch errors are logged and otherwise swallowed: a failed source keeps its
/// previous collection, and the merge always runs. Every call yields exactly
/// one outcome.
pub async fn refresh(
    timeline: &dyn FeedSource,
    bookmarks: &dyn FeedSource,
    mode: RefreshMode,
) -> RefreshOutcome {
    let (timeline_result, bookmarks_result) = match mode {
        RefreshMode::Sequential => {
            let t = timeline.fetch().await;
            let b = bookmarks.fetch().await;
            (t, b)
        }
        RefreshMode::Concurrent => tokio::join!(timeline.fetch(), bookmarks.fetch()),
    };

    let mut failed = Vec::new();
    for (source, result) in [(timeline, timeline_result), (bookmarks, bookmarks_result)] {
        if let Err(e) = result {
            tracing::warn!(source = %source.name(), error = %e, "Feed refresh failed, keeping previous items");
            failed.push(source.name().to_string());
        }
    }

    let items = merge_current(timeline, bookmarks);
    tracing::info!(items = items.len(), failed = failed.len(), "Timeline refreshed");
    RefreshOutcome { items, failed }
}

/// Merge whatever both sources currently hold, without fetching.
pub fn merge_current(timeline: &dyn FeedSource, bookmarks: &dyn FeedSource) -> Vec<Item> {
    merge_by_date(&timeline.collection(), &bookmarks.collection())
}

/// Per-row view state that does not belong to the item itself.
#[derive(Default)]
pub struct RowBinding {
    generation: u64,
    pub favicon: Option<Favicon>,
    fetch: Option<JoinHandle<()>>,
    requested: bool,
}

impl RowBinding {
    fn cancel(&mut self) {
        if let Some(handle) = self.fetch.take() {
            handle.abort();
        }
    }
}

pub struct TimelineScreen {
    state: ScreenState,
    items: Arc<Vec<Item>>,
    rows: Vec<RowBinding>,
    selected: usize,
    next_generation: u64,
    /// Manual refresh stays disabled until the initial load has completed.
    refresh_enabled: bool,
    /// Rows the last frame actually drew, for lazy favicon loading.
    pub visible_rows: Range<usize>,
}

impl TimelineScreen {
    pub fn new() -> Self {
        Self {
            state: ScreenState::Loading,
            items: Arc::new(Vec::new()),
            rows: Vec::new(),
            selected: 0,
            next_generation: 0,
            refresh_enabled: false,
            visible_rows: 0..0,
        }
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn items(&self) -> &Arc<Vec<Item>> {
        &self.items
    }

    pub fn rows(&self) -> &[RowBinding] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    /// Try to start a manual refresh. Refused during the initial load and
    /// while another refresh is running.
    pub fn begin_refresh(&mut self) -> bool {
        if !self.refresh_enabled || self.state != ScreenState::Ready {
            return false;
        }
        self.state = ScreenState::Refreshing;
        true
    }

    /// Install a refreshed list and leave the loading/refreshing state.
    ///
    /// Every row is rebound: in-flight favicon fetches for the old rows are
    /// aborted and the rows get new generations, so late results are dropped.
    pub fn finish_refresh(&mut self, items: Vec<Item>) {
        for row in &mut self.rows {
            row.cancel();
        }

        self.rows = (0..items.len())
            .map(|_| {
                self.next_generation = self.next_generation.wrapping_add(1);
                RowBinding {
                    generation: self.next_generation,
                    ..RowBinding::default()
                }
            })
            .collect();
        self.items = Arc::new(items);
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
        self.state = ScreenState::Ready;
        self.refresh_enabled = true;
    }

    /// Start favicon fetches for drawn rows that have not asked for one yet.
    pub fn load_visible_favicons(&mut self, loader: &FaviconLoader, event_tx: &mpsc::Sender<AppEvent>) {
        let end = self.visible_rows.end.min(self.rows.len());
        let start = self.visible_rows.start.min(end);

        for index in start..end {
            let row = &mut self.rows[index];
            if row.requested {
                continue;
            }
            row.requested = true;
            let target = FaviconTarget::Row {
                index,
                generation: row.generation,
            };
            row.fetch = loader.load(self.items[index].url.as_str(), target, event_tx);
        }
    }

    /// Apply a favicon result if the row still holds the binding it was fetched for.
    pub fn apply_favicon(&mut self, index: usize, generation: u64, favicon: Favicon) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if row.generation == generation => {
                row.favicon = Some(favicon);
                row.fetch = None;
                true
            }
            _ => false,
        }
    }

    pub fn nav_down(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn nav_top(&mut self) {
        self.selected = 0;
    }

    pub fn nav_bottom(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn page_down(&mut self, page: usize) {
        self.selected = (self.selected + page.max(1)).min(self.items.len().saturating_sub(1));
    }

    pub fn page_up(&mut self, page: usize) {
        self.selected = self.selected.saturating_sub(page.max(1));
    }
}

impl Default for TimelineScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimelineScreen {
    fn drop(&mut self) {
        for row in &mut self.rows {
            row.cancel();
        }
    }
}
