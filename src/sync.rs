//! Resynchronization with the server-rendered feed list and changelog.
//!
//! Every mutation ends in a resync: fetch the list markup, replace the list
//! region wholesale, and rebuild all per-row state. Requests are coalesced
//! by generation. A newer request aborts the in-flight fetch it supersedes,
//! and a response whose generation is no longer current is dropped, so the
//! last request always wins regardless of completion order.

use crate::api::FeedApi;
use crate::app::{spawn_reporting, AppEvent};
use crate::markup::FeedList;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Text shown in place of the list when it cannot be loaded.
pub const LIST_ERROR_MESSAGE: &str = "Error loading feed list.";

/// Task name reported when a list fetch panics.
pub const FEED_LIST_TASK: &str = "feed_list";
/// Task name reported when a changelog fetch panics.
pub const CHANGELOG_TASK: &str = "changelog";

/// Contents of the list region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRegion {
    /// No list has been received yet.
    Loading,
    Loaded(FeedList),
    /// Fixed human-readable error in place of the list.
    Failed(&'static str),
}

impl ListRegion {
    pub fn feeds(&self) -> Option<&FeedList> {
        match self {
            ListRegion::Loaded(list) => Some(list),
            _ => None,
        }
    }

    pub fn feeds_mut(&mut self) -> Option<&mut FeedList> {
        match self {
            ListRegion::Loaded(list) => Some(list),
            _ => None,
        }
    }
}

/// One in-flight fetch slot: its generation and the task serving it.
#[derive(Debug, Default)]
struct FetchSlot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl FetchSlot {
    /// Supersedes whatever is in flight and returns the new generation.
    fn advance(&mut self) -> u64 {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(
                superseded = self.generation,
                "Aborted superseded fetch"
            );
        }
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Whether a response tagged `generation` should be applied. Accepting
    /// settles the slot.
    fn accept(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.handle = None;
        true
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Issues list and changelog fetches and decides which responses are current.
#[derive(Debug)]
pub struct ListSynchronizer {
    api: FeedApi,
    list: FetchSlot,
    changelog: FetchSlot,
    resyncs_issued: u64,
}

impl ListSynchronizer {
    pub fn new(api: FeedApi) -> Self {
        Self {
            api,
            list: FetchSlot::default(),
            changelog: FetchSlot::default(),
            resyncs_issued: 0,
        }
    }

    /// Refreshes both the feed list and the changelog.
    pub fn request_resync(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        self.resyncs_issued += 1;
        tracing::debug!(resync = self.resyncs_issued, "Resync requested");
        self.refresh_list(event_tx);
        self.refresh_changelog(event_tx);
    }

    pub fn refresh_list(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        let generation = self.list.advance();
        let api = self.api.clone();
        self.list.handle = Some(spawn_reporting(
            FEED_LIST_TASK,
            None,
            event_tx.clone(),
            async move {
                let result = api.fetch_feeds().await;
                AppEvent::FeedListFetched { generation, result }
            },
        ));
    }

    pub fn refresh_changelog(&mut self, event_tx: &mpsc::Sender<AppEvent>) {
        let generation = self.changelog.advance();
        let api = self.api.clone();
        self.changelog.handle = Some(spawn_reporting(
            CHANGELOG_TASK,
            None,
            event_tx.clone(),
            async move {
                let result = api.fetch_changelog().await;
                AppEvent::ChangelogFetched { generation, result }
            },
        ));
    }

    /// Whether a list response of `generation` is current. Stale responses
    /// must be dropped by the caller.
    pub fn accept_list(&mut self, generation: u64) -> bool {
        let current = self.list.accept(generation);
        if !current {
            tracing::debug!(
                generation,
                current = self.list.generation,
                "Dropping stale feed list response"
            );
        }
        current
    }

    pub fn accept_changelog(&mut self, generation: u64) -> bool {
        let current = self.changelog.accept(generation);
        if !current {
            tracing::debug!(
                generation,
                current = self.changelog.generation,
                "Dropping stale changelog response"
            );
        }
        current
    }

    /// True while a list fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.list.handle.is_some()
    }

    /// Number of resyncs issued since startup.
    pub fn resyncs_issued(&self) -> u64 {
        self.resyncs_issued
    }

    pub fn list_generation(&self) -> u64 {
        self.list.generation
    }

    pub fn changelog_generation(&self) -> u64 {
        self.changelog.generation
    }

    /// Clears the outstanding list fetch after its task died without
    /// reporting a result.
    pub fn abandon_list(&mut self) {
        self.list.handle = None;
    }

    pub fn abort_all(&mut self) {
        self.list.abort();
        self.changelog.abort();
    }
}

impl Drop for ListSynchronizer {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn api() -> FeedApi {
        // Unroutable; the spawned fetches are aborted or ignored.
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        FeedApi::new(reqwest::Client::new(), base)
    }

    #[tokio::test]
    async fn test_only_latest_generation_is_accepted() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = ListSynchronizer::new(api());

        sync.request_resync(&tx);
        let first = sync.list_generation();
        sync.request_resync(&tx);
        let second = sync.list_generation();

        assert_ne!(first, second);
        assert!(!sync.accept_list(first));
        assert!(sync.is_loading());
        assert!(sync.accept_list(second));
        assert!(!sync.is_loading());
        assert_eq!(sync.resyncs_issued(), 2);
    }

    #[tokio::test]
    async fn test_list_and_changelog_generations_are_independent() {
        let (tx, _rx) = mpsc::channel(16);
        let mut sync = ListSynchronizer::new(api());

        sync.request_resync(&tx);
        sync.refresh_changelog(&tx);

        assert_eq!(sync.list_generation(), 1);
        assert_eq!(sync.changelog_generation(), 2);
        assert!(sync.accept_list(1));
        assert!(!sync.accept_changelog(1));
        assert!(sync.accept_changelog(2));
    }

    #[test]
    fn test_region_accessors() {
        let mut region = ListRegion::Loaded(FeedList::default());
        assert!(region.feeds().is_some());
        assert!(region.feeds_mut().is_some());
        assert!(ListRegion::Loading.feeds().is_none());
        assert!(ListRegion::Failed(LIST_ERROR_MESSAGE).feeds().is_none());
    }
}
