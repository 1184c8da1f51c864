use crate::adapter::PlaylistAdapter;
use crate::view::PlaylistView;
use crate::youtube::{FetchError, PlaylistApi, PlaylistItem, PlaylistItemListResponse};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
pub const DEFAULT_PLAYLIST: &str = "UUAPurJWGIUtvlul3mApdQRw";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    #[default]
    Replace,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
}

#[derive(Debug)]
pub enum LoadEvent {
    Loaded { items: usize },
    Failed(FetchError),
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("row {position} is out of range ({len} rows)")]
    OutOfRange { position: usize, len: usize },
    #[error("row {position} has no video id")]
    MissingVideoId { position: usize },
}

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL, video_id)
}

/// A finished fetch, tagged with the sequence number it was started under.
type Fetch = (u64, Result<PlaylistItemListResponse, FetchError>);

/// Owns the playlist dataset and drives a [`PlaylistView`].
///
/// Fetches run as tasks on the tokio runtime. Their outcomes only touch the
/// dataset or the view inside [`process_next`](Self::process_next), so all
/// mutation happens on whichever task owns the presenter. A fetch superseded
/// under [`ReloadPolicy::Replace`] comes back as [`LoadEvent::Cancelled`].
pub struct Presenter<A, V> {
    api: Arc<A>,
    view: V,
    api_key: String,
    playlist_id: String,
    page_token: String,
    next_page_token: Option<String>,
    items: Vec<PlaylistItem>,
    state: LoadState,
    policy: ReloadPolicy,
    runtime: Option<Handle>,
    fetches: JoinSet<Fetch>,
    latest: u64,
}

impl<A: PlaylistApi, V: PlaylistView> Presenter<A, V> {
    pub fn new(api: A, view: V, api_key: Option<String>) -> Self {
        let api_key = match api_key {
            Some(api_key) => api_key,
            None => {
                warn!("no YouTube API key configured, requests will be rejected");
                String::new()
            }
        };

        Self {
            api: Arc::new(api),
            view,
            api_key,
            playlist_id: DEFAULT_PLAYLIST.to_owned(),
            page_token: String::new(),
            next_page_token: None,
            items: Vec::new(),
            state: LoadState::Idle,
            policy: ReloadPolicy::default(),
            runtime: Handle::try_current().ok(),
            fetches: JoinSet::new(),
            latest: 0,
        }
    }

    /// Runtime the fetches are spawned on. Defaults to the one `new` was
    /// called in, if any.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_policy(mut self, policy: ReloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_playlist_id<S: Into<String>>(&mut self, playlist_id: S) {
        self.playlist_id = playlist_id.into();
        info!(playlist_id = %self.playlist_id, "switched playlist");
    }

    pub fn set_page_token<S: Into<String>>(&mut self, page_token: S) {
        self.page_token = page_token.into();
    }

    /// Starts a fetch of the current playlist page. Returns `false` if the
    /// request was dropped because of [`ReloadPolicy::Ignore`].
    ///
    /// # Panics
    ///
    /// Without a runtime from `new` or [`with_runtime`](Self::with_runtime),
    /// this must be called from within a tokio runtime.
    pub fn load_playlist_items(&mut self) -> bool {
        if self.state == LoadState::Loading {
            match self.policy {
                ReloadPolicy::Ignore => {
                    debug!("fetch already running, ignoring load request");
                    return false;
                }
                ReloadPolicy::Replace => {
                    debug!("replacing running fetch");
                    self.fetches.abort_all();
                }
            }
        }

        let api = Arc::clone(&self.api);
        let playlist_id = self.playlist_id.clone();
        let page_token = self.page_token.clone();
        let api_key = self.api_key.clone();
        self.latest += 1;
        let id = self.latest;
        let fetch = async move {
            let result = api
                .fetch_playlist_items(&playlist_id, &page_token, &api_key)
                .await;
            (id, result)
        };
        match &self.runtime {
            Some(runtime) => self.fetches.spawn_on(fetch, runtime),
            None => self.fetches.spawn(fetch),
        };

        if self.state == LoadState::Idle {
            self.state = LoadState::Loading;
            self.view.set_loading(true);
        }
        true
    }

    /// Waits for the next fetch to finish and applies it. `None` when
    /// nothing is in flight.
    pub async fn process_next(&mut self) -> Option<LoadEvent> {
        let joined = self.fetches.join_next().await?;
        let event = match joined {
            // finished before the abort reached it
            Ok((id, _)) if id != self.latest => LoadEvent::Cancelled,
            Ok((_, Ok(response))) => {
                self.items = response.items;
                self.next_page_token = response.next_page_token.filter(|token| !token.is_empty());
                info!(items = self.items.len(), "loaded playlist items");
                LoadEvent::Loaded {
                    items: self.items.len(),
                }
            }
            Ok((_, Err(e))) => {
                error!(error = %e, "failed to load playlist items");
                LoadEvent::Failed(e)
            }
            Err(e) if e.is_cancelled() => LoadEvent::Cancelled,
            Err(e) => {
                error!(error = %e, "fetch task panicked");
                LoadEvent::Failed(FetchError::Worker(e.to_string()))
            }
        };

        if self.fetches.is_empty() {
            self.state = LoadState::Idle;
            self.view.set_loading(false);
        }

        match &event {
            LoadEvent::Loaded { .. } => {
                let adapter = PlaylistAdapter::new(&self.items);
                self.view.show_dataset(&adapter);
            }
            LoadEvent::Failed(e) => self.view.show_error(e),
            LoadEvent::Cancelled => {}
        }

        Some(event)
    }

    pub async fn run_until_idle(&mut self) {
        while self.process_next().await.is_some() {}
    }

    pub fn start_video_intent(&mut self, position: usize) -> Result<(), SelectionError> {
        let item = self
            .items
            .get(position)
            .ok_or(SelectionError::OutOfRange {
                position,
                len: self.items.len(),
            })?;
        let video_id = item
            .video_id()
            .ok_or(SelectionError::MissingVideoId { position })?;

        let url = watch_url(video_id);
        debug!(video_id, %url, "launching video");
        self.view.launch_external_video(video_id, &url);
        Ok(())
    }

    /// Drops every running fetch. Unlike a replaced fetch these produce no
    /// event at all.
    pub fn unsubscribe(&mut self) {
        if !self.fetches.is_empty() {
            debug!(fetches = self.fetches.len(), "cancelling running fetches");
        }
        self.fetches = JoinSet::new();
        self.state = LoadState::Idle;
    }

    pub fn items(&self) -> &[PlaylistItem] {
        &self.items
    }

    pub fn adapter(&self) -> PlaylistAdapter<'_> {
        PlaylistAdapter::new(&self.items)
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{page, FakeApi, RecordingView, ViewEvent};
    use reqwest::StatusCode;
    use tokio::sync::oneshot;

    fn presenter(api: &FakeApi) -> Presenter<FakeApi, RecordingView> {
        Presenter::new(api.clone(), RecordingView::default(), Some("K".to_owned()))
    }

    fn titles(presenter: &Presenter<FakeApi, RecordingView>) -> Vec<&str> {
        presenter.adapter().rows().map(|row| row.title).collect()
    }

    #[tokio::test]
    async fn test_load_replaces_dataset() {
        let api = FakeApi::default();
        api.respond(
            DEFAULT_PLAYLIST,
            Ok(page(&[("T1", "X1"), ("T2", "X2"), ("T3", "X3")])),
        );
        api.respond(DEFAULT_PLAYLIST, Ok(page(&[("T4", "X4")])));
        let mut presenter = presenter(&api);

        assert!(presenter.load_playlist_items());
        assert!(presenter.is_loading());
        assert!(matches!(
            presenter.process_next().await,
            Some(LoadEvent::Loaded { items: 3 })
        ));
        assert_eq!(titles(&presenter), ["T1", "T2", "T3"]);
        assert_eq!(presenter.state(), LoadState::Idle);

        presenter.load_playlist_items();
        presenter.run_until_idle().await;
        assert_eq!(titles(&presenter), ["T4"]);

        assert_eq!(
            presenter.view().events,
            [
                ViewEvent::Loading(true),
                ViewEvent::Loading(false),
                ViewEvent::Dataset(vec!["T1".into(), "T2".into(), "T3".into()]),
                ViewEvent::Loading(true),
                ViewEvent::Loading(false),
                ViewEvent::Dataset(vec!["T4".into()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_dataset() {
        let api = FakeApi::default();
        api.respond(DEFAULT_PLAYLIST, Ok(page(&[("T1", "X1"), ("T2", "X2")])));
        api.respond(
            DEFAULT_PLAYLIST,
            Err(FetchError::Status {
                status: StatusCode::FORBIDDEN,
                body: "quotaExceeded".to_owned(),
            }),
        );
        let mut presenter = presenter(&api);

        presenter.load_playlist_items();
        presenter.run_until_idle().await;
        presenter.load_playlist_items();
        let event = presenter.process_next().await;

        assert!(matches!(
            event,
            Some(LoadEvent::Failed(FetchError::Status { status, .. })) if status == StatusCode::FORBIDDEN
        ));
        assert!(!presenter.is_loading());
        assert_eq!(titles(&presenter), ["T1", "T2"]);
        assert_eq!(
            presenter.view().events[3..],
            [
                ViewEvent::Loading(true),
                ViewEvent::Loading(false),
                ViewEvent::Error("server answered 403 Forbidden: quotaExceeded".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_on_first_load() {
        let api = FakeApi::default();
        api.respond(DEFAULT_PLAYLIST, Err(FetchError::Timeout));
        let mut presenter = presenter(&api);

        presenter.load_playlist_items();
        presenter.run_until_idle().await;

        assert!(presenter.items().is_empty());
        assert!(!presenter.is_loading());
    }

    #[tokio::test]
    async fn test_request_parameters() {
        let api = FakeApi::default();
        api.respond("PL1", Ok(page(&[])));
        api.respond("PL1", Ok(page(&[])));
        let mut presenter = Presenter::new(api.clone(), RecordingView::default(), None);

        presenter.set_playlist_id("PL1");
        assert_eq!(api.requests().len(), 0);

        presenter.load_playlist_items();
        presenter.run_until_idle().await;
        presenter.set_page_token("CAoQAA");
        presenter.load_playlist_items();
        presenter.run_until_idle().await;

        assert_eq!(
            api.requests(),
            [
                ("PL1".to_owned(), String::new(), String::new()),
                ("PL1".to_owned(), "CAoQAA".to_owned(), String::new()),
            ]
        );
    }

    #[tokio::test]
    async fn test_next_page_token_is_tracked() {
        let api = FakeApi::default();
        let mut response = page(&[("T1", "X1")]);
        response.next_page_token = Some("CAoQAA".to_owned());
        api.respond(DEFAULT_PLAYLIST, Ok(response));
        api.respond(DEFAULT_PLAYLIST, Ok(page(&[("T1", "X1")])));
        let mut presenter = presenter(&api);

        presenter.load_playlist_items();
        presenter.run_until_idle().await;
        assert_eq!(presenter.next_page_token(), Some("CAoQAA"));

        // full refresh: the cursor is reported, not followed
        presenter.load_playlist_items();
        presenter.run_until_idle().await;
        assert_eq!(api.requests()[1].1, "");
        assert_eq!(presenter.next_page_token(), None);
    }

    #[tokio::test]
    async fn test_start_video_intent() {
        let api = FakeApi::default();
        api.respond(DEFAULT_PLAYLIST, Ok(page(&[("T1", "zzz"), ("T2", "abc123")])));
        let mut presenter = presenter(&api);
        presenter.load_playlist_items();
        presenter.run_until_idle().await;

        presenter.start_video_intent(1).unwrap();

        assert_eq!(
            presenter.view().events.last(),
            Some(&ViewEvent::Launch(
                "abc123".into(),
                "https://www.youtube.com/watch?v=abc123".into()
            ))
        );
    }

    #[tokio::test]
    async fn test_bad_selection() {
        let api = FakeApi::default();
        let mut response = page(&[("T1", "X1")]);
        response.items.push(PlaylistItem::default());
        api.respond(DEFAULT_PLAYLIST, Ok(response));
        let mut presenter = presenter(&api);
        presenter.load_playlist_items();
        presenter.run_until_idle().await;
        let events = presenter.view().events.len();

        assert_eq!(
            presenter.start_video_intent(2),
            Err(SelectionError::OutOfRange {
                position: 2,
                len: 2
            })
        );
        assert_eq!(
            presenter.start_video_intent(1),
            Err(SelectionError::MissingVideoId { position: 1 })
        );
        assert_eq!(presenter.view().events.len(), events);
    }

    #[tokio::test]
    async fn test_unsubscribe_before_completion() {
        let api = FakeApi::default();
        let (tx, rx) = oneshot::channel();
        api.hold(DEFAULT_PLAYLIST, rx);
        let mut presenter = presenter(&api);

        presenter.load_playlist_items();
        tokio::task::yield_now().await;
        presenter.unsubscribe();
        let _ = tx.send(page(&[("T1", "X1")]));

        assert!(presenter.process_next().await.is_none());
        assert!(presenter.items().is_empty());
        assert!(!presenter.is_loading());
        assert_eq!(presenter.view().events, [ViewEvent::Loading(true)]);

        presenter.unsubscribe();
        presenter.unsubscribe();
    }

    #[tokio::test]
    async fn test_unsubscribe_when_idle() {
        let api = FakeApi::default();
        let mut presenter = presenter(&api);

        presenter.unsubscribe();
        presenter.unsubscribe();

        assert!(presenter.process_next().await.is_none());
        assert!(presenter.view().events.is_empty());
    }

    async fn drain(presenter: &mut Presenter<FakeApi, RecordingView>) -> (usize, usize) {
        let (mut loaded, mut cancelled) = (0, 0);
        while let Some(event) = presenter.process_next().await {
            match event {
                LoadEvent::Loaded { .. } => loaded += 1,
                LoadEvent::Cancelled => cancelled += 1,
                LoadEvent::Failed(e) => panic!("unexpected failure: {}", e),
            }
        }
        (loaded, cancelled)
    }

    #[tokio::test]
    async fn test_replace_running_fetch() {
        let api = FakeApi::default();
        let (tx, rx) = oneshot::channel();
        api.hold("slow", rx);
        api.respond("fast", Ok(page(&[("Fast", "F1")])));
        let mut presenter = presenter(&api);

        presenter.set_playlist_id("slow");
        presenter.load_playlist_items();
        tokio::task::yield_now().await;
        presenter.set_playlist_id("fast");
        assert!(presenter.load_playlist_items());
        let _ = tx.send(page(&[("Slow", "S1")]));

        assert_eq!(drain(&mut presenter).await, (1, 1));
        assert_eq!(titles(&presenter), ["Fast"]);
        assert!(!presenter.is_loading());

        let events = &presenter.view().events;
        assert_eq!(events[0], ViewEvent::Loading(true));
        assert_eq!(events.len(), 3);
        assert!(events.contains(&ViewEvent::Loading(false)));
        assert!(events.contains(&ViewEvent::Dataset(vec!["Fast".into()])));
    }

    #[tokio::test]
    async fn test_replaced_fetch_that_already_finished() {
        let api = FakeApi::default();
        api.respond("stale", Ok(page(&[("Stale", "S1")])));
        api.respond("fresh", Ok(page(&[("Fresh", "F1")])));
        let mut presenter = presenter(&api);

        presenter.set_playlist_id("stale");
        presenter.load_playlist_items();
        tokio::task::yield_now().await;
        presenter.set_playlist_id("fresh");
        presenter.load_playlist_items();

        assert_eq!(drain(&mut presenter).await, (1, 1));
        assert_eq!(titles(&presenter), ["Fresh"]);
        assert!(!presenter
            .view()
            .events
            .contains(&ViewEvent::Dataset(vec!["Stale".into()])));
    }

    #[tokio::test]
    async fn test_unsubscribe_reports_nothing() {
        let api = FakeApi::default();
        let (_tx, rx) = oneshot::channel();
        api.hold(DEFAULT_PLAYLIST, rx);
        let mut presenter = presenter(&api);

        presenter.load_playlist_items();
        presenter.unsubscribe();

        assert_eq!(drain(&mut presenter).await, (0, 0));
    }

    #[test]
    fn test_load_outside_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let api = FakeApi::default();
        api.respond(DEFAULT_PLAYLIST, Ok(page(&[("T1", "X1")])));
        let mut presenter = Presenter::new(api, RecordingView::default(), Some("K".to_owned()))
            .with_runtime(runtime.handle().clone());

        assert!(presenter.load_playlist_items());
        runtime.block_on(presenter.run_until_idle());

        assert_eq!(titles(&presenter), ["T1"]);
    }

    #[tokio::test]
    async fn test_ignore_while_loading() {
        let api = FakeApi::default();
        let (tx, rx) = oneshot::channel();
        api.hold(DEFAULT_PLAYLIST, rx);
        let mut presenter = presenter(&api).with_policy(ReloadPolicy::Ignore);

        assert!(presenter.load_playlist_items());
        assert!(!presenter.load_playlist_items());
        tx.send(page(&[("T1", "X1")])).unwrap();
        presenter.run_until_idle().await;

        assert_eq!(api.requests().len(), 1);
        assert_eq!(titles(&presenter), ["T1"]);
        assert!(!presenter.is_loading());
    }
}
