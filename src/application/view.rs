//! At-most-once view recording for a single post-viewing session.
//!
//! Two independent triggers race toward one increment call: a debounced
//! visibility signal over the content-end region, and a fixed dwell-time
//! fallback. Whichever fires first wins the check-then-mark on the session
//! flag; the loser observes the mark and does nothing. Marking happens
//! before the network call resolves, so the guard also holds while a request
//! is still in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::api::BlogApi;
use crate::application::visibility::{VisibilitySample, VisibilityTracker};
use crate::domain::types::{PostId, UserId};
use crate::session::keys::SessionKey;
use crate::session::lock::mutex_lock;
use crate::session::store::SessionStore;

const METRIC_VIEW_RECORDED_TOTAL: &str = "lettore_view_recorded_total";
const METRIC_VIEW_RECORD_FAILURE_TOTAL: &str = "lettore_view_record_failure_total";

const SOURCE: &str = "application::view";

/// Records one view per (post, viewer, session).
///
/// Views are only recorded for identified viewers; construction requires a
/// viewer identity, so the anonymous no-op lives with the caller.
pub struct ViewRecorder {
    post: PostId,
    user: UserId,
    api: Arc<dyn BlogApi>,
    store: Arc<SessionStore>,
    tracker: Mutex<VisibilityTracker>,
    /// False before `setup`, after the recorder has fired, or when the
    /// session already holds a viewed flag; gates the visibility path.
    armed: AtomicBool,
}

impl ViewRecorder {
    pub fn new(
        post: PostId,
        user: UserId,
        api: Arc<dyn BlogApi>,
        store: Arc<SessionStore>,
        threshold: f64,
        debounce: std::time::Duration,
    ) -> Self {
        Self {
            post,
            user,
            api,
            store,
            tracker: Mutex::new(VisibilityTracker::new(threshold, debounce)),
            armed: AtomicBool::new(false),
        }
    }

    /// Arm the triggers. Returns false (and stays disarmed) when this
    /// session already recorded a view for the pair.
    pub fn setup(&self) -> bool {
        let key = SessionKey::viewed(self.post, self.user);
        if self.store.get(&key) == Some(true) {
            debug!(
                post = %self.post,
                user = %self.user,
                "View already recorded this session, not arming triggers"
            );
            return false;
        }
        self.armed.store(true, Ordering::SeqCst);
        true
    }

    /// Visibility trigger input. Feeds the debounced tracker and records the
    /// view once the threshold has been met.
    pub async fn on_visibility(&self, sample: VisibilitySample) {
        if !self.armed.load(Ordering::SeqCst) {
            return;
        }
        let fired = mutex_lock(&self.tracker, SOURCE, "on_visibility").observe(sample);
        if fired {
            self.record_once().await;
        }
    }

    /// Dwell-time trigger input. One-shot; a no-op when the view was already
    /// recorded by the time it fires.
    pub async fn on_dwell_elapsed(&self) {
        if !self.armed.load(Ordering::SeqCst) {
            debug!(
                post = %self.post,
                user = %self.user,
                "Dwell trigger fired after teardown, nothing to do"
            );
            return;
        }
        self.record_once().await;
    }

    /// Shared sink for both triggers.
    ///
    /// The session flag is checked and set in one step *before* the network
    /// call, so the second trigger cannot slip through while the increment
    /// request is still in flight. A failed request leaves the flag set:
    /// under-counting is preferred over double-counting.
    async fn record_once(&self) {
        let key = SessionKey::viewed(self.post, self.user);
        if !self.store.mark_once(&key) {
            debug!(
                post = %self.post,
                user = %self.user,
                "View already recorded this session"
            );
            return;
        }

        // Tear down the visibility path; the dwell trigger is one-shot and
        // needs no teardown.
        self.armed.store(false, Ordering::SeqCst);

        match self.api.record_view(self.user, self.post).await {
            Ok(()) => {
                counter!(METRIC_VIEW_RECORDED_TOTAL).increment(1);
                info!(
                    post = %self.post,
                    user = %self.user,
                    "View recorded"
                );
            }
            Err(err) => {
                counter!(METRIC_VIEW_RECORD_FAILURE_TOTAL).increment(1);
                warn!(
                    post = %self.post,
                    user = %self.user,
                    error = %err,
                    "Failed to record view, leaving session flag set"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use lettore_api_types::PostResponse;

    use crate::application::api::{ApiError, BlogApi};
    use crate::domain::types::{PostId, UserId};

    use super::*;

    #[derive(Default)]
    struct CountingApi {
        view_calls: AtomicUsize,
        fail_views: bool,
    }

    #[async_trait]
    impl BlogApi for CountingApi {
        async fn check_like_status(&self, _user: UserId, _post: PostId) -> Result<bool, ApiError> {
            Ok(false)
        }

        async fn like(&self, _user: UserId, _post: PostId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn unlike(&self, _user: UserId, _post: PostId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn record_view(&self, _user: UserId, _post: PostId) -> Result<(), ApiError> {
            self.view_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_views {
                return Err(ApiError::Transport("connection reset".into()));
            }
            Ok(())
        }

        async fn fetch_post(&self, _post: PostId) -> Result<PostResponse, ApiError> {
            Err(ApiError::Status { status: 404 })
        }
    }

    fn recorder(api: Arc<CountingApi>, store: Arc<SessionStore>) -> ViewRecorder {
        ViewRecorder::new(
            PostId(42),
            UserId(7),
            api,
            store,
            0.5,
            Duration::ZERO,
        )
    }

    fn full_view() -> VisibilitySample {
        VisibilitySample::new(1.0, Instant::now())
    }

    #[tokio::test]
    async fn both_triggers_yield_one_network_call() {
        let api = Arc::new(CountingApi::default());
        let store = Arc::new(SessionStore::new());
        let recorder = recorder(api.clone(), store.clone());

        assert!(recorder.setup());
        recorder.on_visibility(full_view()).await;
        recorder.on_dwell_elapsed().await;

        assert_eq!(api.view_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.get(&SessionKey::viewed(PostId(42), UserId(7))),
            Some(true)
        );
    }

    #[tokio::test]
    async fn dwell_first_then_visibility_also_yields_one_call() {
        let api = Arc::new(CountingApi::default());
        let store = Arc::new(SessionStore::new());
        let recorder = recorder(api.clone(), store.clone());

        recorder.setup();
        recorder.on_dwell_elapsed().await;
        recorder.on_visibility(full_view()).await;
        recorder.on_visibility(full_view()).await;

        assert_eq!(api.view_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn setup_declines_when_already_viewed() {
        let api = Arc::new(CountingApi::default());
        let store = Arc::new(SessionStore::new());
        store.set(&SessionKey::viewed(PostId(42), UserId(7)), true);
        let recorder = recorder(api.clone(), store);

        assert!(!recorder.setup());
        recorder.on_visibility(full_view()).await;
        recorder.on_dwell_elapsed().await;

        assert_eq!(api.view_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_increment_keeps_flag_set_and_is_not_retried() {
        let api = Arc::new(CountingApi {
            fail_views: true,
            ..Default::default()
        });
        let store = Arc::new(SessionStore::new());
        let recorder = recorder(api.clone(), store.clone());

        recorder.setup();
        recorder.on_dwell_elapsed().await;
        recorder.on_dwell_elapsed().await;
        recorder.on_visibility(full_view()).await;

        assert_eq!(api.view_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.get(&SessionKey::viewed(PostId(42), UserId(7))),
            Some(true)
        );
    }

    #[tokio::test]
    async fn quick_scroll_past_does_not_record() {
        let api = Arc::new(CountingApi::default());
        let store = Arc::new(SessionStore::new());
        let recorder = ViewRecorder::new(
            PostId(42),
            UserId(7),
            api.clone(),
            store,
            0.5,
            Duration::from_millis(400),
        );

        recorder.setup();
        let start = Instant::now();
        recorder
            .on_visibility(VisibilitySample::new(0.9, start))
            .await;
        recorder
            .on_visibility(VisibilitySample::new(0.1, start + Duration::from_millis(100)))
            .await;

        assert_eq!(api.view_calls.load(Ordering::SeqCst), 0);
    }
}
