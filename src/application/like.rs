//! Like toggling for a single post-viewing session.
//!
//! Reconciles the session cache against the server, keeps the displayed
//! count in step with the cached state, and serializes toggle submissions so
//! rapid clicks issue exactly one mutation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use metrics::counter;
use tracing::{debug, warn};

use crate::application::api::BlogApi;
use crate::application::ui::{LikeControl, NoticeLevel, Notifier};
use crate::domain::types::{LikeStatus, PostId, UserId};
use crate::session::keys::SessionKey;
use crate::session::store::SessionStore;

const METRIC_LIKE_TOGGLE_TOTAL: &str = "lettore_like_toggle_total";
const METRIC_LIKE_TOGGLE_FAILURE_TOTAL: &str = "lettore_like_toggle_failure_total";
const METRIC_LIKE_CHECK_CACHE_HIT_TOTAL: &str = "lettore_like_check_cache_hit_total";
const METRIC_LIKE_CHECK_CACHE_MISS_TOTAL: &str = "lettore_like_check_cache_miss_total";

const LIKED_NOTICE: &str = "Post liked!";
const UNLIKED_NOTICE: &str = "Post unliked";
const TOGGLE_FAILED_NOTICE: &str = "Failed to update like. Please try again.";

/// Owns the like/unlike toggle for one (post, viewer) pair.
///
/// Construction requires a viewer identity; anonymous viewers get no control
/// rendered, so no controller exists for them.
pub struct LikeController {
    post: PostId,
    user: UserId,
    api: Arc<dyn BlogApi>,
    store: Arc<SessionStore>,
    control: Arc<dyn LikeControl>,
    notifier: Arc<dyn Notifier>,
    count: AtomicU64,
    in_flight: AtomicBool,
}

impl LikeController {
    pub fn new(
        post: PostId,
        user: UserId,
        api: Arc<dyn BlogApi>,
        store: Arc<SessionStore>,
        control: Arc<dyn LikeControl>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            post,
            user,
            api,
            store,
            control,
            notifier,
            count: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Bind the control: seed the displayed count from the fetched post and
    /// resolve the initial liked/not-liked state.
    pub async fn initialize(&self, initial_count: u64) {
        self.count.store(initial_count, Ordering::SeqCst);
        self.control.set_count(initial_count);
        self.control.set_enabled(true);
        self.check_like_status().await;
    }

    /// Resolve whether the viewer likes this post, asking the server only on
    /// a cache miss. The cached answer is trusted for the rest of the
    /// session. On failure the control is left in its default not-liked
    /// state; a fresh session retries via the cache miss path.
    pub async fn check_like_status(&self) {
        let key = SessionKey::liked(self.post, self.user);
        let liked = match self.store.get(&key) {
            Some(cached) => {
                counter!(METRIC_LIKE_CHECK_CACHE_HIT_TOTAL).increment(1);
                debug!(
                    post = %self.post,
                    user = %self.user,
                    liked = cached,
                    "Like status resolved from session cache"
                );
                cached
            }
            None => {
                counter!(METRIC_LIKE_CHECK_CACHE_MISS_TOTAL).increment(1);
                match self.api.check_like_status(self.user, self.post).await {
                    Ok(answer) => {
                        self.store.set(&key, answer);
                        answer
                    }
                    Err(err) => {
                        warn!(
                            post = %self.post,
                            user = %self.user,
                            error = %err,
                            "Like status check failed, leaving control in default state"
                        );
                        return;
                    }
                }
            }
        };
        self.control.set_liked(liked);
    }

    /// Toggle the like state with the server.
    ///
    /// Re-entrancy guard: the `in_flight` flag is checked-and-set on entry,
    /// so a second invocation while a request is outstanding is a no-op even
    /// if the caller ignored the disabled control. The control is re-enabled
    /// on every exit path.
    pub async fn toggle(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(
                post = %self.post,
                user = %self.user,
                "Toggle ignored: a request is already in flight"
            );
            return;
        }

        self.control.set_enabled(false);
        self.toggle_inner().await;
        self.control.set_enabled(true);
        self.in_flight.store(false, Ordering::SeqCst);
    }

    async fn toggle_inner(&self) {
        let key = SessionKey::liked(self.post, self.user);
        // An unknown status (earlier check failed) renders as not-liked, so
        // the first click issues `like`.
        let currently_liked = self.store.get(&key).unwrap_or(false);

        let result = if currently_liked {
            self.api.unlike(self.user, self.post).await
        } else {
            self.api.like(self.user, self.post).await
        };

        match result {
            Ok(()) => {
                let now_liked = !currently_liked;
                // Cache before rendering: displayed state must never get
                // ahead of the cached state.
                self.store.set(&key, now_liked);

                let count = if now_liked {
                    self.count.fetch_add(1, Ordering::SeqCst) + 1
                } else {
                    self.count
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                            Some(current.saturating_sub(1))
                        })
                        .unwrap_or(0)
                        .saturating_sub(1)
                };

                self.control.set_count(count);
                self.control.set_liked(now_liked);
                counter!(METRIC_LIKE_TOGGLE_TOTAL).increment(1);
                debug!(
                    post = %self.post,
                    user = %self.user,
                    liked = now_liked,
                    count,
                    "Like toggled"
                );

                if now_liked {
                    self.notifier.notify(NoticeLevel::Success, LIKED_NOTICE);
                } else {
                    self.notifier.notify(NoticeLevel::Info, UNLIKED_NOTICE);
                }
            }
            Err(err) => {
                counter!(METRIC_LIKE_TOGGLE_FAILURE_TOTAL).increment(1);
                warn!(
                    post = %self.post,
                    user = %self.user,
                    error = %err,
                    "Like toggle failed, state unchanged"
                );
                self.notifier.notify(NoticeLevel::Error, TOGGLE_FAILED_NOTICE);
            }
        }
    }

    /// Currently displayed like count.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Like status as currently cached for this session.
    pub fn status(&self) -> LikeStatus {
        let key = SessionKey::liked(self.post, self.user);
        LikeStatus::from_cached(self.store.get(&key))
    }
}
