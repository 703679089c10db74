//! Viewing-session event loop.
//!
//! Front ends translate their inputs (key presses, scroll measurements,
//! timers) into `SessionEvent`s and feed them through one channel; the
//! session processes them in arrival order, awaiting each network call
//! before taking the next event. That single ordered stream is what keeps
//! the subsystem's interleaving model simple: no two handlers ever run at
//! the same time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::application::like::LikeController;
use crate::application::view::ViewRecorder;
use crate::application::visibility::VisibilitySample;

/// Everything that can happen during a post-viewing session.
#[derive(Debug)]
pub enum SessionEvent {
    /// The viewer activated the like toggle.
    ToggleClicked,
    /// A visibility measurement of the content-end region.
    Visibility(VisibilitySample),
    /// The dwell-time fallback elapsed.
    DwellElapsed,
    /// The viewer left the page.
    Quit,
}

/// One identified viewer reading one post: the like controller and view
/// recorder bound to the pair, plus the loop that drives them.
pub struct ViewingSession {
    like: Arc<LikeController>,
    view: Arc<ViewRecorder>,
}

impl ViewingSession {
    pub fn new(like: Arc<LikeController>, view: Arc<ViewRecorder>) -> Self {
        Self { like, view }
    }

    /// Bind the controls and arm the view triggers.
    pub async fn start(&self, initial_like_count: u64) {
        self.like.initialize(initial_like_count).await;
        self.view.setup();
    }

    /// Process one event; returns false when the session should end.
    pub async fn handle(&self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::ToggleClicked => {
                self.like.toggle().await;
                true
            }
            SessionEvent::Visibility(sample) => {
                self.view.on_visibility(sample).await;
                true
            }
            SessionEvent::DwellElapsed => {
                self.view.on_dwell_elapsed().await;
                true
            }
            SessionEvent::Quit => {
                debug!("Viewing session ended");
                false
            }
        }
    }

    /// Drain events until the channel closes or a `Quit` arrives.
    pub async fn run(&self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle(event).await {
                break;
            }
        }
    }

    pub fn like(&self) -> &LikeController {
        &self.like
    }
}
