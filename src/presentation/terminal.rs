//! Terminal implementations of the UI collaborator contracts.

use std::sync::Mutex;

use time::macros::format_description;

use lettore_api_types::PostResponse;

use crate::application::ui::{LikeControl, NoticeLevel, Notifier};
use crate::session::lock::mutex_lock;

const SOURCE: &str = "presentation::terminal";

/// Like toggle rendered as a status line.
///
/// The control keeps the last rendered state so each change prints one
/// complete line instead of fragments.
pub struct TerminalLikeControl {
    state: Mutex<ControlState>,
}

#[derive(Default)]
struct ControlState {
    liked: bool,
    count: u64,
    enabled: bool,
}

impl TerminalLikeControl {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControlState::default()),
        }
    }

    fn render(state: &ControlState) {
        let heart = if state.liked { "♥" } else { "♡" };
        let verb = if state.liked { "unlike" } else { "like" };
        println!("{heart} {} — press `l` to {verb}, `q` to quit", state.count);
    }
}

impl Default for TerminalLikeControl {
    fn default() -> Self {
        Self::new()
    }
}

impl LikeControl for TerminalLikeControl {
    fn set_enabled(&self, enabled: bool) {
        // Enable/disable transitions are bookkeeping, not worth a line of
        // output; the in-flight state is invisible in a line-based terminal.
        mutex_lock(&self.state, SOURCE, "set_enabled").enabled = enabled;
    }

    fn set_liked(&self, liked: bool) {
        let mut state = mutex_lock(&self.state, SOURCE, "set_liked");
        state.liked = liked;
        Self::render(&state);
    }

    fn set_count(&self, count: u64) {
        mutex_lock(&self.state, SOURCE, "set_count").count = count;
    }
}

/// Toast notifications as prefixed lines.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let prefix = match level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "•",
            NoticeLevel::Error => "✗",
        };
        println!("{prefix} {message}");
    }
}

/// Print a fetched post.
pub fn render_post(post: &PostResponse) {
    let date_format = format_description!("[year]-[month]-[day]");
    let published = post
        .created_at
        .format(date_format)
        .unwrap_or_else(|_| post.created_at.to_string());

    println!();
    println!("{}", post.title);
    println!(
        "by {} · {} · {} · {} views · {} likes",
        post.author_username.as_deref().unwrap_or("Anonymous"),
        post.category,
        published,
        post.views,
        post.likes
    );
    if post.was_updated() {
        if let Ok(updated) = post.updated_at.format(date_format) {
            println!("updated {updated}");
        }
    }
    println!("{}", "-".repeat(72));
    println!("{}", post.content);
    println!("{}", "-".repeat(72));
}
