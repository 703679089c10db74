//! UI collaborator contracts.
//!
//! The subsystem renders through these traits and never learns what sits
//! behind them: the binary plugs in terminal output, tests plug in recording
//! fakes. They are sinks only; no call returns information.

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// The like toggle control: a button with a disabled flag, a liked/not-liked
/// visual state, and a nested count display.
pub trait LikeControl: Send + Sync {
    fn set_enabled(&self, enabled: bool);
    fn set_liked(&self, liked: bool);
    fn set_count(&self, count: u64);
}

/// Toast-style notification surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}
