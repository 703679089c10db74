//! Session-scoped interaction flag cache.
//!
//! Stores one boolean flag per (post, user, kind) pair for the lifetime of a
//! viewing session: `liked` flags cache the server's like-status answer so it
//! is fetched at most once per session, `viewed` flags guarantee the view
//! counter is incremented at most once per session.
//!
//! The key space matches the platform's session storage layout:
//!
//! ```text
//! liked_post_42_user_7  = "true"
//! viewed_post_42_user_7 = "true"
//! ```
//!
//! Flags survive process restarts through a JSON session file; logout and
//! the administrative bulk clears are the only things that remove them.

pub mod file;
pub mod keys;
pub(crate) mod lock;
pub mod store;

pub use file::{SessionDocument, SessionError};
pub use keys::{FlagKind, SessionKey};
pub use store::SessionStore;
