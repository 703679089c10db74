//! lettore: a session-scoped reading client for blog platforms.
//!
//! The crate tracks one viewer's interactions with posts over a REST API:
//!
//! - [`application::like`] toggles the like state with an optimistic count
//!   and serialized submissions;
//! - [`application::view`] records at most one view per (post, viewer,
//!   session) from two racing triggers;
//! - [`session`] holds the per-session flag cache both lean on.
//!
//! The binary in `main.rs` is a thin terminal front end over these services.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod session;
