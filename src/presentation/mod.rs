//! Terminal front end.

pub mod terminal;
