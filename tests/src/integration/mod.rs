//! Cross-crate flows.

pub mod fixtures;

mod removal;
mod replay;
mod tui_session;
