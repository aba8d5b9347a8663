//! # Progress Writer
//!
//! The contract the build-orchestration layer uses to push status batches
//! into a display and to wait for that display to finish.
//!
//! ## Session Model
//!
//! ```text
//! ┌──────────────┐                     ┌────────────────────────┐
//! │ Producer A   │ ── write(batch) ──┐ │  Session task          │
//! └──────────────┘                   │ │  (owns all view state) │
//! ┌──────────────┐                   ▼ │                        │
//! │ Producer B   │ ── write(batch) ─▶ queue ─▶ ingest ─▶ render  │
//! └──────────────┘                   ▲ │                        │
//! ┌──────────────┐                   │ └────────────────────────┘
//! │ Orchestrator │ ── wait() ────────┘      (Finish, then join)
//! └──────────────┘
//! ```
//!
//! - `write` enqueues and returns; it never blocks and never fails.
//! - The queue is the only cross-thread handoff. Batches are applied in
//!   enqueue order by the one task that owns the view state.
//! - `wait` enqueues a completion signal and joins the task. A failing or
//!   panicking display ends its own session and is reported by `wait`; it is
//!   never propagated to writers.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod errors;
pub mod json;
pub mod mode;
pub mod plain;
pub mod session;
pub mod writer;

// Re-export main types
pub use errors::ProgressError;
pub use json::JsonWriter;
pub use mode::ProgressMode;
pub use plain::{PlainPrinter, PlainWriter};
pub use session::{
    session_channel, SessionCommand, SessionHandle, SessionReceiver, SessionSender, WarningLog,
};
pub use writer::ProgressWriter;
