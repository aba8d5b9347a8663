//! # Progress TUI
//!
//! Interactive build-progress display: every vertex as a node under one
//! root, and the accumulated logs of the selected node next to it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  BUILD  3 steps  1 done  1 cached                     RUNNING   │
//! ├────────────────────────┬────────────────────────────────────────┤
//! │  STEPS                 │  RUN make [RUN]                        │
//! │  .                     │  cc -c main.c                          │
//! │  ├─ load definition    │  cc -c util.c                          │
//! │  ├─ CACHED COPY . /src │                                        │
//! │  └─ RUN make           │                                        │
//! ├────────────────────────┴────────────────────────────────────────┤
//! │  [↑↓] Select  [Home/End] Jump  [PgUp/PgDn] Scroll  [Q] Quit     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//!
//! One task (the UI loop) owns the aggregator, the tree and the terminal.
//! Producers only enqueue; the loop drains everything queued before each
//! draw, so redraws coalesce under load.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod runtime;
pub mod terminal;
pub mod ui;
pub mod writer;

pub use domain::{DetailPane, ProgressView, TreeNode, VertexTree, ViewMode};
pub use runtime::UiLoop;
pub use writer::TuiWriter;
