//! # Build-Progress Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs     # Shared batch sequences and sinks
//!     ├── replay.rs       # Determinism and idempotence across writers
//!     ├── tui_session.rs  # Writer contract against a headless terminal
//!     └── removal.rs      # Instance removal over the file store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p progress-tests
//! cargo test -p progress-tests integration::removal::
//! ```

#![allow(dead_code)]

pub mod integration;
