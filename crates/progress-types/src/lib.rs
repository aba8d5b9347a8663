//! # Progress Types Crate
//!
//! The status-event model emitted by a remote build executor and consumed by
//! every progress backend (TUI, plain log, JSON).
//!
//! ## Design Principles
//!
//! - **Already decoded**: these types describe a stream that has been
//!   deserialized upstream; nothing here performs wire decoding.
//! - **Content-addressed identity**: every build step is named by a
//!   [`VertexId`] digest, which is the merge key for repeated updates.
//! - **Lenient shape**: all entities default missing fields, so a partial
//!   event still deserializes and can be merged best-effort.

pub mod digest;
pub mod entities;
pub mod errors;

pub use digest::VertexId;
pub use entities::*;
pub use errors::*;
