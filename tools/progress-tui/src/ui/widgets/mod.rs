//! Reusable UI components.

mod help_overlay;

pub use help_overlay::render_help_overlay;
