//! Render job script templates
//!
//! A template is plain text with `$${name}` placeholder tokens. Rendering replaces each token
//! with the matching value from a [`Context`] and copies everything else byte for byte.

/// Error taxonomy for parsing and rendering
pub mod error;
/// Placeholder name -> value mapping used for one render
pub mod context;
/// Single-pass placeholder scanner and renderer
pub mod render;

pub use context::Context;
pub use error::TemplateError;
pub use render::{render, Template};
