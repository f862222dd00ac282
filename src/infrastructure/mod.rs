//! Adapters for external collaborators: the Gemini API, PDF parsing and page templates.

pub mod gemini;
pub mod pdf;
pub mod templates;
pub mod traits;
