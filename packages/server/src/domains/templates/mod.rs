//! Templates domain - presets that pre-fill new jobs

pub mod actions;
pub mod models;

pub use models::{Template, TemplateInput};
