//! Envira Context - conversation windowing for LLM prompts
//!
//! This crate provides:
//! - Exchange history types
//! - Budget-bounded context windowing
//! - Prompt assembly

pub mod context;
pub mod prompt;
pub mod window;

pub use context::Exchange;
pub use prompt::PromptAssembler;
pub use window::{ContextWindow, Window};
