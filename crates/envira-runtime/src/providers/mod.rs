//! AI Provider implementations
//!
//! Concrete implementations of the AIProvider trait for locally hosted
//! inference servers.

pub mod ollama;

pub use ollama::OllamaProvider;
