pub mod client;
pub mod models;
pub mod prompts;

pub use client::{Generator, LlmClient};
pub use models::Model;
