//! LLaMAX Translator - HTTP translation service over a local GGUF model
//!
//! This library builds translation prompts, runs them through a llama.cpp
//! model and exposes the result over an HTTP API and a small CLI.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod server;

// Re-export key types for convenience
pub use crate::core::{
    config::{ModelConfig, ServerConfig},
    engine::{TextGenerator, Translator},
    errors::TranslationError,
    languages::LanguageTable,
    llama::LlamaGenerator,
    models::{GenerationParams, TargetLangs, TranslationRequest, TranslationResponse},
    prompt::build_prompt,
};

pub use crate::server::api::{build_router, run_server, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
