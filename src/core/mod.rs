//! Core translation engine module

pub mod config;
pub mod engine;
pub mod errors;
pub mod languages;
pub mod llama;
pub mod models;
pub mod prompt;
