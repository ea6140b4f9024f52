//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::core::errors::{Result, TranslationError};

/// Default number of tokens generated per translation
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
/// Default sampler seed
pub const DEFAULT_SEED: u32 = 1234;

/// Sampling parameters handed to the model for every completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub seed: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            seed: DEFAULT_SEED,
        }
    }
}

/// Single translation request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TranslationRequest {
    pub text: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

impl TranslationRequest {
    /// Unpack into (text, source_lang, target_lang), failing if any is absent
    pub fn into_parts(self) -> Result<(String, String, String)> {
        match (self.text, self.source_lang, self.target_lang) {
            (Some(text), Some(source_lang), Some(target_lang)) => {
                Ok((text, source_lang, target_lang))
            }
            _ => Err(TranslationError::MissingParameters {
                fields: "text, source_lang, and target_lang",
            }),
        }
    }
}

/// Target languages for a batch, either newline-delimited or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TargetLangs {
    Delimited(String),
    List(Vec<String>),
}

impl TargetLangs {
    /// Normalize to a list of trimmed, non-empty codes in request order
    pub fn into_list(self) -> Vec<String> {
        let raw = match self {
            TargetLangs::Delimited(s) => s.split('\n').map(str::to_string).collect(),
            TargetLangs::List(list) => list,
        };

        raw.into_iter()
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect()
    }
}

/// Batch translation request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchTranslationRequest {
    pub text: Option<String>,
    pub source_lang: Option<String>,
    pub target_langs: Option<TargetLangs>,
}

impl BatchTranslationRequest {
    /// Unpack into (text, source_lang, target_langs), failing if any is absent
    pub fn into_parts(self) -> Result<(String, String, Vec<String>)> {
        match (self.text, self.source_lang, self.target_langs) {
            (Some(text), Some(source_lang), Some(targets)) => {
                Ok((text, source_lang, targets.into_list()))
            }
            _ => Err(TranslationError::MissingParameters {
                fields: "text, source_lang, and target_langs",
            }),
        }
    }
}

/// Outcome of one translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub source_lang_full: String,
    pub target_lang_full: String,
    pub translation: String,
}

/// Outcome of a batch: successes in request order, failures keyed by target code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTranslationResult {
    pub source_lang_full: String,
    pub translations: Vec<String>,
    pub errors: BTreeMap<String, String>,
}

impl BatchTranslationResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Successful translations joined by newlines
    pub fn joined(&self) -> String {
        self.translations.join("\n")
    }
}

/// Response body of `/translate`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranslationResponse {
    pub source_text: String,
    pub source_lang: String,
    pub source_lang_full: String,
    pub target_lang: String,
    pub target_lang_full: String,
    pub translation: String,
}

/// Response body of `/batch-translate`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchTranslationResponse {
    pub source_text: String,
    pub source_lang: String,
    pub source_lang_full: String,
    pub translations: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}
