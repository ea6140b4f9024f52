//! Translation engine on top of a text-completion model

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::core::errors::{Result, TranslationError};
use crate::core::languages::LanguageTable;
use crate::core::models::{BatchTranslationResult, GenerationParams, TranslationResult};
use crate::core::prompt::build_prompt;

/// A loaded model that completes prompts.
///
/// Calls block the current thread for the whole generation. Only the
/// generated continuation is returned, never the prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Translates text by prompting a shared [`TextGenerator`]
#[derive(Clone)]
pub struct Translator {
    generator: Arc<dyn TextGenerator>,
    languages: Arc<LanguageTable>,
    params: GenerationParams,
    semaphore: Arc<Semaphore>,
}

impl Translator {
    /// Create a translator admitting at most `max_concurrent` generations at once
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        languages: LanguageTable,
        params: GenerationParams,
        max_concurrent: usize,
    ) -> Self {
        Self {
            generator,
            languages: Arc::new(languages),
            params,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Translate `text` between two language codes or names
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<TranslationResult> {
        let source_lang_full = self.languages.resolve(source_lang);
        let target_lang_full = self.languages.resolve(target_lang);

        let translation = self
            .translate_resolved(text, &source_lang_full, &target_lang_full)
            .await?;

        Ok(TranslationResult {
            source_lang_full,
            target_lang_full,
            translation,
        })
    }

    /// Translate `text` into each target in order, one generation at a time.
    ///
    /// Failures are recorded per target and do not stop the batch.
    pub async fn translate_batch(
        &self,
        text: &str,
        source_lang: &str,
        target_langs: &[String],
    ) -> BatchTranslationResult {
        let mut result = BatchTranslationResult {
            source_lang_full: self.languages.resolve(source_lang),
            ..Default::default()
        };

        for target_lang in target_langs {
            let target_lang = target_lang.trim();
            if target_lang.is_empty() {
                continue;
            }

            let target_lang_full = self.languages.resolve(target_lang);
            match self
                .translate_resolved(text, &result.source_lang_full, &target_lang_full)
                .await
            {
                Ok(translation) => result.translations.push(translation),
                Err(e) => {
                    warn!("Batch translation to {} failed: {}", target_lang, e);
                    result.errors.insert(target_lang.to_string(), e.to_string());
                }
            }
        }

        info!(
            "Batch finished: {} succeeded, {} failed",
            result.translations.len(),
            result.errors.len()
        );

        result
    }

    async fn translate_resolved(
        &self,
        text: &str,
        source_lang_full: &str,
        target_lang_full: &str,
    ) -> Result<String> {
        info!(
            "Translating {} chars from {} to {}",
            text.chars().count(),
            source_lang_full,
            target_lang_full
        );

        let prompt = build_prompt(text, source_lang_full, target_lang_full);
        debug!("prompt: {}", prompt);

        self.complete(prompt).await
    }

    /// Run one completion on the blocking pool
    async fn complete(&self, prompt: String) -> Result<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TranslationError::InternalError(e.to_string()))?;

        let generator = Arc::clone(&self.generator);
        let params = self.params.clone();

        let output = tokio::task::spawn_blocking(move || generator.generate(&prompt, &params))
            .await
            .map_err(|e| TranslationError::InferenceError {
                message: format!("generation task failed: {e}"),
            })??;

        Ok(output.trim().to_string())
    }
}
