//! llama.cpp backed [`TextGenerator`] for GGUF models

use std::num::NonZeroU32;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::{send_logs_to_tracing, LogOptions};
use tracing::{debug, info};

use crate::core::config::ModelConfig;
use crate::core::engine::TextGenerator;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::GenerationParams;

/// Forward llama.cpp's own logging into `tracing`
pub fn init_logging(verbose: bool) {
    send_logs_to_tracing(LogOptions::default().with_logs_enabled(verbose));
}

/// Map the configured layer count onto llama.cpp's; negative means all layers
fn gpu_layers(n_gpu_layers: i32) -> u32 {
    u32::try_from(n_gpu_layers).unwrap_or(i32::MAX as u32)
}

fn inference_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> TranslationError {
    move |e| TranslationError::InferenceError {
        message: format!("{context}: {e}"),
    }
}

/// Context parameters for one generation.
///
/// `n_batch` equals `n_ctx` so any prompt that fits the context can be
/// decoded in a single batch.
fn context_params(config: &ModelConfig) -> Result<(NonZeroU32, LlamaContextParams)> {
    let n_ctx = NonZeroU32::new(config.n_ctx).ok_or_else(|| TranslationError::ConfigError {
        message: "n_ctx must be greater than 0".to_string(),
    })?;

    let params = LlamaContextParams::default()
        .with_n_ctx(Some(n_ctx))
        .with_n_batch(n_ctx.get())
        .with_n_threads(config.n_threads)
        .with_n_threads_batch(config.n_threads);

    Ok((n_ctx, params))
}

/// A GGUF model loaded once and shared by all requests
pub struct LlamaGenerator {
    backend: LlamaBackend,
    model: LlamaModel,
    config: ModelConfig,
}

impl LlamaGenerator {
    /// Load the model described by `config`
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let path = config.gguf_file.display().to_string();
        let load_err = |message: String| TranslationError::ModelLoadError {
            path: path.clone(),
            message,
        };

        if !config.gguf_file.is_file() {
            return Err(load_err("file not found".to_string()));
        }

        let backend = LlamaBackend::init().map_err(|e| load_err(e.to_string()))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(gpu_layers(config.n_gpu_layers));
        let model = LlamaModel::load_from_file(&backend, &config.gguf_file, &model_params)
            .map_err(|e| load_err(e.to_string()))?;

        info!(
            "Loaded model {} (gpu layers: {}, threads: {}, n_ctx: {})",
            path, config.n_gpu_layers, config.n_threads, config.n_ctx
        );

        Ok(Self {
            backend,
            model,
            config: config.clone(),
        })
    }
}

impl TextGenerator for LlamaGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let (n_ctx, ctx_params) = context_params(&self.config)?;

        let mut ctx = self
            .model
            .new_context(&self.backend, ctx_params)
            .map_err(inference_err("unable to create the llama_context"))?;

        let tokens = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(inference_err("failed to tokenize prompt"))?;

        if tokens.is_empty() || tokens.len() >= n_ctx.get() as usize {
            return Err(TranslationError::PromptTooLong {
                tokens: tokens.len(),
                n_ctx: n_ctx.get(),
            });
        }

        let mut batch = LlamaBatch::new(n_ctx.get() as usize, 1);
        let last_index = tokens.len() as i32 - 1;
        for (i, token) in (0_i32..).zip(tokens.into_iter()) {
            batch
                .add(token, i, &[0], i == last_index)
                .map_err(inference_err("failed to queue prompt"))?;
        }

        ctx.decode(&mut batch)
            .map_err(inference_err("llama_decode() failed"))?;

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::top_k(40),
            LlamaSampler::top_p(0.95, 1),
            LlamaSampler::min_p(0.05, 1),
            LlamaSampler::temp(params.temperature),
            LlamaSampler::dist(params.seed),
        ]);

        let mut decoder = encoding_rs::UTF_8.new_decoder();
        let mut output = String::new();
        let mut n_cur = batch.n_tokens();
        let mut generated: u32 = 0;

        loop {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }

            let bytes = self
                .model
                .token_to_bytes(token, Special::Plaintext)
                .map_err(inference_err("failed to detokenize"))?;
            let mut piece =
                String::with_capacity(decoder.max_utf8_buffer_length(bytes.len()).unwrap_or(32));
            let _ = decoder.decode_to_string(&bytes, &mut piece, false);
            output.push_str(&piece);

            generated += 1;
            if generated >= params.max_tokens || n_cur as u32 >= n_ctx.get() {
                break;
            }

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(inference_err("failed to queue token"))?;
            n_cur += 1;

            ctx.decode(&mut batch).map_err(inference_err("failed to eval"))?;
        }

        let mut tail = String::with_capacity(8);
        let _ = decoder.decode_to_string(&[], &mut tail, true);
        output.push_str(&tail);

        debug!("Generated {} tokens", generated);

        Ok(output.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_gpu_layers_mapping() {
        assert_eq!(gpu_layers(0), 0);
        assert_eq!(gpu_layers(33), 33);
        assert_eq!(gpu_layers(-1), i32::MAX as u32);
    }

    #[test]
    fn test_prompt_batch_covers_whole_context() {
        for n_ctx in [512, 2048, 4096, 8192] {
            let config = ModelConfig {
                n_ctx,
                n_threads: 3,
                ..Default::default()
            };

            let (ctx, params) = context_params(&config).unwrap();
            assert_eq!(ctx.get(), n_ctx);
            assert_eq!(params.n_ctx(), NonZeroU32::new(n_ctx));
            assert_eq!(params.n_batch(), n_ctx);
            assert_eq!(params.n_threads(), 3);
        }
    }

    #[test]
    fn test_zero_context_rejected() {
        let config = ModelConfig {
            n_ctx: 0,
            ..Default::default()
        };
        assert!(matches!(
            context_params(&config),
            Err(TranslationError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_model_file() {
        let config = ModelConfig {
            gguf_file: PathBuf::from("/nonexistent/model.gguf"),
            ..Default::default()
        };

        match LlamaGenerator::load(&config) {
            Err(TranslationError::ModelLoadError { path, message }) => {
                assert_eq!(path, "/nonexistent/model.gguf");
                assert_eq!(message, "file not found");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("model should not load"),
        }
    }
}
