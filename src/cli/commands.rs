//! CLI command definitions and handlers

use clap::Subcommand;
use std::sync::Arc;
use tracing::info;

use crate::core::config::ServerConfig;
use crate::core::engine::Translator;
use crate::core::languages::LanguageTable;
use crate::core::llama::LlamaGenerator;

/// Commands for LLaMAX Translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP API server
    Serve {
        /// Bind address (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Translate a single text and print the result
    Translate {
        /// Text to translate
        #[arg(long)]
        text: String,

        /// Source language code or name
        #[arg(short, long)]
        source_lang: String,

        /// Target language code or name
        #[arg(short, long)]
        target_lang: String,
    },

    /// List known language codes
    Languages,
}

/// Handle server command
pub async fn handle_serve(
    mut config: ServerConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    info!(
        "Starting llamax-translator {} on {}:{}",
        crate::VERSION,
        config.host,
        config.port
    );
    println!(
        "🚀 Server v{} starting on http://{}:{}",
        crate::VERSION,
        config.host,
        config.port
    );
    println!(
        "📄 OpenAPI document: http://{}:{}/api-docs/openapi.json",
        config.host, config.port
    );

    run_server(config).await
}

/// Handle one-shot translation command
pub async fn handle_translate(
    config: ServerConfig,
    text: String,
    source_lang: String,
    target_lang: String,
) -> anyhow::Result<()> {
    config.validate()?;

    let model_config = config.model.clone();
    let generator =
        tokio::task::spawn_blocking(move || LlamaGenerator::load(&model_config)).await??;

    let translator = Translator::new(
        Arc::new(generator),
        LanguageTable::builtin(),
        config.generation.clone(),
        1,
    );

    let result = translator.translate(&text, &source_lang, &target_lang).await?;
    info!(
        "Translated from {} to {}",
        result.source_lang_full, result.target_lang_full
    );

    println!("{}", result.translation);

    Ok(())
}

/// Handle languages command
pub fn handle_languages() {
    for (code, name) in LanguageTable::builtin().codes() {
        println!("{code}\t{name}");
    }
}
