//! Main entry point for LLaMAX Translator

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llamax_translator::cli::commands::{self, Commands};
use llamax_translator::core::config::ServerConfig;
use llamax_translator::core::llama;

/// LLaMAX Translator - machine translation over a local GGUF model
#[derive(Parser, Debug)]
#[command(name = "llamax-translator", version, about, long_about = None)]
struct Args {
    /// JSON or YAML configuration file (environment variables still apply on top)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging, including llama.cpp output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("llamax_translator={log_level},tower_http={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    llama::init_logging(args.verbose);

    let load_config = || ServerConfig::load(args.config.as_deref());

    // Execute command
    match args.command {
        Some(Commands::Serve { host, port }) => {
            commands::handle_serve(load_config()?, host, port).await?;
        }
        Some(Commands::Translate {
            text,
            source_lang,
            target_lang,
        }) => {
            commands::handle_translate(load_config()?, text, source_lang, target_lang).await?;
        }
        Some(Commands::Languages) => {
            commands::handle_languages();
        }
        None => {
            commands::handle_serve(load_config()?, None, None).await?;
        }
    }

    Ok(())
}
