//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::env::VarError;
use std::str::FromStr;
use tracing::{info, warn};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::GenerationParams;

/// Default GGUF model location
pub const DEFAULT_GGUF_FILE: &str = "models/LLaMAX3-8B-Alpaca.Q8_0.gguf";

/// Model loading and context parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub gguf_file: PathBuf,
    /// Layers offloaded to the GPU; negative offloads all of them
    pub n_gpu_layers: i32,
    pub n_threads: i32,
    pub n_ctx: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gguf_file: PathBuf::from(DEFAULT_GGUF_FILE),
            n_gpu_layers: -1,
            n_threads: 8,
            n_ctx: 2048,
        }
    }
}

/// Configuration for the translation server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model: ModelConfig,
    pub generation: GenerationParams,
    pub max_concurrent_generations: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model: ModelConfig::default(),
            generation: GenerationParams::default(),
            max_concurrent_generations: 1,
        }
    }
}

/// Read an environment variable; `None` when unset, an error when not Unicode
fn env_string(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(raw) => Ok(Some(raw)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(TranslationError::ConfigError {
            message: format!("{key}={raw:?} is not valid Unicode"),
        }),
    }
}

/// Read and parse an environment variable, keeping `current` when unset
fn env_or<T>(key: &str, current: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key)? {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| TranslationError::ConfigError {
            message: format!("{key}={raw:?} is invalid: {e}"),
        }),
        None => Ok(current),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Override fields with any environment variables that are set
    pub fn merge_env(self) -> Result<Self> {
        let mut config = self;

        if let Some(path) = env_string("GGUF_FILE")? {
            config.model.gguf_file = PathBuf::from(path);
        }
        config.model.n_gpu_layers = env_or("N_GPU_LAYERS", config.model.n_gpu_layers)?;
        config.model.n_threads = env_or("N_THREADS", config.model.n_threads)?;
        config.model.n_ctx = env_or("N_CTX", config.model.n_ctx)?;

        if let Some(host) = env_string("HOST")? {
            config.host = host;
        }
        config.port = env_or("PORT", config.port)?;

        config.generation.max_tokens = env_or("MAX_TOKENS", config.generation.max_tokens)?;
        config.generation.temperature = env_or("TEMPERATURE", config.generation.temperature)?;
        config.generation.seed = env_or("SEED", config.generation.seed)?;

        config.max_concurrent_generations =
            env_or("MAX_CONCURRENT_GENERATIONS", config.max_concurrent_generations)?;

        Ok(config)
    }

    /// Load from a JSON or YAML file, chosen by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            other => {
                return Err(TranslationError::ConfigError {
                    message: format!(
                        "Unsupported config format {:?} for {}",
                        other.unwrap_or(""),
                        path.display()
                    ),
                })
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path)?.merge_env(),
            None => Self::from_env(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(TranslationError::ConfigError {
                message: message.to_string(),
            })
        };

        if self.model.gguf_file.as_os_str().is_empty() {
            return invalid("GGUF_FILE must not be empty");
        }

        if self.model.n_threads <= 0 {
            return invalid("N_THREADS must be greater than 0");
        }

        if self.model.n_ctx == 0 {
            return invalid("N_CTX must be greater than 0");
        }

        if self.generation.max_tokens == 0 {
            return invalid("MAX_TOKENS must be greater than 0");
        }

        if !self.generation.temperature.is_finite() || self.generation.temperature < 0.0 {
            return invalid("TEMPERATURE must be a non-negative number");
        }

        if self.max_concurrent_generations == 0 {
            return invalid("MAX_CONCURRENT_GENERATIONS must be greater than 0");
        }

        if self.max_concurrent_generations > 1 {
            warn!(
                "{} concurrent generations share one model; each needs its own {}-token context",
                self.max_concurrent_generations, self.model.n_ctx
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[test]
    fn test_defaults_match_deployment() {
        let config = ServerConfig::default();
        assert_eq!(config.model.gguf_file, PathBuf::from(DEFAULT_GGUF_FILE));
        assert_eq!(config.model.n_gpu_layers, -1);
        assert_eq!(config.model.n_threads, 8);
        assert_eq!(config.model.n_ctx, 2048);
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_concurrent_generations, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ServerConfig {
            max_concurrent_generations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.model.n_threads = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.generation.temperature = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.model.gguf_file = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "port: 8080\nmodel:\n  gguf_file: /srv/model.gguf\n  n_threads: 4\ngeneration:\n  temperature: 0.5\n"
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.model.gguf_file, PathBuf::from("/srv/model.gguf"));
        assert_eq!(config.model.n_threads, 4);
        assert_eq!(config.model.n_ctx, 2048);
        assert_eq!(config.generation.temperature, 0.5);
        assert_eq!(config.generation.max_tokens, 1024);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"host": "127.0.0.1", "model": {{"n_gpu_layers": 20}}}}"#).unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.model.n_gpu_layers, 20);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_env_value_parsing() {
        std::env::set_var("LLAMAX_TEST_BAD_PORT", "not-a-port");
        std::env::set_var("LLAMAX_TEST_GOOD_PORT", " 9000 ");

        assert!(env_or::<u16>("LLAMAX_TEST_BAD_PORT", 5000).is_err());
        assert_eq!(env_or::<u16>("LLAMAX_TEST_GOOD_PORT", 5000).unwrap(), 9000);
        assert_eq!(env_or::<u16>("LLAMAX_TEST_UNSET_PORT", 5000).unwrap(), 5000);
    }

    /// Serializes tests that touch the real configuration variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const CONFIG_VARS: &[&str] = &[
        "GGUF_FILE",
        "N_GPU_LAYERS",
        "N_THREADS",
        "N_CTX",
        "HOST",
        "PORT",
        "MAX_TOKENS",
        "TEMPERATURE",
        "SEED",
        "MAX_CONCURRENT_GENERATIONS",
    ];

    fn clear_config_vars() {
        for key in CONFIG_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_reads_every_variable() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_vars();

        let values = [
            ("GGUF_FILE", "/models/other.gguf"),
            ("N_GPU_LAYERS", "12"),
            ("N_THREADS", "3"),
            ("N_CTX", "4096"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("MAX_TOKENS", "256"),
            ("TEMPERATURE", "0.7"),
            ("SEED", "42"),
            ("MAX_CONCURRENT_GENERATIONS", "2"),
        ];
        for (key, value) in values {
            std::env::set_var(key, value);
        }

        let loaded = ServerConfig::load(None);
        clear_config_vars();
        let config = loaded.unwrap();

        assert_eq!(config.model.gguf_file, PathBuf::from("/models/other.gguf"));
        assert_eq!(config.model.n_gpu_layers, 12);
        assert_eq!(config.model.n_threads, 3);
        assert_eq!(config.model.n_ctx, 4096);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.generation.max_tokens, 256);
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.generation.seed, 42);
        assert_eq!(config.max_concurrent_generations, 2);
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_vars();

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "port: 8080\nmodel:\n  n_threads: 4\n").unwrap();

        std::env::set_var("PORT", "9100");
        let loaded = ServerConfig::load(Some(file.path()));
        clear_config_vars();
        let config = loaded.unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.model.n_threads, 4);
        assert_eq!(config.model.gguf_file, PathBuf::from(DEFAULT_GGUF_FILE));
    }

    #[test]
    fn test_load_without_env_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_config_vars();

        assert_eq!(ServerConfig::load(None).unwrap(), ServerConfig::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_env_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var("LLAMAX_TEST_NON_UNICODE", OsStr::from_bytes(&[0x66, 0x80]));

        let err = env_or::<u16>("LLAMAX_TEST_NON_UNICODE", 5000).unwrap_err();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
        assert!(env_string("LLAMAX_TEST_NON_UNICODE").is_err());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, TranslationError::ConfigError { .. }));
    }
}
