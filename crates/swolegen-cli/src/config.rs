//! Configuration file management for swolegen.
//!
//! Provides a TOML-based config file at `~/.config/swolegen/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use swolegen_core::activity;
use swolegen_core::pipeline::{Pipeline, PipelineConfig, config as pipeline_config};
use swolegen_core::provider::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use swolegen_core::provider::{OpenAiConfig, OpenAiProvider, ProviderRegistry};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub strava: StravaSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fetch_bytes: Option<i64>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StravaSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the swolegen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/swolegen` or
/// `~/.config/swolegen`, never the platform-specific application dir.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("swolegen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("swolegen")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Env helpers
// -----------------------------------------------------------------------

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a signed integer env var so negative values surface as config
/// errors instead of parse failures.
fn env_int(name: &str) -> Result<Option<i64>> {
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .with_context(|| format!("{name} must be an integer, got {raw:?}")),
        None => Ok(None),
    }
}

/// `true`, `1`, `yes` or `on` (any case).
pub fn env_flag(name: &str) -> bool {
    env_string(name).is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line; `None` falls through the chain.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub retries: Option<i64>,
    pub max_fetch_bytes: Option<i64>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SwolegenConfig {
    pub provider: String,
    pub openai: OpenAiConfig,
    pub pipeline: PipelineConfig,
    pub strava_token: Option<String>,
    pub strava_base_url: String,
}

impl SwolegenConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `OPENAI_API_KEY` env > `llm.api_key`
    /// - Model: `--model` > `LLM_MODEL` > `llm.model` > `gpt-4o-mini`
    /// - Base URL: `--base-url` > `LLM_BASE_URL` > `llm.base_url` > OpenAI
    /// - Retries: `--retries` > `LLM_RETRIES` > `llm.retries` > 3
    /// - Fetch cap: `--max-fetch-bytes` > `LLM_MAX_FETCH_BYTES` > `llm.max_fetch_bytes` > 65536
    /// - Strava token: `STRAVA_ACCESS_TOKEN` > `strava.access_token`
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config().unwrap_or_default();

        let api_key = env_string("OPENAI_API_KEY")
            .or(file.llm.api_key)
            .unwrap_or_default();
        let model = cli
            .model
            .clone()
            .or_else(|| env_string("LLM_MODEL"))
            .or(file.llm.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = cli
            .base_url
            .clone()
            .or_else(|| env_string("LLM_BASE_URL"))
            .or(file.llm.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let retries = match cli.retries {
            Some(n) => n,
            None => env_int("LLM_RETRIES")?
                .or(file.llm.retries)
                .unwrap_or(i64::from(pipeline_config::DEFAULT_RETRIES)),
        };
        let max_fetch_bytes = match cli.max_fetch_bytes {
            Some(n) => n,
            None => env_int("LLM_MAX_FETCH_BYTES")?
                .or(file.llm.max_fetch_bytes)
                .unwrap_or(pipeline_config::DEFAULT_MAX_FETCH_BYTES as i64),
        };
        let pipeline = PipelineConfig::from_raw(retries, max_fetch_bytes)
            .context("invalid pipeline configuration")?;

        let mut openai = OpenAiConfig::new(api_key);
        openai.model = model;
        openai.base_url = base_url;
        if let Some(secs) = file.llm.timeout_secs {
            openai.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            provider: cli.provider.clone().unwrap_or_else(|| "openai".to_string()),
            openai,
            pipeline,
            strava_token: env_string("STRAVA_ACCESS_TOKEN").or(file.strava.access_token),
            strava_base_url: file
                .strava
                .base_url
                .unwrap_or_else(|| activity::DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Every provider the CLI knows how to construct.
    pub fn registry(&self) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        let openai = OpenAiProvider::new(self.openai.clone())
            .context("failed to initialize openai provider")?;
        registry.register(openai);
        Ok(registry)
    }

    /// Build the pipeline for the selected provider. Fails before any
    /// network activity when the provider is unknown or misconfigured.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let registry = self.registry()?;
        let provider = registry
            .select(&self.provider)
            .context("failed to select completion provider")?;
        let pipeline = Pipeline::builder()
            .provider(provider)
            .config(self.pipeline)
            .build()
            .context("failed to configure pipeline")?;
        Ok(pipeline)
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 7] = [
        "OPENAI_API_KEY",
        "LLM_MODEL",
        "LLM_BASE_URL",
        "LLM_RETRIES",
        "LLM_MAX_FETCH_BYTES",
        "STRAVA_ACCESS_TOKEN",
        "XDG_CONFIG_HOME",
    ];

    /// Clear every variable the resolver reads and point the config dir at
    /// an empty temp dir. Holds the env lock for the guard's lifetime.
    struct CleanEnv {
        _lock: std::sync::MutexGuard<'static, ()>,
        dir: tempfile::TempDir,
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl CleanEnv {
        fn new() -> Self {
            let lock = crate::test_util::lock_env();
            let saved = VARS.iter().map(|v| (*v, std::env::var(v).ok())).collect();
            let dir = tempfile::TempDir::new().unwrap();
            for var in VARS {
                unsafe { std::env::remove_var(var) };
            }
            unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };
            Self {
                _lock: lock,
                dir,
                saved,
            }
        }

        fn set(&self, name: &str, value: &str) {
            unsafe { std::env::set_var(name, value) };
        }

        fn write_config(&self, contents: &str) {
            let dir = self.dir.path().join("swolegen");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("config.toml"), contents).unwrap();
        }
    }

    impl Drop for CleanEnv {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => unsafe { std::env::set_var(name, v) },
                    None => unsafe { std::env::remove_var(name) },
                }
            }
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _env = CleanEnv::new();
        let config = SwolegenConfig::resolve(&CliOverrides::default()).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.openai.model, DEFAULT_MODEL);
        assert_eq!(config.openai.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert!(config.strava_token.is_none());
    }

    #[test]
    fn registry_offers_openai_with_configured_timeout() {
        let env = CleanEnv::new();
        env.set("OPENAI_API_KEY", "sk-test");
        let mut config = SwolegenConfig::resolve(&CliOverrides::default()).unwrap();
        config.openai.timeout = Duration::from_secs(5);

        let registry = config.registry().unwrap();
        assert_eq!(registry.list(), vec!["openai"]);
        assert!(config.build_pipeline().is_ok());
    }

    #[test]
    fn cli_flag_overrides_env_and_file() {
        let env = CleanEnv::new();
        env.write_config("[llm]\nmodel = \"file-model\"\nretries = 5\n");
        env.set("LLM_MODEL", "env-model");
        env.set("LLM_RETRIES", "4");

        let cli = CliOverrides {
            model: Some("cli-model".to_string()),
            retries: Some(1),
            ..Default::default()
        };
        let config = SwolegenConfig::resolve(&cli).unwrap();
        assert_eq!(config.openai.model, "cli-model");
        assert_eq!(config.pipeline.retries, 1);
    }

    #[test]
    fn env_overrides_config_file() {
        let env = CleanEnv::new();
        env.write_config("[llm]\nmodel = \"file-model\"\napi_key = \"sk-file\"\n");
        env.set("LLM_MODEL", "env-model");

        let config = SwolegenConfig::resolve(&CliOverrides::default()).unwrap();
        assert_eq!(config.openai.model, "env-model");
        assert_eq!(config.openai.api_key, "sk-file");
    }

    #[test]
    fn negative_retries_is_a_config_error() {
        let env = CleanEnv::new();
        env.set("LLM_RETRIES", "-1");
        let err = SwolegenConfig::resolve(&CliOverrides::default()).unwrap_err();
        assert!(
            format!("{err:#}").contains("retry count must be non-negative"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn non_numeric_env_is_rejected() {
        let env = CleanEnv::new();
        env.set("LLM_MAX_FETCH_BYTES", "lots");
        let err = SwolegenConfig::resolve(&CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_FETCH_BYTES must be an integer"));
    }

    #[test]
    fn zero_fetch_cap_is_a_config_error() {
        let _env = CleanEnv::new();
        let cli = CliOverrides {
            max_fetch_bytes: Some(0),
            ..Default::default()
        };
        assert!(SwolegenConfig::resolve(&cli).is_err());
    }

    #[test]
    fn build_pipeline_requires_api_key() {
        let _env = CleanEnv::new();
        let config = SwolegenConfig::resolve(&CliOverrides::default()).unwrap();
        let err = config.build_pipeline().unwrap_err();
        assert!(format!("{err:#}").contains("api key not set"));
    }

    #[test]
    fn build_pipeline_rejects_unknown_provider() {
        let env = CleanEnv::new();
        env.set("OPENAI_API_KEY", "sk-test");
        let cli = CliOverrides {
            provider: Some("llama".to_string()),
            ..Default::default()
        };
        let config = SwolegenConfig::resolve(&cli).unwrap();
        let err = format!("{:#}", config.build_pipeline().unwrap_err());
        assert!(err.contains("unknown provider \"llama\""), "{err}");
        assert!(err.contains("available: openai"), "{err}");
    }

    #[test]
    fn save_config_round_trips_with_private_permissions() {
        let _env = CleanEnv::new();
        let original = ConfigFile {
            llm: LlmSection {
                api_key: Some("sk-saved".to_string()),
                retries: Some(2),
                ..Default::default()
            },
            strava: StravaSection::default(),
        };
        save_config(&original).unwrap();

        let loaded = load_config().unwrap();
        assert_eq!(loaded.llm.api_key.as_deref(), Some("sk-saved"));
        assert_eq!(loaded.llm.retries, Some(2));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(config_path()).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn env_flag_accepts_truthy_values() {
        let env = CleanEnv::new();
        env.set("SWOLEGEN_TEST_FLAG", "TRUE");
        assert!(env_flag("SWOLEGEN_TEST_FLAG"));
        env.set("SWOLEGEN_TEST_FLAG", "0");
        assert!(!env_flag("SWOLEGEN_TEST_FLAG"));
        unsafe { std::env::remove_var("SWOLEGEN_TEST_FLAG") };
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("swolegen/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
