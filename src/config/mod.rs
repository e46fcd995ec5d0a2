// src/config/mod.rs
//! Application settings: TOML file (optional) + environment overrides.
//!
//! Lookup order for the file:
//! 1) `$SENTIMENT_CONFIG_PATH` (must exist when set)
//! 2) `config/app.toml`
//! 3) built-in defaults

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::classify::{ClassifierMode, LocalModelKind};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";
pub const ENV_CONFIG_PATH: &str = "SENTIMENT_CONFIG_PATH";

pub const ENV_CLASSIFIER_MODE: &str = "CLASSIFIER_MODE";
pub const ENV_LOCAL_MODEL: &str = "CLASSIFIER_LOCAL_MODEL";
pub const ENV_INFERENCE_URL: &str = "INFERENCE_API_URL";
pub const ENV_INFERENCE_TOKEN: &str = "INFERENCE_API_TOKEN";

pub const DEFAULT_INFERENCE_URL: &str =
    "https://api-inference.huggingface.co/models/distilbert-base-uncased-finetuned-sst-2-english";

fn default_connect_timeout() -> u64 {
    4
}
fn default_timeout() -> u64 {
    10
}
fn default_cookie_name() -> String {
    "sentiment_sid".to_string()
}
fn default_session_ttl() -> u64 {
    24 * 3600
}
fn default_max_sessions() -> usize {
    10_000
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub mode: ClassifierMode,
    /// Model behind the local mode; defaults to `bert` when compiled in.
    #[serde(default)]
    pub local_model: LocalModelKind,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token. "ENV" means: read from INFERENCE_API_TOKEN.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_INFERENCE_URL.to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::default(),
            local_model: LocalModelKind::default(),
            endpoint: default_endpoint(),
            api_token: None,
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Idle sessions older than this are dropped.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Upper bound on live sessions; the least recently used one goes first.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LexiconConfig {
    /// Custom lexicon JSON; the embedded one is used when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            session: SessionConfig::default(),
            lexicon: LexiconConfig::default(),
            static_dir: default_static_dir(),
        }
    }
}

impl AppConfig {
    /// Load using env var + fallbacks, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::parse_file(&pb)?
        } else {
            let default_p = Path::new(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::parse_file(default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        cfg.resolve_api_token();
        Ok(cfg)
    }

    /// Load an explicit file (no env overrides).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut cfg = Self::parse_file(path.as_ref())?;
        cfg.resolve_api_token();
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing app config toml")?;
        Ok(cfg)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(ENV_CLASSIFIER_MODE) {
            self.classifier.mode = raw.parse()?;
        }
        if let Ok(raw) = env::var(ENV_LOCAL_MODEL) {
            self.classifier.local_model = raw.parse()?;
        }
        if let Ok(url) = env::var(ENV_INFERENCE_URL) {
            let url = url.trim();
            if !url.is_empty() {
                self.classifier.endpoint = url.to_string();
            }
        }
        if env::var(ENV_INFERENCE_TOKEN).is_ok() && self.classifier.api_token.is_none() {
            self.classifier.api_token = Some("ENV".to_string());
        }
        Ok(())
    }

    /// "ENV" → INFERENCE_API_TOKEN; empty or unset → no auth header.
    fn resolve_api_token(&mut self) {
        let token = match self.classifier.api_token.take() {
            Some(t) if t.trim().eq_ignore_ascii_case("env") => env::var(ENV_INFERENCE_TOKEN).ok(),
            other => other,
        };
        self.classifier.api_token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.classifier.mode, ClassifierMode::Remote);
        assert_eq!(cfg.classifier.endpoint, DEFAULT_INFERENCE_URL);
        assert_eq!(cfg.session.cookie_name, "sentiment_sid");
        assert_eq!(cfg.session.ttl_secs, 86_400);
        assert_eq!(cfg.session.max_sessions, 10_000);
        assert_eq!(cfg.classifier.local_model, LocalModelKind::default());
        assert!(cfg.lexicon.path.is_none());
        assert_eq!(cfg.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [classifier]
            mode = "local"
            local_model = "lexicon"
            timeout_secs = 3

            [session]
            ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.classifier.mode, ClassifierMode::Local);
        assert_eq!(cfg.classifier.local_model, LocalModelKind::Lexicon);
        assert_eq!(cfg.classifier.timeout_secs, 3);
        assert_eq!(cfg.classifier.connect_timeout_secs, 4);
        assert_eq!(cfg.session.ttl_secs, 60);
        assert_eq!(cfg.session.cookie_name, "sentiment_sid");
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(AppConfig::from_toml_str("[classifier]\nmode = \"cloud\"").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_token_resolution() {
        env::remove_var(ENV_CONFIG_PATH);
        env::set_var(ENV_CLASSIFIER_MODE, "local");
        env::set_var(ENV_LOCAL_MODEL, "lexicon");
        env::set_var(ENV_INFERENCE_URL, "http://127.0.0.1:9/classify");
        env::set_var(ENV_INFERENCE_TOKEN, "  secret  ");

        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides().unwrap();
        cfg.resolve_api_token();
        assert_eq!(cfg.classifier.mode, ClassifierMode::Local);
        assert_eq!(cfg.classifier.local_model, LocalModelKind::Lexicon);
        assert_eq!(cfg.classifier.endpoint, "http://127.0.0.1:9/classify");
        assert_eq!(cfg.classifier.api_token.as_deref(), Some("secret"));

        env::set_var(ENV_CLASSIFIER_MODE, "bogus");
        assert!(AppConfig::default().apply_env_overrides().is_err());

        env::remove_var(ENV_CLASSIFIER_MODE);
        env::remove_var(ENV_LOCAL_MODEL);
        env::remove_var(ENV_INFERENCE_URL);
        env::remove_var(ENV_INFERENCE_TOKEN);
    }

    #[serial_test::serial]
    #[test]
    fn env_token_missing_means_no_auth() {
        env::remove_var(ENV_INFERENCE_TOKEN);
        let mut cfg = AppConfig::from_toml_str("[classifier]\napi_token = \"ENV\"").unwrap();
        cfg.resolve_api_token();
        assert!(cfg.classifier.api_token.is_none());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_must_exist() {
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(AppConfig::load().is_err());
        env::remove_var(ENV_CONFIG_PATH);
    }

    #[serial_test::serial]
    #[test]
    fn load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("app.toml");
        fs::write(&p, "static_dir = \"public\"\n[session]\ncookie_name = \"sid\"\n").unwrap();
        let cfg = AppConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.static_dir, PathBuf::from("public"));
        assert_eq!(cfg.session.cookie_name, "sid");
    }
}
