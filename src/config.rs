use crate::error::{LexdeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    /// `lexdesk login` で保存されるアクセストークン
    pub token: Option<String>,
    pub timeout_seconds: u64,
    /// インライン補完のデバウンス
    pub debounce_ms: u64,
    /// 候補リストのデバウンス
    pub suggest_debounce_ms: u64,
    pub refocus_debounce_ms: u64,
    pub blur_grace_ms: u64,
    pub min_chars: usize,
    pub preview_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            token: None,
            timeout_seconds: 30,
            debounce_ms: 800,
            suggest_debounce_ms: 600,
            refocus_debounce_ms: 400,
            blur_grace_ms: 200,
            min_chars: lexdesk_common::MIN_CHARS,
            preview_limit: lexdesk_common::DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_env_overrides())
    }

    /// 指定パスから読み込み（存在しなければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LexdeskError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("lexdesk").join("config.json"))
    }

    /// 環境変数を優先
    fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = std::env::var("LEXDESK_API_BASE") {
            if !base.trim().is_empty() {
                self.api_base = base;
            }
        }
        if let Ok(token) = std::env::var("LEXDESK_TOKEN") {
            if !token.trim().is_empty() {
                self.token = Some(token);
            }
        }
        self
    }

    pub fn get_token(&self) -> Result<String> {
        self.token.clone().ok_or(LexdeskError::MissingToken)
    }

    pub fn set_api_base(&mut self, base: String) -> Result<()> {
        let trimmed = base.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(LexdeskError::Config(format!("URLが不正です: {}", base)));
        }
        self.api_base = trimmed.to_string();
        self.save()
    }

    /// 0秒は即タイムアウトになるため最低1秒
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}
