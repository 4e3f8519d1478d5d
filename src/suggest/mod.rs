mod engine;

pub use engine::{GhostSnapshot, SuggestionEngine};

use crate::api::CompletionBackend;
use crate::config::Config;
use crate::error::{LexdeskError, Result};
use lexdesk_common::{strip_echo, InputMode, SuggestionRequest, MIN_CHARS};
use std::time::Duration;

/// 候補リストの最大件数
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub debounce: Duration,
    /// 再フォーカス時の再取得
    pub refocus_debounce: Duration,
    pub request_timeout: Duration,
    pub blur_grace: Duration,
    pub min_chars: usize,
    pub mode: InputMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            refocus_debounce: Duration::from_millis(400),
            request_timeout: Duration::from_secs(30),
            blur_grace: Duration::from_millis(200),
            min_chars: MIN_CHARS,
            mode: InputMode::SingleLine,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            refocus_debounce: Duration::from_millis(config.refocus_debounce_ms),
            request_timeout: config.timeout(),
            blur_grace: Duration::from_millis(config.blur_grace_ms),
            min_chars: config.min_chars,
            mode: InputMode::SingleLine,
        }
    }

    pub fn with_mode(mut self, mode: InputMode) -> Self {
        self.mode = mode;
        self
    }
}

/// 候補リストを取得（空文字を除き最大5件）
///
/// しきい値未満の入力ではリクエストしない。
pub async fn fetch_suggestions<B: CompletionBackend + ?Sized>(
    backend: &B,
    request: &SuggestionRequest,
    min_chars: usize,
    timeout: Duration,
) -> Result<Vec<String>> {
    if request.text.chars().count() < min_chars {
        return Ok(Vec::new());
    }

    let items = tokio::time::timeout(timeout, backend.suggest(request))
        .await
        .map_err(|_| LexdeskError::Timeout(timeout))??;

    Ok(items
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .take(MAX_SUGGESTIONS)
        .collect())
}

/// 入力と補完をつないだ値（入力の繰り返しは除く）。続きがなければ `None`
pub fn completed_text(text: &str, completion: &str) -> Option<String> {
    let continuation = strip_echo(text, completion);
    if continuation.trim().is_empty() {
        None
    } else {
        Some(format!("{}{}", text, continuation))
    }
}
