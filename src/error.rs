use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexdeskError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ログインしていません。`lexdesk login` でログインしてください")]
    MissingToken,

    /// 401: 認証切れ。トークンは破棄し、再ログインを促す
    #[error("認証の有効期限が切れました。`lexdesk login` で再ログインしてください")]
    Unauthorized,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("取込対象のレコードがありません: {0}")]
    NoRows(String),

    #[error("タイムアウトしました（{}秒）", .0.as_secs())]
    Timeout(Duration),

    #[error("通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("APIエラー ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error(transparent)]
    Common(#[from] lexdesk_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl LexdeskError {
    /// タイムアウト・通信エラーなど、同じ内容で再試行できる失敗か
    pub fn is_transient(&self) -> bool {
        match self {
            LexdeskError::Timeout(_) => true,
            LexdeskError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LexdeskError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LexdeskError>;
