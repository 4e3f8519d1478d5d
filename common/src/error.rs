//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// インポートファイルの内容が不正
    #[error("Parse error: {0}")]
    Parse(String),

    /// 対応していない拡張子（CSV/JSONのみ）
    #[error("Unsupported file format: {0}. Use CSV or JSON")]
    UnsupportedFormat(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
