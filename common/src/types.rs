//! インポート・AI補完の型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - ImportRow: 取込ファイル1件分のレコード
//! - ImportResult: インポートエンドポイントの集計結果
//! - SuggestionRequest: 補完リクエスト

use serde::{Deserialize, Serialize};

/// 取込レコード（フィールド名 → 値）
///
/// 送信されるまで識別子を持たない。値は文字列または数値が基本だが、
/// JSONファイル由来の場合はそのまま保持する。
pub type ImportRow = serde_json::Map<String, serde_json::Value>;

/// インポート結果
///
/// 部分的な失敗は正常系: `errors` が空でなくても
/// `created` / `updated` が0とは限らない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportResult {
    pub created: u32,
    pub updated: u32,
    /// 行単位のエラーメッセージ（"Row 3: title and client_id are required" など）
    pub errors: Vec<String>,
}

impl ImportResult {
    /// 1件以上作成または更新されたか
    pub fn has_success(&self) -> bool {
        self.created > 0 || self.updated > 0
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `created + updated <= submitted` を満たすか
    pub fn is_consistent_with(&self, submitted: usize) -> bool {
        (self.created as usize + self.updated as usize) <= submitted
    }

    /// 成功メッセージ（例: "Clients: 3 created, 1 updated"）
    ///
    /// 作成・更新が0件の場合は `None`
    pub fn success_line(&self, label: &str) -> Option<String> {
        let mut parts = Vec::new();
        if self.created > 0 {
            parts.push(format!("{} created", self.created));
        }
        if self.updated > 0 {
            parts.push(format!("{} updated", self.updated));
        }
        if parts.is_empty() {
            return None;
        }
        Some(format!("{}: {}", label, parts.join(", ")))
    }

    /// エラー件数メッセージ（例: "2 row(s) had errors"）
    pub fn error_line(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(format!("{} row(s) had errors", self.errors.len()))
        }
    }

    /// 先頭 `max` 件のエラーと、表示しきれなかった件数
    pub fn error_preview(&self, max: usize) -> (&[String], usize) {
        let shown = self.errors.len().min(max);
        (&self.errors[..shown], self.errors.len() - shown)
    }
}

/// AI補完リクエスト（デバウンス1回ごとに生成）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub text: String,
    pub field_type: String,
    #[serde(default)]
    pub context: String,
}

impl SuggestionRequest {
    pub fn new(text: impl Into<String>, field_type: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            field_type: field_type.into(),
            context: context.into(),
        }
    }
}

/// `/ai/complete` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompletionResponse {
    pub completion: String,
}

/// `/ai/suggest` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}
