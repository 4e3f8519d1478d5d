//! バックエンドAPI連携
//!
//! - session: 認証付きHTTPクライアント
//! - records: 一覧（ページング）と一括インポート
//! - ai: 補完・候補・リサーチ等のAIエンドポイント
//!
//! インポートと補完はトレイト越しに呼び出し、テストでは差し替える。

mod ai;
mod records;
mod session;

pub use ai::{AnalyzeRequest, DraftRequest, ResearchRequest, ResearchResponse};
pub use records::{paginate, ListQuery, Page};
pub use session::{decode_response, LoginResponse, Session};

use crate::error::Result;
use async_trait::async_trait;
use lexdesk_common::{EntityKind, ImportResult, ImportRow, SuggestionRequest};

/// エンティティ別インポートエンドポイント
#[async_trait]
pub trait ImportBackend: Send + Sync {
    /// `POST /{family}/import` に `{data: rows}` を送る
    async fn import_rows(&self, entity: EntityKind, rows: &[ImportRow]) -> Result<ImportResult>;
}

/// AI補完エンドポイント
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 入力の続きだけを返す（インライン補完）
    async fn complete(&self, request: &SuggestionRequest) -> Result<String>;

    /// 候補を複数返す
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>>;
}
