//! lexdesk 共通ライブラリ
//!
//! CLIと将来のフロントエンドで共有される型と、I/Oを持たないロジック:
//! - 一括インポートの取込・プレビュー
//! - インライン補完の状態遷移

pub mod types;
pub mod entity;
pub mod error;
pub mod import;
pub mod suggest;

pub use types::{CompletionResponse, ImportResult, ImportRow, SuggestionRequest, SuggestionsResponse};
pub use entity::{EntityKind, Resource};
pub use error::{Error, Result};
pub use import::{parse, preview, ImportFormat, ImportStage, DEFAULT_PREVIEW_LIMIT};
pub use suggest::{strip_echo, InputMode, Key, KeyOutcome, Phase, SuggestionState, SuggestionView, MIN_CHARS};
