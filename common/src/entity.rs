//! エンティティ定義
//!
//! インポート対象のエンティティ群と、一覧取得用のリソースパス。

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// インポート対象のエンティティ群
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Clients,
    Cases,
    Documents,
    Calendar,
    Billing,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Clients,
        EntityKind::Cases,
        EntityKind::Documents,
        EntityKind::Calendar,
        EntityKind::Billing,
    ];

    /// `POST` 先のインポートパス
    pub fn import_path(&self) -> &'static str {
        match self {
            EntityKind::Clients => "/clients/import",
            EntityKind::Cases => "/cases/import",
            EntityKind::Documents => "/documents/import",
            EntityKind::Calendar => "/calendar/import",
            EntityKind::Billing => "/billing/import",
        }
    }

    /// 単数形の表示名
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Clients => "Client",
            EntityKind::Cases => "Case",
            EntityKind::Documents => "Document",
            EntityKind::Calendar => "Calendar item",
            EntityKind::Billing => "Billing entry",
        }
    }

    /// 複数形の表示名（結果メッセージ用）
    pub fn plural_label(&self) -> &'static str {
        match self {
            EntityKind::Clients => "Clients",
            EntityKind::Cases => "Cases",
            EntityKind::Documents => "Documents",
            EntityKind::Calendar => "Calendar items",
            EntityKind::Billing => "Billing entries",
        }
    }

    /// 取込ファイルに期待されるフィールド
    pub fn sample_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Clients => &["name", "email", "phone", "address", "company", "status", "notes"],
            EntityKind::Cases => &[
                "title",
                "client_id",
                "case_number",
                "case_type",
                "description",
                "court",
                "judge",
                "opposing_counsel",
                "status",
            ],
            EntityKind::Documents => &["title", "doc_type", "case_id", "content"],
            EntityKind::Calendar => &["title", "event_type", "start_time", "end_time", "location", "description"],
            EntityKind::Billing => &["case_id", "description", "hours", "rate", "date"],
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clients" | "client" => Ok(EntityKind::Clients),
            "cases" | "case" => Ok(EntityKind::Cases),
            "documents" | "document" | "docs" => Ok(EntityKind::Documents),
            "calendar" | "events" | "deadlines" => Ok(EntityKind::Calendar),
            "billing" | "time-entries" | "time_entries" => Ok(EntityKind::Billing),
            _ => Err(Error::UnknownEntity(s.to_string())),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Clients => "clients",
            EntityKind::Cases => "cases",
            EntityKind::Documents => "documents",
            EntityKind::Calendar => "calendar",
            EntityKind::Billing => "billing",
        };
        write!(f, "{}", name)
    }
}

/// ページング付き一覧エンドポイント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Clients,
    Cases,
    Documents,
    Invoices,
    TimeEntries,
    Events,
    Deadlines,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Clients => "/clients",
            Resource::Cases => "/cases",
            Resource::Documents => "/documents",
            Resource::Invoices => "/billing/invoices",
            Resource::TimeEntries => "/billing/time-entries",
            Resource::Events => "/calendar/events",
            Resource::Deadlines => "/calendar/deadlines",
        }
    }

    /// 1件分のパス（例: `/clients/42`）
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path(), id.trim().trim_matches('/'))
    }
}

impl std::str::FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clients" => Ok(Resource::Clients),
            "cases" => Ok(Resource::Cases),
            "documents" | "docs" => Ok(Resource::Documents),
            "invoices" => Ok(Resource::Invoices),
            "time-entries" | "time_entries" => Ok(Resource::TimeEntries),
            "events" => Ok(Resource::Events),
            "deadlines" => Ok(Resource::Deadlines),
            _ => Err(Error::UnknownEntity(s.to_string())),
        }
    }
}
