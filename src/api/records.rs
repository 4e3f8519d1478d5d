//! 一覧取得と一括インポート

use super::{ImportBackend, Session};
use crate::error::Result;
use async_trait::async_trait;
use lexdesk_common::{EntityKind, ImportResult, ImportRow, Resource};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

#[derive(Serialize)]
struct ImportPayload<'a> {
    data: &'a [ImportRow],
}

#[async_trait]
impl ImportBackend for Session {
    async fn import_rows(&self, entity: EntityKind, rows: &[ImportRow]) -> Result<ImportResult> {
        log::info!("{} へ {}件送信", entity.import_path(), rows.len());
        self.post_json(entity.import_path(), &ImportPayload { data: rows }).await
    }
}

/// 一覧取得の条件
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: 25,
            offset: 0,
        }
    }
}

impl ListQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string()), ("offset", self.offset.to_string())];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }
}

/// 1ページ分の一覧
///
/// 総件数は返ってこないため、件数が `limit` と同じなら次ページがあるとみなす。
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn has_more(&self) -> bool {
        self.limit > 0 && self.items.len() == self.limit
    }

    pub fn next_offset(&self) -> usize {
        self.offset + self.items.len()
    }
}

impl Session {
    pub async fn list_page(&self, resource: Resource, query: &ListQuery) -> Result<Page> {
        let items: Vec<Value> = self.get_json(resource.path(), &query.params()).await?;
        Ok(Page {
            items,
            limit: query.limit,
            offset: query.offset,
        })
    }

    pub async fn get_record(&self, resource: Resource, id: &str) -> Result<Value> {
        self.get_json(&resource.item_path(id), &[]).await
    }

    /// 削除（204 は `null` として受ける）
    pub async fn delete_record(&self, resource: Resource, id: &str) -> Result<()> {
        let _: Value = self.delete_json(&resource.item_path(id)).await?;
        log::info!("削除: {}", resource.item_path(id));
        Ok(())
    }

    /// 最終ページまで順に取得
    pub async fn list_all(&self, resource: Resource, search: Option<String>, page_size: usize) -> Result<Vec<Value>> {
        paginate(page_size, |offset| {
            let query = ListQuery {
                search: search.clone(),
                limit: page_size,
                offset,
            };
            async move { self.list_page(resource, &query).await.map(|p| p.items) }
        })
        .await
    }
}

/// offset方式のページングで全件を集める
pub async fn paginate<F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<Value>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<Value>>>,
{
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        let items = fetch(offset).await?;
        let page = Page {
            items,
            limit: page_size,
            offset,
        };
        let more = page.has_more();
        offset = page.next_offset();
        all.extend(page.items);

        if !more {
            break;
        }
    }

    Ok(all)
}
