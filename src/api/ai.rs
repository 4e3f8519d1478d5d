//! AIエンドポイント
//!
//! いずれも同期的なリクエスト/レスポンス。プロンプト構築はバックエンド側。

use super::{CompletionBackend, Session};
use crate::error::{LexdeskError, Result};
use async_trait::async_trait;
use lexdesk_common::{CompletionResponse, SuggestionRequest, SuggestionsResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[async_trait]
impl CompletionBackend for Session {
    async fn complete(&self, request: &SuggestionRequest) -> Result<String> {
        let response: CompletionResponse = self.post_json("/ai/complete", request).await?;
        Ok(response.completion)
    }

    async fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>> {
        let response: SuggestionsResponse = self.post_json("/ai/suggest", request).await?;
        Ok(response.suggestions)
    }
}

/// 法令・判例リサーチ
#[derive(Debug, Clone, Serialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_of_law: Option<String>,
    pub include_case_law: bool,
    pub include_statutes: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResearchResponse {
    pub summary: String,
    pub key_points: Vec<String>,
    pub relevant_cases: Vec<Value>,
    pub relevant_statutes: Vec<Value>,
    pub recommendations: Vec<String>,
    pub disclaimer: String,
}

/// 書面ドラフト
#[derive(Debug, Clone, Serialize)]
pub struct DraftRequest {
    pub doc_type: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, String>,
}

/// 書面分析（登録済み文書IDまたは本文）
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Serialize)]
struct AutofillRequest<'a> {
    form_type: &'a str,
    fields: &'a [String],
    existing: &'a Map<String, Value>,
    context: &'a str,
}

#[derive(Deserialize)]
struct SummaryResponse {
    summary: Option<String>,
    error: Option<String>,
}

impl Session {
    pub async fn research(&self, request: &ResearchRequest) -> Result<ResearchResponse> {
        self.post_json("/ai/research", request).await
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        let response: SummaryResponse = self
            .post_json("/ai/summarize", &serde_json::json!({ "text": text }))
            .await?;

        match (response.summary, response.error) {
            (Some(summary), _) => Ok(summary),
            (None, Some(error)) => Err(LexdeskError::Api { status: 200, detail: error }),
            (None, None) => Err(LexdeskError::ApiParse("summary がありません".into())),
        }
    }

    /// ドラフトを作成（作成された文書がそのまま返る）
    pub async fn draft(&self, request: &DraftRequest) -> Result<Value> {
        self.post_json("/documents/draft", request).await
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<Value> {
        self.post_json("/documents/analyze", request).await
    }

    /// フォーム自動入力。既存の値は維持され、残りのフィールドが埋まる
    pub async fn autofill(
        &self,
        form_type: &str,
        fields: &[String],
        existing: &Map<String, Value>,
        context: &str,
    ) -> Result<Map<String, Value>> {
        let request = AutofillRequest {
            form_type,
            fields,
            existing,
            context,
        };
        self.post_json("/ai/autofill", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_request_skips_empty_options() {
        let request = ResearchRequest {
            query: "adverse possession elements".into(),
            jurisdiction: None,
            area_of_law: Some("real_estate".into()),
            include_case_law: true,
            include_statutes: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("jurisdiction").is_none());
        assert_eq!(json["area_of_law"], "real_estate");
        assert_eq!(json["include_statutes"], false);
    }

    #[test]
    fn test_research_response_partial() {
        let response: ResearchResponse =
            serde_json::from_str(r#"{"summary": "Short answer", "key_points": ["a", "b"]}"#).unwrap();
        assert_eq!(response.summary, "Short answer");
        assert_eq!(response.key_points.len(), 2);
        assert!(response.relevant_cases.is_empty());
    }

    #[test]
    fn test_draft_request_omits_empty_variables() {
        let request = DraftRequest {
            doc_type: "motion".into(),
            context: "Motion to compel discovery".into(),
            template_id: None,
            variables: HashMap::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("variables").is_none());
        assert!(json.get("template_id").is_none());
    }
}
