//! セッション（認証済みRESTクライアント）
//!
//! 起動時に設定から生成し、ログアウトで破棄する。
//! モジュール単位のグローバル状態は持たない。

use crate::config::Config;
use crate::error::{LexdeskError, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// `/auth/login` のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Value,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Session {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    /// 保存済みトークンでセッションを開始（未ログインならエラー）
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.get_token()?;
        Self::new(&config.api_base, Some(token), config.timeout())
    }

    /// メールアドレスとパスワードでログインし、新しいセッションを返す
    pub async fn login(config: &Config, email: &str, password: &str) -> Result<(Self, LoginResponse)> {
        let anonymous = Self::new(&config.api_base, None, config.timeout())?;
        let response: LoginResponse = anonymous
            .post_json("/auth/login", &LoginRequest { email, password })
            .await?;

        log::info!("ログイン成功: {}", email);
        let session = Self::new(&config.api_base, Some(response.access_token.clone()), config.timeout())?;
        Ok((session, response))
    }

    /// ログアウト（トークンを破棄して以降のリクエストを無効化）
    pub fn end(self) {
        log::debug!("セッション終了: {}", self.base_url);
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.http.get(self.url(path)).query(query);
        self.send(request).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.delete(self.url(path));
        self.send(request).await
    }

    /// ログイン中のユーザー（`/auth/me`）
    pub async fn me(&self) -> Result<Value> {
        self.get_json("/auth/me", &[]).await
    }

    /// 送信からボディ読み込みまでを `timeout` 内に収める
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await?;
            log::debug!("{} {} ({} bytes)", status.as_u16(), url, body.len());
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) if e.is_timeout() => return Err(LexdeskError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(LexdeskError::Http(e)),
            Err(_) => return Err(LexdeskError::Timeout(self.timeout)),
        };

        decode_response(status, &body)
    }
}

/// ステータスとボディからレスポンスを復元
///
/// - 401: `Unauthorized`
/// - 2xx 以外: `{"detail": ...}` を含む `Api` エラー
/// - 204 / 空ボディ: `null` として解釈
pub fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(LexdeskError::Unauthorized);
    }

    if !status.is_success() {
        return Err(LexdeskError::Api {
            status: status.as_u16(),
            detail: error_detail(body),
        });
    }

    let value = if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).map_err(|e| LexdeskError::ApiParse(e.to_string()))?
    };

    serde_json::from_value(value).map_err(|e| LexdeskError::ApiParse(e.to_string()))
}

/// エラーボディから `detail` を取り出す
fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    match detail {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => "Request failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdesk_common::ImportResult;

    fn session() -> Session {
        Session::new("http://localhost:8000/api/", None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let s = session();
        assert_eq!(s.url("/clients/import"), "http://localhost:8000/api/clients/import");
        assert_eq!(s.url("ai/complete"), "http://localhost:8000/api/ai/complete");
    }

    #[test]
    fn test_decode_success() {
        let result: ImportResult =
            decode_response(StatusCode::OK, r#"{"created": 3, "updated": 0, "errors": []}"#).unwrap();
        assert_eq!(result.created, 3);
    }

    #[test]
    fn test_decode_unauthorized() {
        let result: Result<Value> = decode_response(StatusCode::UNAUTHORIZED, r#"{"detail": "Not authenticated"}"#);
        assert!(matches!(result, Err(LexdeskError::Unauthorized)));
    }

    #[test]
    fn test_decode_error_detail() {
        let result: Result<Value> = decode_response(StatusCode::BAD_REQUEST, r#"{"detail": "No data provided"}"#);
        match result {
            Err(LexdeskError::Api { status, detail }) => {
                assert_eq!(status, 400);
                assert_eq!(detail, "No data provided");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_without_json_body() {
        let result: Result<Value> = decode_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match result {
            Err(LexdeskError::Api { status, detail }) => {
                assert_eq!(status, 502);
                assert_eq!(detail, "Request failed");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_no_content() {
        let result: Option<Value> = decode_response(StatusCode::NO_CONTENT, "").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_malformed_success_body() {
        let result: Result<ImportResult> = decode_response(StatusCode::OK, "not json");
        assert!(matches!(result, Err(LexdeskError::ApiParse(_))));
    }
}
