//! 一括インポートの取込処理
//!
//! CSV/JSONファイルをレコード配列に変換し、プレビュー用に切り詰める。
//! 送信はバックエンド側（エンティティ別の `/import` エンドポイント）が担当し、
//! このモジュールはI/Oを持たない。

use crate::error::{Error, Result};
use crate::types::{ImportResult, ImportRow};
use serde_json::Value;
use std::path::Path;

/// プレビュー表示件数のデフォルト
pub const DEFAULT_PREVIEW_LIMIT: usize = 50;

/// 取込ファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    /// 拡張子から形式を判定（大文字小文字は区別しない）
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" => Ok(ImportFormat::Json),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl std::str::FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" => Ok(ImportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv or json", s)),
        }
    }
}

/// ファイル内容をレコード配列に変換
///
/// # Arguments
/// * `contents` - ファイル全体の文字列
/// * `format` - CSV または JSON
///
/// # Returns
/// * `Ok(Vec<ImportRow>)` - 変換成功（ヘッダのみのCSVは空配列）
/// * `Err(Error::Parse)` - JSONとして不正、またはレコードがオブジェクトでない
pub fn parse(contents: &str, format: ImportFormat) -> Result<Vec<ImportRow>> {
    match format {
        ImportFormat::Csv => Ok(parse_csv(contents)),
        ImportFormat::Json => parse_json(contents),
    }
}

/// CSVをパース
///
/// 1行目をヘッダとし、各行をカンマで分割してヘッダと対応付ける。
/// 値が足りない列は空文字で埋め、余った値は捨てる。
/// クォート内のカンマには対応しない。
///
/// # Examples
/// ```
/// use lexdesk_common::import::parse_csv;
///
/// let rows = parse_csv("name,email\nAlice,a@x.com\nBob");
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1]["email"], "");
/// ```
pub fn parse_csv(text: &str) -> Vec<ImportRow> {
    let mut lines = text.trim().split('\n');

    let headers: Vec<String> = match lines.next() {
        Some(line) => split_csv_line(line),
        None => return Vec::new(),
    };

    lines
        .map(|line| {
            let values = split_csv_line(line);
            headers
                .iter()
                .enumerate()
                .map(|(idx, h)| {
                    let v = values.get(idx).cloned().unwrap_or_default();
                    (h.clone(), Value::String(v))
                })
                .collect()
        })
        .collect()
}

fn split_csv_line(line: &str) -> Vec<String> {
    line.split(',').map(|field| unquote(field.trim()).to_string()).collect()
}

/// 前後のダブルクォートを1組だけ外す
fn unquote(field: &str) -> &str {
    let field = field.strip_prefix('"').unwrap_or(field);
    field.strip_suffix('"').unwrap_or(field)
}

/// JSONをパース
///
/// 受け付ける形:
/// 1. トップレベル配列
/// 2. `data` 配列を持つオブジェクト
/// 3. 単一オブジェクト（1件の配列として扱う）
pub fn parse_json(text: &str) -> Result<Vec<ImportRow>> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| Error::Parse(format!("invalid JSON: {}", e)))?;

    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                // data が配列でなければ元のオブジェクトをそのまま1件として扱う
                obj.insert("data".to_string(), other);
                vec![Value::Object(obj)]
            }
            None => vec![Value::Object(obj)],
        },
        _ => return Err(Error::Parse("expected a JSON array or object".into())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(Error::Parse(format!("row {} is not an object", i + 1))),
        })
        .collect()
}

/// 表示用に先頭 `limit` 件を返す
///
/// 送信対象は常に全件であり、この戻り値ではない。
pub fn preview(rows: &[ImportRow], limit: usize) -> &[ImportRow] {
    &rows[..rows.len().min(limit)]
}

/// プレビュー中のインポート
///
/// パース失敗・送信失敗のどちらでも、表示中のレコードは変更しない。
/// 送信に失敗しても `rows()` をそのまま再送できる。
#[derive(Debug, Clone)]
pub struct ImportStage {
    file_name: String,
    rows: Vec<ImportRow>,
    last_result: Option<ImportResult>,
    preview_limit: usize,
}

impl Default for ImportStage {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LIMIT)
    }
}

impl ImportStage {
    pub fn new(preview_limit: usize) -> Self {
        Self {
            file_name: String::new(),
            rows: Vec::new(),
            last_result: None,
            preview_limit,
        }
    }

    /// ファイルを読み込む
    ///
    /// 成功時のみレコードとファイル名を差し替え、前回の結果を消す。
    /// 失敗時はエラーを返し、状態は一切変えない。
    pub fn load(&mut self, file_name: &str, contents: &str, format: ImportFormat) -> Result<usize> {
        let rows = parse(contents, format)?;
        self.file_name = file_name.to_string();
        self.rows = rows;
        self.last_result = None;
        Ok(self.rows.len())
    }

    /// 送信結果を記録
    pub fn record(&mut self, result: ImportResult) {
        self.last_result = Some(result);
    }

    pub fn clear(&mut self) {
        self.file_name.clear();
        self.rows.clear();
        self.last_result = None;
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 送信対象の全レコード
    pub fn rows(&self) -> &[ImportRow] {
        &self.rows
    }

    pub fn preview(&self) -> &[ImportRow] {
        preview(&self.rows, self.preview_limit)
    }

    pub fn last_result(&self) -> Option<&ImportResult> {
        self.last_result.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
