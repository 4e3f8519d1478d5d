//! 一括インポート
//!
//! ファイル読込 → プレビュー → 確認 → 送信 → 結果表示。
//! 送信に失敗してもパース済みのレコードは保持し、再アップロードなしで再送できる。

use crate::api::ImportBackend;
use crate::error::{LexdeskError, Result};
use chrono::{DateTime, Utc};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use lexdesk_common::{EntityKind, ImportFormat, ImportResult, ImportRow, ImportStage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// プレビュー表に出す行数
const PREVIEW_TABLE_ROWS: usize = 5;
/// 結果に出すエラー件数
const ERROR_LINES: usize = 5;
const CELL_WIDTH: usize = 24;

/// タイムアウト付きの送信
pub struct Importer<'a, B: ImportBackend + ?Sized> {
    backend: &'a B,
    timeout: Duration,
}

impl<'a, B: ImportBackend + ?Sized> Importer<'a, B> {
    pub fn new(backend: &'a B, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// 全レコードを送信
    ///
    /// 部分的な失敗は `Ok` のまま `errors` に入って返る。
    pub async fn submit(&self, entity: EntityKind, rows: &[ImportRow]) -> Result<ImportResult> {
        if rows.is_empty() {
            return Err(LexdeskError::NoRows(entity.to_string()));
        }

        let result = tokio::time::timeout(self.timeout, self.backend.import_rows(entity, rows))
            .await
            .map_err(|_| LexdeskError::Timeout(self.timeout))??;

        if !result.is_consistent_with(rows.len()) {
            log::warn!(
                "インポート結果の件数が送信件数を超えています: created={} updated={} submitted={}",
                result.created,
                result.updated,
                rows.len()
            );
        }
        log::info!(
            "{}: created={} updated={} errors={}",
            entity,
            result.created,
            result.updated,
            result.errors.len()
        );
        Ok(result)
    }
}

/// 送信結果の記録（`--report` 指定時に保存）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub entity: EntityKind,
    pub file: String,
    pub submitted_rows: usize,
    pub result: ImportResult,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    pub fn new(entity: EntityKind, file: &str, submitted_rows: usize, result: ImportResult) -> Self {
        Self {
            entity,
            file: file.to_string(),
            submitted_rows,
            result,
            finished_at: Utc::now(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub entity: EntityKind,
    pub file: PathBuf,
    pub preview_limit: usize,
    /// 確認・再試行のプロンプトを出さない
    pub yes: bool,
    pub dry_run: bool,
    pub report: Option<PathBuf>,
    pub timeout: Duration,
}

/// ファイルを読み込んでステージに載せる
pub fn load_stage(path: &Path, preview_limit: usize) -> Result<ImportStage> {
    if !path.exists() {
        return Err(LexdeskError::FileNotFound(path.display().to_string()));
    }

    let format = ImportFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut stage = ImportStage::new(preview_limit);
    stage.load(&file_name, &contents, format)?;
    Ok(stage)
}

/// 対話式インポート
///
/// ドライラン時は `Ok(None)`。
pub async fn run_import<B: ImportBackend + ?Sized>(backend: &B, options: &ImportOptions) -> Result<Option<ImportResult>> {
    let entity = options.entity;
    println!("{} の項目: {}", entity.label(), entity.sample_fields().join(", "));

    let mut stage = load_stage(&options.file, options.preview_limit)?;
    if stage.is_empty() {
        return Err(LexdeskError::NoRows(stage.file_name().to_string()));
    }
    println!("✔ {}: {}件を読み込み\n", stage.file_name(), stage.rows().len());
    print_preview(stage.preview());

    if options.dry_run {
        println!("\n(ドライラン: 送信しません)");
        return Ok(None);
    }

    if !options.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("{} {}件をインポートしますか？", entity.plural_label(), stage.rows().len()))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("中止しました");
            return Ok(None);
        }
    }

    let importer = Importer::new(backend, options.timeout);
    loop {
        let spinner = spinner(&format!("{}件を送信中...", stage.rows().len()));
        let outcome = importer.submit(entity, stage.rows()).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(result) => {
                print_result(entity, &result);
                if let Some(path) = &options.report {
                    ImportReport::new(entity, stage.file_name(), stage.rows().len(), result.clone()).save(path)?;
                    println!("✔ レポートを保存: {}", path.display());
                }
                stage.record(result.clone());
                return Ok(Some(result));
            }
            Err(e) if e.is_transient() && !options.yes => {
                eprintln!("✗ 送信失敗: {}", e);
                let retry = Confirm::new()
                    .with_prompt("同じデータで再送しますか？")
                    .default(true)
                    .interact()?;
                if !retry {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// プレビュー表を出力
pub fn print_preview(rows: &[ImportRow]) {
    println!("{}", format_preview(rows));
}

fn format_preview(rows: &[ImportRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let mut lines = vec![format!("プレビュー ({}件)", rows.len())];
    let header: Vec<String> = first.keys().map(|k| truncate_cell(k)).collect();
    lines.push(header.join(" | "));

    for row in rows.iter().take(PREVIEW_TABLE_ROWS) {
        let cells: Vec<String> = row
            .values()
            .map(|v| match v {
                serde_json::Value::String(s) => truncate_cell(s),
                serde_json::Value::Null => String::new(),
                other => truncate_cell(&other.to_string()),
            })
            .collect();
        lines.push(cells.join(" | "));
    }

    if rows.len() > PREVIEW_TABLE_ROWS {
        lines.push(format!("...and {} more rows", rows.len() - PREVIEW_TABLE_ROWS));
    }
    lines.join("\n")
}

fn truncate_cell(s: &str) -> String {
    if s.chars().count() <= CELL_WIDTH {
        s.to_string()
    } else {
        let cut: String = s.chars().take(CELL_WIDTH - 1).collect();
        format!("{}…", cut)
    }
}

/// 成功件数とエラーは両方表示する（どちらか一方ではない）
pub fn print_result(entity: EntityKind, result: &ImportResult) {
    for line in format_result(entity, result) {
        println!("{}", line);
    }
}

fn format_result(entity: EntityKind, result: &ImportResult) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(success) = result.success_line(entity.plural_label()) {
        lines.push(format!("✔ {}", success));
    }
    if let Some(errors) = result.error_line() {
        lines.push(format!("✗ {}", errors));
        let (shown, rest) = result.error_preview(ERROR_LINES);
        lines.extend(shown.iter().map(|e| format!("  - {}", e)));
        if rest > 0 {
            lines.push(format!("  ...and {} more", rest));
        }
    }
    if lines.is_empty() {
        lines.push("変更はありませんでした".to_string());
    }
    lines
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
