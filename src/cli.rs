use clap::{Parser, Subcommand};
use lexdesk_common::{EntityKind, Resource};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lexdesk")]
#[command(about = "法律事務所向け 一括インポート・AI入力補完ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ログインしてトークンを保存
    Login {
        /// メールアドレス（省略時は対話入力）
        #[arg(short, long)]
        email: Option<String>,
    },

    /// 保存済みトークンを破棄
    Logout,

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_base: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// CSV/JSONファイルを一括インポート
    Import {
        /// 対象 (clients/cases/documents/calendar/billing)
        #[arg(required = true)]
        entity: EntityKind,

        /// 入力ファイル（.csv / .json）
        #[arg(required = true)]
        file: PathBuf,

        /// プレビュー件数（省略時は設定値）
        #[arg(long)]
        preview_limit: Option<usize>,

        /// 確認せずに送信
        #[arg(short, long)]
        yes: bool,

        /// ドライラン（プレビューのみ、送信しない）
        #[arg(long)]
        dry_run: bool,

        /// 結果レポートの保存先（JSON）
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// 入力途中のテキストの続きを1回だけ取得
    Complete {
        /// 入力中のテキスト
        #[arg(required = true)]
        text: String,

        /// フィールド種別（例: deadline_title, case_description）
        #[arg(short, long, default_value = "general")]
        field_type: String,

        /// 周辺の文脈
        #[arg(short, long, default_value = "")]
        context: String,
    },

    /// 候補リストを取得して選択
    Suggest {
        #[arg(required = true)]
        text: String,

        #[arg(short, long, default_value = "general")]
        field_type: String,

        #[arg(short, long, default_value = "")]
        context: String,
    },

    /// 対話式の入力補完（ゴーストテキスト）
    Compose {
        #[arg(short, long, default_value = "general")]
        field_type: String,

        #[arg(short, long, default_value = "")]
        context: String,

        /// 複数行フィールド（Enterで確定しない）
        #[arg(long)]
        multiline: bool,
    },

    /// 一覧を取得
    List {
        /// 対象 (clients/cases/documents/invoices/time-entries/events/deadlines)
        #[arg(required = true)]
        resource: Resource,

        /// 検索語
        #[arg(short, long)]
        search: Option<String>,

        /// 1ページの件数
        #[arg(short, long, default_value = "25")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,

        /// 全ページを取得
        #[arg(long)]
        all: bool,
    },

    /// 1件を取得
    Get {
        #[arg(required = true)]
        resource: Resource,

        #[arg(required = true)]
        id: String,
    },

    /// 1件を削除
    Delete {
        #[arg(required = true)]
        resource: Resource,

        #[arg(required = true)]
        id: String,

        /// 確認せずに削除
        #[arg(short, long)]
        yes: bool,
    },

    /// ログイン中のユーザーを表示
    Whoami,

    /// 法令・判例リサーチ
    Research {
        #[arg(required = true)]
        query: String,

        /// 管轄（例: federal, CA）
        #[arg(long)]
        jurisdiction: Option<String>,

        /// 法分野
        #[arg(long)]
        area_of_law: Option<String>,

        /// 判例を含めない
        #[arg(long)]
        no_case_law: bool,

        /// 法令を含めない
        #[arg(long)]
        no_statutes: bool,
    },

    /// テキストを要約
    Summarize {
        /// 入力ファイル（省略時は text を使用）
        #[arg(short = 'i', long)]
        file: Option<PathBuf>,

        text: Option<String>,
    },

    /// 書面ドラフトを作成
    Draft {
        /// 書面種別（例: motion, letter, contract）
        #[arg(required = true)]
        doc_type: String,

        /// 作成内容の説明
        #[arg(required = true)]
        context: String,

        #[arg(long)]
        template_id: Option<String>,

        /// テンプレート変数（key=value、複数指定可）
        #[arg(long = "var", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
    },

    /// 書面を分析
    Analyze {
        /// 登録済み文書ID
        #[arg(long, conflicts_with = "file")]
        document_id: Option<String>,

        /// 分析するファイル
        #[arg(short = 'i', long)]
        file: Option<PathBuf>,
    },

    /// フォームの自動入力
    Autofill {
        /// フォーム種別
        #[arg(required = true)]
        form_type: String,

        /// 入力するフィールド（複数指定可）
        #[arg(long = "field", required = true)]
        fields: Vec<String>,

        /// 既存の値（key=value、複数指定可）
        #[arg(long = "set", value_parser = parse_key_value)]
        existing: Vec<(String, String)>,

        #[arg(short, long, default_value = "")]
        context: String,
    },
}

/// `key=value` を分解
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("key=value の形式で指定してください: {}", s)),
    }
}
