//! 対話式の入力補完（`compose` コマンド）
//!
//! 端末ではキー単位の入力が取れないため、1行を「フィールドの新しい値」として扱う。
//! `:tab` などのコマンド行でキー操作を再現する。

use crate::api::CompletionBackend;
use crate::error::Result;
use crate::suggest::{EngineSettings, GhostSnapshot, SuggestionEngine};
use lexdesk_common::{Key, KeyOutcome, Phase};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// 1行分の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeCommand {
    /// 新しい値（キー入力）
    Input(String),
    Key(Key),
    /// ゴーストのクリック
    Click,
    Focus,
    Blur,
    Show,
    Help,
    Quit,
}

impl ComposeCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim_end_matches(['\r', '\n']) {
            ":tab" => ComposeCommand::Key(Key::Tab),
            ":enter" => ComposeCommand::Key(Key::Enter),
            ":right" => ComposeCommand::Key(Key::ArrowRight),
            ":esc" => ComposeCommand::Key(Key::Escape),
            ":click" => ComposeCommand::Click,
            ":focus" => ComposeCommand::Focus,
            ":blur" => ComposeCommand::Blur,
            ":show" => ComposeCommand::Show,
            ":help" | ":h" => ComposeCommand::Help,
            ":q" | ":quit" => ComposeCommand::Quit,
            // `::` で始まる行はコロン始まりの値として扱う
            other => ComposeCommand::Input(other.strip_prefix(':').filter(|s| s.starts_with(':')).unwrap_or(other).to_string()),
        }
    }
}

/// 値とエンジンをまとめた編集中のフィールド
pub struct ComposeField<B: CompletionBackend + ?Sized + 'static> {
    engine: SuggestionEngine<B>,
    value: String,
}

impl<B: CompletionBackend + ?Sized + 'static> ComposeField<B> {
    pub fn new(backend: Arc<B>, field_type: &str, context: &str, settings: EngineSettings) -> Self {
        let mut engine = SuggestionEngine::new(backend, field_type, context, settings);
        engine.on_focus("");
        Self {
            engine,
            value: String::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn engine(&self) -> &SuggestionEngine<B> {
        &self.engine
    }

    /// 1コマンドを適用。終了なら `false`
    pub fn apply(&mut self, command: ComposeCommand) -> bool {
        match command {
            ComposeCommand::Input(value) => {
                self.value = value;
                self.engine.on_input(&self.value);
            }
            // 行単位の入力ではカーソルは常に末尾
            ComposeCommand::Key(key) => {
                if let KeyOutcome::Accepted(value) = self.engine.handle_key(key, &self.value, true) {
                    self.value = value;
                }
            }
            ComposeCommand::Click => {
                if let Some(value) = self.engine.accept(&self.value) {
                    self.value = value;
                }
            }
            ComposeCommand::Focus => self.engine.on_focus(&self.value),
            ComposeCommand::Blur => self.engine.on_blur(),
            ComposeCommand::Show | ComposeCommand::Help => {}
            ComposeCommand::Quit => return false,
        }
        true
    }

    /// 値とゴーストを1行で表示
    pub fn render(&self) -> String {
        match self.engine.visible_ghost(&self.value) {
            Some(ghost) => format!("{}[{}]", self.value, ghost),
            None => self.value.clone(),
        }
    }
}

fn print_help() {
    println!("行を入力するとフィールドの値になります。");
    println!("  :tab / :enter / :right  ゴーストを確定");
    println!("  :click                  ゴーストをクリック");
    println!("  :esc                    ゴーストを破棄");
    println!("  :focus / :blur          フォーカスの取得/喪失");
    println!("  :show                   現在の値を表示");
    println!("  :q                      終了");
}

/// 標準入力から1行ずつ読み込んで補完を試す
///
/// 終了時に最終的な値を返す。
pub async fn run_compose<B: CompletionBackend + ?Sized + 'static>(
    backend: Arc<B>,
    field_type: &str,
    context: &str,
    settings: EngineSettings,
) -> Result<String> {
    let mut field = ComposeField::new(backend, field_type, context, settings);
    print_help();

    let mut rx = field.engine().subscribe();
    let watcher = tokio::spawn(async move {
        let mut last_ghost = String::new();
        while rx.changed().await.is_ok() {
            let snapshot: GhostSnapshot = rx.borrow_and_update().clone();
            match snapshot.phase {
                Phase::Requesting => log::debug!("補完を取得中... #{}", snapshot.generation),
                Phase::Suggesting if snapshot.focused && snapshot.ghost_text != last_ghost => {
                    println!("  ↳ {}", snapshot.ghost_text);
                    last_ghost = snapshot.ghost_text;
                }
                _ => {
                    if snapshot.ghost_text.is_empty() {
                        last_ghost.clear();
                    }
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = ComposeCommand::parse(&line);
        let show = matches!(command, ComposeCommand::Key(_) | ComposeCommand::Click | ComposeCommand::Show);
        if command == ComposeCommand::Help {
            print_help();
        }
        if !field.apply(command) {
            break;
        }
        if show {
            println!("> {}", field.render());
        }
    }

    let value = field.value().to_string();
    drop(field);
    watcher.abort();
    Ok(value)
}
