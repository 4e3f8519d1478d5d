//! インライン補完（ゴーストテキスト）の状態管理
//!
//! 入力欄1つにつき1つの `SuggestionState` を持つ。
//! タイマーや通信は持たず、呼び出し側（非同期エンジン）が
//! 世代番号を添えてイベントを渡す。
//!
//! 状態遷移:
//! - Idle: ゴーストなし、リクエストなし
//! - Debouncing: 入力後、タイマー待ち（再入力で世代が進み、古いタイマーは無効）
//! - Requesting: タイマー発火、補完リクエスト送信中
//! - Suggesting: ゴーストテキスト表示中
//!
//! 確定・破棄はいずれも Idle に戻る。入力欄の値そのものは
//! `accept` の戻り値としてのみ変更される。

use crate::types::SuggestionRequest;

/// リクエストを出す最小文字数
pub const MIN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Debouncing,
    Requesting,
    Suggesting,
}

/// 入力欄の種類（Enterで確定できるのは1行入力のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    SingleLine,
    MultiLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    ArrowRight,
    Escape,
    Other,
}

/// キー操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// 確定後の新しい値
    Accepted(String),
    Dismissed,
    /// ゴーストに関係しないキー（通常の入力処理に任せる）
    Ignored,
}

/// 描画用のビュー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionView<'a> {
    /// 確定済みの値（唯一の正）
    pub value: &'a str,
    /// 表示中のゴースト。非表示なら `None`
    pub ghost: Option<&'a str>,
    pub loading: bool,
}

#[derive(Debug, Clone)]
pub struct SuggestionState {
    field_type: String,
    context: String,
    mode: InputMode,
    min_chars: usize,
    ghost_text: String,
    loading: bool,
    generation: u64,
    phase: Phase,
    focused: bool,
    blur_token: u64,
}

impl SuggestionState {
    pub fn new(field_type: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            context: context.into(),
            mode: InputMode::default(),
            min_chars: MIN_CHARS,
            ghost_text: String::new(),
            loading: false,
            generation: 0,
            phase: Phase::Idle,
            focused: false,
            blur_token: 0,
        }
    }

    pub fn with_mode(mut self, mode: InputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// キー入力で値が変わった
    ///
    /// ゴーストを消して世代を進める。しきい値以上ならデバウンス対象の
    /// 世代番号を返し、未満なら何もリクエストしない（Idle）。
    pub fn on_input(&mut self, value: &str) -> Option<u64> {
        self.ghost_text.clear();
        self.loading = false;
        self.generation += 1;

        if self.meets_threshold(value) {
            self.phase = Phase::Debouncing;
            Some(self.generation)
        } else {
            self.phase = Phase::Idle;
            None
        }
    }

    /// デバウンスタイマーが発火した
    ///
    /// 世代が最新で、値がしきい値以上のときのみリクエストを返す。
    pub fn begin_request(&mut self, generation: u64, value: &str) -> Option<SuggestionRequest> {
        if generation != self.generation {
            return None;
        }
        if !self.meets_threshold(value) {
            self.ghost_text.clear();
            self.loading = false;
            self.phase = Phase::Idle;
            return None;
        }

        self.loading = true;
        self.phase = Phase::Requesting;
        Some(SuggestionRequest::new(value, self.field_type.clone(), self.context.clone()))
    }

    /// 補完レスポンスを反映
    ///
    /// `completion` が `None` なら失敗（タイムアウト含む）で、ゴーストなしに戻る。
    /// 古い世代のレスポンスは何もしない。反映した場合 `true`。
    pub fn apply_response(&mut self, generation: u64, typed: &str, completion: Option<&str>) -> bool {
        if generation != self.generation || self.phase != Phase::Requesting {
            return false;
        }
        self.loading = false;

        let ghost = completion.map(|c| strip_echo(typed, c)).unwrap_or("");
        if ghost.trim().is_empty() {
            self.ghost_text.clear();
            self.phase = Phase::Idle;
        } else {
            self.ghost_text = ghost.to_string();
            self.phase = Phase::Suggesting;
        }
        true
    }

    /// ゴーストを確定し、新しい値を返す
    ///
    /// 値の更新とゴーストの消去を同時に行う。ゴーストがなければ `None`。
    pub fn accept(&mut self, value: &str) -> Option<String> {
        if self.ghost_text.is_empty() {
            return None;
        }
        let accepted = format!("{}{}", value, self.ghost_text);
        self.reset();
        Some(accepted)
    }

    /// ゴーストを破棄して Idle に戻す（保留中のリクエストも無効）
    pub fn dismiss(&mut self) {
        self.reset();
    }

    pub fn handle_key(&mut self, key: Key, value: &str, cursor_at_end: bool) -> KeyOutcome {
        if self.ghost_text.is_empty() {
            return KeyOutcome::Ignored;
        }

        let accept = match key {
            Key::Tab => true,
            Key::Enter => self.mode == InputMode::SingleLine,
            Key::ArrowRight => cursor_at_end,
            Key::Escape => {
                self.dismiss();
                return KeyOutcome::Dismissed;
            }
            Key::Other => false,
        };

        match accept.then(|| self.accept(value)).flatten() {
            Some(new_value) => KeyOutcome::Accepted(new_value),
            None => KeyOutcome::Ignored,
        }
    }

    /// フォーカス取得
    ///
    /// 値があってゴーストもリクエストもない場合は再取得用の世代を返す。
    pub fn on_focus(&mut self, value: &str) -> Option<u64> {
        self.focused = true;
        self.blur_token += 1;

        if self.meets_threshold(value) && self.ghost_text.is_empty() && !self.loading {
            self.generation += 1;
            self.phase = Phase::Debouncing;
            Some(self.generation)
        } else {
            None
        }
    }

    /// フォーカス喪失。猶予時間後に `blur_elapsed` へ渡すトークンを返す
    pub fn on_blur(&mut self) -> u64 {
        self.focused = false;
        self.blur_token += 1;
        self.blur_token
    }

    /// 猶予時間経過。その間に再フォーカスされていなければ破棄する
    pub fn blur_elapsed(&mut self, token: u64) -> bool {
        if token != self.blur_token || self.focused {
            return false;
        }
        self.reset();
        true
    }

    pub fn view<'a>(&'a self, value: &'a str) -> SuggestionView<'a> {
        let visible = self.focused && !self.ghost_text.is_empty() && !value.is_empty();
        SuggestionView {
            value,
            ghost: visible.then_some(self.ghost_text.as_str()),
            loading: self.loading,
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn ghost_text(&self) -> &str {
        &self.ghost_text
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn field_type(&self) -> &str {
        &self.field_type
    }

    fn meets_threshold(&self, value: &str) -> bool {
        value.chars().count() >= self.min_chars
    }

    fn reset(&mut self) {
        self.ghost_text.clear();
        self.loading = false;
        self.generation += 1;
        self.phase = Phase::Idle;
    }
}

/// 補完が入力済みの文字列を繰り返していたら取り除く（大文字小文字は無視）
pub fn strip_echo<'a>(typed: &str, completion: &'a str) -> &'a str {
    if typed.is_empty() {
        return completion;
    }

    let mut rest = completion.char_indices();
    for t in typed.chars() {
        match rest.next() {
            Some((_, c)) if c.to_lowercase().eq(t.to_lowercase()) => {}
            _ => return completion,
        }
    }
    match rest.next() {
        Some((idx, _)) => &completion[idx..],
        None => "",
    }
}
