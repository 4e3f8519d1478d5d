//! 非同期インライン補完エンジン
//!
//! `SuggestionState`（状態遷移）にタイマーと通信を接続する。
//! - 入力ごとに保留中のタスクを中断し、デバウンスを張り直す
//! - レスポンスは世代番号が最新のときだけ反映
//! - 失敗・タイムアウトは「ゴーストなし」に落とす（呼び出し側へは返さない）
//! - エンジンの破棄で保留中のタスクもすべて中断

use super::EngineSettings;
use crate::api::CompletionBackend;
use lexdesk_common::{KeyOutcome, Key, Phase, SuggestionState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 描画側に渡すスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostSnapshot {
    pub ghost_text: String,
    pub loading: bool,
    pub phase: Phase,
    pub focused: bool,
    pub generation: u64,
}

impl From<&SuggestionState> for GhostSnapshot {
    fn from(state: &SuggestionState) -> Self {
        Self {
            ghost_text: state.ghost_text().to_string(),
            loading: state.loading(),
            phase: state.phase(),
            focused: state.is_focused(),
            generation: state.generation(),
        }
    }
}

pub struct SuggestionEngine<B: CompletionBackend + ?Sized + 'static> {
    backend: Arc<B>,
    state: Arc<Mutex<SuggestionState>>,
    settings: EngineSettings,
    tx: Arc<watch::Sender<GhostSnapshot>>,
    pending: Option<JoinHandle<()>>,
    blur_timer: Option<JoinHandle<()>>,
}

impl<B: CompletionBackend + ?Sized + 'static> SuggestionEngine<B> {
    pub fn new(backend: Arc<B>, field_type: &str, context: &str, settings: EngineSettings) -> Self {
        let state = SuggestionState::new(field_type, context)
            .with_mode(settings.mode)
            .with_min_chars(settings.min_chars);
        let (tx, _) = watch::channel(GhostSnapshot::from(&state));

        Self {
            backend,
            state: Arc::new(Mutex::new(state)),
            settings,
            tx: Arc::new(tx),
            pending: None,
            blur_timer: None,
        }
    }

    /// 値が変わった（キー入力）
    ///
    /// 通信を待たずに戻る。
    pub fn on_input(&mut self, value: &str) {
        self.cancel_pending();
        let generation = {
            let mut state = self.state.lock();
            let generation = state.on_input(value);
            publish(&self.tx, &state);
            generation
        };

        if let Some(generation) = generation {
            self.arm(generation, value, self.settings.debounce);
        }
    }

    /// Tab / Enter / → / Esc
    pub fn handle_key(&mut self, key: Key, value: &str, cursor_at_end: bool) -> KeyOutcome {
        let outcome = {
            let mut state = self.state.lock();
            let outcome = state.handle_key(key, value, cursor_at_end);
            if outcome != KeyOutcome::Ignored {
                publish(&self.tx, &state);
            }
            outcome
        };

        if outcome != KeyOutcome::Ignored {
            self.cancel_pending();
        }
        outcome
    }

    /// ゴーストを確定して新しい値を返す（ゴーストのクリックも同じ）
    pub fn accept(&mut self, value: &str) -> Option<String> {
        let accepted = {
            let mut state = self.state.lock();
            let accepted = state.accept(value);
            if accepted.is_some() {
                publish(&self.tx, &state);
            }
            accepted
        };

        if accepted.is_some() {
            self.cancel_pending();
        }
        accepted
    }

    pub fn dismiss(&mut self) {
        self.cancel_pending();
        let mut state = self.state.lock();
        state.dismiss();
        publish(&self.tx, &state);
    }

    pub fn on_focus(&mut self, value: &str) {
        if let Some(timer) = self.blur_timer.take() {
            timer.abort();
        }

        let generation = {
            let mut state = self.state.lock();
            let generation = state.on_focus(value);
            publish(&self.tx, &state);
            generation
        };

        if let Some(generation) = generation {
            self.cancel_pending();
            self.arm(generation, value, self.settings.refocus_debounce);
        }
    }

    /// フォーカス喪失
    ///
    /// 猶予時間（ゴーストのクリック確定を待つ）の後に破棄する。
    pub fn on_blur(&mut self) {
        let token = {
            let mut state = self.state.lock();
            let token = state.on_blur();
            publish(&self.tx, &state);
            token
        };

        let state = Arc::clone(&self.state);
        let tx = Arc::clone(&self.tx);
        let grace = self.settings.blur_grace;

        if let Some(timer) = self.blur_timer.take() {
            timer.abort();
        }
        self.blur_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let mut state = state.lock();
            if state.blur_elapsed(token) {
                publish(&tx, &state);
            }
        }));
    }

    pub fn snapshot(&self) -> GhostSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GhostSnapshot> {
        self.tx.subscribe()
    }

    /// 表示すべきゴースト（フォーカス中かつ値が空でない場合のみ）
    pub fn visible_ghost(&self, value: &str) -> Option<String> {
        let state = self.state.lock();
        let view = state.view(value);
        view.ghost.map(str::to_string)
    }

    fn arm(&mut self, generation: u64, value: &str, delay: Duration) {
        let state = Arc::clone(&self.state);
        let tx = Arc::clone(&self.tx);
        let backend = Arc::clone(&self.backend);
        let timeout = self.settings.request_timeout;
        let value = value.to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let request = {
                let mut state = state.lock();
                let request = state.begin_request(generation, &value);
                publish(&tx, &state);
                request
            };
            let Some(request) = request else {
                return;
            };

            log::debug!("補完リクエスト #{} ({}): {:?}", generation, request.field_type, request.text);
            let completion = match tokio::time::timeout(timeout, backend.complete(&request)).await {
                Ok(Ok(text)) => Some(text),
                Ok(Err(e)) => {
                    log::debug!("補完失敗 #{}: {}", generation, e);
                    None
                }
                Err(_) => {
                    log::debug!("補完タイムアウト #{} ({}秒)", generation, timeout.as_secs());
                    None
                }
            };

            let mut state = state.lock();
            if state.apply_response(generation, &request.text, completion.as_deref()) {
                publish(&tx, &state);
            } else {
                log::debug!("古い補完レスポンスを破棄 #{}", generation);
            }
        }));
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl<B: CompletionBackend + ?Sized + 'static> Drop for SuggestionEngine<B> {
    fn drop(&mut self) {
        self.cancel_pending();
        if let Some(timer) = self.blur_timer.take() {
            timer.abort();
        }
    }
}

fn publish(tx: &watch::Sender<GhostSnapshot>, state: &SuggestionState) {
    tx.send_replace(GhostSnapshot::from(state));
}
