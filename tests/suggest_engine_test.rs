//! インライン補完エンジンの統合テスト
//!
//! 時間を止めた tokio ランタイムでデバウンスとタイムアウトを検証する。

use async_trait::async_trait;
use lexdesk::api::CompletionBackend;
use lexdesk::error::{LexdeskError, Result};
use lexdesk::suggest::{fetch_suggestions, EngineSettings, SuggestionEngine};
use lexdesk_common::{InputMode, Key, KeyOutcome, Phase, SuggestionRequest};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

enum Reply {
    Text(&'static str),
    Fail,
    Hang,
}

/// 応答を順番に返すフェイク（尽きたら空文字）
#[derive(Default)]
struct FakeBackend {
    script: Mutex<VecDeque<(u64, Reply)>>,
    calls: Mutex<Vec<SuggestionRequest>>,
    suggestions: Vec<String>,
}

impl FakeBackend {
    fn scripted(replies: Vec<(u64, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    fn call_texts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|r| r.text.clone()).collect()
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn complete(&self, request: &SuggestionRequest) -> Result<String> {
        self.calls.lock().push(request.clone());
        let next = self.script.lock().pop_front();

        match next {
            Some((delay, reply)) => {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                match reply {
                    Reply::Text(text) => Ok(text.to_string()),
                    Reply::Fail => Err(LexdeskError::Api {
                        status: 500,
                        detail: "AI service unavailable".into(),
                    }),
                    Reply::Hang => std::future::pending().await,
                }
            }
            None => Ok(String::new()),
        }
    }

    async fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>> {
        self.calls.lock().push(request.clone());
        Ok(self.suggestions.clone())
    }
}

fn engine(backend: &Arc<FakeBackend>, field_type: &str) -> SuggestionEngine<FakeBackend> {
    let mut engine = SuggestionEngine::new(Arc::clone(backend), field_type, "", EngineSettings::default());
    engine.on_focus("");
    engine
}

async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_debounce_sends_only_last_value() {
    let backend = FakeBackend::scripted(vec![(50, Reply::Text("iscovery"))]);
    let mut engine = engine(&backend, "general");

    for value in ["Mo", "Mot", "Moti", "Motio", "Motion"] {
        engine.on_input(value);
        wait_ms(300).await;
    }
    assert!(backend.calls.lock().is_empty(), "デバウンス中はリクエストしない");

    wait_ms(600).await;
    assert_eq!(backend.call_texts(), vec!["Motion".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_ghost_shown_after_response() {
    let backend = FakeBackend::scripted(vec![(100, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    assert_eq!(engine.snapshot().phase, Phase::Debouncing);

    wait_ms(850).await;
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Requesting);
    assert!(snapshot.loading);

    wait_ms(100).await;
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Suggesting);
    assert!(!snapshot.loading);
    assert_eq!(engine.visible_ghost("Motion to ").as_deref(), Some("compel discovery"));

    let calls = backend.calls.lock();
    assert_eq!(calls[0].field_type, "deadline_title");
    assert_eq!(calls[0].text, "Motion to ");
}

#[tokio::test(start_paused = true)]
async fn test_echoed_prefix_is_stripped() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("Motion to compel"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;
    assert_eq!(engine.snapshot().ghost_text, "compel");
}

#[tokio::test(start_paused = true)]
async fn test_keystroke_during_request_discards_stale_response() {
    let backend = FakeBackend::scripted(vec![
        (500, Reply::Text("compel discovery")),
        (100, Reply::Text("ompel production")),
    ]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;
    assert_eq!(engine.snapshot().phase, Phase::Requesting);

    // 応答前にもう1文字
    engine.on_input("Motion to c");
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.ghost_text, "");
    assert!(!snapshot.loading);

    // 1件目の応答時刻を過ぎても表示されない
    wait_ms(500).await;
    assert_eq!(engine.snapshot().ghost_text, "");

    wait_ms(500).await;
    assert_eq!(engine.visible_ghost("Motion to c").as_deref(), Some("ompel production"));
    assert_eq!(backend.call_texts(), vec!["Motion to ".to_string(), "Motion to c".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_below_threshold_never_requests() {
    let backend = FakeBackend::scripted(vec![]);
    let mut engine = engine(&backend, "general");

    engine.on_input("M");
    wait_ms(2000).await;

    assert!(backend.calls.lock().is_empty());
    assert_eq!(engine.snapshot().phase, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_shrinking_below_threshold_clears_ghost() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("rbitration"))]);
    let mut engine = engine(&backend, "general");

    engine.on_input("Ar");
    wait_ms(900).await;
    assert_eq!(engine.snapshot().ghost_text, "rbitration");

    engine.on_input("A");
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.ghost_text, "");
    assert_eq!(snapshot.phase, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failure_degrades_to_no_ghost() {
    let backend = FakeBackend::scripted(vec![(100, Reply::Fail)]);
    let mut engine = engine(&backend, "general");

    engine.on_input("Statute of");
    wait_ms(1000).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.ghost_text, "");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_degrades_to_no_ghost() {
    let backend = FakeBackend::scripted(vec![(0, Reply::Hang)]);
    let mut engine = engine(&backend, "general");

    engine.on_input("Statute of");
    wait_ms(10_000).await;
    assert!(engine.snapshot().loading);

    wait_ms(25_000).await;
    let snapshot = engine.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.phase, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_completion_shows_nothing() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("   \n"))]);
    let mut engine = engine(&backend, "general");

    engine.on_input("Statute of");
    wait_ms(900).await;
    assert_eq!(engine.snapshot().phase, Phase::Idle);
    assert_eq!(engine.visible_ghost("Statute of"), None);
}

#[tokio::test(start_paused = true)]
async fn test_tab_accepts_atomically() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;

    let outcome = engine.handle_key(Key::Tab, "Motion to ", true);
    assert_eq!(outcome, KeyOutcome::Accepted("Motion to compel discovery".into()));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.ghost_text, "");
    assert_eq!(snapshot.phase, Phase::Idle);

    // 2回目は何もしない
    assert_eq!(engine.handle_key(Key::Tab, "Motion to compel discovery", true), KeyOutcome::Ignored);
}

#[tokio::test(start_paused = true)]
async fn test_escape_dismisses() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;

    assert_eq!(engine.handle_key(Key::Escape, "Motion to ", true), KeyOutcome::Dismissed);
    assert_eq!(engine.visible_ghost("Motion to "), None);
    assert_eq!(engine.accept("Motion to "), None);
}

#[tokio::test(start_paused = true)]
async fn test_enter_does_not_accept_in_multiline() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text(" with prejudice."))]);
    let settings = EngineSettings::default().with_mode(InputMode::MultiLine);
    let mut engine = SuggestionEngine::new(Arc::clone(&backend), "case_description", "", settings);
    engine.on_focus("");

    engine.on_input("Dismissed");
    wait_ms(900).await;

    assert_eq!(engine.handle_key(Key::Enter, "Dismissed", true), KeyOutcome::Ignored);
    assert_eq!(engine.handle_key(Key::ArrowRight, "Dismissed", false), KeyOutcome::Ignored);
    assert_eq!(
        engine.handle_key(Key::ArrowRight, "Dismissed", true),
        KeyOutcome::Accepted("Dismissed with prejudice.".into())
    );
}

#[tokio::test(start_paused = true)]
async fn test_click_during_blur_grace_accepts() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;

    // ゴーストのクリックでフォーカスが外れる
    engine.on_blur();
    wait_ms(50).await;
    assert_eq!(engine.accept("Motion to ").as_deref(), Some("Motion to compel discovery"));
}

#[tokio::test(start_paused = true)]
async fn test_blur_discards_after_grace() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;

    engine.on_blur();
    assert_eq!(engine.visible_ghost("Motion to "), None);
    wait_ms(300).await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.ghost_text, "");
    assert!(!snapshot.focused);
    assert_eq!(engine.accept("Motion to "), None);
}

#[tokio::test(start_paused = true)]
async fn test_blur_invalidates_pending_request() {
    let backend = FakeBackend::scripted(vec![(500, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(850).await;
    engine.on_blur();
    wait_ms(1000).await;

    assert_eq!(engine.snapshot().ghost_text, "");
}

#[tokio::test(start_paused = true)]
async fn test_refocus_refetches() {
    let backend = FakeBackend::scripted(vec![
        (10, Reply::Text("compel discovery")),
        (10, Reply::Text("compel production")),
    ]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    wait_ms(900).await;
    engine.on_blur();
    wait_ms(300).await;

    engine.on_focus("Motion to ");
    wait_ms(300).await;
    assert_eq!(backend.calls.lock().len(), 1, "再取得は短いデバウンスの後");

    wait_ms(200).await;
    assert_eq!(engine.visible_ghost("Motion to ").as_deref(), Some("compel production"));
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_request() {
    let backend = FakeBackend::scripted(vec![(10, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");

    engine.on_input("Motion to ");
    drop(engine);
    wait_ms(2000).await;

    assert!(backend.calls.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_observes_ghost() {
    let backend = FakeBackend::scripted(vec![(100, Reply::Text("compel discovery"))]);
    let mut engine = engine(&backend, "deadline_title");
    let mut rx = engine.subscribe();

    engine.on_input("Motion to ");
    let mut phases = Vec::new();
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        phases.push(snapshot.phase);
        if snapshot.phase == Phase::Suggesting {
            assert_eq!(snapshot.ghost_text, "compel discovery");
            break;
        }
    }

    assert!(phases.contains(&Phase::Requesting));
    assert_eq!(phases.last(), Some(&Phase::Suggesting));
}

#[tokio::test]
async fn test_fetch_suggestions_filters_and_caps() {
    let backend = FakeBackend {
        suggestions: ["Breach of contract", "", "Breach of warranty", "  ", "Breach of duty", "a", "b", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ..Default::default()
    };

    let request = SuggestionRequest::new("Breach", "case_title", "");
    let items = fetch_suggestions(&backend, &request, 2, Duration::from_secs(5)).await.unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0], "Breach of contract");
    assert_eq!(items[1], "Breach of warranty");
    assert!(items.iter().all(|s| !s.trim().is_empty()));

    let short = SuggestionRequest::new("B", "case_title", "");
    assert!(fetch_suggestions(&backend, &short, 2, Duration::from_secs(5)).await.unwrap().is_empty());
    assert_eq!(backend.calls.lock().len(), 1);
}
