// Host-side tests for the counter client and the file-backed counter store.

use pollster::block_on;
use spiral_core::*;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Scripted transport: pops one reply per call, counts calls per verb.
#[derive(Default)]
struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpReply>>>,
    increments: Cell<u32>,
    reads: Cell<u32>,
}

impl ScriptedTransport {
    fn with(replies: Vec<Result<HttpReply>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            ..Self::default()
        }
    }

    fn next(&self) -> Result<HttpReply> {
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(SpiralError::Transport("script exhausted".into())))
    }
}

impl CounterTransport for ScriptedTransport {
    async fn increment(&self) -> Result<HttpReply> {
        self.increments.set(self.increments.get() + 1);
        self.next()
    }

    async fn read(&self) -> Result<HttpReply> {
        self.reads.set(self.reads.get() + 1);
        self.next()
    }
}

fn client(replies: Vec<Result<HttpReply>>) -> CounterClient<ScriptedTransport> {
    CounterClient::new(ScriptedTransport::with(replies), COUNTER_BASE_OFFSET)
}

#[test]
fn stone_count_field_is_used_directly() {
    let c = client(vec![Ok(HttpReply::ok(r#"{"pressCount":3,"stoneCount":75}"#))]);
    assert_eq!(block_on(c.fetch()), CounterOutcome::Fetched(75));
    assert_eq!(c.transport().increments.get(), 1);
}

#[test]
fn press_count_adds_base_offset() {
    let c = client(vec![Ok(HttpReply::ok(r#"{"pressCount":7}"#))]);
    assert_eq!(block_on(c.fetch()), CounterOutcome::Fetched(67));
}

#[test]
fn raw_numeric_body_is_accepted() {
    let c = client(vec![Ok(HttpReply::ok(" 73\n"))]);
    assert_eq!(block_on(c.fetch()), CounterOutcome::Fetched(73));
}

#[test]
fn parse_handles_the_reply_shapes() {
    assert_eq!(parse_counter_body(r#"{"stoneCount":"80"}"#, 60), Ok(Some(80)));
    assert_eq!(parse_counter_body(r#"{"pressCount":0}"#, 60), Ok(Some(60)));
    assert_eq!(parse_counter_body(r#"{"stoneCount":null}"#, 60), Ok(None));
    assert_eq!(parse_counter_body("{}", 60), Ok(None));
    assert!(parse_counter_body("<html>oops</html>", 60).is_err());
}

#[test]
fn failures_degrade_to_failed_outcome() {
    let c = client(vec![
        Ok(HttpReply {
            status: 500,
            body: r#"{"stoneCount":99}"#.into(),
        }),
        Ok(HttpReply::ok("not json")),
        Err(SpiralError::Transport("offline".into())),
        Ok(HttpReply::ok("{}")),
    ]);
    for _ in 0..4 {
        assert_eq!(block_on(c.fetch()), CounterOutcome::Failed);
    }
}

#[test]
fn failed_round_trip_resolves_with_default() {
    let c = client(vec![Err(SpiralError::Transport("offline".into()))]);
    let mut state = SessionCounterState::new(DEFAULT_STONE_COUNT as i64);
    state.begin();
    assert!(!state.is_resolved());
    let stones = block_on(c.resolve_stone_count(&mut state));
    assert_eq!(stones, 60);
    assert_eq!(state.remote_count(), 60);
    assert!(state.is_resolved());
}

#[test]
fn failure_keeps_previous_remote_value() {
    let c = client(vec![
        Ok(HttpReply::ok(r#"{"stoneCount":42}"#)),
        Err(SpiralError::Transport("offline".into())),
    ]);
    let mut state = SessionCounterState::new(60);
    assert_eq!(block_on(c.resolve_stone_count(&mut state)), 42);
    state.begin();
    assert_eq!(block_on(c.resolve_stone_count(&mut state)), 42);
    assert!(state.is_resolved());
}

#[test]
fn remote_values_are_clamped_for_the_builder() {
    let c = client(vec![
        Ok(HttpReply::ok(r#"{"stoneCount":10000}"#)),
        Ok(HttpReply::ok(r#"{"stoneCount":-5}"#)),
    ]);
    let mut state = SessionCounterState::new(60);
    assert_eq!(block_on(c.resolve_stone_count(&mut state)), 500);
    assert_eq!(state.remote_count(), 10_000);
    assert_eq!(block_on(c.resolve_stone_count(&mut state)), 1);
}

#[test]
fn huge_press_count_saturates_to_the_stone_cap() {
    assert_eq!(
        parse_counter_body(r#"{"pressCount":1e19}"#, 60),
        Ok(Some(i64::MAX))
    );
    let c = client(vec![Ok(HttpReply::ok(r#"{"pressCount":1e19}"#))]);
    let mut state = SessionCounterState::new(60);
    assert_eq!(block_on(c.resolve_stone_count(&mut state)), 500);
    assert!(state.is_resolved());
}

#[test]
fn peek_reads_without_incrementing() {
    let c = client(vec![
        Ok(HttpReply::ok(r#"{"stoneCount":12}"#)),
        Ok(HttpReply::ok(r#"{"other":1}"#)),
    ]);
    assert_eq!(block_on(c.peek()), Ok(12));
    assert_eq!(block_on(c.peek()), Ok(0));
    assert_eq!(c.transport().reads.get(), 2);
    assert_eq!(c.transport().increments.get(), 0);
}

#[test]
fn peek_surfaces_transport_errors() {
    let c = client(vec![Ok(HttpReply {
        status: 404,
        body: String::new(),
    })]);
    assert!(matches!(block_on(c.peek()), Err(SpiralError::Transport(_))));
}

#[test]
fn missing_endpoint_is_a_config_error() {
    let settings = CounterSettings {
        endpoint: None,
        ..CounterSettings::default()
    };
    assert_eq!(
        settings.endpoint(),
        Err(SpiralError::ConfigMissing("counter.endpoint"))
    );
    let blank = CounterSettings {
        endpoint: Some("  ".into()),
        ..CounterSettings::default()
    };
    assert!(blank.endpoint().is_err());
    assert_eq!(CounterSettings::default().endpoint(), Ok("/api/stone-count"));
}

// ---------------- File-backed store ----------------

#[test]
fn missing_file_reads_as_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCounterStore::new(dir.path().join("counter.json"));
    assert_eq!(store.load(), PERSISTED_COUNTER_DEFAULT);
}

#[test]
fn corrupt_file_reads_as_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = FileCounterStore::new(&path);
    assert_eq!(store.load(), 60);
}

#[test]
fn bump_persists_incremented_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    let store = FileCounterStore::new(&path);
    assert_eq!(store.bump(), Ok(61));
    assert_eq!(store.bump(), Ok(62));

    let raw = std::fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["stoneCount"], 62);
    assert_eq!(FileCounterStore::new(&path).load(), 62);
}

#[test]
fn client_over_file_store_increments_once_per_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, r#"{"stoneCount":99}"#).unwrap();
    let c = CounterClient::new(FileCounterStore::new(&path), COUNTER_BASE_OFFSET);

    assert_eq!(block_on(c.fetch()), CounterOutcome::Fetched(100));
    assert_eq!(block_on(c.peek()), Ok(100));
    assert_eq!(c.transport().load(), 100);
}

#[test]
fn bump_saturates_at_the_largest_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, format!(r#"{{"stoneCount":{}}}"#, i64::MAX)).unwrap();
    assert_eq!(FileCounterStore::new(&path).bump(), Ok(i64::MAX));
}

#[test]
fn concurrent_bumps_each_count_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counter.json");
    let store = std::sync::Arc::new(FileCounterStore::new(&path));
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || store.bump().unwrap())
        })
        .collect();
    let mut seen: Vec<i64> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    seen.sort_unstable();
    assert_eq!(seen, (61..=68).collect::<Vec<_>>());
    assert_eq!(store.load(), 68);
}
