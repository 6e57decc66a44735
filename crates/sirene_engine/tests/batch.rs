use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use sirene_core::{ResultRow, Siren};
use sirene_engine::{
    fetch_batch, CancelFlag, FetchError, ProgressEvent, ProgressSink, SirenFetch, SiretSource,
};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl TestSink {
    fn new() -> Self {
        Self::default()
    }

    fn take(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Replays canned outcomes and records the order identifiers arrive in.
struct ScriptedSource {
    outcomes: HashMap<String, Result<SirenFetch, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(outcomes: HashMap<String, Result<SirenFetch, FetchError>>) -> Self {
        Self {
            outcomes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SiretSource for ScriptedSource {
    async fn fetch_establishments(
        &self,
        siren: &str,
        _cancel: &CancelFlag,
        _sink: &dyn ProgressSink,
    ) -> Result<SirenFetch, FetchError> {
        self.calls.lock().unwrap().push(siren.to_string());
        self.outcomes
            .get(siren)
            .cloned()
            .unwrap_or_else(|| Ok(SirenFetch::default()))
    }
}

fn row(siren: &str, siret: &str, ville: &str) -> ResultRow {
    ResultRow {
        siret: siret.to_string(),
        siren: siren.to_string(),
        etat_administratif: "Actif".to_string(),
        ville: ville.to_string(),
        ..ResultRow::default()
    }
}

fn fetch_of(rows: Vec<ResultRow>) -> Result<SirenFetch, FetchError> {
    Ok(SirenFetch {
        rows,
        raw: Vec::new(),
    })
}

fn sirens(list: &[&str]) -> Vec<Siren> {
    list.iter().map(|s| Siren::parse(s).unwrap()).collect()
}

#[tokio::test]
async fn batch_rows_are_aggregated_deduplicated_and_sorted() {
    let outcomes = HashMap::from([
        (
            "552100554".to_string(),
            fetch_of(vec![row("552100554", "55210055400013", "PARIS")]),
        ),
        (
            "481986446".to_string(),
            fetch_of(vec![
                row("481986446", "48198644600023", "LYON"),
                row("481986446", "48198644600015", "PARIS"),
                // Also returned by the first identifier; this later
                // occurrence must win.
                row("552100554", "55210055400013", "LILLE"),
            ]),
        ),
    ]);
    let source = ScriptedSource::new(outcomes);

    let rows = fetch_batch(
        &source,
        &sirens(&["552100554", "481986446"]),
        &CancelFlag::new(),
        &TestSink::new(),
    )
    .await
    .expect("batch ok");

    let keys: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.siren.as_str(), r.siret.as_str()))
        .collect();
    assert_eq!(
        keys,
        [
            ("481986446", "48198644600015"),
            ("481986446", "48198644600023"),
            ("552100554", "55210055400013"),
        ]
    );
    assert_eq!(rows[2].ville, "LILLE");
}

#[tokio::test]
async fn first_failure_aborts_the_batch() {
    let outcomes = HashMap::from([
        (
            "111111111".to_string(),
            fetch_of(vec![row("111111111", "11111111100015", "")]),
        ),
        ("222222222".to_string(), Err(FetchError::Unauthorized)),
        (
            "333333333".to_string(),
            fetch_of(vec![row("333333333", "33333333300015", "")]),
        ),
    ]);
    let source = ScriptedSource::new(outcomes);

    let err = fetch_batch(
        &source,
        &sirens(&["111111111", "222222222", "333333333"]),
        &CancelFlag::new(),
        &TestSink::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err, FetchError::Unauthorized);
    assert_eq!(source.calls(), ["111111111", "222222222"]);
}

/// Simulates a stop request arriving while an identifier is in flight.
struct StoppingSource {
    calls: Mutex<usize>,
}

#[async_trait::async_trait]
impl SiretSource for StoppingSource {
    async fn fetch_establishments(
        &self,
        siren: &str,
        cancel: &CancelFlag,
        _sink: &dyn ProgressSink,
    ) -> Result<SirenFetch, FetchError> {
        *self.calls.lock().unwrap() += 1;
        cancel.request_stop();
        Ok(SirenFetch {
            rows: vec![row(siren, &format!("{siren}00015"), "")],
            raw: Vec::new(),
        })
    }
}

#[tokio::test]
async fn stop_request_halts_between_identifiers() {
    let source = StoppingSource {
        calls: Mutex::new(0),
    };
    let cancel = CancelFlag::new();

    let err = fetch_batch(
        &source,
        &sirens(&["111111111", "222222222"]),
        &cancel,
        &TestSink::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err, FetchError::Cancelled);
    assert_eq!(*source.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn progress_reports_each_identifier_in_order() {
    let outcomes = HashMap::from([
        (
            "111111111".to_string(),
            fetch_of(vec![row("111111111", "11111111100015", "")]),
        ),
        ("222222222".to_string(), fetch_of(Vec::new())),
    ]);
    let source = ScriptedSource::new(outcomes);
    let sink = TestSink::new();

    fetch_batch(
        &source,
        &sirens(&["111111111", "222222222"]),
        &CancelFlag::new(),
        &sink,
    )
    .await
    .expect("batch ok");

    assert_eq!(
        sink.take(),
        vec![
            ProgressEvent::SirenStarted {
                index: 0,
                total: 2,
                siren: "111111111".to_string(),
            },
            ProgressEvent::SirenCompleted {
                index: 0,
                total: 2,
                siren: "111111111".to_string(),
                rows: 1,
            },
            ProgressEvent::SirenStarted {
                index: 1,
                total: 2,
                siren: "222222222".to_string(),
            },
            ProgressEvent::SirenCompleted {
                index: 1,
                total: 2,
                siren: "222222222".to_string(),
                rows: 0,
            },
        ]
    );
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let source = ScriptedSource::new(HashMap::new());
    let sink = TestSink::new();

    let rows = fetch_batch(&source, &[], &CancelFlag::new(), &sink)
        .await
        .expect("batch ok");

    assert!(rows.is_empty());
    assert!(sink.take().is_empty());
    assert!(source.calls().is_empty());
}
