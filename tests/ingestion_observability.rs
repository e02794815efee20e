use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_ingest::ingestion::{
    IngestionContext, IngestionObserver, IngestionOptions, IngestionSeverity, IngestionStats, LoadedRows,
};
use tabular_ingest::DataError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(usize, usize)>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push((ctx.position, stats.rows));
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &DataError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &DataError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn tmp_csv(name: &str, contents: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("tabular-ingest-obs-{name}-{nanos}.csv"));
    std::fs::write(&path, contents).unwrap();
    path
}

fn options(obs: Arc<RecordingObserver>) -> IngestionOptions {
    IngestionOptions {
        observer: Some(obs),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    }
}

#[test]
fn observer_receives_one_success_per_file() {
    let a = tmp_csv("ok-a", "date,qty\n2024-01-01,1\n");
    let b = tmp_csv("ok-b", "date,qty\n2024-01-02,2\n2024-01-03,3\n");
    let obs = Arc::new(RecordingObserver::default());

    LoadedRows::from_files_with_options(&[&a, &b], None, &options(obs.clone())).unwrap();

    // The first file contributes its header row; the second file's header is consumed.
    assert_eq!(*obs.successes.lock().unwrap(), vec![(0, 2), (1, 2)]);
    assert!(obs.failures.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&a);
    let _ = std::fs::remove_file(&b);
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let missing = std::env::temp_dir().join("tabular-ingest-obs-does-not-exist.csv");

    let _ = LoadedRows::from_files_with_options(&[&missing], None, &options(obs.clone())).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_header_mismatch() {
    let a = tmp_csv("bad-a", "date,qty\n2024-01-01,1\n");
    let b = tmp_csv("bad-b", "date,amount\n2024-01-02,2\n");
    let obs = Arc::new(RecordingObserver::default());

    let _ = LoadedRows::from_files_with_options(&[&a, &b], None, &options(obs.clone())).unwrap_err();

    assert_eq!(*obs.successes.lock().unwrap(), vec![(0, 2)]);
    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());

    let _ = std::fs::remove_file(&a);
    let _ = std::fs::remove_file(&b);
}
