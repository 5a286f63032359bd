#[path = "common/mod.rs"]
mod common;

use common::*;
use cthread::{CommentEngine, CommentStore, EngineError, EngineEvents, ExportKind, NoEvents, ParseWarning, Session};
use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl EngineEvents for Recorder {
    fn on_load_complete(&self, warnings: &[ParseWarning]) {
        self.log.lock().push(format!("loaded warnings={}", warnings.len()));
    }
    fn on_load_failed(&self, error: &EngineError) {
        let kind = match error {
            EngineError::Schema { .. } => "schema",
            EngineError::Io { .. } => "io",
            _ => "other",
        };
        self.log.lock().push(format!("load failed {kind}"));
    }
    fn on_classify_complete(&self, store: &Arc<CommentStore>) {
        self.log.lock().push(format!("classified {}", store.len()));
    }
    fn on_export_complete(&self, path: &Path) {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.log.lock().push(format!("exported {name}"));
    }
    fn on_export_failed(&self, _error: &EngineError) {
        self.log.lock().push("export failed".to_string());
    }
}

#[test]
fn load_publishes_store_and_reports_in_order() {
    let td = tempdir().unwrap();
    let mut rows = small_thread();
    rows.push(row("c5", "c4", 70, "u5", "Eve", "no video").video(""));
    let input = write_csv(td.path(), "thread.csv", &rows);

    let events = Arc::new(Recorder::default());
    let session = Session::new(CommentEngine::new(), events.clone());
    assert!(session.current().is_none());

    session.load(&input).unwrap().join().unwrap().unwrap();
    assert_eq!(events.take(), vec!["classified 5", "loaded warnings=1"]);
    assert_eq!(session.current().unwrap().len(), 5);
    assert_eq!(session.source().as_deref(), Some(input.as_path()));
    assert!(!session.is_busy());
}

#[test]
fn failed_load_keeps_the_previous_store() {
    let td = tempdir().unwrap();
    let good = write_csv(td.path(), "good.csv", &small_thread());
    let broken = write_bytes(td.path(), "broken.csv", b"comment_id,content\nx,y\n");

    let events = Arc::new(Recorder::default());
    let session = Session::new(CommentEngine::new(), events.clone());
    session.load(&good).unwrap().join().unwrap().unwrap();
    let before = session.current().unwrap();
    events.take();

    let err = session.load(&broken).unwrap().join().unwrap().unwrap_err();
    assert!(matches!(err, EngineError::Schema { .. }), "{err:?}");
    let err = session.load(td.path().join("absent.csv")).unwrap().join().unwrap().unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }), "{err:?}");

    assert_eq!(events.take(), vec!["load failed schema", "load failed io"]);
    assert!(Arc::ptr_eq(&before, &session.current().unwrap()));
    assert_eq!(session.source().as_deref(), Some(good.as_path()));
}

#[test]
fn refresh_needs_a_prior_load_and_rereads_the_file() {
    let td = tempdir().unwrap();
    let session = Session::new(CommentEngine::new(), Arc::new(NoEvents));
    assert!(matches!(session.refresh(), Err(EngineError::NothingLoaded)));

    let input = write_csv(td.path(), "thread.csv", &small_thread());
    session.load(&input).unwrap().join().unwrap().unwrap();
    assert_eq!(session.current().unwrap().len(), 4);

    let mut rows = small_thread();
    rows.push(row("c9", "c1", 999, "u9", "Ivy", "late arrival"));
    write_csv(td.path(), "thread.csv", &rows);
    session.refresh().unwrap().join().unwrap().unwrap();
    assert_eq!(session.current().unwrap().len(), 5);
}

/// Holds the worker inside its first callback until released.
struct Gate {
    release: Mutex<mpsc::Receiver<()>>,
}

impl EngineEvents for Gate {
    fn on_classify_complete(&self, _store: &Arc<CommentStore>) {
        let _ = self.release.lock().recv();
    }
}

#[test]
fn second_job_while_one_is_in_flight_is_rejected() {
    let td = tempdir().unwrap();
    let input = write_csv(td.path(), "thread.csv", &small_thread());
    let (tx, rx) = mpsc::channel();
    let session = Session::new(CommentEngine::new(), Arc::new(Gate { release: Mutex::new(rx) }));

    let first = session.load(&input).unwrap();
    assert!(session.is_busy());
    assert!(matches!(session.load(&input), Err(EngineError::Busy)));
    assert!(matches!(session.refresh(), Err(EngineError::NothingLoaded) | Err(EngineError::Busy)));

    tx.send(()).unwrap();
    first.join().unwrap().unwrap();
    assert!(!session.is_busy());
    drop(tx);
    // the gate is open for good once the sender is gone
    session.refresh().unwrap().join().unwrap().unwrap();
}

#[test]
fn export_reports_completion_and_failure() {
    let td = tempdir().unwrap();
    let input = write_csv(td.path(), "thread.csv", &small_thread());
    let events = Arc::new(Recorder::default());
    let session = Session::new(CommentEngine::new(), events.clone());

    assert!(matches!(session.export(ExportKind::Text, td.path().join("x.txt"), None), Err(EngineError::NothingLoaded)));

    session.load(&input).unwrap().join().unwrap().unwrap();
    events.take();

    let txt = td.path().join("thread.txt");
    session.export(ExportKind::Text, &txt, None).unwrap().join().unwrap().unwrap();
    assert!(fs::read_to_string(&txt).unwrap().contains("main_post: c4"));

    let csv = td.path().join("deep.csv");
    session.export(ExportKind::Csv, &csv, Some("deep".to_string())).unwrap().join().unwrap().unwrap();
    let text = fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 2, "{text}");

    let bad = td.path().join("missing").join("out.json");
    let err = session.export(ExportKind::Json, &bad, None).unwrap().join().unwrap().unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }));

    assert_eq!(events.take(), vec!["exported thread.txt", "exported deep.csv", "export failed"]);
}
