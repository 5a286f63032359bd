//! Background dispatch for a display layer: one current store, swapped only on a
//! successful load/refresh, with completion reported through [`EngineEvents`].

use crate::engine::CommentEngine;
use crate::error::{EngineError, ParseWarning, Result};
use crate::store::CommentStore;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Callbacks a display layer binds to. All are invoked on the worker thread.
pub trait EngineEvents: Send + Sync {
    fn on_load_complete(&self, _warnings: &[ParseWarning]) {}
    fn on_load_failed(&self, _error: &EngineError) {}
    fn on_classify_complete(&self, _store: &Arc<CommentStore>) {}
    fn on_export_complete(&self, _path: &Path) {}
    fn on_export_failed(&self, _error: &EngineError) {}
}

/// Callbacks that do nothing.
pub struct NoEvents;
impl EngineEvents for NoEvents {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Text,
    Csv,
    Json,
}

struct Current {
    store: Arc<CommentStore>,
    source: PathBuf,
}

struct Shared {
    current: Mutex<Option<Current>>,
    busy: AtomicBool,
}

/// Clears the in-flight flag when the job ends, including by panic.
struct BusyGuard(Arc<Shared>);
impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

pub struct Session {
    engine: CommentEngine,
    events: Arc<dyn EngineEvents>,
    shared: Arc<Shared>,
}

impl Session {
    pub fn new(engine: CommentEngine, events: Arc<dyn EngineEvents>) -> Self {
        Self {
            engine,
            events,
            shared: Arc::new(Shared { current: Mutex::new(None), busy: AtomicBool::new(false) }),
        }
    }

    pub fn engine(&self) -> &CommentEngine {
        &self.engine
    }

    /// The store currently published to readers, if any load has succeeded.
    pub fn current(&self) -> Option<Arc<CommentStore>> {
        self.shared.current.lock().as_ref().map(|c| Arc::clone(&c.store))
    }

    pub fn source(&self) -> Option<PathBuf> {
        self.shared.current.lock().as_ref().map(|c| c.source.clone())
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    fn claim(&self) -> Result<BusyGuard> {
        self.shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::Busy)?;
        Ok(BusyGuard(Arc::clone(&self.shared)))
    }

    fn spawn(&self, name: &str, job: impl FnOnce() -> Result<()> + Send + 'static) -> Result<JoinHandle<Result<()>>> {
        thread::Builder::new()
            .name(format!("cthread-{name}"))
            .spawn(job)
            .map_err(|e| EngineError::io(PathBuf::from("<worker thread>"), e))
    }

    /// Load `path` in the background. The current store is replaced only if the
    /// whole load succeeds.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<JoinHandle<Result<()>>> {
        let guard = self.claim()?;
        let path = path.as_ref().to_path_buf();
        let engine = self.engine.clone();
        let events = Arc::clone(&self.events);
        let shared = Arc::clone(&self.shared);

        self.spawn("load", move || {
            let _guard = guard;
            match engine.load(&path) {
                Ok(loaded) => {
                    let store = Arc::new(loaded.store);
                    *shared.current.lock() = Some(Current { store: Arc::clone(&store), source: loaded.source });
                    events.on_classify_complete(&store);
                    events.on_load_complete(&loaded.warnings);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "load failed");
                    events.on_load_failed(&e);
                    Err(e)
                }
            }
        })
    }

    /// Re-read the last successfully loaded file.
    pub fn refresh(&self) -> Result<JoinHandle<Result<()>>> {
        let source = self.source().ok_or(EngineError::NothingLoaded)?;
        self.load(source)
    }

    /// Export the current store (or its filtered overlay when `query` is given).
    pub fn export(&self, kind: ExportKind, dest: impl AsRef<Path>, query: Option<String>) -> Result<JoinHandle<Result<()>>> {
        let store = self.current().ok_or(EngineError::NothingLoaded)?;
        let guard = self.claim()?;
        let dest = dest.as_ref().to_path_buf();
        let engine = self.engine.clone();
        let events = Arc::clone(&self.events);

        self.spawn("export", move || {
            let _guard = guard;
            let res = match query.as_deref() {
                Some(q) => engine.filter(&store, q).and_then(|view| run_export(&engine, &view, kind, &dest)),
                None => run_export(&engine, store.as_ref(), kind, &dest),
            };
            match res {
                Ok(()) => {
                    events.on_export_complete(&dest);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(path = %dest.display(), error = %e, "export failed");
                    events.on_export_failed(&e);
                    Err(e)
                }
            }
        })
    }
}

fn run_export<V: crate::query::StoreView + ?Sized>(engine: &CommentEngine, view: &V, kind: ExportKind, dest: &Path) -> Result<()> {
    match kind {
        ExportKind::Text => engine.export_text(view, dest),
        ExportKind::Csv => engine.export_csv(view, dest),
        ExportKind::Json => engine.export_json(view, dest),
    }
}
