use crate::error::{EngineError, Result};
use std::fs;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(io::stderr).try_init();
    });
}

// -------- file ops with backoff (Windows-friendly) --------

/// Transient errors seen on Windows when AV/backup filter drivers, network
/// volumes or sharing violations get in the way.
fn is_retriable_io_error(e: &io::Error) -> bool {
    // 5 access denied, 21 device not ready, 32 sharing violation, 33 lock violation,
    // 225 AV blocked, 1006 volume altered, 1117 device error, 1224 user-mapped section
    cfg!(windows) && matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 225 | 1006 | 1117 | 1224))
}

/// Run `op` up to `tries` times, sleeping linearly longer after each retriable failure.
fn with_backoff<T>(tries: usize, delay_ms: u64, what: &str, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, format!("{what} failed"))))
}

pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, "open", || File::open(path))
}

pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, "create", || File::create(path))
}

/// Remove a file; a file that does not exist counts as removed.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<()> {
    with_backoff(tries, delay_ms, "remove", || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    })
}

/// Hidden sibling used while an export is being written: `dir/.name.part`.
pub fn temp_sibling(dest: &Path) -> PathBuf {
    let name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "export".into());
    dest.with_file_name(format!(".{name}.part"))
}

/// Move `tmp` over `dest`. A refused rename is retried after removing `dest`,
/// then falls back to copy+remove. `tmp` is removed on failure.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let (tries, delay_ms) = (20usize, 50u64);
    if fs::rename(tmp, dest).is_ok() {
        return Ok(());
    }
    // Windows refuses to rename over an open or read-only target
    let res = remove_with_backoff(dest, tries, delay_ms)
        .and_then(|()| with_backoff(tries, delay_ms, "rename", || fs::rename(tmp, dest)))
        .or_else(|_| {
            with_backoff(tries, delay_ms, "copy", || fs::copy(tmp, dest))?;
            remove_with_backoff(tmp, tries, delay_ms)
        });
    if let Err(e) = res {
        let _ = remove_with_backoff(tmp, 4, 25);
        return Err(EngineError::io(dest, e));
    }
    Ok(())
}
