//! Progress reporting for the CLI and batch runs. The library core never draws.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const COUNT_TEMPLATE: &str = "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
     elapsed: {elapsed_precise}  eta: {eta_precise}";

/// Count-style progress bar (items processed out of total), with an optional label.
pub fn make_count_progress(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(COUNT_TEMPLATE) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Indeterminate spinner for a single long-running step (load, export).
pub fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}  elapsed: {elapsed_precise}") {
        pb.set_style(style);
    }
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Optional wrapper: a bar when enabled, nothing otherwise.
pub struct ProgressScope {
    pb: Option<ProgressBar>,
}

impl ProgressScope {
    pub fn count(enabled: bool, label: &str, total: u64) -> Self {
        Self { pb: enabled.then(|| make_count_progress(total, label)) }
    }
    pub fn spinner(enabled: bool, label: &str) -> Self {
        Self { pb: enabled.then(|| make_spinner(label)) }
    }
    #[inline]
    pub fn inc(&self, delta: u64) {
        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }
    }
    pub fn finish<T: Into<String>>(&self, msg: T) {
        if let Some(pb) = &self.pb {
            pb.finish_with_message(msg.into());
        }
    }
}
