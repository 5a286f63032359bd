use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

fn csv_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?P<stem>[^.].*?)\.csv(?:\.zst)?$").expect("static regex"))
}

/// Stem of a comment file name (`foo.csv` / `foo.csv.zst` → `foo`), or None for other files.
pub fn csv_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    csv_name_re().captures(name).map(|c| c["stem"].to_string())
}

/// Comment files directly inside `dir` (no recursion), sorted by path.
/// A missing directory yields an empty list.
pub fn discover_csv_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| csv_stem(p).is_some())
        .collect();
    out.sort();
    out
}
