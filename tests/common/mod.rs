#![allow(dead_code)]

use cthread::REQUIRED_COLUMNS;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Base epoch for fixtures: 2023-11-14 22:13:20 UTC, i.e. 2023-11-15 06:13:20 in UTC+08:00.
pub const T0: i64 = 1_700_000_000;

/// One input row in `REQUIRED_COLUMNS` order.
#[derive(Clone, Debug)]
pub struct Row {
    pub id: String,
    pub parent: String,
    pub time: String,
    pub video: String,
    pub content: String,
    pub user: String,
    pub nick: String,
    pub subs: String,
}

impl Row {
    pub fn fields(&self) -> [String; 10] {
        [
            self.id.clone(),
            self.parent.clone(),
            self.time.clone(),
            self.video.clone(),
            self.content.clone(),
            self.user.clone(),
            self.nick.clone(),
            format!("https://img.example/{}.png", self.user),
            self.subs.clone(),
            "1700009999".to_string(),
        ]
    }
    pub fn video(mut self, v: &str) -> Self {
        self.video = v.to_string();
        self
    }
    pub fn subs(mut self, s: &str) -> Self {
        self.subs = s.to_string();
        self
    }
    pub fn raw_time(mut self, t: &str) -> Self {
        self.time = t.to_string();
        self
    }
}

/// Comment `id` replying to `parent`, posted `offset` seconds after `T0`.
pub fn row(id: &str, parent: &str, offset: i64, user: &str, nick: &str, content: &str) -> Row {
    Row {
        id: id.to_string(),
        parent: parent.to_string(),
        time: (T0 + offset).to_string(),
        video: "v100".to_string(),
        content: content.to_string(),
        user: user.to_string(),
        nick: nick.to_string(),
        subs: "0".to_string(),
    }
}

/// Render rows as CSV text with the standard header.
pub fn csv_text(rows: &[Row]) -> String {
    csv_text_with_header(&REQUIRED_COLUMNS, rows.iter().map(|r| r.fields().to_vec()).collect())
}

pub fn csv_text_with_header(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(header).unwrap();
    for r in rows {
        w.write_record(&r).unwrap();
    }
    String::from_utf8(w.into_inner().unwrap()).unwrap()
}

pub fn write_csv(dir: &Path, name: &str, rows: &[Row]) -> PathBuf {
    write_bytes(dir, name, csv_text(rows).as_bytes())
}

pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let p = dir.join(name);
    let mut f = File::create(&p).unwrap();
    f.write_all(bytes).unwrap();
    p
}

/// Write `bytes` zstd-compressed.
pub fn write_zst(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let p = dir.join(name);
    let f = File::create(&p).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap();
    p
}

/// A small thread, OP = "u_op":
///
/// ```text
/// c1  Host  (+0)    "Welcome to the stream"
///   c2  Bob (+100)  "hi host"
///     c3  Cat (+200) "deep reply"
/// c4  Dan   (+50)   "Second top-level"
/// ```
pub fn small_thread() -> Vec<Row> {
    vec![
        row("c1", "0", 0, "u_op", "Host", "Welcome to the stream"),
        row("c2", "c1", 100, "u2", "Bob", "hi host"),
        row("c3", "c2", 200, "u3", "Cat", "deep reply"),
        row("c4", "0", 50, "u4", "Dan", "Second top-level"),
    ]
}

/// A non-OP top-level comment `root` with `second` direct replies, and
/// `third` grandchildren spread round-robin across those replies.
pub fn fanout(root: &str, second: usize, third: usize) -> Vec<Row> {
    let mut rows = vec![row(root, "0", 10, "u_root", "Root", "popular")];
    for i in 0..second {
        rows.push(row(&format!("{root}-r{i}"), root, 20 + i as i64, &format!("u_r{i}"), "Replier", "reply"));
    }
    for j in 0..third {
        let parent = format!("{root}-r{}", j % second.max(1));
        rows.push(row(&format!("{root}-g{j}"), &parent, 5_000 + j as i64, &format!("u_g{j}"), "Grand", "grand"));
    }
    rows
}
