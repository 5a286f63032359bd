//! Exporters: indented text blocks, a flat rated CSV, and nested JSON.
//! File variants write to a hidden temp sibling and move it into place on success.

use crate::date::{normalize_timestamp, TimestampPolicy};
use crate::error::{EngineError, Result};
use crate::model::{Comment, Rating, EXPORT_COLUMNS};
use crate::query::{thread_rows, SortSpec, StoreView, ThreadRow};
use crate::util::{create_with_backoff, remove_with_backoff, replace_file_atomic_backoff, temp_sibling};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const INDENT: &str = "    ";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write thread rows as `{ ... }` blocks, one per top-level comment.
/// Not meant to be read back.
pub fn write_text<W: Write>(w: &mut W, rows: &[ThreadRow<'_>], ts: TimestampPolicy) -> io::Result<()> {
    let mut open = false;
    for row in rows {
        let c = row.comment;
        let time = normalize_timestamp(c.create_time, ts);
        if row.depth == 0 {
            if open {
                w.write_all(b"}\n\n")?;
            }
            open = true;
            writeln!(w, "{{")?;
            writeln!(w, "{INDENT}main_post: {}", c.id)?;
            write_fields(w, INDENT, &time, c, row.reply_count)?;
        } else {
            let indent = INDENT.repeat(row.depth + 1);
            writeln!(w, "{indent}replyer{}:", row.sibling_index)?;
            write_fields(w, &format!("{indent}{INDENT}"), &time, c, row.reply_count)?;
        }
    }
    if open {
        w.write_all(b"}\n\n")?;
    }
    Ok(())
}

fn write_fields<W: Write>(w: &mut W, pad: &str, time: &str, c: &Comment, replies: usize) -> io::Result<()> {
    writeln!(w, "{pad}time: {time}")?;
    writeln!(w, "{pad}username: {} ({})", c.author_name, c.author_id)?;
    writeln!(w, "{pad}replyer_number: {replies}")?;
    writeln!(w, "{pad}rating: {}", c.rating_label())?;
    writeln!(w, "{pad}content: {}", c.content)
}

/// Write comments as UTF-8 CSV with BOM, header row and the `rating` column.
/// `create_time` is written in its normalized display form.
pub fn write_csv<'a, W: Write>(
    w: &mut W,
    comments: impl IntoIterator<Item = &'a Comment>,
    ts: TimestampPolicy,
) -> io::Result<()> {
    w.write_all(UTF8_BOM)?;
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(w);
    wtr.write_record(EXPORT_COLUMNS).map_err(io::Error::from)?;
    for c in comments {
        let time = normalize_timestamp(c.create_time, ts);
        wtr.write_record([
            c.id.as_str(),
            c.parent_id.as_str(),
            time.as_str(),
            c.video_ref.as_str(),
            c.content.as_str(),
            c.author_id.as_str(),
            c.author_name.as_str(),
            c.avatar_ref.as_str(),
            c.declared_reply_count.as_str(),
            c.last_modified.as_str(),
            c.rating_label(),
        ])
        .map_err(io::Error::from)?;
    }
    wtr.flush()
}

#[derive(Debug, Serialize)]
pub struct JsonNode<'a> {
    pub id: &'a str,
    pub parent_id: &'a str,
    pub create_time: i64,
    pub time: String,
    pub author_id: &'a str,
    pub author_name: &'a str,
    pub content: &'a str,
    pub video_id: &'a str,
    pub reply_count: usize,
    pub rating: Option<Rating>,
    pub replies: Vec<JsonNode<'a>>,
}

/// Rebuild nesting from the pre-order rows.
pub fn json_tree<'a>(rows: &[ThreadRow<'a>], ts: TimestampPolicy) -> Vec<JsonNode<'a>> {
    let mut roots: Vec<JsonNode<'a>> = Vec::new();
    let mut stack: Vec<JsonNode<'a>> = Vec::new();

    fn close<'a>(stack: &mut Vec<JsonNode<'a>>, roots: &mut Vec<JsonNode<'a>>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.replies.push(done),
                None => roots.push(done),
            }
        }
    }

    for row in rows {
        while stack.len() > row.depth {
            close(&mut stack, &mut roots);
        }
        let c = row.comment;
        stack.push(JsonNode {
            id: &c.id,
            parent_id: &c.parent_id,
            create_time: c.create_time,
            time: normalize_timestamp(c.create_time, ts),
            author_id: &c.author_id,
            author_name: &c.author_name,
            content: &c.content,
            video_id: &c.video_ref,
            reply_count: row.reply_count,
            rating: c.rating,
            replies: Vec::new(),
        });
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

/// Write to a temp sibling of `dest`, then move it over `dest`.
fn write_atomically(dest: &Path, write_buf: usize, body: impl FnOnce(&mut BufWriter<std::fs::File>) -> io::Result<()>) -> Result<()> {
    let tmp = temp_sibling(dest);
    let res = (|| -> io::Result<()> {
        let f = create_with_backoff(&tmp, 16, 50)?;
        let mut w = BufWriter::with_capacity(write_buf.max(8 * 1024), f);
        body(&mut w)?;
        w.flush()?;
        Ok(())
    })();
    if let Err(e) = res {
        let _ = remove_with_backoff(&tmp, 4, 25);
        return Err(EngineError::io(dest, e));
    }
    replace_file_atomic_backoff(&tmp, dest)
}

pub fn export_text<V: StoreView + ?Sized>(
    view: &V,
    dest: &Path,
    sort: SortSpec,
    ts: TimestampPolicy,
    write_buf: usize,
) -> Result<()> {
    let rows = thread_rows(view, sort)?;
    write_atomically(dest, write_buf, |w| write_text(w, &rows, ts))?;
    tracing::info!(path = %dest.display(), rows = rows.len(), "exported text");
    Ok(())
}

/// One row per comment of the view, in insertion order (not tree order).
pub fn export_csv<V: StoreView + ?Sized>(view: &V, dest: &Path, ts: TimestampPolicy, write_buf: usize) -> Result<()> {
    write_atomically(dest, write_buf, |w| write_csv(w, view.comments(), ts))?;
    tracing::info!(path = %dest.display(), "exported csv");
    Ok(())
}

pub fn export_json<V: StoreView + ?Sized>(
    view: &V,
    dest: &Path,
    sort: SortSpec,
    ts: TimestampPolicy,
    pretty: bool,
    write_buf: usize,
) -> Result<()> {
    let rows = thread_rows(view, sort)?;
    let tree = json_tree(&rows, ts);
    write_atomically(dest, write_buf, |w| {
        if pretty {
            serde_json::to_writer_pretty(&mut *w, &tree)?;
        } else {
            serde_json::to_writer(&mut *w, &tree)?;
        }
        w.write_all(b"\n")
    })?;
    tracing::info!(path = %dest.display(), roots = tree.len(), "exported json");
    Ok(())
}
