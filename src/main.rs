use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use cthread::{
    discover_csv_files, missing_video_ids, normalize_timestamp, CommentEngine, FilterPolicy, ProgressScope, SortKey,
    SortSpec, StoreView, TimestampPolicy,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cthread")]
#[command(about = "Rebuild reply trees from comment CSV exports and rate comments by engagement")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the reply tree of a comment file
    Show {
        file: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Write text / CSV / JSON exports of a comment file
    Export {
        file: PathBuf,
        #[arg(long)]
        txt: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact_json: bool,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Export every *.csv / *.csv.zst in a directory
    Batch {
        dir: PathBuf,
        out_dir: PathBuf,
        /// Files processed at once
        #[arg(short = 'j', long, default_value_t = 4)]
        jobs: usize,
        /// Worker threads (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// id | author | content | time | reply-count | declared-replies | rating
    #[arg(long, default_value = "time")]
    sort: SortKey,
    #[arg(long)]
    desc: bool,
    /// Case-insensitive match on author name or content
    #[arg(long)]
    query: Option<String>,
    /// Keep ancestors of matching replies in filtered output
    #[arg(long)]
    keep_ancestors: bool,
    /// Treat create_time values above 10^12 as milliseconds
    #[arg(long)]
    accept_millis: bool,
}

impl ViewArgs {
    fn engine(&self) -> CommentEngine {
        CommentEngine::new()
            .sort(SortSpec::new(self.sort, self.desc))
            .filter_policy(if self.keep_ancestors { FilterPolicy::KeepAncestors } else { FilterPolicy::Flat })
            .timestamp_policy(if self.accept_millis { TimestampPolicy::AcceptMillis } else { TimestampPolicy::Strict })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Show { file, view } => show(file, view),
        Cmd::Export { file, txt, csv, json, compact_json, view } => export(file, txt, csv, json, compact_json, view),
        Cmd::Batch { dir, out_dir, jobs, threads } => batch(dir, out_dir, jobs, threads),
    }
}

fn report_warnings(loaded: &cthread::Loaded) {
    let missing = missing_video_ids(&loaded.warnings);
    if !missing.is_empty() {
        eprintln!("warning: {} comments had no video_id, set to N/A: {}", missing.len(), missing.join(", "));
    }
    let other = loaded.warnings.len() - missing.len();
    if other > 0 {
        eprintln!("warning: {other} other row issues (set RUST_LOG=debug for details)");
    }
}

fn show(file: PathBuf, args: ViewArgs) -> Result<()> {
    let engine = args.engine();
    let loaded = engine.load(&file).with_context(|| format!("load {}", file.display()))?;
    report_warnings(&loaded);

    let ts = engine.options().timestamp_policy;
    let print = |view: &dyn StoreView| -> Result<()> {
        for row in engine.rows(view)? {
            let c = row.comment;
            println!(
                "{}{}  {}  {}  replies={}  [{}]  {}",
                "  ".repeat(row.depth),
                c.id,
                c.author_name,
                normalize_timestamp(c.create_time, ts),
                row.reply_count,
                c.rating_label(),
                c.content
            );
        }
        Ok(())
    };

    match args.query.as_deref() {
        Some(q) => print(&engine.filter(&loaded.store, q)?)?,
        None => print(&loaded.store)?,
    }

    let hist = loaded.store.rating_histogram();
    let summary: Vec<String> = hist.iter().map(|(r, n)| format!("{r}={n}")).collect();
    eprintln!("{} comments; ratings: {}", loaded.store.len(), summary.join(" "));
    Ok(())
}

fn export(
    file: PathBuf,
    txt: Option<PathBuf>,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    compact_json: bool,
    args: ViewArgs,
) -> Result<()> {
    if txt.is_none() && csv.is_none() && json.is_none() {
        bail!("nothing to export: pass --txt, --csv and/or --json");
    }
    let engine = args.engine().pretty_json(!compact_json).progress(true);
    let pb = ProgressScope::spinner(true, &format!("Loading {}", file.display()));
    let loaded = engine.load(&file).with_context(|| format!("load {}", file.display()))?;
    pb.finish("loaded");
    report_warnings(&loaded);

    let filtered = match args.query.as_deref() {
        Some(q) => Some(engine.filter(&loaded.store, q)?),
        None => None,
    };
    let view: &dyn StoreView = match &filtered {
        Some(f) => f,
        None => &loaded.store,
    };

    if let Some(p) = txt {
        engine.export_text(view, &p).with_context(|| format!("export {}", p.display()))?;
        println!("wrote {}", p.display());
    }
    if let Some(p) = csv {
        engine.export_csv(view, &p).with_context(|| format!("export {}", p.display()))?;
        println!("wrote {}", p.display());
    }
    if let Some(p) = json {
        engine.export_json(view, &p).with_context(|| format!("export {}", p.display()))?;
        println!("wrote {}", p.display());
    }
    Ok(())
}

fn batch(dir: PathBuf, out_dir: PathBuf, jobs: usize, threads: Option<usize>) -> Result<()> {
    let inputs = discover_csv_files(&dir);
    if inputs.is_empty() {
        bail!("no .csv or .csv.zst files in {}", dir.display());
    }
    let mut engine = CommentEngine::new().file_concurrency(jobs);
    if let Some(n) = threads {
        engine = engine.parallelism(n);
    }
    let outcomes = engine
        .progress(true)
        .progress_label("Exporting")
        .export_batch(&inputs, &out_dir)?;

    let mut failed = 0usize;
    for o in &outcomes {
        match &o.result {
            Ok(out) => println!("{} -> {} ({} comments)", o.input.display(), out.text.display(), out.comments),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e}", o.input.display());
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", outcomes.len());
    }
    Ok(())
}
