use crate::config::{Config, Transfer, UnmatchedPolicy, UNMATCHED_DIR};
use crate::counter::{Counter, Counters, Summary};
use crate::date::SourceFile;
use crate::error::{Error, Result};
use crate::plan::{Bucket, SortPlan};
use filetime::FileTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

/// Highest numeric suffix tried when resolving a name collision.
const MAX_SUFFIX: u32 = 9999;

/// Result of placing one file at its destination.
#[derive(Debug, PartialEq, Eq)]
enum Placement {
    Transferred(PathBuf),
    /// The destination already holds this file or an identical copy of it.
    AlreadyPresent(PathBuf),
}

pub struct Organizer<'a> {
    pub counter: Counter,
    config: &'a Config,
}

impl<'a> Organizer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            counter: Counter::default(),
            config,
        }
    }

    /// Classify every file of the source directory, then transfer it.
    #[instrument(skip(self), fields(source = %self.config.source.display(), target = %self.config.target.display(), method = %self.config.method))]
    pub fn run(&self) -> Result<Summary> {
        let files = self.collect_files()?;
        let plan = self.plan(files);

        if plan.is_empty() {
            warn!("No files found in {}", self.config.source.display());
        }
        info!(
            "{} files planned: {} dated folders, {} unmatched, {} skipped",
            plan.len(),
            plan.dated().len(),
            plan.unmatched().len(),
            plan.skipped().len()
        );

        if self.config.dry_run {
            self.report(&plan);
        } else {
            fs::create_dir_all(&self.config.target)?;
            self.execute(&plan);
        }

        let summary = self.counter.summary();
        debug_assert!(summary.is_balanced());
        info!("Successfully sorted the source directory. {summary}");

        Ok(summary)
    }

    /// Regular files of the source directory, in file name order. The target
    /// subtree is left out when it lives inside the source and differs from it.
    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let source = &self.config.source;
        let target = &self.config.target;
        let exclude_target = target != source && target.starts_with(source);
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };

        let mut files = vec![];
        let walker = WalkDir::new(source)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(exclude_target && entry.path().starts_with(target)));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    debug!("{}", entry.path().display());
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) if e.depth() == 0 => return Err(Error::WalkDir(e)),
                Err(e) => warn!("Cannot read directory entry: {e}"),
            }
        }

        Ok(files)
    }

    fn plan(&self, files: Vec<PathBuf>) -> SortPlan {
        let mut plan = SortPlan::new();

        for path in files {
            self.counter.increment(Counters::Scanned);

            let file = SourceFile::new(path);
            let result = file.date(self.config.method);
            let bucket = match (result.date, self.config.unmatched) {
                (Some(date), _) => Bucket::Dated(self.config.layout.folder(date)),
                (None, UnmatchedPolicy::Pool) => Bucket::Unmatched,
                (None, UnmatchedPolicy::Skip) => Bucket::Skipped,
            };

            plan.assign(bucket, file.path().to_path_buf());
        }

        plan
    }

    fn execute(&self, plan: &SortPlan) {
        let progress = if self.config.verbosity >= 2 {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(plan.len() as u64)
        };
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            progress.set_style(style);
        }

        for (bucket, path) in plan.entries() {
            progress.set_message(path.display().to_string());

            let (dest_dir, done) = match &bucket {
                Bucket::Dated(folder) => (self.config.target.join(folder), Counters::Sorted),
                Bucket::Unmatched => (self.config.target.join(UNMATCHED_DIR), Counters::Pooled),
                Bucket::Skipped => {
                    info!("Skipping unmatched file {}", path.display());
                    self.counter.increment(Counters::Skipped);
                    progress.inc(1);
                    continue;
                }
            };

            match self.place(path, &dest_dir) {
                Ok(Placement::Transferred(dest)) => {
                    info!("{} -> {}", path.display(), dest.display());
                    self.counter.increment(done);
                }
                Ok(Placement::AlreadyPresent(dest)) => {
                    debug!("{} already sorted as {}", path.display(), dest.display());
                    self.counter.increment(Counters::AlreadySorted);
                }
                Err(e) => {
                    error!("Cannot sort {}: {e}", path.display());
                    self.counter.increment(Counters::Failed);
                }
            }

            progress.inc(1);
        }

        progress.set_message("Done");
        progress.finish();
    }

    /// Print where each file would go without touching anything.
    fn report(&self, plan: &SortPlan) {
        for (bucket, path) in plan.entries() {
            let counter = match &bucket {
                Bucket::Dated(folder) => {
                    println!("{} -> {}", path.display(), self.config.target.join(folder).display());
                    Counters::Sorted
                }
                Bucket::Unmatched => {
                    let pool = self.config.target.join(UNMATCHED_DIR);
                    println!("{} -> {}", path.display(), pool.display());
                    Counters::Pooled
                }
                Bucket::Skipped => {
                    println!("{} (skipped)", path.display());
                    Counters::Skipped
                }
            };
            self.counter.increment(counter);
        }
    }

    fn place(&self, source: &Path, dest_dir: &Path) -> Result<Placement> {
        fs::create_dir_all(dest_dir)?;

        match resolve_destination(source, dest_dir)? {
            Placement::Transferred(dest) => {
                transfer(source, &dest, self.config.transfer)?;
                Ok(Placement::Transferred(dest))
            }
            present => Ok(present),
        }
    }
}

/// Pick the destination for `source` inside `dest_dir`: the original name,
/// then `stem_1.ext`, `stem_2.ext` and so on. A candidate that is the source
/// itself, or a byte-identical copy of it, means the file is already sorted.
fn resolve_destination(source: &Path, dest_dir: &Path) -> Result<Placement> {
    let file_name = source
        .file_name()
        .ok_or_else(|| Error::InvalidFileName(source.to_path_buf()))?;
    let stem = Path::new(file_name)
        .file_stem()
        .unwrap_or(file_name)
        .to_string_lossy()
        .into_owned();
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let candidates = std::iter::once(dest_dir.join(file_name)).chain(
        (1..=MAX_SUFFIX).map(|i| dest_dir.join(format!("{stem}_{i}{extension}"))),
    );

    for candidate in candidates {
        if !candidate.exists() {
            return Ok(Placement::Transferred(candidate));
        }
        if is_same_file(source, &candidate)? || has_same_content(source, &candidate)? {
            return Ok(Placement::AlreadyPresent(candidate));
        }
    }

    Err(Error::CollisionExhausted(source.to_path_buf()))
}

fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    Ok(a.canonicalize()? == b.canonicalize()?)
}

fn has_same_content(a: &Path, b: &Path) -> Result<bool> {
    let times_a = file_times(a)?;
    let times_b = file_times(b)?;

    let same = compare_bytes(a, b);

    restore_times(a, times_a);
    restore_times(b, times_b);
    same
}

fn compare_bytes(a: &Path, b: &Path) -> Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(File::open(a)?);
    let mut reader_b = BufReader::new(File::open(b)?);
    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];

    loop {
        let n = reader_a.read(&mut buf_a)?;
        if n == 0 {
            return Ok(true);
        }
        reader_b.read_exact(&mut buf_b[..n])?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
    }
}

/// Access and modification time of `path`.
fn file_times(path: &Path) -> Result<(FileTime, FileTime)> {
    let metadata = fs::metadata(path)?;
    Ok((
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    ))
}

/// Reading a file bumps its access time, which is a sort key under `-a`.
fn restore_times(path: &Path, (atime, mtime): (FileTime, FileTime)) {
    if let Err(e) = filetime::set_file_times(path, atime, mtime) {
        debug!("Cannot restore times of {}: {e}", path.display());
    }
}

fn transfer(source: &Path, dest: &Path, mode: Transfer) -> Result<()> {
    match mode {
        Transfer::Copy => copy_preserving_times(source, dest),
        Transfer::Move => match fs::rename(source, dest) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("Cannot rename {}, copying instead: {e}", source.display());
                copy_preserving_times(source, dest)?;
                if let Err(e) = fs::remove_file(source) {
                    if let Err(cleanup) = fs::remove_file(dest) {
                        warn!("Cannot remove partial copy {}: {cleanup}", dest.display());
                    }
                    return Err(e.into());
                }
                Ok(())
            }
        },
    }
}

/// Copy `source` to `dest` carrying over both access and modification
/// time. Creation time cannot be set and is always the time of the copy.
fn copy_preserving_times(source: &Path, dest: &Path) -> Result<()> {
    let times = file_times(source)?;

    let copied = fs::copy(source, dest);
    restore_times(source, times);
    copied?;

    filetime::set_file_times(dest, times.0, times.1)?;

    Ok(())
}
