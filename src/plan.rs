use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where a source file is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    /// Folder relative to the target, e.g. `2023/06`.
    Dated(PathBuf),
    Unmatched,
    Skipped,
}

/// Assignment of every scanned file to exactly one bucket. Built once per
/// run, then executed.
#[derive(Debug, Default)]
pub struct SortPlan {
    dated: BTreeMap<PathBuf, Vec<PathBuf>>,
    unmatched: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
}

impl SortPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, bucket: Bucket, path: PathBuf) {
        match bucket {
            Bucket::Dated(folder) => self.dated.entry(folder).or_default().push(path),
            Bucket::Unmatched => self.unmatched.push(path),
            Bucket::Skipped => self.skipped.push(path),
        }
    }

    pub fn len(&self) -> usize {
        self.dated.values().map(Vec::len).sum::<usize>() + self.unmatched.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dated(&self) -> &BTreeMap<PathBuf, Vec<PathBuf>> {
        &self.dated
    }

    pub fn unmatched(&self) -> &[PathBuf] {
        &self.unmatched
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Dated folders in order, then the unmatched pool, then skipped files.
    pub fn entries(&self) -> impl Iterator<Item = (Bucket, &Path)> + '_ {
        let dated = self.dated.iter().flat_map(|(folder, paths)| {
            paths
                .iter()
                .map(move |path| (Bucket::Dated(folder.clone()), path.as_path()))
        });
        let unmatched = self
            .unmatched
            .iter()
            .map(|path| (Bucket::Unmatched, path.as_path()));
        let skipped = self
            .skipped
            .iter()
            .map(|path| (Bucket::Skipped, path.as_path()));

        dated.chain(unmatched).chain(skipped)
    }
}
