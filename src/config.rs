use crate::date::DateMethod;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use std::path::PathBuf;

/// What happens to a file whose date could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Gather them in `<target>/unmatched`.
    Pool,
    /// Leave them where they are.
    #[default]
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transfer {
    #[default]
    Copy,
    Move,
}

/// Granularity of the dated folders created under the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FolderLayout {
    /// `YYYY`
    Year,
    /// `YYYY/MM`
    #[default]
    Month,
    /// `YYYY/MM/DD`
    Day,
}

impl FolderLayout {
    /// Relative folder a file dated `date` belongs in.
    pub fn folder(&self, date: NaiveDate) -> PathBuf {
        let mut folder = PathBuf::from(date.format("%Y").to_string());
        if matches!(self, Self::Month | Self::Day) {
            folder.push(date.format("%m").to_string());
        }
        if matches!(self, Self::Day) {
            folder.push(date.format("%d").to_string());
        }
        folder
    }
}

/// Name of the folder unmatched files are pooled into.
pub const UNMATCHED_DIR: &str = "unmatched";

/// Settings for a single sorting pass.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub target: PathBuf,
    pub method: DateMethod,
    pub unmatched: UnmatchedPolicy,
    pub transfer: Transfer,
    pub layout: FolderLayout,
    pub recursive: bool,
    pub dry_run: bool,
    /// 0 = warnings only, 1 = info, 2 = debug.
    pub verbosity: u8,
}

impl Config {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, method: DateMethod) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            method,
            unmatched: UnmatchedPolicy::default(),
            transfer: Transfer::default(),
            layout: FolderLayout::default(),
            recursive: false,
            dry_run: false,
            verbosity: 0,
        }
    }

    /// Check the directories before any file is touched, and canonicalize
    /// the ones that exist so later path comparisons are reliable.
    pub fn validate(mut self) -> Result<Self> {
        if !self.source.exists() {
            return Err(Error::SourceMissing(self.source));
        }
        if !self.source.is_dir() {
            return Err(Error::NotADirectory(self.source));
        }
        self.source = self.source.canonicalize()?;

        if self.target.exists() {
            if !self.target.is_dir() {
                return Err(Error::NotADirectory(self.target));
            }
            self.target = self.target.canonicalize()?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn june_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 15).unwrap()
    }

    #[test]
    fn test_layout_folders() {
        assert_eq!(FolderLayout::Year.folder(june_15()), PathBuf::from("2023"));
        assert_eq!(
            FolderLayout::Month.folder(june_15()),
            PathBuf::from("2023").join("06")
        );
        assert_eq!(
            FolderLayout::Day.folder(june_15()),
            PathBuf::from("2023").join("06").join("15")
        );
    }

    #[test]
    fn test_validate_missing_source() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().join("nope"), dir.path(), DateMethod::Modified);

        assert!(matches!(config.validate(), Err(Error::SourceMissing(_))));
    }

    #[test]
    fn test_validate_source_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();

        let config = Config::new(&file, dir.path(), DateMethod::Modified);
        assert!(matches!(config.validate(), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_validate_target_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("target");
        fs::write(&file, b"x").unwrap();

        let config = Config::new(dir.path(), &file, DateMethod::Modified);
        assert!(matches!(config.validate(), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_validate_accepts_missing_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("sorted");

        let config = Config::new(dir.path(), &target, DateMethod::Exif)
            .validate()
            .unwrap();
        assert_eq!(config.source, dir.path().canonicalize().unwrap());
        assert_eq!(config.target, target);
    }
}
