//! Date extraction.
//!
//! Exactly one [`DateMethod`] is used per run. When it yields nothing the
//! file is unmatched; there is no fallback to another method.

pub mod exif;
pub mod filename;

use crate::error::Result;
use chrono::{DateTime, Local, NaiveDate};
use std::cell::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMethod {
    Accessed,
    Created,
    Modified,
    Exif,
    Filename,
}

impl fmt::Display for DateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accessed => "access time",
            Self::Created => "creation time",
            Self::Modified => "modification time",
            Self::Exif => "exif",
            Self::Filename => "filename",
        };
        f.write_str(name)
    }
}

/// Outcome of running one method against one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResult {
    pub date: Option<NaiveDate>,
    pub method: DateMethod,
}

/// A file under consideration, with each date attribute read on first use.
pub struct SourceFile {
    path: PathBuf,
    accessed: OnceCell<Option<NaiveDate>>,
    created: OnceCell<Option<NaiveDate>>,
    modified: OnceCell<Option<NaiveDate>>,
    exif: OnceCell<Option<NaiveDate>>,
    filename: OnceCell<Option<NaiveDate>>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            accessed: OnceCell::new(),
            created: OnceCell::new(),
            modified: OnceCell::new(),
            exif: OnceCell::new(),
            filename: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn date(&self, method: DateMethod) -> DateResult {
        let cell = match method {
            DateMethod::Accessed => &self.accessed,
            DateMethod::Created => &self.created,
            DateMethod::Modified => &self.modified,
            DateMethod::Exif => &self.exif,
            DateMethod::Filename => &self.filename,
        };
        let date = *cell.get_or_init(|| self.resolve(method));

        DateResult { date, method }
    }

    /// Read failures are reported here and turn into "no date".
    fn resolve(&self, method: DateMethod) -> Option<NaiveDate> {
        match extract(&self.path, method) {
            Ok(Some(date)) => {
                debug!(path = %self.path.display(), %method, %date, "Date found");
                Some(date)
            }
            Ok(None) => {
                debug!(path = %self.path.display(), %method, "No date found");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), %method, "Cannot read date: {e}");
                None
            }
        }
    }
}

fn extract(path: &Path, method: DateMethod) -> Result<Option<NaiveDate>> {
    match method {
        DateMethod::Accessed => Ok(Some(local_date(fs::metadata(path)?.accessed()?))),
        DateMethod::Created => Ok(Some(local_date(fs::metadata(path)?.created()?))),
        DateMethod::Modified => Ok(Some(local_date(fs::metadata(path)?.modified()?))),
        DateMethod::Exif => Ok(exif::extract_exif_time(path)?.map(|dt| dt.date())),
        DateMethod::Filename => Ok(path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(filename::parse_filename_date)),
    }
}

fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}
