use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use config::{Config, FolderLayout, Transfer, UnmatchedPolicy};
use date::DateMethod;
use organizer::Organizer;
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod counter;
pub mod date;
pub mod error;
pub mod organizer;
pub mod plan;

#[derive(Parser, Debug)]
#[command(name = "imgsort")]
#[command(version)]
#[command(about = "Sort images from source-dir into a date based folder structure in target-dir", long_about = None)]
#[command(group(
    ArgGroup::new("method")
        .required(true)
        .args(["adate", "cdate", "exif", "filename", "mdate"]),
))]
pub struct Cli {
    /// Parse date from access date
    #[arg(short, long)]
    adate: bool,

    /// Parse date from creation date
    #[arg(short, long)]
    cdate: bool,

    /// Parse date from exif
    #[arg(short, long)]
    exif: bool,

    /// Parse date from filename
    #[arg(short, long)]
    filename: bool,

    /// Parse date from modification date
    #[arg(short, long)]
    mdate: bool,

    /// Pool files with no matching date in subfolder 'unmatched'
    #[arg(short, long, conflicts_with = "skip_unmatched")]
    pool_unmatched: bool,

    /// Ignore files with no matching date (default)
    #[arg(short, long)]
    skip_unmatched: bool,

    /// Move files instead of copying them
    #[arg(short = 'M', long = "move")]
    move_files: bool,

    /// Folder granularity under target-dir
    #[arg(short, long, value_enum, default_value_t = FolderLayout::Month)]
    layout: FolderLayout,

    /// Descend into subdirectories of source-dir
    #[arg(short, long)]
    recursive: bool,

    /// Show where files would go without touching them
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Increase verbosity (up to two times)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(value_name = "SOURCE_DIR")]
    source: PathBuf,

    #[arg(value_name = "TARGET_DIR")]
    target: PathBuf,
}

impl Cli {
    fn method(&self) -> Option<DateMethod> {
        [
            (self.adate, DateMethod::Accessed),
            (self.cdate, DateMethod::Created),
            (self.exif, DateMethod::Exif),
            (self.filename, DateMethod::Filename),
            (self.mdate, DateMethod::Modified),
        ]
        .into_iter()
        .find_map(|(set, method)| set.then_some(method))
    }

    pub fn to_config(&self) -> Result<Config> {
        let method = self.method().context("No date method selected")?;

        let mut config = Config::new(&self.source, &self.target, method);
        if self.pool_unmatched {
            config.unmatched = UnmatchedPolicy::Pool;
        }
        if self.move_files {
            config.transfer = Transfer::Move;
        }
        config.layout = self.layout;
        config.recursive = self.recursive;
        config.dry_run = self.dry_run;
        config.verbosity = self.verbose.min(2);

        Ok(config)
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli.to_config()?;
    init_tracing(config.verbosity);

    let config = config
        .validate()
        .context("Invalid source or target directory")?;

    let organizer = Organizer::new(&config);
    let summary = organizer.run()?;
    println!("{summary}");

    Ok(())
}
