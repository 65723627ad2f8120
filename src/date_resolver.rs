//! Best-effort capture dates.
//!
//! Resolution goes through up to three tiers and stops at the first one that
//! yields a date:
//!
//! 1. embedded EXIF `DateTimeOriginal` (images only)
//! 2. an external [`MetadataProbe`] (videos only)
//! 3. the filesystem modification time
//!
//! Failures in the first two tiers are not errors; they fall through
//! silently. A date is only used for year/month bucketing when it is
//! plausible, see [`DateRecord::is_plausible`].

use crate::file_category::Category;
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Earliest year accepted for bucketing.
pub const MIN_PLAUSIBLE_YEAR: i32 = 1990;

const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Where a resolved date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    EmbeddedMetadata,
    ExternalProbe,
    FilesystemFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRecord {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

impl DateRecord {
    /// True when the year lies in `[1990, current_year]`.
    pub fn is_plausible(&self, current_year: i32) -> bool {
        (MIN_PLAUSIBLE_YEAR..=current_year).contains(&self.date.year())
    }
}

/// Destination bucket for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Month { year: i32, month: u32 },
    Unsorted,
}

impl DateBucket {
    /// Relative folder for this bucket: `YYYY/MM` or `Unsorted`.
    pub fn relative_dir(&self) -> PathBuf {
        match self {
            DateBucket::Month { year, month } => {
                PathBuf::from(format!("{:04}", year)).join(format!("{:02}", month))
            }
            DateBucket::Unsorted => PathBuf::from("Unsorted"),
        }
    }
}

/// Capability that reads a creation time out of a video container.
///
/// Implementations must return within a bounded time and map every failure
/// to `None`.
pub trait MetadataProbe {
    fn probe_creation_time(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Probe that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl MetadataProbe for NoProbe {
    fn probe_creation_time(&self, _path: &Path) -> Option<NaiveDateTime> {
        None
    }
}

/// Reads `creation_time` through `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: PathBuf,
    timeout: Duration,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "format_tags=creation_time",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]);
        cmd.arg(path);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd
    }
}

impl MetadataProbe for FfprobeProbe {
    fn probe_creation_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let mut child = self.command(path).spawn().ok()?;
        let deadline = Instant::now() + self.timeout;

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() < deadline => thread::sleep(PROBE_POLL_INTERVAL),
                _ => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
            }
        };
        if !status.success() {
            return None;
        }

        let mut output = String::new();
        child.stdout.take()?.read_to_string(&mut output).ok()?;
        output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(parse_probe_timestamp)
    }
}

/// Parses the timestamp formats video containers commonly carry.
///
/// Offsets are kept as written: `2021-07-01T23:30:00Z` stays on July 1st.
pub fn parse_probe_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    let trimmed = value.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Reads the EXIF `DateTimeOriginal` tag of an image.
///
/// Returns `None` if the file cannot be opened, has no EXIF block, lacks the
/// tag, or the tag does not hold a valid date.
pub fn read_exif_capture_time(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)?;

    let exif::Value::Ascii(ref values) = field.value else {
        return None;
    };
    let raw = values.first()?;
    let parsed = exif::DateTime::from_ascii(raw).ok()?;

    NaiveDate::from_ymd_opt(
        i32::from(parsed.year),
        u32::from(parsed.month),
        u32::from(parsed.day),
    )?
    .and_hms_opt(
        u32::from(parsed.hour),
        u32::from(parsed.minute),
        u32::from(parsed.second),
    )
}

/// Modification time of `path` in local time.
pub fn modification_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

/// Resolves dates and buckets for files.
pub struct DateResolver<'a> {
    probe: &'a dyn MetadataProbe,
    current_year: i32,
}

impl<'a> DateResolver<'a> {
    pub fn new(probe: &'a dyn MetadataProbe) -> Self {
        Self {
            probe,
            current_year: Local::now().year(),
        }
    }

    /// Pins the year used as the upper plausibility bound.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Resolves a date for `path`, or `None` if every tier failed.
    pub fn resolve(&self, path: &Path, category: Category) -> Option<DateRecord> {
        let embedded = match category {
            Category::Image => read_exif_capture_time(path).map(|date| DateRecord {
                date,
                source: DateSource::EmbeddedMetadata,
            }),
            Category::Video => self.probe.probe_creation_time(path).map(|date| DateRecord {
                date,
                source: DateSource::ExternalProbe,
            }),
            Category::Unwanted | Category::Unclassified => None,
        };

        embedded.or_else(|| {
            modification_time(path).map(|date| DateRecord {
                date,
                source: DateSource::FilesystemFallback,
            })
        })
    }

    /// Bucket for a resolution result; absent or implausible dates go to `Unsorted`.
    pub fn bucket(&self, record: Option<&DateRecord>) -> DateBucket {
        match record {
            Some(record) if record.is_plausible(self.current_year) => DateBucket::Month {
                year: record.date.year(),
                month: record.date.month(),
            },
            _ => DateBucket::Unsorted,
        }
    }
}
