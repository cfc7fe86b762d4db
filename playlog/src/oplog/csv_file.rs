use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::{ErrorKind, PlaylogError, PlaylogResult};
use crate::oplog::base::OperationalLog;
use crate::{bail, playlog_error};

const HEADER: [&str; 3] = ["", "time", "message"];

/// Operational log persisted as a CSV file with columns `""` (positional index), `time` and
/// `message`.
///
/// Appends never rewrite earlier entries. Times are written in UTC as RFC 3339 with
/// microseconds.
#[derive(Debug, Clone)]
pub struct CsvOperationalLog {
    path: PathBuf,
}

impl CsvOperationalLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inspects the existing file and returns the next index and whether a header is needed.
    fn tail_state(&self) -> PlaylogResult<TailState> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(TailState::default()),
            Err(err) => return Err(append_failed(&self.path, err)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(contents.as_slice());

        let headers = reader.headers().map_err(|err| log_corrupted(&self.path, err))?;
        if headers.is_empty() {
            return Ok(TailState::default());
        }
        if headers.iter().ne(HEADER) {
            bail!(
                ErrorKind::LogAppendFailed,
                "Operational log has an unexpected header",
                format!("{}: {headers:?}", self.path.display())
            );
        }

        let mut entries = 0;
        for record in reader.records() {
            record.map_err(|err| log_corrupted(&self.path, err))?;
            entries += 1;
        }

        Ok(TailState {
            next_index: entries,
            needs_header: false,
            needs_newline: !contents.ends_with(b"\n"),
        })
    }
}

#[derive(Debug)]
struct TailState {
    next_index: usize,
    needs_header: bool,
    needs_newline: bool,
}

impl Default for TailState {
    fn default() -> Self {
        Self {
            next_index: 0,
            needs_header: true,
            needs_newline: false,
        }
    }
}

impl OperationalLog for CsvOperationalLog {
    fn append(&self, time: DateTime<Utc>, message: &str) -> PlaylogResult<()> {
        let tail = self.tail_state()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| append_failed(&self.path, err))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| append_failed(&self.path, err))?;

        if tail.needs_newline {
            file.write_all(b"\n")
                .map_err(|err| append_failed(&self.path, err))?;
        }

        let mut writer = csv::Writer::from_writer(file);
        if tail.needs_header {
            writer
                .write_record(HEADER)
                .map_err(|err| log_write_failed(&self.path, err))?;
        }

        let index = tail.next_index.to_string();
        let time = time.to_rfc3339_opts(SecondsFormat::Micros, true);
        writer
            .write_record([index.as_str(), time.as_str(), message])
            .map_err(|err| log_write_failed(&self.path, err))?;
        writer
            .flush()
            .map_err(|err| append_failed(&self.path, err))?;

        debug!(
            path = %self.path.display(),
            index = tail.next_index,
            "appended operational log entry"
        );

        Ok(())
    }
}

fn append_failed(path: &Path, err: io::Error) -> PlaylogError {
    playlog_error!(
        ErrorKind::LogAppendFailed,
        "Operational log could not be appended",
        format!("{}: {err}", path.display()),
        source: err
    )
}

fn log_write_failed(path: &Path, err: csv::Error) -> PlaylogError {
    playlog_error!(
        ErrorKind::LogAppendFailed,
        "Operational log entry could not be encoded",
        format!("{}: {err}", path.display()),
        source: err
    )
}

fn log_corrupted(path: &Path, err: csv::Error) -> PlaylogError {
    playlog_error!(
        ErrorKind::LogAppendFailed,
        "Operational log could not be decoded",
        format!("{}: {err}", path.display()),
        source: err
    )
}
