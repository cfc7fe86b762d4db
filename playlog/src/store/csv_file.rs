use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ErrorKind, PlaylogError, PlaylogResult};
use crate::store::base::EventStore;
use crate::types::{Cell, Store};
use crate::{bail, playlog_error};

/// Header of the leading positional index column.
const INDEX_COLUMN: &str = "";

/// Store persisted as a CSV file.
///
/// The file starts with an unnamed positional index column whose values are rewritten as
/// `0..n-1` on every write. An empty cell is the null marker. Columns the current event shape
/// does not know about are carried through verbatim.
#[derive(Debug, Clone)]
pub struct CsvEventStore {
    path: PathBuf,
}

impl CsvEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that receives the temporary file of an atomic write.
    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl EventStore for CsvEventStore {
    fn read(&self) -> PlaylogResult<Option<Store>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file does not exist yet");
                return Ok(None);
            }
            Err(err) => {
                return Err(playlog_error!(
                    ErrorKind::StoreReadFailed,
                    "Store file could not be opened",
                    format!("{}: {err}", self.path.display()),
                    source: err
                ));
            }
        };

        let store = decode_store(BufReader::new(file))?;
        debug!(
            path = %self.path.display(),
            rows = store.len(),
            columns = store.columns().len(),
            "read store"
        );

        Ok(Some(store))
    }

    fn write(&self, store: &Store) -> PlaylogResult<()> {
        let directory = self.directory();
        fs::create_dir_all(directory).map_err(|err| write_failed(&self.path, err))?;

        let mut temp =
            NamedTempFile::new_in(directory).map_err(|err| write_failed(&self.path, err))?;
        encode_store(BufWriter::new(temp.as_file_mut()), store)?;
        temp.as_file()
            .sync_all()
            .map_err(|err| write_failed(&self.path, err))?;

        // Dropping the temporary file on any earlier error removes it, leaving the store intact.
        temp.persist(&self.path)
            .map_err(|err| write_failed(&self.path, err.error))?;

        debug!(path = %self.path.display(), rows = store.len(), "wrote store");

        Ok(())
    }
}

/// Decodes a store from CSV.
///
/// The first header cell must be the empty index header. Duplicate columns and rows whose width
/// differs from the header are rejected with [`ErrorKind::StoreCorrupted`].
pub fn decode_store<R: io::Read>(reader: R) -> PlaylogResult<Store> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = reader.headers().map_err(corrupted)?.clone();
    let mut headers = headers.iter();
    match headers.next() {
        Some(INDEX_COLUMN) => {}
        Some(other) => bail!(
            ErrorKind::StoreCorrupted,
            "Store has no positional index column",
            format!("first header is `{other}`")
        ),
        None => bail!(ErrorKind::StoreCorrupted, "Store has no header"),
    }
    let columns: Vec<String> = headers.map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(corrupted)?;
        let row: Vec<Cell> = record
            .iter()
            .skip(1)
            .map(|value| (!value.is_empty()).then(|| value.to_string()))
            .collect();
        rows.push(row);
    }

    Store::from_parts(columns, rows)
}

/// Encodes a store as CSV with a fresh positional index.
pub fn encode_store<W: Write>(writer: W, store: &Store) -> PlaylogResult<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let header = std::iter::once(INDEX_COLUMN).chain(store.columns().iter().map(String::as_str));
    writer.write_record(header).map_err(encode_failed)?;

    for (index, row) in store.rows().iter().enumerate() {
        let index = index.to_string();
        let cells = row.iter().map(|cell| cell.as_deref().unwrap_or(""));
        writer
            .write_record(std::iter::once(index.as_str()).chain(cells))
            .map_err(encode_failed)?;
    }

    writer.flush().map_err(|err| {
        playlog_error!(
            ErrorKind::StoreWriteFailed,
            "Store could not be flushed",
            err.to_string(),
            source: err
        )
    })
}

fn corrupted(err: csv::Error) -> PlaylogError {
    playlog_error!(
        ErrorKind::StoreCorrupted,
        "Store could not be decoded",
        err.to_string(),
        source: err
    )
}

fn encode_failed(err: csv::Error) -> PlaylogError {
    playlog_error!(
        ErrorKind::StoreWriteFailed,
        "Store could not be encoded",
        err.to_string(),
        source: err
    )
}

fn write_failed(path: &Path, err: io::Error) -> PlaylogError {
    playlog_error!(
        ErrorKind::StoreWriteFailed,
        "Store file could not be written",
        format!("{}: {err}", path.display()),
        source: err
    )
}
