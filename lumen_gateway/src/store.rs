//! File-backed stores.
//!
//! `CsvHistoryStore` keeps the event history as an append-only CSV (one row
//! per light, rows of one snapshot sharing an event id) and the baseline
//! table as a small CSV rewritten atomically on every upsert.
//! `JsonlSink` appends one `{"lightState": [...]}` document per snapshot.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use lumen_traits::{
    BaselineEntry, BoxError, GroupSnapshot, HistoricalRecord, HistoryStore, LightState, StateSink,
};

use crate::error::Result;
use crate::util::{ensure_parent, write_atomic};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_csv<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = match csv::ReaderBuilder::new().has_headers(true).from_path(path) {
        Ok(r) => r,
        Err(e) => {
            if let csv::ErrorKind::Io(io) = e.kind() {
                if io.kind() == ErrorKind::NotFound {
                    return Ok(Vec::new());
                }
            }
            return Err(e.into());
        }
    };
    let mut rows = Vec::new();
    for rec in rdr.deserialize::<T>() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            // A torn or hand-edited row must not hide the rest of the file.
            Err(e) => tracing::warn!(
                path = %path.display(),
                record = ?e.position().map(|p| p.record()),
                line = ?e.position().map(|p| p.line()),
                error = %e,
                "skipping unreadable csv row"
            ),
        }
    }
    Ok(rows)
}

/// True when `file` is non-empty and does not end in a newline.
fn ends_mid_row(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[derive(Debug)]
pub struct CsvHistoryStore {
    history: PathBuf,
    baselines: PathBuf,
    /// Last event id handed out; guards history appends.
    last_event: Mutex<u64>,
    /// Serialises read-modify-write of the baseline table.
    baseline_lock: Mutex<()>,
}

impl CsvHistoryStore {
    /// Open (or lazily create) the two files. Event ids continue after the
    /// highest id already present in the history.
    pub fn open(history: impl Into<PathBuf>, baselines: impl Into<PathBuf>) -> Result<Self> {
        let history = history.into();
        let baselines = baselines.into();
        ensure_parent(&history)?;
        ensure_parent(&baselines)?;
        let last = read_csv::<HistoricalRecord>(&history)?
            .iter()
            .map(|r| r.event_id)
            .max()
            .unwrap_or(0);
        tracing::debug!(path = %history.display(), last_event = last, "history store opened");
        Ok(Self {
            history,
            baselines,
            last_event: Mutex::new(last),
            baseline_lock: Mutex::new(()),
        })
    }

    pub fn history_path(&self) -> &Path {
        &self.history
    }

    pub fn baseline_path(&self) -> &Path {
        &self.baselines
    }

    /// Write every row of `batch` under the next event id.
    ///
    /// The rows are encoded up front and written with one call, and the id
    /// is only consumed once that write succeeds.
    fn append(&self, batch: &GroupSnapshot) -> Result<u64> {
        let mut last = lock(&self.last_event);
        let event_id = *last + 1;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.history)?;
        let write_header = file.metadata()?.len() == 0;

        let mut buf = Vec::new();
        if ends_mid_row(&mut file)? {
            tracing::warn!(path = %self.history.display(), "history ends mid-row; starting a new line");
            buf.push(b'\n');
        }
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(buf);
        for s in batch {
            wtr.serialize(HistoricalRecord {
                event_id,
                group_name: s.group().clone(),
                power: s.power(),
                dimmer: s.dimmer(),
                color: s.color().to_string(),
                observed_at: s.observed_at(),
            })?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        file.write_all(&bytes)?;
        file.flush()?;
        *last = event_id;
        Ok(event_id)
    }

    fn write_baselines(&self, rows: &[BaselineEntry]) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for r in rows {
            wtr.serialize(r)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        write_atomic(&self.baselines, &bytes)?;
        Ok(())
    }
}

impl StateSink for CsvHistoryStore {
    fn name(&self) -> &str {
        "history-csv"
    }

    fn persist(&self, batch: &GroupSnapshot) -> std::result::Result<(), BoxError> {
        let event_id = self.append(batch)?;
        tracing::debug!(event_id, group = %batch.group(), rows = batch.len(), "history rows appended");
        Ok(())
    }
}

impl HistoryStore for CsvHistoryStore {
    fn select_historical(
        &self,
        since: DateTime<Utc>,
    ) -> std::result::Result<Vec<HistoricalRecord>, BoxError> {
        let _guard = lock(&self.last_event);
        let rows = read_csv::<HistoricalRecord>(&self.history)?;
        Ok(rows.into_iter().filter(|r| r.observed_at > since).collect())
    }

    fn load_baselines(&self) -> std::result::Result<Vec<BaselineEntry>, BoxError> {
        let _guard = lock(&self.baseline_lock);
        Ok(read_csv(&self.baselines)?)
    }

    fn upsert_baseline(&self, entry: &BaselineEntry) -> std::result::Result<(), BoxError> {
        let _guard = lock(&self.baseline_lock);
        let mut rows: Vec<BaselineEntry> = read_csv(&self.baselines)?;
        match rows
            .iter_mut()
            .find(|r| r.group == entry.group && r.hour == entry.hour)
        {
            Some(row) => row.value = entry.value,
            None => rows.push(entry.clone()),
        }
        rows.sort_by(|a, b| a.group.cmp(&b.group).then(a.hour.cmp(&b.hour)));
        self.write_baselines(&rows)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "lightState")]
    light_state: &'a [LightState],
}

/// Document-store stand-in: one JSON object per line.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent(&path)?;
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateSink for JsonlSink {
    fn name(&self) -> &str {
        "documents-jsonl"
    }

    fn persist(&self, batch: &GroupSnapshot) -> std::result::Result<(), BoxError> {
        let mut line = serde_json::to_vec(&Document {
            light_state: batch.states(),
        })?;
        line.push(b'\n');
        let _guard = lock(&self.lock);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(&line)?;
        Ok(())
    }
}
