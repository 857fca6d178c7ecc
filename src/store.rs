use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record addressable by its id within a durable collection.
pub trait Record: Clone + Send + Sync {
    fn key(&self) -> &str;
}

/// An ordered, key-indexed record collection mirrored to durable storage on
/// every mutation. The engine never touches file paths; it only sees this
/// interface.
pub trait Store<T: Record>: Send + Sync {
    fn get(&self, key: &str) -> Option<&T>;
    fn list(&self) -> &[T];
    /// Upsert by key, preserving the record's position on replace.
    fn put(&mut self, record: T) -> io::Result<()>;
    fn delete(&mut self, key: &str) -> io::Result<Option<T>>;
    fn replace_all(&mut self, records: Vec<T>) -> io::Result<()>;
}

/// Serialize `records` to a temp file, fsync, then atomically rename over
/// `path`. A concurrent reader of the file never observes a partial write.
pub fn atomic_write_json<T: Serialize>(path: &Path, records: &[T]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(&tmp, path)
}

/// Load a JSON collection; a missing file is an empty collection, not an
/// error.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Production store: the whole collection lives in memory and the backing
/// JSON file is rewritten in full on every mutation (no append-only log).
pub struct JsonStore<T> {
    path: PathBuf,
    records: Vec<T>,
}

impl<T: Record + Serialize + DeserializeOwned> JsonStore<T> {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let records = load_json(&path)?;
        Ok(Self { path, records })
    }

    fn mirror(&self) -> io::Result<()> {
        atomic_write_json(&self.path, &self.records)
    }
}

impl<T: Record + Serialize + DeserializeOwned> Store<T> for JsonStore<T> {
    fn get(&self, key: &str) -> Option<&T> {
        self.records.iter().find(|r| r.key() == key)
    }

    fn list(&self) -> &[T] {
        &self.records
    }

    fn put(&mut self, record: T) -> io::Result<()> {
        match self.records.iter().position(|r| r.key() == record.key()) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
        self.mirror()
    }

    fn delete(&mut self, key: &str) -> io::Result<Option<T>> {
        let Some(pos) = self.records.iter().position(|r| r.key() == key) else {
            return Ok(None);
        };
        let removed = self.records.remove(pos);
        self.mirror()?;
        Ok(Some(removed))
    }

    fn replace_all(&mut self, records: Vec<T>) -> io::Result<()> {
        self.records = records;
        self.mirror()
    }
}

/// Pure in-memory store for tests.
#[derive(Default)]
pub struct MemStore<T> {
    records: Vec<T>,
}

impl<T> MemStore<T> {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }
}

impl<T: Record> Store<T> for MemStore<T> {
    fn get(&self, key: &str) -> Option<&T> {
        self.records.iter().find(|r| r.key() == key)
    }

    fn list(&self) -> &[T] {
        &self.records
    }

    fn put(&mut self, record: T) -> io::Result<()> {
        match self.records.iter().position(|r| r.key() == record.key()) {
            Some(pos) => self.records[pos] = record,
            None => self.records.push(record),
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> io::Result<Option<T>> {
        let pos = self.records.iter().position(|r| r.key() == key);
        Ok(pos.map(|p| self.records.remove(p)))
    }

    fn replace_all(&mut self, records: Vec<T>) -> io::Result<()> {
        self.records = records;
        Ok(())
    }
}

// ── Side-channel sinks ───────────────────────────────────

/// Append-only side-channel collection (audit trail, event journal).
/// Callers treat every error as ignorable; implementations must never be
/// load-bearing.
pub trait Sink<T>: Send + Sync {
    fn append(&self, entry: T) -> io::Result<()>;
}

/// Durable sink: accumulates entries and rewrites the JSON file on every
/// append, with the same atomic-replace scheme as [`JsonStore`].
pub struct JsonSink<T> {
    path: PathBuf,
    entries: Mutex<Vec<T>>,
}

impl<T: Serialize + DeserializeOwned> JsonSink<T> {
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let entries = load_json(&path)?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }
}

impl<T: Serialize + Send + Sync> Sink<T> for JsonSink<T> {
    fn append(&self, entry: T) -> io::Result<()> {
        let mut entries = self.entries.lock().expect("sink mutex poisoned");
        entries.push(entry);
        atomic_write_json(&self.path, &entries)
    }
}

/// In-memory sink for tests; clone it before handing it off to keep a
/// handle for assertions.
#[derive(Clone)]
pub struct MemSink<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> MemSink<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> Default for MemSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemSink<T> {
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.lock().expect("sink mutex poisoned").clone()
    }
}

impl<T: Send + Sync> Sink<T> for MemSink<T> {
    fn append(&self, entry: T) -> io::Result<()> {
        self.entries.lock().expect("sink mutex poisoned").push(entry);
        Ok(())
    }
}
