//! Embedded JSON document store.
//!
//! Documents are grouped into collections and addressed as
//! `{collection}/{n}`, where `n` is allocated per collection starting at 1.
//! Work happens through a [`Session`]: stored documents are staged and only
//! become visible once [`Session::save_changes`] commits them.
//!
//! The file-backed mode lays documents out as:
//! ```text
//! {data_dir}/
//!   notices/
//!     notices-1.json
//!     notices-2.json
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StorageError;

type Collections = HashMap<String, BTreeMap<u64, Value>>;

enum Backend {
    Memory(Mutex<Collections>),
    Disk { data_dir: PathBuf },
}

struct StoreInner {
    backend: Backend,
    /// Collection → last allocated document number.
    counters: Mutex<HashMap<String, u64>>,
}

/// Handle to a document store. Cloning shares the same underlying store.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<StoreInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn validate_collection(collection: &str) -> Result<(), StorageError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidCollection(collection.to_string()))
    }
}

fn document_id(collection: &str, number: u64) -> String {
    format!("{collection}/{number}")
}

/// Split `notices/3` into `("notices", 3)`.
fn parse_id(id: &str) -> Result<(&str, u64), StorageError> {
    let invalid = || StorageError::InvalidId(id.to_string());
    let (collection, number) = id.rsplit_once('/').ok_or_else(invalid)?;
    validate_collection(collection).map_err(|_| invalid())?;
    let number = number.parse().map_err(|_| invalid())?;
    Ok((collection, number))
}

fn document_filename(collection: &str, number: u64) -> String {
    format!("{collection}-{number}.json")
}

/// Inverse of [`document_filename`]; `None` for unrelated files.
fn parse_filename(collection: &str, filename: &str) -> Option<u64> {
    filename
        .strip_suffix(".json")?
        .strip_prefix(collection)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

impl DocumentStore {
    /// Create a store that lives only as long as this process.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend: Backend::Memory(Mutex::new(HashMap::new())),
                counters: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Open (or create) a file-backed store rooted at `data_dir`.
    ///
    /// Id counters resume from the highest document number found on disk.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let mut counters = HashMap::new();
        for entry in std::fs::read_dir(&data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let collection = entry.file_name().to_string_lossy().into_owned();
            if validate_collection(&collection).is_err() {
                continue;
            }
            let highest = std::fs::read_dir(entry.path())?
                .filter_map(|e| e.ok())
                .filter_map(|e| parse_filename(&collection, &e.file_name().to_string_lossy()))
                .max();
            if let Some(highest) = highest {
                counters.insert(collection, highest);
            }
        }

        info!(
            data_dir = %data_dir.display(),
            collections = counters.len(),
            "document store opened"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                backend: Backend::Disk { data_dir },
                counters: Mutex::new(counters),
            }),
        })
    }

    /// Start a new unit of work.
    pub fn open_session(&self) -> Session {
        Session {
            store: self.clone(),
            pending: Vec::new(),
        }
    }

    fn next_number(&self, collection: &str) -> u64 {
        let mut counters = lock(&self.inner.counters);
        let counter = counters.entry(collection.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    async fn write(&self, doc: PendingDocument) -> Result<(), StorageError> {
        match &self.inner.backend {
            Backend::Memory(collections) => {
                lock(collections)
                    .entry(doc.collection)
                    .or_default()
                    .insert(doc.number, doc.body);
            }
            Backend::Disk { data_dir } => {
                let dir = data_dir.join(&doc.collection);
                tokio::fs::create_dir_all(&dir).await?;
                let path = dir.join(document_filename(&doc.collection, doc.number));
                let tmp = path.with_extension("json.tmp");
                tokio::fs::write(&tmp, serde_json::to_vec_pretty(&doc.body)?).await?;
                tokio::fs::rename(&tmp, &path).await?;
            }
        }
        Ok(())
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<(u64, Value)>, StorageError> {
        match &self.inner.backend {
            Backend::Memory(collections) => {
                let docs = lock(collections)
                    .get(collection)
                    .map(|docs| docs.iter().map(|(n, v)| (*n, v.clone())).collect())
                    .unwrap_or_default();
                Ok(docs)
            }
            Backend::Disk { data_dir } => {
                let dir = data_dir.join(collection);
                let mut entries = match tokio::fs::read_dir(&dir).await {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                    Err(e) => return Err(e.into()),
                };

                let mut numbered = BTreeMap::new();
                while let Some(entry) = entries.next_entry().await? {
                    let name = entry.file_name();
                    if let Some(number) = parse_filename(collection, &name.to_string_lossy()) {
                        numbered.insert(number, entry.path());
                    }
                }

                let mut docs = Vec::with_capacity(numbered.len());
                for (number, path) in numbered {
                    let bytes = tokio::fs::read(&path).await?;
                    docs.push((number, serde_json::from_slice(&bytes)?));
                }
                Ok(docs)
            }
        }
    }

    async fn read_document(&self, collection: &str, number: u64) -> Result<Option<Value>, StorageError> {
        match &self.inner.backend {
            Backend::Memory(collections) => {
                let doc = lock(collections)
                    .get(collection)
                    .and_then(|docs| docs.get(&number).cloned());
                Ok(doc)
            }
            Backend::Disk { data_dir } => {
                let path = data_dir
                    .join(collection)
                    .join(document_filename(collection, number));
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

struct PendingDocument {
    collection: String,
    number: u64,
    body: Value,
}

/// A unit of work against a [`DocumentStore`].
///
/// Dropping a session without calling [`save_changes`](Session::save_changes)
/// discards everything it staged.
pub struct Session {
    store: DocumentStore,
    pending: Vec<PendingDocument>,
}

impl Session {
    /// Stage a new document and return its assigned id.
    pub fn store<T: Serialize>(&mut self, collection: &str, document: &T) -> Result<String, StorageError> {
        validate_collection(collection)?;
        let body = serde_json::to_value(document)?;
        let number = self.store.next_number(collection);
        self.pending.push(PendingDocument {
            collection: collection.to_string(),
            number,
            body,
        });
        Ok(document_id(collection, number))
    }

    /// Number of staged, uncommitted documents.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Commit every staged document. Returns how many were written.
    pub async fn save_changes(&mut self) -> Result<usize, StorageError> {
        let count = self.pending.len();
        for doc in std::mem::take(&mut self.pending) {
            self.store.write(doc).await?;
        }
        debug!(documents = count, "session changes saved");
        Ok(count)
    }

    /// All committed documents of a collection, ordered by id number.
    pub async fn query<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<(String, T)>, StorageError> {
        validate_collection(collection)?;
        self.store
            .read_collection(collection)
            .await?
            .into_iter()
            .map(|(number, body)| -> Result<_, StorageError> {
                Ok((document_id(collection, number), serde_json::from_value(body)?))
            })
            .collect()
    }

    /// Load one committed document by id.
    pub async fn load<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StorageError> {
        let (collection, number) = parse_id(id)?;
        match self.store.read_document(collection, number).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }
}
