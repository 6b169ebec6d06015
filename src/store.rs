//! Durable key-value storage for the in-progress call number.
//!
//! The controller never writes directly: it hands values to a
//! [`StoreWriter`], whose worker thread owns the blocking I/O.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, unbounded};
use tracing::{debug, error, warn};

use crate::error::{OverlayError, OverlayResult};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str) -> OverlayResult<()>;
}

/// String map kept in a JSON file. The whole file is rewritten on every put.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> OverlayResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> OverlayResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.read().ok()?.get(key).cloned()
    }

    /// The in-memory map only changes once the file has been written.
    fn put(&self, key: &str, value: &str) -> OverlayResult<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = guard.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> OverlayResult<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

enum StoreCommand {
    Put { key: String, value: String },
    Shutdown,
}

/// Fire-and-forget writes on a dedicated thread.
///
/// Failed writes are logged and never retried. Dropping the writer drains
/// whatever was queued before returning.
pub struct StoreWriter {
    sender: Sender<StoreCommand>,
    worker: Option<JoinHandle<()>>,
}

impl StoreWriter {
    pub fn spawn(store: Arc<dyn KeyValueStore>) -> OverlayResult<Self> {
        let (sender, receiver) = unbounded::<StoreCommand>();
        let worker = thread::Builder::new()
            .name("call-overlay-store".into())
            .spawn(move || {
                while let Ok(command) = receiver.recv() {
                    match command {
                        StoreCommand::Put { key, value } => {
                            if let Err(err) = store.put(&key, &value) {
                                warn!(%err, key = %key, "store write failed");
                            } else {
                                debug!(key = %key, value = %value, "store write");
                            }
                        }
                        StoreCommand::Shutdown => break,
                    }
                }
                debug!("store writer shutting down");
            })
            .map_err(|err| OverlayError::Spawn("store writer", err))?;
        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    pub fn put(&self, key: &str, value: &str) {
        let command = StoreCommand::Put {
            key: key.to_string(),
            value: value.to_string(),
        };
        if self.sender.send(command).is_err() {
            warn!(key = %key, "store writer is gone; write dropped");
        }
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.sender.send(StoreCommand::Shutdown);
            if worker.join().is_err() {
                error!("store writer thread panicked");
            }
        }
    }
}
