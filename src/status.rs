use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Reading-status flags for one paper, keyed by its id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub read: bool,
    pub to_read: bool,
    pub favorite: bool,
}

/// Which flag a toggle targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Read,
    ToRead,
    Favorite,
}

impl StatusFlags {
    /// Applies one toggle. The flags are not independent: marking a
    /// paper read takes it off the to-read pile, queueing it as to-read
    /// un-reads it, and favoriting implies having read it.
    pub fn toggled(self, kind: StatusKind, active: bool) -> StatusFlags {
        match kind {
            StatusKind::Read => StatusFlags {
                read: active,
                to_read: false,
                favorite: self.favorite,
            },
            StatusKind::ToRead => StatusFlags {
                read: false,
                to_read: active,
                favorite: self.favorite,
            },
            StatusKind::Favorite => StatusFlags {
                read: active || self.read,
                to_read: self.to_read,
                favorite: active,
            },
        }
    }

    pub fn is_default(&self) -> bool {
        !self.read && !self.to_read && !self.favorite
    }
}

/// Flag store per paper id, optionally persisted as one JSON file.
///
/// Ids whose flags are all off are not retained, so the file only ever
/// lists papers the user actually touched.
#[derive(Debug, Default)]
pub struct StatusStore {
    path: Option<PathBuf>,
    flags: HashMap<String, StatusFlags>,
}

impl StatusStore {
    /// A store that forgets everything when dropped. Handy in tests and
    /// for one-shot runs.
    pub fn in_memory() -> Self {
        StatusStore::default()
    }

    /// Opens the store backed by the file at `path`; a missing file is
    /// an empty store, not an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let flags = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(Error::Io(err)),
        };
        Ok(StatusStore {
            path: Some(path),
            flags,
        })
    }

    /// Current flags for a paper id, all-off when unknown.
    pub fn flags(&self, id: &str) -> StatusFlags {
        self.flags.get(id).copied().unwrap_or_default()
    }

    /// Applies a toggle for `id` and persists the outcome when the store
    /// is file-backed.
    pub fn toggle(&mut self, id: &str, kind: StatusKind, active: bool) -> Result<StatusFlags, Error> {
        let updated = self.flags(id).toggled(kind, active);
        if updated.is_default() {
            self.flags.remove(id);
        } else {
            self.flags.insert(id.to_owned(), updated);
        }
        self.save()?;
        Ok(updated)
    }

    /// Drops every stored flag.
    pub fn clear_all(&mut self) -> Result<(), Error> {
        self.flags.clear();
        self.save()
    }

    fn save(&self) -> Result<(), Error> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&self.flags)?)?;
        }
        Ok(())
    }
}
