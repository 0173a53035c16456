use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Remembered locations: the bibliography last opened and the folder its
/// PDFs live in. Both optional, both stored as one small JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub bib_file: Option<PathBuf>,
    pub pdf_folder: Option<PathBuf>,
}

impl Preferences {
    /// Reads preferences from `path`; a missing file means defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    /// Writes the preferences to `path`, creating parent directories on
    /// the way.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Forgets both locations.
    pub fn clear(&mut self) {
        *self = Preferences::default();
    }
}
