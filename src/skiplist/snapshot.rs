// JSON snapshot persistence for the skip list

use super::SkipList;
use crate::{log_error, log_info, log_warn};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by snapshot save/load
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot root must be a JSON array of key-value objects")]
    NotAnArray,
}

/// One element of the on-disk array. Extra fields in stored objects are
/// ignored on load.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry<K, V> {
    key: K,
    value: V,
}

/// Result of a snapshot load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Elements inserted into the list.
    pub loaded: u64,
    /// Elements skipped over a type mismatch or malformed object.
    pub skipped: u64,
}

/// Writes timestamped JSON snapshots of a list's bottom level into a
/// configurable directory.
pub struct Snapshotter {
    dir: PathBuf,
}

impl Snapshotter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize the list's pairs, in ascending key order, to
    /// `<dir>/<basename>_<YYYY-MM-DD_HH-MM-SS>.json`. Returns the path
    /// written.
    pub fn save<K, V>(
        &self,
        list: &SkipList<K, V>,
        basename: &str,
    ) -> Result<PathBuf, SnapshotError>
    where
        K: Ord + Default + Clone + Serialize,
        V: Default + Clone + Serialize,
    {
        fs::create_dir_all(&self.dir)?;
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = self.dir.join(format!("{}_{}.json", basename, stamp));

        let entries: Vec<SnapshotEntry<K, V>> = list
            .entries()
            .into_iter()
            .map(|(key, value)| SnapshotEntry { key, value })
            .collect();

        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(writer, &entries)?;

        log_info!(
            "saved ",
            entries.len(),
            " elements to ",
            path.display().to_string(),
        );
        Ok(path)
    }
}

/// Parse a snapshot file and insert its elements into `list`.
///
/// The file must hold a JSON array; anything else is an error. Individual
/// elements that are not objects, lack `key`/`value`, or carry mismatched
/// types are counted as skipped and do not abort the load.
pub fn load_snapshot<K, V>(
    list: &SkipList<K, V>,
    path: &Path,
) -> Result<LoadOutcome, SnapshotError>
where
    K: Ord + Default + DeserializeOwned,
    V: Default + DeserializeOwned,
{
    let reader = BufReader::new(File::open(path)?);
    let document: serde_json::Value = serde_json::from_reader(reader)?;
    let elements = match document.as_array() {
        Some(elements) => elements,
        None => {
            log_error!(
                "snapshot ",
                path.display().to_string(),
                " does not contain an array",
            );
            return Err(SnapshotError::NotAnArray);
        }
    };

    let mut outcome = LoadOutcome {
        loaded: 0,
        skipped: 0,
    };
    for (index, element) in elements.iter().enumerate() {
        match serde_json::from_value::<SnapshotEntry<K, V>>(element.clone()) {
            Ok(entry) => {
                list.insert(entry.key, entry.value);
                outcome.loaded += 1;
            }
            Err(err) => {
                log_warn!(
                    "skipping snapshot element ",
                    index,
                    ": ",
                    err.to_string(),
                );
                outcome.skipped += 1;
            }
        }
    }

    log_info!(
        "loaded ",
        outcome.loaded,
        " elements from ",
        path.display().to_string(),
    );
    Ok(outcome)
}
