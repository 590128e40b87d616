//! Append-only file implementation of the URL repository.
//!
//! # File Format
//!
//! One JSON object per line:
//!
//! ```text
//! {"shortUrl":"K7M2QX9PAB","fullUrl":"https://example.com","userId":"u1"}
//! {"shortUrl":"K7M2QX9PAB","fullUrl":"https://example.com","userId":"u1","isDeleted":true}
//! ```
//!
//! The second form is a tombstone appended by a soft-delete. On open the whole
//! file is replayed into memory; any malformed line aborts startup.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use super::url_index::UrlIndex;
use crate::domain::entities::{DeleteRequest, NewUrl, OwnedUrl, RecordState, UrlRecord};
use crate::domain::repositories::{StorageError, UrlRepository};

/// A single persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    short_url: String,
    full_url: String,
    user_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    is_deleted: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl StoredLine {
    fn tombstone(record: &UrlRecord) -> Self {
        Self {
            short_url: record.short_key.clone(),
            full_url: record.original_url.clone(),
            user_id: record.owner_id.clone(),
            is_deleted: true,
        }
    }
}

impl From<&NewUrl> for StoredLine {
    fn from(new_url: &NewUrl) -> Self {
        Self {
            short_url: new_url.short_key.clone(),
            full_url: new_url.original_url.clone(),
            user_id: new_url.owner_id.clone(),
            is_deleted: false,
        }
    }
}

/// Summary of a replayed storage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub records: usize,
    pub deleted: usize,
    pub owners: usize,
}

struct FileState {
    file: File,
    index: UrlIndex,
}

/// Repository persisting every change as an appended JSON line.
///
/// Each append is a single synchronous `write_all` followed by `sync_data`
/// while the write lock is held, so a dropped request future can never leave
/// half a record behind. On a failed write the file is truncated back to its
/// previous length and the in-memory index is left untouched.
pub struct FileUrlRepository {
    path: PathBuf,
    state: RwLock<FileState>,
}

impl FileUrlRepository {
    /// Opens (or creates) the storage file and replays it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be opened or read, and
    /// [`StorageError::Corrupted`] if any line fails to parse or contradicts
    /// an earlier one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let index = replay(&file)?;

        info!(
            "Loaded {} records ({} deleted) from {}",
            index.len(),
            index.deleted_count(),
            path.display()
        );

        Ok(Self {
            path,
            state: RwLock::new(FileState { file, index }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns record counts from the in-memory index.
    pub async fn stats(&self) -> FileStats {
        let state = self.state.read().await;
        FileStats {
            records: state.index.len(),
            deleted: state.index.deleted_count(),
            owners: state.index.owner_count(),
        }
    }
}

fn replay(file: &File) -> Result<UrlIndex, StorageError> {
    let mut index = UrlIndex::default();

    for (position, line) in BufReader::new(file).lines().enumerate() {
        let line_no = position + 1;
        let line = line?;

        let stored: StoredLine =
            serde_json::from_str(&line).map_err(|e| StorageError::Corrupted {
                line: line_no,
                reason: e.to_string(),
            })?;

        apply_line(&mut index, stored).map_err(|reason| StorageError::Corrupted {
            line: line_no,
            reason,
        })?;
    }

    Ok(index)
}

fn apply_line(index: &mut UrlIndex, stored: StoredLine) -> Result<(), String> {
    if let Some(existing) = index.record(&stored.short_url) {
        if existing.original_url != stored.full_url {
            return Err(format!(
                "key {} remapped from {} to {}",
                stored.short_url, existing.original_url, stored.full_url
            ));
        }

        if stored.is_deleted {
            index.mark_deleted(&stored.short_url);
        }

        return Ok(());
    }

    let new_url = NewUrl::new(stored.short_url, stored.full_url, stored.user_id);

    match RecordState::from_flag(stored.is_deleted) {
        RecordState::Active => {
            index.check_insert(&new_url).map_err(|e| e.to_string())?;
            index.insert(new_url.into());
        }
        state => {
            let mut record = UrlRecord::from(new_url);
            record.state = state;
            index.insert(record);
        }
    }

    Ok(())
}

/// Appends lines as one write and flushes them to disk.
fn append_lines(file: &mut File, lines: &[StoredLine]) -> Result<(), StorageError> {
    let mut buffer = Vec::new();
    for line in lines {
        serde_json::to_writer(&mut buffer, line)?;
        buffer.push(b'\n');
    }

    let previous_len = file.metadata()?.len();

    // Blocking I/O with no await point in between, so a dropped caller never
    // interrupts a record halfway. Each append costs one fsync on the runtime
    // thread while the write lock is held; writers queue behind it.
    let written = file
        .write_all(&buffer)
        .and_then(|_| file.sync_data());

    if let Err(e) = written {
        error!("Failed to append to storage file: {}", e);
        if let Err(truncate_err) = file.set_len(previous_len) {
            error!("Failed to roll back partial append: {}", truncate_err);
        }
        return Err(e.into());
    }

    Ok(())
}

#[async_trait]
impl UrlRepository for FileUrlRepository {
    async fn save(&self, new_url: NewUrl) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.index.check_insert(&new_url)?;

        append_lines(&mut state.file, &[StoredLine::from(&new_url)])?;
        state.index.insert(new_url.into());
        Ok(())
    }

    async fn save_batch(&self, batch: Vec<NewUrl>) -> Result<(), StorageError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        state.index.check_batch(&batch)?;

        let lines: Vec<StoredLine> = batch.iter().map(StoredLine::from).collect();
        append_lines(&mut state.file, &lines)?;

        for new_url in batch {
            state.index.insert(new_url.into());
        }

        Ok(())
    }

    async fn get(&self, short_key: &str) -> Result<Option<String>, StorageError> {
        self.state.read().await.index.get(short_key)
    }

    async fn exists(&self, short_key: &str) -> Result<bool, StorageError> {
        Ok(self.state.read().await.index.contains(short_key))
    }

    async fn find_by_original_url(&self, _original_url: &str) -> Result<String, StorageError> {
        Err(StorageError::Unsupported("find_by_original_url"))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnedUrl>, StorageError> {
        Ok(self.state.read().await.index.list_by_owner(owner_id))
    }

    async fn delete_batch(&self, requests: &[DeleteRequest]) -> Result<u64, StorageError> {
        let mut state = self.state.write().await;

        let pending = state.index.pending_deletes(requests);
        if pending.is_empty() {
            return Ok(0);
        }

        let tombstones: Vec<StoredLine> = pending.iter().map(StoredLine::tombstone).collect();
        append_lines(&mut state.file, &tombstones)?;

        let mut deleted = 0;
        for record in &pending {
            if state.index.mark_deleted(&record.short_key) {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
