//! Durable segment store on the local filesystem.
//!
//! Layout under the store root:
//!
//! ```text
//! index.toml              manifest: insertion order, ids, mime types
//! 00000000000000000007.seg  one payload file per segment
//! ```
//!
//! Payloads and the manifest are written with the temp-file-then-rename
//! pattern so a crash mid-write never leaves a torn file behind. The
//! manifest is the source of truth; a payload without a manifest entry is
//! ignored and a manifest entry without a payload is not counted and is
//! dropped from the manifest on the next read.

use crate::{
    CoreResult, RelayError,
    store::{Segment, SegmentStore},
};

use std::{
    fs,
    io::{ErrorKind as IoErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

const MANIFEST_FILE: &str = "index.toml";
const PAYLOAD_EXTENSION: &str = "seg";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    next_seq: u64,
    #[serde(default)]
    segments: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    id: String,
    seq: u64,
    mime_type: String,
    file: String,
    created_at_ms: i64,
}

/// Segment store backed by a directory of payload files and a manifest.
pub struct FileSegmentStore {
    root: PathBuf,
    /// Serializes manifest read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileSegmentStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StorageError`] if the directory cannot be
    /// created or the existing manifest cannot be parsed.
    #[track_caller]
    #[instrument(skip_all)]
    pub fn open(root: impl AsRef<Path>) -> CoreResult<Self> {
        let store = Self {
            root: root.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };

        store.ensure_root()?;
        let manifest = store.load_manifest()?;

        info!(
            root = %store.root.display(),
            pending = manifest.segments.len(),
            "Segment store opened"
        );

        Ok(store)
    }

    /// Directory this store lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| {
            error!("Segment store lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    #[track_caller]
    fn ensure_root(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            RelayError::storage(format!(
                "Failed to create store directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    #[track_caller]
    fn load_manifest(&self) -> CoreResult<Manifest> {
        let path = self.manifest_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Manifest::default()),
            Err(e) => {
                return Err(RelayError::storage(format!(
                    "Failed to read manifest: {}",
                    e
                )));
            }
        };

        toml::from_str(&contents)
            .map_err(|e| RelayError::storage(format!("Failed to parse manifest: {}", e)))
    }

    #[track_caller]
    fn save_manifest(&self, manifest: &Manifest) -> CoreResult<()> {
        let contents = toml::to_string_pretty(manifest)
            .map_err(|e| RelayError::storage(format!("Failed to serialize manifest: {}", e)))?;
        write_atomic(&self.manifest_path(), contents.as_bytes())
    }
}

impl SegmentStore for FileSegmentStore {
    #[track_caller]
    #[instrument(skip(self, segment), fields(segment_id = %segment.id, bytes = segment.len()))]
    fn put(&self, segment: &Segment) -> CoreResult<()> {
        let _guard = self.guard();
        self.ensure_root()?;

        let mut manifest = self.load_manifest()?;
        if manifest.segments.iter().any(|e| e.id == segment.id) {
            return Err(RelayError::storage(format!(
                "Segment {} already stored",
                segment.id
            )));
        }

        let seq = manifest.next_seq;
        let file = format!("{:020}.{}", seq, PAYLOAD_EXTENSION);
        write_atomic(&self.root.join(&file), &segment.payload)?;

        manifest.next_seq = seq + 1;
        manifest.segments.push(ManifestEntry {
            id: segment.id.clone(),
            seq,
            mime_type: segment.mime_type.clone(),
            file: file.clone(),
            created_at_ms: segment.created_at_ms,
        });

        if let Err(e) = self.save_manifest(&manifest) {
            // Without a manifest entry the payload is unreachable.
            let _ = fs::remove_file(self.root.join(&file));
            return Err(e);
        }

        debug!(seq, file = %file, "Segment persisted");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn list_all(&self) -> CoreResult<Vec<Segment>> {
        let _guard = self.guard();
        let mut manifest = self.load_manifest()?;
        manifest.segments.sort_by_key(|e| e.seq);

        let mut segments = Vec::with_capacity(manifest.segments.len());
        let mut dangling = Vec::new();
        for entry in &manifest.segments {
            match fs::read(self.root.join(&entry.file)) {
                Ok(payload) => segments.push(Segment {
                    id: entry.id.clone(),
                    payload,
                    mime_type: entry.mime_type.clone(),
                    created_at_ms: entry.created_at_ms,
                }),
                Err(e) if e.kind() == IoErrorKind::NotFound => {
                    warn!(segment_id = %entry.id, file = %entry.file, "Segment payload missing, dropping entry");
                    dangling.push(entry.id.clone());
                }
                Err(e) => {
                    return Err(RelayError::storage(format!(
                        "Failed to read segment {}: {}",
                        entry.id, e
                    )));
                }
            }
        }

        if !dangling.is_empty() {
            manifest.segments.retain(|e| !dangling.contains(&e.id));
            self.save_manifest(&manifest)?;
        }

        Ok(segments)
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn delete_by_id(&self, id: &str) -> CoreResult<()> {
        let _guard = self.guard();
        let mut manifest = self.load_manifest()?;

        let Some(position) = manifest.segments.iter().position(|e| e.id == id) else {
            debug!(segment_id = %id, "Segment not in store, nothing to delete");
            return Ok(());
        };

        let entry = manifest.segments.remove(position);
        self.save_manifest(&manifest)?;

        if let Err(e) = fs::remove_file(self.root.join(&entry.file)) {
            warn!(segment_id = %id, error = %e, "Failed to remove segment payload");
        }

        debug!(segment_id = %id, "Segment deleted");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn clear(&self) -> CoreResult<()> {
        let _guard = self.guard();
        let mut manifest = self.load_manifest()?;
        let entries = std::mem::take(&mut manifest.segments);
        self.save_manifest(&manifest)?;

        for entry in &entries {
            if let Err(e) = fs::remove_file(self.root.join(&entry.file)) {
                warn!(segment_id = %entry.id, error = %e, "Failed to remove segment payload");
            }
        }

        info!(removed = entries.len(), "Segment store cleared");

        Ok(())
    }

    #[track_caller]
    fn count(&self) -> CoreResult<usize> {
        let _guard = self.guard();
        let manifest = self.load_manifest()?;
        // Entries whose payload vanished are pruned by the next list_all.
        Ok(manifest
            .segments
            .iter()
            .filter(|e| self.root.join(&e.file).exists())
            .count())
    }
}

#[track_caller]
fn write_atomic(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    let temp_path = path.with_extension("tmp");

    let mut temp_file = fs::File::create(&temp_path)
        .map_err(|e| RelayError::storage(format!("Failed to create temp file: {}", e)))?;

    temp_file
        .write_all(bytes)
        .map_err(|e| RelayError::storage(format!("Failed to write temp file: {}", e)))?;

    temp_file
        .sync_all()
        .map_err(|e| RelayError::storage(format!("Failed to sync temp file: {}", e)))?;

    fs::rename(&temp_path, path)
        .map_err(|e| RelayError::storage(format!("Failed to rename temp file: {}", e)))
}
