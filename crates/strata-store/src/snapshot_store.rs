//! Typed snapshot and marker access over an object store
//!
//! Every object written by a run goes through here. Keys follow
//! [`crate::keys`]; bodies are the snapshot JSON codec, and the marker is the
//! bare run timestamp as UTF-8.

use crate::errors::{archive_collision, object_missing, Result};
use crate::keys::{self, Namespace, SnapshotKey, MARKER_KEY};
use sha2::{Digest, Sha256};
use strata_core::errors::{ExError, ExErrorKind};
use strata_core::{ObjectStore, RunTimestamp, Snapshot};

/// Result of archiving a live snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// A new archive entry was written
    Archived,
    /// An identical archive entry already existed (retry of an earlier run)
    AlreadyArchived,
}

/// Snapshot persistence over an injected [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct SnapshotStore<O: ObjectStore> {
    objects: O,
}

impl<O: ObjectStore> SnapshotStore<O> {
    pub fn new(objects: O) -> Self {
        Self { objects }
    }

    /// The underlying object store
    pub fn objects(&self) -> &O {
        &self.objects
    }

    /// Write `snapshot` as the live snapshot of `table` for `run_ts`
    ///
    /// # Errors
    ///
    /// `Serialization` if encoding fails, `StoreIo` if the write fails.
    pub fn put(&self, table: &str, run_ts: &RunTimestamp, snapshot: &Snapshot) -> Result<()> {
        let key = SnapshotKey::live(table, run_ts)?;
        let bytes = snapshot
            .to_json_bytes()
            .map_err(|e| ExError::from(e).with_op("put_snapshot").with_key(key.object_key()))?;

        self.objects.put(&key.object_key(), &bytes)?;
        tracing::debug!(
            key = %key,
            rows = snapshot.row_count(),
            bytes = bytes.len(),
            "Wrote snapshot"
        );
        Ok(())
    }

    /// Live snapshot of `table` for `run_ts`, `None` if absent
    ///
    /// # Errors
    ///
    /// `InvalidSnapshot` if the stored bytes do not decode, `StoreIo` if the
    /// read fails.
    pub fn get(&self, table: &str, run_ts: &RunTimestamp) -> Result<Option<Snapshot>> {
        self.get_at(&SnapshotKey::live(table, run_ts)?)
    }

    /// Snapshot at an explicit key, `None` if absent
    ///
    /// # Errors
    ///
    /// See [`SnapshotStore::get`].
    pub fn get_at(&self, key: &SnapshotKey) -> Result<Option<Snapshot>> {
        let object_key = key.object_key();
        let Some(bytes) = self.objects.get(&object_key)? else {
            return Ok(None);
        };

        let snapshot = Snapshot::from_json_bytes(&bytes).map_err(|e| {
            ExError::from(e)
                .with_op("get_snapshot")
                .with_table(key.table())
                .with_key(object_key.clone())
        })?;
        Ok(Some(snapshot))
    }

    /// SHA-256 of the stored bytes of `table`'s live snapshot, hex encoded
    ///
    /// Equal digests across runs mean the snapshot was carried forward.
    ///
    /// # Errors
    ///
    /// `StoreIo` if the read fails.
    pub fn digest(&self, table: &str, run_ts: &RunTimestamp) -> Result<Option<String>> {
        let key = SnapshotKey::live(table, run_ts)?;
        Ok(self
            .objects
            .get(&key.object_key())?
            .map(|bytes| hex::encode(Sha256::digest(&bytes))))
    }

    /// Byte-for-byte copy of one snapshot object to another key
    ///
    /// # Errors
    ///
    /// `NotFound` if `from` does not exist, `StoreIo` on write failure.
    pub fn copy(&self, from: &SnapshotKey, to: &SnapshotKey) -> Result<()> {
        self.objects.copy(&from.object_key(), &to.object_key())
    }

    /// Copy the live snapshot of `table` at `run_ts` into the archive
    ///
    /// Archive entries are write-once: an existing entry with identical bytes
    /// is left alone, one with different bytes is a collision.
    ///
    /// # Errors
    ///
    /// `NotFound` if the live snapshot is absent, `ConstraintViolation` on a
    /// collision, `StoreIo` on backend failure.
    pub fn archive(&self, table: &str, run_ts: &RunTimestamp) -> Result<ArchiveOutcome> {
        let live = SnapshotKey::live(table, run_ts)?;
        let archived = live.in_namespace(Namespace::Archive);
        let (live_key, archive_key) = (live.object_key(), archived.object_key());

        if let Some(existing) = self.objects.get(&archive_key)? {
            let current = self
                .objects
                .get(&live_key)?
                .ok_or_else(|| object_missing("archive", &live_key).with_table(table))?;
            if existing != current {
                return Err(archive_collision(&archive_key).with_table(table));
            }
            tracing::debug!(key = %archive_key, "Archive entry already present");
            return Ok(ArchiveOutcome::AlreadyArchived);
        }

        self.objects
            .copy(&live_key, &archive_key)
            .map_err(|e| e.with_table(table))?;
        tracing::debug!(from = %live_key, to = %archive_key, "Archived snapshot");
        Ok(ArchiveOutcome::Archived)
    }

    /// Copy the stored bytes of `table`'s live snapshot from one run to another
    ///
    /// # Errors
    ///
    /// `NotFound` if the source snapshot is absent, `StoreIo` on write failure.
    pub fn carry_forward(
        &self,
        table: &str,
        from: &RunTimestamp,
        to: &RunTimestamp,
    ) -> Result<()> {
        let source = SnapshotKey::live(table, from)?;
        let target = SnapshotKey::live(table, to)?;
        self.copy(&source, &target).map_err(|e| e.with_table(table))?;
        tracing::debug!(from = %source, to = %target, "Carried snapshot forward");
        Ok(())
    }

    /// Remove the live snapshot of `table` at `run_ts`; absent is fine
    ///
    /// # Errors
    ///
    /// `StoreIo` on backend failure.
    pub fn delete(&self, table: &str, run_ts: &RunTimestamp) -> Result<()> {
        let key = SnapshotKey::live(table, run_ts)?;
        self.objects.delete(&key.object_key())
    }

    /// Timestamp of the last fully successful run, `None` before the first
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the marker holds an unusable value, `StoreIo` if the
    /// read fails.
    pub fn get_marker(&self) -> Result<Option<RunTimestamp>> {
        let Some(bytes) = self.objects.get(MARKER_KEY)? else {
            return Ok(None);
        };

        let text = String::from_utf8(bytes).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("get_marker")
                .with_key(MARKER_KEY)
                .with_message(format!("marker is not UTF-8: {}", e))
        })?;
        let run_ts = RunTimestamp::parse(&text).map_err(|e| e.with_key(MARKER_KEY))?;
        Ok(Some(run_ts))
    }

    /// # Errors
    ///
    /// `StoreIo` if the write fails.
    pub fn set_marker(&self, run_ts: &RunTimestamp) -> Result<()> {
        self.objects.put(MARKER_KEY, run_ts.as_str().as_bytes())?;
        tracing::debug!(run_ts = %run_ts, "Updated run marker");
        Ok(())
    }

    /// Keys under `prefix` with the prefix stripped, sorted
    ///
    /// # Errors
    ///
    /// `StoreIo` if the listing fails.
    pub fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = self.objects.list(prefix)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(prefix).map(str::to_string))
            .filter(|suffix| !suffix.is_empty())
            .collect())
    }

    /// Tables with a live snapshot for `run_ts`, sorted
    ///
    /// # Errors
    ///
    /// `StoreIo` if the listing fails.
    pub fn list_live_tables(&self, run_ts: &RunTimestamp) -> Result<Vec<String>> {
        let suffixes = self.list_keys(&keys::run_prefix(Namespace::Live, run_ts))?;
        Ok(suffixes
            .iter()
            .filter_map(|s| keys::table_from_suffix(s))
            .map(str::to_string)
            .collect())
    }
}
