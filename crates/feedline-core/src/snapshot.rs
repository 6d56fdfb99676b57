//! Snapshot support for the feeding-line engine.
//!
//! Binary serialization via `bitcode` with a versioned header, and a
//! fixed-capacity ring buffer of snapshots for rewind and replay.

use crate::engine::Engine;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a feeding-line snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xFEED_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("path index {index} out of range for {path_count} paths")]
    PathIndexOutOfRange { index: usize, path_count: usize },
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot. Enables format
/// detection and version checking before the payload is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Raw bits of the elapsed clock at the time of the snapshot.
    pub elapsed_bits: i64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(elapsed_bits: i64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            elapsed_bits,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// The full serialized payload: header plus the engine (config and
/// line state). Everything in the engine is plain data, so nothing
/// needs to be excluded or rebuilt on load.
#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    engine: Engine,
}

// ---------------------------------------------------------------------------
// SnapshotRingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer of serialized snapshots.
///
/// When the buffer is full, the oldest snapshot is evicted.
#[derive(Debug)]
pub struct SnapshotRingBuffer {
    entries: Vec<Option<SnapshotEntry>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total snapshots ever taken (including evicted).
    total_taken: u64,
}

/// A single entry in the snapshot ring buffer.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    /// Raw clock bits at which the snapshot was taken.
    pub elapsed_bits: i64,
    /// Serialized engine state (bitcode bytes).
    pub data: Vec<u8>,
}

impl SnapshotRingBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_taken: 0,
        }
    }

    /// Push a snapshot. If full, the oldest entry is evicted.
    pub fn push(&mut self, entry: SnapshotEntry) {
        self.entries[self.head] = Some(entry);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_taken += 1;
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total snapshots ever taken (including evicted).
    pub fn total_taken(&self) -> u64 {
        self.total_taken
    }

    /// Get a snapshot by index (0 = oldest, len-1 = newest).
    pub fn get(&self, index: usize) -> Option<&SnapshotEntry> {
        if index >= self.len {
            return None;
        }
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        let actual_index = (start + index) % self.capacity();
        self.entries[actual_index].as_ref()
    }

    /// Get the most recent snapshot.
    pub fn latest(&self) -> Option<&SnapshotEntry> {
        if self.len == 0 {
            return None;
        }
        self.get(self.len - 1)
    }

    /// Clear all snapshots. `total_taken` is not reset.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// Engine serialization methods
// ---------------------------------------------------------------------------

impl Engine {
    /// Serialize the engine to a binary blob via bitcode.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.state().elapsed.to_bits()),
            engine: self.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Deserialize an engine from a binary blob.
    ///
    /// The header is validated (magic, version) before the payload is
    /// accepted, and every path index carried by the payload is
    /// range-checked so a corrupt snapshot cannot index past the path
    /// list later. Mismatches are errors, not panics.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        snapshot.engine.check_path_indices()?;
        Ok(snapshot.engine)
    }

    /// Range-check every path index a decoded state carries.
    fn check_path_indices(&self) -> Result<(), DeserializeError> {
        let s = self.state();
        let path_count = s.paths.len();
        let carried = [
            Some(s.last_active_path_id),
            s.active_target,
            s.last_distributed_id,
        ];
        for index in carried.into_iter().flatten() {
            if index >= path_count {
                return Err(DeserializeError::PathIndexOutOfRange { index, path_count });
            }
        }
        for (slot, path) in s.paths.iter().enumerate() {
            if path.id != slot {
                return Err(DeserializeError::PathIndexOutOfRange {
                    index: path.id,
                    path_count,
                });
            }
        }
        Ok(())
    }

    /// Take a snapshot of the current engine state and store it in the
    /// provided ring buffer.
    pub fn take_snapshot(&self, buffer: &mut SnapshotRingBuffer) -> Result<(), SerializeError> {
        let data = self.serialize()?;
        buffer.push(SnapshotEntry {
            elapsed_bits: self.state().elapsed.to_bits(),
            data,
        });
        Ok(())
    }

    /// Restore an engine from a snapshot in the ring buffer.
    ///
    /// `index` is 0-based from oldest (0) to newest (len-1).
    /// Returns `None` if the index is out of range.
    pub fn restore_snapshot(
        buffer: &SnapshotRingBuffer,
        index: usize,
    ) -> Result<Option<Engine>, DeserializeError> {
        let Some(entry) = buffer.get(index) else {
            return Ok(None);
        };
        let engine = Engine::deserialize(&entry.data)?;
        Ok(Some(engine))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
