use std::io;

use thiserror::Error;

use crate::chunk::ChunkTag;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Bad file header, expected {expected} but found {found}")]
    InvalidFormat { expected: ChunkTag, found: ChunkTag },
    #[error("Chunk {chunk} declares {expected} bytes, but only {available} left")]
    TruncatedStream {
        chunk: ChunkTag,
        expected: u64,
        available: u64,
    },
    #[error("Chunk {chunk} has bad layout: element size {element_size}, count {element_count}")]
    InvalidChunk {
        chunk: ChunkTag,
        element_size: i32,
        element_count: i32,
    },
    #[error("Chunk {chunk} has records of {found} bytes, at least {expected} required")]
    RecordSize {
        chunk: ChunkTag,
        expected: usize,
        found: usize,
    },
    #[error("Bad {kind} index {index} in record #{record}, only {len} available")]
    InvalidIndex {
        kind: &'static str,
        record: usize,
        index: i64,
        len: usize,
    },
    #[error("Format error: {0}")]
    Format(#[from] binrw::Error),
    #[error("Bone #{bone} ({name:?}) has unresolvable parent index {parent_index}")]
    SkeletonIntegrity {
        bone: usize,
        name: String,
        parent_index: i32,
    },
    #[error("Clip {name:?} has bad size: {bone_count} bones, {frame_count} frames")]
    InvalidClip {
        name: String,
        bone_count: i32,
        frame_count: i32,
    },
    #[error("No bone in the animation matches the target skeleton")]
    NoMatchingBones,
    #[error("Raw key count mismatch: clips expect {expected}, file has {actual}")]
    KeyCountMismatch { expected: u64, actual: u64 },
}

impl ImportError {
    /// Whether the caller may skip the failed import and keep going.
    ///
    /// Only [`ImportError::NoMatchingBones`] qualifies: the animation file is valid
    /// but does not apply to the chosen skeleton.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImportError::NoMatchingBones)
    }
}
