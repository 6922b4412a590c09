use std::io;

use sd_diff::{DiffError, PatchError};
use sd_tree::TreeDigest;
use thiserror::Error;

/// Errors produced while sealing, framing or applying delta envelopes.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("bad frame magic: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unknown payload format: {0:#04x}")]
    UnknownFormat(u8),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("incomplete frame: have {have}, need {need}")]
    Incomplete { have: usize, need: usize },

    #[error("frame checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("unsupported envelope version {found} (supported {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("{which} digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch {
        which: &'static str,
        expected: TreeDigest,
        actual: TreeDigest,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("diff rejected: {0}")]
    Diff(#[from] DiffError),

    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Whether the receiving replica must resynchronize its whole schema.
    pub fn requires_resync(&self) -> bool {
        match self {
            Self::Patch(e) => e.requires_resync(),
            Self::DigestMismatch { .. } => true,
            _ => false,
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
