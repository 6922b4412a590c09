//! Delta envelopes: a delta pinned to the snapshots it was computed between.

use std::fmt;

use sd_diff::{apply_diff_with, compute_diff_with, EngineConfig, SchemaDelta};
use sd_tree::{SchemaNode, TreeDigest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// What a replica has to do to reach the target snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaPayload {
    /// Patch the held tree in place.
    Patch(SchemaDelta),
    /// The roots were incomparable: replace the held tree wholesale.
    Replace(SchemaNode),
}

/// A delta plus the digests of its pre-image and post-image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEnvelope {
    pub format_version: u32,
    /// Unique name of the before-state root.
    pub root: String,
    /// Digest the receiving tree must have before applying.
    pub base_digest: TreeDigest,
    /// Digest the receiving tree must have after applying.
    pub target_digest: TreeDigest,
    pub payload: DeltaPayload,
}

impl DeltaEnvelope {
    /// Diff `before` against `after` and pin the result to both snapshots.
    pub fn seal(
        before: &SchemaNode,
        after: &SchemaNode,
        config: &EngineConfig,
    ) -> CodecResult<Self> {
        let payload = match compute_diff_with(before, after, config)? {
            Some(delta) => DeltaPayload::Patch(delta),
            None => {
                debug!("roots incomparable; sealing full replacement");
                DeltaPayload::Replace(after.clone())
            }
        };
        Ok(Self {
            format_version: ENVELOPE_VERSION,
            root: before.unique_name(),
            base_digest: TreeDigest::of(before),
            target_digest: TreeDigest::of(after),
            payload,
        })
    }

    /// Returns `true` if the envelope carries a whole replacement tree.
    pub fn is_replacement(&self) -> bool {
        matches!(self.payload, DeltaPayload::Replace(_))
    }

    /// Returns `true` if applying the envelope changes nothing.
    pub fn is_noop(&self) -> bool {
        self.base_digest == self.target_digest
    }

    /// The carried delta, if this is an incremental envelope.
    pub fn delta(&self) -> Option<&SchemaDelta> {
        match &self.payload {
            DeltaPayload::Patch(delta) => Some(delta),
            DeltaPayload::Replace(_) => None,
        }
    }

    /// Bring `tree` from the base snapshot to the target snapshot.
    ///
    /// With digest verification on, a tree that is not the expected pre-image
    /// is rejected before any mutation. A post-image mismatch is reported
    /// after patching; either way the replica must resynchronize.
    pub fn apply_to(
        &self,
        tree: &mut SchemaNode,
        engine: &EngineConfig,
        codec: &CodecConfig,
    ) -> CodecResult<()> {
        if self.format_version != ENVELOPE_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: self.format_version,
                supported: ENVELOPE_VERSION,
            });
        }
        if codec.verify_digests {
            check_digest("base", &self.base_digest, tree)?;
        }

        match &self.payload {
            DeltaPayload::Patch(delta) => apply_diff_with(tree, delta, engine)?,
            DeltaPayload::Replace(node) => *tree = node.clone(),
        }

        if codec.verify_digests {
            check_digest("target", &self.target_digest, tree)?;
        }
        debug!(root = %self.root, target = %self.target_digest.short_hex(), "envelope applied");
        Ok(())
    }
}

fn check_digest(which: &'static str, expected: &TreeDigest, tree: &SchemaNode) -> CodecResult<()> {
    let actual = TreeDigest::of(tree);
    if actual != *expected {
        warn!(which, %expected, %actual, "digest mismatch; resync required");
        return Err(CodecError::DigestMismatch {
            which,
            expected: *expected,
            actual,
        });
    }
    Ok(())
}

impl fmt::Display for DeltaEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ENVELOPE v{} for {}", self.format_version, self.root)?;
        writeln!(f, "BASE: {}", self.base_digest)?;
        writeln!(f, "TARGET: {}", self.target_digest)?;
        match &self.payload {
            DeltaPayload::Patch(delta) => write!(f, "{delta}"),
            DeltaPayload::Replace(node) => writeln!(f, "REPLACE WITH:\n{node}"),
        }
    }
}
