//! Error types for the diff crate.

/// Errors that can occur while computing a diff.
///
/// Incomparable roots are not an error: [`compute_diff`](crate::compute_diff)
/// returns `Ok(None)` so the caller can fall back to a whole-tree replace.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// Two siblings share a unique name, so matching them would be ambiguous.
    #[error("duplicate sibling identity {name:?} under {parent:?}")]
    DuplicateIdentity { parent: String, name: String },

    /// Two nodes with different tags derive the same unique name.
    #[error("identity {name:?} shared by tags {before_tag:?} and {after_tag:?}")]
    IdentityCollision {
        name: String,
        before_tag: String,
        after_tag: String,
    },

    /// The trees nest deeper than the configured limit.
    #[error("tree depth exceeds limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Fatal inconsistencies between a delta and the tree it is applied to.
///
/// Every variant means the target was not the pre-image the delta was
/// computed against (or the delta is corrupt). The caller must resynchronize
/// the whole schema rather than retry the patch.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatchError {
    /// The delta was computed for a different node.
    #[error("delta for {expected:?} applied to {actual:?}")]
    TargetMismatch { expected: String, actual: String },

    /// A child the delta removes or changes is not present.
    #[error("child {child:?} missing under {parent:?}")]
    MissingChild { parent: String, child: String },

    /// The target holds several children with the same unique name.
    #[error("duplicate child {child:?} under {parent:?}")]
    DuplicateTargetChild { parent: String, child: String },

    /// The patched sibling count differs from the recorded order.
    #[error("child count {actual} under {parent:?} does not match recorded order of {expected}")]
    OrderCountMismatch {
        parent: String,
        expected: usize,
        actual: usize,
    },

    /// A patched child has no recorded position.
    #[error("child {child:?} under {parent:?} has no recorded position")]
    UnorderedChild { parent: String, child: String },

    /// The recorded order is not a permutation of the sibling positions.
    #[error("invalid position {index} for {child:?} under {parent:?}")]
    InvalidOrderIndex {
        parent: String,
        child: String,
        index: usize,
    },

    /// A nested delta would change the identity of the child it is keyed by.
    #[error("delta for child {child:?} under {parent:?} does not preserve its identity")]
    UnstableIdentity { parent: String, child: String },

    /// The delta nests deeper than the configured limit.
    #[error("delta depth exceeds limit of {limit}")]
    DepthExceeded { limit: usize },
}

impl PatchError {
    /// Whether the caller has to fall back to full-schema resynchronization.
    ///
    /// Always `true`: no patch failure is locally recoverable.
    pub fn requires_resync(&self) -> bool {
        true
    }
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
