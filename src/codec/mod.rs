//! Frame diff codec.
//!
//! Consecutive frames are diffed into edit scripts. A
//! [`CheckpointStore`](checkpoint::CheckpointStore) keeps frame 0 verbatim and rebuilds any other
//! frame by replaying scripts.

/// Checkpoints plus edit-script chains.
pub mod checkpoint;
/// Sequence alignment and pairwise diffing.
pub mod diff;
/// Data URI framing and base64 normalization.
pub mod frames;
/// Edit operations and the patch applier.
pub mod patch;
