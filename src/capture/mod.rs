//! Incremental scene capture.
//!
//! A scene is serialized in full once; afterwards only the elements reported as changed are
//! re-serialized, each wrapped in an identity group that playback splices over the previous one.

/// Finalized captures and frame composition.
pub mod animation;
/// Shared definition merging.
pub mod defs;
/// Element identity registry.
pub mod identity;
/// Capture sessions.
pub mod renderer;
/// Scene graph capability and markup writer.
pub mod scene;
/// Built-in vector scene.
pub mod vector;
