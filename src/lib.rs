//! Flipbook packs animation frames into compact, self-contained playable artifacts.
//!
//! Two encodings share one playback engine:
//!
//! - **Frame diff codec**: opaque frames (typically base64 data URIs of rendered images) are
//!   stored as one verbatim checkpoint plus an edit script per consecutive pair. Any frame is
//!   rebuilt by replaying scripts from the nearest checkpoint.
//! - **Incremental scene capture**: a vector scene is serialized once as an SVG base document,
//!   then each frame stores only the elements that changed, keyed by a per-session identity.
//!   Shared definitions (gradients, clip paths) are hoisted into a single container.
//!
//! Both implement [`FrameStore`], which a [`PlaybackEngine`] drives through `once`, `loop`, or
//! `reflect` playback with a deterministic, host-advanced timer. [`Artifact`] bundles either
//! encoding with its playback settings as tagged JSON.
//!
//! Capture is single-writer and sequential; only pairwise diffing fans out over a worker pool.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod artifact;
mod capture;
mod codec;
mod foundation;
mod playback;
mod raster;

pub use crate::artifact::document::Artifact;
pub use crate::capture::animation::{FrameFragments, SceneAnimation, splice_element};
pub use crate::capture::defs::{DEFS_CONTAINER_ID, merge_definitions, verify_references};
pub use crate::capture::identity::{ElementId, IdentityTracker};
pub use crate::capture::renderer::{
    BudgetExceeded, CaptureOpts, CaptureReport, CaptureStep, IncrementalRenderer, capture,
    write_subtree,
};
pub use crate::capture::scene::{SceneGraph, SvgWriter, escape_attr, escape_text};
pub use crate::capture::vector::{
    GradientStop, LinearGradient, NodeKey, Paint, Rgba8, Shape, Stroke, Style, VectorNode,
    VectorScene,
};
pub use crate::codec::checkpoint::CheckpointStore;
pub use crate::codec::diff::{DiffOpts, diff_frames, diff_frames_bounded, diff_sequence};
pub use crate::codec::frames::{
    BASE64_LINE_WIDTH, FrameFormat, Normalization, decode_frame, encode_frame, encode_frame_file,
    normalize_base64, rewrap_base64,
};
pub use crate::codec::patch::{EditKind, EditOp, EditScript, apply_patch};
pub use crate::foundation::config::{
    DEFAULT_DIFF_COST_LIMIT, DEFAULT_INTERVAL_MS, DEFAULT_STORAGE_BUDGET_BYTES, FlipbookConfig,
};
pub use crate::foundation::core::{Direction, FrameIndex, LoopMode};
pub use crate::foundation::error::{FlipbookError, FlipbookResult};
pub use crate::playback::engine::{
    MAX_CATCH_UP_TICKS, MAX_TICK, MIN_TICK, PlaybackConfig, PlaybackEngine, PlaybackState,
    SPEED_FACTOR,
};
pub use crate::playback::store::FrameStore;
pub use crate::raster::svg::{MAX_RASTER_DIM, RasterFrame, rasterize_svg, svg_to_png};

/// Geometry types used by [`VectorScene`].
pub use kurbo::{Affine, BezPath, Point, Rect};
