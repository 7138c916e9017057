use std::path::Path;

use anyhow::Context;

use crate::capture::animation::SceneAnimation;
use crate::codec::checkpoint::CheckpointStore;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::playback::engine::{PlaybackConfig, PlaybackEngine};
use crate::playback::store::FrameStore;

/// Self-contained playable document: encoded frames plus playback settings.
///
/// Serialized as JSON tagged by `kind` (`"diff"` for a checkpointed frame diff sequence,
/// `"scene"` for an incremental scene capture).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// Checkpoints plus edit scripts over opaque frames.
    Diff {
        /// Playback settings.
        playback: PlaybackConfig,
        /// Encoded frames.
        store: CheckpointStore,
    },
    /// Base document plus per-frame element fragments.
    Scene {
        /// Playback settings.
        playback: PlaybackConfig,
        /// Captured frames.
        animation: SceneAnimation,
    },
}

impl Artifact {
    /// Wrap an encoded frame sequence.
    pub fn diff(store: CheckpointStore, playback: PlaybackConfig) -> Self {
        Self::Diff { playback, store }
    }

    /// Wrap a finalized scene capture.
    pub fn scene(animation: SceneAnimation, playback: PlaybackConfig) -> Self {
        Self::Scene {
            playback,
            animation,
        }
    }

    /// Wire name of the encoding.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Diff { .. } => "diff",
            Self::Scene { .. } => "scene",
        }
    }

    /// Playback settings.
    pub fn playback(&self) -> &PlaybackConfig {
        match self {
            Self::Diff { playback, .. } | Self::Scene { playback, .. } => playback,
        }
    }

    /// Borrow the frames as a [`FrameStore`].
    pub fn store(&self) -> &dyn FrameStore {
        match self {
            Self::Diff { store, .. } => store,
            Self::Scene { animation, .. } => animation,
        }
    }

    /// Number of playable frames.
    pub fn frame_count(&self) -> usize {
        self.store().frame_count()
    }

    /// Rebuild frame `index`.
    pub fn reconstruct(&self, index: FrameIndex) -> FlipbookResult<String> {
        self.store().reconstruct(index)
    }

    /// Check playback settings and encoding invariants.
    pub fn validate(&self) -> FlipbookResult<()> {
        self.playback().validate()?;
        match self {
            Self::Diff { store, .. } => store.validate(),
            Self::Scene { animation, .. } => animation.validate(),
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> FlipbookResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an artifact.
    pub fn from_json(json: &str) -> FlipbookResult<Self> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> FlipbookResult<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("write artifact '{}'", path.display()))?;
        Ok(())
    }

    /// Read and validate an artifact from `path`.
    pub fn read_from(path: &Path) -> FlipbookResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read artifact '{}'", path.display()))?;
        Self::from_json(&json).map_err(|e| match e {
            FlipbookError::Serde(msg) => FlipbookError::serde(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Open the artifact for playback with its own settings.
    pub fn into_engine(self) -> FlipbookResult<PlaybackEngine<Box<dyn FrameStore>>> {
        let (playback, store): (PlaybackConfig, Box<dyn FrameStore>) = match self {
            Self::Diff { playback, store } => (playback, Box::new(store)),
            Self::Scene {
                playback,
                animation,
            } => (playback, Box::new(animation)),
        };
        PlaybackEngine::new(store, &playback)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artifact/document.rs"]
mod tests;
