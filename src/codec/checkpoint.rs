use std::collections::BTreeMap;

use crate::codec::diff::{DiffOpts, diff_sequence};
use crate::codec::frames::Normalization;
use crate::codec::patch::{EditScript, apply_patch};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::playback::store::FrameStore;

/// Frames stored verbatim (always frame 0) plus the chain of edit scripts between consecutive
/// frames.
///
/// `scripts[k]` turns frame `k` into frame `k + 1`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CheckpointStore {
    #[serde(with = "checkpoint_list")]
    checkpoints: BTreeMap<FrameIndex, String>,
    scripts: Vec<EditScript>,
    #[serde(default)]
    normalization: Normalization,
}

impl CheckpointStore {
    /// Encode a frame sequence: normalize, diff consecutive pairs, and keep the checkpoints.
    #[tracing::instrument(skip(frames, opts), fields(frames = frames.len()))]
    pub fn from_frames<F: AsRef<str>>(frames: &[F], opts: &DiffOpts) -> FlipbookResult<Self> {
        if frames.is_empty() {
            return Err(FlipbookError::validation(
                "cannot encode an empty frame sequence",
            ));
        }
        if opts.checkpoint_interval == Some(0) {
            return Err(FlipbookError::validation(
                "checkpoint_interval must be >= 1 when set",
            ));
        }

        let normalized: Vec<String> = frames
            .iter()
            .map(|f| opts.normalization.apply(f.as_ref()))
            .collect();
        let scripts = diff_sequence(&normalized, opts)?;

        let mut checkpoints = BTreeMap::new();
        for (idx, frame) in normalized.into_iter().enumerate() {
            let keep = idx == 0 || opts.checkpoint_interval.is_some_and(|n| idx % n == 0);
            if keep {
                checkpoints.insert(FrameIndex(idx), frame);
            }
        }

        Ok(Self {
            checkpoints,
            scripts,
            normalization: opts.normalization,
        })
    }

    /// Assemble a store from parts, validating its invariants.
    pub fn from_parts(
        checkpoints: BTreeMap<FrameIndex, String>,
        scripts: Vec<EditScript>,
        normalization: Normalization,
    ) -> FlipbookResult<Self> {
        let store = Self {
            checkpoints,
            scripts,
            normalization,
        };
        store.validate()?;
        Ok(store)
    }

    /// Check that frame 0 is a checkpoint and every checkpoint addresses a frame.
    pub fn validate(&self) -> FlipbookResult<()> {
        if !self.checkpoints.contains_key(&FrameIndex::FIRST) {
            return Err(FlipbookError::validation("frame 0 must be a checkpoint"));
        }
        let count = self.frame_count();
        if let Some((last, _)) = self.checkpoints.last_key_value()
            && !last.in_bounds(count)
        {
            return Err(FlipbookError::validation(format!(
                "checkpoint {last} out of range for {count} frames"
            )));
        }
        Ok(())
    }

    /// Verbatim frames keyed by index.
    pub fn checkpoints(&self) -> &BTreeMap<FrameIndex, String> {
        &self.checkpoints
    }

    /// Edit scripts in sequence order.
    pub fn scripts(&self) -> &[EditScript] {
        &self.scripts
    }

    /// Normalization applied to frames before they were stored.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Return `true` when `index` is stored verbatim.
    pub fn is_checkpoint(&self, index: FrameIndex) -> bool {
        self.checkpoints.contains_key(&index)
    }

    /// Characters stored across checkpoints and script payloads.
    pub fn stored_chars(&self) -> usize {
        let frames: usize = self.checkpoints.values().map(|f| f.chars().count()).sum();
        let scripts: usize = self.scripts.iter().map(EditScript::payload_chars).sum();
        frames + scripts
    }

    fn replay(
        &self,
        mut frame: String,
        from: FrameIndex,
        to: FrameIndex,
    ) -> FlipbookResult<String> {
        for (offset, script) in self.scripts[from.0..to.0].iter().enumerate() {
            frame = apply_patch(&frame, script).map_err(|e| match e {
                FlipbookError::CorruptPatch(msg) => {
                    let at = from.0 + offset;
                    FlipbookError::corrupt_patch(format!("script {at} -> {}: {msg}", at + 1))
                }
                other => other,
            })?;
        }
        Ok(frame)
    }
}

impl FrameStore for CheckpointStore {
    fn frame_count(&self) -> usize {
        self.scripts.len() + 1
    }

    /// Start at the nearest checkpoint at or before `index` and apply scripts in order.
    fn reconstruct(&self, index: FrameIndex) -> FlipbookResult<String> {
        index.checked(self.frame_count())?;
        let (start, base) = self
            .checkpoints
            .range(..=index)
            .next_back()
            .ok_or_else(|| FlipbookError::validation("frame 0 must be a checkpoint"))?;
        self.replay(base.clone(), *start, index)
    }

    /// Apply only the scripts between `from` and `to`, unless a checkpoint is closer.
    fn advance(&self, from: FrameIndex, current: &str, to: FrameIndex) -> FlipbookResult<String> {
        to.checked(self.frame_count())?;
        let nearer_checkpoint = self.checkpoints.range(..=to).next_back().map(|(k, _)| *k);
        if to <= from || nearer_checkpoint.is_some_and(|k| k > from) {
            return self.reconstruct(to);
        }
        self.replay(current.to_owned(), from, to)
    }
}

// Checkpoints are written as a list of `{index, frame}` entries: integer map keys do not survive
// the buffering serde does for tagged artifact enums.
mod checkpoint_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::foundation::core::FrameIndex;

    #[derive(Serialize)]
    struct EntryRef<'a> {
        index: FrameIndex,
        frame: &'a str,
    }

    #[derive(Deserialize)]
    struct Entry {
        index: FrameIndex,
        frame: String,
    }

    pub(super) fn serialize<S: Serializer>(
        map: &BTreeMap<FrameIndex, String>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_seq(map.iter().map(|(index, frame)| EntryRef {
            index: *index,
            frame,
        }))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<FrameIndex, String>, D::Error> {
        let entries = Vec::<Entry>::deserialize(d)?;
        let mut map = BTreeMap::new();
        for e in entries {
            if map.insert(e.index, e.frame).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate checkpoint {}",
                    e.index
                )));
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/checkpoint.rs"]
mod tests;
