use crate::foundation::core::FrameIndex;
use crate::foundation::error::FlipbookResult;

/// Random-access source of reconstructed frames driven by a
/// [`PlaybackEngine`](crate::PlaybackEngine).
///
/// Implementations are finalized, immutable encodings: reconstruction is pure and yields the same
/// frame no matter which path reached it.
pub trait FrameStore {
    /// Number of frames in the sequence.
    fn frame_count(&self) -> usize;

    /// Rebuild frame `index` from stored state.
    fn reconstruct(&self, index: FrameIndex) -> FlipbookResult<String>;

    /// Rebuild frame `to` given the already-reconstructed frame `from`.
    ///
    /// Called only when `to > from`. The default replays from stored state; encodings that can
    /// step forward incrementally override it.
    fn advance(&self, from: FrameIndex, current: &str, to: FrameIndex) -> FlipbookResult<String> {
        let _ = (from, current);
        self.reconstruct(to)
    }
}

impl<S: FrameStore + ?Sized> FrameStore for Box<S> {
    fn frame_count(&self) -> usize {
        (**self).frame_count()
    }

    fn reconstruct(&self, index: FrameIndex) -> FlipbookResult<String> {
        (**self).reconstruct(index)
    }

    fn advance(&self, from: FrameIndex, current: &str, to: FrameIndex) -> FlipbookResult<String> {
        (**self).advance(from, current, to)
    }
}
