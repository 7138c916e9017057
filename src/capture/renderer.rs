use std::collections::{BTreeSet, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::capture::animation::{FrameFragments, SceneAnimation};
use crate::capture::defs::{DEFS_CONTAINER_ID, merge_definitions};
use crate::capture::identity::IdentityTracker;
use crate::capture::scene::{SceneGraph, SvgWriter};
use crate::foundation::config::FlipbookConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Options for one capture session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureOpts {
    /// Fragment bytes allowed across the session before capture stops.
    pub budget_bytes: u64,
}

impl Default for CaptureOpts {
    fn default() -> Self {
        Self::from(&FlipbookConfig::default())
    }
}

impl From<&FlipbookConfig> for CaptureOpts {
    fn from(cfg: &FlipbookConfig) -> Self {
        Self {
            budget_bytes: cfg.storage_budget_bytes,
        }
    }
}

/// Soft budget overrun: capture stopped early, earlier frames stay valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BudgetExceeded {
    /// Fragment bytes accumulated when the budget tripped, including the dropped frame.
    pub total_bytes: u64,
    /// Configured budget.
    pub budget_bytes: u64,
    /// First frame that was not kept.
    pub frames_dropped_at: FrameIndex,
}

/// Summary of a capture session.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CaptureReport {
    /// Elements tagged at base capture.
    pub elements: usize,
    /// Frames kept.
    pub frames_captured: usize,
    /// Fragment bytes across kept frames.
    pub fragment_bytes: u64,
    /// Set when the storage budget stopped the session.
    pub budget_exceeded: Option<BudgetExceeded>,
}

/// Outcome of [`IncrementalRenderer::capture_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureStep {
    /// The frame was kept at this index.
    Captured(FrameIndex),
    /// The session is over budget; this frame and every later one are dropped.
    Stopped(BudgetExceeded),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Session {
    Empty,
    Capturing,
    Stopped(BudgetExceeded),
    Poisoned,
}

/// Captures a base document once, then only the elements that change in each frame.
pub struct IncrementalRenderer<K> {
    opts: CaptureOpts,
    tracker: IdentityTracker<K>,
    defined: BTreeSet<String>,
    base: Option<String>,
    frames: Vec<FrameFragments>,
    total_bytes: u64,
    session: Session,
}

impl<K: Copy + Eq + Hash + Debug> IncrementalRenderer<K> {
    /// Create a renderer with no session.
    pub fn new(opts: CaptureOpts) -> Self {
        Self {
            opts,
            tracker: IdentityTracker::new(),
            defined: BTreeSet::new(),
            base: None,
            frames: Vec::new(),
            total_bytes: 0,
            session: Session::Empty,
        }
    }

    /// Identity registry of the current session.
    pub fn tracker(&self) -> &IdentityTracker<K> {
        &self.tracker
    }

    /// Base document as captured (definitions not merged yet).
    pub fn base_document(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Frames kept so far.
    pub fn frames(&self) -> &[FrameFragments] {
        &self.frames
    }

    /// Return `true` once the storage budget has stopped the session.
    pub fn is_stopped(&self) -> bool {
        matches!(self.session, Session::Stopped(_))
    }

    /// Start a new session: tag every element and serialize the whole scene.
    ///
    /// Any previous session state is discarded. Returns the number of tagged elements.
    #[tracing::instrument(skip(self, scene))]
    pub fn capture_base<S>(&mut self, scene: &S) -> FlipbookResult<usize>
    where
        S: SceneGraph<Key = K>,
    {
        self.defined.clear();
        self.base = None;
        self.frames.clear();
        self.total_bytes = 0;
        self.session = Session::Poisoned;

        let elements = self.tracker.assign_all(scene);
        let (w, h) = scene.viewport();
        let mut writer = SvgWriter::new(&mut self.defined);
        writer.raw(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" version="1.1"><defs id="{DEFS_CONTAINER_ID}"></defs>"#
        ));
        write_subtree(scene, &self.tracker, scene.root(), &mut writer)?;
        writer.raw("</svg>");

        self.base = Some(writer.finish());
        self.session = Session::Capturing;
        Ok(elements)
    }

    /// Capture one frame from the elements reported as changed.
    ///
    /// Keys may repeat and arrive in any order; fragments are written in draw order. A key with
    /// no identity aborts the session with [`FlipbookError::UnrecognizedElement`].
    pub fn capture_frame<S, I>(&mut self, scene: &S, changed: I) -> FlipbookResult<CaptureStep>
    where
        S: SceneGraph<Key = K>,
        I: IntoIterator<Item = K>,
    {
        match self.session {
            Session::Empty => {
                return Err(FlipbookError::validation(
                    "capture_base must run before capture_frame",
                ));
            }
            Session::Poisoned => {
                return Err(FlipbookError::validation(
                    "capture session was aborted by an earlier error",
                ));
            }
            Session::Stopped(exceeded) => {
                tracing::debug!(
                    frame = self.frames.len(),
                    "frame dropped after the budget stop"
                );
                return Ok(CaptureStep::Stopped(exceeded));
            }
            Session::Capturing => {}
        }

        let mut ranked = Vec::new();
        for key in changed {
            match self.tracker.rank(key) {
                Some(rank) => ranked.push((rank, key)),
                None => {
                    self.session = Session::Poisoned;
                    return Err(FlipbookError::unrecognized(format!("{key:?}")));
                }
            }
        }
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.dedup_by_key(|(rank, _)| *rank);

        let mut fragments = FrameFragments::new();
        for (_, key) in ranked {
            let Some(id) = self.tracker.identity(key).cloned() else {
                self.session = Session::Poisoned;
                return Err(FlipbookError::unrecognized(format!("{key:?}")));
            };
            let mut writer = SvgWriter::new(&mut self.defined);
            if let Err(e) = write_subtree(scene, &self.tracker, key, &mut writer) {
                self.session = Session::Poisoned;
                return Err(e);
            }
            fragments.insert(id, writer.finish());
        }

        let index = FrameIndex(self.frames.len());
        self.total_bytes = self.total_bytes.saturating_add(fragments.byte_len() as u64);
        if self.total_bytes >= self.opts.budget_bytes {
            let exceeded = BudgetExceeded {
                total_bytes: self.total_bytes,
                budget_bytes: self.opts.budget_bytes,
                frames_dropped_at: index,
            };
            tracing::warn!(
                total_bytes = exceeded.total_bytes,
                budget_bytes = exceeded.budget_bytes,
                frames_kept = index.0,
                "capture storage budget reached; remaining frames dropped"
            );
            self.session = Session::Stopped(exceeded);
            return Ok(CaptureStep::Stopped(exceeded));
        }

        self.frames.push(fragments);
        Ok(CaptureStep::Captured(index))
    }

    /// Summary of the session so far.
    pub fn report(&self) -> CaptureReport {
        CaptureReport {
            elements: self.tracker.len(),
            frames_captured: self.frames.len(),
            fragment_bytes: self.frames.iter().map(|f| f.byte_len() as u64).sum(),
            budget_exceeded: match self.session {
                Session::Stopped(exceeded) => Some(exceeded),
                _ => None,
            },
        }
    }

    /// Close the session: merge shared definitions and hand out the animation.
    pub fn finish(mut self) -> FlipbookResult<(SceneAnimation, CaptureReport)> {
        let report = self.report();
        let base = match (self.session, self.base.take()) {
            (Session::Poisoned, _) => {
                return Err(FlipbookError::validation(
                    "capture session was aborted by an earlier error",
                ));
            }
            (_, None) => {
                return Err(FlipbookError::validation(
                    "capture_base must run before finish",
                ));
            }
            (_, Some(base)) => base,
        };
        let mut frames = std::mem::take(&mut self.frames);
        let base = merge_definitions(&base, &mut frames)?;
        Ok((SceneAnimation::new(base, frames), report))
    }
}

enum Visit<K> {
    Enter(K),
    Exit,
}

/// Serialize `key` and its descendants, each wrapped in its identity group.
///
/// Elements reached twice (shared children or cycles) are written once.
pub fn write_subtree<S>(
    scene: &S,
    tracker: &IdentityTracker<S::Key>,
    key: S::Key,
    out: &mut SvgWriter<'_>,
) -> FlipbookResult<()>
where
    S: SceneGraph,
{
    let mut seen = HashSet::new();
    let mut stack = vec![Visit::Enter(key)];
    while let Some(visit) = stack.pop() {
        let key = match visit {
            Visit::Exit => {
                out.raw("</g>");
                continue;
            }
            Visit::Enter(key) => key,
        };
        if !seen.insert(key) {
            continue;
        }
        let id = tracker
            .identity(key)
            .ok_or_else(|| FlipbookError::unrecognized(format!("{key:?}")))?;
        if scene.is_visible(key) {
            out.raw(&format!(r#"<g id="{id}">"#));
        } else {
            out.raw(&format!(r#"<g id="{id}" display="none">"#));
        }
        scene.write_element(key, out)?;
        stack.push(Visit::Exit);
        for child in scene.children(key).iter().rev() {
            stack.push(Visit::Enter(*child));
        }
    }
    Ok(())
}

/// Run a whole capture session.
///
/// `update` mutates the scene for each frame and returns the keys of the elements it changed.
/// Capture stops early, without error, once the storage budget is reached.
#[tracing::instrument(skip(scene, update, opts), fields(budget_bytes = opts.budget_bytes))]
pub fn capture<S, F, I>(
    scene: &mut S,
    frames: usize,
    mut update: F,
    opts: &CaptureOpts,
) -> FlipbookResult<(SceneAnimation, CaptureReport)>
where
    S: SceneGraph,
    F: FnMut(&mut S, FrameIndex) -> FlipbookResult<I>,
    I: IntoIterator<Item = S::Key>,
{
    let mut renderer = IncrementalRenderer::new(opts.clone());
    renderer.capture_base(scene)?;
    for k in 0..frames {
        let changed = update(scene, FrameIndex(k))?;
        if let CaptureStep::Stopped(_) = renderer.capture_frame(scene, changed)? {
            break;
        }
    }
    renderer.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/capture/renderer.rs"]
mod tests;
