use std::collections::BTreeMap;

use crate::capture::identity::ElementId;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::playback::store::FrameStore;

/// Re-serialized elements of one frame, keyed by identity.
///
/// Each fragment is a complete identity group (`<g id="...">...</g>`) that replaces the element
/// with the same id. An empty map is a valid unchanged frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FrameFragments(BTreeMap<ElementId, String>);

impl FrameFragments {
    /// Empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the fragment for `id`.
    pub fn insert(&mut self, id: ElementId, fragment: String) {
        self.0.insert(id, fragment);
    }

    /// Fragment for `id`, if it changed in this frame.
    pub fn get(&self, id: &ElementId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Fragments in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&ElementId, &str)> + '_ {
        self.0.iter().map(|(id, f)| (id, f.as_str()))
    }

    /// Number of changed elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` for an unchanged frame.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total fragment size in bytes.
    pub fn byte_len(&self) -> usize {
        self.0.values().map(String::len).sum()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut String> + '_ {
        self.0.values_mut()
    }
}

impl FromIterator<(ElementId, String)> for FrameFragments {
    fn from_iter<T: IntoIterator<Item = (ElementId, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Finalized incremental capture: a full base document plus per-frame element fragments.
///
/// A capture that kept no frames (for example one stopped by its storage budget on the first
/// frame) plays its base document as a single still frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SceneAnimation {
    base_document: String,
    frames: Vec<FrameFragments>,
}

impl SceneAnimation {
    /// Assemble an animation from a base document and its frames.
    pub fn new(base_document: String, frames: Vec<FrameFragments>) -> Self {
        Self {
            base_document,
            frames,
        }
    }

    /// Base document with the merged definitions container.
    pub fn base_document(&self) -> &str {
        &self.base_document
    }

    /// Captured frames in sequence order.
    pub fn frames(&self) -> &[FrameFragments] {
        &self.frames
    }

    /// Check that the base document parses and every fragment targets an element it contains.
    pub fn validate(&self) -> FlipbookResult<()> {
        let tree = roxmltree::Document::parse(&self.base_document)?;
        let ids: std::collections::HashSet<&str> = tree
            .descendants()
            .filter_map(|n| n.attribute("id"))
            .collect();
        for (k, frame) in self.frames.iter().enumerate() {
            for (id, _) in frame.iter() {
                if !ids.contains(id.as_str()) {
                    return Err(FlipbookError::validation(format!(
                        "frame {k} updates element {id} missing from the base document"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Full document for frame `index`.
    ///
    /// The latest fragment of every element over frames `0..=index` is spliced into the base
    /// document, oldest write first, so a parent redrawn after its child wins and vice versa.
    pub fn compose_frame(&self, index: FrameIndex) -> FlipbookResult<String> {
        index.checked(self.frame_count())?;
        let mut latest: BTreeMap<&ElementId, (usize, &str)> = BTreeMap::new();
        for (k, frame) in self.frames.iter().take(index.0 + 1).enumerate() {
            for (id, fragment) in frame.iter() {
                latest.insert(id, (k, fragment));
            }
        }
        let mut writes: Vec<(usize, &ElementId, &str)> = latest
            .into_iter()
            .map(|(id, (k, fragment))| (k, id, fragment))
            .collect();
        writes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let mut doc = self.base_document.clone();
        for (_, id, fragment) in writes {
            doc = splice_element(&doc, id, fragment)?;
        }
        Ok(doc)
    }
}

/// Replace the element whose `id` attribute equals `id` with `fragment`.
pub fn splice_element(doc: &str, id: &ElementId, fragment: &str) -> FlipbookResult<String> {
    let tree = roxmltree::Document::parse(doc)?;
    let target = tree
        .descendants()
        .find(|n| n.is_element() && n.attribute("id") == Some(id.as_str()))
        .ok_or_else(|| FlipbookError::unrecognized(id.as_str()))?;
    let range = target.range();
    let mut out = String::with_capacity(doc.len() - range.len() + fragment.len());
    out.push_str(&doc[..range.start]);
    out.push_str(fragment);
    out.push_str(&doc[range.end..]);
    Ok(out)
}

impl FrameStore for SceneAnimation {
    fn frame_count(&self) -> usize {
        self.frames.len().max(1)
    }

    fn reconstruct(&self, index: FrameIndex) -> FlipbookResult<String> {
        self.compose_frame(index)
    }

    /// Splice only the fragments of frames `from + 1 ..= to` into the displayed document.
    fn advance(&self, from: FrameIndex, current: &str, to: FrameIndex) -> FlipbookResult<String> {
        to.checked(self.frame_count())?;
        if to <= from {
            return self.compose_frame(to);
        }
        let mut doc = current.to_owned();
        for frame in &self.frames[from.0 + 1..=to.0] {
            for (id, fragment) in frame.iter() {
                doc = splice_element(&doc, id, fragment)?;
            }
        }
        Ok(doc)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/animation.rs"]
mod tests;
