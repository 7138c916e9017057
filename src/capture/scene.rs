use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::foundation::error::FlipbookResult;

/// Capability contract the incremental renderer needs from a scene graph.
///
/// Elements are addressed by cheap handles (`Key`). Identity tags are assigned by the renderer,
/// never derived from element content.
pub trait SceneGraph {
    /// Stable handle of one element for the lifetime of the scene.
    type Key: Copy + Eq + Hash + Debug;

    /// Top-level element.
    fn root(&self) -> Self::Key;

    /// Children of `key` in draw order. Unknown keys have no children.
    fn children(&self, key: Self::Key) -> &[Self::Key];

    /// Short type name used as the identity tag prefix (e.g. `Path`).
    fn kind_name(&self, key: Self::Key) -> &str;

    /// Document width and height in user units.
    fn viewport(&self) -> (f64, f64);

    /// Hidden elements keep their identity group (so later frames can replace them) but are not
    /// drawn, and neither are their children.
    fn is_visible(&self, key: Self::Key) -> bool {
        let _ = key;
        true
    }

    /// Serialize the element's own content (not its children).
    ///
    /// The renderer wraps the output in an identity group and serializes children after it.
    /// Shared resources must go through [`SvgWriter::define`] so each is emitted only once.
    fn write_element(&self, key: Self::Key, out: &mut SvgWriter<'_>) -> FlipbookResult<()>;
}

/// Markup buffer for one serialization pass.
///
/// Definitions already emitted anywhere in the capture session are tracked in a shared set, so a
/// resource appears inline only in the first fragment (or base document) that uses it.
pub struct SvgWriter<'d> {
    out: String,
    defined: &'d mut BTreeSet<String>,
}

impl<'d> SvgWriter<'d> {
    /// Start an empty buffer sharing the session's set of emitted definitions.
    pub fn new(defined: &'d mut BTreeSet<String>) -> Self {
        Self {
            out: String::new(),
            defined,
        }
    }

    /// Append raw markup.
    pub fn raw(&mut self, markup: &str) {
        self.out.push_str(markup);
    }

    /// Emit a shared definition once per session.
    ///
    /// `body` writes the definition element itself (which must carry `id`); it is wrapped in a
    /// `<defs>` block at the current position. Returns `true` when the definition was emitted.
    pub fn define(&mut self, id: &str, body: impl FnOnce(&mut String)) -> bool {
        if !self.defined.insert(id.to_owned()) {
            return false;
        }
        self.out.push_str("<defs>");
        body(&mut self.out);
        self.out.push_str("</defs>");
        true
    }

    /// Consume the writer into its markup.
    pub fn finish(self) -> String {
        self.out
    }
}

/// Escape a string for use inside a double-quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a string for use as element text.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
