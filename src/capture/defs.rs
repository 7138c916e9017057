use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use crate::capture::animation::FrameFragments;
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// `id` of the single definitions container in a merged base document.
pub const DEFS_CONTAINER_ID: &str = "flipbook-defs";

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Fragments are parsed inside this wrapper so they may hold several top-level elements and use
/// the `xlink` prefix without declaring it.
fn fragment_open() -> String {
    format!(r#"<flipbook-fragment xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}">"#)
}

const FRAGMENT_CLOSE: &str = "</flipbook-fragment>";

#[derive(Default)]
struct Collected {
    markup: Vec<String>,
    by_id: HashMap<String, usize>,
}

impl Collected {
    fn push(&mut self, id: Option<&str>, markup: &str) {
        let Some(id) = id else {
            self.markup.push(markup.to_owned());
            return;
        };
        match self.by_id.get(id) {
            Some(&slot) => {
                if self.markup[slot] != markup {
                    tracing::warn!(
                        id,
                        "conflicting definitions share one id; keeping the first"
                    );
                }
            }
            None => {
                self.by_id.insert(id.to_owned(), self.markup.len());
                self.markup.push(markup.to_owned());
            }
        }
    }
}

/// Scan `doc` for `<defs>` blocks, collect their children, and return `doc` with every block
/// removed. `offset` is the length of any wrapper prepended before parsing.
fn extract(parsed: &str, offset: usize, doc: &str, out: &mut Collected) -> FlipbookResult<String> {
    let tree = roxmltree::Document::parse(parsed)?;
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for node in tree.descendants() {
        if !node.is_element() || node.tag_name().name() != "defs" {
            continue;
        }
        if node
            .ancestors()
            .skip(1)
            .any(|a| a.is_element() && a.tag_name().name() == "defs")
        {
            continue;
        }
        for child in node.children().filter(|c| c.is_element()) {
            out.push(child.attribute("id"), &parsed[child.range()]);
        }
        let r = node.range();
        ranges.push(r.start - offset..r.end - offset);
    }

    let mut stripped = String::with_capacity(doc.len());
    let mut cursor = 0;
    for r in ranges {
        stripped.push_str(&doc[cursor..r.start]);
        cursor = r.end;
    }
    stripped.push_str(&doc[cursor..]);
    Ok(stripped)
}

fn wrap_fragment(fragment: &str) -> (String, usize) {
    let open = fragment_open();
    let offset = open.len();
    (format!("{open}{fragment}{FRAGMENT_CLOSE}"), offset)
}

/// Byte range of the root element's start tag in `doc`, and whether it is self-closing.
fn root_start_tag(doc: &str) -> FlipbookResult<(Range<usize>, bool)> {
    let tree = roxmltree::Document::parse(doc)?;
    let start = tree.root_element().range().start;
    let mut quote = None;
    for (i, ch) in doc[start..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => {
                let end = start + i + 1;
                let self_closing = doc[..end - 1].ends_with('/');
                return Ok((start..end, self_closing));
            }
            _ => {}
        }
    }
    Err(FlipbookError::markup("unterminated root start tag"))
}

/// Hoist every shared definition into one container in the base document.
///
/// `<defs>` blocks are removed from the base document and from every fragment; their children
/// are inserted once, deduplicated by `id`, into `<defs id="flipbook-defs">` right after the
/// root start tag. Returns the merged base document; `frames` are rewritten in place.
#[tracing::instrument(skip(base, frames), fields(frames = frames.len()))]
pub fn merge_definitions(base: &str, frames: &mut [FrameFragments]) -> FlipbookResult<String> {
    let mut collected = Collected::default();
    let stripped_base = extract(base, 0, base, &mut collected)?;

    for frame in frames.iter_mut() {
        for fragment in frame.values_mut() {
            let (wrapped, offset) = wrap_fragment(fragment);
            *fragment = extract(&wrapped, offset, fragment, &mut collected)?;
        }
    }

    let mut container = format!(r#"<defs id="{DEFS_CONTAINER_ID}">"#);
    for markup in &collected.markup {
        container.push_str(markup);
    }
    container.push_str("</defs>");

    let (tag, self_closing) = root_start_tag(&stripped_base)?;
    let mut merged = String::with_capacity(stripped_base.len() + container.len());
    if self_closing {
        let name: String = stripped_base[tag.start + 1..]
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect();
        merged.push_str(&stripped_base[..tag.end - 2]);
        merged.push('>');
        merged.push_str(&container);
        merged.push_str(&format!("</{name}>"));
        merged.push_str(&stripped_base[tag.end..]);
    } else {
        merged.push_str(&stripped_base[..tag.end]);
        merged.push_str(&container);
        merged.push_str(&stripped_base[tag.end..]);
    }
    tracing::debug!(definitions = collected.markup.len(), "definitions merged");
    Ok(merged)
}

fn referenced_ids(markup: &str, out: &mut BTreeSet<String>) {
    let mut rest = markup;
    while let Some(pos) = rest.find("url(#") {
        rest = &rest[pos + 5..];
        if let Some(end) = rest.find(')') {
            out.insert(rest[..end].trim().to_owned());
        }
    }

    let mut rest = markup;
    while let Some(pos) = rest.find("href=") {
        rest = &rest[pos + 5..];
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let value = &rest[1..];
        if let Some(id) = value.strip_prefix('#')
            && let Some(end) = id.find(quote)
        {
            out.insert(id[..end].to_owned());
        }
    }
}

/// Check that every `url(#id)` and `href="#id"` reference in the base document or a fragment
/// resolves to an element id defined in the base document.
pub fn verify_references(base: &str, frames: &[FrameFragments]) -> FlipbookResult<()> {
    let tree = roxmltree::Document::parse(base)?;
    let defined: BTreeSet<&str> = tree
        .descendants()
        .filter_map(|n| n.attribute("id"))
        .collect();

    let mut wanted = BTreeSet::new();
    referenced_ids(base, &mut wanted);
    for frame in frames {
        for (_, fragment) in frame.iter() {
            referenced_ids(fragment, &mut wanted);
        }
    }

    let missing: Vec<&str> = wanted
        .iter()
        .map(String::as_str)
        .filter(|id| !defined.contains(id))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FlipbookError::validation(format!(
            "unresolved definition references: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/defs.rs"]
mod tests;
