use std::fmt::Write as _;

use kurbo::{Affine, BezPath, Point, Rect};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::capture::scene::{SceneGraph, SvgWriter, escape_attr, escape_text};
use crate::foundation::error::{FlipbookError, FlipbookResult};

const DEF_ID_SEED: u64 = 0x5f0c_91d2_b7a3_e461;

/// Handle of one node in a [`VectorScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u32);

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn opacity(self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

/// One stop of a linear gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient in `[0, 1]`.
    pub offset: f64,
    /// Stop color.
    pub color: Rgba8,
}

/// Linear gradient in user space.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    /// Gradient start point.
    pub start: Point,
    /// Gradient end point.
    pub end: Point,
    /// Color stops in ascending offset order.
    pub stops: Vec<GradientStop>,
}

/// Fill or stroke paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// Flat color.
    Solid(Rgba8),
    /// Shared gradient definition.
    Linear(LinearGradient),
}

/// Stroke paint and width.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    /// Stroke paint.
    pub paint: Paint,
    /// Stroke width in user units.
    pub width: f64,
}

/// Fill and stroke of a drawable node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    /// Fill paint; `None` draws no fill.
    pub fill: Option<Paint>,
    /// Stroke; `None` draws no outline.
    pub stroke: Option<Stroke>,
}

impl Style {
    /// Solid fill, no stroke.
    pub fn filled(color: Rgba8) -> Self {
        Self {
            fill: Some(Paint::Solid(color)),
            stroke: None,
        }
    }

    /// Solid stroke, no fill.
    pub fn stroked(color: Rgba8, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(Stroke {
                paint: Paint::Solid(color),
                width,
            }),
        }
    }
}

/// Geometry carried by a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Pure container.
    Group,
    /// Bezier path.
    Path(BezPath),
    /// Single-line text anchored at `origin`.
    Text {
        /// Baseline start.
        origin: Point,
        /// Text content.
        content: String,
        /// Font size in user units.
        size: f64,
    },
}

/// One element of a [`VectorScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct VectorNode {
    /// Geometry.
    pub shape: Shape,
    /// Paint.
    pub style: Style,
    /// Transform applied to the geometry. Ignored on groups.
    pub transform: Affine,
    /// Rectangular clip in user space (a shared definition). Ignored on groups.
    pub clip: Option<Rect>,
    /// Hidden nodes keep their identity wrapper but draw nothing.
    pub visible: bool,
    children: Vec<NodeKey>,
}

impl VectorNode {
    fn new(shape: Shape, style: Style) -> Self {
        Self {
            shape,
            style,
            transform: Affine::IDENTITY,
            clip: None,
            visible: true,
            children: Vec::new(),
        }
    }

    /// Children in draw order.
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    fn kind_name(&self) -> &'static str {
        match self.shape {
            Shape::Group => "Group",
            Shape::Path(_) => "Path",
            Shape::Text { .. } => "Text",
        }
    }
}

/// Arena-backed vector scene: groups, paths, and text with shareable clips and gradients.
#[derive(Clone, Debug)]
pub struct VectorScene {
    width: f64,
    height: f64,
    nodes: Vec<VectorNode>,
}

impl VectorScene {
    /// Create a scene with an empty root group.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            nodes: vec![VectorNode::new(Shape::Group, Style::default())],
        }
    }

    /// Root group handle.
    pub fn root_key(&self) -> NodeKey {
        NodeKey(0)
    }

    /// Borrow a node.
    pub fn node(&self, key: NodeKey) -> Option<&VectorNode> {
        self.nodes.get(key.0 as usize)
    }

    /// Mutably borrow a node, failing for unknown handles.
    pub fn node_mut(&mut self, key: NodeKey) -> FlipbookResult<&mut VectorNode> {
        self.nodes
            .get_mut(key.0 as usize)
            .ok_or_else(|| FlipbookError::validation(format!("unknown scene node {key:?}")))
    }

    /// Append an empty group under `parent`.
    pub fn add_group(&mut self, parent: NodeKey) -> FlipbookResult<NodeKey> {
        self.push(parent, VectorNode::new(Shape::Group, Style::default()))
    }

    /// Append a path under `parent`.
    pub fn add_path(
        &mut self,
        parent: NodeKey,
        path: BezPath,
        style: Style,
    ) -> FlipbookResult<NodeKey> {
        self.push(parent, VectorNode::new(Shape::Path(path), style))
    }

    /// Append a text run under `parent`.
    pub fn add_text(
        &mut self,
        parent: NodeKey,
        origin: Point,
        content: impl Into<String>,
        size: f64,
        style: Style,
    ) -> FlipbookResult<NodeKey> {
        let shape = Shape::Text {
            origin,
            content: content.into(),
            size,
        };
        self.push(parent, VectorNode::new(shape, style))
    }

    /// Replace a path node's geometry.
    pub fn set_path(&mut self, key: NodeKey, path: BezPath) -> FlipbookResult<()> {
        let node = self.node_mut(key)?;
        match &mut node.shape {
            Shape::Path(p) => {
                *p = path;
                Ok(())
            }
            _ => Err(FlipbookError::validation(format!(
                "scene node {key:?} is not a path"
            ))),
        }
    }

    /// Replace a text node's content.
    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> FlipbookResult<()> {
        let node = self.node_mut(key)?;
        match &mut node.shape {
            Shape::Text { content, .. } => {
                *content = text.into();
                Ok(())
            }
            _ => Err(FlipbookError::validation(format!(
                "scene node {key:?} is not text"
            ))),
        }
    }

    /// Replace a node's paint.
    pub fn set_style(&mut self, key: NodeKey, style: Style) -> FlipbookResult<()> {
        self.node_mut(key)?.style = style;
        Ok(())
    }

    /// Replace a node's transform.
    pub fn set_transform(&mut self, key: NodeKey, transform: Affine) -> FlipbookResult<()> {
        self.node_mut(key)?.transform = transform;
        Ok(())
    }

    /// Set or clear a node's rectangular clip.
    pub fn set_clip(&mut self, key: NodeKey, clip: Option<Rect>) -> FlipbookResult<()> {
        self.node_mut(key)?.clip = clip;
        Ok(())
    }

    /// Show or hide a node.
    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> FlipbookResult<()> {
        self.node_mut(key)?.visible = visible;
        Ok(())
    }

    fn push(&mut self, parent: NodeKey, node: VectorNode) -> FlipbookResult<NodeKey> {
        let index = u32::try_from(self.nodes.len())
            .map_err(|_| FlipbookError::validation("vector scene node count exceeds u32::MAX"))?;
        let key = NodeKey(index);
        self.node_mut(parent)?.children.push(key);
        self.nodes.push(node);
        Ok(key)
    }
}

impl SceneGraph for VectorScene {
    type Key = NodeKey;

    fn root(&self) -> NodeKey {
        self.root_key()
    }

    fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.node(key).map_or(&[][..], VectorNode::children)
    }

    fn kind_name(&self, key: NodeKey) -> &str {
        self.node(key).map_or("Element", VectorNode::kind_name)
    }

    fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn is_visible(&self, key: NodeKey) -> bool {
        self.node(key).is_some_and(|n| n.visible)
    }

    fn write_element(&self, key: NodeKey, out: &mut SvgWriter<'_>) -> FlipbookResult<()> {
        let node = self
            .node(key)
            .ok_or_else(|| FlipbookError::validation(format!("unknown scene node {key:?}")))?;
        // Groups draw nothing themselves; their children carry their own attributes.
        if !node.visible || matches!(node.shape, Shape::Group) {
            return Ok(());
        }

        let mut attrs = String::new();
        if let Some(rect) = node.clip {
            let id = define_clip(out, rect);
            let _ = write!(attrs, r#" clip-path="url(#{id})""#);
        }
        if node.transform != Affine::IDENTITY {
            let [a, b, c, d, e, f] = node.transform.as_coeffs();
            let _ = write!(attrs, r#" transform="matrix({a} {b} {c} {d} {e} {f})""#);
        }
        let style = style_attr(out, &node.style);

        match &node.shape {
            Shape::Group => {}
            Shape::Path(path) => {
                out.raw(&format!(
                    r#"<path d="{}" style="{style}"{attrs}/>"#,
                    escape_attr(&path.to_svg())
                ));
            }
            Shape::Text {
                origin,
                content,
                size,
            } => {
                out.raw(&format!(
                    r#"<text x="{}" y="{}" font-size="{size}" style="{style}"{attrs}>{}</text>"#,
                    origin.x,
                    origin.y,
                    escape_text(content)
                ));
            }
        }
        Ok(())
    }
}

fn def_id(prefix: &str, fingerprint: &str) -> String {
    format!(
        "{prefix}-{:016x}",
        xxh3_64_with_seed(fingerprint.as_bytes(), DEF_ID_SEED)
    )
}

fn define_clip(out: &mut SvgWriter<'_>, rect: Rect) -> String {
    let body = format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}"/>"#,
        rect.x0,
        rect.y0,
        rect.width(),
        rect.height()
    );
    let id = def_id("clip", &body);
    out.define(&id, |s| {
        let _ = write!(s, r#"<clipPath id="{id}">{body}</clipPath>"#);
    });
    id
}

fn define_gradient(out: &mut SvgWriter<'_>, gradient: &LinearGradient) -> String {
    let mut body = String::new();
    for stop in &gradient.stops {
        let _ = write!(
            body,
            r#"<stop offset="{}" style="stop-color: {}; stop-opacity: {}"/>"#,
            stop.offset,
            stop.color.hex(),
            stop.color.opacity()
        );
    }
    let geometry = format!(
        r#"x1="{}" y1="{}" x2="{}" y2="{}" gradientUnits="userSpaceOnUse""#,
        gradient.start.x, gradient.start.y, gradient.end.x, gradient.end.y
    );
    let id = def_id("grad", &format!("{geometry}{body}"));
    out.define(&id, |s| {
        let _ = write!(
            s,
            r#"<linearGradient id="{id}" {geometry}>{body}</linearGradient>"#
        );
    });
    id
}

fn paint_value(out: &mut SvgWriter<'_>, paint: &Paint) -> (String, f64) {
    match paint {
        Paint::Solid(color) => (color.hex(), color.opacity()),
        Paint::Linear(gradient) => (format!("url(#{})", define_gradient(out, gradient)), 1.0),
    }
}

fn style_attr(out: &mut SvgWriter<'_>, style: &Style) -> String {
    let mut css = String::new();
    match &style.fill {
        Some(paint) => {
            let (value, opacity) = paint_value(out, paint);
            let _ = write!(css, "fill: {value}; fill-opacity: {opacity}");
        }
        None => css.push_str("fill: none"),
    }
    if let Some(stroke) = &style.stroke {
        let (value, opacity) = paint_value(out, &stroke.paint);
        let _ = write!(
            css,
            "; stroke: {value}; stroke-opacity: {opacity}; stroke-width: {}",
            stroke.width
        );
    }
    css
}

#[cfg(test)]
#[path = "../../tests/unit/capture/vector.rs"]
mod tests;
