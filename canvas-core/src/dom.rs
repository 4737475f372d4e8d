//! Owned document tree for rendering surfaces.
//!
//! A forgiving markup parser, a serializer, a block layout and hit-testing.
//! This is the native stand-in for a browser document: the interaction
//! bridge resolves pointer positions and applies mutations against it.
//!
//! Text and attribute values are stored in their encoded (source) form and
//! decoded on read, so unknown entities survive a parse/serialize cycle.

use crate::element::{DomPath, PathStep, Rect};
use crate::style;

/// Index of a node in a [`Document`] arena.
pub type NodeId = usize;

/// Attribute marking blocks injected by the theming engine.
pub const INJECTED_ATTR: &str = "data-canvas-injected";

/// Attribute marking the hovered node.
pub const HOVER_MARKER: &str = "data-canvas-hover";

/// Attribute marking the selected node.
pub const SELECTED_MARKER: &str = "data-canvas-selected";

/// Deepest element nesting the parser builds. Start tags below this depth
/// still create elements, but their content is attached as siblings.
pub const MAX_DEPTH: usize = 512;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

const HIDDEN_ELEMENTS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "template", "noscript", "base",
];

/// Default image box when no size attributes are present.
const DEFAULT_IMAGE_HEIGHT: f32 = 150.0;

/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.5;

/// Average glyph advance as a multiple of the font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.5;

/// Content of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document itself; always node 0.
    Document,
    /// A `<!...>` declaration.
    Doctype(String),
    /// An element with lowercase tag and attributes in source order.
    Element {
        /// Lowercase tag name.
        tag: String,
        /// Attributes as (lowercase name, encoded value).
        attrs: Vec<(String, String)>,
    },
    /// Encoded text.
    Text(String),
    /// Comment body.
    Comment(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node content.
    pub kind: NodeKind,
    /// Parent node, `None` for the document and detached nodes.
    pub parent: Option<NodeId>,
    /// Child nodes in order.
    pub children: Vec<NodeId>,
    /// Layout box from the last [`Document::layout`] run.
    pub rect: Rect,
}

/// Serialization switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Drop elements carrying [`INJECTED_ATTR`].
    pub skip_injected: bool,
    /// Drop hover/selected marker attributes.
    pub strip_markers: bool,
}

impl SerializeOptions {
    /// Options producing markup suitable for the page registry.
    #[must_use]
    pub const fn clean() -> Self {
        Self {
            skip_injected: true,
            strip_markers: true,
        }
    }
}

/// An arena-allocated document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// The document node id.
    pub const ROOT: NodeId = 0;

    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                rect: Rect::default(),
            }],
        }
    }

    /// Parse markup into a document. Never fails; malformed input is
    /// recovered the way browsers broadly do (unclosed tags close at EOF,
    /// stray end tags are dropped).
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        let mut doc = Self::new();
        doc.parse_into(Self::ROOT, markup);
        doc
    }

    fn parse_into(&mut self, parent: NodeId, markup: &str) {
        let bytes = markup.as_bytes();
        let len = bytes.len();
        let mut stack: Vec<NodeId> = vec![parent];
        let base_depth = self.depth(parent);
        let mut pos = 0;

        while pos < len {
            let current = *stack.last().unwrap_or(&parent);
            let rest = &markup[pos..];

            if bytes[pos] == b'<' {
                if let Some(body) = rest.strip_prefix("<!--") {
                    let (content, next) = match body.find("-->") {
                        Some(i) => (&body[..i], pos + 4 + i + 3),
                        None => (body, len),
                    };
                    self.append(current, NodeKind::Comment(content.to_string()));
                    pos = next;
                    continue;
                }
                if rest.starts_with("<!") || rest.starts_with("<?") {
                    let (content, next) = match rest.find('>') {
                        Some(i) => (&rest[2..i], pos + i + 1),
                        None => (&rest[2..], len),
                    };
                    let kind = if rest.starts_with("<!") {
                        NodeKind::Doctype(content.to_string())
                    } else {
                        NodeKind::Comment(content.to_string())
                    };
                    self.append(current, kind);
                    pos = next;
                    continue;
                }
                if let Some(body) = rest.strip_prefix("</") {
                    let (name, next) = match body.find('>') {
                        Some(i) => (&body[..i], pos + 2 + i + 1),
                        None => (body, len),
                    };
                    let name = name.trim().to_ascii_lowercase();
                    if let Some(depth) = stack
                        .iter()
                        .rposition(|&id| self.tag(id) == Some(name.as_str()))
                    {
                        stack.truncate(depth.max(1));
                    }
                    pos = next;
                    continue;
                }
                if bytes.get(pos + 1).is_some_and(u8::is_ascii_alphabetic) {
                    let tag = parse_start_tag(markup, pos);
                    let is_raw = RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
                    let is_void = VOID_ELEMENTS.contains(&tag.name.as_str());
                    let id = self.append(
                        current,
                        NodeKind::Element {
                            tag: tag.name.clone(),
                            attrs: tag.attrs,
                        },
                    );
                    pos = tag.end;
                    if is_raw && !tag.self_closing {
                        pos = self.parse_raw_text(id, &tag.name, markup, pos);
                    } else if !tag.self_closing && !is_void && base_depth + stack.len() < MAX_DEPTH
                    {
                        stack.push(id);
                    }
                    continue;
                }
            }

            let skip = rest.chars().next().map_or(1, char::len_utf8);
            let end = markup[pos + skip..]
                .find('<')
                .map_or(len, |i| pos + skip + i);
            self.append_text(current, &markup[pos..end]);
            pos = end;
        }
    }

    /// Consume raw text up to the matching close tag; returns the new cursor.
    fn parse_raw_text(&mut self, id: NodeId, tag: &str, markup: &str, start: usize) -> usize {
        let lower = markup[start..].to_ascii_lowercase();
        let close = format!("</{tag}");
        match lower.find(&close) {
            Some(i) => {
                if i > 0 {
                    self.append(id, NodeKind::Text(markup[start..start + i].to_string()));
                }
                let after = start + i + close.len();
                markup[after..]
                    .find('>')
                    .map_or(markup.len(), |j| after + j + 1)
            }
            None => {
                if start < markup.len() {
                    self.append(id, NodeKind::Text(markup[start..].to_string()));
                }
                markup.len()
            }
        }
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            rect: Rect::default(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last].kind {
                existing.push_str(text);
                return;
            }
        }
        self.append(parent, NodeKind::Text(text.to_string()));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Get a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Tag name of an element node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Check if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag(id).is_some()
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Number of ancestors of a node; the document itself is at depth 0.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// Element children of a node.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
    }

    /// Check if a node is still reachable from the document root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == Self::ROOT {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Decoded attribute value.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| decode_entities(v)),
            _ => None,
        }
    }

    /// All attributes of an element, decoded.
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> Vec<(String, String)> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element { attrs, .. }) => attrs
                .iter()
                .map(|(n, v)| (n.clone(), decode_entities(v)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Check whether an element carries an attribute.
    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        matches!(
            self.nodes.get(id).map(|n| &n.kind),
            Some(NodeKind::Element { attrs, .. }) if attrs.iter().any(|(n, _)| n == name)
        )
    }

    /// The `<html>` element, if any.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(Self::ROOT).next()
    }

    /// The `<body>` element, if any.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.find_first(|doc, id| doc.tag(id) == Some("body"))
    }

    /// The `<head>` element, if any.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.find_first(|doc, id| doc.tag(id) == Some("head"))
    }

    /// Check if the node is the document root element or the body.
    #[must_use]
    pub fn is_root_element(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some("html" | "body"))
    }

    /// First attached element in document order matching `predicate`.
    pub fn find_first(&self, predicate: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .find(|&id| self.is_element(id) && predicate(self, id))
    }

    /// Attached elements carrying an attribute, in document order.
    #[must_use]
    pub fn elements_with_attr(&self, name: &str) -> Vec<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .filter(|&id| self.has_attr(id, name))
            .collect()
    }

    /// Descendants of a node in document order (excluding the node).
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current].children.iter().rev().copied());
        }
        out
    }

    /// Visible text of a node, decoded, skipping script and style content.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&decode_entities(text)),
            NodeKind::Element { tag, .. } if tag == "script" || tag == "style" => {}
            NodeKind::Document | NodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
            NodeKind::Doctype(_) | NodeKind::Comment(_) => {}
        }
    }

    /// Layout box of a node from the last layout pass.
    #[must_use]
    pub fn rect(&self, id: NodeId) -> Rect {
        self.nodes.get(id).map(|n| n.rect).unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Set an attribute; `value` is encoded before storage.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeKind::Element { attrs, .. }) = self.nodes.get_mut(id).map(|n| &mut n.kind)
        {
            let encoded = encode_attr(value);
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = encoded,
                None => attrs.push((name.to_ascii_lowercase(), encoded)),
            }
        }
    }

    /// Remove an attribute.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(NodeKind::Element { attrs, .. }) = self.nodes.get_mut(id).map(|n| &mut n.kind)
        {
            attrs.retain(|(n, _)| n != name);
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            self.append(id, NodeKind::Text(encode_text(text)));
        }
    }

    /// Replace all children with parsed markup.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        self.clear_children(id);
        self.parse_into(id, markup);
    }

    /// Append parsed markup after the existing children.
    pub fn append_html(&mut self, id: NodeId, markup: &str) {
        self.parse_into(id, markup);
    }

    /// Detach a node from its parent. Returns false for the root or an
    /// already detached node.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        self.nodes[parent].children.retain(|&c| c != id);
        self.nodes[id].parent = None;
        true
    }

    fn clear_children(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            let children = std::mem::take(&mut node.children);
            for child in children {
                self.nodes[child].parent = None;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// Path from the root to an element by same-tag sibling index.
    #[must_use]
    pub fn path_of(&self, id: NodeId) -> DomPath {
        let mut steps = Vec::new();
        let mut cursor = id;
        while let (Some(tag), Some(parent)) = (self.tag(cursor), self.parent(cursor)) {
            let index = self
                .element_children(parent)
                .take_while(|&sibling| sibling != cursor)
                .filter(|&sibling| self.tag(sibling) == Some(tag))
                .count();
            steps.push(PathStep {
                tag: tag.to_string(),
                index,
            });
            cursor = parent;
        }
        steps.reverse();
        DomPath(steps)
    }

    /// Resolve a path produced by [`Document::path_of`].
    #[must_use]
    pub fn resolve(&self, path: &DomPath) -> Option<NodeId> {
        let mut cursor = Self::ROOT;
        for step in path.steps() {
            cursor = self
                .element_children(cursor)
                .filter(|&child| self.tag(child) == Some(step.tag.as_str()))
                .nth(step.index)?;
        }
        (cursor != Self::ROOT).then_some(cursor)
    }

    // -----------------------------------------------------------------------
    // Layout and hit-testing
    // -----------------------------------------------------------------------

    /// Lay the document out as stacked blocks in a viewport of `width`.
    /// Returns the total content height.
    pub fn layout(&mut self, width: f32) -> f32 {
        let height = self.layout_children(Self::ROOT, 0.0, 0.0, width);
        self.nodes[Self::ROOT].rect = Rect::new(0.0, 0.0, width, height);
        height
    }

    fn layout_children(&mut self, id: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let children = self.nodes[id].children.clone();
        let mut cursor = y;
        for child in children {
            cursor += self.layout_node(child, x, cursor, width);
        }
        cursor - y
    }

    fn layout_node(&mut self, id: NodeId, x: f32, y: f32, width: f32) -> f32 {
        let height = match self.nodes[id].kind.clone() {
            NodeKind::Text(text) => {
                let decoded = decode_entities(&text);
                let chars = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
                if chars.is_empty() {
                    0.0
                } else {
                    let font = self
                        .parent(id)
                        .map_or(style::DEFAULT_FONT_SIZE, |p| style::font_size_px(self, p));
                    #[allow(clippy::cast_precision_loss)]
                    let run = chars.chars().count() as f32 * font * GLYPH_WIDTH_FACTOR;
                    let lines = (run / width.max(1.0)).ceil().max(1.0);
                    lines * font * LINE_HEIGHT_FACTOR
                }
            }
            NodeKind::Element { tag, .. } if HIDDEN_ELEMENTS.contains(&tag.as_str()) => 0.0,
            NodeKind::Element { tag, .. } if tag == "img" => {
                let w = self
                    .attr(id, "width")
                    .and_then(|v| style::parse_px(&v))
                    .unwrap_or(width)
                    .min(width);
                let h = self
                    .attr(id, "height")
                    .and_then(|v| style::parse_px(&v))
                    .unwrap_or(DEFAULT_IMAGE_HEIGHT);
                self.nodes[id].rect = Rect::new(x, y, w, h);
                return h;
            }
            NodeKind::Element { tag, .. } if tag == "br" || tag == "hr" => {
                style::font_size_px(self, id) * LINE_HEIGHT_FACTOR
            }
            NodeKind::Element { .. } => {
                let pad = style::padding_px(self, id);
                let inner_width = (width - 2.0 * pad).max(0.0);
                let content = self.layout_children(id, x + pad, y + pad, inner_width);
                if content > 0.0 {
                    content + 2.0 * pad
                } else {
                    0.0
                }
            }
            NodeKind::Document | NodeKind::Doctype(_) | NodeKind::Comment(_) => 0.0,
        };
        self.nodes[id].rect = Rect::new(x, y, width, height);
        height
    }

    /// Topmost attached element containing the point, deepest first.
    #[must_use]
    pub fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        self.hit_test_from(Self::ROOT, x, y)
    }

    fn hit_test_from(&self, id: NodeId, x: f32, y: f32) -> Option<NodeId> {
        for &child in self.nodes[id].children.iter().rev() {
            if !self.is_element(child) {
                continue;
            }
            let rect = self.nodes[child].rect;
            if rect.width <= 0.0 || rect.height <= 0.0 || !rect.contains(x, y) {
                continue;
            }
            return self.hit_test_from(child, x, y).or(Some(child));
        }
        None
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Serialize the whole document.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.to_html_with(SerializeOptions::default())
    }

    /// Serialize the whole document with options.
    #[must_use]
    pub fn to_html_with(&self, options: SerializeOptions) -> String {
        self.inner_html_with(Self::ROOT, options)
    }

    /// Serialized children of a node.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        self.inner_html_with(id, SerializeOptions::default())
    }

    /// Serialized children of a node with options.
    #[must_use]
    pub fn inner_html_with(&self, id: NodeId, options: SerializeOptions) -> String {
        let mut out = String::new();
        if let Some(node) = self.nodes.get(id) {
            for &child in &node.children {
                self.write_node(child, &mut out, options);
            }
        }
        out
    }

    /// Serialized node including itself.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        self.outer_html_with(id, SerializeOptions::default())
    }

    /// Serialized node including itself, with options.
    #[must_use]
    pub fn outer_html_with(&self, id: NodeId, options: SerializeOptions) -> String {
        let mut out = String::new();
        if id < self.nodes.len() {
            self.write_node(id, &mut out, options);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String, options: SerializeOptions) {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Document => {
                for &child in &node.children {
                    self.write_node(child, out, options);
                }
            }
            NodeKind::Doctype(body) => {
                out.push_str("<!");
                out.push_str(body);
                out.push('>');
            }
            NodeKind::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { tag, attrs } => {
                if options.skip_injected && attrs.iter().any(|(n, _)| n == INJECTED_ATTR) {
                    return;
                }
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    if options.strip_markers && (name == HOVER_MARKER || name == SELECTED_MARKER)
                    {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &node.children {
                    self.write_node(child, out, options);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
    end: usize,
}

/// Parse a start tag beginning at `start` (which points at `<`).
fn parse_start_tag(markup: &str, start: usize) -> StartTag {
    let bytes = markup.as_bytes();
    let len = bytes.len();
    let mut i = start + 1;
    while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' && bytes[i] != b'/' {
        i += 1;
    }
    let name = markup[start + 1..i].to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        if bytes[i] == b'/' {
            self_closing = bytes.get(i + 1) == Some(&b'>');
            i += 1;
            continue;
        }

        let name_start = i;
        while i < len
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'='
            && bytes[i] != b'>'
            && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
        {
            i += 1;
        }
        let attr_name = markup[name_start..i].to_ascii_lowercase();
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let mut value = String::new();
        if i < len && bytes[i] == b'=' {
            i += 1;
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < len && bytes[i] != quote {
                    i += 1;
                }
                value = markup[value_start..i].to_string();
                if i < len {
                    i += 1;
                }
            } else {
                let value_start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = markup[value_start..i].to_string();
            }
        }

        if !attr_name.is_empty() && !attrs.iter().any(|(n, _)| *n == attr_name) {
            attrs.push((attr_name, value));
        }
    }

    StartTag {
        name,
        attrs,
        self_closing,
        end: i,
    }
}

/// Decode the common named entities and numeric references.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Encode text for storage inside an element.
#[must_use]
pub fn encode_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Encode an attribute value for storage.
#[must_use]
pub fn encode_attr(input: &str) -> String {
    input.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_round_trip() {
        let markup = r#"<!DOCTYPE html><html><head><title>T</title></head><body><h1 class="big">Hi</h1><img src="a.png"><p>a &copy; b</p></body></html>"#;
        let doc = Document::parse(markup);
        assert_eq!(doc.to_html(), markup);
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let doc = Document::parse("<div><p>one<p>two</span></div>tail");
        let html = doc.to_html();
        assert_eq!(html, "<div><p>one<p>two</p></p></div>tail");
    }

    #[test]
    fn test_raw_text_elements_keep_markup() {
        let doc = Document::parse("<script>if (a < b) { x('</p>'); }</script><p>ok</p>");
        let script = doc.find_first(|d, id| d.tag(id) == Some("script"));
        let script = script.expect("script");
        assert_eq!(doc.inner_html(script), "if (a < b) { x('</p>'); }");
        assert!(doc.find_first(|d, id| d.tag(id) == Some("p")).is_some());
    }

    #[test]
    fn test_attributes_parse_variants() {
        let doc = Document::parse(r#"<input disabled value='a "b"' data-x=1 />"#);
        let input = doc.document_element().expect("input");
        assert_eq!(doc.attr(input, "disabled").as_deref(), Some(""));
        assert_eq!(doc.attr(input, "value").as_deref(), Some("a \"b\""));
        assert_eq!(doc.attr(input, "data-x").as_deref(), Some("1"));
        assert_eq!(
            doc.to_html(),
            r#"<input disabled value="a &quot;b&quot;" data-x="1">"#
        );
    }

    #[test]
    fn test_text_content_decodes_and_skips_scripts() {
        let doc = Document::parse("<div> A &amp; B <script>x()</script><b>!</b></div>");
        let div = doc.document_element().expect("div");
        assert_eq!(doc.text_content(div), "A & B !");
    }

    #[test]
    fn test_set_text_encodes() {
        let mut doc = Document::parse("<p><b>old</b></p>");
        let p = doc.document_element().expect("p");
        doc.set_text(p, "1 < 2");
        assert_eq!(doc.to_html(), "<p>1 &lt; 2</p>");
        assert_eq!(doc.text_content(p), "1 < 2");
    }

    #[test]
    fn test_path_round_trip() {
        let doc = Document::parse("<body><p>a</p><div></div><p>b</p></body>");
        let second_p = doc
            .descendants(Document::ROOT)
            .into_iter()
            .filter(|&id| doc.tag(id) == Some("p"))
            .nth(1)
            .expect("second p");
        let path = doc.path_of(second_p);
        assert_eq!(path.steps().len(), 2);
        assert_eq!(path.steps()[1].index, 1);
        assert_eq!(doc.resolve(&path), Some(second_p));
    }

    #[test]
    fn test_detach() {
        let mut doc = Document::parse("<ul><li>a</li><li>b</li></ul>");
        let first = doc.find_first(|d, id| d.tag(id) == Some("li")).expect("li");
        assert!(doc.detach(first));
        assert!(!doc.is_attached(first));
        assert!(!doc.detach(first));
        assert_eq!(doc.to_html(), "<ul><li>b</li></ul>");
    }

    #[test]
    fn test_layout_and_hit_test() {
        let mut doc = Document::parse("<html><body><h1>Title</h1><p>Body text</p></body></html>");
        doc.layout(800.0);
        let h1 = doc.find_first(|d, id| d.tag(id) == Some("h1")).expect("h1");
        let p = doc.find_first(|d, id| d.tag(id) == Some("p")).expect("p");
        let h1_rect = doc.rect(h1);
        let p_rect = doc.rect(p);
        assert!(h1_rect.height > p_rect.height);
        assert!((p_rect.y - (h1_rect.y + h1_rect.height)).abs() < f32::EPSILON);

        assert_eq!(doc.hit_test(10.0, h1_rect.y + 1.0), Some(h1));
        assert_eq!(doc.hit_test(10.0, p_rect.y + 1.0), Some(p));
        assert_eq!(doc.hit_test(10.0, p_rect.y + p_rect.height + 50.0), None);
    }

    #[test]
    fn test_serialize_clean_drops_injected_and_markers() {
        let doc = Document::parse(
            r#"<head><style data-canvas-injected="theme">x</style></head><p data-canvas-selected>hi</p>"#,
        );
        assert_eq!(
            doc.to_html_with(SerializeOptions::clean()),
            "<head></head><p>hi</p>"
        );
    }

    #[test]
    fn test_deep_nesting_is_flattened() {
        let n = 20_000;
        let markup = format!("{}x{}", "<div>".repeat(n), "</div>".repeat(n));
        let mut doc = Document::parse(&markup);

        let deepest = (0..doc.nodes.len())
            .map(|id| doc.depth(id))
            .max()
            .unwrap_or_default();
        assert!(deepest <= MAX_DEPTH + 1);

        doc.layout(800.0);
        let _ = doc.hit_test(10.0, 10.0);
        assert_eq!(doc.text_content(Document::ROOT), "x");
        assert_eq!(doc.to_html().matches("<div>").count(), n);
    }

    #[test]
    fn test_depth_cap_counts_from_insertion_point() {
        let outer = "<div>".repeat(MAX_DEPTH - 1);
        let mut doc = Document::parse(&format!("{outer}<p></p>"));
        let p = doc.find_first(|d, id| d.tag(id) == Some("p")).expect("p");
        assert_eq!(doc.depth(p), MAX_DEPTH);

        doc.set_inner_html(p, "<span><b>deep</b></span>");
        let b = doc.find_first(|d, id| d.tag(id) == Some("b")).expect("b");
        assert!(doc.depth(b) <= MAX_DEPTH + 1);
        assert_eq!(doc.text_content(p), "deep");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &bogus; &"), "a <b> AB &bogus; &");
    }
}
