//! Inline style handling and the computed-style subset captured on select.

use std::collections::BTreeMap;

use crate::color;
use crate::dom::{Document, NodeId};

/// Font size used when nothing more specific applies.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Properties captured into an element snapshot, as (snapshot key, CSS name).
pub const CAPTURED_PROPERTIES: &[(&str, &str)] = &[
    ("color", "color"),
    ("backgroundColor", "background-color"),
    ("fontSize", "font-size"),
    ("fontWeight", "font-weight"),
    ("fontFamily", "font-family"),
    ("textAlign", "text-align"),
    ("borderRadius", "border-radius"),
    ("padding", "padding"),
];

const INHERITED: &[&str] = &["color", "font-size", "font-weight", "font-family", "text-align"];

const COLOR_PROPERTIES: &[&str] = &["color", "background-color"];

/// Parse an inline `style` attribute into ordered declarations.
#[must_use]
pub fn parse_inline(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

/// Serialize declarations back into an inline style string.
#[must_use]
pub fn to_inline(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(n, v)| format!("{n}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merge property updates (camelCase or kebab-case keys) into an inline
/// style string. Later values win; an empty value removes the property.
#[must_use]
pub fn merge_inline(existing: &str, updates: &BTreeMap<String, String>) -> String {
    let mut decls = parse_inline(existing);
    for (key, value) in updates {
        let name = camel_to_kebab(key);
        let value = value.trim();
        match decls.iter().position(|(n, _)| *n == name) {
            Some(i) if value.is_empty() => {
                decls.remove(i);
            }
            Some(i) => decls[i].1 = value.to_string(),
            None if value.is_empty() => {}
            None => decls.push((name, value.to_string())),
        }
    }
    to_inline(&decls)
}

/// `backgroundColor` → `background-color`. Kebab-case input is unchanged.
#[must_use]
pub fn camel_to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a pixel length (`"12"`, `"12px"`, `"12.5px"`).
#[must_use]
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let number = v.strip_suffix("px").unwrap_or(v).trim();
    number.parse::<f32>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}

fn inline_value(doc: &Document, id: NodeId, property: &str) -> Option<String> {
    let style = doc.attr(id, "style")?;
    parse_inline(&style)
        .into_iter()
        .rev()
        .find(|(n, _)| n == property)
        .map(|(_, v)| v)
}

fn tag_default(tag: &str, property: &str) -> Option<&'static str> {
    match (property, tag) {
        ("font-size", "h1") => Some("32px"),
        ("font-size", "h2") => Some("24px"),
        ("font-size", "h3") => Some("20px"),
        ("font-size", "small") => Some("13px"),
        ("font-weight", "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "strong" | "b" | "th") => {
            Some("700")
        }
        _ => None,
    }
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "color" => "rgb(0, 0, 0)",
        "background-color" => "rgba(0, 0, 0, 0)",
        "font-size" => "16px",
        "font-weight" => "400",
        "font-family" => "sans-serif",
        "text-align" => "start",
        _ => "0px",
    }
}

/// Resolve one property the way a cascade without stylesheets would:
/// inline value, then tag default, then inherited, then initial.
#[must_use]
pub fn computed_value(doc: &Document, id: NodeId, property: &str) -> String {
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if let Some(value) = inline_value(doc, current, property) {
            return value;
        }
        if let Some(value) = doc.tag(current).and_then(|t| tag_default(t, property)) {
            return value.to_string();
        }
        if !INHERITED.contains(&property) {
            break;
        }
        cursor = doc.parent(current).filter(|&p| doc.is_element(p));
    }
    initial_value(property).to_string()
}

/// Effective font size in pixels.
#[must_use]
pub fn font_size_px(doc: &Document, id: NodeId) -> f32 {
    parse_px(&computed_value(doc, id, "font-size")).unwrap_or(DEFAULT_FONT_SIZE)
}

/// Uniform inline padding in pixels (first value of the shorthand).
#[must_use]
pub fn padding_px(doc: &Document, id: NodeId) -> f32 {
    inline_value(doc, id, "padding")
        .and_then(|v| v.split_whitespace().next().and_then(parse_px))
        .unwrap_or(0.0)
}

/// The captured computed-style subset, colors converted to hex.
#[must_use]
pub fn computed_subset(doc: &Document, id: NodeId) -> BTreeMap<String, String> {
    CAPTURED_PROPERTIES
        .iter()
        .map(|(key, property)| {
            let raw = computed_value(doc, id, property);
            let value = if COLOR_PROPERTIES.contains(property) {
                color::to_hex(&raw)
            } else {
                raw
            };
            ((*key).to_string(), value)
        })
        .collect()
}
