//! Theming engine.
//!
//! [`apply_theme`] is a pure function of `(design, markup, page_id)`: it
//! injects one style block and one bridge script, both tagged with
//! [`INJECTED_ATTR`](crate::dom::INJECTED_ATTR). Markup that already carries
//! injected blocks is cleaned first, so theming never accumulates.
//! [`page_markup`] recovers the registry form from a live document.

use std::fmt::Write as _;

use crate::design::DesignSystem;
use crate::dom::{Document, SerializeOptions, INJECTED_ATTR};

/// Attribute on a synthesized `<html>` shell recording how it was built.
pub const SHELL_ATTR: &str = "data-canvas-shell";

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");
const PAGE_ID_PLACEHOLDER: &str = "__CANVAS_PAGE_ID__";

/// Utility classes recolored with the accent as background.
const ACCENT_BACKGROUND_CLASSES: &[&str] = &[
    "bg-primary",
    "bg-blue-500",
    "bg-blue-600",
    "bg-indigo-500",
    "bg-indigo-600",
    "bg-violet-600",
];

/// Utility classes recolored with the accent as text color.
const ACCENT_TEXT_CLASSES: &[&str] = &[
    "text-primary",
    "text-blue-500",
    "text-blue-600",
    "text-indigo-500",
    "text-indigo-600",
    "text-violet-600",
];

/// Utility classes recolored with the accent as border color.
const ACCENT_BORDER_CLASSES: &[&str] = &[
    "border-primary",
    "border-blue-500",
    "border-blue-600",
    "border-indigo-500",
    "border-indigo-600",
];

const ROUNDED_CLASSES: &[&str] = &[
    "rounded",
    "rounded-sm",
    "rounded-md",
    "rounded-lg",
    "rounded-xl",
    "rounded-2xl",
    "rounded-3xl",
];

const BORDER_WIDTH_CLASSES: &[&str] = &["border", "border-2", "border-4", "border-8"];

const DARK_SURFACE_CLASSES: &[&str] = &["bg-white", "bg-gray-50", "bg-gray-100", "bg-slate-50"];

const DARK_TEXT_CLASSES: &[&str] = &[
    "text-black",
    "text-gray-900",
    "text-gray-800",
    "text-gray-700",
    "text-slate-900",
];

const DARK_BACKGROUND: &str = "#0f172a";
const DARK_SURFACE: &str = "#1e293b";
const DARK_TEXT: &str = "#e2e8f0";

/// Theme `markup` for `page_id` under `design`.
#[must_use]
pub fn apply_theme(design: &DesignSystem, markup: &str, page_id: &str) -> String {
    let clean = if markup.contains(INJECTED_ATTR) {
        page_markup(&Document::parse(markup))
    } else {
        markup.to_string()
    };

    let injection = format!(
        "{}{}",
        style_block(design),
        bridge_script(page_id)
    );
    let lower = clean.to_ascii_lowercase();

    if let Some(idx) = lower.find("</head>") {
        let mut out = String::with_capacity(clean.len() + injection.len());
        out.push_str(&clean[..idx]);
        out.push_str(&injection);
        out.push_str(&clean[idx..]);
        return out;
    }

    let head = format!(r#"<head {INJECTED_ATTR}="head">{injection}</head>"#);

    if let Some(open) = lower.find("<html") {
        if let Some(close) = lower[open..].find('>') {
            let at = open + close + 1;
            return format!("{}{head}{}", &clean[..at], &clean[at..]);
        }
    }

    if lower.contains("<body") {
        format!(r#"<!DOCTYPE html><html {SHELL_ATTR}="document">{head}{clean}</html>"#)
    } else {
        format!(
            r#"<!DOCTYPE html><html {SHELL_ATTR}="fragment">{head}<body>{clean}</body></html>"#
        )
    }
}

/// Recover registry markup from a (possibly live-edited) themed document:
/// injected blocks and selection markers are dropped and any synthesized
/// shell is unwrapped.
#[must_use]
pub fn page_markup(doc: &Document) -> String {
    let options = SerializeOptions::clean();
    let shell = doc
        .document_element()
        .filter(|&html| doc.tag(html) == Some("html"))
        .and_then(|html| doc.attr(html, SHELL_ATTR).map(|kind| (html, kind)));

    match shell {
        Some((_, kind)) if kind == "fragment" => doc
            .body()
            .map(|body| doc.inner_html_with(body, options))
            .unwrap_or_default(),
        Some((html, _)) => doc.inner_html_with(html, options),
        None => doc.to_html_with(options),
    }
}

/// Convenience: strip theming from a themed markup string.
#[must_use]
pub fn strip_theme(themed: &str) -> String {
    page_markup(&Document::parse(themed))
}

/// The injected `<style>` block.
#[must_use]
pub fn style_block(design: &DesignSystem) -> String {
    let mut css = String::new();
    let _ = write!(
        css,
        ":root{{--canvas-accent:{accent};--canvas-radius:{radius}px;--canvas-stroke:{stroke}px;--canvas-font:{font};}}",
        accent = sanitize_css(&design.accent_color),
        radius = design.corner_radius,
        stroke = design.stroke_width,
        font = sanitize_css(&design.font),
    );
    css.push_str("body{font-family:var(--canvas-font);}");
    push_rule(&mut css, ACCENT_BACKGROUND_CLASSES, "background-color:var(--canvas-accent)");
    push_rule(&mut css, ACCENT_TEXT_CLASSES, "color:var(--canvas-accent)");
    push_rule(&mut css, ACCENT_BORDER_CLASSES, "border-color:var(--canvas-accent)");
    push_rule(&mut css, ROUNDED_CLASSES, "border-radius:var(--canvas-radius)");
    push_rule(&mut css, BORDER_WIDTH_CLASSES, "border-width:var(--canvas-stroke)");
    css.push_str(
        "[data-canvas-hover]{outline:2px dashed var(--canvas-accent);outline-offset:2px;cursor:pointer;}",
    );
    css.push_str("[data-canvas-selected]{outline:2px solid var(--canvas-accent);outline-offset:2px;}");

    if design.is_dark() {
        let _ = write!(
            css,
            "html,body{{background-color:{DARK_BACKGROUND} !important;color:{DARK_TEXT} !important;}}"
        );
        push_rule(
            &mut css,
            DARK_SURFACE_CLASSES,
            &format!("background-color:{DARK_SURFACE}"),
        );
        push_rule(&mut css, DARK_TEXT_CLASSES, &format!("color:{DARK_TEXT}"));
    }

    format!(r#"<style {INJECTED_ATTR}="theme">{css}</style>"#)
}

/// The injected bridge `<script>` bound to `page_id`.
#[must_use]
pub fn bridge_script(page_id: &str) -> String {
    let literal = serde_json::to_string(page_id)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/");
    let body = BRIDGE_SCRIPT.replace(PAGE_ID_PLACEHOLDER, &literal);
    format!(r#"<script {INJECTED_ATTR}="bridge">{body}</script>"#)
}

fn push_rule(css: &mut String, classes: &[&str], declaration: &str) {
    let selector = classes
        .iter()
        .map(|c| format!(".{c}"))
        .collect::<Vec<_>>()
        .join(",");
    let _ = write!(css, "{selector}{{{declaration} !important;}}");
}

/// Keep user-provided values from closing the declaration or the block.
fn sanitize_css(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::ColorMode;

    #[test]
    fn test_apply_theme_is_deterministic() {
        let design = DesignSystem::default();
        let markup = "<body><h1>Hi</h1></body>";
        assert_eq!(
            apply_theme(&design, markup, "home"),
            apply_theme(&design, markup, "home")
        );
    }

    #[test]
    fn test_reapplying_does_not_accumulate() {
        let design = DesignSystem::default();
        for markup in [
            "<body><h1>Hi</h1></body>",
            "<h1>fragment</h1><p>x</p>",
            "<html><head><title>T</title></head><body><p>a</p></body></html>",
            "<html><body><p>no head</p></body></html>",
        ] {
            let once = apply_theme(&design, markup, "p");
            let twice = apply_theme(&design, &once, "p");
            assert_eq!(once, twice, "markup: {markup}");
            assert_eq!(once.matches(INJECTED_ATTR).count(), if markup.contains("<head>") { 2 } else { 3 });
        }
    }

    #[test]
    fn test_injects_before_head_close() {
        let themed = apply_theme(
            &DesignSystem::default(),
            "<html><head><title>T</title></head><body></body></html>",
            "home",
        );
        let style_at = themed.find("<style").expect("style");
        let head_close = themed.find("</head>").expect("head close");
        assert!(style_at < head_close);
        assert!(themed.starts_with("<html><head><title>T</title><style"));
    }

    #[test]
    fn test_fragment_wrapped_in_shell() {
        let themed = apply_theme(&DesignSystem::default(), "<h1>Hi</h1>", "home");
        assert!(themed.starts_with("<!DOCTYPE html><html data-canvas-shell=\"fragment\">"));
        assert!(themed.ends_with("<body><h1>Hi</h1></body></html>"));
    }

    #[test]
    fn test_strip_theme_recovers_markup() {
        let design = DesignSystem::default();
        for markup in [
            "<body><h1>Hi</h1></body>",
            "<h1>fragment</h1>",
            "<html><head><title>T</title></head><body><p>a</p></body></html>",
            "<html><body><p>no head</p></body></html>",
        ] {
            assert_eq!(strip_theme(&apply_theme(&design, markup, "x")), markup);
        }
    }

    #[test]
    fn test_style_block_contents() {
        let design = DesignSystem::default()
            .with_accent("#ff0000")
            .with_corner_radius(12);
        let css = style_block(&design);
        assert!(css.contains("--canvas-accent:#ff0000"));
        assert!(css.contains("--canvas-radius:12px"));
        assert!(css.contains(".bg-blue-500"));
        assert!(css.contains(".rounded-lg"));
        assert!(!css.contains(DARK_BACKGROUND));

        let dark = style_block(&design.with_color_mode(ColorMode::Dark));
        assert!(dark.contains(DARK_BACKGROUND));
    }

    #[test]
    fn test_bridge_script_is_parameterized() {
        let script = bridge_script("ho\"me</script>");
        assert!(!script.contains(PAGE_ID_PLACEHOLDER));
        assert!(script.contains(r#"var PAGE_ID = "ho\"me<\/script>";"#));
        assert_eq!(script.matches("</script>").count(), 1);
    }

    #[test]
    fn test_bridge_expands_short_hex_like_to_hex() {
        // The in-frame capture must report the same form as `color::to_hex`.
        assert_eq!(crate::color::to_hex("#ABC"), "#aabbcc");
        assert!(BRIDGE_SCRIPT.contains("digits.length === 3"));
        assert!(BRIDGE_SCRIPT.contains(r#"digits.replace(/./g, "$&$&")"#));
        assert!(!BRIDGE_SCRIPT.contains(r##"if (!value) return "#ffffff";"##));
    }

    #[test]
    fn test_css_values_are_sanitized() {
        let design = DesignSystem::default().with_accent("red;}</style><script>");
        let css = style_block(&design);
        assert!(css.contains("--canvas-accent:red/stylescript;"));
    }
}
