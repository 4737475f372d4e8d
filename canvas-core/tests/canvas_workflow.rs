//! Canvas Workflow Integration Tests
//!
//! Drives a full workspace the way a host would:
//! - Select, edit in place, re-select
//! - Duplicate after editing
//! - Theme changes and history steps against reload counts
//! - Page deletion against the selection

use canvas_core::dom::{HOVER_MARKER, SELECTED_MARKER};
use canvas_core::{
    apply_theme, CanvasWorkspace, ColorTarget, DesignSystem, RenderingSurface, SurfaceBridge,
    ToolMode, ToolbarPanel,
};

const HOME: &str = "<body><h1>Welcome</h1><p>Intro text</p></body>";
const ABOUT: &str = "<body><h2>About us</h2><img src=\"team.png\" height=\"120\"></body>";

/// Workspace with `home` and `about` mounted.
fn workspace() -> CanvasWorkspace {
    let mut ws = CanvasWorkspace::default();
    ws.insert_page("home", HOME).expect("insert home");
    ws.insert_page("about", ABOUT).expect("insert about");
    ws
}

fn reloads(ws: &CanvasWorkspace, page: &str) -> u64 {
    ws.surface(page)
        .map(RenderingSurface::reload_count)
        .unwrap_or_default()
}

fn markers(ws: &CanvasWorkspace, page: &str, marker: &str) -> usize {
    ws.surface(page)
        .and_then(RenderingSurface::bridge)
        .map(|b| b.document().elements_with_attr(marker).len())
        .unwrap_or_default()
}

// ============================================================================
// Edit Flow Tests
// ============================================================================

#[test]
fn test_text_edit_is_seen_by_next_click() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    ws.open_panel(ToolbarPanel::Text).expect("open text panel");
    ws.toolbar_mut().set_text_draft("Hello");
    ws.commit_text().expect("commit");

    ws.background_click();
    ws.click("home", 10.0, 10.0);
    let selected = ws.selected().expect("selected");
    assert_eq!(selected.info.text, "Hello");
    assert_eq!(selected.info.tag_name, "h1");
}

#[test]
fn test_duplicate_after_edit_carries_edit() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    ws.open_panel(ToolbarPanel::Text).expect("open text panel");
    ws.toolbar_mut().set_text_draft("Hello");
    ws.commit_text().expect("commit");

    let copy = ws.duplicate_page("home").expect("duplicate");
    let markup = ws.pages().get(&copy).expect("copy markup");
    assert!(markup.contains("<h1>Hello</h1>"));
    assert_eq!(ws.pages().list()[1], copy);
    assert_eq!(reloads(&ws, "home"), 1);
}

#[test]
fn test_color_and_image_edits() {
    let mut ws = workspace();
    ws.click("about", 10.0, 80.0);
    assert_eq!(ws.selected().map(|s| s.info.tag_name.as_str()), Some("img"));
    ws.open_panel(ToolbarPanel::Image).expect("open image panel");
    assert_eq!(ws.toolbar().image_url_draft(), "team.png");

    ws.apply_image_file(b"\x89PNG", "image/png").expect("image file");
    let about = ws.pages().get("about").expect("about");
    assert!(about.contains("src=\"data:image/png;base64,"));

    ws.click("about", 10.0, 10.0);
    ws.apply_color("#ef4444", ColorTarget::Text).expect("color");
    assert!(ws
        .pages()
        .get("about")
        .is_some_and(|m| m.contains("<h2 style=\"color: #ef4444;\">About us</h2>")));
    assert_eq!(
        ws.selected().map(|s| s.info.computed_style["color"].as_str()),
        Some("#ef4444")
    );
}

#[test]
fn test_delete_element_clears_selection() {
    let mut ws = workspace();
    ws.click("home", 10.0, 60.0);
    ws.delete_selected().expect("delete");
    assert!(ws.selected().is_none());
    assert!(!ws.toolbar_visible());
    assert_eq!(ws.pages().get("home"), Some("<body><h1>Welcome</h1></body>"));

    assert!(ws.undo());
    assert_eq!(ws.pages().get("home"), Some(HOME));
}

#[test]
fn test_image_panel_refused_for_text() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    assert!(ws.open_panel(ToolbarPanel::Image).is_err());
    assert_eq!(ws.drain_notices().len(), 1);
}

// ============================================================================
// Selection Invariant Tests
// ============================================================================

#[test]
fn test_deleting_page_clears_its_selection() {
    let mut ws = workspace();
    ws.pointer_move("about", 10.0, 10.0);
    ws.click("about", 10.0, 10.0);
    assert_eq!(ws.selected().map(|s| s.page_id.as_str()), Some("about"));

    ws.remove_page("about").expect("remove");
    assert!(ws.selected().is_none());
    assert!(ws.selection().hovered().is_none());
    assert!(ws.surface("about").is_none());
}

#[test]
fn test_deleting_other_page_keeps_selection() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    ws.remove_page("about").expect("remove");
    assert_eq!(ws.selected().map(|s| s.page_id.as_str()), Some("home"));
}

#[test]
fn test_background_click_never_touches_hover() {
    let mut ws = workspace();
    ws.pointer_move("home", 10.0, 60.0);
    let hovered = ws.selection().hovered().cloned();
    ws.click("home", 10.0, 10.0);
    ws.background_click();
    assert!(ws.selected().is_none());
    assert_eq!(ws.selection().hovered().cloned(), hovered);
}

#[test]
fn test_selection_is_global() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    ws.click("about", 10.0, 10.0);
    assert_eq!(ws.selected().map(|s| s.page_id.as_str()), Some("about"));
}

#[test]
fn test_pan_mode_clears_markers() {
    let mut ws = workspace();
    ws.pointer_move("home", 10.0, 10.0);
    ws.click("home", 10.0, 10.0);
    ws.set_tool_mode(ToolMode::Pan);
    assert_eq!(markers(&ws, "home", HOVER_MARKER), 0);
    assert_eq!(markers(&ws, "home", SELECTED_MARKER), 0);
}

// ============================================================================
// Reload Policy Tests
// ============================================================================

#[test]
fn test_accent_change_reloads_each_surface_once() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    let accent = DesignSystem::default().with_accent("#ff0000");

    assert_eq!(ws.set_design(accent.clone()), 2);
    assert_eq!(reloads(&ws, "home"), 2);
    assert_eq!(reloads(&ws, "about"), 2);
    assert!(ws.selected().is_none());

    assert_eq!(ws.set_design(accent), 0);
    assert_eq!(reloads(&ws, "home"), 2);
}

#[test]
fn test_undo_restores_registry_and_reloads_once() {
    let mut ws = workspace();
    let before = ws.pages().snapshot();

    ws.begin_generation("home", Some("minimal")).expect("begin");
    ws.complete_generation::<String>("home", Ok("<h1>Minimal</h1>".into()))
        .expect("complete");
    let home_after_commit = reloads(&ws, "home");
    let about_after_commit = reloads(&ws, "about");

    assert!(ws.undo());
    assert_eq!(ws.pages().snapshot(), before);
    assert_eq!(reloads(&ws, "home"), home_after_commit + 1);
    assert_eq!(reloads(&ws, "about"), about_after_commit + 1);

    assert!(ws.redo());
    assert_eq!(ws.pages().get("home"), Some("<h1>Minimal</h1>"));
}

#[test]
fn test_undo_brings_back_removed_page() {
    let mut ws = workspace();
    ws.remove_page("about").expect("remove");
    assert!(ws.undo());
    assert_eq!(ws.pages().list(), vec!["home", "about"]);
    assert_eq!(reloads(&ws, "about"), 1);
    assert_eq!(reloads(&ws, "home"), 2);
}

#[test]
fn test_edits_do_not_reload() {
    let mut ws = workspace();
    ws.click("home", 10.0, 10.0);
    ws.apply_color("#22c55e", ColorTarget::Background)
        .expect("color");
    ws.click("home", 10.0, 60.0);
    ws.apply_color("#22c55e", ColorTarget::Text).expect("color");
    assert_eq!(reloads(&ws, "home"), 1);
    assert_eq!(ws.major_version(), 0);
}

#[test]
fn test_streamed_generation_then_success() {
    let mut ws = workspace();
    ws.begin_generation("home", None).expect("begin");
    ws.apply_partial_generation("home", "<h1>Dra").expect("partial");
    ws.apply_partial_generation("home", "<h1>Draft</h1>")
        .expect("partial");
    assert_eq!(reloads(&ws, "home"), 4);

    ws.complete_generation::<String>("home", Ok("<h1>Final</h1>".into()))
        .expect("complete");
    assert_eq!(ws.pages().get("home"), Some("<h1>Final</h1>"));
    assert!(ws.undo());
    assert_eq!(ws.pages().get("home"), Some(HOME));
}

#[test]
fn test_failed_stream_never_reaches_undo() {
    let mut ws = workspace();
    ws.begin_generation("home", None).expect("begin");
    ws.apply_partial_generation("home", "<h1>Half").expect("partial");

    // An edit on another page records history while `home` shows the partial.
    ws.click("about", 10.0, 10.0);
    ws.apply_color("#22c55e", ColorTarget::Text).expect("color");
    ws.complete_generation("home", Err("stream cut")).expect("complete");

    assert!(ws.undo());
    assert_eq!(ws.pages().get("home"), Some(HOME));
    assert_eq!(ws.pages().get("about"), Some(ABOUT));
}

// ============================================================================
// Untrusted Markup Tests
// ============================================================================

#[test]
fn test_deeply_nested_page_stays_usable() {
    let n = 5_000;
    let deep = format!("<body>{}Deep{}</body>", "<div>".repeat(n), "</div>".repeat(n));

    let mut ws = workspace();
    ws.insert_page("deep", &deep).expect("insert deep");
    ws.canvas_pointer_move(0.0, 0.0);
    ws.click("deep", 10.0, 1.0);
    ws.pointer_move("deep", 10.0, 1.0);
    assert!(ws.copy_code(Some("deep")).expect("copy").contains("Deep"));

    ws.begin_generation("home", None).expect("begin");
    ws.complete_generation::<String>("home", Ok(deep.clone()))
        .expect("complete");
    assert!(ws.surface("home").is_some());
}

// ============================================================================
// Theming Tests
// ============================================================================

#[test]
fn test_themed_markup_is_stable() {
    let ws = workspace();
    let themed = ws.themed_markup("home").expect("themed");
    assert_eq!(apply_theme(ws.design(), &themed, "home"), themed);
    let bridge = SurfaceBridge::load("home", &themed, 800.0);
    assert_eq!(bridge.page_markup(), HOME);
}

mod proptest_tests {
    use super::*;
    use canvas_core::viewport::{MAX_SCALE, MIN_SCALE};
    use canvas_core::Viewport;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum ViewOp {
        ZoomIn,
        ZoomOut,
        Pan(f32, f32),
        Reset,
    }

    fn arb_view_op() -> impl Strategy<Value = ViewOp> {
        prop_oneof![
            Just(ViewOp::ZoomIn),
            Just(ViewOp::ZoomOut),
            (-500.0f32..500.0f32, -500.0f32..500.0f32).prop_map(|(dx, dy)| ViewOp::Pan(dx, dy)),
            Just(ViewOp::Reset),
        ]
    }

    proptest! {
        #[test]
        fn prop_scale_stays_clamped(ops in prop::collection::vec(arb_view_op(), 0..60)) {
            let mut viewport = Viewport::new(1200.0, 800.0);
            viewport.set_content_size(3000.0, 768.0);
            for op in ops {
                match op {
                    ViewOp::ZoomIn => viewport.zoom_in(),
                    ViewOp::ZoomOut => viewport.zoom_out(),
                    ViewOp::Pan(dx, dy) => viewport.pan(dx, dy),
                    ViewOp::Reset => viewport.reset(),
                }
                let scale = viewport.scale();
                prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&scale), "scale {} out of range", scale);
            }
        }

        #[test]
        fn prop_single_hover_marker_matches_latest_hover(
            moves in prop::collection::vec((0.0f32..1100.0f32, 0.0f32..160.0f32), 1..40)
        ) {
            let mut ws = workspace();
            for (x, y) in moves {
                ws.pointer_move("home", x, y);
                let count = markers(&ws, "home", HOVER_MARKER);
                prop_assert!(count <= 1);

                let bridge = ws
                    .surface("home")
                    .and_then(RenderingSurface::bridge)
                    .expect("bridge");
                let marked = bridge.document().elements_with_attr(HOVER_MARKER);
                match ws.selection().hovered() {
                    Some(hovered) => {
                        prop_assert_eq!(count, 1);
                        prop_assert_eq!(bridge.document().tag(marked[0]), Some(hovered.tag_name.as_str()));
                    }
                    None => prop_assert_eq!(count, 0),
                }
            }
        }

        #[test]
        fn prop_apply_theme_is_idempotent(text in "[a-zA-Z0-9 ]{0,40}", accent in "#[0-9a-f]{6}") {
            let design = DesignSystem::default().with_accent(accent);
            let markup = format!("<p>{text}</p>");
            let once = apply_theme(&design, &markup, "home");
            let twice = apply_theme(&design, &once, "home");
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(canvas_core::strip_theme(&once), markup);
        }
    }
}
