//! End-to-end tests for the studio host: pages on disk, HTTP regeneration,
//! toolbar edits, themed output and copy.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;

use canvas_core::{CanvasWorkspace, ColorTarget, DesignSystem, ToolbarPanel, WorkspaceConfig};
use canvas_studio::{BuiltinIcons, ClipboardError, ClipboardSink, HttpVariantGenerator, Studio};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = "<body><h1>Welcome</h1><p>Intro text</p></body>";
const ABOUT: &str = "<body><h2>About us</h2></body>";

/// Clipboard whose contents the test can still read after handing it over.
#[derive(Clone, Default)]
struct SharedClipboard(Rc<RefCell<Option<String>>>);

impl ClipboardSink for SharedClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        *self.0.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

fn pages_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("home.html"), HOME).expect("write");
    fs::write(dir.path().join("about.html"), ABOUT).expect("write");
    dir
}

fn studio(endpoint: &str) -> Studio {
    let generator = HttpVariantGenerator::new(endpoint).expect("client");
    let workspace = CanvasWorkspace::with_design(
        WorkspaceConfig::default(),
        DesignSystem::default().with_accent("#ef4444"),
    );
    Studio::new(workspace, Arc::new(generator))
}

// ============================================================================
// Regeneration
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_variant_round_trip_through_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "markup": "<body><h1>Bold welcome</h1></body>" })),
        )
        .mount(&server)
        .await;

    let dir = pages_dir();
    let mut studio = studio(&format!("{}/generate", server.uri()));
    let loaded = studio.load_pages(dir.path()).expect("load");
    assert_eq!(loaded, vec!["about".to_string(), "home".to_string()]);

    studio.request_variant("home", Some("bold")).expect("request");
    studio.run_until_idle().await;

    let workspace = studio.workspace();
    assert_eq!(
        workspace.pages().get("home"),
        Some("<body><h1>Bold welcome</h1></body>")
    );
    assert_eq!(workspace.pages().get("about"), Some(ABOUT));
    assert!(workspace.can_undo());

    let requests = server.received_requests().await.expect("recorded");
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().expect("json body");
    assert_eq!(body["pageId"], "home");
    assert_eq!(body["currentMarkup"], HOME);
    assert_eq!(body["variantName"], "bold");
    assert_eq!(body["designSystem"]["accentColor"], "#ef4444");
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_service_error_leaves_page_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model offline"))
        .mount(&server)
        .await;

    let dir = pages_dir();
    let mut studio = studio(&format!("{}/generate", server.uri()));
    studio.load_pages(dir.path()).expect("load");

    studio.request_variant("home", None).expect("request");
    studio.run_until_idle().await;

    assert_eq!(studio.workspace().pages().get("home"), Some(HOME));
    assert!(!studio.workspace().is_generating("home"));
    assert!(!studio.workspace().can_undo());
    let notices = studio.drain_notices();
    assert!(notices.iter().any(|n| n.message.contains("model offline")));
}

// ============================================================================
// Editing, output and copy
// ============================================================================

#[test]
fn test_edits_reach_output_and_clipboard() {
    let dir = pages_dir();
    let clipboard = SharedClipboard::default();
    let mut studio =
        studio("http://localhost:9/generate").with_clipboard(Box::new(clipboard.clone()));
    studio.load_pages(dir.path()).expect("load");

    // Select the heading of "home" and change its text and color.
    let workspace = studio.workspace_mut();
    workspace.click("home", 10.0, 10.0);
    workspace.pump();
    assert_eq!(workspace.selected().expect("selected").info.tag_name, "h1");
    workspace.open_panel(ToolbarPanel::Text).expect("text panel");
    workspace.toolbar_mut().set_text_draft("Hello there");
    workspace.commit_text().expect("commit");
    workspace
        .apply_color("#22c55e", ColorTarget::Text)
        .expect("color");

    assert!(studio.copy_code(Some("home")));
    let copied = clipboard.0.borrow().clone().expect("copied");
    assert!(copied.contains("Hello there"));
    assert!(copied.contains("#22c55e"));
    assert!(!copied.contains("data-canvas"));

    let out = tempfile::tempdir().expect("tempdir");
    studio.write_output(out.path()).expect("write");
    let themed = fs::read_to_string(out.path().join("home.html")).expect("read");
    assert!(themed.contains("Hello there"));
    assert!(themed.contains("#ef4444"));
}

#[test]
fn test_copy_all_pages_in_order() {
    let dir = pages_dir();
    let clipboard = SharedClipboard::default();
    let mut studio =
        studio("http://localhost:9/generate").with_clipboard(Box::new(clipboard.clone()));
    studio.load_pages(dir.path()).expect("load");

    assert!(studio.copy_code(None));
    let copied = clipboard.0.borrow().clone().expect("copied");
    let about = copied.find("<!-- page: about -->").expect("about marker");
    let home = copied.find("<!-- page: home -->").expect("home marker");
    assert!(about < home);
}

#[test]
fn test_icon_failure_keeps_panel_open() {
    let dir = pages_dir();
    let mut studio = studio("http://localhost:9/generate");
    studio.load_pages(dir.path()).expect("load");

    let workspace = studio.workspace_mut();
    workspace.click("home", 10.0, 10.0);
    workspace.pump();
    workspace.open_panel(ToolbarPanel::Icon).expect("icon panel");

    let icons = BuiltinIcons::default();
    assert!(workspace.apply_icon(&icons, "no-such-icon").is_err());
    assert_eq!(workspace.toolbar().panel(), Some(ToolbarPanel::Icon));

    workspace.apply_icon(&icons, "star").expect("icon");
    assert!(workspace.pages().get("home").expect("home").contains("<svg"));
}
