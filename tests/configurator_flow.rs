//! Configurator Flow Tests - guard, load, recolor, submit, reset
//!
//! Drives the coordinator end to end against in-memory stand-ins for the
//! three.js surface, the HTML form, page navigation and the backend.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{block_on, LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use nalgebra::Point3;
use serde_json::{json, Value};

use bag_configurator::app::{self, Configurator, LoadState};
use bag_configurator::color::{Color, AMBIENT_LERP};
use bag_configurator::decal::DecalSpec;
use bag_configurator::form::{Attachment, FileField, RawForm};
use bag_configurator::material::BackdropSurface;
use bag_configurator::scene::{Aabb, RenderablePart, SceneGraph};
use bag_configurator::submission::{BagApi, BagRequest, PartValue, SubmissionState};
use bag_configurator::surface::{ModelLoader, RenderSurface, SceneSettings};
use bag_configurator::ui::{FormSurface, Navigator, Notice, Overlay, UiState};
use bag_configurator::{AppConfig, ConfiguratorError, Result, SessionToken};

// ============================================================================
// Stand-ins
// ============================================================================

#[derive(Default)]
struct FakeSurface {
    configured: bool,
    part_colors: Vec<(String, Option<Color>)>,
    backdrop: Vec<BackdropSurface>,
    decals: Vec<DecalSpec>,
    capture_fails: bool,
}

impl RenderSurface for FakeSurface {
    fn configure(&mut self, _settings: &SceneSettings) {
        self.configured = true;
    }

    fn apply_part_colors(&mut self, parts: &[RenderablePart]) {
        self.part_colors = parts.iter().map(|p| (p.name.clone(), p.color)).collect();
    }

    fn set_backdrop(&mut self, surfaces: &[BackdropSurface]) {
        self.backdrop = surfaces.to_vec();
    }

    fn add_decal(&mut self, decal: &DecalSpec) {
        self.decals.push(decal.clone());
    }

    fn capture_frame(&self) -> Result<Attachment> {
        if self.capture_fails {
            return Err(ConfiguratorError::Capture("context lost".into()));
        }
        Ok(Attachment::png("screenshot.png", vec![0x89, b'P', b'N', b'G']))
    }
}

#[derive(Default)]
struct FakeForm {
    last_ui: Option<UiState>,
    color_input: String,
    clears: usize,
}

impl FormSurface for FakeForm {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn set_color_input(&mut self, hex: &str) {
        self.color_input = hex.to_owned();
    }

    fn render(&mut self, ui: &UiState) {
        self.last_ui = Some(ui.clone());
    }
}

#[derive(Default, Clone)]
struct FakeNavigator {
    visited: Rc<RefCell<Vec<String>>>,
}

impl Navigator for FakeNavigator {
    fn navigate(&self, url: &str) {
        self.visited.borrow_mut().push(url.to_owned());
    }
}

struct FakeLoader {
    result: Result<SceneGraph>,
    calls: Cell<usize>,
}

impl FakeLoader {
    fn ok() -> Self {
        Self {
            result: Ok(bag_scene()),
            calls: Cell::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(ConfiguratorError::AssetLoad("404".into())),
            calls: Cell::new(0),
        }
    }
}

impl ModelLoader for FakeLoader {
    async fn load_model(&self, _path: &str) -> Result<SceneGraph> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

struct FakeApi {
    outcome: Result<Value>,
    requests: RefCell<Vec<BagRequest>>,
}

impl FakeApi {
    fn answering(outcome: Result<Value>) -> Self {
        Self {
            outcome,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl BagApi for FakeApi {
    async fn post_bag(&self, request: BagRequest) -> Result<Value> {
        self.requests.borrow_mut().push(request);
        self.outcome.clone()
    }
}

/// Holds every request open until the test answers it.
#[derive(Default)]
struct GatedApi {
    gates: RefCell<Vec<oneshot::Sender<Result<Value>>>>,
}

impl GatedApi {
    fn take_gates(&self) -> Vec<oneshot::Sender<Result<Value>>> {
        self.gates.borrow_mut().drain(..).collect()
    }
}

impl BagApi for GatedApi {
    async fn post_bag(&self, _request: BagRequest) -> Result<Value> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push(tx);
        rx.await
            .unwrap_or_else(|_| Err(ConfiguratorError::SubmissionNetwork("gate dropped".into())))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

type TestApp = Configurator<FakeSurface, FakeForm, FakeNavigator>;

fn config() -> AppConfig {
    AppConfig {
        api_url: "https://api.example.com/v1".into(),
        dashboard_url: "https://vote.example.com".into(),
        ..AppConfig::default()
    }
}

fn bag_scene() -> SceneGraph {
    let bounds = Aabb::new(Point3::new(-1.0, -1.5, -0.3), Point3::new(1.0, 1.5, 0.3));
    SceneGraph::new(vec![
        RenderablePart::new("bag", bounds),
        RenderablePart::new("crimp", bounds),
        RenderablePart::new("nutrition-label", bounds).with_fixed_texture(),
    ])
}

fn new_app() -> RefCell<TestApp> {
    RefCell::new(Configurator::new(
        config(),
        SessionToken::new("tok-123"),
        FakeSurface::default(),
        FakeForm::default(),
        FakeNavigator::default(),
    ))
}

fn loaded_app() -> RefCell<TestApp> {
    let app = new_app();
    block_on(app::load_model(&app, &FakeLoader::ok()));
    app
}

fn filled_form() -> RawForm {
    RawForm {
        name: Some("Fire Crunch".into()),
        font: Some("Bangers".into()),
        color: Some("#e01b2f".into()),
        flavours: Some("chili, lime ,salt".into()),
        image: FileField::Empty,
    }
}

fn part_color(app: &TestApp, name: &str) -> Option<Color> {
    app.scene().unwrap().find(name).unwrap().color
}

fn spawn_submit(spawner: &LocalSpawner, app: &Rc<RefCell<TestApp>>, api: &Rc<GatedApi>) {
    let (app, api) = (app.clone(), api.clone());
    spawner
        .spawn_local(async move {
            app::submit(&*app, filled_form(), &*api).await;
        })
        .unwrap();
}

// ============================================================================
// Session guard
// ============================================================================

#[test]
fn test_start_without_token_builds_nothing_and_redirects() {
    let nav = FakeNavigator::default();
    let built = Cell::new(0);

    let started = app::start("https://bags.example.com/configure", config(), nav.clone(), |_| {
        built.set(built.get() + 1);
        Ok::<_, ConfiguratorError>((FakeSurface::default(), FakeForm::default(), FakeLoader::ok()))
    });

    assert!(started.unwrap().is_none());
    // No surface, form or loader may exist without a token.
    assert_eq!(built.get(), 0);
    assert_eq!(*nav.visited.borrow(), ["https://vote.example.com/login"]);
}

#[test]
fn test_start_with_token_builds_once_then_loads() {
    let nav = FakeNavigator::default();
    let built = Cell::new(0);

    let started = app::start("https://bags.example.com/?token=tok-123", config(), nav.clone(), |cfg| {
        built.set(built.get() + 1);
        assert_eq!(cfg.dashboard_url, "https://vote.example.com");
        Ok::<_, ConfiguratorError>((FakeSurface::default(), FakeForm::default(), FakeLoader::ok()))
    });
    let (configurator, loader) = started.unwrap().unwrap();
    assert_eq!(built.get(), 1);
    assert!(configurator.surface().configured);
    assert_eq!(loader.calls.get(), 0);

    let app = RefCell::new(configurator);
    block_on(app::load_model(&app, &loader));
    assert_eq!(loader.calls.get(), 1);
    assert_eq!(app.borrow().load_state(), &LoadState::Ready);
    assert!(nav.visited.borrow().is_empty());
}

#[test]
fn test_start_reports_build_failure() {
    let started = app::start(
        "https://bags.example.com/?token=tok-123",
        config(),
        FakeNavigator::default(),
        |_| Err::<(FakeSurface, FakeForm, FakeLoader), _>(ConfiguratorError::Config("no canvas".into())),
    );
    assert_eq!(started.err(), Some(ConfiguratorError::Config("no canvas".into())));
}

#[test]
fn test_guard_with_token_lets_us_in() {
    let nav = FakeNavigator::default();
    let token = app::guard("https://bags.example.com/?token=tok-123", &config(), &nav).unwrap();
    assert_eq!(token.as_str(), "tok-123");
    assert!(nav.visited.borrow().is_empty());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_new_app_configures_surface_and_shows_overlay() {
    let app = new_app();
    let app = app.borrow();
    assert!(app.surface().configured);
    assert_eq!(app.form().color_input, "#ffffff");
    assert_eq!(app.form().last_ui.as_ref().unwrap().overlay, Overlay::Loading);
    assert_eq!(app.surface().backdrop.len(), 2);
}

#[test]
fn test_load_paints_parts_then_places_one_decal() {
    let app = loaded_app();
    let app = app.borrow();

    assert_eq!(app.load_state(), &LoadState::Ready);
    assert_eq!(app.ui().overlay, Overlay::Hidden);

    assert_eq!(part_color(&app, "bag"), Some(Color::WHITE));
    assert_eq!(part_color(&app, "crimp"), Some(Color::WHITE));
    assert_eq!(part_color(&app, "nutrition-label"), None);

    assert_eq!(app.surface().decals.len(), 1);
    assert_eq!(app.surface().decals[0].target, "bag");
    assert_eq!(app.surface().decals[0].position, Point3::new(0.0, 0.0, 0.3));
    assert_eq!(app.scene().unwrap().decal_count(), 1);
}

#[test]
fn test_decal_uses_fallback_name() {
    let app = new_app();
    let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    let loader = FakeLoader {
        result: Ok(SceneGraph::new(vec![RenderablePart::new("Object_2", bounds)])),
        calls: Cell::new(0),
    };
    block_on(app::load_model(&app, &loader));
    assert_eq!(app.borrow().surface().decals[0].target, "Object_2");
}

#[test]
fn test_model_without_target_gets_no_decal() {
    let app = new_app();
    let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    let loader = FakeLoader {
        result: Ok(SceneGraph::new(vec![RenderablePart::new("pouch", bounds)])),
        calls: Cell::new(0),
    };
    block_on(app::load_model(&app, &loader));

    let app = app.borrow();
    assert_eq!(app.load_state(), &LoadState::Ready);
    assert!(app.surface().decals.is_empty());
}

#[test]
fn test_failed_load_offers_retry() {
    let app = new_app();
    block_on(app::load_model(&app, &FakeLoader::failing()));
    assert!(matches!(app.borrow().load_state(), LoadState::Failed(_)));
    assert!(matches!(app.borrow().ui().overlay, Overlay::Failed(_)));

    block_on(app::load_model(&app, &FakeLoader::ok()));
    let app = app.borrow();
    assert_eq!(app.load_state(), &LoadState::Ready);
    assert_eq!(app.ui().overlay, Overlay::Hidden);
    assert_eq!(app.surface().decals.len(), 1);
}

// ============================================================================
// Recoloring
// ============================================================================

#[test]
fn test_color_change_reaches_parts_and_backdrop_immediately() {
    let app = loaded_app();
    app.borrow_mut().set_color("#e01b2f");

    let app = app.borrow();
    let red = Color::parse_hex("#e01b2f").unwrap();
    assert_eq!(part_color(&app, "bag"), Some(red));
    assert_eq!(part_color(&app, "nutrition-label"), None);
    assert!(app.scene().unwrap().parts().iter().filter(|p| p.is_decal).all(|p| p.color.is_none()));

    let pushed: Vec<_> = app.surface().part_colors.iter().filter(|(n, _)| n == "bag").collect();
    assert_eq!(pushed[0].1, Some(red));

    let tint = red.lerp(Color::WHITE, AMBIENT_LERP);
    assert!(app.surface().backdrop.iter().all(|b| b.tint == tint));
}

#[test]
fn test_garbage_color_changes_nothing() {
    let app = loaded_app();
    app.borrow_mut().set_color("#e01b2f");
    app.borrow_mut().set_color("banana");
    assert_eq!(app.borrow().colors().bag_color().to_hex(), "#e01b2f");
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_successful_submit_then_continue_to_voting() {
    let app = loaded_app();
    let api = FakeApi::answering(Ok(json!({ "_id": "bag-1" })));

    assert!(block_on(app::submit(&app, filled_form(), &api)));

    {
        let requests = api.requests.borrow();
        let req = &requests[0];
        assert_eq!(req.url, "https://api.example.com/v1/bags");
        assert_eq!(req.authorization, "Bearer tok-123");
        assert_eq!(
            req.form.get("keyFlavours"),
            Some(&PartValue::Text(r#"["chili","lime","salt"]"#.into()))
        );
        assert_eq!(req.form.get("user"), Some(&PartValue::Text("anonymous".into())));
        assert!(req.form.get("image").is_none());
        assert!(matches!(req.form.get("screenshot"), Some(PartValue::File(_))));
    }

    let app = app.borrow();
    assert!(matches!(app.submission_state(), SubmissionState::Submitted { .. }));
    assert!(!app.ui().submit_enabled);
    assert!(app.ui().continue_visible);

    app.continue_to_dashboard();
    assert_eq!(
        *app.navigator().visited.borrow(),
        ["https://vote.example.com/voting?token=tok-123"]
    );
}

#[test]
fn test_no_resubmit_after_success() {
    let app = loaded_app();
    let api = FakeApi::answering(Ok(json!({})));
    assert!(block_on(app::submit(&app, filled_form(), &api)));
    assert!(!block_on(app::submit(&app, filled_form(), &api)));
    assert_eq!(api.requests.borrow().len(), 1);
}

#[test]
fn test_continue_before_submit_goes_nowhere() {
    let app = loaded_app();
    app.borrow().continue_to_dashboard();
    assert!(app.borrow().navigator().visited.borrow().is_empty());
}

#[test]
fn test_network_failure_is_shown_and_form_stays_submittable() {
    let app = loaded_app();
    let failing = FakeApi::answering(Err(ConfiguratorError::SubmissionNetwork("offline".into())));

    assert!(!block_on(app::submit(&app, filled_form(), &failing)));
    {
        let app = app.borrow();
        assert!(matches!(app.submission_state(), SubmissionState::ErrorReported { .. }));
        assert!(app.ui().submit_enabled);
        assert!(!app.ui().continue_visible);
        assert!(matches!(app.ui().notice, Some(Notice::Error(_))));
    }

    let working = FakeApi::answering(Ok(json!({})));
    assert!(block_on(app::submit(&app, filled_form(), &working)));
}

#[test]
fn test_timeout_is_reported_to_the_user() {
    let app = loaded_app();
    let api = FakeApi::answering(Err(ConfiguratorError::SubmissionTimeout { after_ms: 15_000 }));
    block_on(app::submit(&app, filled_form(), &api));
    assert_eq!(
        app.borrow().ui().notice,
        Some(Notice::Error("The server took too long to answer. Please try again.".into()))
    );
}

#[test]
fn test_validation_error_blocks_request() {
    let app = loaded_app();
    let api = FakeApi::answering(Ok(json!({})));
    let form = RawForm {
        font: None,
        ..filled_form()
    };

    assert!(!block_on(app::submit(&app, form, &api)));
    assert!(api.requests.borrow().is_empty());
    let app = app.borrow();
    assert_eq!(app.submission_state(), &SubmissionState::Idle);
    assert!(matches!(app.ui().notice, Some(Notice::Error(_))));
    assert!(app.ui().submit_enabled);
}

#[test]
fn test_capture_failure_blocks_request() {
    let api = FakeApi::answering(Ok(json!({})));
    let broken = RefCell::new(Configurator::new(
        config(),
        SessionToken::new("t"),
        FakeSurface {
            capture_fails: true,
            ..FakeSurface::default()
        },
        FakeForm::default(),
        FakeNavigator::default(),
    ));
    assert!(!block_on(app::submit(&broken, filled_form(), &api)));
    assert!(api.requests.borrow().is_empty());
    assert_eq!(
        broken.borrow().ui().notice,
        Some(Notice::Error("Could not take a snapshot of your bag.".into()))
    );
}

#[test]
fn test_validation_error_wins_over_capture_failure() {
    let api = FakeApi::answering(Ok(json!({})));
    let broken = RefCell::new(Configurator::new(
        config(),
        SessionToken::new("t"),
        FakeSurface {
            capture_fails: true,
            ..FakeSurface::default()
        },
        FakeForm::default(),
        FakeNavigator::default(),
    ));
    let form = RawForm {
        font: None,
        ..filled_form()
    };

    assert!(!block_on(app::submit(&broken, form, &api)));
    assert!(api.requests.borrow().is_empty());
    assert_eq!(
        broken.borrow().ui().notice,
        Some(Notice::Error("The form is missing the `font` field.".into()))
    );
}

#[test]
fn test_unreadable_form_error_is_shown() {
    let app = loaded_app();
    app.borrow_mut().notify_error("Could not read the form.");
    let app = app.borrow();
    assert_eq!(
        app.form().last_ui.as_ref().unwrap().notice,
        Some(Notice::Error("Could not read the form.".into()))
    );
    assert!(app.ui().submit_enabled);
}

#[test]
fn test_image_part_is_sent_when_chosen() {
    let app = loaded_app();
    let api = FakeApi::answering(Ok(json!({})));
    let logo = Attachment {
        filename: "mine.jpg".into(),
        mime: "image/jpeg".into(),
        bytes: vec![0xff, 0xd8],
    };
    let form = RawForm {
        image: FileField::Selected(logo.clone()),
        ..filled_form()
    };
    block_on(app::submit(&app, form, &api));
    assert_eq!(
        api.requests.borrow()[0].form.names(),
        ["name", "font", "color", "keyFlavours", "image", "user", "screenshot"]
    );
    assert_eq!(api.requests.borrow()[0].form.get("image"), Some(&PartValue::File(logo)));
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_restores_white_and_repaints() {
    let app = loaded_app();
    app.borrow_mut().set_color("#e01b2f");
    let api = FakeApi::answering(Ok(json!({})));
    block_on(app::submit(&app, filled_form(), &api));

    app.borrow_mut().reset();

    let app = app.borrow();
    assert_eq!(app.colors().bag_color().to_hex(), "#ffffff");
    assert_eq!(part_color(&app, "bag"), Some(Color::WHITE));
    assert_eq!(part_color(&app, "crimp"), Some(Color::WHITE));
    assert!(app.surface().backdrop.iter().all(|b| b.tint == Color::WHITE));
    assert_eq!(app.form().clears, 1);
    assert_eq!(app.form().color_input, "#ffffff");
    assert_eq!(app.submission_state(), &SubmissionState::Idle);
    assert!(app.ui().submit_enabled);
    assert!(!app.ui().continue_visible);
    assert_eq!(app.ui().notice, None);
    // The logo survives a reset.
    assert_eq!(app.scene().unwrap().decal_count(), 1);
}

#[test]
fn test_late_answer_from_before_reset_is_ignored() {
    let app = Rc::new(loaded_app());
    let api = Rc::new(GatedApi::default());
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    spawn_submit(&spawner, &app, &api);
    pool.run_until_stalled();
    app.borrow_mut().reset();
    spawn_submit(&spawner, &app, &api);
    pool.run_until_stalled();

    let mut gates = api.take_gates();
    assert_eq!(gates.len(), 2);

    // The abandoned first request fails after the second went out.
    gates
        .remove(0)
        .send(Err(ConfiguratorError::SubmissionNetwork("offline".into())))
        .unwrap();
    pool.run_until_stalled();
    {
        let app = app.borrow();
        assert_eq!(app.submission_state(), &SubmissionState::Submitting);
        assert!(!app.ui().submit_enabled);
        assert!(!matches!(app.ui().notice, Some(Notice::Error(_))));
    }

    gates.remove(0).send(Ok(json!({ "_id": "ok" }))).unwrap();
    pool.run_until_stalled();

    let app = app.borrow();
    assert!(matches!(app.submission_state(), SubmissionState::Submitted { .. }));
    assert!(app.ui().continue_visible);
    assert_eq!(app.ui().notice, Some(Notice::Info("Your bag has been submitted!".into())));
}
