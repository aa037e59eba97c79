//! The coordinator: owns all configurator state and sequences the components.
//!
//! Startup order ([`start`] then [`load_model`]) is session guard → scene
//! setup → model load → base material pass → decal → ready. Async steps are
//! split into a synchronous `begin_*` and `finish_*` pair so the state can
//! live in a `RefCell` that is never borrowed across an `.await`;
//! [`load_model`] and [`submit`] drive the pairs.

use std::cell::RefCell;

use crate::color::ColorModel;
use crate::config::AppConfig;
use crate::decal::{self, DecalPlacer};
use crate::error::{ConfiguratorError, Result};
use crate::form::{self, RawForm};
use crate::material::{self, BackdropKind, BackdropSurface};
use crate::scene::SceneGraph;
use crate::session::{self, SessionToken};
use crate::submission::{BagApi, BagRequest, SubmissionPipeline, SubmissionState};
use crate::surface::{ModelLoader, RenderSurface, SceneSettings};
use crate::ui::{FormSurface, Navigator, Notice, Overlay, UiState};

/// Runs the session guard against `current_url`.
///
/// On a missing token the page is sent to the login URL and `None` is
/// returned; the caller must not start anything else.
pub fn guard(current_url: &str, config: &AppConfig, navigator: &impl Navigator) -> Option<SessionToken> {
    match session::check_session(current_url, config) {
        Ok(token) => {
            log::info!("session token present");
            Some(token)
        }
        Err(ConfiguratorError::SessionMissing { redirect }) => {
            log::warn!("no session token, redirecting to {redirect}");
            navigator.navigate(&redirect);
            None
        }
        Err(e) => {
            log::error!("{e}");
            None
        }
    }
}

/// Startup up to the model load: guard first, then `build` the surface, form
/// and loader, then the coordinator.
///
/// Without a token `build` never runs, so no renderer or loader exists for an
/// unauthenticated visit; `Ok(None)` tells the caller to stop.
pub fn start<S, F, N, L, E>(
    current_url: &str,
    config: AppConfig,
    navigator: N,
    build: impl FnOnce(&AppConfig) -> std::result::Result<(S, F, L), E>,
) -> std::result::Result<Option<(Configurator<S, F, N>, L)>, E>
where
    S: RenderSurface,
    F: FormSurface,
    N: Navigator,
    L: ModelLoader,
{
    let Some(token) = guard(current_url, &config, &navigator) else {
        return Ok(None);
    };
    let (surface, form, loader) = build(&config)?;
    Ok(Some((Configurator::new(config, token, surface, form, navigator), loader)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotStarted,
    Loading,
    Ready,
    Failed(String),
}

pub struct Configurator<S, F, N> {
    config: AppConfig,
    token: SessionToken,
    colors: ColorModel,
    scene: Option<SceneGraph>,
    backdrop: [BackdropSurface; 2],
    decals: DecalPlacer,
    pipeline: SubmissionPipeline,
    load: LoadState,
    ui: UiState,
    surface: S,
    form: F,
    navigator: N,
}

impl<S: RenderSurface, F: FormSurface, N: Navigator> Configurator<S, F, N> {
    /// Requires a token, so it can only be built after [`guard`] let us in.
    pub fn new(config: AppConfig, token: SessionToken, mut surface: S, form: F, navigator: N) -> Self {
        surface.configure(&SceneSettings::default());
        let pipeline = SubmissionPipeline::new(config.bags_endpoint());
        let mut app = Self {
            config,
            token,
            colors: ColorModel::new(),
            scene: None,
            backdrop: [
                BackdropSurface::new(BackdropKind::Background),
                BackdropSurface::new(BackdropKind::Plate),
            ],
            decals: DecalPlacer::new(),
            pipeline,
            load: LoadState::NotStarted,
            ui: UiState::default(),
            surface,
            form,
            navigator,
        };
        app.sync_materials();
        app.form.set_color_input(&app.colors.bag_color().to_hex());
        app.form.render(&app.ui);
        app
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn colors(&self) -> &ColorModel {
        &self.colors
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn submission_state(&self) -> &SubmissionState {
        self.pipeline.state()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Marks the model as loading and returns the path to load, or `None`
    /// while a load is already pending.
    pub fn begin_load(&mut self) -> Option<String> {
        if self.load == LoadState::Loading {
            return None;
        }
        self.load = LoadState::Loading;
        self.ui.overlay = Overlay::Loading;
        self.form.render(&self.ui);
        log::info!("loading model {}", self.config.model_path);
        Some(self.config.model_path.clone())
    }

    /// Takes the loaded part list, paints it, then places the logo once.
    pub fn finish_load(&mut self, result: Result<SceneGraph>) {
        match result {
            Ok(scene) => {
                log::info!("model loaded with {} parts", scene.parts().len());
                self.scene = Some(scene);
                self.decals.reset_for_new_load();
                self.sync_materials();
                self.place_decal();
                self.load = LoadState::Ready;
                self.ui.overlay = Overlay::Hidden;
            }
            Err(e) => {
                log::error!("{e}");
                let message = e.user_message();
                self.load = LoadState::Failed(message.clone());
                self.ui.overlay = Overlay::Failed(message);
            }
        }
        self.form.render(&self.ui);
    }

    fn place_decal(&mut self) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let target = decal::resolve_target(scene, &self.config.decal_target, &self.config.decal_fallback);
        if let Some(spec) = self.decals.place(target, &self.config.logo_path) {
            self.surface.add_decal(&spec);
            scene.push(spec.as_part());
        }
    }

    /// Color input changed. The material pass runs before returning.
    pub fn set_color(&mut self, value: &str) {
        if self.colors.set_color(value) {
            self.sync_materials();
        }
    }

    fn sync_materials(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            material::apply(scene.parts_mut(), self.colors.bag_color());
            self.surface.apply_part_colors(scene.parts());
        }
        material::sync_backdrop(&mut self.backdrop, self.colors.ambient_tint());
        self.surface.set_backdrop(&self.backdrop);
    }

    /// Validates the form, snapshots the view and moves the pipeline to
    /// `Submitting`.
    ///
    /// Validation and capture problems are shown to the user and yield `None`.
    /// Validation errors win over snapshot errors.
    pub fn begin_submission(&mut self, raw: &RawForm) -> Option<BagRequest> {
        if !self.pipeline.can_submit() {
            log::warn!("submit pressed while a submission is pending or done");
            return None;
        }

        let payload = form::validate(raw)
            .and_then(|()| self.surface.capture_frame())
            .and_then(|shot| form::capture(raw, shot, &self.config.user_id));
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("{e}");
                self.ui.notice = Some(Notice::Error(e.user_message()));
                self.form.render(&self.ui);
                return None;
            }
        };

        let request = self.pipeline.begin(payload, &self.token)?;
        self.ui.submit_enabled = false;
        self.ui.notice = Some(Notice::Info("Sending your design…".into()));
        self.form.render(&self.ui);
        Some(request)
    }

    /// Records the answer to request `generation`. Answers to requests that a
    /// reset has since abandoned change nothing.
    pub fn finish_submission(&mut self, generation: u64, outcome: Result<serde_json::Value>) {
        match self.pipeline.finish(generation, outcome) {
            SubmissionState::Submitted { .. } => {
                self.ui.submit_enabled = false;
                self.ui.continue_visible = true;
                self.ui.notice = Some(Notice::Info("Your bag has been submitted!".into()));
            }
            SubmissionState::ErrorReported { message } => {
                self.ui.submit_enabled = true;
                self.ui.continue_visible = false;
                self.ui.notice = Some(Notice::Error(message.clone()));
            }
            SubmissionState::Idle | SubmissionState::Submitting => {}
        }
        self.form.render(&self.ui);
    }

    /// Shows a failure that happened outside the pipeline, e.g. reading the
    /// chosen image file.
    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.ui.notice = Some(Notice::Error(message.into()));
        self.form.render(&self.ui);
    }

    /// Goes to the voting dashboard. Only available once submitted.
    pub fn continue_to_dashboard(&self) {
        if !matches!(self.pipeline.state(), SubmissionState::Submitted { .. }) {
            log::warn!("continue pressed before a successful submission");
            return;
        }
        self.navigator.navigate(&self.config.voting_url(&self.token));
    }

    /// Clears the form, restores the default color and repaints.
    pub fn reset(&mut self) {
        self.form.clear();
        self.colors.reset();
        self.pipeline.reset();
        self.sync_materials();
        self.form.set_color_input(&self.colors.bag_color().to_hex());

        self.ui.submit_enabled = true;
        self.ui.continue_visible = false;
        self.ui.notice = None;
        self.form.render(&self.ui);
    }
}

/// Loads the model and finishes setup. Also serves as the overlay's retry.
pub async fn load_model<S, F, N, L>(app: &RefCell<Configurator<S, F, N>>, loader: &L)
where
    S: RenderSurface,
    F: FormSurface,
    N: Navigator,
    L: ModelLoader,
{
    let Some(path) = app.borrow_mut().begin_load() else {
        return;
    };
    let result = loader.load_model(&path).await;
    app.borrow_mut().finish_load(result);
}

/// Runs one submit: capture, POST, record the outcome.
///
/// Returns `true` if the design was accepted.
pub async fn submit<S, F, N, A>(app: &RefCell<Configurator<S, F, N>>, raw: RawForm, api: &A) -> bool
where
    S: RenderSurface,
    F: FormSurface,
    N: Navigator,
    A: BagApi,
{
    let Some(request) = app.borrow_mut().begin_submission(&raw) else {
        return false;
    };
    let generation = request.generation;
    let outcome = api.post_bag(request).await;
    let mut app = app.borrow_mut();
    app.finish_submission(generation, outcome);
    matches!(app.submission_state(), SubmissionState::Submitted { .. })
}
