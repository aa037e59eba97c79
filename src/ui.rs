//! View state of the page chrome and the contracts for the form side.

/// Loading overlay over the 3D view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Loading,
    /// Load failed; the overlay offers a retry.
    Failed(String),
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Everything the form surface needs to draw the page controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub overlay: Overlay,
    pub submit_enabled: bool,
    pub continue_visible: bool,
    pub notice: Option<Notice>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            overlay: Overlay::Loading,
            submit_enabled: true,
            continue_visible: false,
            notice: None,
        }
    }
}

/// The HTML form: inputs, buttons, status line and loading overlay.
pub trait FormSurface {
    /// Empties every input.
    fn clear(&mut self);

    fn set_color_input(&mut self, hex: &str);

    fn render(&mut self, ui: &UiState);
}

/// Whole-page navigation.
pub trait Navigator {
    fn navigate(&self, url: &str);
}
