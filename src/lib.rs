//! Snack-bag configurator.
//!
//! The platform-independent core (color model, material sync, decal placement,
//! form capture, submission pipeline, session guard and the coordinator) lives
//! at the crate root and is tested natively. `web` binds it to the DOM and to
//! the three.js surface on wasm32.

pub mod app;
pub mod color;
pub mod config;
pub mod decal;
pub mod error;
pub mod form;
pub mod material;
pub mod scene;
pub mod session;
pub mod submission;
pub mod surface;
pub mod ui;

#[cfg(target_arch = "wasm32")]
mod web;

pub use app::Configurator;
pub use color::{Color, ColorModel};
pub use config::AppConfig;
pub use error::{ConfiguratorError, Result};
pub use session::SessionToken;
