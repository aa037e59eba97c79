//! Contract with the 3D rendering side and the fixed scene setup sent to it.

use std::f32::consts::FRAC_PI_2;

use serde::Serialize;

use crate::color::Color;
use crate::decal::DecalSpec;
use crate::error::Result;
use crate::form::Attachment;
use crate::material::{self, BackdropSurface};
use crate::scene::{RenderablePart, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSettings {
    pub color: Color,
    pub intensity: f32,
}

/// Orbit camera controls and their clamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            enable_pan: false,
            min_distance: 1.0,
            max_distance: 5.0,
            min_polar_angle: 0.0,
            max_polar_angle: FRAC_PI_2,
        }
    }
}

/// One-shot scene setup handed to the surface before the model loads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSettings {
    pub model_scale: f32,
    pub camera_position: [f32; 3],
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub max_pixel_ratio: f32,
    pub ambient_light: LightSettings,
    pub directional_light: LightSettings,
    pub metalness: f32,
    pub roughness: f32,
    pub orbit: OrbitSettings,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            model_scale: 0.5,
            camera_position: [0.0, 1.0, 2.0],
            camera_fov: 75.0,
            camera_near: 0.1,
            camera_far: 1000.0,
            max_pixel_ratio: 2.0,
            ambient_light: LightSettings {
                color: Color::from_rgb8(0x40, 0x40, 0x40),
                intensity: 50.0,
            },
            directional_light: LightSettings {
                color: Color::WHITE,
                intensity: 3.0,
            },
            metalness: material::METALNESS,
            roughness: material::ROUGHNESS,
            orbit: OrbitSettings::default(),
        }
    }
}

/// Side-effecting view of the 3D scene.
///
/// The surface owns the meshes; these calls only push state into it.
pub trait RenderSurface {
    fn configure(&mut self, settings: &SceneSettings);

    /// Pushes the current `color` of every part to its material.
    fn apply_part_colors(&mut self, parts: &[RenderablePart]);

    fn set_backdrop(&mut self, surfaces: &[BackdropSurface]);

    fn add_decal(&mut self, decal: &DecalSpec);

    /// Current frame as a PNG.
    fn capture_frame(&self) -> Result<Attachment>;
}

/// Asynchronous model loading, kept apart from [`RenderSurface`] so no
/// borrow of the app state is held while a load is pending.
#[allow(async_fn_in_trait)]
pub trait ModelLoader {
    async fn load_model(&self, path: &str) -> Result<SceneGraph>;
}
