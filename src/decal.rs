//! Logo decal placement.
//!
//! The decal is projected onto the front (max-Z) face of its target's bounding
//! box, facing +Z, which is where the camera starts. It is not re-projected
//! when the camera moves.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::Serialize;

use crate::scene::{Aabb, RenderablePart, SceneGraph};

/// Share of the target's width/height covered by the logo.
pub const DECAL_SCALE: f32 = 0.6;

/// Direction the decal faces.
fn front_normal() -> Vector3<f32> {
    Vector3::z()
}

/// Projection box and image of a placed decal. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecalSpec {
    pub target: String,
    pub position: Point3<f32>,
    /// Serialized as `[x, y, z, w]`.
    pub orientation: UnitQuaternion<f32>,
    pub size: Vector3<f32>,
    pub image: String,
}

impl DecalSpec {
    /// Scene entry for the decal itself, tagged so recoloring skips it.
    pub fn as_part(&self) -> RenderablePart {
        let half = self.size * 0.5;
        let mut part = RenderablePart::new(
            format!("{}-decal", self.target),
            Aabb::new(self.position - half, self.position + half),
        );
        part.is_decal = true;
        part
    }
}

/// Named lookup with a fallback name.
pub fn resolve_target<'a>(scene: &'a SceneGraph, primary: &str, fallback: &str) -> Option<&'a RenderablePart> {
    scene.find(primary).or_else(|| {
        log::debug!("no part named {primary:?}, trying {fallback:?}");
        scene.find(fallback)
    })
}

/// Places at most one decal per model load.
#[derive(Debug, Default)]
pub struct DecalPlacer {
    placed: bool,
}

impl DecalPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_placed(&self) -> bool {
        self.placed
    }

    /// Arms the placer again; call when a fresh model has been loaded.
    pub fn reset_for_new_load(&mut self) {
        self.placed = false;
    }

    /// Builds the decal for `target`.
    ///
    /// `None` target is a model without a matching part: nothing is placed.
    /// A second call before [`reset_for_new_load`](Self::reset_for_new_load)
    /// is refused so decals never stack.
    pub fn place(&mut self, target: Option<&RenderablePart>, image: &str) -> Option<DecalSpec> {
        let Some(target) = target else {
            log::info!("no decal target in model, skipping logo");
            return None;
        };
        if self.placed {
            log::warn!("decal already placed for this model, ignoring request for {:?}", target.name);
            return None;
        }

        let spec = project_front(target, image);
        self.placed = true;
        log::info!(
            "logo decal on {:?} at ({:.3}, {:.3}, {:.3})",
            spec.target,
            spec.position.x,
            spec.position.y,
            spec.position.z
        );
        Some(spec)
    }
}

fn project_front(target: &RenderablePart, image: &str) -> DecalSpec {
    let bounds = &target.bounds;
    let mut position = bounds.center();
    position.z = bounds.max.z;

    // +Z onto +Z today; only the opposite direction has no defined rotation.
    let orientation =
        UnitQuaternion::rotation_between(&Vector3::z(), &front_normal()).unwrap_or_else(UnitQuaternion::identity);

    let extent = bounds.size();
    let size = Vector3::new(extent.x * DECAL_SCALE, extent.y * DECAL_SCALE, extent.z);

    DecalSpec {
        target: target.name.clone(),
        position,
        orientation,
        size,
        image: image.to_owned(),
    }
}
