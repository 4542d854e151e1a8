//! Named parameter updates coming from the UI side
//!
//! Angles arrive in degrees and colors as `#RRGGBB` strings; both are
//! converted here, so everything behind this boundary works in radians and
//! parsed [`Color`]s. A rejected update leaves all state untouched.

use cgmath::{Deg, Rad, Vector3};

use super::{object::ObjectId, scene::SceneState};
use crate::{
    config::RenderParameters,
    error::ParameterError,
    gfx::{camera::Projection, color::Color},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn set(self, v: &mut Vector3<f32>, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectChange {
    Position(Axis, f32),
    RotationDegrees(Axis, f32),
    Scale(Axis, f32),
    /// Replaces RGB; alpha is kept.
    ColorHex(String),
    Alpha(f32),
    Visible(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraChange {
    Position(Axis, f32),
    RotationDegrees(Axis, f32),
    FovDegrees(f32),
    Projection(Projection),
    ViewDistance(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightChange {
    Position(Axis, f32),
    AmbientHex(String),
    DiffuseHex(String),
    SpecularHex(String),
    GizmoVisible(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderChange {
    DrawPolygons(bool),
    DrawEdges(bool),
    DrawLight(bool),
    BackgroundHex(String),
    EdgeHex(String),
    MaterialShininess(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterUpdate {
    Object(ObjectId, ObjectChange),
    Camera(CameraChange),
    Light(usize, LightChange),
    Render(RenderChange),
}

impl ParameterUpdate {
    pub fn apply(
        &self,
        scene: &mut SceneState,
        render: &mut RenderParameters,
    ) -> Result<(), ParameterError> {
        let result = match self {
            ParameterUpdate::Object(id, change) => apply_object(scene, *id, change),
            ParameterUpdate::Camera(change) => {
                apply_camera(scene, change);
                Ok(())
            }
            ParameterUpdate::Light(slot, change) => apply_light(scene, *slot, change),
            ParameterUpdate::Render(change) => apply_render(render, change),
        };

        match &result {
            Ok(()) => log::debug!("applied {:?}", self),
            Err(e) => log::warn!("rejected {:?}: {}", self, e),
        }
        result
    }
}

fn apply_object(
    scene: &mut SceneState,
    id: ObjectId,
    change: &ObjectChange,
) -> Result<(), ParameterError> {
    let object = scene
        .object_mut(id)
        .ok_or(ParameterError::UnknownObject(id.0))?;
    let transform = &mut object.transform;

    match change {
        ObjectChange::Position(axis, value) => axis.set(&mut transform.position, *value),
        ObjectChange::RotationDegrees(axis, degrees) => {
            axis.set(&mut transform.rotation, Rad::from(Deg(*degrees)).0)
        }
        ObjectChange::Scale(axis, value) => axis.set(&mut transform.scale, *value),
        ObjectChange::ColorHex(hex) => {
            let parsed: Color = hex.parse()?;
            object.color = parsed.with_alpha(object.color.a);
        }
        ObjectChange::Alpha(alpha) => object.color.a = *alpha,
        ObjectChange::Visible(visible) => object.visible = *visible,
    }
    Ok(())
}

fn apply_camera(scene: &mut SceneState, change: &CameraChange) {
    let camera = &mut scene.camera;
    match change {
        CameraChange::Position(axis, value) => axis.set(&mut camera.transform.position, *value),
        CameraChange::RotationDegrees(axis, degrees) => {
            axis.set(&mut camera.transform.rotation, Rad::from(Deg(*degrees)).0)
        }
        CameraChange::FovDegrees(degrees) => camera.fov_y = Deg(*degrees).into(),
        CameraChange::Projection(projection) => camera.projection = *projection,
        CameraChange::ViewDistance(distance) => camera.view_distance = *distance,
    }
}

fn apply_light(
    scene: &mut SceneState,
    slot: usize,
    change: &LightChange,
) -> Result<(), ParameterError> {
    let light = scene
        .lights
        .get_mut(slot)
        .ok_or(ParameterError::UnknownLight(slot))?;

    match change {
        LightChange::Position(axis, value) => {
            axis.set(&mut light.object.transform.position, *value)
        }
        LightChange::AmbientHex(hex) => light.ambient = hex.parse()?,
        LightChange::DiffuseHex(hex) => light.diffuse = hex.parse()?,
        LightChange::SpecularHex(hex) => light.specular = hex.parse()?,
        LightChange::GizmoVisible(visible) => light.object.visible = *visible,
    }
    Ok(())
}

fn apply_render(render: &mut RenderParameters, change: &RenderChange) -> Result<(), ParameterError> {
    match change {
        RenderChange::DrawPolygons(enabled) => render.draw_polygons = *enabled,
        RenderChange::DrawEdges(enabled) => render.draw_edges = *enabled,
        RenderChange::DrawLight(enabled) => render.draw_light = *enabled,
        RenderChange::BackgroundHex(hex) => render.background_color = hex.parse()?,
        RenderChange::EdgeHex(hex) => render.edge_color = hex.parse()?,
        RenderChange::MaterialShininess(shininess) => render.material_shininess = *shininess,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::{
        error::ColorError,
        gfx::{geometry::PrimitiveKind, lighting::POINT_LIGHT_SLOT},
    };
    use std::f32::consts::FRAC_PI_2;

    fn scene_with_cube() -> (SceneState, ObjectId) {
        let mut scene = SceneState::default().with_default_lights();
        let id = scene.create_object(PrimitiveKind::Cube);
        (scene, id)
    }

    #[test]
    fn test_object_rotation_converts_degrees() {
        let (mut scene, id) = scene_with_cube();
        let mut render = RenderParameters::default();
        ParameterUpdate::Object(id, ObjectChange::RotationDegrees(Axis::Y, 90.0))
            .apply(&mut scene, &mut render)
            .unwrap();
        let rotation = scene.object(id).unwrap().transform.rotation;
        assert_abs_diff_eq!(rotation.y, FRAC_PI_2, epsilon = 1e-6);
        assert_eq!(rotation.x, 0.0);
    }

    #[test]
    fn test_color_hex_keeps_alpha() {
        let (mut scene, id) = scene_with_cube();
        let mut render = RenderParameters::default();
        ParameterUpdate::Object(id, ObjectChange::Alpha(0.25))
            .apply(&mut scene, &mut render)
            .unwrap();
        ParameterUpdate::Object(id, ObjectChange::ColorHex("#ff0000".into()))
            .apply(&mut scene, &mut render)
            .unwrap();
        assert_eq!(scene.object(id).unwrap().color, Color::new(1.0, 0.0, 0.0, 0.25));
    }

    #[test]
    fn test_malformed_hex_leaves_state_untouched() {
        let (mut scene, id) = scene_with_cube();
        let mut render = RenderParameters::default();
        let before = scene.object(id).unwrap().color;

        let err = ParameterUpdate::Object(id, ObjectChange::ColorHex("#12345".into()))
            .apply(&mut scene, &mut render)
            .unwrap_err();
        assert_eq!(err, ParameterError::Color(ColorError::MalformedHex("#12345".into())));
        assert_eq!(scene.object(id).unwrap().color, before);

        assert!(ParameterUpdate::Render(RenderChange::EdgeHex("nope".into()))
            .apply(&mut scene, &mut render)
            .is_err());
        assert_eq!(render, RenderParameters::default());
    }

    #[test]
    fn test_unknown_targets_are_rejected() {
        let (mut scene, _) = scene_with_cube();
        let mut render = RenderParameters::default();
        assert_eq!(
            ParameterUpdate::Object(ObjectId(99), ObjectChange::Visible(false))
                .apply(&mut scene, &mut render),
            Err(ParameterError::UnknownObject(99))
        );
        assert_eq!(
            ParameterUpdate::Light(5, LightChange::GizmoVisible(false))
                .apply(&mut scene, &mut render),
            Err(ParameterError::UnknownLight(5))
        );
    }

    #[test]
    fn test_camera_fov_is_stored_in_radians() {
        let (mut scene, _) = scene_with_cube();
        let mut render = RenderParameters::default();
        ParameterUpdate::Camera(CameraChange::FovDegrees(60.0))
            .apply(&mut scene, &mut render)
            .unwrap();
        ParameterUpdate::Camera(CameraChange::Projection(Projection::Orthogonal))
            .apply(&mut scene, &mut render)
            .unwrap();
        assert_abs_diff_eq!(scene.camera.fov_y.0, std::f32::consts::FRAC_PI_3, epsilon = 1e-6);
        assert_eq!(scene.camera.projection, Projection::Orthogonal);
    }

    #[test]
    fn test_light_updates() {
        let (mut scene, _) = scene_with_cube();
        let mut render = RenderParameters::default();
        for update in [
            ParameterUpdate::Light(POINT_LIGHT_SLOT, LightChange::Position(Axis::X, -2.0)),
            ParameterUpdate::Light(POINT_LIGHT_SLOT, LightChange::DiffuseHex("#00ff00".into())),
        ] {
            update.apply(&mut scene, &mut render).unwrap();
        }
        let light = scene.lights.get(POINT_LIGHT_SLOT).unwrap();
        assert_eq!(light.parameters().position, [-2.0, 5.0, 5.0, 1.0]);
        assert_eq!(light.parameters().diffuse, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_render_toggles() {
        let (mut scene, _) = scene_with_cube();
        let mut render = RenderParameters::default();
        for update in [
            RenderChange::DrawEdges(true),
            RenderChange::DrawLight(false),
            RenderChange::BackgroundHex("#202020".into()),
            RenderChange::MaterialShininess(8.0),
        ] {
            ParameterUpdate::Render(update)
                .apply(&mut scene, &mut render)
                .unwrap();
        }
        assert!(render.draw_edges);
        assert!(!render.draw_light);
        assert_eq!(render.background_hex(), "#202020");
        assert_eq!(render.material_shininess, 8.0);
    }
}
