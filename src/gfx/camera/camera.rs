use cgmath::{
    ortho, perspective, Deg, EuclideanSpace, Matrix4, Point3, Rad, Rotation, SquareMatrix,
    Vector3, Zero,
};

use crate::gfx::scene::transform::Transform;

/// Near clip plane shared by every projection mode.
pub const NEAR_PLANE: f32 = 0.1;

/// Half-extent of the orthogonal view box on X and Y. The box does not
/// follow `view_distance`, which only drives the far plane.
pub const ORTHOGONAL_HALF_EXTENT: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthogonal,
    /// Identity projection; also what unrecognised mode names fall back to.
    None,
}

impl Projection {
    /// Maps a UI mode name onto a projection, never failing.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "perspective" => Projection::Perspective,
            "orthogonal" | "orthographic" => Projection::Orthogonal,
            other => {
                log::debug!("unsupported projection '{}', using identity", other);
                Projection::None
            }
        }
    }
}

/// A free-flying camera.
///
/// The camera looks down its local +X axis with local +Y as up, both taken
/// from [`Transform`]. Vertical field of view is stored in radians; UI code
/// converts from degrees before assigning it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    pub projection: Projection,
    pub fov_y: Rad<f32>,
    pub view_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            projection: Projection::Perspective,
            fov_y: Deg(90.0).into(),
            view_distance: 1000.0,
        }
    }
}

impl Camera {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_fov(mut self, fov_y: impl Into<Rad<f32>>) -> Self {
        self.fov_y = fov_y.into();
        self
    }

    pub fn with_view_distance(mut self, view_distance: f32) -> Self {
        self.view_distance = view_distance;
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    /// Unit view direction. Falls back to the unscaled rotation basis when
    /// a zero scale collapses the transform's forward axis.
    pub fn forward(&self) -> Vector3<f32> {
        self.basis_axis(self.transform.forward(), Vector3::unit_x())
    }

    pub fn up(&self) -> Vector3<f32> {
        self.basis_axis(self.transform.up(), Vector3::unit_y())
    }

    fn basis_axis(&self, scaled: Vector3<f32>, local: Vector3<f32>) -> Vector3<f32> {
        if scaled.is_zero() {
            self.transform.rotation_quaternion().rotate_vector(local)
        } else {
            scaled
        }
    }

    /// Point `view_distance` units ahead of the camera.
    pub fn view_target(&self) -> Vector3<f32> {
        self.transform.position + self.forward() * self.view_distance
    }

    // Built from the direction rather than the target so a zero view
    // distance still yields a valid matrix.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(
            Point3::from_vec(self.transform.position),
            self.forward(),
            self.up(),
        )
    }

    /// Projection for a viewport of `width` x `height` pixels. The aspect
    /// ratio is derived on every call so viewport resizes apply immediately.
    pub fn projection_matrix(&self, width: u32, height: u32) -> Matrix4<f32> {
        match self.projection {
            Projection::Perspective => perspective(
                self.fov_y,
                aspect_ratio(width, height),
                NEAR_PLANE,
                self.view_distance,
            ),
            Projection::Orthogonal => ortho(
                -ORTHOGONAL_HALF_EXTENT,
                ORTHOGONAL_HALF_EXTENT,
                -ORTHOGONAL_HALF_EXTENT,
                ORTHOGONAL_HALF_EXTENT,
                NEAR_PLANE,
                self.view_distance,
            ),
            Projection::None => Matrix4::identity(),
        }
    }
}

pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use cgmath::Vector4;

    #[test]
    fn test_default_perspective_camera_end_to_end() {
        let camera = Camera::default();
        assert_eq!(camera.position(), Vector3::zero());
        assert_abs_diff_eq!(
            camera.view_target(),
            Vector3::new(1000.0, 0.0, 0.0),
            epsilon = 1e-3
        );

        // A point on the view axis lands in the middle of the screen.
        let eye_space = camera.view_matrix() * Vector4::new(10.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(eye_space, Vector4::new(0.0, 0.0, -10.0, 1.0), epsilon = 1e-4);

        let proj = camera.projection_matrix(800, 600);
        assert_relative_eq!(proj.y.y / proj.x.x, 800.0 / 600.0, epsilon = 1e-4);
        // 90 degree vertical FOV: cot(45 deg) = 1
        assert_relative_eq!(proj.y.y, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_aspect_follows_viewport_on_every_call() {
        let camera = Camera::default();
        let wide = camera.projection_matrix(1600, 400);
        let square = camera.projection_matrix(500, 500);
        assert_relative_eq!(wide.y.y / wide.x.x, 4.0, epsilon = 1e-4);
        assert_relative_eq!(square.y.y / square.x.x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_none_projection_is_identity() {
        for (fov, distance, w, h) in [(10.0, 1.0, 1, 1), (120.0, 5000.0, 1920, 1080)] {
            let camera = Camera::default()
                .with_projection(Projection::None)
                .with_fov(Deg(fov))
                .with_view_distance(distance);
            assert_eq!(camera.projection_matrix(w, h), Matrix4::identity());
        }
    }

    #[test]
    fn test_orthogonal_box_ignores_fov_and_distance() {
        let near = Camera::default()
            .with_projection(Projection::Orthogonal)
            .with_fov(Deg(30.0))
            .with_view_distance(50.0);
        let far = near.with_fov(Deg(100.0)).with_view_distance(900.0);

        let a = near.projection_matrix(800, 600);
        let b = far.projection_matrix(800, 600);
        assert_relative_eq!(a.x.x, 1.0 / ORTHOGONAL_HALF_EXTENT, epsilon = 1e-4);
        assert_eq!(a.x.x, b.x.x);
        assert_eq!(a.y.y, b.y.y);
        assert_ne!(a.z.z, b.z.z);
    }

    #[test]
    fn test_zero_scale_camera_keeps_finite_view() {
        let camera = Camera::new(Transform::default().with_scale(Vector3::new(0.0, 1.0, 1.0)));
        assert_eq!(camera.transform.forward(), Vector3::zero());

        assert_abs_diff_eq!(camera.forward(), Vector3::unit_x(), epsilon = 1e-6);
        assert_abs_diff_eq!(
            camera.view_target(),
            Vector3::new(1000.0, 0.0, 0.0),
            epsilon = 1e-3
        );
        let view = camera.view_matrix();
        for column in [view.x, view.y, view.z, view.w] {
            assert!(column.x.is_finite() && column.y.is_finite());
            assert!(column.z.is_finite() && column.w.is_finite());
        }
        assert_abs_diff_eq!(view, Camera::default().view_matrix(), epsilon = 1e-6);
    }

    #[test]
    fn test_rotated_zero_scale_camera_uses_rotation_basis() {
        let rotation = Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let camera = Camera::new(
            Transform::default()
                .with_rotation(rotation)
                .with_scale(Vector3::new(0.0, 0.0, 1.0)),
        );
        assert_abs_diff_eq!(camera.forward(), -Vector3::unit_z(), epsilon = 1e-6);
        assert_abs_diff_eq!(camera.up(), Vector3::unit_y(), epsilon = 1e-6);
    }

    #[test]
    fn test_zero_view_distance_keeps_finite_view() {
        let camera = Camera::default().with_view_distance(0.0);
        assert_eq!(camera.view_target(), camera.position());
        assert_abs_diff_eq!(
            camera.view_matrix(),
            Camera::default().view_matrix(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_projection_names() {
        assert_eq!(Projection::from_name("perspective"), Projection::Perspective);
        assert_eq!(Projection::from_name("Orthogonal"), Projection::Orthogonal);
        assert_eq!(Projection::from_name("fisheye"), Projection::None);
    }
}
