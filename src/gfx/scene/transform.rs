//! Position / rotation / scale and the matrices derived from them

use cgmath::{
    InnerSpace, Matrix, Matrix4, Quaternion, Rad, Rotation3, SquareMatrix, Vector3, Vector4, Zero,
};

/// Object placement in world space.
///
/// `rotation` holds Euler angles in radians applied as intrinsic X, then Y,
/// then Z rotations (a unit quaternion rotated about X, then Y, then Z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn rotation_quaternion(&self) -> Quaternion<f32> {
        Quaternion::from_angle_x(Rad(self.rotation.x))
            * Quaternion::from_angle_y(Rad(self.rotation.y))
            * Quaternion::from_angle_z(Rad(self.rotation.z))
    }

    /// Translate(P) * Rotate(R) * Scale(S)
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from(self.rotation_quaternion());
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }

    /// Inverse-transpose of the model matrix.
    ///
    /// A zero scale component makes the model singular; identity is returned
    /// in that case since the surface has collapsed and has no normal.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        self.model_matrix()
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(|| {
                log::trace!("singular model matrix for scale {:?}", self.scale);
                Matrix4::identity()
            })
    }

    /// Local +X pushed through the model matrix.
    pub fn forward(&self) -> Vector3<f32> {
        self.axis(Vector4::unit_x())
    }

    /// Local +Y pushed through the model matrix.
    pub fn up(&self) -> Vector3<f32> {
        self.axis(Vector4::unit_y())
    }

    /// Local +Z pushed through the model matrix.
    pub fn right(&self) -> Vector3<f32> {
        self.axis(Vector4::unit_z())
    }

    // Scale participates, so a negative or non-uniform scale skews the basis.
    // Zero when the axis is collapsed by a zero scale.
    fn axis(&self, local: Vector4<f32>) -> Vector3<f32> {
        let world = (self.model_matrix() * local).truncate();
        if world.magnitude2() == 0.0 {
            return Vector3::zero();
        }
        world.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::Rng;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_rotation_and_scale_is_pure_translation() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let position = Vector3::new(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            let transform = Transform::from_position(position);
            assert_eq!(transform.model_matrix(), Matrix4::from_translation(position));
        }
    }

    #[test]
    fn test_rotation_is_applied_x_then_y_then_z() {
        let transform = Transform::default().with_rotation(Vector3::new(FRAC_PI_2, FRAC_PI_2, 0.0));
        // Rx * Ry * (1,0,0): Ry sends +X to -Z, Rx then sends -Z to +Y.
        assert_abs_diff_eq!(transform.forward(), Vector3::unit_y(), epsilon = 1e-5);

        let yaw_only = Transform::default().with_rotation(Vector3::new(0.0, FRAC_PI_2, 0.0));
        assert_abs_diff_eq!(yaw_only.forward(), -Vector3::unit_z(), epsilon = 1e-5);
        assert_abs_diff_eq!(yaw_only.up(), Vector3::unit_y(), epsilon = 1e-5);
        assert_abs_diff_eq!(yaw_only.right(), Vector3::unit_x(), epsilon = 1e-5);
    }

    #[test]
    fn test_basis_ignores_translation() {
        let transform = Transform::from_position(Vector3::new(10.0, -4.0, 2.0));
        assert_abs_diff_eq!(transform.forward(), Vector3::unit_x(), epsilon = 1e-5);
        assert_abs_diff_eq!(transform.up(), Vector3::unit_y(), epsilon = 1e-5);
        assert_abs_diff_eq!(transform.right(), Vector3::unit_z(), epsilon = 1e-5);
    }

    #[test]
    fn test_uniform_scale_normal_preserves_direction() {
        let transform = Transform::from_position(Vector3::new(1.0, 2.0, 3.0))
            .with_rotation(Vector3::new(0.3, -1.1, 0.7))
            .with_scale(Vector3::new(2.5, 2.5, 2.5));
        let rotation = Matrix4::from(transform.rotation_quaternion());
        let normal = Vector4::new(0.2, 0.9, -0.4, 0.0);

        let transformed = (transform.normal_matrix() * normal).truncate().normalize();
        let rotated = (rotation * normal).truncate().normalize();
        assert_abs_diff_eq!(transformed, rotated, epsilon = 1e-5);
    }

    #[test]
    fn test_non_uniform_scale_uses_inverse_transpose() {
        let transform = Transform::default().with_scale(Vector3::new(4.0, 1.0, 1.0));
        let normal = Vector4::new(1.0, 1.0, 0.0, 0.0);

        let through_normal = (transform.normal_matrix() * normal).truncate().normalize();
        let through_model = (transform.model_matrix() * normal).truncate().normalize();

        // The normal of the plane x + y = 0 squashed along X tilts toward +Y.
        assert_abs_diff_eq!(
            through_normal,
            Vector3::new(0.25, 1.0, 0.0).normalize(),
            epsilon = 1e-5
        );
        assert!((through_normal - through_model).magnitude() > 0.1);
        assert!((through_normal - Vector3::new(1.0, 1.0, 0.0).normalize()).magnitude() > 0.1);
    }

    #[test]
    fn test_zero_scale_is_tolerated() {
        let transform = Transform::default().with_scale(Vector3::new(0.0, 1.0, 1.0));
        assert_eq!(transform.normal_matrix(), Matrix4::identity());
        assert_eq!(transform.forward(), Vector3::zero());
        assert_abs_diff_eq!(transform.up(), Vector3::unit_y(), epsilon = 1e-5);
    }
}
