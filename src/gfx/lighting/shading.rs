//! CPU evaluation of the scene program's lighting model
//!
//! Mirrors `fragment.wgsl` term for term so lighting behaviour can be
//! checked without a GPU. Specular is zero wherever the diffuse term is
//! zero, so surfaces facing away from a light get no highlight from it.

use cgmath::{InnerSpace, Vector3, Zero};

use super::light::LightParameters;
use crate::gfx::{color::Color, material::Material};

/// A shaded point: world-space position and unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
}

/// Direction from the surface toward the light.
pub fn light_direction(light: &LightParameters, surface: Vector3<f32>) -> Vector3<f32> {
    let [x, y, z, w] = light.position;
    let to_light = if w == 0.0 {
        Vector3::new(x, y, z)
    } else {
        Vector3::new(x, y, z) - surface
    };
    normalize_or_zero(to_light)
}

/// Sum of the Phong-Blinn contributions of every light slot, alpha 1.
pub fn evaluate_lighting(
    lights: &[LightParameters],
    material: &Material,
    surface: &SurfacePoint,
    camera_position: Vector3<f32>,
) -> Color {
    let eye = normalize_or_zero(camera_position - surface.position);
    let mut total = Vector3::zero();

    for light in lights {
        let l = light_direction(light, surface.position);
        let kd = l.dot(surface.normal).max(0.0);
        let ks = if kd > 0.0 {
            let half = normalize_or_zero(eye + l);
            half.dot(surface.normal).max(0.0).powf(material.shininess)
        } else {
            0.0
        };

        total += ks * mul(material.specular, light.specular)
            + kd * mul(material.diffuse, light.diffuse)
            + mul(material.ambient, light.ambient);
    }

    Color::rgb(total.x, total.y, total.z)
}

/// Final color of one fragment, `texel` standing in for the diffuse
/// response and alpha when a texture is bound.
pub fn shade(
    lights: &[LightParameters],
    material: &Material,
    surface: &SurfacePoint,
    camera_position: Vector3<f32>,
    texel: Option<Color>,
    use_lighting: bool,
) -> Color {
    let (material, alpha) = match texel {
        Some(texel) => (material.with_diffuse(texel.with_alpha(1.0)), texel.a),
        None => (*material, 1.0),
    };

    if !use_lighting {
        return material.diffuse.with_alpha(alpha);
    }
    evaluate_lighting(lights, &material, surface, camera_position).with_alpha(alpha)
}

fn mul(material: Color, light: [f32; 3]) -> Vector3<f32> {
    Vector3::new(material.r * light[0], material.g * light[1], material.b * light[2])
}

fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() == 0.0 {
        Vector3::zero()
    } else {
        v.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn white_light(position: [f32; 4]) -> LightParameters {
        LightParameters {
            ambient: [0.0; 3],
            diffuse: [1.0; 3],
            specular: [1.0; 3],
            position,
        }
    }

    fn up_facing() -> SurfacePoint {
        SurfacePoint {
            position: Vector3::zero(),
            normal: Vector3::unit_y(),
        }
    }

    #[test]
    fn test_directional_light_uses_stored_direction() {
        let light = white_light([0.0, 3.0, 0.0, 0.0]);
        assert_eq!(light_direction(&light, Vector3::new(100.0, -4.0, 2.0)), Vector3::unit_y());
    }

    #[test]
    fn test_point_light_direction_depends_on_surface() {
        let light = white_light([0.0, 2.0, 0.0, 1.0]);
        assert_eq!(light_direction(&light, Vector3::zero()), Vector3::unit_y());
        assert_eq!(light_direction(&light, Vector3::new(0.0, 4.0, 0.0)), -Vector3::unit_y());
    }

    #[test]
    fn test_head_on_light_gives_full_diffuse_and_specular() {
        let material = Material {
            diffuse: Color::rgb(0.5, 0.0, 0.0),
            ambient: Color::WHITE,
            specular: Color::rgb(0.0, 0.25, 0.0),
            shininess: 8.0,
        };
        let lights = [white_light([0.0, 1.0, 0.0, 0.0])];
        let color = evaluate_lighting(&lights, &material, &up_facing(), Vector3::new(0.0, 10.0, 0.0));

        assert_abs_diff_eq!(color.r, 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(color.g, 0.25, epsilon = 1e-5);
        assert_abs_diff_eq!(color.b, 0.0, epsilon = 1e-5);
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn test_light_behind_surface_has_no_specular() {
        let material = Material::for_object(Color::WHITE, 1.0);
        // Light below the surface, camera placed so the half vector would
        // still face the normal if specular were not gated.
        let lights = [white_light([1.0, -0.1, 0.0, 0.0])];
        let camera = Vector3::new(-1.0, 10.0, 0.0);
        let color = evaluate_lighting(&lights, &material, &up_facing(), camera);
        assert_eq!(color.to_rgb_array(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_lights_are_summed_and_ambient_is_unconditional() {
        let material = Material::for_object(Color::rgb(0.2, 0.2, 0.2), 32.0);
        let mut a = white_light([0.0, -1.0, 0.0, 0.0]);
        a.ambient = [0.1, 0.2, 0.3];
        let mut b = a;
        b.ambient = [0.3, 0.2, 0.1];

        let color = evaluate_lighting(&[a, b], &material, &up_facing(), Vector3::unit_y());
        assert_abs_diff_eq!(color.r, 0.4, epsilon = 1e-5);
        assert_abs_diff_eq!(color.g, 0.4, epsilon = 1e-5);
        assert_abs_diff_eq!(color.b, 0.4, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_slots_contribute_nothing() {
        let material = Material::for_object(Color::WHITE, 32.0);
        let lit = [white_light([0.0, 1.0, 0.0, 0.0])];
        let padded = [lit[0], LightParameters::OFF];
        let camera = Vector3::new(3.0, 5.0, 1.0);
        assert_eq!(
            evaluate_lighting(&lit, &material, &up_facing(), camera),
            evaluate_lighting(&padded, &material, &up_facing(), camera)
        );
    }

    #[test]
    fn test_texture_replaces_diffuse_and_alpha() {
        let material = Material::for_object(Color::rgb(1.0, 0.0, 0.0), 32.0);
        let texel = Color::new(0.0, 0.0, 1.0, 0.5);

        let unlit = shade(&[], &material, &up_facing(), Vector3::unit_y(), Some(texel), false);
        assert_eq!(unlit, Color::new(0.0, 0.0, 1.0, 0.5));

        let lit = shade(
            &[white_light([0.0, 1.0, 0.0, 0.0])],
            &material.with_diffuse(Color::BLACK),
            &up_facing(),
            Vector3::new(5.0, 0.0, 0.0),
            Some(texel),
            true,
        );
        assert_abs_diff_eq!(lit.b, 1.0, epsilon = 1e-5);
        assert_eq!(lit.a, 0.5);
    }

    #[test]
    fn test_untextured_fragment_is_opaque() {
        let material = Material::for_object(Color::new(0.3, 0.3, 0.3, 0.2), 32.0);
        let color = shade(&[], &material, &up_facing(), Vector3::unit_y(), None, true);
        assert_eq!(color.a, 1.0);
    }
}
