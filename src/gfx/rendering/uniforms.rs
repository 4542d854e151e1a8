//! Uniform and attribute names shared by the scene program and the frame
//! renderer. They must match the shader text exactly.

pub const CAMERA_POSITION: &str = "u_cameraPosition";

pub const MODEL_MATRIX: &str = "u_mMatrix";
pub const VIEW_MATRIX: &str = "u_vMatrix";
pub const PROJECTION_MATRIX: &str = "u_pMatrix";
pub const NORMAL_MATRIX: &str = "u_nMatrix";

pub const MATERIAL_DIFFUSE: &str = "u_material.diffuse";
pub const MATERIAL_AMBIENT: &str = "u_material.ambient";
pub const MATERIAL_SPECULAR: &str = "u_material.specular";
pub const MATERIAL_SHININESS: &str = "u_material.shininess";

pub const USE_LIGHTING: &str = "u_useLighting";
pub const USE_TEXTURE: &str = "u_useTexture";
pub const TEXTURE: &str = "u_texture";
pub const TEXTURE_SCALE: &str = "u_textureScale";

pub const VERTEX_POSITION: &str = "a_vertexPosition";
pub const VERTEX_NORMAL: &str = "a_vertexNormal";
pub const TEXTURE_POSITION: &str = "a_texturePosition";

const LIGHTS_PREFIX: &str = "u_lights[";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightField {
    Diffuse,
    Ambient,
    Specular,
    Position,
}

impl LightField {
    pub const ALL: [LightField; 4] = [
        LightField::Diffuse,
        LightField::Ambient,
        LightField::Specular,
        LightField::Position,
    ];

    fn as_str(self) -> &'static str {
        match self {
            LightField::Diffuse => "diffuse",
            LightField::Ambient => "ambient",
            LightField::Specular => "specular",
            LightField::Position => "position",
        }
    }
}

/// `u_lights[slot].field`
pub fn light_uniform(slot: usize, field: LightField) -> String {
    format!("{}{}].{}", LIGHTS_PREFIX, slot, field.as_str())
}

/// Inverse of [`light_uniform`].
pub fn parse_light_uniform(name: &str) -> Option<(usize, LightField)> {
    let rest = name.strip_prefix(LIGHTS_PREFIX)?;
    let (slot, field) = rest.split_once("].")?;
    let slot = slot.parse().ok()?;
    let field = LightField::ALL
        .into_iter()
        .find(|candidate| candidate.as_str() == field)?;
    Some((slot, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_uniform_names() {
        assert_eq!(light_uniform(0, LightField::Diffuse), "u_lights[0].diffuse");
        assert_eq!(light_uniform(1, LightField::Position), "u_lights[1].position");
    }

    #[test]
    fn test_parse_light_uniform() {
        for slot in 0..4 {
            for field in LightField::ALL {
                assert_eq!(
                    parse_light_uniform(&light_uniform(slot, field)),
                    Some((slot, field))
                );
            }
        }
        assert_eq!(parse_light_uniform("u_lights[x].diffuse"), None);
        assert_eq!(parse_light_uniform("u_lights[0].colour"), None);
        assert_eq!(parse_light_uniform(MATERIAL_DIFFUSE), None);
    }
}
