//! Source text for the scene program

const VERTEX_SOURCE: &str = include_str!("shaders/vertex.wgsl");
const FRAGMENT_SOURCE: &str = include_str!("shaders/fragment.wgsl");

/// Marker in the fragment stage replaced by the light-slot count.
pub const LIGHT_COUNT_PLACEHOLDER: &str = "{{LIGHT_COUNT}}";

/// Vertex and fragment source handed to
/// [`RendererContext::initialize`](super::RendererContext::initialize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// The built-in lit scene program sized for `light_capacity` slots.
    /// Shader arrays cannot be empty, so zero slots still declares one.
    pub fn scene(light_capacity: usize) -> Self {
        let count = shader_light_count(light_capacity).to_string();
        Self::new(
            VERTEX_SOURCE.replace(LIGHT_COUNT_PLACEHOLDER, &count),
            FRAGMENT_SOURCE.replace(LIGHT_COUNT_PLACEHOLDER, &count),
        )
    }
}

impl Default for ShaderSources {
    fn default() -> Self {
        ShaderSources::scene(crate::gfx::lighting::DEFAULT_LIGHT_CAPACITY)
    }
}

/// Length of the light array declared by [`ShaderSources::scene`].
pub fn shader_light_count(light_capacity: usize) -> usize {
    light_capacity.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_count_is_substituted() {
        let sources = ShaderSources::scene(3);
        assert!(sources.fragment.contains("const LIGHT_COUNT: u32 = 3u;"));
        assert!(!sources.fragment.contains(LIGHT_COUNT_PLACEHOLDER));
        assert!(!sources.vertex.contains(LIGHT_COUNT_PLACEHOLDER));
    }

    #[test]
    fn test_zero_capacity_still_declares_a_slot() {
        let sources = ShaderSources::scene(0);
        assert!(sources.fragment.contains("const LIGHT_COUNT: u32 = 1u;"));
    }

    #[test]
    fn test_entry_points_present() {
        let sources = ShaderSources::default();
        assert!(sources.vertex.contains("fn vs_main"));
        assert!(sources.fragment.contains("fn fs_main"));
    }
}
