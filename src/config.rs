//! Fixed per-variant settings: window, colors, fill mode and shader text.

use gfx_hal::window::Extent2D;

pub const WINDOW_SIZE: Extent2D = Extent2D {
    width: 800,
    height: 600,
};

/// Vertex stage shared by all variants.
///
/// Vulkan clip space points +y down, so y is flipped to keep the apex of the
/// triangle at the top of the window.
pub const VERTEX_SHADER: &str = "#version 450
layout (location = 0) in vec3 a_Pos;

void main()
{
    gl_Position = vec4(a_Pos.x, -a_Pos.y, a_Pos.z, 1.0);
}
";

pub const ORANGE_FRAGMENT_SHADER: &str = "#version 450
layout (location = 0) out vec4 FragColor;

void main()
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
";

pub const RED_FRAGMENT_SHADER: &str = "#version 450
layout (location = 0) out vec4 FragColor;

void main()
{
    FragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
";

const PINK: [f32; 4] = [1.0, 154.0 / 255.0, 154.0 / 255.0, 1.0];
const TEAL: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Debug, Clone, Copy)]
pub struct ShaderSources {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub title: &'static str,
    pub size: Extent2D,
    pub clear_color: [f32; 4],
    pub fill_mode: FillMode,
    pub shaders: ShaderSources,
}

impl AppConfig {
    pub fn orange() -> Self {
        AppConfig {
            title: "triangle",
            size: WINDOW_SIZE,
            clear_color: PINK,
            fill_mode: FillMode::Solid,
            shaders: ShaderSources {
                vertex: VERTEX_SHADER,
                fragment: ORANGE_FRAGMENT_SHADER,
            },
        }
    }

    pub fn red() -> Self {
        AppConfig {
            title: "triangle (red)",
            clear_color: TEAL,
            shaders: ShaderSources {
                vertex: VERTEX_SHADER,
                fragment: RED_FRAGMENT_SHADER,
            },
            ..Self::orange()
        }
    }

    pub fn wireframe() -> Self {
        AppConfig {
            title: "triangle (wireframe)",
            clear_color: TEAL,
            fill_mode: FillMode::Wireframe,
            ..Self::orange()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_opens_at_800_by_600() {
        for config in &[AppConfig::orange(), AppConfig::red(), AppConfig::wireframe()] {
            assert_eq!(config.size.width, 800);
            assert_eq!(config.size.height, 600);
        }
    }

    #[test]
    fn only_wireframe_uses_line_fill() {
        assert_eq!(AppConfig::orange().fill_mode, FillMode::Solid);
        assert_eq!(AppConfig::red().fill_mode, FillMode::Solid);
        assert_eq!(AppConfig::wireframe().fill_mode, FillMode::Wireframe);
    }

    #[test]
    fn variants_differ_in_fragment_color() {
        assert_ne!(
            AppConfig::orange().shaders.fragment,
            AppConfig::red().shaders.fragment
        );
        assert_eq!(
            AppConfig::orange().shaders.fragment,
            AppConfig::wireframe().shaders.fragment
        );
    }

    #[test]
    fn clear_colors_are_opaque() {
        for config in &[AppConfig::orange(), AppConfig::red(), AppConfig::wireframe()] {
            assert_eq!(config.clear_color[3], 1.0);
            assert!(config.clear_color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }
}
