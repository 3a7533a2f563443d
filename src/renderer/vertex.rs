use gfx_hal::{format as f, pso};
use std::mem;

/// One triangle corner in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [-0.5, -0.5, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
    },
    Vertex {
        position: [0.0, 0.5, 0.0],
    },
];

impl Vertex {
    pub const STRIDE: u32 = mem::size_of::<Vertex>() as u32;

    pub fn buffer_desc() -> pso::VertexBufferDesc {
        pso::VertexBufferDesc {
            binding: 0,
            stride: Self::STRIDE,
            rate: pso::VertexInputRate::Vertex,
        }
    }

    pub fn attributes() -> [pso::AttributeDesc; 1] {
        [pso::AttributeDesc {
            location: 0,
            binding: 0,
            element: pso::Element {
                format: f::Format::Rgb32Sfloat,
                offset: 0,
            },
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_are_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 12);
        assert_eq!(mem::size_of_val(&TRIANGLE), 9 * mem::size_of::<f32>());
    }

    #[test]
    fn triangle_corners() {
        let corners: Vec<[f32; 3]> = TRIANGLE.iter().map(|v| v.position).collect();
        assert_eq!(
            corners,
            vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0, 0.5, 0.0]]
        );
    }

    #[test]
    fn corners_stay_inside_ndc() {
        assert!(TRIANGLE
            .iter()
            .flat_map(|v| v.position.iter())
            .all(|c| (-1.0..=1.0).contains(c)));
    }

    #[test]
    fn single_position_attribute_at_offset_zero() {
        let attributes = Vertex::attributes();
        assert_eq!(attributes[0].location, 0);
        assert_eq!(attributes[0].element.offset, 0);
        assert_eq!(attributes[0].element.format, f::Format::Rgb32Sfloat);
        assert_eq!(Vertex::buffer_desc().stride, 12);
    }
}
