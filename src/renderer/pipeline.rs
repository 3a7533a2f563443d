use gfx_hal::{pass::Subpass, prelude::*, pso, Backend};
use std::iter;
use std::mem::ManuallyDrop;
use std::ops::Range;
use std::ptr;

use super::vertex::Vertex;
use crate::config::{FillMode, ShaderSources};
use crate::error::ShaderError;
use crate::shader::{self, ShaderStage};

const ENTRY_NAME: &str = "main";

/// The linked shader program: both stages plus fixed-function state.
pub struct Pipeline<'a, B: Backend> {
    device: &'a B::Device,
    pub pipeline: ManuallyDrop<B::GraphicsPipeline>,
    pub pipeline_layout: ManuallyDrop<B::PipelineLayout>,
}

impl<'a, B: Backend> Pipeline<'a, B> {
    pub fn new(
        device: &'a B::Device,
        sources: &ShaderSources,
        fill_mode: FillMode,
        render_pass: &B::RenderPass,
    ) -> Result<Self, ShaderError> {
        let vs_spirv = shader::compile(sources.vertex, ShaderStage::Vertex);
        let fs_spirv = shader::compile(sources.fragment, ShaderStage::Fragment);
        let (vs_spirv, fs_spirv) = match (vs_spirv, fs_spirv) {
            (Ok(vs), Ok(fs)) => (vs, fs),
            (Err(err), fs) => {
                if let Err(fs_err) = fs {
                    log::error!("{}", fs_err);
                }
                return Err(err);
            }
            (Ok(_), Err(err)) => return Err(err),
        };

        let vs_module = Self::create_module(device, &vs_spirv, ShaderStage::Vertex)?;
        let fs_module = match Self::create_module(device, &fs_spirv, ShaderStage::Fragment) {
            Ok(module) => module,
            Err(err) => {
                unsafe { device.destroy_shader_module(vs_module) };
                return Err(err);
            }
        };

        let linked = Self::link(device, &vs_module, &fs_module, fill_mode, render_pass);

        unsafe {
            device.destroy_shader_module(vs_module);
            device.destroy_shader_module(fs_module);
        }

        let (pipeline_layout, pipeline) = linked?;
        log::info!("shader program linked ({:?} fill)", fill_mode);

        Ok(Pipeline {
            device,
            pipeline: ManuallyDrop::new(pipeline),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
        })
    }

    fn create_module(
        device: &B::Device,
        spirv: &[u32],
        stage: ShaderStage,
    ) -> Result<B::ShaderModule, ShaderError> {
        unsafe { device.create_shader_module(spirv) }.map_err(|err| ShaderError::Module {
            stage,
            reason: format!("{:?}", err),
        })
    }

    fn link(
        device: &B::Device,
        vs_module: &B::ShaderModule,
        fs_module: &B::ShaderModule,
        fill_mode: FillMode,
        render_pass: &B::RenderPass,
    ) -> Result<(B::PipelineLayout, B::GraphicsPipeline), ShaderError> {
        let pipeline_layout = unsafe {
            device.create_pipeline_layout(
                iter::empty::<B::DescriptorSetLayout>(),
                iter::empty::<(pso::ShaderStageFlags, Range<u32>)>(),
            )
        }
        .map_err(|err| ShaderError::Link(format!("pipeline layout: {:?}", err)))?;

        let shader_entries = pso::GraphicsShaderSet {
            vertex: pso::EntryPoint {
                entry: ENTRY_NAME,
                module: vs_module,
                specialization: pso::Specialization::default(),
            },
            hull: None,
            domain: None,
            geometry: None,
            fragment: Some(pso::EntryPoint {
                entry: ENTRY_NAME,
                module: fs_module,
                specialization: pso::Specialization::default(),
            }),
        };

        let subpass = Subpass {
            index: 0,
            main_pass: render_pass,
        };

        let mut pipeline_desc = pso::GraphicsPipelineDesc::new(
            shader_entries,
            pso::Primitive::TriangleList,
            rasterizer(fill_mode),
            &pipeline_layout,
            subpass,
        );
        pipeline_desc.blender.targets.push(pso::ColorBlendDesc {
            mask: pso::ColorMask::ALL,
            blend: None,
        });
        pipeline_desc.vertex_buffers.push(Vertex::buffer_desc());
        pipeline_desc.attributes.extend_from_slice(&Vertex::attributes());

        let pipeline = unsafe { device.create_graphics_pipeline(&pipeline_desc, None) };
        drop(pipeline_desc);

        match pipeline {
            Ok(pipeline) => Ok((pipeline_layout, pipeline)),
            Err(err) => {
                unsafe { device.destroy_pipeline_layout(pipeline_layout) };
                Err(ShaderError::Link(format!("{:?}", err)))
            }
        }
    }
}

fn rasterizer(fill_mode: FillMode) -> pso::Rasterizer {
    match fill_mode {
        FillMode::Solid => pso::Rasterizer::FILL,
        FillMode::Wireframe => pso::Rasterizer {
            polygon_mode: pso::PolygonMode::Line,
            ..pso::Rasterizer::FILL
        },
    }
}

impl<'a, B: Backend> Drop for Pipeline<'a, B> {
    fn drop(&mut self) {
        unsafe {
            self.device
                .destroy_graphics_pipeline(ManuallyDrop::into_inner(ptr::read(&self.pipeline)));
            self.device
                .destroy_pipeline_layout(ManuallyDrop::into_inner(ptr::read(
                    &self.pipeline_layout,
                )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_fills_polygons() {
        assert_eq!(rasterizer(FillMode::Solid).polygon_mode, pso::PolygonMode::Fill);
    }

    #[test]
    fn wireframe_draws_lines_without_culling() {
        let raster = rasterizer(FillMode::Wireframe);
        assert_eq!(raster.polygon_mode, pso::PolygonMode::Line);
        assert_eq!(raster.cull_face, pso::Face::NONE);
    }
}
