use gfx_hal::{
    adapter, buffer as b, command, format as f, image as i, pass, pool,
    prelude::*,
    queue::{family::QueueFamilyId, Submission},
    window, Backend,
};

use std::borrow::Borrow;
use std::iter;
use std::mem::ManuallyDrop;

mod buffer;
mod frames;
mod memory;
mod pipeline;
mod swapchain;
mod vertex;

use crate::config::{AppConfig, FillMode};
use crate::error::InitError;
use buffer::Buffer;
use frames::FrameSlots;
use memory::Memory;
use pipeline::Pipeline;
use std::ptr;
use swapchain::Swapchain;
use vertex::{Vertex, TRIANGLE};

const FRAMES_IN_FLIGHT: usize = 2;

/// Command buffers are reset one slot at a time, after that slot's fence.
const COMMAND_POOL_FLAGS: pool::CommandPoolCreateFlags =
    pool::CommandPoolCreateFlags::RESET_INDIVIDUAL;

/// Owns every GPU object the loop needs: the swapchain, the uploaded
/// triangle and the shader program.
///
/// A missing `pipeline` means the shaders failed to build; frames are still
/// cleared and presented.
pub struct Renderer<'a, B: Backend> {
    slots: FrameSlots,
    device: &'a B::Device,
    clear_color: [f32; 4],
    command_buffers: Vec<B::CommandBuffer>,
    submission_complete_semaphores: Vec<B::Semaphore>,
    submission_complete_fences: Vec<B::Fence>,
    framebuffers: Vec<Option<B::Framebuffer>>,
    command_pool: ManuallyDrop<B::CommandPool>,
    memory: ManuallyDrop<Memory<'a, B, Vertex>>,
    swapchain: ManuallyDrop<Swapchain<'a, B>>,
    render_pass: ManuallyDrop<B::RenderPass>,
    pipeline: Option<Pipeline<'a, B>>,
}

impl<'a, B> Renderer<'a, B>
where
    B: Backend,
{
    pub fn new(
        surface: &'a mut B::Surface,
        adapter: &'a adapter::Adapter<B>,
        device: &'a B::Device,
        family: QueueFamilyId,
        init_dims: window::Extent2D,
        config: &AppConfig,
        fill_mode: FillMode,
    ) -> Result<Self, InitError> {
        let memory_types = adapter.physical_device.memory_properties().memory_types;
        let limits = adapter.physical_device.limits();

        let vertex_buffer = Buffer::new(device, &TRIANGLE, &limits)?;
        let memory = Memory::new(vertex_buffer, &memory_types)?;
        let swapchain = Swapchain::new(device, surface, adapter, init_dims)?;
        let render_pass = Self::create_render_pass(device, swapchain.format)?;

        let pipeline = match Pipeline::new(device, &config.shaders, fill_mode, &render_pass) {
            Ok(pipeline) => Some(pipeline),
            Err(err) => {
                log::error!("{}", err);
                log::warn!("continuing without a shader program, frames will be blank");
                None
            }
        };

        let mut command_pool = match Self::create_command_pool(device, family) {
            Ok(command_pool) => command_pool,
            Err(err) => {
                unsafe { device.destroy_render_pass(render_pass) };
                return Err(err);
            }
        };
        let (submission_complete_semaphores, submission_complete_fences) =
            match Self::create_sync_objects(device, FRAMES_IN_FLIGHT) {
                Ok(sync) => sync,
                Err(err) => {
                    unsafe {
                        device.destroy_command_pool(command_pool);
                        device.destroy_render_pass(render_pass);
                    }
                    return Err(err);
                }
            };
        let command_buffers = Self::allocate_command_buffers(&mut command_pool, FRAMES_IN_FLIGHT);

        Ok(Renderer {
            device,
            clear_color: config.clear_color,
            submission_complete_semaphores,
            submission_complete_fences,
            framebuffers: (0..FRAMES_IN_FLIGHT).map(|_| None).collect(),
            command_pool: ManuallyDrop::new(command_pool),
            memory: ManuallyDrop::new(memory),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass: ManuallyDrop::new(render_pass),
            pipeline,
            command_buffers,
            slots: FrameSlots::new(FRAMES_IN_FLIGHT),
        })
    }

    pub fn resize(&mut self, dims: window::Extent2D) {
        if dims.width == 0 || dims.height == 0 {
            return;
        }
        self.swapchain.resize(dims);
    }

    /// Records and submits one frame: clear, draw the triangle, present.
    ///
    /// The slot's fence is reset only right before the submit that signals
    /// it again. Any earlier failure drops the acquired image and
    /// reconfigures the swapchain so no image stays acquired.
    pub fn render(&mut self, queue: &mut B::CommandQueue) {
        let surface_image = unsafe {
            match self.swapchain.surface.acquire_image(!0) {
                Ok((image, _)) => image,
                Err(err) => {
                    log::debug!("acquire failed ({:?}), recreating swapchain", err);
                    self.swapchain.recreate();
                    return;
                }
            }
        };

        let frame_idx = self.slots.current();

        unsafe {
            if self.slots.must_wait() {
                let fence = &self.submission_complete_fences[frame_idx];
                if let Err(err) = self.device.wait_for_fence(fence, !0) {
                    log::error!("can't wait for frame fence: {:?}", err);
                    drop(surface_image);
                    self.swapchain.recreate();
                    return;
                }
                self.slots.retired();
            }
            if let Some(old) = self.framebuffers[frame_idx].take() {
                self.device.destroy_framebuffer(old);
            }
            self.command_buffers[frame_idx].reset(false);
        }

        let frame_buffer = match unsafe {
            self.device.create_framebuffer(
                &self.render_pass,
                iter::once(surface_image.borrow()),
                i::Extent {
                    width: self.swapchain.dims.width,
                    height: self.swapchain.dims.height,
                    depth: 1,
                },
            )
        } {
            Ok(frame_buffer) => frame_buffer,
            Err(err) => {
                log::error!("can't create framebuffer: {:?}", err);
                drop(surface_image);
                self.swapchain.recreate();
                return;
            }
        };

        let cmd_buffer = &mut self.command_buffers[frame_idx];
        unsafe {
            cmd_buffer.begin_primary(command::CommandBufferFlags::ONE_TIME_SUBMIT);
            cmd_buffer.set_viewports(0, &[self.swapchain.viewport.clone()]);
            cmd_buffer.set_scissors(0, &[self.swapchain.viewport.rect]);
            cmd_buffer.begin_render_pass(
                &self.render_pass,
                &frame_buffer,
                self.swapchain.viewport.rect,
                &[command::ClearValue {
                    color: command::ClearColor {
                        float32: self.clear_color,
                    },
                }],
                command::SubpassContents::Inline,
            );
            if let Some(pipeline) = &self.pipeline {
                cmd_buffer.bind_graphics_pipeline(&pipeline.pipeline);
                cmd_buffer.bind_vertex_buffers(
                    0,
                    iter::once((&*self.memory.buffer.buf, b::SubRange::WHOLE)),
                );
                cmd_buffer.draw(0..TRIANGLE.len() as u32, 0..1);
            }
            cmd_buffer.end_render_pass();
            cmd_buffer.finish();

            let fence = &self.submission_complete_fences[frame_idx];
            if let Err(err) = self.device.reset_fence(fence) {
                log::error!("can't reset frame fence: {:?}", err);
                self.device.destroy_framebuffer(frame_buffer);
                drop(surface_image);
                self.swapchain.recreate();
                return;
            }

            let submission = Submission {
                command_buffers: iter::once(&*cmd_buffer),
                wait_semaphores: None,
                signal_semaphores: iter::once(&self.submission_complete_semaphores[frame_idx]),
            };
            queue.submit(submission, Some(fence));
            self.slots.submitted();

            let result = queue.present_surface(
                &mut self.swapchain.surface,
                surface_image,
                Some(&self.submission_complete_semaphores[frame_idx]),
            );

            if let Err(err) = result {
                log::debug!("present failed ({:?}), recreating swapchain", err);
                self.swapchain.recreate();
            }
        }

        self.framebuffers[frame_idx] = Some(frame_buffer);
    }

    fn create_render_pass(
        device: &B::Device,
        format: f::Format,
    ) -> Result<B::RenderPass, InitError> {
        let attachment = pass::Attachment {
            format: Some(format),
            samples: 1,
            ops: pass::AttachmentOps::new(
                pass::AttachmentLoadOp::Clear,
                pass::AttachmentStoreOp::Store,
            ),
            stencil_ops: pass::AttachmentOps::DONT_CARE,
            layouts: i::Layout::Undefined..i::Layout::Present,
        };

        let subpass = pass::SubpassDesc {
            colors: &[(0, i::Layout::ColorAttachmentOptimal)],
            depth_stencil: None,
            inputs: &[],
            resolves: &[],
            preserves: &[],
        };

        unsafe { device.create_render_pass(&[attachment], &[subpass], &[]) }
            .map_err(|err| InitError::resource("render pass", err))
    }

    fn create_command_pool(
        device: &B::Device,
        family: QueueFamilyId,
    ) -> Result<B::CommandPool, InitError> {
        unsafe { device.create_command_pool(family, COMMAND_POOL_FLAGS) }
            .map_err(|err| InitError::resource("command pool", err))
    }

    fn allocate_command_buffers(
        command_pool: &mut B::CommandPool,
        count: usize,
    ) -> Vec<B::CommandBuffer> {
        (0..count)
            .map(|_| unsafe { command_pool.allocate_one(command::Level::Primary) })
            .collect()
    }

    fn create_sync_objects(
        device: &B::Device,
        count: usize,
    ) -> Result<(Vec<B::Semaphore>, Vec<B::Fence>), InitError> {
        let semaphores = frames::create_all(
            count,
            || {
                device
                    .create_semaphore()
                    .map_err(|err| InitError::resource("semaphore", err))
            },
            |semaphore| unsafe { device.destroy_semaphore(semaphore) },
        )?;
        let fences = frames::create_all(
            count,
            || {
                device
                    .create_fence(true)
                    .map_err(|err| InitError::resource("fence", err))
            },
            |fence| unsafe { device.destroy_fence(fence) },
        );
        match fences {
            Ok(fences) => Ok((semaphores, fences)),
            Err(err) => {
                for semaphore in semaphores {
                    unsafe { device.destroy_semaphore(semaphore) };
                }
                Err(err)
            }
        }
    }
}

impl<'a, B: Backend> Drop for Renderer<'a, B> {
    fn drop(&mut self) {
        let device = &self.device;
        if let Err(err) = device.wait_idle() {
            log::warn!("device did not go idle before teardown: {:?}", err);
        }
        unsafe {
            self.pipeline.take();
            ManuallyDrop::drop(&mut self.memory);
            for framebuffer in self.framebuffers.drain(..).flatten() {
                device.destroy_framebuffer(framebuffer);
            }
            device.destroy_command_pool(ManuallyDrop::into_inner(ptr::read(&self.command_pool)));
            for s in self.submission_complete_semaphores.drain(..) {
                device.destroy_semaphore(s);
            }

            for f in self.submission_complete_fences.drain(..) {
                device.destroy_fence(f);
            }

            device.destroy_render_pass(ManuallyDrop::into_inner(ptr::read(&self.render_pass)));
            ManuallyDrop::drop(&mut self.swapchain);
        }
        log::info!("renderer torn down after {} frames", self.slots.frames());
    }
}
