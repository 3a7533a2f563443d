#[cfg(feature = "metal")]
use gfx_backend_metal as back;

#[cfg(feature = "vulkan")]
use gfx_backend_vulkan as back;

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
mod renderer;
pub mod shader;

pub use config::{AppConfig, FillMode};
pub use error::{InitError, ShaderError};

use gfx_hal::{prelude::*, window::Extent2D, Features};
use input::{FrameStats, InputEvent, RenderLoop};
use renderer::Renderer;
use winit::{
    event::Event,
    event_loop::{ControlFlow, EventLoop},
    platform::desktop::EventLoopExtDesktop,
};

/// Exit code reported when the window or the graphics backend cannot be set up.
pub const EXIT_INIT_FAILURE: i32 = -1;

/// Opens the window, builds the pipeline and runs the render loop until the
/// window is asked to close.
pub fn run(config: &AppConfig) -> Result<(), InitError> {
    let mut event_loop = EventLoop::new();
    let window = winit::window::WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(winit::dpi::Size::Physical(winit::dpi::PhysicalSize::new(
            config.size.width,
            config.size.height,
        )))
        .with_min_inner_size(winit::dpi::Size::Logical(winit::dpi::LogicalSize::new(
            64.0, 64.0,
        )))
        .build(&event_loop)?;
    log::info!(
        "created window \"{}\" ({}x{})",
        config.title,
        config.size.width,
        config.size.height
    );

    let instance =
        back::Instance::create(config.title, 1).map_err(|_| InitError::UnsupportedBackend)?;
    let mut surface = unsafe { instance.create_surface(&window) }
        .map_err(|err| InitError::Surface(format!("{:?}", err)))?;

    let mut adapters = instance.enumerate_adapters();
    if adapters.is_empty() {
        unsafe { instance.destroy_surface(surface) };
        return Err(InitError::NoAdapter);
    }
    let adapter = adapters.remove(0);
    log::info!("using adapter {}", adapter.info.name);

    let family = match adapter.queue_families.iter().find(|family| {
        surface.supports_queue_family(family) && family.queue_type().supports_graphics()
    }) {
        Some(family) => family,
        None => {
            unsafe { instance.destroy_surface(surface) };
            return Err(InitError::NoQueueFamily);
        }
    };

    let fill_mode = supported_fill_mode(config.fill_mode, adapter.physical_device.features());
    let features = match fill_mode {
        FillMode::Solid => Features::empty(),
        FillMode::Wireframe => Features::NON_FILL_POLYGON_MODE,
    };

    let mut gpu = match unsafe { adapter.physical_device.open(&[(family, &[1.0])], features) } {
        Ok(gpu) => gpu,
        Err(err) => {
            unsafe { instance.destroy_surface(surface) };
            return Err(InitError::Device(format!("{:?}", err)));
        }
    };

    let result = match gpu.queue_groups.pop() {
        Some(mut queue_group) => {
            let device = gpu.device;
            let queue = &mut queue_group.queues[0];
            let extent = framebuffer_extent(&window, config.size);

            Renderer::new(
                &mut surface,
                &adapter,
                &device,
                queue_group.family,
                extent,
                config,
                fill_mode,
            )
            .map(|mut renderer| {
                let mut render_loop = RenderLoop::new(extent);
                let mut stats = FrameStats::new();

                event_loop.run_return(|event, _, control_flow| {
                    *control_flow = ControlFlow::Poll;
                    match event {
                        Event::WindowEvent { event, .. } => {
                            if let Some(input) = InputEvent::from_window_event(&event) {
                                render_loop.handle(input);
                            }
                        }
                        Event::MainEventsCleared => {
                            render_loop.process_input();
                            if render_loop.should_close() {
                                log::info!("closing after {} frames", render_loop.frames());
                                *control_flow = ControlFlow::Exit;
                                return;
                            }
                            if let Some(extent) = render_loop.take_resize() {
                                renderer.resize(extent);
                            }
                            if render_loop.is_minimized() {
                                return;
                            }
                            renderer.render(queue);
                            render_loop.frame_presented();
                            stats.tick();
                        }
                        _ => {}
                    }
                });
            })
        }
        None => Err(InitError::NoQueueFamily),
    };

    unsafe {
        instance.destroy_surface(surface);
    }
    result
}

fn supported_fill_mode(requested: FillMode, available: Features) -> FillMode {
    match requested {
        FillMode::Wireframe if !available.contains(Features::NON_FILL_POLYGON_MODE) => {
            log::warn!("adapter cannot draw wireframe, falling back to solid fill");
            FillMode::Solid
        }
        mode => mode,
    }
}

fn framebuffer_extent(window: &winit::window::Window, fallback: Extent2D) -> Extent2D {
    let size = window.inner_size();
    if size.width == 0 || size.height == 0 {
        fallback
    } else {
        Extent2D {
            width: size.width,
            height: size.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireframe_falls_back_without_feature() {
        assert_eq!(
            supported_fill_mode(FillMode::Wireframe, Features::empty()),
            FillMode::Solid
        );
        assert_eq!(
            supported_fill_mode(FillMode::Wireframe, Features::NON_FILL_POLYGON_MODE),
            FillMode::Wireframe
        );
    }

    #[test]
    fn solid_never_needs_features() {
        assert_eq!(
            supported_fill_mode(FillMode::Solid, Features::empty()),
            FillMode::Solid
        );
    }
}
