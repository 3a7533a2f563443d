use gfx_hal::{adapter::Adapter, format as f, prelude::*, pso, window, Backend};

use crate::error::InitError;

pub struct Swapchain<'a, B: Backend> {
    device: &'a B::Device,
    adapter: &'a Adapter<B>,
    pub viewport: pso::Viewport,
    pub dims: window::Extent2D,
    pub surface: &'a mut B::Surface,
    pub format: f::Format,
}

impl<'a, B: Backend> Swapchain<'a, B> {
    pub fn new(
        device: &'a B::Device,
        surface: &'a mut B::Surface,
        adapter: &'a Adapter<B>,
        dims: window::Extent2D,
    ) -> Result<Self, InitError> {
        let formats = surface.supported_formats(&adapter.physical_device);
        let format = formats.map_or(f::Format::Rgba8Srgb, |formats| {
            formats
                .iter()
                .find(|format| format.base_format().1 == f::ChannelType::Srgb)
                .copied()
                .unwrap_or(formats[0])
        });

        let mut swapchain = Swapchain {
            device,
            surface,
            adapter,
            viewport: viewport_for(dims),
            format,
            dims,
        };

        swapchain
            .configure()
            .map_err(|err| InitError::resource("swapchain", err))?;
        log::info!(
            "swapchain configured: {:?} {}x{}",
            format,
            swapchain.dims.width,
            swapchain.dims.height
        );
        Ok(swapchain)
    }

    /// Follows a window resize. The viewport tracks the new framebuffer size.
    pub fn resize(&mut self, dims: window::Extent2D) {
        self.dims = dims;
        self.recreate();
    }

    pub fn recreate(&mut self) {
        if let Err(err) = self.configure() {
            log::warn!("can't recreate swapchain: {:?}", err);
        }
    }

    fn configure(&mut self) -> Result<(), window::CreationError> {
        let caps = self.surface.capabilities(&self.adapter.physical_device);
        let mut swap_config = window::SwapchainConfig::from_caps(&caps, self.format, self.dims);
        swap_config.present_mode = window::PresentMode::FIFO;
        let extent = swap_config.extent;

        unsafe { self.surface.configure_swapchain(self.device, swap_config)? };

        self.dims = extent;
        self.viewport = viewport_for(extent);
        log::trace!("viewport {}x{}", extent.width, extent.height);
        Ok(())
    }
}

/// Full-window viewport for a framebuffer of `extent` pixels.
pub fn viewport_for(extent: window::Extent2D) -> pso::Viewport {
    pso::Viewport {
        rect: pso::Rect {
            x: 0,
            y: 0,
            w: extent.width as _,
            h: extent.height as _,
        },
        depth: 0.0..1.0,
    }
}

impl<'a, B: Backend> Drop for Swapchain<'a, B> {
    fn drop(&mut self) {
        unsafe { self.surface.unconfigure_swapchain(self.device) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_matches_framebuffer() {
        let viewport = viewport_for(window::Extent2D {
            width: 1024,
            height: 768,
        });
        assert_eq!((viewport.rect.x, viewport.rect.y), (0, 0));
        assert_eq!((viewport.rect.w, viewport.rect.h), (1024, 768));
        assert_eq!(viewport.depth, 0.0..1.0);
    }

    #[test]
    fn initial_viewport_is_window_sized() {
        let viewport = viewport_for(crate::config::WINDOW_SIZE);
        assert_eq!((viewport.rect.w, viewport.rect.h), (800, 600));
    }
}
