//! Window input and the `Running` -> `Closing` loop state.

use gfx_hal::window::Extent2D;
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

const FPS_REPORT_INTERVAL: u64 = 120;

/// The subset of window events the loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Escape { pressed: bool },
    CloseRequested,
    Resized(Extent2D),
}

impl InputEvent {
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::CloseRequested => Some(InputEvent::CloseRequested),
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        virtual_keycode: Some(VirtualKeyCode::Escape),
                        state,
                        ..
                    },
                ..
            } => Some(InputEvent::Escape {
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::Resized(size) => Some(InputEvent::Resized(Extent2D {
                width: size.width,
                height: size.height,
            })),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

/// Per-frame bookkeeping for the render loop. Owned by the event loop thread.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    close_requested: bool,
    extent: Extent2D,
    pending_resize: Option<Extent2D>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(extent: Extent2D) -> Self {
        RenderLoop {
            state: LoopState::Running,
            close_requested: false,
            extent,
            pending_resize: None,
            frames: 0,
        }
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            // Latched, so a press released before the next frame still closes.
            InputEvent::Escape { pressed: true } => {
                log::debug!("escape pressed");
                self.close_requested = true;
            }
            InputEvent::Escape { pressed: false } => {}
            InputEvent::CloseRequested => {
                log::debug!("close requested by the window manager");
                self.close_requested = true;
            }
            InputEvent::Resized(extent) => {
                if extent != self.extent {
                    log::debug!("resized to {}x{}", extent.width, extent.height);
                    self.extent = extent;
                    self.pending_resize = Some(extent);
                }
            }
        }
    }

    /// Runs once at the top of every frame.
    pub fn process_input(&mut self) {
        if self.close_requested {
            self.state = LoopState::Closing;
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn should_close(&self) -> bool {
        self.state == LoopState::Closing
    }

    pub fn take_resize(&mut self) -> Option<Extent2D> {
        self.pending_resize.take()
    }

    pub fn is_minimized(&self) -> bool {
        self.extent.width == 0 || self.extent.height == 0
    }

    pub fn frame_presented(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

pub struct FrameStats {
    counter: fps_counter::FPSCounter,
    frames: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        FrameStats {
            counter: fps_counter::FPSCounter::new(),
            frames: 0,
        }
    }

    pub fn tick(&mut self) {
        let fps = self.counter.tick();
        self.frames += 1;
        log::trace!("frame {}", self.frames);
        if self.frames % FPS_REPORT_INTERVAL == 0 {
            log::debug!("{} fps", fps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    const START: Extent2D = Extent2D {
        width: 800,
        height: 600,
    };

    #[test]
    fn escape_closes_within_one_frame() {
        let mut render_loop = RenderLoop::new(START);
        render_loop.process_input();
        assert_eq!(render_loop.state(), LoopState::Running);

        render_loop.handle(InputEvent::Escape { pressed: true });
        render_loop.process_input();
        assert_eq!(render_loop.state(), LoopState::Closing);
        assert!(render_loop.should_close());
    }

    #[test]
    fn escape_tap_between_frames_still_closes() {
        let mut render_loop = RenderLoop::new(START);
        render_loop.handle(InputEvent::Escape { pressed: true });
        render_loop.handle(InputEvent::Escape { pressed: false });
        render_loop.process_input();
        assert!(render_loop.should_close());
    }

    #[test]
    fn escape_release_alone_keeps_running() {
        let mut render_loop = RenderLoop::new(START);
        render_loop.handle(InputEvent::Escape { pressed: false });
        render_loop.process_input();
        assert!(!render_loop.should_close());
    }

    #[test]
    fn closing_is_terminal() {
        let mut render_loop = RenderLoop::new(START);
        render_loop.handle(InputEvent::Escape { pressed: true });
        render_loop.process_input();
        render_loop.handle(InputEvent::Escape { pressed: false });
        render_loop.process_input();
        assert!(render_loop.should_close());
    }

    #[test]
    fn window_close_request_closes() {
        let mut render_loop = RenderLoop::new(START);
        let event = InputEvent::from_window_event(&WindowEvent::CloseRequested).unwrap();
        render_loop.handle(event);
        render_loop.process_input();
        assert!(render_loop.should_close());
    }

    #[test]
    fn resize_is_reported_once() {
        let mut render_loop = RenderLoop::new(START);
        let event =
            InputEvent::from_window_event(&WindowEvent::Resized(PhysicalSize::new(1024, 768)))
                .unwrap();
        render_loop.handle(event);

        assert_eq!(
            render_loop.take_resize(),
            Some(Extent2D {
                width: 1024,
                height: 768
            })
        );
        assert_eq!(render_loop.take_resize(), None);
    }

    #[test]
    fn resize_to_same_size_is_ignored() {
        let mut render_loop = RenderLoop::new(START);
        render_loop.handle(InputEvent::Resized(START));
        assert_eq!(render_loop.take_resize(), None);
    }

    #[test]
    fn zero_area_means_minimized() {
        let mut render_loop = RenderLoop::new(START);
        render_loop.handle(InputEvent::Resized(Extent2D {
            width: 0,
            height: 0,
        }));
        assert!(render_loop.is_minimized());

        render_loop.handle(InputEvent::Resized(START));
        assert!(!render_loop.is_minimized());
        assert_eq!(render_loop.take_resize(), Some(START));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let event = WindowEvent::Focused(true);
        assert_eq!(InputEvent::from_window_event(&event), None);
    }
}
