use anyhow::{anyhow, Result};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::gpu::{FrameOutcome, GpuState};
use crate::types::RendererConfig;

/// Opens the window, binds the GPU state to it, and drives the frame loop
/// until the window is closed.
pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window = WindowBuilder::new()
        .with_title(&config.window_title)
        .with_inner_size(PhysicalSize::new(
            config.requested_size.0,
            config.requested_size.1,
        ))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;

    let mut state = GpuState::new(&window, &config, window.inner_size())?;
    let granted = state.resolution();
    tracing::info!(
        width = granted.width,
        height = granted.height,
        adapter = %state.adapter_profile().name,
        shader = %config.shader_name,
        "renderer initialised"
    );
    if (granted.width, granted.height) != config.requested_size {
        tracing::info!(
            requested_width = config.requested_size.0,
            requested_height = config.requested_size.1,
            "granted resolution differs from request"
        );
    }

    let mut mouse = MouseState::default();
    let mut fatal: Option<anyhow::Error> = None;

    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                mouse.handle_cursor_moved(position);
            }
            WindowEvent::Resized(new_size) => {
                state.resize_surface(new_size);
            }
            WindowEvent::RedrawRequested => {
                let frame_result = state.render_frame(mouse.as_params()).and_then(|outcome| {
                    if outcome == FrameOutcome::Skipped {
                        tracing::trace!("frame skipped");
                    }
                    state.maybe_reconfigure(window.inner_size())
                });
                if let Err(err) = frame_result {
                    fatal = Some(err);
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            window.request_redraw();
            elwt.set_control_flow(ControlFlow::Poll);
        }
        Event::LoopExiting => {
            // The device must drain before any owned GPU object is released;
            // the state drops after the loop returns.
            state.wait_idle();
        }
        _ => {}
    });

    if let Some(err) = fatal {
        return Err(err);
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

/// Latest known window-relative cursor position, origin at the top-left.
#[derive(Default)]
struct MouseState {
    position: Option<PhysicalPosition<f64>>,
}

impl MouseState {
    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.position = Some(position);
    }

    fn as_params(&self) -> [f32; 2] {
        match self.position {
            Some(pos) => [pos.x as f32, pos.y as f32],
            None => [0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_defaults_to_origin_until_moved() {
        let mut mouse = MouseState::default();
        assert_eq!(mouse.as_params(), [0.0, 0.0]);

        mouse.handle_cursor_moved(PhysicalPosition::new(320.5, 240.25));
        assert_eq!(mouse.as_params(), [320.5, 240.25]);
    }
}
