use std::time::Instant;

use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, RendererConfig};

use super::context::GpuContext;
use super::frame::{
    frame_plan, AccessTracker, FrameCycle, FrameEvent, FrameJournal, FrameStep, ImageRole,
};
use super::pipeline::Pipelines;
use super::textures::{PatternImage, StaticTexture};
use super::uniforms::{ParamsClock, ShaderParams, SHADER_PARAMS_SIZE};

/// What a call to `render_frame` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    Presented,
    /// No rendering work was recorded (or presentation was suboptimal);
    /// swapchain reconfiguration is deferred to `maybe_reconfigure`.
    Skipped,
}

/// Owns every GPU object of the demo and replays the frame plan against
/// real wgpu encoders.
pub(crate) struct GpuState {
    context: GpuContext,
    pipelines: Pipelines,
    uniform_buffer: wgpu::Buffer,
    compute_bind_group: wgpu::BindGroup,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    pattern: PatternImage,
    _static_texture: StaticTexture,
    clock: ParamsClock,
    journal: FrameJournal,
    cycle: FrameCycle,
}

impl GpuState {
    /// Bootstraps in the order the demo documents: context, pipelines,
    /// pattern image at the granted resolution, then the blocking texture
    /// upload. Any failure aborts construction.
    ///
    /// `inner_size` is the window's reported size; window managers may not
    /// honor the configured size, and the surface must match what the
    /// window actually got.
    pub(crate) fn new<T>(
        target: &T,
        config: &RendererConfig,
        inner_size: PhysicalSize<u32>,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let requested = initial_surface_size(inner_size, config.requested_size);
        let context = GpuContext::new(target, requested, config.vsync)?;

        let pipelines = Pipelines::new(
            &context.device,
            &config.shaders_root,
            &config.shader_name,
            context.surface_format,
        )
        .with_context(|| {
            format!(
                "failed to build pipelines for shader '{}'",
                config.shader_name
            )
        })?;

        let pattern = PatternImage::new(&context.device, context.size);
        let static_texture = StaticTexture::load(&context.device, &context.queue, &config.texture_path)?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("params buffer"),
            size: SHADER_PARAMS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let compute_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pattern compute bind group"),
            layout: &pipelines.compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&pattern.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });
        let uniform_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("params bind group"),
            layout: &pipelines.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let texture_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sampled images bind group"),
            layout: &pipelines.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&pattern.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&pattern.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&static_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&static_texture.sampler),
                },
            ],
        });

        Ok(Self {
            context,
            pipelines,
            uniform_buffer,
            compute_bind_group,
            uniform_bind_group,
            texture_bind_group,
            pattern,
            _static_texture: static_texture,
            clock: ParamsClock::new(Instant::now()),
            journal: FrameJournal::new(),
            cycle: FrameCycle::new(),
        })
    }

    /// The granted resolution the demo renders at. May differ from the
    /// requested one; fixed for the lifetime of the state.
    pub(crate) fn resolution(&self) -> PhysicalSize<u32> {
        self.pattern.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Records and submits one frame. Begin/end bookkeeping always runs;
    /// dispatch and draw are skipped when no swapchain image is available.
    pub(crate) fn render_frame(&mut self, mouse: [f32; 2]) -> Result<FrameOutcome> {
        self.journal.begin_frame();
        let outcome = self.render_inner(mouse);
        if matches!(outcome, Ok(FrameOutcome::Skipped)) {
            self.journal.record(FrameEvent::FrameSkipped);
        }
        self.journal.end_frame();
        if let Ok(outcome) = &outcome {
            self.cycle
                .after_frame(matches!(outcome, FrameOutcome::Presented));
        }
        outcome
    }

    fn render_inner(&mut self, mouse: [f32; 2]) -> Result<FrameOutcome> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("surface ran out of memory");
            }
            Err(err) => {
                tracing::debug!(error = ?err, "swapchain image unavailable; skipping frame");
                return Ok(FrameOutcome::Skipped);
            }
        };
        let suboptimal = frame.suboptimal;

        let time = self.clock.seconds_at(Instant::now());
        let params = ShaderParams::new(self.pattern.size, mouse, time);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));

        let backbuffer_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        // Swapchain images arrive in an undefined state every frame.
        let mut backbuffer = AccessTracker::new(ImageRole::Backbuffer);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        for step in frame_plan(self.pattern.size) {
            match step {
                FrameStep::Transition { role, to } => {
                    let transition = match role {
                        ImageRole::Backbuffer => backbuffer.transition(to),
                        ImageRole::PatternImage => self.pattern.tracker.transition(to),
                    };
                    self.journal.record(FrameEvent::Barrier(transition));
                }
                FrameStep::DispatchPattern { groups } => {
                    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("pattern pass"),
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(&self.pipelines.compute);
                    pass.set_bind_group(0, &self.compute_bind_group, &[]);
                    pass.dispatch_workgroups(groups.0, groups.1, groups.2);
                    drop(pass);
                    self.journal.record(FrameEvent::Dispatch { groups });
                }
                FrameStep::DrawFullscreen { vertices } => {
                    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("toy pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &backbuffer_view,
                            depth_slice: None,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(&self.pipelines.render);
                    pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                    pass.set_bind_group(1, &self.texture_bind_group, &[]);
                    pass.draw(0..vertices, 0..1);
                    drop(pass);
                    self.journal.record(FrameEvent::Draw { vertices });
                }
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        self.journal.record(FrameEvent::Submitted);

        frame.present();
        self.journal.record(FrameEvent::Presented);

        if suboptimal {
            // Resize race: the image was presented but the swapchain no
            // longer matches the window. Treat the frame as skipped so the
            // deferred reconfigure path runs.
            tracing::debug!("suboptimal presentation; frame treated as skipped");
            return Ok(FrameOutcome::Skipped);
        }
        Ok(FrameOutcome::Presented)
    }

    /// Rebuilds the swapchain after a skipped frame once the window reports
    /// a usable size again. The granted size must still match the startup
    /// grant; this encodes a platform assumption, not a guaranteed
    /// invariant, and fails loudly where it does not hold.
    pub(crate) fn maybe_reconfigure(&mut self, window_size: PhysicalSize<u32>) -> Result<()> {
        if !self.cycle.needs_reconfigure(window_size) {
            return Ok(());
        }

        let granted = self.context.reconfigure();
        self.journal.record(FrameEvent::SurfaceReconfigured {
            width: granted.width,
            height: granted.height,
        });
        anyhow::ensure!(
            window_size == self.pattern.size,
            "window reports {}x{} after swapchain rebuild but {}x{} was granted at startup; \
             resolution changes are not supported",
            window_size.width,
            window_size.height,
            self.pattern.size.width,
            self.pattern.size.height,
        );
        self.cycle.reconfigured();
        tracing::info!(
            width = granted.width,
            height = granted.height,
            "swapchain reconfigured"
        );
        Ok(())
    }

    /// Follow the OS window so presentation keeps working; the demo
    /// resolution and the pattern image are fixed at the startup grant.
    pub(crate) fn resize_surface(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize_surface(new_size);
    }

    /// Blocks until all outstanding GPU work completes. Must run before the
    /// state (and everything it owns) is dropped.
    pub(crate) fn wait_idle(&mut self) {
        if let Err(err) = self.context.device.poll(wgpu::PollType::Wait) {
            tracing::warn!(error = ?err, "device wait at shutdown failed");
        }
        self.journal.record(FrameEvent::DeviceWaited);
        tracing::info!(
            frames = self.journal.frames_ended(),
            dispatches = self.journal.total_dispatches(),
            draws = self.journal.total_draws(),
            "run complete; device idle"
        );
    }
}

/// The size the surface is first configured at. The window's reported size
/// wins over the configured request; the request is only used while the
/// window has no usable size yet.
fn initial_surface_size(reported: PhysicalSize<u32>, requested: (u32, u32)) -> PhysicalSize<u32> {
    if reported.width != 0 && reported.height != 0 {
        reported
    } else {
        PhysicalSize::new(requested.0, requested.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_follows_the_reported_window_size() {
        // A tiling WM or DPI scaling may grant something other than the
        // configured size; the surface must match the window, not the wish.
        assert_eq!(
            initial_surface_size(PhysicalSize::new(1256, 688), (1280, 720)),
            PhysicalSize::new(1256, 688)
        );
    }

    #[test]
    fn zero_reported_size_falls_back_to_the_request() {
        assert_eq!(
            initial_surface_size(PhysicalSize::new(0, 0), (1280, 720)),
            PhysicalSize::new(1280, 720)
        );
        assert_eq!(
            initial_surface_size(PhysicalSize::new(1280, 0), (1280, 720)),
            PhysicalSize::new(1280, 720)
        );
    }
}
