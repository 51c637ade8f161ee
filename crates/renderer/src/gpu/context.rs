use anyhow::{anyhow, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::AdapterProfile;

/// Device, queue, and surface wiring for the demo.
///
/// Everything interesting here (queue selection, swapchain ownership,
/// barrier insertion) is wgpu's job; the context exposes just enough for the
/// frame loop: the granted size, the surface to acquire from, and the
/// reconfigure hook used after skipped frames.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(target: &T, requested_size: PhysicalSize<u32>, vsync: bool) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        let adapter_profile = AdapterProfile::from_wgpu(&adapter_info);
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software = adapter_profile.is_software(),
            "selected GPU adapter"
        );

        // The request is a request: the granted size is whatever fits the
        // device. Callers read `size` back instead of trusting their input.
        let granted = granted_size(requested_size, limits.max_texture_dimension_2d);
        if granted != requested_size {
            tracing::warn!(
                requested_width = requested_size.width,
                requested_height = requested_size.height,
                granted_width = granted.width,
                granted_height = granted.height,
                "requested surface size adjusted to device limits"
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("localtoy device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let present_mode = select_present_mode(&surface_caps.present_modes, vsync);
        tracing::debug!(?present_mode, vsync, "using present mode");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: granted.width,
            height: granted.height,
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            // One frame in flight: recording of frame N+1 never overlaps
            // frame N on the GPU beyond what presentation requires.
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size: granted,
            surface_format,
            adapter_profile,
        })
    }

    /// Follows the OS window when it changes size so presentation keeps
    /// working. The stored demo resolution (and the pattern image sized to
    /// it) stays at the startup grant.
    pub(crate) fn resize_surface(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Rebuilds the swapchain at the stored resolution and returns the size
    /// that was granted.
    pub(crate) fn reconfigure(&mut self) -> PhysicalSize<u32> {
        self.config.width = self.size.width;
        self.config.height = self.size.height;
        self.surface.configure(&self.device, &self.config);
        PhysicalSize::new(self.config.width, self.config.height)
    }
}

/// Clamps a requested surface size to what the device can texture.
fn granted_size(requested: PhysicalSize<u32>, max_dimension: u32) -> PhysicalSize<u32> {
    PhysicalSize::new(
        requested.width.clamp(1, max_dimension),
        requested.height.clamp(1, max_dimension),
    )
}

fn select_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    let fifo = available
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Fifo)
        .unwrap_or(available[0]);
    if vsync {
        fifo
    } else {
        available
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Immediate)
            .or_else(|| {
                available
                    .iter()
                    .copied()
                    .find(|mode| *mode == wgpu::PresentMode::Mailbox)
            })
            .unwrap_or(fifo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granted_size_follows_device_limits_not_the_request() {
        let max = 16384;
        assert_eq!(
            granted_size(PhysicalSize::new(1280, 720), max),
            PhysicalSize::new(1280, 720)
        );
        assert_eq!(
            granted_size(PhysicalSize::new(100_000, 720), max),
            PhysicalSize::new(max, 720)
        );
        assert_eq!(
            granted_size(PhysicalSize::new(0, 0), max),
            PhysicalSize::new(1, 1)
        );
    }

    #[test]
    fn vsync_prefers_fifo() {
        let modes = [
            wgpu::PresentMode::Immediate,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Fifo,
        ];
        assert_eq!(select_present_mode(&modes, true), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn no_vsync_falls_back_through_immediate_then_mailbox() {
        let all = [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Mailbox,
            wgpu::PresentMode::Immediate,
        ];
        assert_eq!(
            select_present_mode(&all, false),
            wgpu::PresentMode::Immediate
        );

        let no_immediate = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox];
        assert_eq!(
            select_present_mode(&no_immediate, false),
            wgpu::PresentMode::Mailbox
        );

        let fifo_only = [wgpu::PresentMode::Fifo];
        assert_eq!(
            select_present_mode(&fifo_only, false),
            wgpu::PresentMode::Fifo
        );
    }
}
