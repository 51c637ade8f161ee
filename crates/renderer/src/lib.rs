//! Renderer for the local-shadertoy demo.
//!
//! The crate glues a winit window, a wgpu device, and a fixed pair of
//! shaders together. The overall flow is:
//!
//! ```text
//!   CLI / localtoy
//!          │ RendererConfig
//!          ▼
//!   renderer::run ──▶ winit event loop ──▶ GpuState::render_frame()
//!          ▲                                        │
//!          │                       compute pass ────┤
//!          │                       (pattern image)  │
//!          │                       render pass ─────┤
//!          │                       (fullscreen tri) ▼
//!          └──────────── close request          present
//! ```
//!
//! `GpuState` owns every GPU object (surface, device, pipelines, images,
//! uniforms); device selection, swapchain bookkeeping, and barrier insertion
//! are wgpu's responsibility. The per-frame contract (which transitions,
//! dispatches, and draws happen in which order) lives in `gpu::frame` as
//! plain data so it can be tested without a device.

mod gpu;
mod types;
mod window;

use anyhow::Result;

pub use types::{AdapterProfile, RendererConfig};

/// Opens the window and renders until it is closed.
///
/// Blocks the calling thread for the lifetime of the window. All GPU and
/// windowing failures are fatal and surface as errors; the only soft failure
/// is a temporarily unavailable swapchain, which skips frames internally.
pub fn run(config: RendererConfig) -> Result<()> {
    window::run(config)
}
