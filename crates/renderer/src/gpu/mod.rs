//! GPU orchestration for the local-shadertoy demo.
//!
//! The heavy lifting (device selection, swapchain ownership, barrier
//! insertion, descriptor lifetime) belongs to wgpu; these modules are the
//! glue that runs one compute pass and one draw per frame:
//! - `context` owns wgpu instance/device/surface wiring and knows how to
//!   rebuild swapchain state after a skipped frame.
//! - `frame` is the pure per-frame contract: the step plan, the tracked
//!   access states, and the journal the tests assert over.
//! - `pipeline` loads the shader pair by name and builds the one compute
//!   and one render pipeline used for the whole run.
//! - `textures` materialises the compute-written pattern image and the
//!   static texture uploaded (blockingly) at startup.
//! - `uniforms` mirrors the `ShaderParams` block shared with the shaders
//!   and keeps the time parameter monotonic.
//! - `state` glues everything together and replays the frame plan against
//!   real encoders.

mod context;
mod frame;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::{FrameOutcome, GpuState};
