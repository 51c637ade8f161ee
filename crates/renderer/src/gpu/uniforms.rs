use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

/// Fixed-layout parameter record shared verbatim with the shaders.
///
/// Layout must match the `ShaderParams` uniform block declared in
/// `toy.comp.wgsl` / `toy.wgsl`: two vec2s, a float, and explicit padding to
/// a 32-byte stride. Uploaded through the uniform buffer every frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ShaderParams {
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    pub _pad: [f32; 3],
}

/// Size the pipelines declare via `min_binding_size`.
pub(crate) const SHADER_PARAMS_SIZE: u64 = std::mem::size_of::<ShaderParams>() as u64;

const _: () = assert!(std::mem::size_of::<ShaderParams>() == 32);
const _: () = assert!(std::mem::align_of::<ShaderParams>() == 4);

impl ShaderParams {
    pub(crate) fn new(resolution: PhysicalSize<u32>, mouse: [f32; 2], time: f32) -> Self {
        Self {
            resolution: [resolution.width as f32, resolution.height as f32],
            mouse,
            time,
            _pad: [0.0; 3],
        }
    }
}

/// Elapsed-seconds source for the `time` parameter.
///
/// `Instant` is monotonic, but the clamp keeps the non-decreasing guarantee
/// explicit instead of implied.
#[derive(Debug)]
pub(crate) struct ParamsClock {
    start: Instant,
    last_seconds: f32,
}

impl ParamsClock {
    pub(crate) fn new(start: Instant) -> Self {
        Self {
            start,
            last_seconds: 0.0,
        }
    }

    pub(crate) fn seconds_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        self.last_seconds = elapsed.max(self.last_seconds);
        self.last_seconds
    }
}
