use std::path::PathBuf;

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and tells the renderer which shader pair
/// to load, how large the window should be, and which presentation policy to
/// request. The granted surface size may legally differ from
/// `requested_size`; callers must read the stored resolution back after
/// construction rather than assume the request was honored.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window title shown by the OS.
    pub window_title: String,
    /// Requested window/surface size in physical pixels.
    pub requested_size: (u32, u32),
    /// Whether presentation should wait for vertical blank.
    pub vsync: bool,
    /// Directory holding the shader binaries/sources consumed at startup.
    pub shaders_root: PathBuf,
    /// Base name of the shader pair (`<name>.comp` compute, `<name>` draw).
    pub shader_name: String,
    /// Static texture decoded and uploaded once at startup.
    pub texture_path: PathBuf,
}

impl Default for RendererConfig {
    /// Provides the stock 1280x720 vsynced configuration of the demo tasks.
    fn default() -> Self {
        Self {
            window_title: "Local Shadertoy".to_owned(),
            requested_size: (1280, 720),
            vsync: true,
            shaders_root: PathBuf::new(),
            shader_name: "toy".to_owned(),
            texture_path: PathBuf::new(),
        }
    }
}

/// Snapshot of the adapter the device was created on, kept for diagnostics.
#[derive(Clone, Debug)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    /// True when the adapter is a CPU fallback (llvmpipe, SwiftShader, ...).
    pub fn is_software(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || name.contains("llvmpipe")
            || name.contains("swiftshader")
    }
}
