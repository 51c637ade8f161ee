use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Workspace-relative defaults baked in at build time so the demo runs from a
/// source checkout without any flags.
const DEFAULT_SHADERS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../shaders");
const DEFAULT_TEXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../resources/textures/test_tex_1.png"
);

pub fn default_shaders_root() -> PathBuf {
    PathBuf::from(DEFAULT_SHADERS_DIR)
}

pub fn default_texture_path() -> PathBuf {
    PathBuf::from(DEFAULT_TEXTURE)
}

/// Checks that both stages of a shader pair exist under `root` before any GPU
/// work starts. Each stage may be shipped as a compiled `.spv` module or as
/// WGSL source; the loader prefers the compiled form.
pub fn verify_shader_pair(root: &Path, name: &str) -> Result<()> {
    ensure_stage_present(root, &format!("{name}.comp"))
        .with_context(|| format!("compute shader for '{name}' is missing"))?;
    ensure_stage_present(root, name)
        .with_context(|| format!("vertex/fragment shader for '{name}' is missing"))?;
    Ok(())
}

fn ensure_stage_present(root: &Path, stem: &str) -> Result<()> {
    let spirv = root.join(format!("{stem}.spv"));
    let wgsl = root.join(format!("{stem}.wgsl"));
    if spirv.is_file() {
        debug!(path = %spirv.display(), "found compiled shader module");
        return Ok(());
    }
    if wgsl.is_file() {
        debug!(path = %wgsl.display(), "found shader source");
        return Ok(());
    }
    bail!(
        "neither {} nor {} exists",
        spirv.display(),
        wgsl.display()
    );
}

pub fn verify_texture(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("texture file does not exist at {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn shader_pair_accepts_wgsl_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("demo.comp.wgsl"), "// compute").unwrap();
        fs::write(dir.path().join("demo.wgsl"), "// graphics").unwrap();
        verify_shader_pair(dir.path(), "demo").expect("pair should resolve");
    }

    #[test]
    fn shader_pair_accepts_compiled_modules() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("demo.comp.spv"), [0u8; 4]).unwrap();
        fs::write(dir.path().join("demo.spv"), [0u8; 4]).unwrap();
        verify_shader_pair(dir.path(), "demo").expect("pair should resolve");
    }

    #[test]
    fn missing_compute_stage_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("demo.wgsl"), "// graphics only").unwrap();
        let err = verify_shader_pair(dir.path(), "demo").unwrap_err();
        assert!(format!("{err:#}").contains("compute shader"));
    }

    #[test]
    fn missing_texture_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.png");
        assert!(verify_texture(&path).is_err());
    }
}
