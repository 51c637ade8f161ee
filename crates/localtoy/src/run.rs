use anyhow::{anyhow, ensure, Context, Result};
use renderer::RendererConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths::{default_shaders_root, default_texture_path, verify_shader_pair, verify_texture};

pub fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    tracing::info!(
        shader = %config.shader_name,
        shaders_root = %config.shaders_root.display(),
        texture = %config.texture_path.display(),
        width = config.requested_size.0,
        height = config.requested_size.1,
        vsync = config.vsync,
        "starting localtoy"
    );
    renderer::run(config)
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Assembles the renderer configuration and fails fast on anything resolvable
/// without a GPU: bad size specs, missing shader files, missing texture.
fn build_config(cli: &Cli) -> Result<RendererConfig> {
    let mut config = RendererConfig::default();

    if let Some(name) = cli.shader.as_deref() {
        config.shader_name = name.to_string();
    }
    if let Some(title) = cli.title.as_deref() {
        config.window_title = title.to_string();
    }
    if let Some(spec) = cli.size.as_deref() {
        config.requested_size =
            parse_surface_size(spec).with_context(|| format!("invalid --size '{spec}'"))?;
    }
    config.vsync = !cli.no_vsync;
    config.shaders_root = cli
        .shaders_root
        .clone()
        .unwrap_or_else(default_shaders_root);
    config.texture_path = cli.texture.clone().unwrap_or_else(default_texture_path);

    verify_shader_pair(&config.shaders_root, &config.shader_name).with_context(|| {
        format!(
            "shader '{}' not found under {}",
            config.shader_name,
            config.shaders_root.display()
        )
    })?;
    verify_texture(&config.texture_path)?;

    Ok(config)
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let (width, height) = spec
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow!("size must look like WIDTHxHEIGHT, e.g. 1280x720"))?;
    Ok((parse_axis(width, "width")?, parse_axis(height, "height")?))
}

fn parse_axis(part: &str, axis: &str) -> Result<u32> {
    let value: u32 = part
        .trim()
        .parse()
        .map_err(|_| anyhow!("{axis} is not a whole number of pixels"))?;
    ensure!(value > 0, "{axis} must be at least one pixel");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_accepts_common_spellings() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 1920 X 1080 ").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size("640×480").unwrap(), (640, 480));
    }

    #[test]
    fn surface_size_rejects_zero_and_garbage() {
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("wide x tall").is_err());
    }

    #[test]
    fn surface_size_errors_name_the_offending_axis() {
        let err = parse_surface_size("0x720").unwrap_err();
        assert!(err.to_string().contains("width"));
        let err = parse_surface_size("1280xtall").unwrap_err();
        assert!(err.to_string().contains("height"));
    }
}
