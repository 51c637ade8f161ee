use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "localtoy",
    author,
    version,
    about = "Windowed compute-then-sample shader demo",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Shader name to run; resolves `<NAME>.comp` and `<NAME>` under the shaders root.
    #[arg(value_name = "NAME")]
    pub shader: Option<String>,

    /// Override the window resolution (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Present as fast as the driver allows instead of waiting for vsync.
    #[arg(long)]
    pub no_vsync: bool,

    /// Directory searched for compiled (`.spv`) and source (`.wgsl`) shaders.
    #[arg(long, value_name = "DIR", env = "LOCALTOY_SHADERS_ROOT")]
    pub shaders_root: Option<PathBuf>,

    /// Image sampled by the fragment shader alongside the generated pattern.
    #[arg(long, value_name = "PATH", env = "LOCALTOY_TEXTURE")]
    pub texture: Option<PathBuf>,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shader_name_is_positional() {
        let cli = Cli::parse_from(["localtoy", "plasma", "--no-vsync"]);
        assert_eq!(cli.shader.as_deref(), Some("plasma"));
        assert!(cli.no_vsync);
        assert!(cli.size.is_none());
    }
}
