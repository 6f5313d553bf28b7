#[cfg(not(target_arch = "wasm32"))]
fn main() {
    let cli = <cli::Cli as clap::Parser>::parse();
    cli::init_logging(cli.log_level);
    if let Err(err) = cli::run(cli) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::{bail, Context, Result};
    use clap::Parser;
    use log::{info, LevelFilter};

    use lighting_cube::{
        FrameDriver, HeadlessContext, LightingScene, LogSink, SceneConfig, TextureLoader,
    };

    /// Drives the lighting scene against a recording context and prints one
    /// summary line per frame.
    #[derive(Parser, Debug, Clone)]
    #[command(name = "lighting-cube")]
    #[command(about = "Phong-lit cube with an orbiting lamp", long_about = None)]
    pub struct Cli {
        /// Scene configuration as JSON; defaults apply to omitted fields
        #[arg(long)]
        pub config: Option<PathBuf>,
        /// Number of frames to render
        #[arg(long, default_value_t = 5)]
        pub frames: u32,
        /// Simulated frames per second
        #[arg(long, default_value_t = 60.0)]
        pub fps: f64,
        #[arg(long, default_value_t = 800)]
        pub width: u32,
        #[arg(long, default_value_t = 600)]
        pub height: u32,
        /// Image to decode and upload as a 2D texture while frames run
        #[arg(long)]
        pub texture: Option<PathBuf>,
        /// Overrides RUST_LOG (error, warn, info, debug, trace, off)
        #[arg(long)]
        pub log_level: Option<LevelFilter>,
    }

    pub fn init_logging(level: Option<LevelFilter>) {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        if let Some(level) = level {
            builder.filter_level(level);
        }
        builder.init();
    }

    pub fn run(cli: Cli) -> Result<()> {
        if !(cli.fps.is_finite() && cli.fps > 0.0) {
            bail!("--fps must be a positive number, got {}", cli.fps);
        }

        let config = match &cli.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SceneConfig::default(),
        };

        let ctx = HeadlessContext::new(cli.width, cli.height);
        let mut scene = LightingScene::new(&ctx, config, &LogSink)
            .context("failed to build lighting scene")?;

        let mut loader = TextureLoader::new();
        let texture = match &cli.texture {
            Some(path) => Some((
                path,
                loader
                    .load(&ctx, path)
                    .context("failed to create texture")?,
            )),
            None => None,
        };

        for index in 0..cli.frames {
            loader.upload_ready(&ctx);
            let seconds = f64::from(index) / cli.fps;
            let elapsed = Duration::try_from_secs_f64(seconds)
                .with_context(|| format!("frame {index} at --fps {} is out of range", cli.fps))?;
            let stats = scene.frame(&ctx, elapsed);
            println!(
                "frame {} t={:.3}s light=({:.2}, {:.2}, {:.2}) draws={}",
                stats.frame_index,
                stats.elapsed.as_secs_f32(),
                stats.light_pos.x,
                stats.light_pos.y,
                stats.light_pos.z,
                stats.draw_calls
            );
        }

        if let Some((path, texture)) = texture {
            loader.wait();
            loader.upload_ready(&ctx);
            match ctx.texture_size(texture) {
                Some((width, height)) => {
                    println!("texture {} {width}x{height}", path.display())
                }
                None => println!("texture {} failed to load", path.display()),
            }
        }

        let errors = ctx.errors();
        if !errors.is_empty() {
            bail!("rendering context reported errors: {}", errors.join("; "));
        }
        info!("rendered {} frame(s)", cli.frames);
        scene.destroy(&ctx);
        Ok(())
    }
}
