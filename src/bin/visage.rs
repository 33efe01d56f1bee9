use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use visage::{
    CompositePath, CropPurpose, DEFAULT_OUTFIT, DirAssetStore, EngineConfig, Expression,
    ImageBuffer, MemoryAssetStore, ReadableImage, Rgb8, SmartCropper, VisualEngine,
};

#[derive(Parser, Debug)]
#[command(name = "visage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a persona's layers into a portrait PNG.
    Composite(CompositeArgs),
    /// Resolve a persona's avatar (falls back to a generated placeholder).
    Avatar(AvatarArgs),
    /// Crop a PNG for a display purpose.
    Crop(CropArgs),
    /// Step the blink and breathing machines and print one line per frame.
    Animate(AnimateArgs),
}

#[derive(Parser, Debug)]
struct CompositeArgs {
    /// Asset root directory.
    #[arg(long)]
    assets: PathBuf,

    /// Persona id.
    #[arg(long)]
    persona: String,

    /// Expression name.
    #[arg(long, default_value_t = Expression::Neutral)]
    expression: Expression,

    /// Outfit layer.
    #[arg(long, default_value = DEFAULT_OUTFIT)]
    outfit: String,

    /// Composite through the render-target path.
    #[arg(long, default_value_t = false)]
    gpu: bool,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AvatarArgs {
    /// Asset root directory.
    #[arg(long)]
    assets: PathBuf,

    /// Persona id.
    #[arg(long)]
    persona: String,

    /// Expression name; omit for the persona's current expression.
    #[arg(long)]
    expression: Option<Expression>,

    /// Placeholder colour as `r,g,b`.
    #[arg(long)]
    color: Option<Rgb8>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CropArgs {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Crop purpose: avatar, expression or full.
    #[arg(long)]
    purpose: CropPurpose,

    /// Use the brightness-profile rectangle instead of the fixed one.
    #[arg(long, default_value_t = false)]
    smart: bool,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AnimateArgs {
    /// Persona id.
    #[arg(long)]
    persona: String,

    /// Expression name.
    #[arg(long)]
    expression: Expression,

    /// Number of frames to step.
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Seconds per frame.
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f64,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Composite(args) => cmd_composite(args),
        Command::Avatar(args) => cmd_avatar(args),
        Command::Crop(args) => cmd_crop(args),
        Command::Animate(args) => cmd_animate(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = EngineConfig::from_path(path)?;
    tracing::debug!(path = %path.display(), "loaded engine config");
    Ok(config)
}

fn cmd_composite(args: CompositeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.gpu {
        config.composite_path = CompositePath::Gpu;
    }
    let mut engine = VisualEngine::new(config, Box::new(DirAssetStore::new(&args.assets)))?;

    let img = engine
        .portrait(&args.persona, args.expression, &args.outfit)
        .with_context(|| {
            format!(
                "no '{}' layers for persona '{}' under '{}'",
                args.outfit,
                args.persona,
                args.assets.display()
            )
        })?;
    write_png(&args.out, &img)
}

fn cmd_avatar(args: AvatarArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut engine = VisualEngine::new(config, Box::new(DirAssetStore::new(&args.assets)))?;
    if let Some(color) = args.color {
        engine.register_persona(&args.persona, color)?;
    }

    let img = engine.avatar(&args.persona, args.expression);
    write_png(&args.out, &img)
}

fn cmd_crop(args: CropArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read png '{}'", args.in_path.display()))?;
    let source = Arc::new(visage::decode_image(&bytes)?);

    let mut cropper = SmartCropper::new(config.cache);
    let cropped = if args.smart {
        cropper.crop_smart(&source, args.purpose)
    } else {
        cropper.crop(&source, args.purpose, None)
    };
    let img = cropped.with_context(|| {
        format!(
            "crop of {}x{} image produced nothing",
            source.width(),
            source.height()
        )
    })?;
    write_png(&args.out, &img)
}

fn cmd_animate(args: AnimateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.dt.is_finite() && args.dt >= 0.0,
        "--dt must be a finite non-negative number of seconds"
    );
    let config = load_config(args.config.as_deref())?;
    let mut engine = VisualEngine::new(config, Box::new(MemoryAssetStore::new()))?;
    if !engine.is_registered(&args.persona) {
        engine.register_persona(&args.persona, Rgb8::GRAY)?;
    }

    for frame in 0..args.frames {
        let state = engine.tick(&args.persona, args.expression, args.dt)?;
        println!(
            "{frame:>5} {:<24} alpha={:.3} closed={:.3} offset={:+.4} {}",
            state.eye_layer,
            state.blink_alpha,
            state.closed_weight,
            state.breathing_offset,
            state.breathing_status
        );
    }
    Ok(())
}

fn write_png(out: &Path, img: &Arc<ImageBuffer>) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let readable = ReadableImage::ensure(img)?;
    let bytes = visage::encode_png(&readable)?;
    std::fs::write(out, bytes).with_context(|| format!("write png '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}
