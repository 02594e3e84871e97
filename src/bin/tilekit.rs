use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tilekit::imaging::SHARPEN_3X3;
use tilekit::{SchedulerOpts, Toolkit};

#[derive(Parser, Debug)]
#[command(name = "tilekit", version)]
struct Cli {
    #[command(flatten)]
    pool: PoolArgs,

    /// Log scheduler activity to stderr (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Gaussian-blur an image.
    Blur(BlurArgs),
    /// Sharpen an image with a 3x3 filter.
    Sharpen(IoArgs),
    /// Print the 256-bin luminance histogram of an image as JSON.
    Histogram(HistogramArgs),
}

#[derive(Args, Debug)]
struct PoolArgs {
    /// Scheduler options JSON file. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Total threads including the caller (0 = auto).
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Target bytes per tile.
    #[arg(long, global = true)]
    tile_bytes: Option<usize>,
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct BlurArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Blur radius in pixels (1..=25).
    #[arg(long, default_value_t = 5)]
    radius: usize,
}

#[derive(Args, Debug)]
struct HistogramArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = scheduler_opts(&cli.pool)?;
    let toolkit = Toolkit::new(opts).context("start scheduler")?;

    match cli.cmd {
        Command::Blur(args) => {
            let img = load_rgba(&args.io.in_path)?;
            let out = toolkit
                .blur_image(&img, args.radius)
                .context("blur image")?;
            write_image(&out, &args.io.out)
        }
        Command::Sharpen(args) => {
            let img = load_rgba(&args.in_path)?;
            let out = toolkit
                .convolve_image(&img, &SHARPEN_3X3)
                .context("sharpen image")?;
            write_image(&out, &args.out)
        }
        Command::Histogram(args) => {
            let img = load_rgba(&args.in_path)?;
            let hist = toolkit.luma_histogram(&img).context("compute histogram")?;
            println!("{}", serde_json::to_string(&hist)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn scheduler_opts(args: &PoolArgs) -> anyhow::Result<SchedulerOpts> {
    let mut opts = match &args.config {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            SchedulerOpts::from_json_str(&s)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => SchedulerOpts::default(),
    };
    if let Some(threads) = args.threads {
        opts.threads = threads;
    }
    if let Some(tile_bytes) = args.tile_bytes {
        opts.target_tile_bytes = tile_bytes;
    }
    opts.validate()?;
    Ok(opts)
}

fn load_rgba(path: &Path) -> anyhow::Result<image::RgbaImage> {
    let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

fn write_image(img: &image::RgbaImage, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let format = image::ImageFormat::from_path(path)
        .with_context(|| format!("unknown image format for '{}'", path.display()))?;
    image::save_buffer_with_format(
        path,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ColorType::Rgba8,
        format,
    )
    .with_context(|| format!("write image '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
