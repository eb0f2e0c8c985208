use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use scenereel::{
    Artifact, DecodingLoader, FfmpegCaptureHost, FrameCompositor, ImageLoader as _, Orientation,
    PreparedImage, RenderEvent, RenderOpts, RenderOrchestrator, SceneManifest, SceneTimeline,
    SpeechDecoder, Surface, TimelineOpts,
};

#[derive(Parser, Debug)]
#[command(name = "scenereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite one scene as a PNG.
    Frame(FrameArgs),
    /// Record a WebM video of every scene (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(o: OrientationArg) -> Self {
        match o {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(Parser, Debug)]
struct OptsArgs {
    /// Render options JSON; unspecified fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Canvas orientation.
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Font file for subtitles. Without one, subtitles are not drawn.
    #[arg(long)]
    font: Option<PathBuf>,
}

impl OptsArgs {
    fn load(&self) -> anyhow::Result<RenderOpts> {
        let mut opts = match &self.config {
            Some(p) => RenderOpts::from_path(p)?,
            None => RenderOpts::default(),
        };
        if let Some(o) = self.orientation {
            opts.orientation = o.into();
            opts.canvas = None;
        }
        if let Some(font) = &self.font {
            opts.font_path = Some(font.clone());
        }
        opts.validate()?;
        Ok(opts)
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Scene index (0-based).
    #[arg(long, default_value_t = 0)]
    scene: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    opts: OptsArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output WebM path. Defaults to `viral_<kind>_<unix ms>.webm` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the render report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    opts: OptsArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args).await,
        Command::Render(args) => cmd_render(args).await,
    }
}

fn load_timeline(in_path: &Path, opts: &RenderOpts) -> anyhow::Result<SceneTimeline> {
    let manifest = SceneManifest::from_path(in_path)?;
    let base_dir = in_path.parent().unwrap_or_else(|| Path::new("."));
    let timeline = SceneTimeline::build(
        manifest.into_sources(base_dir),
        &SpeechDecoder::default(),
        &TimelineOpts::from(opts),
    )?;
    Ok(timeline)
}

async fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let opts = args.opts.load()?;
    let timeline = load_timeline(&args.in_path, &opts)?;
    let scene = timeline
        .get(args.scene)
        .with_context(|| format!("scene {} out of range ({} scenes)", args.scene, timeline.len()))?;

    let canvas = opts.canvas();
    let image = match DecodingLoader.load(scene.image(), canvas).await {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(error = %e, "scene image unavailable, drawing placeholder");
            PreparedImage::placeholder(canvas)
        }
    };

    let mut compositor = FrameCompositor::from_opts(&opts)?;
    let mut surface = Surface::new(canvas)?;
    compositor.draw_frame(&mut surface, &image, scene)?;
    let frame = surface.snapshot();

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let opts = args.opts.load()?;
    let timeline = load_timeline(&args.in_path, &opts)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orchestrator = RenderOrchestrator::new(
        opts.clone(),
        Arc::new(FfmpegCaptureHost::probe()),
        Arc::new(DecodingLoader),
    )
    .with_events(tx);

    let progress = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            match ev {
                RenderEvent::Progress { percent } => eprintln!("progress {percent}%"),
                RenderEvent::ImageSubstituted { index, reason } => {
                    eprintln!("scene {index}: image substituted ({reason})");
                }
                other => tracing::debug!(event = ?other, "render event"),
            }
        }
    });

    let abort = orchestrator.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, aborting render");
            abort.cancel();
        }
    });

    let output = orchestrator.render(&timeline).await;
    drop(orchestrator);
    let _ = progress.await;
    let output = output?;

    let out = match args.out {
        Some(p) => p,
        None => {
            let millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .context("system clock is before the unix epoch")?
                .as_millis();
            let orientation = if opts.canvas().is_portrait() {
                Orientation::Portrait
            } else {
                Orientation::Landscape
            };
            PathBuf::from(Artifact::suggested_file_name(orientation, millis))
        }
    };
    output.artifact.write_to(&out)?;

    if let Some(report) = &args.report {
        let json = serde_json::to_vec_pretty(&output.report).context("serialize render report")?;
        std::fs::write(report, json)
            .with_context(|| format!("write report '{}'", report.display()))?;
    }

    eprintln!(
        "wrote {} ({} bytes, {} scenes, {:.1}s)",
        out.display(),
        output.artifact.len(),
        output.report.scenes.len(),
        output.report.elapsed.as_secs_f64()
    );
    Ok(())
}
