use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "flipbook", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode frame files into a diff artifact.
    Encode(EncodeArgs),
    /// Reconstruct one frame of an artifact.
    Frame(FrameArgs),
    /// Play an artifact headlessly, printing the frame index at every tick.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Frame files in sequence order (PNG, JPEG, GIF, WebP, BMP, or SVG).
    #[arg(long, num_args = 1.., required = true)]
    frames: Vec<PathBuf>,

    /// Output artifact JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Settings JSON (defaults apply when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the tick interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<f64>,

    /// Override the default loop mode (`once`, `loop`, `reflect`).
    #[arg(long)]
    mode: Option<flipbook::LoopMode>,

    /// Diff frame pairs on the calling thread.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input artifact JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Write PNG, rasterizing SVG frames.
    #[arg(long, default_value_t = false)]
    png: bool,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input artifact JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stop after this many ticks. Defaults to one pass over the sequence.
    #[arg(long)]
    ticks: Option<usize>,

    /// Override the artifact's loop mode.
    #[arg(long)]
    mode: Option<flipbook::LoopMode>,

    /// Start playing backward from the last frame.
    #[arg(long, default_value_t = false)]
    reverse: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Encode(args) => cmd_encode(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => flipbook::FlipbookConfig::load(path)?,
        None => flipbook::FlipbookConfig::default(),
    };
    if let Some(ms) = args.interval_ms {
        cfg.interval_ms = ms;
    }
    if let Some(mode) = args.mode {
        cfg.default_mode = mode;
    }
    if args.sequential {
        cfg.parallel_diff = false;
    }
    cfg.validate()?;

    let uris = args
        .frames
        .iter()
        .map(|p| flipbook::encode_frame_file(p))
        .collect::<Result<Vec<_>, _>>()?;
    let store = flipbook::CheckpointStore::from_frames(&uris, &flipbook::DiffOpts::from(&cfg))?;
    let stored = store.stored_chars();
    let raw: usize = uris.iter().map(|u| u.chars().count()).sum();

    let artifact = flipbook::Artifact::diff(store, flipbook::PlaybackConfig::from(&cfg));
    artifact.write_to(&args.out)?;

    eprintln!(
        "wrote {} ({} frames, {stored} of {raw} chars stored)",
        args.out.display(),
        uris.len()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let artifact = flipbook::Artifact::read_from(&args.in_path)?;
    let frame = artifact.reconstruct(flipbook::FrameIndex(args.frame))?;

    let (mime, bytes) = match &artifact {
        flipbook::Artifact::Diff { .. } => flipbook::decode_frame(&frame)?,
        flipbook::Artifact::Scene { .. } => ("image/svg+xml".to_owned(), frame.into_bytes()),
    };
    let bytes = if !args.png || mime == "image/png" {
        bytes
    } else if mime == "image/svg+xml" {
        flipbook::svg_to_png(&bytes, 1.0)?
    } else {
        let img = image::load_from_memory(&bytes).context("decode frame image")?;
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        buf
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write frame '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let artifact = flipbook::Artifact::read_from(&args.in_path)?;
    let mut engine = artifact.into_engine()?;
    if let Some(mode) = args.mode {
        engine.set_loop_mode(mode);
    }
    let ticks = args
        .ticks
        .unwrap_or_else(|| engine.frame_count().saturating_sub(1));

    let mut stdout = std::io::stdout().lock();
    if args.reverse {
        engine.last_frame()?;
        engine.reverse();
    } else {
        engine.play();
    }
    writeln!(stdout, "{}", engine.current_index())?;

    for _ in 0..ticks {
        let Some(wait) = engine.next_deadline() else {
            break;
        };
        std::thread::sleep(wait);
        engine.advance(wait)?;
        writeln!(stdout, "{}", engine.current_index())?;
    }
    Ok(())
}
