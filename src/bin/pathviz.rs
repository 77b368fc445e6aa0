use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use pathviz::{ComposeOpts, DEFAULT_STEP_LIMIT, FrameComposer, RenderSettings};

#[derive(Parser, Debug)]
#[command(name = "pathviz", version, about = "Render pathfinding debug snapshots to PNG frames")]
struct Cli {
    /// Base names; `B` reads `B_ground_truth.json`, `B_step_{i}.json`, `B_final_path.json`.
    #[arg(required = true)]
    bases: Vec<String>,

    /// Preview a single step instead of running the whole series.
    #[arg(short, long)]
    step: Option<u32>,

    /// Preview: write the PNG but do not launch a viewer.
    #[arg(long)]
    no_open: bool,

    /// Draw scalar labels from `sample_grid`.
    #[arg(short, long)]
    labels: bool,

    /// Maximum number of step frames.
    #[arg(short = 'i', long, default_value_t = DEFAULT_STEP_LIMIT)]
    limit: u32,

    /// Overlay base name (reads `NAME_{i}.json`).
    #[arg(short, long)]
    overlay: Option<String>,

    /// Input directory prefix for every base name.
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Output directory (default: the input directory).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Frame width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u16,

    /// Frame height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u16,

    /// Frame background as `#rrggbb` or `#rrggbbaa`.
    #[arg(long, default_value = "#ffffff")]
    background: String,

    /// Font file for text layers (overrides `PATHVIZ_FONT` and system fonts).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Raise log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = RenderSettings {
        width: cli.width,
        height: cli.height,
        background: pathviz::parse_hex_color(&cli.background)
            .with_context(|| format!("parse --background '{}'", cli.background))?,
        font_path: cli.font.clone(),
        ..RenderSettings::default()
    };
    let opts = ComposeOpts {
        labels: cli.labels,
        limit: cli.limit,
        overlay: cli.overlay.clone(),
        input_dir: cli.dir.clone(),
        out_dir: cli.out_dir.clone(),
    };
    let mut composer = FrameComposer::new(settings, opts).context("create canvas")?;

    let mut failed = Vec::new();

    if let Some(step) = cli.step {
        for base in &cli.bases {
            match pathviz::preview_step(&mut composer, base, step, !cli.no_open) {
                Ok(out) => eprintln!("wrote {}", out.display()),
                Err(e) => {
                    eprintln!("{base}: preview step {step}: {e}");
                    failed.push(base.clone());
                }
            }
        }
        return finish(failed);
    }

    for (base, res) in composer.run_batch(&cli.bases) {
        match res {
            Ok(summary) => {
                for path in &summary.frames_written {
                    eprintln!("wrote {}", path.display());
                }
                eprintln!(
                    "{base}: {} step frame(s), time taken {:.2?}",
                    summary.steps_rendered, summary.elapsed
                );
            }
            Err(e) => {
                eprintln!("{base}: {e}");
                failed.push(base);
            }
        }
    }

    finish(failed)
}

/// Every base name has been attempted; fail the process if any of them did.
fn finish(failed: Vec<String>) -> anyhow::Result<()> {
    if !failed.is_empty() {
        anyhow::bail!("{} base name(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
