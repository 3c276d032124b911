// src/main.rs
use clap::Parser;
use jigsaw_sim::puzzle::{FsImageLoader, Puzzle, PuzzleConfig};
use jigsaw_sim::render::SvgSurface;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "jigsaw-sim", version, about = "Cuts an image into a jigsaw puzzle")]
struct Cli {
    /// Bilddatei, aus der das Puzzle entsteht
    #[arg(long)]
    image: Option<String>,
    /// Zuvor gespeicherter Snapshot statt eines neuen Puzzles
    #[arg(long, conflicts_with = "image")]
    restore: Option<PathBuf>,
    #[arg(long, default_value_t = 80)]
    pieces: u32,
    #[arg(long, default_value = "square")]
    cut: String,
    #[arg(long, default_value = "classic")]
    attachment: String,
    #[arg(long, default_value_t = 2.0)]
    distortion: f64,
    #[arg(long, default_value_t = 1)]
    rotate_steps: u32,
    /// Canvas-Größe als `BREITExHÖHE`
    #[arg(long, default_value = "1280x800", value_parser = parse_canvas)]
    canvas: (f64, f64),
    /// Zahl oder beliebiger Text
    #[arg(long)]
    seed: Option<String>,
    /// Verzeichnis für relative Bildpfade
    #[arg(long)]
    image_root: Option<PathBuf>,
    #[arg(long, default_value = "#797979")]
    background: String,
    /// Teile um das Bett verteilen
    #[arg(long)]
    shuffle: bool,
    #[arg(long)]
    show_preview: bool,
    /// Zielpfad für die SVG-Darstellung
    #[arg(long)]
    out: Option<PathBuf>,
    /// Zielpfad für den JSON-Snapshot
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn parse_canvas(value: &str) -> Result<(f64, f64), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    if w <= 0.0 || h <= 0.0 {
        return Err(format!("canvas must be positive, got {w}x{h}"));
    }
    Ok((w, h))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let loader = match &cli.image_root {
        Some(root) => FsImageLoader::new().with_root(root),
        None => FsImageLoader::new(),
    };

    let mut puzzle = match (&cli.restore, &cli.image) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)?;
            let mut puzzle = Puzzle::from_json(&json, &loader)?;
            let (width, height) = cli.canvas;
            puzzle.resize(width, height);
            puzzle
        }
        (None, Some(image)) => {
            let mut config = PuzzleConfig::new()
                .with_num_pieces(cli.pieces)
                .with_cut(cli.cut.as_str())
                .with_attachment(cli.attachment.as_str())
                .with_distortion(cli.distortion)
                .with_rotate_steps(cli.rotate_steps)
                .with_background(cli.background.as_str(), "");
            if let Some(seed) = &cli.seed {
                config = config.with_seed_phrase(seed);
            }
            let (width, height) = cli.canvas;
            let mut puzzle = Puzzle::new(width, height);
            puzzle.prepare_puzzle(config, image, &loader)?;
            puzzle
        }
        (None, None) => return Err("either --image or --restore is required".into()),
    };

    if cli.shuffle {
        puzzle.shuffle();
    }
    if cli.show_preview {
        puzzle.toggle_preview(Some(true));
    }

    if let Some(path) = &cli.snapshot {
        std::fs::write(path, puzzle.to_json()?)?;
        info!("Snapshot '{}' written", path.display());
    }
    if let Some(path) = &cli.out {
        let canvas = puzzle.canvas_bbox();
        let mut surface = SvgSurface::new(canvas.width(), canvas.height());
        let drawn = puzzle.draw(&mut surface, None);
        info!("{} parts drawn", drawn);
        surface.write_to(path)?;
    }
    info!(
        "{} active parts from {} pieces, solved: {}",
        puzzle.num_pieces(),
        puzzle.total_pieces(),
        puzzle.is_solved()
    );
    Ok(())
}
