use clap::Parser;
use overlapper::session::{replay, CommitOutcome};
use overlapper::ufo::UfoGlyph;
use overlapper::OverlapConfig;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "overlapper", about = "Overlap or chamfer selected glyph corners in a UFO")]
struct Cli {
    /// UFO font to edit in place
    #[arg(short, long)]
    ufo: PathBuf,

    /// Glyph name
    #[arg(short, long)]
    glyph: String,

    /// Offset in font units. Positive overlaps, negative chamfers.
    #[arg(short, long, allow_hyphen_values = true)]
    offset: i32,

    /// Select a point by contour and point index, e.g. "0:3" (repeatable)
    #[arg(short, long = "point", value_parser = parse_point_ref)]
    points: Vec<(usize, usize)>,

    /// Select every on-curve point at "x,y" (repeatable)
    #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
    at: Vec<(f64, f64)>,

    /// Join pairs of corners crosswise, as if Shift were held
    #[arg(long)]
    cross: bool,

    /// Grid size for committed coordinates (0 = off)
    #[arg(long, default_value = "0")]
    grid: f64,

    /// Hotkey the gesture is replayed with
    #[arg(long, default_value = "v")]
    hotkey: char,

    /// Report the result without saving
    #[arg(long)]
    dry_run: bool,
}

fn parse_point_ref(s: &str) -> Result<(usize, usize), String> {
    let (c, p) = s
        .split_once(':')
        .ok_or_else(|| format!("expected contour:point, got '{s}'"))?;
    let c = c.trim().parse().map_err(|e| format!("contour index: {e}"))?;
    let p = p.trim().parse().map_err(|e| format!("point index: {e}"))?;
    Ok((c, p))
}

fn parse_coord(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{s}'"))?;
    let x = x.trim().parse().map_err(|e| format!("x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("y: {e}"))?;
    Ok((x, y))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("overlapper=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = OverlapConfig {
        hotkey: cli.hotkey,
        snap_grid: cli.grid,
        ..OverlapConfig::default()
    };

    let mut font = norad::Font::load(&cli.ufo)?;
    let glyph = font
        .default_layer()
        .get_glyph(cli.glyph.as_str())
        .ok_or_else(|| format!("glyph '{}' not found in {}", cli.glyph, cli.ufo.display()))?
        .clone();

    let mut doc = UfoGlyph::new(glyph).with_snap_grid(cli.grid);
    for &(contour, point) in &cli.points {
        doc.select_point(contour, point)?;
    }
    for &(x, y) in &cli.at {
        if doc.select_at(kurbo::Point::new(x, y)) == 0 {
            warn!(x, y, "no on-curve point at coordinate");
        }
    }

    eprintln!();
    eprintln!("  overlapper \u{00b7} {} \u{00b7} offset {}", cli.glyph, cli.offset);
    eprintln!();

    match replay(&mut doc, &config, cli.offset, cli.cross)? {
        CommitOutcome::Committed {
            contours_before,
            contours_after,
        } => {
            eprintln!("  Contours    {contours_before} \u{2192} {contours_after}");
        }
        CommitOutcome::Unchanged => eprintln!("  Offset 0, glyph unchanged"),
        CommitOutcome::Inactive => {
            eprintln!("  Nothing selected, glyph unchanged");
            return Ok(());
        }
    }

    if cli.dry_run {
        eprintln!("  Dry run, not saved");
    } else {
        font.default_layer_mut().insert_glyph(doc.into_glyph());
        font.save(&cli.ufo)?;
        eprintln!("  \u{2713} {}", cli.ufo.display());
    }
    eprintln!();

    Ok(())
}
