use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sheet_cutter::plot::layout_to_svg;
use sheet_cutter::render;
use sheet_cutter::{PackConfig, PieceDemand, ScanOrder, SheetStock, Solver, Supply};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sheet_cutter",
    about = "Greedy 2D cutting planner for rectangular stock sheets"
)]
struct Cli {
    /// Stock sheet dimensions, opened as often as needed (WxH, e.g. 13x10)
    #[arg(long, conflicts_with = "inventory", required_unless_present = "inventory")]
    stock: Option<String>,

    /// Fixed sheet inventory as WxH:qty, used in the given order (e.g. 10x10:2 8x4:1)
    #[arg(long, num_args = 1..)]
    inventory: Vec<String>,

    /// Cut pieces as WxH:qty (e.g. 8x5:2 2x1:5)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Origin scan order: x-major or y-major
    #[arg(long, default_value = "x-major")]
    scan_order: ScanOrder,

    /// Overlap checks allowed before giving up (0 for unlimited)
    #[arg(long, default_value_t = sheet_cutter::config::DEFAULT_MAX_CHECKS)]
    max_checks: u64,

    /// Total demand units accepted (0 for unlimited)
    #[arg(long, default_value_t = sheet_cutter::config::DEFAULT_MAX_PIECES)]
    max_pieces: u64,

    /// Sheets the pool may hold (0 for unlimited)
    #[arg(long, default_value_t = sheet_cutter::config::DEFAULT_MAX_SHEETS)]
    max_sheets: u64,

    /// Wall-clock limit for the search in milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Write an SVG drawing of the layout to this path
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print the layout as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log search progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dimensions(s: &str) -> Result<(i64, i64), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<i64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<i64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    Ok((width, height))
}

fn parse_counted(s: &str) -> Result<(i64, i64, i64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid entry '{}', expected WxH:qty", s));
    }
    let (width, height) = parse_dimensions(parts[0])?;
    let qty = parts[1]
        .parse::<i64>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok((width, height, qty))
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let supply = match &cli.stock {
        Some(stock) => {
            let (w, h) = parse_dimensions(stock).unwrap_or_else(|e| fail(e));
            Supply::unbounded(w, h)
        }
        None => Supply::Inventory(
            cli.inventory
                .iter()
                .map(|s| parse_counted(s).map(|(w, h, q)| SheetStock::new(w, h, q)))
                .collect::<Result<Vec<_>, _>>()
                .unwrap_or_else(|e| fail(e)),
        ),
    };

    let demands: Vec<PieceDemand> = cli
        .cuts
        .iter()
        .map(|c| parse_counted(c).map(|(w, h, q)| PieceDemand::new(w, h, q)))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| fail(e));

    let config = PackConfig::default()
        .with_scan_order(cli.scan_order)
        .with_max_checks((cli.max_checks > 0).then_some(cli.max_checks))
        .with_max_pieces((cli.max_pieces > 0).then_some(cli.max_pieces))
        .with_max_sheets((cli.max_sheets > 0).then_some(cli.max_sheets))
        .with_time_limit(cli.time_limit_ms.map(Duration::from_millis));

    let layout = Solver::new(supply, demands, config)
        .solve()
        .unwrap_or_else(|e| fail(e));

    if let Some(path) = &cli.svg {
        svg::save(path, &layout_to_svg(&layout))
            .unwrap_or_else(|e| fail(format!("could not write {}: {}", path.display(), e)));
    }

    if cli.json {
        match serde_json::to_string_pretty(&layout) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
        return;
    }

    for sheet in &layout.opened_sheets {
        println!("Sheet {} ({}):", sheet.index + 1, sheet.size);
        for p in layout.placements_on(sheet.index) {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {} @ ({}, {}){}", p.rect, p.x, p.y, rot);
        }
        println!();
    }

    if cli.layout {
        print!("{}", render::render_layout(&layout));
    }

    for piece in &layout.unplaceable {
        println!("Unplaceable: {}", piece);
    }

    let trim = layout
        .metrics
        .map(|m| format!(", {:.1}% waste", m.trim_loss_percent()))
        .unwrap_or_default();
    println!(
        "Summary: {} sheet{} used, {} piece{} placed{}",
        layout.sheet_count(),
        if layout.sheet_count() == 1 { "" } else { "s" },
        layout.placements.len(),
        if layout.placements.len() == 1 { "" } else { "s" },
        trim,
    );
}
