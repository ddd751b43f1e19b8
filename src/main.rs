use clap::{Parser, Subcommand};
use track_snap::auto_layout::generate_auto_layout;
use track_snap::geometry::connection_indicators;
use track_snap::layout;
use track_snap::report::validate_layout;
use track_snap::snap::{DEFAULT_SNAP_DISTANCE, find_snap_position};
use track_snap::types::{Piece, PieceKind};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "track_snap",
    about = "Snap, validate and generate toy-train track layouts"
)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Output format: text or json
    #[arg(long, global = true, default_value = "text", value_parser = parse_format)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every join in a layout file
    Validate {
        /// Layout JSON file
        file: String,
    },
    /// Find where a piece would snap onto a layout
    Snap {
        /// Layout JSON file with the pieces already placed
        #[arg(long)]
        layout: String,

        /// Piece type: straight, curve, switch-left or switch-right
        #[arg(long = "type")]
        kind: String,

        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Rotation in radians
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotation: f64,

        /// Mirror the piece
        #[arg(long)]
        flipped: bool,

        /// Search radius in grid units
        #[arg(long, default_value_t = DEFAULT_SNAP_DISTANCE)]
        snap_distance: f64,
    },
    /// Generate a starting layout from a piece inventory
    Generate {
        #[arg(long, default_value_t = 0)]
        straights: usize,

        #[arg(long, default_value_t = 0)]
        curves: usize,
    },
    /// List every connection point in a layout file
    Points {
        /// Layout JSON file
        file: String,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("invalid format '{}', expected: text or json", s)),
    }
}

fn parse_piece(kind: &str, x: f64, y: f64, rotation: f64, flipped: bool) -> Result<Piece, String> {
    let kind = PieceKind::parse(kind, flipped).ok_or_else(|| {
        format!(
            "invalid piece type '{}', expected: straight, curve, switch-left, or switch-right",
            kind
        )
    })?;
    if !(x.is_finite() && y.is_finite() && rotation.is_finite()) {
        return Err("position and rotation must be finite".to_string());
    }
    Ok(Piece::new(kind, x, y, rotation))
}

fn load_or_exit(path: &str) -> Vec<Piece> {
    layout::load(path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match cli.command {
        Command::Validate { file } => {
            let pieces = load_or_exit(&file);
            let report = validate_layout(&pieces);
            if cli.format == OutputFormat::Json {
                print_json(&report);
            } else if report.is_valid {
                println!("Layout OK ({} pieces)", pieces.len());
            } else {
                for error in &report.errors {
                    println!("{}", error);
                }
            }
            if !report.is_valid {
                std::process::exit(1);
            }
        }
        Command::Snap {
            layout,
            kind,
            x,
            y,
            rotation,
            flipped,
            snap_distance,
        } => {
            let moving = parse_piece(&kind, x, y, rotation, flipped).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            let existing = load_or_exit(&layout);
            let snap = find_snap_position(&moving, &existing, snap_distance);
            match (cli.format, snap) {
                (OutputFormat::Json, snap) => print_json(&snap),
                (OutputFormat::Text, Some(snap)) => println!("Snap: {}", snap.apply(&moving)),
                (OutputFormat::Text, None) => println!("No snap"),
            }
        }
        Command::Generate { straights, curves } => {
            let pieces = generate_auto_layout(straights, curves);
            match layout::to_json(&pieces) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Points { file } => {
            let pieces = load_or_exit(&file);
            let points = connection_indicators(&pieces);
            if cli.format == OutputFormat::Json {
                print_json(&points);
            } else {
                for p in &points {
                    println!("{:.3} {:.3} {:.4} {}", p.x, p.y, p.angle, p.polarity);
                }
            }
        }
    }
}
