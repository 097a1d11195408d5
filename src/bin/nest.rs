use std::path::PathBuf;

use clap::Parser;

use nestkit::geometry::GeoProvider;
use nestkit::item::Item;
use nestkit::nester::{apply_distance_margin, nest, SelectionStrategy};
use nestkit::placer::{Alignment, PlacerConfig};
use nestkit::selector::SelectorConfig;
use nestkit::units::mm;
use nestkit::{dxf_parser, svg_parser, svg_writer, Bin};

/// Command line arguments for nestkit
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// SVG or DXF input files to be nested (each file's shapes become items)
    #[arg(long, value_name = "FILES", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Bin width, in millimetres
    #[arg(long, default_value_t = 1000.0)]
    pub bin_width: f64,

    /// Bin height, in millimetres
    #[arg(long, default_value_t = 1000.0)]
    pub bin_height: f64,

    /// Minimum space between parts, in millimetres
    #[arg(long, default_value_t = 0.0)]
    pub spacing: f64,

    /// Number of evenly spaced rotations to try for each part
    #[arg(long, default_value_t = 4)]
    pub rotations: usize,

    /// Selection heuristic: "first-fit" or "djd"
    #[arg(long, default_value = "djd")]
    pub strategy: String,

    /// Place parts inside the holes of other parts
    #[arg(long, default_value_t = false)]
    pub use_holes: bool,

    /// Output SVG path prefix; bin `N` is written to `<prefix>-N.svg`
    #[arg(long, default_value = "nested")]
    pub output: String,
}

/// Parsed configuration returned by the CLI
#[derive(Debug)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub bin_width: f64,
    pub bin_height: f64,
    pub spacing: f64,
    pub rotations: usize,
    pub strategy: SelectionStrategy,
    pub use_holes: bool,
    pub output: String,
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        let strategy = match args.strategy.as_str() {
            "first-fit" | "firstfit" => SelectionStrategy::FirstFit,
            _ => SelectionStrategy::Djd,
        };
        Self {
            inputs: args.inputs,
            bin_width: args.bin_width,
            bin_height: args.bin_height,
            spacing: args.spacing,
            rotations: args.rotations,
            strategy,
            use_holes: args.use_holes,
            output: args.output,
        }
    }
}

pub fn parse_config() -> Config {
    CliArgs::parse().into()
}

fn rotation_set(count: usize) -> Vec<f64> {
    if count == 0 {
        return vec![0.0];
    }
    (0..count).map(|i| i as f64 * std::f64::consts::TAU / count as f64).collect()
}

fn load_polygons(path: &PathBuf) -> anyhow::Result<Vec<nestkit::geometry::Polygon>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("dxf") {
        dxf_parser::polygons_from_file(path)
    } else {
        svg_parser::polygons_from_file(path)
    }
}

fn main() {
    env_logger::init();
    let cfg = parse_config();
    let geo = GeoProvider;

    let mut items = Vec::new();
    let mut id = 0usize;
    for path in &cfg.inputs {
        match load_polygons(path) {
            Ok(polys) => {
                for poly in polys {
                    items.push(Item::new(id, poly, &geo));
                    id += 1;
                }
            }
            Err(e) => {
                eprintln!("failed to parse {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }

    if items.is_empty() {
        eprintln!("no polygons found in input");
        std::process::exit(1);
    }

    let mut items = items;
    if let Err(e) = apply_distance_margin(&mut items, mm(cfg.spacing) as f64, &geo) {
        eprintln!("failed to apply spacing margin: {e}");
        std::process::exit(1);
    }

    let bin = Bin::rectangle(mm(cfg.bin_width), mm(cfg.bin_height));
    let placer_config = PlacerConfig {
        rotations: rotation_set(cfg.rotations),
        explore_holes: cfg.use_holes,
        alignment: Alignment::BottomLeft,
        ..Default::default()
    };

    let group = nest(
        items,
        bin,
        cfg.strategy,
        placer_config,
        SelectorConfig::default(),
        &geo,
        None,
        None,
    );

    for (i, svg) in svg_writer::render(&group, &geo).iter().enumerate() {
        let path = format!("{}-{}.svg", cfg.output, i);
        if let Err(e) = std::fs::write(&path, svg) {
            eprintln!("failed to write {path}: {e}");
            std::process::exit(1);
        }
    }

    println!("nested {} bin(s), written to {}-N.svg", group.len(), cfg.output);
}
