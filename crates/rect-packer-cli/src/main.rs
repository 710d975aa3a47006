use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use rect_packer_core::config::{
    AlgorithmFamily, BinSelection, GuillotineChoice, GuillotineSplit, MaxRectsHeuristic,
    PackingMode, SkylineHeuristic, SortOrder,
};
use rect_packer_core::{BinCount, BinOptions, Enclose, PackerConfig, Packer, RectId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "rect-packer",
    about = "Pack rectangles into bins",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a job file and print the placements as JSON
    Pack(PackArgs),
    /// Find the smallest single container holding every rectangle of a job
    Enclose(EncloseArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Job file (.json, .yaml or .yml)
    #[arg(help_heading = "Input/Output")]
    job: PathBuf,
    /// Write the report here instead of stdout
    #[arg(short, long, help_heading = "Input/Output")]
    output: Option<PathBuf>,
    /// Print the merged configuration (job file + flags) and exit
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    print_config: bool,

    /// Algorithm: maxrects | guillotine | skyline
    #[arg(long, help_heading = "Algorithms")]
    algo: Option<String>,
    /// Heuristic of the chosen algorithm (maxrects: baf|bssf|blsf|bl|cp; guillotine: baf|bssf|blsf; skyline: bl|mwf|mwfl)
    #[arg(long, help_heading = "Algorithms")]
    heuristic: Option<String>,
    /// Guillotine split: slas|llas|minas|maxas|sas|las
    #[arg(long, help_heading = "Algorithms")]
    split: Option<String>,
    /// Disable Guillotine section merging
    #[arg(long, default_value_t = false, help_heading = "Algorithms")]
    no_merge: bool,
    /// Recover the pockets left under the skyline
    #[arg(long, default_value_t = false, help_heading = "Algorithms")]
    waste: bool,

    /// Bin selection: nf | ff | bf | global
    #[arg(long, help_heading = "Packer")]
    bin_selection: Option<String>,
    /// Mode: online | offline
    #[arg(long, help_heading = "Packer")]
    mode: Option<String>,
    /// Sort order: none|area|peri|diff|sside|lside|ratio
    #[arg(long, help_heading = "Packer")]
    sort: Option<String>,
    /// Disallow 90 degree rotation
    #[arg(long, default_value_t = false, help_heading = "Packer")]
    no_rotation: bool,
}

#[derive(Parser, Debug, Clone)]
struct EncloseArgs {
    /// Job file (.json, .yaml or .yml); only `rects` is used
    job: PathBuf,
    /// Upper bound for the container width
    #[arg(long)]
    max_width: Option<i64>,
    /// Upper bound for the container height
    #[arg(long)]
    max_height: Option<i64>,
    /// Disallow 90 degree rotation
    #[arg(long, default_value_t = false)]
    no_rotation: bool,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Input of both subcommands.
#[derive(Debug, Deserialize, Default)]
struct Job {
    #[serde(default)]
    config: PackerConfig,
    #[serde(default)]
    bins: Vec<JobBin>,
    #[serde(default)]
    rects: Vec<JobRect>,
    #[serde(default)]
    presets: Vec<JobPreset>,
}

#[derive(Debug, Deserialize)]
struct JobBin {
    width: i64,
    height: i64,
    /// Omitted means an unbounded supply.
    count: Option<usize>,
    bid: Option<usize>,
    merge: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct JobRect {
    width: i64,
    height: i64,
    rid: Option<RectId>,
}

#[derive(Debug, Deserialize)]
struct JobPreset {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    rid: Option<RectId>,
}

#[derive(Serialize)]
struct EncloseReport {
    width: i64,
    height: i64,
    area: i64,
    placements: rect_packer_core::PackReport<i64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Enclose(args) => run_enclose(args),
    }
}

fn run_pack(args: &PackArgs) -> anyhow::Result<()> {
    let job = load_job(&args.job)?;
    let cfg = apply_overrides(job.config.clone(), args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let start = Instant::now();
    let mut packer = Packer::<i64>::new(cfg.clone()).context("invalid packer configuration")?;
    for b in &job.bins {
        let count = b.count.map_or(BinCount::Unbounded, BinCount::Limited);
        let options = BinOptions {
            bid: b.bid,
            merge: b.merge,
        };
        packer
            .add_bin_with(b.width, b.height, count, options)
            .with_context(|| format!("bin {}x{}", b.width, b.height))?;
    }
    for p in &job.presets {
        let placed = packer
            .add_preset_rect(p.x, p.y, p.width, p.height, p.rid)
            .with_context(|| format!("preset {}x{} at ({}, {})", p.width, p.height, p.x, p.y))?;
        if cfg.mode == PackingMode::Online && !placed {
            warn!(rid = ?p.rid, "preset rectangle has no free region");
        }
    }
    for r in &job.rects {
        let placed = packer
            .add_rect(r.width, r.height, r.rid)
            .with_context(|| format!("rect {}x{}", r.width, r.height))?;
        if cfg.mode == PackingMode::Online && placed.is_none() {
            warn!(rid = ?r.rid, width = r.width, height = r.height, "rectangle not placed");
        }
    }
    if cfg.mode == PackingMode::Offline {
        packer.pack()?;
    }
    packer.validate_packing()?;

    let stats = packer.stats();
    info!(
        bins = stats.num_bins,
        placed = stats.num_rects,
        requested = job.rects.len() + job.presets.len(),
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "packed"
    );
    write_output(args.output.as_deref(), &packer.to_json()?)
}

fn run_enclose(args: &EncloseArgs) -> anyhow::Result<()> {
    let job = load_job(&args.job)?;
    let mut en = Enclose::<i64>::new(!args.no_rotation);
    if let Some(w) = args.max_width {
        en = en.max_width(w);
    }
    if let Some(h) = args.max_height {
        en = en.max_height(h);
    }
    for r in &job.rects {
        if r.width <= 0 || r.height <= 0 {
            anyhow::bail!("invalid rectangle {}x{}", r.width, r.height);
        }
        en.add_rect(r.width, r.height);
    }

    let Some(found) = en.generate() else {
        anyhow::bail!("no container within the limits holds all {} rectangles", en.len());
    };
    info!(width = found.width, height = found.height, "container found");
    let report = EncloseReport {
        width: found.width,
        height: found.height,
        area: found.area(),
        placements: found.packer.report(),
    };
    write_output(args.output.as_deref(), &serde_json::to_string_pretty(&report)?)
}

fn load_job(path: &Path) -> anyhow::Result<Job> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read job {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase());
    let job: Job = match ext.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("parse YAML job {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("parse JSON job {}", path.display()))?,
    };
    info!(
        bins = job.bins.len(),
        rects = job.rects.len(),
        presets = job.presets.len(),
        "loaded job"
    );
    Ok(job)
}

fn write_output(path: Option<&Path>, body: &str) -> anyhow::Result<()> {
    match path {
        Some(p) => {
            fs::write(p, body).with_context(|| format!("write {}", p.display()))?;
            info!(path = ?p, "report written");
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn parse_flag<T: FromStr>(what: &str, value: &str) -> anyhow::Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown {}: {}", what, value))
}

fn apply_overrides(mut cfg: PackerConfig, args: &PackArgs) -> anyhow::Result<PackerConfig> {
    if let Some(v) = &args.algo {
        cfg.family = parse_flag::<AlgorithmFamily>("algorithm", v)?;
    }
    if let Some(v) = &args.heuristic {
        match cfg.family {
            AlgorithmFamily::MaxRects => {
                cfg.mr_heuristic = parse_flag::<MaxRectsHeuristic>("maxrects heuristic", v)?
            }
            AlgorithmFamily::Guillotine => {
                cfg.g_choice = parse_flag::<GuillotineChoice>("guillotine choice", v)?
            }
            AlgorithmFamily::Skyline => {
                cfg.skyline_heuristic = parse_flag::<SkylineHeuristic>("skyline heuristic", v)?
            }
        }
    }
    if let Some(v) = &args.split {
        cfg.g_split = parse_flag::<GuillotineSplit>("guillotine split", v)?;
    }
    if args.no_merge {
        cfg.g_merge = false;
    }
    if args.waste {
        cfg.use_waste_map = true;
    }
    if let Some(v) = &args.bin_selection {
        cfg.bin_selection = parse_flag::<BinSelection>("bin selection", v)?;
    }
    if let Some(v) = &args.mode {
        cfg.mode = parse_flag::<PackingMode>("mode", v)?;
    }
    if let Some(v) = &args.sort {
        cfg.sort_order = parse_flag::<SortOrder>("sort order", v)?;
    }
    if args.no_rotation {
        cfg.allow_rotation = false;
    }
    Ok(cfg)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
