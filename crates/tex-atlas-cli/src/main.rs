use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use serde::Deserialize;
use tex_atlas_core::{
    AtlasLayout, FreeRectChoiceHeuristic, PackSettings, PackStats, PixelFormat, TextureAssembly,
    pack_images_raster, pack_layout,
};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "tex-atlas",
    about = "Pack images into texture atlas pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into atlas pages (PNG + metadata)
    Pack(PackArgs),
    /// Layout-only export (no PNGs): reads image sizes and writes metadata
    Layout(PackArgs),
    /// Simple timing bench (packs once, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (values override command-line options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Max page width
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_width: u32,
    /// Max page height
    #[arg(long, default_value_t = 1024, help_heading = "Layout")]
    max_height: u32,
    /// Min page width
    #[arg(long, default_value_t = 16, help_heading = "Layout")]
    min_width: u32,
    /// Min page height
    #[arg(long, default_value_t = 16, help_heading = "Layout")]
    min_height: u32,
    /// Page sizes are powers of two
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Layout")]
    pow2: bool,
    /// Force square pages
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    square: bool,

    // Image Processing
    /// Allow rotation (90deg)
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    allow_rotation: bool,
    /// Horizontal padding between images
    #[arg(long, default_value_t = 2, help_heading = "Image Processing")]
    padding_x: u32,
    /// Vertical padding between images
    #[arg(long, default_value_t = 2, help_heading = "Image Processing")]
    padding_y: u32,
    /// Pad along page edges too
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Image Processing")]
    edge_padding: bool,
    /// Fill padding with duplicated edge pixels
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    duplicate_padding: bool,

    // Algorithms
    /// Heuristics tried per page size (comma separated): bssf,blsf,baf,bl,cp
    #[arg(long, value_delimiter = ',', help_heading = "Algorithms")]
    heuristics: Vec<String>,
    /// Fast mode: sorted single-pass greedy packing
    #[arg(long, default_value_t = false, help_heading = "Algorithms")]
    fast: bool,

    // Output
    /// Output pixel format: rgba8 | rgb8 | luma_alpha8 | luma8
    #[arg(long, default_value = "rgba8", help_heading = "Output")]
    format: String,
    /// Write every page as a layer of one array texture
    #[arg(long, default_value_t = false, help_heading = "Output")]
    arrayed: bool,

    // Export
    /// Metadata format: json-array | json (alias) | json-hash
    #[arg(long, default_value = "json-array", help_heading = "Export")]
    metadata: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory
    input: PathBuf,
    /// Max page width/height
    #[arg(long, default_value_t = 1024)]
    max_size: u32,
    /// Allow rotation (90deg)
    #[arg(long, default_value_t = false)]
    allow_rotation: bool,
    /// Fast mode
    #[arg(long, default_value_t = false)]
    fast: bool,
    /// Number of packing runs to average
    #[arg(long, default_value_t = 1)]
    runs: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => run_layout(args),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let Some(cfg) = resolve_settings(cli)? else {
        return Ok(());
    };

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let assembly = load_images_with_progress(&cli.input, &paths, show_progress)?;
    info!(count = assembly.len(), "loaded input images");

    let atlas = pack_images_raster(&assembly, cfg.clone())?;
    let layout = atlas.layout();

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        if cfg.arrayed {
            if let Some(texture) = atlas.texture(0) {
                for (layer, img) in texture.layers.iter().enumerate() {
                    let png_path = cli.out_dir.join(format!("{}_layer{}.png", cli.name, layer));
                    img.save(&png_path)
                        .with_context(|| format!("write {}", png_path.display()))?;
                    info!(?png_path, layer, "wrote layer");
                }
            }
        } else {
            let names = page_file_names(&cli.name, layout);
            for (texture, file) in atlas.textures().iter().zip(&names) {
                let png_path = cli.out_dir.join(file);
                if let Some(img) = texture.image() {
                    img.save(&png_path)
                        .with_context(|| format!("write {}", png_path.display()))?;
                    info!(?png_path, "wrote page");
                }
            }
        }
    }

    let stats = atlas.stats();
    log_stats(&stats);
    write_metadata(cli, layout)?;
    export_stats(cli, &stats)
}

fn run_layout(cli: &PackArgs) -> anyhow::Result<()> {
    let Some(cfg) = resolve_settings(cli)? else {
        return Ok(());
    };

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let mut items: Vec<(String, u32, u32)> = Vec::with_capacity(paths.len());
    for p in &paths {
        match image::image_dimensions(p) {
            Ok((w, h)) => items.push((frame_name(&cli.input, p), w, h)),
            Err(e) => error!(?p, error = %e, "skip image"),
        }
    }
    info!(count = items.len(), "read input dimensions");

    let layout = pack_layout(items, cfg)?;
    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }
    let stats = layout.stats();
    log_stats(&stats);
    write_metadata(cli, &layout)?;
    export_stats(cli, &stats)
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let paths = gather_paths(&b.input, &[], &[])?;
    let mut items: Vec<(String, u32, u32)> = Vec::with_capacity(paths.len());
    for p in &paths {
        let (w, h) = image::image_dimensions(p)
            .with_context(|| format!("read dimensions of {}", p.display()))?;
        items.push((frame_name(&b.input, p), w, h));
    }
    let cfg = PackSettings::builder()
        .with_max_dimensions(b.max_size, b.max_size)
        .allow_rotation(b.allow_rotation)
        .fast(b.fast)
        .build();

    let runs = b.runs.max(1);
    let start = Instant::now();
    let layout = pack_layout(items.clone(), cfg.clone())?;
    for _ in 1..runs {
        pack_layout(items.clone(), cfg.clone())?;
    }
    let total = start.elapsed();
    let stats = layout.stats();
    println!(
        "inputs={} pages={} occupancy={:.2}% time={}",
        items.len(),
        stats.num_pages,
        stats.occupancy * 100.0,
        bench_fmt_dur(total / runs)
    );
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

/// Merges CLI flags and the optional YAML file. Returns `None` when the
/// configuration was only printed.
fn resolve_settings(cli: &PackArgs) -> anyhow::Result<Option<PackSettings>> {
    let mut cfg = PackSettings {
        padding_x: cli.padding_x,
        padding_y: cli.padding_y,
        edge_padding: cli.edge_padding,
        duplicate_padding: cli.duplicate_padding,
        allow_rotation: cli.allow_rotation,
        min_width: cli.min_width,
        min_height: cli.min_height,
        max_width: cli.max_width,
        max_height: cli.max_height,
        square: cli.square,
        power_of_two: cli.pow2,
        format: parse_format(&cli.format)?,
        fast: cli.fast,
        arrayed: cli.arrayed,
        heuristics: parse_heuristics(&cli.heuristics)?,
    };

    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_pack_settings(cfg)?;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(None);
    }

    cfg.validate()?;
    Ok(Some(cfg))
}

fn parse_format(s: &str) -> anyhow::Result<PixelFormat> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown pixel format: {}", s))
}

fn parse_heuristics(list: &[String]) -> anyhow::Result<Vec<FreeRectChoiceHeuristic>> {
    if list.is_empty() {
        return Ok(FreeRectChoiceHeuristic::ALL.to_vec());
    }
    list.iter()
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown heuristic: {}", s))
        })
        .collect()
}

fn page_file_names(name: &str, layout: &AtlasLayout) -> Vec<String> {
    if layout.pages.len() == 1 {
        vec![format!("{}.png", name)]
    } else {
        layout
            .pages
            .iter()
            .map(|p| format!("{}_{}.png", name, p.index))
            .collect()
    }
}

fn write_metadata(cli: &PackArgs, layout: &AtlasLayout) -> anyhow::Result<()> {
    let json_value = match cli.metadata.as_str() {
        // "json" is an alias of "json-array"
        "json-array" | "json" => tex_atlas_core::to_json_array(layout),
        "json-hash" => tex_atlas_core::to_json_hash(layout),
        other => anyhow::bail!("unknown metadata format: {}", other),
    };
    if cli.dry_run {
        return Ok(());
    }
    let json_path = cli.out_dir.join(format!("{}.json", cli.name));
    let json = serde_json::to_string_pretty(&json_value)?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, pages = layout.pages.len(), "atlas written");
    Ok(())
}

fn log_stats(stats: &PackStats) {
    info!(
        pages = stats.num_pages,
        frames = stats.num_frames,
        used_area = stats.used_frame_area,
        total_area = stats.total_page_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );
}

fn export_stats(cli: &PackArgs, stats: &PackStats) -> anyhow::Result<()> {
    let Some(stats_path) = &cli.export_stats else {
        return Ok(());
    };
    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }
    fs::write(stats_path, serde_json::to_string_pretty(stats)?)
        .with_context(|| format!("write {}", stats_path.display()))?;
    info!(?stats_path, "stats exported");
    Ok(())
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    if list.is_empty() {
        warn!(input = %path.display(), "no input images found");
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob {}", pat))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

/// Frame name: path relative to the input root, forward slashes, no extension.
fn frame_name(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).unwrap_or(p);
    let rel = if rel.as_os_str().is_empty() {
        Path::new(p.file_name().unwrap_or_default())
    } else {
        rel
    };
    rel.with_extension("").to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<TextureAssembly<DynamicImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut assembly = TextureAssembly::new();
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => assembly
                .insert(frame_name(root, p), img)
                .with_context(|| format!("add {}", p.display()))?,
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(assembly)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
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
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    padding_x: Option<u32>,
    padding_y: Option<u32>,
    edge_padding: Option<bool>,
    duplicate_padding: Option<bool>,
    allow_rotation: Option<bool>,
    min_width: Option<u32>,
    min_height: Option<u32>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    square: Option<bool>,
    power_of_two: Option<bool>,
    format: Option<String>,
    fast: Option<bool>,
    arrayed: Option<bool>,
    heuristics: Option<Vec<String>>,
}

impl YamlConfig {
    fn into_pack_settings(self, mut cfg: PackSettings) -> anyhow::Result<PackSettings> {
        if let Some(v) = self.padding_x {
            cfg.padding_x = v;
        }
        if let Some(v) = self.padding_y {
            cfg.padding_y = v;
        }
        if let Some(v) = self.edge_padding {
            cfg.edge_padding = v;
        }
        if let Some(v) = self.duplicate_padding {
            cfg.duplicate_padding = v;
        }
        if let Some(v) = self.allow_rotation {
            cfg.allow_rotation = v;
        }
        if let Some(v) = self.min_width {
            cfg.min_width = v;
        }
        if let Some(v) = self.min_height {
            cfg.min_height = v;
        }
        if let Some(v) = self.max_width {
            cfg.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.max_height = v;
        }
        if let Some(v) = self.square {
            cfg.square = v;
        }
        if let Some(v) = self.power_of_two {
            cfg.power_of_two = v;
        }
        if let Some(v) = self.format {
            cfg.format = parse_format(&v)?;
        }
        if let Some(v) = self.fast {
            cfg.fast = v;
        }
        if let Some(v) = self.arrayed {
            cfg.arrayed = v;
        }
        if let Some(v) = self.heuristics {
            cfg.heuristics = parse_heuristics(&v)?;
        }
        Ok(cfg)
    }
}
