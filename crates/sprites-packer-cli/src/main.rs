use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Deserialize;
use sprites_packer_core::pipeline::{atlas_name_for, pack_and_export};
use sprites_packer_core::source::{collect_sprite_paths, ensure_unique_names, load_source};
use sprites_packer_core::{Exporter, PackerConfig, SourceImage, SpritePackerError, TextureFormat};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "sprites-packer",
    about = "Pack a folder of sprites into texture atlases",
    version,
    author
)]
struct Cli {
    // Input/Output
    /// Directory containing the sprite PNGs
    #[arg(short, long, help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(
        short,
        long,
        default_value = "./sprites-packer-output",
        help_heading = "Input/Output"
    )]
    output: PathBuf,
    /// YAML config file path (overrides the packing options below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Print the effective configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    print_config: bool,
    /// Format for --print-config: json|yaml
    #[arg(long, value_parser = ["json", "yaml"], default_value = "json", help_heading = "Input/Output")]
    print_config_format: String,

    // Layout
    /// Max atlas width (128..=4096; larger values are clamped)
    #[arg(short = 'w', long, default_value_t = 1024, help_heading = "Layout")]
    max_width: u32,
    /// Max atlas height (128..=4096; larger values are clamped)
    #[arg(short = 'H', long, default_value_t = 1024, help_heading = "Layout")]
    max_height: u32,
    /// Padding to the right of and below each sprite (negative values mean 0)
    #[arg(
        short,
        long,
        default_value_t = 4,
        allow_negative_numbers = true,
        help_heading = "Layout"
    )]
    padding: i64,

    // Image Processing
    /// Trim transparent borders
    #[arg(short, long, default_value_t = true, action = ArgAction::Set, help_heading = "Image Processing")]
    trim: bool,
    /// Trim alpha threshold (0..=255)
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    trim_threshold: u8,

    // Export
    /// Texture format: png|webp|basis
    #[arg(short, long, default_value = "png", help_heading = "Export")]
    format: String,
    /// basisu quality (1..=255)
    #[arg(long, default_value_t = 255, help_heading = "Basis")]
    basis_quality: u8,
    /// basisu compression level (0..=6)
    #[arg(long, default_value_t = 1, help_heading = "Basis")]
    basis_level: u8,
    /// Treat the texture as linear data (no sRGB)
    #[arg(long, default_value_t = false, help_heading = "Basis")]
    basis_linear: bool,
    /// Seconds to wait for basisu before giving up
    #[arg(long, default_value_t = 300, help_heading = "Basis")]
    basis_timeout: u64,
    /// Directory holding `<os>/<arch>/basisu` (default: SPRITES_PACKER_TOOLS_DIR or `bin/` next to the executable)
    #[arg(long, help_heading = "Basis")]
    tools_dir: Option<PathBuf>,

    // Logging/UX
    /// Show a progress bar while loading (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run_pack(&cli, cli.progress && !cli.quiet)
}

fn run_pack(cli: &Cli, show_progress: bool) -> anyhow::Result<()> {
    // unsupported formats are rejected before the input directory is touched
    let format: TextureFormat = cli.format.parse()?;
    let mut cfg = config_from_args(cli, format);
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_packer_config(cfg)?;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    cfg.validate()?;
    let cfg = cfg.clamped();
    if !cli.input.is_dir() {
        return Err(SpritePackerError::InputDirNotFound(cli.input.clone()).into());
    }
    let exporter = Exporter::new(&cli.output, atlas_name_for(&cli.input), &cfg)?;

    let paths = collect_sprite_paths(&cli.input)?;
    if paths.is_empty() {
        return Err(SpritePackerError::NoImages(cli.input.clone()).into());
    }
    let sources = load_sources_with_progress(&paths, show_progress)?;
    ensure_unique_names(&sources)?;
    info!(count = sources.len(), "loaded input images");

    let started = Instant::now();
    let written = pack_and_export(sources, &exporter, &cfg)
        .with_context(|| format!("pack into {}", cli.output.display()))?;
    let total_area: u64 = written
        .iter()
        .map(|a| (a.width as u64) * (a.height as u64))
        .sum();
    info!(
        atlases = written.len(),
        total_area,
        elapsed = %fmt_dur(started.elapsed()),
        out = %cli.output.display(),
        "done"
    );
    Ok(())
}

fn config_from_args(cli: &Cli, format: TextureFormat) -> PackerConfig {
    let mut cfg = PackerConfig::builder()
        .with_max_dimensions(cli.max_width, cli.max_height)
        .padding(clamp_padding(cli.padding))
        .trim(cli.trim)
        .trim_threshold(cli.trim_threshold)
        .texture_format(format)
        .build();
    cfg.basis.quality = cli.basis_quality;
    cfg.basis.compression_level = cli.basis_level;
    cfg.basis.linear = cli.basis_linear;
    cfg.basis.timeout_secs = cli.basis_timeout;
    cfg.basis.tools_dir = cli.tools_dir.clone();
    cfg
}

fn clamp_padding(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

fn load_sources_with_progress(
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<SourceImage>> {
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
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        let src = load_source(p).with_context(|| format!("load {}", display(p)))?;
        debug!(name = %src.name, w = src.original_width, h = src.original_height, "loaded");
        list.push(src);
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn display(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{ms:.1} ms")
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
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

/// Fields of a `--config` YAML file; any field present overrides the command line.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    max_width: Option<u32>,
    max_height: Option<u32>,
    padding: Option<i64>,
    trim: Option<bool>,
    trim_threshold: Option<u8>,
    texture_format: Option<String>,
    basis_quality: Option<u8>,
    basis_level: Option<u8>,
    basis_linear: Option<bool>,
    basis_timeout: Option<u64>,
    tools_dir: Option<PathBuf>,
}

impl YamlConfig {
    fn into_packer_config(self, mut cfg: PackerConfig) -> anyhow::Result<PackerConfig> {
        if let Some(v) = self.max_width {
            cfg.max_width = v;
        }
        if let Some(v) = self.max_height {
            cfg.max_height = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = clamp_padding(v);
        }
        if let Some(v) = self.trim {
            cfg.trim = v;
        }
        if let Some(v) = self.trim_threshold {
            cfg.trim_threshold = v;
        }
        if let Some(v) = self.texture_format {
            cfg.texture_format = v.parse()?;
        }
        if let Some(v) = self.basis_quality {
            cfg.basis.quality = v;
        }
        if let Some(v) = self.basis_level {
            cfg.basis.compression_level = v;
        }
        if let Some(v) = self.basis_linear {
            cfg.basis.linear = v;
        }
        if let Some(v) = self.basis_timeout {
            cfg.basis.timeout_secs = v;
        }
        if let Some(v) = self.tools_dir {
            cfg.basis.tools_dir = Some(v);
        }
        Ok(cfg)
    }
}
