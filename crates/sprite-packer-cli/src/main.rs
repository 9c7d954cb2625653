use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use serde::Deserialize;
use sprite_packer_cli::{FsAssetStore, load_registry, save_registry};
use sprite_packer_core::prelude::*;
use sprite_packer_core::references::{ReplaceMode, replacement_pairs};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "sprite-packer",
    about = "Build and maintain a sprite atlas from folders of images",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory asset paths are relative to
    #[arg(long, default_value = ".", global = true, help_heading = "Input/Output")]
    root: PathBuf,
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
    /// Create a registry file (and an empty atlas image if there is none yet)
    Init(InitArgs),
    /// Change the atlas configuration of a registry
    Configure(ConfigureArgs),
    /// Watch a folder: every image below it becomes part of the atlas
    AddFolder(FolderArgs),
    /// Stop watching a folder
    RemoveFolder(FolderArgs),
    /// Add a single image or sub-image by hand
    Add(EntryArgs),
    /// Remove every entry backed by an image or sub-image
    Remove(EntryArgs),
    /// Sync entries with the watched folders without packing
    Reconcile(ReconcileArgs),
    /// Rebuild the atlas image and its sprite sheet
    Rebuild(ReconcileArgs),
    /// Print a registry
    Show(ShowArgs),
    /// Print the reference replacement map of a built registry
    Replacements(ReplacementsArgs),
}

#[derive(Parser, Debug, Clone)]
struct InitArgs {
    /// Registry file to create
    #[arg(help_heading = "Input/Output")]
    registry: PathBuf,
    /// Atlas image path (relative to --root)
    #[arg(long, default_value = "atlas.png", help_heading = "Input/Output")]
    atlas: PathBuf,
    /// Overwrite an existing registry file
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    force: bool,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug, Clone)]
struct ConfigureArgs {
    #[arg(help_heading = "Input/Output")]
    registry: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug, Clone)]
struct ConfigArgs {
    /// YAML config file; command line options override it
    #[arg(long, help_heading = "Config")]
    config: Option<PathBuf>,
    /// Pixels between packed sprites
    #[arg(long, help_heading = "Layout")]
    padding: Option<u32>,
    /// Maximum atlas width and height
    #[arg(long, help_heading = "Layout")]
    max_size: Option<u32>,
    /// Packing strategy: maxrects | native
    #[arg(long, help_heading = "Algorithms")]
    strategy: Option<String>,
    /// MaxRects heuristic: baf | bssf | bl
    #[arg(long, help_heading = "Algorithms")]
    heuristic: Option<String>,
    /// Alignment of newly packed sprites (center, top_left, ..., custom)
    #[arg(long, help_heading = "Sprites")]
    alignment: Option<String>,
    /// Pivot X used with --alignment custom
    #[arg(long, help_heading = "Sprites")]
    pivot_x: Option<f32>,
    /// Pivot Y used with --alignment custom
    #[arg(long, help_heading = "Sprites")]
    pivot_y: Option<f32>,
    /// Make sources unreadable again after packing
    #[arg(long, help_heading = "Sources")]
    disable_read_write_after_pack: Option<bool>,
    /// Allow several manual entries for the same source
    #[arg(long, help_heading = "Sources")]
    allow_duplicate_sources: Option<bool>,
    /// Print the resulting configuration
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
}

#[derive(Parser, Debug, Clone)]
struct FolderArgs {
    registry: PathBuf,
    /// Folder (relative to --root)
    folder: PathBuf,
}

#[derive(Parser, Debug, Clone)]
struct EntryArgs {
    registry: PathBuf,
    /// Image path (relative to --root); with --sub-image, the atlas holding the sub-image
    image: PathBuf,
    /// Name of a sub-image inside IMAGE
    #[arg(long)]
    sub_image: Option<String>,
}

#[derive(Parser, Debug, Clone)]
struct ReconcileArgs {
    registry: PathBuf,
    /// Exclude patterns (glob). Matching files in watched folders are ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
struct ShowArgs {
    registry: PathBuf,
    /// Output format: summary|json|yaml
    #[arg(long, default_value = "summary", value_parser = ["summary", "json", "yaml"])]
    format: String,
}

#[derive(Parser, Debug, Clone)]
struct ReplacementsArgs {
    registry: PathBuf,
    /// Direction: source_with_atlas | atlas_with_source
    #[arg(long, default_value = "source_with_atlas")]
    mode: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Init(args) => run_init(&cli.root, args),
        Commands::Configure(args) => {
            let mut reg = load_registry(&args.registry)?;
            let cfg = args.config.apply(reg.config().clone())?;
            reg.set_config(cfg).context("invalid configuration")?;
            print_config(&args.config, reg.config())?;
            save_registry(&args.registry, &reg)
        }
        Commands::AddFolder(args) => {
            let mut reg = load_registry(&args.registry)?;
            reg.add_folder(&args.folder)?;
            info!(folder = %args.folder.display(), "folder added");
            save_registry(&args.registry, &reg)
        }
        Commands::RemoveFolder(args) => {
            let mut reg = load_registry(&args.registry)?;
            if !reg.remove_folder(&args.folder) {
                anyhow::bail!("folder {} is not watched", args.folder.display());
            }
            info!(folder = %args.folder.display(), "folder removed");
            save_registry(&args.registry, &reg)
        }
        Commands::Add(args) => {
            let mut reg = load_registry(&args.registry)?;
            reg.add_entry(args.source())?;
            save_registry(&args.registry, &reg)
        }
        Commands::Remove(args) => {
            let mut reg = load_registry(&args.registry)?;
            let removed = reg.remove_source(&args.source());
            info!(removed, "entries removed");
            save_registry(&args.registry, &reg)
        }
        Commands::Reconcile(args) => {
            let mut reg = load_registry(&args.registry)?;
            let store = FsAssetStore::new(&cli.root).with_exclude(&args.exclude)?;
            let report = reconcile_folders(&mut reg, &store)?;
            for f in &report.removed_stale_folders {
                warn!(folder = %f.display(), "removed missing folder");
            }
            info!(entries = report.entries, "reconciled");
            save_registry(&args.registry, &reg)
        }
        Commands::Rebuild(args) => run_rebuild(&cli.root, args),
        Commands::Show(args) => run_show(args),
        Commands::Replacements(args) => {
            let reg = load_registry(&args.registry)?;
            let mode: ReplaceMode = args
                .mode
                .parse()
                .map_err(|_| anyhow!("unknown replace mode: {}", args.mode))?;
            let mut pairs: Vec<_> = replacement_pairs(&reg, mode)
                .into_iter()
                .map(|(from, to)| (describe(&from), describe(&to)))
                .collect();
            pairs.sort();
            for (from, to) in pairs {
                println!("{from} -> {to}");
            }
            Ok(())
        }
    }
}

fn run_init(root: &Path, args: &InitArgs) -> anyhow::Result<()> {
    if args.registry.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.registry.display()
        );
    }
    let cfg = args.config.apply(AtlasConfig::default())?;
    let reg = AtlasRegistry::with_config(&args.atlas, cfg).context("invalid configuration")?;
    print_config(&args.config, reg.config())?;

    let atlas = root.join(&args.atlas);
    if !atlas.exists() {
        if let Some(dir) = atlas.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        PixelBuffer::new(1, 1)
            .as_rgba()
            .save(&atlas)
            .with_context(|| format!("write {}", atlas.display()))?;
        info!(path = %atlas.display(), "created empty atlas");
    }
    save_registry(&args.registry, &reg)?;
    info!(registry = %args.registry.display(), "registry created");
    Ok(())
}

fn run_rebuild(root: &Path, args: &ReconcileArgs) -> anyhow::Result<()> {
    let mut reg = load_registry(&args.registry)?;
    let mut store = FsAssetStore::new(root).with_exclude(&args.exclude)?;
    let result = rebuild(&mut reg, &mut store);
    // entries reconciled before a failure are kept
    save_registry(&args.registry, &reg)?;
    match result {
        BuildResult::Success(report) => {
            for w in &report.warnings {
                warn!("{w}");
            }
            info!(
                sprites = report.sprites,
                width = report.atlas_width,
                height = report.atlas_height,
                occupancy = report.occupancy,
                "atlas written"
            );
            Ok(())
        }
        BuildResult::Aborted { stage, reason } => {
            Err(anyhow::Error::new(reason).context(format!("rebuild aborted while {stage}")))
        }
    }
}

fn run_show(args: &ShowArgs) -> anyhow::Result<()> {
    let reg = load_registry(&args.registry)?;
    match args.format.as_str() {
        "json" => println!("{}", reg.to_json()?),
        "yaml" => println!("{}", serde_yaml::to_string(&reg)?),
        _ => {
            let cfg = reg.config();
            println!("atlas: {}", reg.atlas().display());
            println!(
                "config: padding={} max_size={} strategy={:?} heuristic={:?}",
                cfg.padding, cfg.max_size, cfg.packing_strategy, cfg.max_rects_heuristic
            );
            println!("folders ({}):", reg.folders().len());
            for f in reg.folders() {
                println!("  {}", f.display());
            }
            println!("entries ({}):", reg.entries().len());
            for e in reg.entries() {
                let source = e.source.as_ref().map(describe).unwrap_or_else(|| "-".into());
                let target = e.target.as_ref().map(|t| t.name.as_str()).unwrap_or("-");
                println!("  {:?} {source} -> {target}", e.origin);
            }
        }
    }
    Ok(())
}

fn describe(source: &SourceRef) -> String {
    match source {
        SourceRef::Texture(p) => p.display().to_string(),
        SourceRef::SubImage(r) => format!("{}#{}", r.atlas.display(), r.name),
    }
}

fn print_config(args: &ConfigArgs, cfg: &AtlasConfig) -> anyhow::Result<()> {
    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(cfg)?),
        }
    }
    Ok(())
}

impl EntryArgs {
    fn source(&self) -> SourceRef {
        match &self.sub_image {
            Some(name) => SourceRef::SubImage(SubImageRef::new(&self.image, name)),
            None => SourceRef::Texture(self.image.clone()),
        }
    }
}

impl ConfigArgs {
    /// YAML file first, then command line options, on top of `cfg`.
    fn apply(&self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(path) = &self.config {
            let file = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            let y: YamlConfig = serde_yaml::from_str(&file)
                .with_context(|| format!("parse config {}", path.display()))?;
            cfg = y.into_atlas_config(cfg)?;
        }
        let overrides = YamlConfig {
            padding: self.padding,
            max_size: self.max_size,
            strategy: self.strategy.clone(),
            heuristic: self.heuristic.clone(),
            alignment: self.alignment.clone(),
            pivot_x: self.pivot_x,
            pivot_y: self.pivot_y,
            disable_read_write_after_pack: self.disable_read_write_after_pack,
            allow_duplicate_sources: self.allow_duplicate_sources,
        };
        overrides.into_atlas_config(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    padding: Option<u32>,
    max_size: Option<u32>,
    strategy: Option<String>,
    heuristic: Option<String>,
    alignment: Option<String>,
    pivot_x: Option<f32>,
    pivot_y: Option<f32>,
    disable_read_write_after_pack: Option<bool>,
    allow_duplicate_sources: Option<bool>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.max_size {
            cfg.max_size = v;
        }
        if let Some(v) = self.strategy {
            cfg.packing_strategy = v
                .parse()
                .map_err(|_| anyhow!("unknown packing strategy: {v}"))?;
        }
        if let Some(v) = self.heuristic {
            cfg.max_rects_heuristic = v
                .parse()
                .map_err(|_| anyhow!("unknown maxrects heuristic: {v}"))?;
        }
        if let Some(v) = self.alignment {
            cfg.default_alignment = v.parse().map_err(|_| anyhow!("unknown alignment: {v}"))?;
        }
        if let Some(v) = self.pivot_x {
            cfg.default_custom_pivot.x = v;
        }
        if let Some(v) = self.pivot_y {
            cfg.default_custom_pivot.y = v;
        }
        if let Some(v) = self.disable_read_write_after_pack {
            cfg.disable_read_write_after_pack = v;
        }
        if let Some(v) = self.allow_duplicate_sources {
            cfg.allow_duplicate_sources = v;
        }
        Ok(cfg)
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
