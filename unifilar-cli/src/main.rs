//! Unifilar CLI - prepare, paginate and render single-line diagrams from the command line.

mod svg;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing::level_filters::LevelFilter;
use unifilar::layout::replay;
use unifilar::{PanelPlan, Schematic, SheetConfig, UnifilarCore};

use crate::svg::SvgCanvas;

#[derive(Parser)]
#[command(name = "unifilar")]
#[command(about = "Single-line electrical diagram tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate circuit numbering and pole constraints
    Prepare {
        /// Path to the schematic JSON document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the prepared schematic here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Print panels in the flat legacy shape
    Flatten {
        /// Path to the schematic JSON document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only this panel
        #[arg(long, value_name = "ID")]
        panel: Option<String>,
    },

    /// Show how panels are split into pages
    Layout {
        /// Path to the schematic JSON document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Sheet configuration overrides (JSON)
        #[arg(long, value_name = "SHEET")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: LayoutFormat,
    },

    /// Produce draw commands or SVG sheets
    Render {
        /// Path to the schematic JSON document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Sheet configuration overrides (JSON)
        #[arg(long, value_name = "SHEET")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: RenderFormat,

        /// Output directory (required for SVG)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum LayoutFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, ValueEnum)]
enum RenderFormat {
    /// Draw commands as JSON
    Json,
    /// One SVG file per sheet
    Svg,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Prepare { file, output } => handle_prepare(&file, output.as_deref()),
        Commands::Flatten { file, panel } => handle_flatten(&file, panel.as_deref()),
        Commands::Layout {
            file,
            config,
            format,
        } => handle_layout(&file, config.as_deref(), format),
        Commands::Render {
            file,
            config,
            format,
            output,
        } => handle_render(&file, config.as_deref(), format, output.as_deref()),
    };

    let exit_code = match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(file: &Path) -> anyhow::Result<Schematic> {
    UnifilarCore::load_schematic(file).with_context(|| format!("cannot load {}", file.display()))
}

fn load_config(config: Option<&Path>) -> anyhow::Result<SheetConfig> {
    match config {
        Some(path) => SheetConfig::from_json_file(path)
            .with_context(|| format!("cannot load sheet configuration {}", path.display())),
        None => Ok(SheetConfig::default()),
    }
}

fn handle_prepare(file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let schematic = UnifilarCore::prepare(&load(file)?);
    let json = UnifilarCore::to_json(&schematic)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Prepared schematic written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn handle_flatten(file: &Path, panel: Option<&str>) -> anyhow::Result<()> {
    let schematic = UnifilarCore::prepare(&load(file)?);
    let ids: Vec<String> = match panel {
        Some(id) => vec![id.to_string()],
        None => schematic.panels.iter().map(|p| p.id.clone()).collect(),
    };

    let mut out = Vec::new();
    for id in &ids {
        let flattened = UnifilarCore::flatten(&schematic, id)?;
        for dropped in &flattened.dropped {
            eprintln!(
                "Warning: panel {}: {} ({}) not representable: {:?}",
                id, dropped.id, dropped.kind, dropped.reason
            );
        }
        out.push(serde_json::json!({
            "panel": id,
            "simple": flattened.shape,
            "dropped": flattened.dropped,
        }));
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn handle_layout(file: &Path, config: Option<&Path>, format: LayoutFormat) -> anyhow::Result<()> {
    let schematic = UnifilarCore::prepare(&load(file)?);
    let config = load_config(config)?;
    let plans = UnifilarCore::plan(&schematic, &config)?;
    match format {
        LayoutFormat::Human => output_plans_human(&plans, &config),
        LayoutFormat::Json => output_plans_json(&plans)?,
    }
    Ok(())
}

fn output_plans_human(plans: &[PanelPlan], config: &SheetConfig) {
    println!("Usable width per page: {}", config.usable_width());
    for plan in plans {
        println!();
        println!(
            "{} ({}): {} blocks, {} circuits, {} pages",
            plan.panel_name,
            plan.panel_id,
            plan.block_count,
            plan.circuit_count,
            plan.pages.len()
        );
        for (i, page) in plan.pages.iter().enumerate() {
            println!(
                "  page {}: blocks {}..{} ({} blocks, width {})",
                i + 1,
                page.blocks.start,
                page.blocks.end,
                page.len(),
                page.used_width
            );
        }
    }
}

fn output_plans_json(plans: &[PanelPlan]) -> anyhow::Result<()> {
    let json: Vec<_> = plans
        .iter()
        .map(|plan| {
            serde_json::json!({
                "panelId": plan.panel_id,
                "panelName": plan.panel_name,
                "blockCount": plan.block_count,
                "circuitCount": plan.circuit_count,
                "pages": plan.pages.iter().map(|page| serde_json::json!({
                    "firstBlock": page.blocks.start,
                    "blockCount": page.len(),
                    "usedWidth": page.used_width,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn handle_render(
    file: &Path,
    config: Option<&Path>,
    format: RenderFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let schematic = load(file)?;
    let config = load_config(config)?;
    let diagram = UnifilarCore::render(&schematic, &config)?;

    match format {
        RenderFormat::Json => {
            let json = serde_json::to_string_pretty(&diagram)?;
            match output {
                Some(dir) => {
                    std::fs::create_dir_all(dir)?;
                    let path = dir.join(format!("{}.json", schematic.id));
                    std::fs::write(&path, json)?;
                    println!("Draw commands written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        RenderFormat::Svg => {
            let dir = output.context("--output DIR is required for SVG output")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
            let mut canvas = SvgCanvas::new(config.page_width, config.page_height);
            replay(&diagram.commands, &mut canvas);
            let pages = canvas.finish();
            for (i, page) in pages.iter().enumerate() {
                let path = dir.join(format!("{}-{}.svg", schematic.id, i + 1));
                std::fs::write(&path, page)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }
            println!("{} sheets written to {}", pages.len(), dir.display());
        }
    }
    Ok(())
}
