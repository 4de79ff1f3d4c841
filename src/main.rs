use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stitchforge::pipeline::{self, write_pdf, ChartContext};
use stitchforge::{PaletteStore, PatternConfig, SymbolAlphabet};

#[derive(Parser)]
#[command(name = "stitchforge")]
#[command(about = "Turn an image into a printable cross-stitch chart")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PatternArgs {
    /// Longest side of the stitch grid
    #[arg(long)]
    size: Option<u32>,

    /// Number of colours to quantize to
    #[arg(long)]
    colors: Option<u32>,

    /// Thread palette JSON file (defaults to the built-in DMC palette)
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Pattern config JSON file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Main title printed on the cover and grid pages
    #[arg(long)]
    title: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one chart to a PDF
    Chart {
        /// Source image
        image: PathBuf,

        /// Output PDF path
        #[arg(short, long, default_value = "chart.pdf")]
        output: PathBuf,

        /// Grey fills instead of thread colours
        #[arg(long)]
        mono: bool,

        /// Single-page dense chart for pattern-reader apps
        #[arg(long)]
        dense: bool,

        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Write pixels, preview and all chart PDFs into a directory
    Export {
        image: PathBuf,
        dir: PathBuf,

        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// List the threads of a palette
    Palette {
        #[arg(long)]
        palette: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose {
        "stitchforge=debug"
    } else {
        "stitchforge=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Chart {
            image,
            output,
            mono,
            dense,
            pattern,
        } => {
            let mut config = load_config(&pattern)?;
            config.monochrome |= mono;
            let ctx = load_context(pattern.palette.as_deref())?;
            let prepared = pipeline::prepare_path(&ctx, &image, &config)
                .with_context(|| format!("Failed to prepare {}", image.display()))?;
            log::info!("DMC threads used: {}", prepared.used.len());

            let chart = if dense {
                prepared.dense_chart(&config)?
            } else {
                prepared.multi_page_chart(&config)?
            };
            write_pdf(&chart, &output)?;
            println!("{} ({} pages)", output.display(), chart.page_count());
        }
        Commands::Export {
            image,
            dir,
            pattern,
        } => {
            let config = load_config(&pattern)?;
            let ctx = load_context(pattern.palette.as_deref())?;
            let prepared = pipeline::prepare_path(&ctx, &image, &config)
                .with_context(|| format!("Failed to prepare {}", image.display()))?;
            log::info!(
                "DMC threads used: {} (request {})",
                prepared.used.len(),
                prepared.request_key()
            );
            let bundle = pipeline::export_bundle(&prepared, &config, &dir)?;
            for path in [
                &bundle.pixels,
                &bundle.preview,
                &bundle.color_pdf,
                &bundle.bw_pdf,
                &bundle.dense_pdf,
            ] {
                println!("{}", path.display());
            }
        }
        Commands::Palette { palette } => {
            let store = load_palette(palette.as_deref())?;
            for entry in store.entries() {
                let [r, g, b] = entry.rgb();
                println!(
                    "{:<8} #{:02X}{:02X}{:02X}  {}",
                    entry.id, r, g, b, entry.description
                );
            }
            log::info!("{} threads", store.len());
        }
    }

    Ok(())
}

fn load_config(args: &PatternArgs) -> anyhow::Result<PatternConfig> {
    let mut config = match &args.config {
        Some(path) => PatternConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PatternConfig::default(),
    };
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    if let Some(colors) = args.colors {
        config.color_count = colors;
    }
    if let Some(title) = &args.title {
        config.texts.main_title = title.clone();
    }
    Ok(config)
}

fn load_palette(path: Option<&Path>) -> anyhow::Result<PaletteStore> {
    let store = match path {
        Some(path) => PaletteStore::load(path)?,
        None => PaletteStore::builtin()?,
    };
    Ok(store)
}

fn load_context(palette: Option<&Path>) -> anyhow::Result<ChartContext> {
    Ok(ChartContext::new(
        load_palette(palette)?,
        SymbolAlphabet::default(),
    ))
}
