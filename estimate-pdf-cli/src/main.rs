mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estimate_pdf::{
    DocumentSpec, GeneratorOptions, PageFormat, ProgressBar, ProgressUpdate, ProgressiveDocument,
    TableOptions, Unit,
};
use manifest::Manifest;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "estimatepdf",
    about = "Progressive PDF generation for estimates and invoices",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON manifest to PDF
    Render {
        /// Manifest file
        manifest: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Write base64 text instead of raw PDF bytes
        #[arg(long)]
        base64: bool,

        /// Rows per table chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Memory threshold in MB above which generation backs off
        #[arg(long)]
        memory_threshold: Option<u64>,

        /// Landscape pages
        #[arg(long)]
        landscape: bool,

        /// Page format: a3, a4, a5, letter or legal
        #[arg(long)]
        format: Option<PageFormat>,

        /// Page margin, in --unit
        #[arg(long)]
        margin: Option<f64>,

        /// Unit for --margin: pt, mm, cm or in
        #[arg(long)]
        unit: Option<Unit>,

        /// Store content streams uncompressed
        #[arg(long)]
        no_compress: bool,

        /// Halve table chunks while memory is above the threshold
        #[arg(long)]
        adaptive: bool,

        /// Print a progress bar to stderr
        #[arg(short, long)]
        progress: bool,
    },

    /// Generate a sample estimate with a long line-item table
    Demo {
        /// Output file path
        #[arg(short, long, default_value = "demo.pdf")]
        output: PathBuf,

        /// Number of line items
        #[arg(long, default_value_t = 250)]
        rows: usize,

        /// Print a progress bar to stderr
        #[arg(short, long)]
        progress: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn with_progress_bar(options: GeneratorOptions, enabled: bool) -> GeneratorOptions {
    if !enabled {
        return options;
    }
    let bar = ProgressBar::default();
    options.with_progress(move |update: &ProgressUpdate| {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{}", bar.render(update));
        if update.is_complete() {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    })
}

async fn generate(
    spec: &DocumentSpec,
    options: GeneratorOptions,
    output: &Path,
    base64: bool,
) -> Result<usize> {
    let mut doc = ProgressiveDocument::new(options).context("Invalid generation options")?;
    let report = doc.build(spec).await.context("Failed to build document")?;

    let skipped: usize = report.image_grids.iter().map(|grid| grid.skipped.len()).sum();
    if skipped > 0 {
        eprintln!("Warning: {skipped} image(s) could not be decoded and were left blank");
    }

    if base64 {
        let encoded = doc.to_base64()?;
        std::fs::write(output, encoded)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    } else {
        doc.save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }
    Ok(doc.page_count())
}

fn demo_spec(rows: usize) -> DocumentSpec {
    const ITEMS: [(&str, &str, f64); 6] = [
        ("Hardwood mulch", "Double-shredded, delivered and spread", 42.50),
        ("Steel edging", "Installed along front beds, 10 ft sections", 18.75),
        ("Boxwood shrub", "3 gallon, planted and watered in", 36.00),
        ("Sod", "Kentucky bluegrass, per pallet", 295.00),
        ("Drip irrigation", "Zone conversion including emitters and tubing", 410.00),
        ("Labor", "Crew hour, two-person team", 95.00),
    ];

    let mut subtotal = 0.0;
    let line_items: Vec<Vec<String>> = (0..rows)
        .map(|i| {
            let (item, description, price) = ITEMS[i % ITEMS.len()];
            let quantity = (i % 5 + 1) as f64;
            subtotal += price * quantity;
            vec![
                format!("{item} #{}", i + 1),
                description.to_string(),
                format!("{quantity:.0}"),
                format!("${price:.2}"),
                format!("${:.2}", price * quantity),
            ]
        })
        .collect();
    let headers = ["Item", "Description", "Qty", "Unit price", "Total"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let tax = subtotal * 0.08;

    DocumentSpec::new()
        .with_header("Estimate #1042", Some("Green Acres Landscaping".to_string()))
        .section_lines(
            "Client",
            vec![
                "Jane Doe".to_string(),
                "12 Elm Street, Springfield".to_string(),
            ],
        )
        .section(
            "Scope of work",
            "Refresh all front and side beds, replace the rear lawn with new sod and convert \
             two spray zones to drip irrigation. Debris is hauled away at the end of each day.",
        )
        .table(headers, line_items, TableOptions::default())
        .section_lines(
            "Totals",
            vec![
                format!("Subtotal ${subtotal:.2}"),
                format!("Tax (8%) ${tax:.2}"),
                format!("Total ${:.2}", subtotal + tax),
            ],
        )
        .section(
            "Terms",
            "This estimate is valid for 30 days. A 30% deposit secures a start date.",
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            manifest,
            output,
            base64,
            chunk_size,
            memory_threshold,
            landscape,
            format,
            margin,
            unit,
            no_compress,
            adaptive,
            progress,
        } => {
            let document = Manifest::load(&manifest)?;
            let mut options = document.apply_options(GeneratorOptions::default())?;
            if let Some(rows) = chunk_size {
                options.chunk_size = rows;
            }
            if let Some(threshold) = memory_threshold {
                options.memory_threshold_mb = threshold;
            }
            if landscape {
                options.orientation = estimate_pdf::Orientation::Landscape;
            }
            if let Some(format) = format {
                options.format = format;
            }
            if let Some(unit) = unit {
                options.unit = unit;
            }
            if let Some(margin) = margin {
                options.margin = margin;
            }
            if no_compress {
                options.compress = false;
            }
            if adaptive {
                options.adaptive_chunking = true;
            }

            let base_dir = manifest
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let spec = document.to_spec(&base_dir);
            let options = with_progress_bar(options, progress);

            let pages = generate(&spec, options, &output, base64).await?;
            info!(pages, output = %output.display(), "render complete");
            println!("PDF written to {} ({pages} page(s))", output.display());
        }

        Commands::Demo {
            output,
            rows,
            progress,
        } => {
            let options = with_progress_bar(GeneratorOptions::default(), progress);
            let pages = generate(&demo_spec(rows), options, &output, false).await?;
            println!("Demo PDF created successfully! ({pages} page(s))");
        }
    }

    Ok(())
}
