use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::warn;

use countfire::{
    CancellationToken, DebugConfig, DetectionConfig, DetectionEngine, DetectionRun, DocumentLoader,
    LoadedDocument, LoaderConfig, Section, SectionStore, Session, SessionRecord,
};

#[derive(Parser)]
#[command(name = "countfire")]
#[command(about = "Count drawing symbols inside named regions of scanned documents")]
struct Cli {
    /// Document to process (PDF, TIFF, PNG, JPEG, ...)
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Saved session with the sections to count in
    #[arg(long, value_name = "FILE")]
    sections: Option<PathBuf>,

    /// Detection parameters as JSON; overrides the session's
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render resolution for PDF pages
    #[arg(long)]
    dpi: Option<f32>,

    /// Longest edge of a rendered page, in pixels
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save binary masks to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Worker threads for detection
    #[arg(long)]
    threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut loader_config = LoaderConfig::default();
    if let Some(dpi) = args.dpi {
        loader_config.dpi = dpi;
    }
    if let Some(max_dimension) = args.max_dimension {
        loader_config.max_dimension = max_dimension;
    }
    let loader = DocumentLoader::new(loader_config)?;
    let document = loader
        .load(&args.document)
        .with_context(|| format!("failed to load {}", args.document.display()))?;

    let Some(sections_path) = &args.sections else {
        print_pages(&document);
        return Ok(());
    };

    let session = Session::load(sections_path)
        .with_context(|| format!("failed to read sections from {}", sections_path.display()))?;
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<DetectionConfig>(&text)
                .with_context(|| format!("invalid detection config in {}", path.display()))?
        }
        None => session.config.clone(),
    };
    config.validate()?;

    let sections = sections_for(&document, &session.records)?;

    let mut engine = DetectionEngine::new();
    if let Some(dir) = args.debug_out {
        engine = engine.with_debug(DebugConfig::new(dir)?);
    }

    let outcome = DetectionRun::for_document(&document, sections, config)
        .with_engine(engine)
        .with_threads(args.threads)
        .execute(&CancellationToken::new())?;

    match &args.output {
        Some(path) => {
            outcome
                .report
                .write_json(path)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("{}", outcome.report);
        }
        None => println!("{}", outcome.report.to_json()?),
    }

    Ok(())
}

/// Validate the saved records against the loaded pages. Records naming a
/// page that did not load are passed through so the run reports them.
fn sections_for(
    document: &LoadedDocument,
    records: &[SessionRecord],
) -> anyhow::Result<Vec<Section>> {
    let (present, missing): (Vec<SessionRecord>, Vec<SessionRecord>) = records
        .iter()
        .cloned()
        .partition(|r| document.page(r.page).is_some());

    let store = SectionStore::restore(&present, &document.pages)
        .context("invalid section in session")?;
    let mut sections = store.all().to_vec();

    let mut order = sections.len() as u64;
    for record in missing {
        warn!("section '{}' refers to page {} which did not load", record.name, record.page);
        sections.push(Section {
            id: record.id,
            name: record.name,
            page: record.page,
            rect: record.rect,
            order,
            created_at: record.created_at.unwrap_or_else(time::OffsetDateTime::now_utc),
        });
        order += 1;
    }
    Ok(sections)
}

fn print_pages(document: &LoadedDocument) {
    println!("{}: {} page(s)", document.name, document.pages.len());
    for page in &document.pages {
        println!(
            "  page {}: {}x{} px, {} channel(s), {} dpi",
            page.index(),
            page.width(),
            page.height(),
            page.channels(),
            page.dpi()
        );
    }
    for warning in &document.warnings {
        println!("  page {} skipped: {}", warning.page, warning.error);
    }
}
