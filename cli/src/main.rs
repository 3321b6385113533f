//! relayout CLI - layout-preserving document translation tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use relayout::codec::{self, JsonFormat};
use relayout::extract::{ExtractOptions, MemorySource, PageSelection};
use relayout::model::{DiagnosticKind, Diagnostics, Document, DocumentStats};
use relayout::reconstruct::{PageRenderer, ReconstructOptions, Reconstructor, SvgRenderer};
use relayout::translate::{PrefixTranslator, TranslateOptions, TranslationEngine};
use relayout::Extractor;

#[derive(Parser)]
#[command(name = "relayout")]
#[command(version)]
#[command(about = "Extract, translate and rebuild documents while keeping their layout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a document model from a primitive dump
    Extract {
        /// Primitive dump (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Fail on the first undecodable page
        #[arg(long)]
        strict: bool,

        /// Process pages one at a time
        #[arg(long)]
        sequential: bool,

        /// Target language; right-to-left languages reverse column order
        #[arg(long, value_name = "LANG")]
        target: Option<String>,

        /// Skip table detection
        #[arg(long)]
        no_tables: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Merge run updates returned by a translation or OCR service
    Apply {
        /// Document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Run update batch (JSON)
        #[arg(value_name = "UPDATES")]
        updates: PathBuf,

        /// Output file (overwrites the document if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Dry-run translation that prefixes every run, for layout testing
    Translate {
        /// Document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Text put in front of every run
        #[arg(long, default_value = "[TR] ")]
        prefix: String,

        /// Source language
        #[arg(long, default_value = "en")]
        source: String,

        /// Target language
        #[arg(long, default_value = "es", env = "RELAYOUT_TARGET_LANG")]
        target: String,

        /// Maximum requests in flight
        #[arg(long, default_value = "8")]
        max_in_flight: usize,

        /// Output file (overwrites the document if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Rebuild pages as draw operations
    Reconstruct {
        /// Document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Draw operation output (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write an SVG preview per page into this directory
        #[arg(long, value_name = "DIR")]
        svg: Option<PathBuf>,

        /// Smallest font scale (fraction of the original size)
        #[arg(long, default_value = "0.7")]
        min_scale: f32,

        /// Never grow blocks into the space below them
        #[arg(long)]
        no_growth: bool,

        /// Paint over the original text before placing new text
        #[arg(long)]
        cover: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document statistics and diagnostics
    Info {
        /// Document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
    },

    /// Show version information
    Version,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Extract {
            input,
            output,
            pages,
            strict,
            sequential,
            target,
            no_tables,
            compact,
        }) => {
            let mut options = ExtractOptions::new();
            if strict {
                options = options.strict();
            }
            if sequential {
                options = options.sequential();
            }
            if no_tables {
                options = options.without_tables();
            }
            if let Some(lang) = target.as_deref() {
                options = options.for_target_language(lang);
            }
            cmd_extract(&input, output.as_deref(), pages.as_deref(), options, compact)
        }
        Some(Commands::Apply {
            document,
            updates,
            output,
        }) => cmd_apply(&document, &updates, output.as_deref()),
        Some(Commands::Translate {
            document,
            prefix,
            source,
            target,
            max_in_flight,
            output,
        }) => {
            let options = TranslateOptions::new(source, target).with_max_in_flight(max_in_flight);
            cmd_translate(&document, &prefix, options, output.as_deref())
        }
        Some(Commands::Reconstruct {
            document,
            output,
            svg,
            min_scale,
            no_growth,
            cover,
            compact,
        }) => {
            let options = ReconstructOptions::new()
                .with_min_font_scale(min_scale)
                .with_growth(!no_growth)
                .with_cover(cover);
            cmd_reconstruct(&document, output.as_deref(), svg.as_deref(), options, compact)
        }
        Some(Commands::Info { document }) => cmd_info(&document),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: relayout <COMMAND> <FILE>".yellow());
            println!("       relayout --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!("{} {}", diagnostics.len().to_string().yellow().bold(), "diagnostics:".yellow());
    for diagnostic in diagnostics.iter() {
        let kind = format!("{:?}", diagnostic.kind);
        let kind = match diagnostic.kind {
            DiagnosticKind::DecodeError | DiagnosticKind::OcrFailure => kind.red(),
            DiagnosticKind::TranslationFailure | DiagnosticKind::LayoutOverflow => kind.yellow(),
        };
        eprintln!("  {} {}", kind, diagnostic.message.dimmed());
    }
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
    mut options: ExtractOptions,
    compact: bool,
) -> CliResult {
    if let Some(p) = pages {
        let selection = PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?;
        options = options.with_pages(selection);
    }

    let source = MemorySource::from_file(input)?;
    let extraction = Extractor::new(options).extract(&source)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = codec::encode(&extraction.document, format)?;
    write_output(output, &json)?;
    print_diagnostics(&extraction.diagnostics);

    Ok(())
}

fn cmd_apply(document: &Path, updates: &Path, output: Option<&Path>) -> CliResult {
    let mut doc = codec::load(document)?;
    let updates = codec::decode_updates(&fs::read_to_string(updates)?)?;

    let report = codec::apply_updates(&mut doc, updates);
    let target = output.unwrap_or(document);
    codec::save(&doc, target, JsonFormat::Pretty)?;

    println!(
        "{} {} runs updated, saved to {}",
        "Done!".green().bold(),
        report.applied,
        target.display()
    );
    for update in &report.unknown {
        eprintln!(
            "  {} run {} on page {}",
            "Unknown target:".yellow(),
            update.run.0,
            update.page
        );
    }

    Ok(())
}

fn cmd_translate(document: &Path, prefix: &str, options: TranslateOptions, output: Option<&Path>) -> CliResult {
    let doc = codec::load(document)?;
    let engine = TranslationEngine::new(Arc::new(PrefixTranslator::new(prefix)), options)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Translating...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let rt = tokio::runtime::Runtime::new()?;
    let (doc, diagnostics) = rt.block_on(engine.translate_document(doc));
    pb.finish_with_message("Done!");

    let target = output.unwrap_or(document);
    codec::save(&doc, target, JsonFormat::Pretty)?;
    println!("{} {}", "Saved to".green(), target.display());
    print_diagnostics(&diagnostics);

    Ok(())
}

fn cmd_reconstruct(
    document: &Path,
    output: Option<&Path>,
    svg_dir: Option<&Path>,
    options: ReconstructOptions,
    compact: bool,
) -> CliResult {
    let doc = codec::load(document)?;
    let (pages, diagnostics) = Reconstructor::new(options).reconstruct(&doc);

    if let Some(dir) = svg_dir {
        fs::create_dir_all(dir)?;
        let pb = ProgressBar::new(pages.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb.set_message("Rendering previews...");

        let renderer = SvgRenderer::new();
        for page in &pages {
            let svg = renderer.render(page)?;
            fs::write(dir.join(format!("page-{:04}.svg", page.index + 1)), svg)?;
            pb.inc(1);
        }
        pb.finish_with_message("Done!");
    }

    let json = if compact {
        serde_json::to_string(&pages)?
    } else {
        serde_json::to_string_pretty(&pages)?
    };
    if output.is_some() || svg_dir.is_none() {
        write_output(output, &json)?;
    }
    print_diagnostics(&diagnostics);

    Ok(())
}

fn cmd_info(document: &Path) -> CliResult {
    let doc: Document = codec::load(document)?;
    let stats = DocumentStats::from_document(&doc);

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), document.display());
    if let Some(ref source) = doc.metadata.source_path {
        println!("{}: {}", "Source".bold(), source);
    }
    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let (Some(source), Some(target)) = (&doc.metadata.source_lang, &doc.metadata.target_lang) {
        println!("{}: {} -> {}", "Languages".bold(), source, target);
    }
    if let Some(ref extracted) = doc.metadata.extracted_at {
        println!("{}: {}", "Extracted".bold(), extracted.to_rfc3339());
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!(
        "{}: {} ({} failed)",
        "Pages".bold(),
        stats.page_count,
        stats.failed_page_count
    );
    println!("{}: {}", "Regions".bold(), stats.region_count);
    println!(
        "{}: {} ({} headings, {} list items)",
        "Blocks".bold(),
        stats.block_count,
        stats.heading_count,
        stats.list_item_count
    );
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Images".bold(), stats.image_count);
    println!(
        "{}: {} ({:.0}% translated, {} failed)",
        "Runs".bold(),
        stats.run_count,
        stats.translated_ratio() * 100.0,
        stats.failed_run_count
    );
    println!("{}: {}", "Characters".bold(), stats.char_count);

    for page in doc.pages.iter().filter(|p| p.is_failed()) {
        println!(
            "  {} page {}: {}",
            "Failed".red(),
            page.index + 1,
            page.error.as_deref().unwrap_or_default()
        );
    }

    // Overflows are only known after a rebuild.
    let (_, diagnostics) = Reconstructor::default().reconstruct(&doc);
    println!(
        "{}: {}",
        "Layout overflows".bold(),
        diagnostics.count(DiagnosticKind::LayoutOverflow)
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "relayout".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Layout-preserving document translation tool");
    println!();
    println!("License: MIT");
}
