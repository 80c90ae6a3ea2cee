//! seccion CLI - procurement PDF batch segmentation tool

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use seccion::{pipeline, process_file, PipelineContext, PipelineOptions, RunSummary};

#[derive(Parser)]
#[command(name = "seccion")]
#[command(version)]
#[command(about = "Convert procurement PDF batches into a titled section corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a directory of PDFs into per-batch tables and a merged corpus
    Extract {
        /// Directory containing `{year}_{category}_{nro}.pdf` files
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory for Parquet tables
        #[arg(short, long, value_name = "DIR", default_value = "./corpus")]
        output: PathBuf,

        /// Bookmark depth treated as section titles
        #[arg(long, default_value = "2")]
        depth: i32,

        /// Offset added to resolved bookmark pages
        #[arg(long, default_value = "1")]
        page_offset: i32,

        /// Per-document timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Documents per flushed batch
        #[arg(long, default_value = "10")]
        batch_size: usize,

        /// CPU worker threads (0 = one per core)
        #[arg(long, default_value = "0")]
        cpu_threads: usize,

        /// IO worker threads (0 = two per core)
        #[arg(long, default_value = "0")]
        io_threads: usize,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-merge existing batch tables in a directory
    Merge {
        /// Directory holding `*_batch_N.parquet` files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Print the merge summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the derived tables of a single document
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Bookmark depth treated as section titles
        #[arg(long, default_value = "2")]
        depth: i32,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            depth,
            page_offset,
            timeout,
            batch_size,
            cpu_threads,
            io_threads,
            json,
        } => {
            let options = PipelineOptions::new()
                .with_target_depth(depth)
                .with_page_offset(page_offset)
                .with_timeout(Duration::from_secs(timeout))
                .with_batch_size(batch_size)
                .with_threads(cpu_threads, io_threads);
            cmd_extract(&input, &output, options, json)
        }
        Commands::Merge { dir, json } => cmd_merge(&dir, json),
        Commands::Info { input, depth } => cmd_info(&input, depth),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(
    input: &PathBuf,
    output: &PathBuf,
    options: PipelineOptions,
    json: bool,
) -> seccion::Result<()> {
    let ctx = PipelineContext::new(options)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Processing {}", input.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let summary = ctx.run(input, output)?;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    } else {
        print_summary(&summary, output);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, output: &PathBuf) {
    println!("{}", "Run complete".green().bold());
    println!("  documents found:     {}", summary.documents_found);
    println!("  processed:           {}", summary.documents_processed);
    if summary.documents_failed > 0 {
        println!(
            "  failed:              {}",
            summary.documents_failed.to_string().red()
        );
    }
    if summary.documents_timed_out > 0 {
        println!(
            "  timed out:           {}",
            summary.documents_timed_out.to_string().yellow()
        );
    }
    if summary.invalid_ids_skipped > 0 {
        println!("  invalid names:       {}", summary.invalid_ids_skipped);
    }
    println!("  batches flushed:     {}", summary.batches_flushed);
    println!("  sections:            {}", summary.merge.sections);
    println!("  empty sections:      {}", summary.merge.empty_sections);
    println!(
        "  elapsed:             {}s",
        (summary.finished_at - summary.started_at).num_seconds()
    );
    println!("  output:              {}", output.display());
}

fn cmd_merge(dir: &PathBuf, json: bool) -> seccion::Result<()> {
    let merge = pipeline::merge_output_dir(dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&merge).unwrap_or_default());
    } else {
        println!("{}", "Merge complete".green().bold());
        println!("  line records:    {}", merge.line_records);
        println!("  outline entries: {}", merge.outline_entries);
        println!("  sections:        {}", merge.sections);
        println!("  empty sections:  {}", merge.empty_sections);
    }
    Ok(())
}

fn cmd_info(input: &PathBuf, depth: i32) -> seccion::Result<()> {
    let options = PipelineOptions::new().with_target_depth(depth);
    let tables = process_file(input, &options)?;

    println!("{} {}", "document:".bold(), tables.document_id);
    println!(
        "  {} line records, {} outline entries, {} sections",
        tables.lines.len(),
        tables.outline.len(),
        tables.sections.len()
    );

    for section in &tables.sections {
        let location = match section.line_end {
            Some(end) => format!(
                "p.{} l.{} .. p.{} l.{}",
                section.page_start, section.line_start, section.page_end, end
            ),
            None => format!(
                "p.{} l.{} .. p.{}",
                section.page_start, section.line_start, section.page_end
            ),
        };
        println!(
            "  {} {} ({} lines)",
            location.dimmed(),
            section.title,
            section.content_length()
        );
    }
    Ok(())
}
