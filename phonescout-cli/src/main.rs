use clap::{Parser, Subcommand};
use colored::Colorize;
use phonescout::{
    config::{ConfigOverrides, ErrorPolicy, ExtractConfig, OutputFormat},
    extract, extract_with_progress, generator,
    output::write_results,
    ExtractError, ExtractOutput,
};
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliExtractConfig {
    /// Path to the input text file
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Where to save results (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Number of worker threads (default: CPU cores)
    #[arg(short = 'w', long)]
    workers: Option<NonZeroUsize>,

    /// Target block size in bytes
    #[arg(long, hide = true)]
    block_size: Option<usize>,

    /// Skip blocks that fail instead of aborting the run
    #[arg(long)]
    skip_errors: bool,

    /// Show only statistics, not numbers
    #[arg(short, long)]
    stats: bool,

    /// Output format (lines|json)
    #[arg(short = 'f', long)]
    format: Option<OutputFormat>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show a progress bar while reading
    #[arg(long)]
    progress: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract unique phone numbers from a text file
    Extract(Box<CliExtractConfig>),

    /// Generate a synthetic text file full of phone numbers
    Generate {
        /// File to create
        #[arg(short = 'o', long, default_value = "generated.txt")]
        output: PathBuf,

        /// Desired file size in MiB
        #[arg(short = 's', long, default_value = "5")]
        size_mb: u64,

        /// Seed for reproducible output
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => {
            let file_config = ExtractConfig::load_from(args.config.as_deref())?;
            let config = file_config.merge_with_cli(ConfigOverrides {
                input_path: Some(args.input),
                output_path: args.output,
                worker_count: args.workers,
                block_size: args.block_size,
                error_policy: args.skip_errors.then_some(ErrorPolicy::Skip),
                output_format: args.format,
                stats_only: args.stats,
                show_progress: args.progress,
                log_level: args.verbose.then(|| "debug".to_string()),
            });
            init_logging(&config.log_level);
            debug!(
                input = %config.input_path.display(),
                workers = config.worker_count.get(),
                block_size = config.block_size,
                policy = ?config.error_policy,
                "configuration resolved"
            );

            let output = if config.show_progress {
                extract_with_progress(&config)?
            } else {
                extract(&config)?
            };

            if config.stats_only {
                print_stats(&output, config.output_format)?;
            } else {
                debug!(count = output.numbers.len(), "writing results");
                write_results(
                    &output.numbers,
                    config.output_path.as_deref(),
                    config.output_format,
                )?;
                if let Some(path) = &config.output_path {
                    eprintln!(
                        "Wrote {} numbers to {}",
                        output.numbers.len(),
                        path.display().to_string().blue()
                    );
                }
            }

            if output.stats.blocks_skipped > 0 {
                eprintln!(
                    "{} {} blocks were skipped after worker failures",
                    "warning:".yellow().bold(),
                    output.stats.blocks_skipped
                );
            }
            Ok(())
        }
        Commands::Generate {
            output,
            size_mb,
            seed,
        } => {
            init_logging("warn");
            debug!(path = %output.display(), size_mb, seed, "generating input");
            let summary = generator::generate_file(&output, size_mb, seed)?;
            info!(
                paragraphs = summary.paragraphs,
                planted = summary.planted.len(),
                "generation finished"
            );
            println!(
                "Generated file '{}' {:.2} MiB",
                output.display(),
                summary.bytes_written as f64 / 1024.0 / 1024.0
            );
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_stats(output: &ExtractOutput, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&output.stats)?);
        return Ok(());
    }

    println!(
        "Found {} unique numbers ({} matches) in {} blocks",
        output.stats.unique_numbers, output.stats.raw_matches, output.stats.blocks
    );
    println!(
        "{} {} bytes in {:.2} sec",
        "Read".green(),
        output.stats.bytes_read,
        output.elapsed.as_secs_f64()
    );
    if output.stats.forced_cuts > 0 {
        println!(
            "{} {} blocks were cut without a line break",
            "Note:".yellow(),
            output.stats.forced_cuts
        );
    }
    Ok(())
}
