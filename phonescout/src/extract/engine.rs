use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::chunker::BlockReader;
use super::dispatcher::Dispatcher;
use super::matcher::PhoneMatcher;
use crate::config::ExtractConfig;
use crate::errors::{ExtractError, ExtractResult};
use crate::metrics::PipelineMetrics;
use crate::results::{Aggregator, ExtractOutput};

/// Extracts the unique phone numbers of `config.input_path`
pub fn extract(config: &ExtractConfig) -> ExtractResult<ExtractOutput> {
    config.validate()?;
    info!("Start parsing file {}", config.input_path.display());

    let blocks = BlockReader::open(&config.input_path, config.block_size)?;
    run_pipeline(blocks, config, None)
}

/// Like [`extract`], drawing a byte progress bar on stderr while reading
pub fn extract_with_progress(config: &ExtractConfig) -> ExtractResult<ExtractOutput> {
    config.validate()?;
    info!("Start parsing file {}", config.input_path.display());

    let file = std::fs::File::open(&config.input_path)
        .map_err(|e| ExtractError::from_open(&config.input_path, e))?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
            .map_err(|e| ExtractError::config_error(e.to_string()))?
            .progress_chars("=>-"),
    );

    let blocks = BlockReader::with_metrics(file, config.block_size, PipelineMetrics::new())?;
    let result = run_pipeline(blocks, config, Some(&progress));
    match &result {
        Ok(_) => progress.finish(),
        Err(_) => progress.abandon(),
    }
    result
}

/// Runs the pipeline over any reader; `config.input_path` is not consulted
pub fn extract_from_reader<R: Read>(
    reader: R,
    config: &ExtractConfig,
) -> ExtractResult<ExtractOutput> {
    let blocks = BlockReader::with_metrics(reader, config.block_size, PipelineMetrics::new())?;
    run_pipeline(blocks, config, None)
}

fn run_pipeline<R: Read>(
    blocks: BlockReader<R>,
    config: &ExtractConfig,
    progress: Option<&ProgressBar>,
) -> ExtractResult<ExtractOutput> {
    let start = Instant::now();
    let metrics = blocks.metrics().clone();
    let matcher = PhoneMatcher::new();
    let dispatcher = Dispatcher::new(config.worker_count, config.error_policy, metrics.clone())?;
    debug!(
        "Running with {} workers and {} byte blocks",
        dispatcher.workers(),
        config.block_size
    );

    let blocks = blocks.inspect(|block| {
        if let (Ok(block), Some(bar)) = (block, progress) {
            bar.inc(block.byte_len() as u64);
        }
    });

    let mut aggregator = Aggregator::new();
    dispatcher.run(
        blocks,
        |block| Ok(matcher.extract_block(block)),
        |batch| aggregator.absorb(batch),
    )?;

    metrics.record_matches(aggregator.raw_matches());
    let numbers = aggregator.finish();
    metrics.record_unique(numbers.len() as u64);
    metrics.log_stats();

    let elapsed = start.elapsed();
    info!(
        "Parsing complete: {} unique numbers in {}",
        numbers.len(),
        humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64))
    );

    Ok(ExtractOutput {
        numbers,
        stats: metrics.snapshot(),
        elapsed,
    })
}
