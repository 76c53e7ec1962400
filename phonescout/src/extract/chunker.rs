use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::errors::{ExtractError, ExtractResult};
use crate::metrics::PipelineMetrics;

/// Default target block size (4 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Largest accepted block size (1 GiB)
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024 * 1024;

/// A pending run without a line terminator is force-cut once it grows past
/// this many block sizes.
pub const FORCED_CUT_FACTOR: usize = 2;

/// An immutable, line-aligned fragment of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    sequence: u64,
    offset: u64,
    byte_len: usize,
    forced_cut: bool,
    text: String,
}

impl RawBlock {
    /// Position of the block in emission order, starting at zero
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Byte offset of the block's first byte in the source
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of the block in source bytes, before decoding
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Whether the block was cut without a line terminator
    pub fn is_forced_cut(&self) -> bool {
        self.forced_cut
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Splits a byte stream into line-aligned blocks of roughly `block_size` bytes.
///
/// Reads happen in `block_size` steps into a carry-over tail. Everything up to
/// and including the last `\n` of the tail is emitted; the remainder waits for
/// the next read. A tail that holds no terminator and has grown beyond
/// `FORCED_CUT_FACTOR * block_size` is emitted as-is, which bounds memory at
/// the cost of possibly splitting a match at that cut.
#[derive(Debug)]
pub struct BlockReader<R> {
    reader: R,
    block_size: usize,
    cut_limit: usize,
    tail: Vec<u8>,
    next_sequence: u64,
    next_offset: u64,
    finished: bool,
    metrics: PipelineMetrics,
}

impl BlockReader<File> {
    /// Opens `path` for block reading
    pub fn open(path: &Path, block_size: usize) -> ExtractResult<Self> {
        let file = File::open(path).map_err(|e| ExtractError::from_open(path, e))?;
        Self::new(file, block_size)
    }
}

impl<R: Read> BlockReader<R> {
    pub fn new(reader: R, block_size: usize) -> ExtractResult<Self> {
        Self::with_metrics(reader, block_size, PipelineMetrics::new())
    }

    /// Creates a reader that reports into shared metrics
    pub fn with_metrics(
        reader: R,
        block_size: usize,
        metrics: PipelineMetrics,
    ) -> ExtractResult<Self> {
        if block_size == 0 {
            return Err(ExtractError::config_error(
                "block_size must be greater than zero",
            ));
        }
        if block_size > MAX_BLOCK_SIZE {
            return Err(ExtractError::config_error(format!(
                "block_size must not exceed {MAX_BLOCK_SIZE} bytes"
            )));
        }
        let cut_limit = block_size
            .checked_mul(FORCED_CUT_FACTOR)
            .ok_or_else(|| ExtractError::config_error("block_size is too large"))?;
        Ok(Self {
            reader,
            block_size,
            cut_limit,
            // Grows on demand past the default.
            tail: Vec::with_capacity(block_size.min(DEFAULT_BLOCK_SIZE)),
            next_sequence: 0,
            next_offset: 0,
            finished: false,
            metrics,
        })
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Appends up to `block_size` bytes to the tail, returning how many arrived
    fn fill(&mut self) -> std::io::Result<usize> {
        let limit = self.block_size as u64;
        let read = (&mut self.reader).take(limit).read_to_end(&mut self.tail)?;
        trace!("Read {} bytes into a {} byte tail", read, self.tail.len());
        self.metrics.record_read(read as u64);
        Ok(read)
    }

    fn emit(&mut self, bytes: Vec<u8>, forced_cut: bool) -> RawBlock {
        let sequence = self.next_sequence;
        let offset = self.next_offset;
        let byte_len = bytes.len();
        self.next_sequence += 1;
        self.next_offset += byte_len as u64;

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    "Invalid UTF-8 replaced in block {} at byte offset {}",
                    sequence, offset
                );
                self.metrics.record_decode_substitution();
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };

        self.metrics.record_block(forced_cut);
        debug!(
            "Emitting block {} ({} bytes at offset {})",
            sequence, byte_len, offset
        );

        RawBlock {
            sequence,
            offset,
            byte_len,
            forced_cut,
            text,
        }
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = ExtractResult<RawBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let previous_len = self.tail.len();
            let read = match self.fill() {
                Ok(read) => read,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(ExtractError::IoError(e)));
                }
            };

            if read == 0 {
                self.finished = true;
                if self.tail.is_empty() {
                    return None;
                }
                let rest = std::mem::take(&mut self.tail);
                return Some(Ok(self.emit(rest, false)));
            }

            // Older tail bytes were already searched and hold no terminator.
            if let Some(pos) = memrchr_newline(&self.tail[previous_len..]) {
                let cut = previous_len + pos + 1;
                let rest = self.tail.split_off(cut);
                let block = std::mem::replace(&mut self.tail, rest);
                return Some(Ok(self.emit(block, false)));
            }

            if self.tail.len() > self.cut_limit {
                // Keep a trailing partial UTF-8 sequence for the next block.
                let keep = incomplete_utf8_suffix(&self.tail);
                if keep < self.tail.len() {
                    warn!(
                        "No line terminator within {} bytes at offset {}, forcing a block cut",
                        self.tail.len(),
                        self.next_offset
                    );
                    let rest = self.tail.split_off(self.tail.len() - keep);
                    let block = std::mem::replace(&mut self.tail, rest);
                    return Some(Ok(self.emit(block, true)));
                }
            }
        }
        None
    }
}

fn memrchr_newline(bytes: &[u8]) -> Option<usize> {
    bytes.iter().rposition(|&b| b == b'\n')
}

/// Length of an unfinished UTF-8 sequence at the end of `bytes`, or zero.
fn incomplete_utf8_suffix(bytes: &[u8]) -> usize {
    let tail_start = bytes.len().saturating_sub(3);
    for start in (tail_start..bytes.len()).rev() {
        let byte = bytes[start];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = match byte {
            b if b & 0b1110_0000 == 0b1100_0000 => 2,
            b if b & 0b1111_0000 == 0b1110_0000 => 3,
            b if b & 0b1111_1000 == 0b1111_0000 => 4,
            _ => return 0,
        };
        let available = bytes.len() - start;
        return if available < needed { available } else { 0 };
    }
    0
}
