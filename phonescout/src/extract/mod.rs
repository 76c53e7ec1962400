//! This module implements the block-parallel extraction pipeline.
//!
//! # Pipeline
//!
//! ```text
//! file -> BlockReader -> Dispatcher (rayon workers) -> ReorderBuffer -> Aggregator
//! ```
//!
//! 1. **Chunking**: [`BlockReader`] reads the file sequentially and cuts it on
//!    the last line terminator of every read, so a number is never split
//!    across two blocks.
//! 2. **Fan-out**: [`Dispatcher`] hands each block to a worker that runs the
//!    [`PhoneMatcher`]. Only a bounded number of blocks are in flight at once.
//! 3. **Fan-in**: results are tagged with the block's position and released
//!    strictly in file order, whatever order the workers finish in.
//! 4. **Aggregation**: the [`Aggregator`](crate::results::Aggregator) keeps
//!    the first occurrence of every number.
//!
//! # Rust vs .NET Parallel Processing
//!
//! In .NET, an order-preserving parallel map is usually spelled with PLINQ:
//! ```csharp
//! var numbers = ReadBlocks(path)
//!     .AsParallel()
//!     .AsOrdered()
//!     .WithDegreeOfParallelism(workers)
//!     .SelectMany(block => Extract(block))
//!     .Distinct();
//! ```
//!
//! Here the same shape is explicit: rayon provides the worker pool, a
//! crossbeam channel carries sequence-tagged results back, and the reorder
//! buffer plays the part of `AsOrdered()`:
//! ```rust,ignore
//! dispatcher.run(blocks, |block| Ok(matcher.extract_block(block)), |batch| {
//!     aggregator.absorb(batch)
//! })?;
//! ```

pub mod chunker;
pub mod dispatcher;
pub mod engine;
pub mod matcher;

pub use chunker::{BlockReader, RawBlock, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE};
pub use dispatcher::{Dispatcher, ReorderBuffer};
pub use engine::{extract, extract_from_reader, extract_with_progress};
pub use matcher::{CanonicalNumber, PhoneMatcher};
