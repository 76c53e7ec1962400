use crossbeam_channel::{Receiver, Sender};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace, warn};

use super::chunker::RawBlock;
use crate::config::ErrorPolicy;
use crate::errors::{ExtractError, ExtractResult};
use crate::metrics::PipelineMetrics;

/// Blocks allowed in flight per worker before the reader is throttled
const IN_FLIGHT_PER_WORKER: usize = 2;

/// Holds results that finished ahead of their predecessors
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: BTreeMap<u64, T>,
    next: u64,
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next: 0,
        }
    }

    /// Stores the result for `sequence`
    pub fn insert(&mut self, sequence: u64, item: T) {
        debug_assert!(sequence >= self.next, "sequence {sequence} already released");
        self.pending.insert(sequence, item);
    }

    /// Releases the next result if it has arrived
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    /// Sequence number the buffer is waiting for
    pub fn next_expected(&self) -> u64 {
        self.next
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct BlockOutcome<T> {
    slot: u64,
    result: ExtractResult<Vec<T>>,
}

/// Fans blocks out to a worker pool and hands per-block results back in order
pub struct Dispatcher {
    pool: ThreadPool,
    workers: NonZeroUsize,
    policy: ErrorPolicy,
    metrics: PipelineMetrics,
}

impl Dispatcher {
    /// Creates a dispatcher with its own pool of `workers` threads
    pub fn new(
        workers: NonZeroUsize,
        policy: ErrorPolicy,
        metrics: PipelineMetrics,
    ) -> ExtractResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|i| format!("phonescout-worker-{i}"))
            .build()
            .map_err(|e| ExtractError::worker_pool(e.to_string()))?;
        Ok(Self {
            pool,
            workers,
            policy,
            metrics,
        })
    }

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Runs `work` over every block and feeds the results to `sink` in block order.
    ///
    /// The block iterator is drained on the calling thread, which is held back
    /// once `2 * workers` blocks are in flight. A read error always aborts. A
    /// failure in `work` (including a panic) aborts or is skipped according to
    /// the configured [`ErrorPolicy`]. On abort, queued blocks are dropped
    /// without running and `sink` is never called again.
    pub fn run<T, I, W, S>(&self, blocks: I, work: W, mut sink: S) -> ExtractResult<()>
    where
        T: Send,
        I: IntoIterator<Item = ExtractResult<RawBlock>>,
        W: Fn(&RawBlock) -> ExtractResult<Vec<T>> + Sync,
        S: FnMut(Vec<T>),
    {
        let window = self.workers.get() * IN_FLIGHT_PER_WORKER;
        let (tx, rx) = crossbeam_channel::unbounded::<BlockOutcome<T>>();
        let cancelled = AtomicBool::new(false);
        let work = &work;
        let cancelled_flag = &cancelled;
        let mut reorder: ReorderBuffer<Option<Vec<T>>> = ReorderBuffer::new();

        self.pool.in_place_scope(|scope| {
            let feed = || -> ExtractResult<()> {
                let mut in_flight = 0usize;
                for (slot, block) in (0u64..).zip(blocks) {
                    let block = block?;

                    while in_flight >= window {
                        let outcome = receive(&rx)?;
                        in_flight -= 1;
                        self.settle(outcome, &mut reorder, &mut sink)?;
                    }

                    let tx: Sender<BlockOutcome<T>> = tx.clone();
                    in_flight += 1;
                    trace!("Dispatching block {} as slot {}", block.sequence(), slot);
                    scope.spawn(move |_| {
                        if cancelled_flag.load(Ordering::Acquire) {
                            return;
                        }
                        let result = run_guarded(work, &block);
                        let _ = tx.send(BlockOutcome { slot, result });
                    });
                }

                while in_flight > 0 {
                    let outcome = receive(&rx)?;
                    in_flight -= 1;
                    self.settle(outcome, &mut reorder, &mut sink)?;
                }
                Ok(())
            };

            let result = feed();
            if result.is_err() {
                cancelled_flag.store(true, Ordering::Release);
            }
            result
        })?;

        debug_assert!(reorder.is_empty());
        debug!("All {} blocks merged", reorder.next_expected());
        Ok(())
    }

    fn settle<T, S>(
        &self,
        outcome: BlockOutcome<T>,
        reorder: &mut ReorderBuffer<Option<Vec<T>>>,
        sink: &mut S,
    ) -> ExtractResult<()>
    where
        S: FnMut(Vec<T>),
    {
        let slot = match outcome.result {
            Ok(items) => Some(items),
            Err(err) => match self.policy {
                ErrorPolicy::Abort => return Err(err),
                ErrorPolicy::Skip => {
                    warn!("Skipping block: {}", err);
                    self.metrics.record_skipped_block();
                    None
                }
            },
        };

        reorder.insert(outcome.slot, slot);
        while let Some(ready) = reorder.pop_ready() {
            if let Some(items) = ready {
                sink(items);
            }
        }
        Ok(())
    }
}

fn receive<T>(rx: &Receiver<BlockOutcome<T>>) -> ExtractResult<BlockOutcome<T>> {
    rx.recv()
        .map_err(|_| ExtractError::worker_pool("result channel closed unexpectedly"))
}

/// Runs `work` on one block, turning errors and panics into a positioned failure
fn run_guarded<T, W>(work: &W, block: &RawBlock) -> ExtractResult<Vec<T>>
where
    W: Fn(&RawBlock) -> ExtractResult<Vec<T>>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(block)));
    match outcome {
        Ok(Ok(items)) => Ok(items),
        Ok(Err(err @ ExtractError::BlockFailed { .. })) => Err(err),
        Ok(Err(err)) => Err(ExtractError::block_failed(
            block.sequence(),
            block.offset(),
            err.to_string(),
        )),
        Err(payload) => Err(ExtractError::block_failed(
            block.sequence(),
            block.offset(),
            format!("worker panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
