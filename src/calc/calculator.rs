use std::collections::BTreeSet;
use std::collections::btree_map::{BTreeMap, Entry};
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};

use crate::collection::ConcatList;

use super::errors::CalcError;
use super::executor::SubTaskExecutor;
use super::operand::{Operand, Operation};
use super::params::CalculationParams;
use super::result::{CalculationResult, SolutionCandidate, SubTaskResult};
use super::search::{
    ForkSink, IntermediateResultFn, ProgressFn, SubTask, TaskContext, UnitError, UnitOutcome,
    THRESHOLD_DEPTH_FORK, THRESHOLD_DEPTH_PROGRESS,
};
use super::solution::{EquivalenceClass, Solution};

/// Cloneable handle to request cooperative cancellation of a running
/// calculation from another thread. The flag is polled inside the
/// enumerator's inner loop; units already running finish their current step
/// before they observe it.
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Coordinator of one calculation: runs the root enumeration on the calling
/// thread, fans qualifying branches out to a bounded worker pool, harvests
/// their partial results and merges them into the final result.
pub struct Calculator {
    params: CalculationParams,
    num_threads: usize,
    test_mode: bool,
    on_progress: Option<ProgressFn>,
    on_intermediate_result: Option<IntermediateResultFn>,
    cancelled: Arc<AtomicBool>,
}

impl Calculator {
    pub fn new(params: CalculationParams) -> Self {
        Self {
            params,
            num_threads: 1,
            test_mode: false,
            on_progress: None,
            on_intermediate_result: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn params(&self) -> &CalculationParams {
        &self.params
    }

    /// The thread count that will actually be used: the configured hint
    /// clamped to [1, 2 × available processors].
    pub fn num_threads(&self) -> usize {
        let limit = 2 * available_processors();
        self.num_threads.clamp(1, limit)
    }

    pub fn set_num_threads(&mut self, num_threads: usize) {
        self.num_threads = num_threads;
    }

    /// Convenience switch: parallel mode uses all available processors (at
    /// least two), otherwise a single thread.
    pub fn set_mode_parallel(&mut self, parallel: bool) {
        self.set_num_threads(if parallel { available_processors().max(2) } else { 1 });
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// In test mode the enumerator keeps recursing below branches that
    /// already hit the target, producing strictly more filtered redundant
    /// solutions but the same canonical solution set.
    pub fn set_test_mode(&mut self, test_mode: bool) {
        self.test_mode = test_mode;
    }

    /// Registers a progress callback invoked with (current, maximum). The
    /// maximum starts as an a-priori upper bound and is refined to an exact
    /// value once the number of forked units is known; the current value is
    /// monotonically non-decreasing.
    pub fn set_on_progress<F>(&mut self, on_progress: F)
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
    }

    /// Registers a callback invoked once per accepted (non-redundant), not
    /// yet deduplicated candidate, from whichever worker produced it. It
    /// must be safe to call from multiple threads and should return quickly.
    pub fn set_on_intermediate_result<F>(&mut self, on_intermediate_result: F)
    where
        F: Fn(&SolutionCandidate) + Send + Sync + 'static,
    {
        self.on_intermediate_result = Some(Arc::new(on_intermediate_result));
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle { cancelled: Arc::clone(&self.cancelled) }
    }

    /// Requests cooperative cancellation; the result will be marked
    /// cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn num_subtasks_max_on_level(&self, depth: usize) -> u32 {
        let n = self.params.num_operands() as i64 - depth as i64;
        (2 * n * (n - 1)).max(0) as u32
    }

    /// Theoretical upper bound for the progress maximum, derived from the
    /// operand count alone. Published before the search starts.
    pub fn max_progress_value(&self) -> u32 {
        (THRESHOLD_DEPTH_FORK..=THRESHOLD_DEPTH_PROGRESS)
            .map(|depth| self.num_subtasks_max_on_level(depth))
            .product()
    }

    /// Runs the calculation to completion and returns its result.
    ///
    /// Worker units that fail unexpectedly are downgraded to a cancelled
    /// result so sibling results are not lost; running out of memory
    /// discards all collected data and surfaces as
    /// [`CalcError::OutOfMemory`].
    pub fn run(&self) -> Result<CalculationResult, CalcError> {
        info!("starting {} with {} thread(s)", self.params, self.num_threads());
        let ctx = Arc::new(TaskContext::new(
            self.params.target(),
            self.params.num_operands(),
            self.test_mode,
            Arc::clone(&self.cancelled),
            self.on_progress.clone(),
            self.on_intermediate_result.clone(),
        ));
        // Publish the theoretical upper bound as the initial progress
        // maximum; it is refined once the true number of units is known.
        ctx.set_progress_max(self.max_progress_value());

        let num_threads = self.num_threads();
        let executor = (num_threads > 1).then(|| SubTaskExecutor::new(num_threads));
        let (sender, receiver) = mpsc::channel::<UnitOutcome>();

        let operands: Vec<Operand> =
            self.params.operands().iter().map(|&value| Operand::Raw(value)).collect();
        let root = SubTask::root(Arc::clone(&ctx), operands);
        let mut forker = Forker {
            ctx: &ctx,
            executor: executor.as_ref(),
            sender: &sender,
            counter_subtasks: 0,
        };
        let root_outcome = root.run(Some(&mut forker));
        let num_subtasks = forker.counter_subtasks;
        debug!("root enumeration done, harvesting {num_subtasks} unit(s)");
        ctx.set_progress_max(num_subtasks * self.num_subtasks_max_on_level(THRESHOLD_DEPTH_PROGRESS));

        let mut out_of_memory = false;
        let mut unit_failed = false;
        let mut main_result = match root_outcome {
            Ok(result) => result,
            Err(UnitError::OutOfMemory) => {
                out_of_memory = true;
                SubTaskResult::new()
            }
            Err(UnitError::Panicked) => {
                unit_failed = true;
                SubTaskResult::new()
            }
        };
        if out_of_memory {
            ctx.cancel();
        }
        for _ in 0..num_subtasks {
            match receiver.recv() {
                Ok(Ok(sub_result)) => main_result.combine(sub_result),
                Ok(Err(UnitError::OutOfMemory)) => {
                    out_of_memory = true;
                    ctx.cancel();
                }
                Ok(Err(UnitError::Panicked)) => unit_failed = true,
                // Unreachable in practice: every unit reports exactly once.
                Err(_) => {
                    unit_failed = true;
                    break;
                }
            }
        }

        if out_of_memory {
            // No usable result: free every collected candidate before
            // reporting the failure.
            main_result.solution_candidates.clear();
            warn!("{} ran out of memory, discarding all results", self.params);
            return Err(CalcError::OutOfMemory);
        }

        let mut result = CalculationResult::new(self.params.target());
        result.cancelled = self.cancelled.load(Ordering::Relaxed) || unit_failed;
        result.approximation = main_result.approximation.clone();
        result.solutions = collect_solutions(main_result.solution_candidates);
        info!(
            "finished {}: {} solution(s), {} filtered, {} recursion calls",
            self.params,
            result.solutions.len(),
            result.num_filtered_solutions(),
            result.counter_recursion_calls()
        );
        Ok(result)
    }
}

/// Fork sink owned by the coordinating thread. Submission happens only from
/// the un-forked root enumeration, so the unit counter is a plain field.
struct Forker<'a> {
    ctx: &'a Arc<TaskContext>,
    executor: Option<&'a SubTaskExecutor>,
    sender: &'a Sender<UnitOutcome>,
    counter_subtasks: u32,
}

impl ForkSink for Forker<'_> {
    fn submit(&mut self, operands: Vec<Operand>, operations: Vec<Operation>) {
        self.counter_subtasks += 1;
        let task = SubTask::forked(Arc::clone(self.ctx), operands, operations);
        match self.executor {
            Some(executor) => {
                let sender = self.sender.clone();
                executor.execute(move || report_unit(task, &sender));
            }
            // Single-threaded mode: execute the unit right here, no pool
            // machinery involved.
            None => report_unit(task, self.sender),
        }
    }
}

/// Runs one forked unit and pushes its outcome over the completion channel,
/// exactly once, panics included.
fn report_unit(task: SubTask, sender: &Sender<UnitOutcome>) {
    let outcome = catch_unwind(AssertUnwindSafe(|| task.run(None)))
        .unwrap_or(Err(UnitError::Panicked));
    if sender.send(outcome).is_err() {
        debug!("completion receiver gone, dropping unit result");
    }
}

/// Deduplicates candidates into canonical solutions: one representative per
/// equivalence class, the smallest solution of each class. The candidate
/// storage is drained while it is consumed, so its memory is reclaimed
/// during the pass.
pub fn collect_solutions(candidates: ConcatList<SolutionCandidate>) -> BTreeSet<Solution> {
    let mut classes: BTreeMap<EquivalenceClass, Solution> = BTreeMap::new();
    for candidate in candidates {
        let SolutionCandidate { solution, equivalence_class } = candidate;
        match classes.entry(equivalence_class) {
            Entry::Vacant(entry) => {
                entry.insert(solution);
            }
            Entry::Occupied(mut entry) => {
                if solution < *entry.get() {
                    entry.insert(solution);
                }
            }
        }
    }
    classes.into_values().collect()
}

fn available_processors() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}
