use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::operand::{Operand, Operation};
use super::operator::Operator;
use super::result::{SolutionCandidate, SubTaskResult};
use super::solution::Solution;

/// Recursion depth at which branches are handed to the worker pool instead
/// of recursing in-thread. Exactly one fork layer exists; deeper recursion
/// never forks again.
pub(crate) const THRESHOLD_DEPTH_FORK: usize = 0;
/// Recursion depth at which the shared progress counter is incremented.
pub(crate) const THRESHOLD_DEPTH_PROGRESS: usize = THRESHOLD_DEPTH_FORK + 1;

pub(crate) type ProgressFn = Arc<dyn Fn(u32, u32) + Send + Sync>;
pub(crate) type IntermediateResultFn = Arc<dyn Fn(&SolutionCandidate) + Send + Sync>;

/// Why a search unit did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitError {
    OutOfMemory,
    Panicked,
}

/// Outcome of one search unit, as pushed over the completion channel.
pub(crate) type UnitOutcome = Result<SubTaskResult, UnitError>;

struct Progress {
    counter: u32,
    max: u32,
}

/// State shared by the coordinator and all search units: the immutable
/// request data, the cancellation flag and the progress counter.
///
/// The progress counter is the only cross-thread read-modify-write state; it
/// stays behind a mutex so the (current, maximum) pair reported to the
/// callback is always consistent. The cancellation flag is advisory and
/// polled in the enumerator's inner loop.
pub(crate) struct TaskContext {
    pub(crate) target: i32,
    pub(crate) num_operands: usize,
    pub(crate) test_mode: bool,
    cancelled: Arc<AtomicBool>,
    progress: Mutex<Progress>,
    on_progress: Option<ProgressFn>,
    pub(crate) on_intermediate_result: Option<IntermediateResultFn>,
}

impl TaskContext {
    pub(crate) fn new(
        target: i32,
        num_operands: usize,
        test_mode: bool,
        cancelled: Arc<AtomicBool>,
        on_progress: Option<ProgressFn>,
        on_intermediate_result: Option<IntermediateResultFn>,
    ) -> Self {
        Self {
            target,
            num_operands,
            test_mode,
            cancelled,
            progress: Mutex::new(Progress { counter: 0, max: 0 }),
            on_progress,
            on_intermediate_result,
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub(crate) fn set_progress_max(&self, max: u32) {
        let mut progress = self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        progress.max = max;
    }

    fn increment_progress(&self) {
        if let Some(on_progress) = &self.on_progress {
            let mut progress =
                self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            progress.counter += 1;
            on_progress(progress.counter, progress.max);
        }
    }
}

/// Sink for branches forked at [`THRESHOLD_DEPTH_FORK`]. Only the root unit,
/// running on the coordinating thread, ever submits, so implementations need
/// no synchronization for their submission counter.
pub(crate) trait ForkSink {
    fn submit(&mut self, operands: Vec<Operand>, operations: Vec<Operation>);
}

/// One unit of search work: the currently available operands plus the
/// operation stack accumulated so far.
///
/// The root unit runs on the calling thread and owns the fork sink; forked
/// units enumerate to completion without forking again.
pub(crate) struct SubTask {
    ctx: Arc<TaskContext>,
    operands: Vec<Operand>,
    operations: Vec<Operation>,
    result: SubTaskResult,
}

impl SubTask {
    /// Unit covering the whole search, starting from the raw operands.
    pub(crate) fn root(ctx: Arc<TaskContext>, operands: Vec<Operand>) -> Self {
        let capacity = operands.len().saturating_sub(1);
        Self { ctx, operands, operations: Vec::with_capacity(capacity), result: SubTaskResult::new() }
    }

    /// Forked continuation of a branch: reduced operand list plus the
    /// operations already performed.
    pub(crate) fn forked(
        ctx: Arc<TaskContext>,
        operands: Vec<Operand>,
        operations: Vec<Operation>,
    ) -> Self {
        Self { ctx, operands, operations, result: SubTaskResult::new() }
    }

    pub(crate) fn run(mut self, mut forker: Option<&mut dyn ForkSink>) -> UnitOutcome {
        let operands = std::mem::take(&mut self.operands);
        self.calculate(&operands, &mut forker)?;
        Ok(self.result)
    }

    fn calculate(
        &mut self,
        operands: &[Operand],
        forker: &mut Option<&mut dyn ForkSink>,
    ) -> Result<(), UnitError> {
        self.result.approximation.counter_recursion_calls += 1;
        let depth = self.ctx.num_operands - operands.len();
        let num_op = operands.len();
        let num_op_decr = num_op.saturating_sub(1);
        for i in 0..num_op_decr {
            for k in (i + 1)..num_op {
                if self.ctx.is_cancelled() {
                    break;
                }
                let (op1, op2) = if operands[i].value() > operands[k].value() {
                    (operands[i], operands[k])
                } else {
                    (operands[k], operands[i])
                };
                for operator in Operator::ALL {
                    let result = operator.calculate(op1.value(), op2.value());
                    self.operations.truncate(depth);
                    self.operations.push(Operation::new(op1, operator, op2, result));
                    if result > 0 {
                        let target_found = result == self.ctx.target;
                        if target_found {
                            self.result.approximation.exact_solution_found = true;
                            let solution = Solution::try_from_stack(&self.operations[..=depth])
                                .map_err(|_| UnitError::OutOfMemory)?;
                            if solution.is_redundant() {
                                self.result.approximation.num_filtered_solutions += 1;
                            } else {
                                let candidate = SolutionCandidate::new(solution);
                                if let Some(on_intermediate) = &self.ctx.on_intermediate_result {
                                    on_intermediate(&candidate);
                                }
                                self.result.solution_candidates.push_back(candidate);
                            }
                        }
                        if !target_found || self.ctx.test_mode {
                            // Track every valid intermediate value, at any
                            // depth, until this unit has seen an exact hit.
                            if !self.result.approximation.exact_solution_found {
                                if result < self.ctx.target {
                                    let diff = self.ctx.target - result;
                                    if diff < self.result.approximation.diff_less {
                                        self.result.approximation.diff_less = diff;
                                    }
                                } else {
                                    let diff = result - self.ctx.target;
                                    if diff < self.result.approximation.diff_greater {
                                        self.result.approximation.diff_greater = diff;
                                    }
                                }
                            }
                            if num_op_decr > 1 {
                                let mut operands_recursion = Vec::with_capacity(num_op_decr);
                                for m in 0..num_op_decr {
                                    operands_recursion.push(if m == i {
                                        Operand::Derived { op: depth, value: result }
                                    } else if m == k {
                                        operands[num_op_decr]
                                    } else {
                                        operands[m]
                                    });
                                }
                                if depth == THRESHOLD_DEPTH_FORK
                                    && let Some(sink) = forker.as_mut()
                                {
                                    sink.submit(operands_recursion, self.operations.clone());
                                } else {
                                    self.calculate(&operands_recursion, forker)?;
                                }
                            }
                        }
                    }
                    if depth == THRESHOLD_DEPTH_PROGRESS {
                        self.ctx.increment_progress();
                    }
                }
            }
        }
        Ok(())
    }
}
