use std::collections::BTreeSet;

use crate::collection::ConcatList;

use super::solution::{EquivalenceClass, Solution};

/// Sentinel for "no approximation seen yet".
pub(crate) const INITIAL_DIFF: i32 = i32::MAX;

/// Approximation and counter statistics of a (partial) search.
///
/// Combinable as a monoid when merging per-unit results: minimum on the
/// diffs, OR on the exact flag, sum on the counters. [`Self::new`] is the
/// identity.
#[derive(Debug, Clone)]
pub(crate) struct ApproximationInfo {
    pub(crate) diff_less: i32,
    pub(crate) diff_greater: i32,
    pub(crate) exact_solution_found: bool,
    pub(crate) num_filtered_solutions: u32,
    pub(crate) counter_recursion_calls: u64,
}

impl ApproximationInfo {
    pub(crate) fn new() -> Self {
        Self {
            diff_less: INITIAL_DIFF,
            diff_greater: INITIAL_DIFF,
            exact_solution_found: false,
            num_filtered_solutions: 0,
            counter_recursion_calls: 0,
        }
    }

    pub(crate) fn combine(&mut self, other: &ApproximationInfo) {
        if other.diff_less < self.diff_less {
            self.diff_less = other.diff_less;
        }
        if other.diff_greater < self.diff_greater {
            self.diff_greater = other.diff_greater;
        }
        self.exact_solution_found |= other.exact_solution_found;
        self.num_filtered_solutions += other.num_filtered_solutions;
        self.counter_recursion_calls += other.counter_recursion_calls;
    }
}

impl Default for ApproximationInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// A freshly found solution together with its equivalence class.
///
/// The class is computed eagerly in the worker that produced the solution,
/// so the single-threaded final merge does not have to recompute it.
#[derive(Debug, Clone)]
pub struct SolutionCandidate {
    pub(crate) solution: Solution,
    pub(crate) equivalence_class: EquivalenceClass,
}

impl SolutionCandidate {
    pub(crate) fn new(solution: Solution) -> Self {
        let equivalence_class = solution.equivalence_class();
        Self { solution, equivalence_class }
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn equivalence_class(&self) -> &EquivalenceClass {
        &self.equivalence_class
    }
}

/// Partial result of one search unit: its approximation statistics plus its
/// private candidate buffer. Combining splices the buffers in O(1), which
/// keeps the fan-in merge proportional to the number of units rather than
/// the number of candidates.
#[derive(Debug, Default)]
pub(crate) struct SubTaskResult {
    pub(crate) approximation: ApproximationInfo,
    pub(crate) solution_candidates: ConcatList<SolutionCandidate>,
}

impl SubTaskResult {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn combine(&mut self, mut other: SubTaskResult) {
        self.approximation.combine(&other.approximation);
        self.solution_candidates.append(&mut other.solution_candidates);
    }
}

/// The outcome of a calculation. Created once per request, filled by the
/// coordinating thread during the merge, immutable once returned.
#[derive(Debug)]
pub struct CalculationResult {
    pub(crate) target: i32,
    pub(crate) solutions: BTreeSet<Solution>,
    pub(crate) approximation: ApproximationInfo,
    pub(crate) cancelled: bool,
    pub(crate) out_of_memory: bool,
}

impl CalculationResult {
    pub(crate) fn new(target: i32) -> Self {
        Self {
            target,
            solutions: BTreeSet::new(),
            approximation: ApproximationInfo::new(),
            cancelled: false,
            out_of_memory: false,
        }
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    /// The canonical solutions found, one representative per equivalence
    /// class, in solution order.
    pub fn solutions(&self) -> &BTreeSet<Solution> {
        &self.solutions
    }

    pub fn is_exact_solution_found(&self) -> bool {
        self.approximation.exact_solution_found
    }

    /// 0 once an exact solution was found, otherwise the distance to the
    /// best reachable value below the target.
    pub fn diff_less(&self) -> i32 {
        if self.is_exact_solution_found() { 0 } else { self.approximation.diff_less }
    }

    /// The best reachable value below the target. Meaningful only when
    /// [`Self::is_lower_approximation_possible`] is true.
    pub fn lower_approximation(&self) -> i32 {
        self.target - self.diff_less()
    }

    pub fn is_lower_approximation_possible(&self) -> bool {
        self.is_exact_solution_found() || self.approximation.diff_less < INITIAL_DIFF
    }

    /// 0 once an exact solution was found, otherwise the distance to the
    /// best reachable value above the target.
    pub fn diff_greater(&self) -> i32 {
        if self.is_exact_solution_found() { 0 } else { self.approximation.diff_greater }
    }

    /// The best reachable value above the target, or -1 if no value above
    /// the target is reachable.
    pub fn upper_approximation(&self) -> i32 {
        if self.is_upper_approximation_possible() {
            self.target + self.diff_greater()
        } else {
            -1
        }
    }

    pub fn is_upper_approximation_possible(&self) -> bool {
        self.is_exact_solution_found() || self.approximation.diff_greater < INITIAL_DIFF
    }

    /// The number of redundant solutions that were filtered out.
    pub fn num_filtered_solutions(&self) -> u32 {
        self.approximation.num_filtered_solutions
    }

    /// The number of recursive enumeration calls across all units.
    pub fn counter_recursion_calls(&self) -> u64 {
        self.approximation.counter_recursion_calls
    }

    /// True if the calculation was cancelled; the results are incomplete.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True if the calculation ran out of memory. All solution data has been
    /// discarded in that case and [`Self::is_cancelled`] is also true.
    pub fn is_out_of_memory(&self) -> bool {
        self.out_of_memory
    }
}
