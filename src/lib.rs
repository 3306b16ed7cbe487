//! Chiffres - a solver for the "chiffres" numbers game
//!
//! Given a positive integer target and a multiset of positive integer
//! operands, this library finds every irredundant way to combine all
//! operands, pairwise, with the four basic arithmetic operators to reach the
//! target exactly; if no exact combination exists, it reports the closest
//! reachable values below and above the target.

pub mod calc;
pub mod cli;
pub mod collection;

// Re-export the main public API
pub use calc::{
    CalcError, CalculationParams, CalculationResult, Calculator, CancelHandle, Solution,
};
pub use collection::ConcatList;

/// Finds all canonical solutions combining `operands` into `target`.
///
/// This is a convenience function that runs a parallel calculator with
/// default settings.
///
/// # Errors
///
/// Returns an error if the target or any operand is not positive, or if the
/// calculation runs out of memory.
///
/// # Examples
///
/// ```
/// use chiffres::find_solutions;
///
/// let result = find_solutions(7, &[1, 2, 4]).unwrap();
/// assert!(result.is_exact_solution_found());
/// let known: chiffres::Solution = "4+2,@0+1".parse().unwrap();
/// assert!(result.solutions().contains(&known));
/// ```
pub fn find_solutions(target: i32, operands: &[i32]) -> Result<CalculationResult, CalcError> {
    let params = CalculationParams::new(target, operands)?;
    let mut calculator = Calculator::new(params);
    calculator.set_mode_parallel(true);
    calculator.run()
}
