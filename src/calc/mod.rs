//! The search-and-aggregation core: arithmetic domain model, solution and
//! equivalence engine, recursive enumerator and concurrency coordinator.

mod calculator;
mod errors;
mod executor;
mod operand;
mod operator;
mod params;
mod result;
mod search;
mod solution;

pub use calculator::{CancelHandle, Calculator, collect_solutions};
pub use errors::{CalcError, SolutionParseError};
pub use operand::{Operand, Operation};
pub use operator::Operator;
pub use params::CalculationParams;
pub use result::{CalculationResult, SolutionCandidate};
pub use solution::{EquivalenceClass, Solution};
