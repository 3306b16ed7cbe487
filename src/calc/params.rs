use std::fmt;

use log::warn;

use super::errors::CalcError;

/// Validated parameters of a calculation: the target value and the operand
/// multiset, in the order given by the caller.
///
/// Construction rejects non-positive values; an invalid request is a
/// configuration error, never a search failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationParams {
    target: i32,
    operands: Vec<i32>,
}

impl CalculationParams {
    pub fn new(target: i32, operands: &[i32]) -> Result<Self, CalcError> {
        if target < 1 {
            warn!("rejecting request with non-positive target {target}");
            return Err(CalcError::InvalidTarget(target));
        }
        if operands.is_empty() {
            warn!("rejecting request without operands");
            return Err(CalcError::NoOperands);
        }
        if let Some(&bad) = operands.iter().find(|&&operand| operand < 1) {
            warn!("rejecting request with non-positive operand {bad}");
            return Err(CalcError::InvalidOperand(bad));
        }
        Ok(Self { target, operands: operands.to_vec() })
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    pub fn operand(&self, index: usize) -> Option<i32> {
        self.operands.get(index).copied()
    }

    pub fn operands(&self) -> &[i32] {
        &self.operands
    }
}

impl fmt::Display for CalculationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Calculation ({} | {:?})", self.target, self.operands)
    }
}
