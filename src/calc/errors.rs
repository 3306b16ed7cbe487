use thiserror::Error;

/// Errors raised when setting up or running a calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("target must be greater than zero, got {0}")]
    InvalidTarget(i32),
    #[error("operands must be greater than zero, got {0}")]
    InvalidOperand(i32),
    #[error("at least one operand is required")]
    NoOperands,
    #[error("calculation ran out of memory")]
    OutOfMemory,
}

/// Errors from parsing the textual solution format (e.g. `"3*7,@0+4"`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolutionParseError {
    #[error("invalid solution expression: '{0}'")]
    InvalidExpression(String),
    #[error("invalid forward reference @{reference} in expression {expression} at index {index}")]
    ForwardReference {
        reference: i32,
        expression: String,
        index: usize,
    },
}
