use std::fmt;

/// The four binary arithmetic operators, in their canonical comparison and
/// enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// All operators in the order the enumerator tries them.
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    /// Applies the operator to two operands with `operand1 >= operand2 >= 1`.
    ///
    /// Returns 0 for overflow past `i32::MAX`, for division by zero and for
    /// non-exact division. A return value of 0 always signals "discard this
    /// candidate" to the search: every raw operand is at least 1 and every
    /// kept derived value must stay positive, so 0 is never a meaningful
    /// result.
    pub fn calculate(self, operand1: i32, operand2: i32) -> i32 {
        match self {
            Operator::Add => {
                let value = i64::from(operand1) + i64::from(operand2);
                if value <= i64::from(i32::MAX) { value as i32 } else { 0 }
            }
            Operator::Sub => operand1 - operand2,
            Operator::Mul => {
                let value = i64::from(operand1) * i64::from(operand2);
                if value <= i64::from(i32::MAX) { value as i32 } else { 0 }
            }
            Operator::Div => {
                if operand2 == 0 {
                    0
                } else if operand1 % operand2 == 0 {
                    operand1 / operand2
                } else {
                    0
                }
            }
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
