use std::cmp::Ordering;
use std::fmt;

use super::operator::Operator;

/// A value available to the search: either one of the request's raw operands
/// or the result of an earlier operation in the same solution stack,
/// referenced by its index there.
///
/// Comparisons throughout the crate look only at the numeric value and the
/// derived flag; the index exists so collaborators can rebuild the operation
/// tree without pointer aliasing.
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    Raw(i32),
    Derived { op: usize, value: i32 },
}

impl Operand {
    pub fn value(self) -> i32 {
        match self {
            Operand::Raw(value) => value,
            Operand::Derived { value, .. } => value,
        }
    }

    /// True if this operand was calculated rather than originally given.
    pub fn is_derived(self) -> bool {
        matches!(self, Operand::Derived { .. })
    }

    /// Index of the producing operation within the solution stack, if any.
    pub fn operation_index(self) -> Option<usize> {
        match self {
            Operand::Raw(_) => None,
            Operand::Derived { op, .. } => Some(op),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// A single binary arithmetic step: `operand1 operator operand2 = value`,
/// with `operand1.value() >= operand2.value()` (canonical orientation).
///
/// Ordering and equality are lexicographic on (operator, operand1 value,
/// operand2 value). The result value and any derived-operand indices do not
/// participate, so two steps performing the same elementary calculation
/// compare equal no matter how their inputs were obtained.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub(crate) operand1: Operand,
    pub(crate) operator: Operator,
    pub(crate) operand2: Operand,
    pub(crate) value: i32,
}

impl Operation {
    pub(crate) fn new(operand1: Operand, operator: Operator, operand2: Operand, value: i32) -> Self {
        Self { operand1, operator, operand2, value }
    }

    /// Trivial identity operation `value + 0 = value`, used by the redundancy
    /// check to keep a dropped operation's raw operands available.
    pub(crate) fn identity(value: i32) -> Self {
        Self::new(Operand::Raw(value), Operator::Add, Operand::Raw(0), value)
    }

    pub fn operand1(&self) -> Operand {
        self.operand1
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand2(&self) -> Operand {
        self.operand2
    }

    /// The result of this step.
    pub fn value(&self) -> i32 {
        self.value
    }
}

impl Ord for Operation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.operator
            .cmp(&other.operator)
            .then_with(|| self.operand1.value().cmp(&other.operand1.value()))
            .then_with(|| self.operand2.value().cmp(&other.operand2.value()))
    }
}

impl PartialOrd for Operation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Operation {}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} = {}",
            self.operand1.value(),
            self.operator,
            self.operand2.value(),
            self.value
        )
    }
}
