use std::cmp::Ordering;
use std::collections::TryReserveError;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::errors::SolutionParseError;
use super::operand::{Operand, Operation};
use super::operator::Operator;

static EXPRESSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(@?)(\d+)\s*([-+*/])\s*(@?)(\d+)\s*$").expect("expression pattern compiles")
});

/// A complete calculation: an ordered stack of operations reducing the
/// operand multiset to one final value.
///
/// Redundancy is computed once at construction and cached. Ordering and
/// equality compare stack depth first, then the operations elementwise in
/// construction order; deduplication of solutions must go through
/// [`EquivalenceClass`] instead, which ignores construction order.
#[derive(Debug, Clone)]
pub struct Solution {
    operations: Vec<Operation>,
    redundant: bool,
}

impl Solution {
    /// Builds a solution from the enumerator's operation stack. The slice
    /// must be non-empty.
    pub(crate) fn from_stack(operations: &[Operation]) -> Self {
        debug_assert!(!operations.is_empty());
        let operations = operations.to_vec();
        let redundant = calc_redundancy(&operations);
        Self { operations, redundant }
    }

    /// Fallible variant of [`from_stack`](Self::from_stack) used on the hot
    /// path, where an allocation failure must surface as an out-of-memory
    /// condition instead of aborting the process.
    pub(crate) fn try_from_stack(operations: &[Operation]) -> Result<Self, TryReserveError> {
        debug_assert!(!operations.is_empty());
        let mut copied = Vec::new();
        copied.try_reserve_exact(operations.len())?;
        copied.extend_from_slice(operations);
        let redundant = calc_redundancy(&copied);
        Ok(Self { operations: copied, redundant })
    }

    /// The number of operations in the stack.
    pub fn depth(&self) -> usize {
        self.operations.len()
    }

    pub fn operation(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The last operation of the stack, i.e. the root of the operation tree.
    pub fn root_operation(&self) -> &Operation {
        &self.operations[self.operations.len() - 1]
    }

    /// The final value of the whole calculation.
    pub fn value(&self) -> i32 {
        self.root_operation().value
    }

    /// True if some operation can be dropped while the final value remains
    /// reconstructible from the rest.
    pub fn is_redundant(&self) -> bool {
        self.redundant
    }

    /// The canonical (sorted) form of this solution's operation multiset.
    pub fn equivalence_class(&self) -> EquivalenceClass {
        let mut operations = self.operations.clone();
        operations.sort_unstable();
        EquivalenceClass { operations }
    }
}

/// Canonical form of a solution used for deduplication: the same operations,
/// sorted. Two solutions are considered the same exactly when their classes
/// are equal, regardless of the order the operations were chosen in.
///
/// This is intentionally coarser than tree-shape equality: solutions that
/// perform the same set of elementary (operator, larger value, smaller
/// value) steps coincide even when referenced sub-results were computed
/// differently.
#[derive(Debug, Clone)]
pub struct EquivalenceClass {
    operations: Vec<Operation>,
}

impl EquivalenceClass {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

fn compare_stacks(a: &[Operation], b: &[Operation]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        for (x, y) in a.iter().zip(b) {
            let ordering = x.cmp(y);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    })
}

impl Ord for Solution {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_stacks(&self.operations, &other.operations)
    }
}

impl PartialOrd for Solution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Solution {}

impl Ord for EquivalenceClass {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_stacks(&self.operations, &other.operations)
    }
}

impl PartialOrd for EquivalenceClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EquivalenceClass {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EquivalenceClass {}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, operation) in self.operations.iter().enumerate().rev() {
            writeln!(f)?;
            write!(f, "Operation {:2} : {}", index + 1, operation)?;
        }
        Ok(())
    }
}

/// Checks whether the stack can be reduced by dropping some operation.
fn calc_redundancy(operations: &[Operation]) -> bool {
    let value = operations[operations.len() - 1].value;
    (0..operations.len()).any(|selected| {
        let reduced = drop_with_identities(operations, selected);
        let redundant = reduce(value, &reduced).is_some();
        if redundant {
            debug!("solution is redundant without operation {selected}");
        }
        redundant
    })
}

/// Removes the selected operation, substituting trivial identity operations
/// (`x + 0 = x`) for its non-derived operands so their raw values stay
/// available to the reconstruction.
fn drop_with_identities(operations: &[Operation], selected: usize) -> Vec<Operation> {
    let dropped = &operations[selected];
    let mut result = Vec::with_capacity(operations.len() + 1);
    if !dropped.operand1.is_derived() {
        result.push(Operation::identity(dropped.operand1.value()));
    }
    if !dropped.operand2.is_derived() {
        result.push(Operation::identity(dropped.operand2.value()));
    }
    result.extend(
        operations
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != selected)
            .map(|(_, operation)| *operation),
    );
    result
}

/// Reconstructs a calculation producing `value` from the given operations,
/// returning the operations left over on success.
///
/// Commits to the first operation whose result matches and does not
/// backtrack to alternative same-valued operations when a nested
/// reconstruction fails afterwards. Downstream solution sets depend on this
/// exact behavior.
fn reduce(value: i32, operations: &[Operation]) -> Option<Vec<Operation>> {
    let index = operations.iter().position(|op| op.value == value)?;
    let operation = operations[index];
    let mut remaining = Vec::with_capacity(operations.len() - 1);
    remaining.extend_from_slice(&operations[..index]);
    remaining.extend_from_slice(&operations[index + 1..]);
    let remaining = if operation.operand1.is_derived() {
        reduce(operation.operand1.value(), &remaining)?
    } else {
        remaining
    };
    let remaining = if operation.operand2.is_derived() {
        reduce(operation.operand2.value(), &remaining)?
    } else {
        remaining
    };
    Some(remaining)
}

fn parse_operand(
    is_reference: bool,
    number: i32,
    index: usize,
    expression: &str,
    operations: &[Operation],
) -> Result<Operand, SolutionParseError> {
    if is_reference {
        let reference = number as usize;
        if reference >= index {
            return Err(SolutionParseError::ForwardReference {
                reference: number,
                expression: expression.to_string(),
                index,
            });
        }
        Ok(Operand::Derived { op: reference, value: operations[reference].value })
    } else {
        Ok(Operand::Raw(number))
    }
}

impl FromStr for Solution {
    type Err = SolutionParseError;

    /// Parses the compact textual form used by tests and tooling. For
    /// example `"3*7,@0+4"` describes two operations, the second adding 4 to
    /// the first's result (referenced via `@0`) for a final value of 25.
    /// References must point at an earlier operation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut operations: Vec<Operation> = Vec::new();
        for (index, expression) in s.split(',').enumerate() {
            let captures = EXPRESSION_PATTERN
                .captures(expression)
                .ok_or_else(|| SolutionParseError::InvalidExpression(expression.to_string()))?;
            let number1: i32 = captures[2]
                .parse()
                .map_err(|_| SolutionParseError::InvalidExpression(expression.to_string()))?;
            let number2: i32 = captures[5]
                .parse()
                .map_err(|_| SolutionParseError::InvalidExpression(expression.to_string()))?;
            let operator = match &captures[3] {
                "+" => Operator::Add,
                "-" => Operator::Sub,
                "*" => Operator::Mul,
                "/" => Operator::Div,
                _ => return Err(SolutionParseError::InvalidExpression(expression.to_string())),
            };
            let mut operand1 =
                parse_operand(!captures[1].is_empty(), number1, index, expression, &operations)?;
            let mut operand2 =
                parse_operand(!captures[4].is_empty(), number2, index, expression, &operations)?;
            if operand2.value() > operand1.value() {
                std::mem::swap(&mut operand1, &mut operand2);
            }
            let value = operator.calculate(operand1.value(), operand2.value());
            operations.push(Operation::new(operand1, operator, operand2, value));
        }
        if operations.is_empty() {
            return Err(SolutionParseError::InvalidExpression(s.to_string()));
        }
        let redundant = calc_redundancy(&operations);
        Ok(Self { operations, redundant })
    }
}
