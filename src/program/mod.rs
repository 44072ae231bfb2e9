//! Straight-line programs in [Static Single-Assignment] form and the
//! transition model the search walks through.
//!
//! A [`State`] is a partial program: a chain of assignments, each introducing
//! exactly one new temporary, optionally terminated by a single `return`.
//! [`State::next_states`] enumerates every legal one-instruction extension in
//! a fixed order, which makes tie-breaking in the search reproducible.
//!
//! [Static Single-Assignment]: https://en.wikipedia.org/wiki/Static_single-assignment_form

use std::rc::Rc;

pub mod interpreter;
mod render;

/// Default cap on the number of instructions a program may contain before
/// only `return` extensions are allowed.
pub const DEFAULT_MAX_INSTRUCTIONS: usize = 10;

/// Prefix of the temporaries introduced by assignments (`t0`, `t1`, ...).
const TEMPORARY_PREFIX: char = 't';

/// Name of a function parameter or a temporary. Cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable(Rc<str>);

impl Variable {
    /// Creates a variable with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    /// Creates the `index`-th temporary.
    #[must_use]
    pub fn temporary(index: usize) -> Self {
        Self(Rc::from(format!("{TEMPORARY_PREFIX}{index}")))
    }

    /// Returns `true` if `name` would collide with the names of temporaries.
    #[must_use]
    pub fn is_temporary_name(name: &str) -> bool {
        name.strip_prefix(TEMPORARY_PREFIX)
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Binary arithmetic operator of an assignment.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// All operators in enumeration order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    /// Applies the operator with IEEE-754 semantics: division by zero produces
    /// an infinity or NaN instead of failing.
    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }
}

/// A single statement of the program body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `target = lhs op rhs`, where `target` is a fresh temporary.
    Assign {
        #[allow(missing_docs)]
        target: Variable,
        #[allow(missing_docs)]
        op: Operator,
        #[allow(missing_docs)]
        lhs: Variable,
        #[allow(missing_docs)]
        rhs: Variable,
    },
    /// Completes the program.
    Return(Variable),
}

/// Partial program. States are immutable: transitions produce new states.
///
/// Invariant: `variables().len() == params().len() + assignments()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    params: Rc<[Variable]>,
    instructions: Vec<Instruction>,
    variables: Vec<Variable>,
}

impl State {
    /// Creates an empty program over `params`.
    #[must_use]
    pub fn initial(params: impl IntoIterator<Item = Variable>) -> Self {
        let params: Rc<[Variable]> = params.into_iter().collect();
        let variables = params.to_vec();
        Self {
            params,
            instructions: Vec::new(),
            variables,
        }
    }

    /// Parameters of the synthesized function, fixed for the whole search.
    #[must_use]
    pub fn params(&self) -> &[Variable] {
        &self.params
    }

    /// Instructions emitted so far.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Parameters followed by the temporaries introduced so far.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of assignment instructions.
    #[must_use]
    pub fn assignments(&self) -> usize {
        self.variables.len() - self.params.len()
    }

    /// A state is terminal once it ends with a `return`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.instructions.last(), Some(Instruction::Return(_)))
    }

    /// The variable returned by a terminal state.
    #[must_use]
    pub fn returned(&self) -> Option<&Variable> {
        match self.instructions.last() {
            Some(Instruction::Return(variable)) => Some(variable),
            _ => None,
        }
    }

    /// Name of the temporary the next assignment introduces. Derived from the
    /// number of existing temporaries, so names never collide.
    #[must_use]
    pub fn next_variable(&self) -> Variable {
        Variable::temporary(self.assignments())
    }

    /// Number of operand pairs `(i, j)` with `i <= j` over the variables.
    fn operand_pairs(&self) -> usize {
        let n = self.variables.len();
        n * (n + 1) / 2
    }

    fn can_assign(&self, max_instructions: usize) -> bool {
        self.instructions.len() < max_instructions
    }

    /// Number of states [`Self::next_states`] would produce.
    #[must_use]
    pub fn successor_count(&self, max_instructions: usize) -> usize {
        if self.is_terminal() {
            return 0;
        }
        let assignments = if self.can_assign(max_instructions) {
            self.operand_pairs() * Operator::ALL.len()
        } else {
            0
        };
        assignments + self.variables.len()
    }

    /// Builds the `index`-th element of [`Self::next_states`] without
    /// materializing the others.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.successor_count(max_instructions)`.
    #[must_use]
    pub fn successor(&self, index: usize, max_instructions: usize) -> Self {
        assert!(
            index < self.successor_count(max_instructions),
            "successor {index} is out of range"
        );
        let assignments = if self.can_assign(max_instructions) {
            self.operand_pairs() * Operator::ALL.len()
        } else {
            0
        };
        if index < assignments {
            let (i, j) = self.operand_pair(index / Operator::ALL.len());
            let op = Operator::ALL[index % Operator::ALL.len()];
            self.assign(op, i, j)
        } else {
            self.ret(index - assignments)
        }
    }

    /// Every legal one-instruction extension: all assignments (while below
    /// `max_instructions`) ordered by operand pair and then operator, followed
    /// by a `return` of each variable. Terminal states have no successors.
    #[must_use]
    pub fn next_states(&self, max_instructions: usize) -> Vec<Self> {
        (0..self.successor_count(max_instructions))
            .map(|index| self.successor(index, max_instructions))
            .collect()
    }

    /// Maps a pair ordinal to operand indices `(i, j)`, `i <= j`, enumerated
    /// row by row.
    fn operand_pair(&self, mut ordinal: usize) -> (usize, usize) {
        let n = self.variables.len();
        for i in 0..n {
            let row = n - i;
            if ordinal < row {
                return (i, i + ordinal);
            }
            ordinal -= row;
        }
        unreachable!("operand pair ordinal is out of range")
    }

    fn assign(&self, op: Operator, lhs: usize, rhs: usize) -> Self {
        let target = self.next_variable();
        let mut instructions = self.instructions.clone();
        instructions.push(Instruction::Assign {
            target: target.clone(),
            op,
            lhs: self.variables[lhs].clone(),
            rhs: self.variables[rhs].clone(),
        });
        let mut variables = self.variables.clone();
        variables.push(target);
        Self {
            params: Rc::clone(&self.params),
            instructions,
            variables,
        }
    }

    fn ret(&self, variable: usize) -> Self {
        let mut instructions = self.instructions.clone();
        instructions.push(Instruction::Return(self.variables[variable].clone()));
        Self {
            params: Rc::clone(&self.params),
            instructions,
            variables: self.variables.clone(),
        }
    }
}
