//! Printable surface syntax of programs. Only used for reporting: the search
//! and the evaluation work on [`State`] directly.

use std::fmt;

use itertools::Itertools;

use super::{Instruction, Operator, State, Variable};

/// Name of the rendered function.
const FUNCTION_NAME: &str = "f";

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign {
                target,
                op,
                lhs,
                rhs,
            } => write!(f, "const {target} = {lhs} {op} {rhs};"),
            Self::Return(variable) => write!(f, "return {variable};"),
        }
    }
}

impl fmt::Display for State {
    /// Renders the program as a function declaration:
    ///
    /// ```text
    /// function f(a, b) {
    ///   const t0 = a + b;
    ///   return t0;
    /// }
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "function {FUNCTION_NAME}({}) {{",
            self.params().iter().join(", ")
        )?;
        for instruction in self.instructions() {
            writeln!(f, "  {instruction}")?;
        }
        write!(f, "}}")
    }
}
