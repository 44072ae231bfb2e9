//! Direct interpreter over the instruction list of a terminal [`State`].
//!
//! Programs are never rendered to text and executed: the parameters are bound
//! to the inputs, every assignment is computed in order and the value of the
//! returned variable is produced.

use anyhow::{bail, Context};

use super::{Instruction, State, Variable};

/// Values of the variables that are bound so far, in declaration order.
struct Environment<'a> {
    bindings: Vec<(&'a Variable, f64)>,
}

impl<'a> Environment<'a> {
    fn lookup(&self, variable: &Variable) -> anyhow::Result<f64> {
        self.bindings
            .iter()
            .rev()
            .find(|(name, _)| *name == variable)
            .map(|&(_, value)| value)
            .with_context(|| format!("variable '{variable}' is used before it is bound"))
    }

    fn bind(&mut self, variable: &'a Variable, value: f64) {
        self.bindings.push((variable, value));
    }
}

/// Runs the program on `inputs`, bound positionally to its parameters.
///
/// Arithmetic follows IEEE-754: division by zero is not an error, the result
/// is simply non-finite.
///
/// # Errors
///
/// Fails if the program is not terminal, the number of inputs does not match
/// the number of parameters or a variable is used before it is bound.
pub fn run(state: &State, inputs: &[f64]) -> anyhow::Result<f64> {
    if !state.is_terminal() {
        bail!("only complete programs can be executed");
    }
    if inputs.len() != state.params().len() {
        bail!(
            "expected {} inputs, got {}",
            state.params().len(),
            inputs.len()
        );
    }
    let mut environment = Environment {
        bindings: state.params().iter().zip(inputs.iter().copied()).collect(),
    };
    for instruction in state.instructions() {
        match instruction {
            Instruction::Assign {
                target,
                op,
                lhs,
                rhs,
            } => {
                let value = op.apply(environment.lookup(lhs)?, environment.lookup(rhs)?);
                environment.bind(target, value);
            },
            Instruction::Return(variable) => return environment.lookup(variable),
        }
    }
    unreachable!("terminal programs end with a return")
}
