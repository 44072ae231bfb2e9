use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use itertools::Itertools;

use super::{Evaluator, Reward};
use crate::program::{interpreter, State};

/// Input values for each parameter (in order) and the expected result.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    inputs: Vec<f64>,
    output: f64,
}

impl Example {
    /// Creates an example.
    ///
    /// # Errors
    ///
    /// Fails if there are no inputs or any of the values is not finite.
    pub fn new(inputs: Vec<f64>, output: f64) -> anyhow::Result<Self> {
        if inputs.is_empty() {
            bail!("example should have at least one input");
        }
        if let Some(value) = inputs.iter().chain([&output]).find(|value| !value.is_finite()) {
            bail!("example values should be finite, got {value}");
        }
        Ok(Self { inputs, output })
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Returns `true` if `state` produces exactly the expected output.
    // Programs have to reproduce the output exactly.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_satisfied_by(&self, state: &State) -> bool {
        interpreter::run(state, &self.inputs).is_ok_and(|result| result == self.output)
    }
}

impl FromStr for Example {
    type Err = anyhow::Error;

    /// Parses `<input>,<input>,...=<output>`, e.g. `2,3=5`.
    fn from_str(input: &str) -> anyhow::Result<Self> {
        let Some((inputs, output)) = input.trim().split_once('=') else {
            bail!("example should look like '2,3=5', got '{input}'");
        };
        let inputs = inputs
            .split(',')
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid input value '{value}' in '{input}'"))
            })
            .collect::<anyhow::Result<Vec<f64>>>()?;
        let output = output
            .trim()
            .parse()
            .with_context(|| format!("invalid output value '{output}' in '{input}'"))?;
        Self::new(inputs, output)
    }
}

impl fmt::Display for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.inputs.iter().join(","), self.output)
    }
}

/// A fixed set of examples the synthesized program should reproduce.
///
/// The reward of a program is `1 - n` plus one point per satisfied example,
/// where `n` is the number of examples: a program satisfying all of them gets
/// `1`, one satisfying none gets `1 - n`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExampleSuite {
    examples: Vec<Example>,
}

impl ExampleSuite {
    /// Creates a suite.
    ///
    /// # Errors
    ///
    /// Fails if there are no examples or they don't agree on the number of
    /// inputs.
    pub fn new(examples: Vec<Example>) -> anyhow::Result<Self> {
        let Some(first) = examples.first() else {
            bail!("example suite should not be empty");
        };
        let arity = first.inputs.len();
        if let Some(example) = examples.iter().find(|e| e.inputs.len() != arity) {
            bail!(
                "all examples should have {arity} inputs, got {} in '{example}'",
                example.inputs.len()
            );
        }
        Ok(Self { examples })
    }

    /// `{(2, 2) -> 4, (2, 3) -> 5, (3, 2) -> 5, (3, 3) -> 6}`: addition is the
    /// only single operation consistent with all four examples.
    #[must_use]
    pub fn addition() -> Self {
        Self {
            examples: [([2.0, 2.0], 4.0), ([2.0, 3.0], 5.0), ([3.0, 2.0], 5.0), ([3.0, 3.0], 6.0)]
                .into_iter()
                .map(|(inputs, output)| Example {
                    inputs: inputs.to_vec(),
                    output,
                })
                .collect(),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Number of inputs every example provides.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.examples[0].inputs.len()
    }

    /// Reward of a program that satisfies every example.
    #[must_use]
    pub const fn max_reward(&self) -> Reward {
        1.0
    }

    /// Reward of a program that satisfies no example.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn min_reward(&self) -> Reward {
        1.0 - self.examples.len() as Reward
    }

    /// Number of examples `state` satisfies.
    #[must_use]
    pub fn satisfied(&self, state: &State) -> usize {
        self.examples
            .iter()
            .filter(|example| example.is_satisfied_by(state))
            .count()
    }
}

impl FromStr for ExampleSuite {
    type Err = anyhow::Error;

    /// Parses `;`-separated examples, e.g. `2,2=4;2,3=5`.
    fn from_str(input: &str) -> anyhow::Result<Self> {
        let examples = input
            .split(';')
            .filter(|example| !example.trim().is_empty())
            .map(Example::from_str)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Self::new(examples)
    }
}

impl fmt::Display for ExampleSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.examples.iter().join(";"))
    }
}

impl Evaluator for ExampleSuite {
    /// Programs that can not be run on the examples (e.g. because they take a
    /// different number of parameters) satisfy none of them.
    #[allow(clippy::cast_precision_loss)]
    fn evaluate(&self, state: &State) -> Reward {
        self.min_reward() + self.satisfied(state) as Reward
    }
}
