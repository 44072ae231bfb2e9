//! Evaluation assigns a [`Reward`] to a complete program. The search only
//! relies on the [`Evaluator`] trait: how the reward is computed is up to the
//! implementation.
//!
//! [`ExampleSuite`] is the standard evaluator: it runs the program on a fixed
//! set of input/output examples and counts the ones it satisfies.

use crate::program::State;

mod examples;
pub use examples::{Example, ExampleSuite};

/// Numeric feedback for a complete program. Higher is better.
pub type Reward = f64;

/// Scores terminal states.
///
/// Implementations must be total and deterministic: every call with the same
/// program returns the same reward and never fails. Any failure of the
/// program under evaluation (including one a sandbox or timeout would catch)
/// has to be mapped to the minimum reward by the implementation itself.
pub trait Evaluator {
    /// Returns the reward of a terminal `state`.
    fn evaluate(&self, state: &State) -> Reward;
}

impl<F: Fn(&State) -> Reward> Evaluator for F {
    fn evaluate(&self, state: &State) -> Reward {
        self(state)
    }
}
