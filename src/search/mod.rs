//! [Search] grows a tree of partial programs with [Monte Carlo Tree Search]
//! and extracts the most promising complete program once the budget is spent.
//!
//! [`synthesize`] is the entry point: it runs the search loop from [`mcts`]
//! on a fresh [`tree::Tree`], which rejects an invalid [`Config`] before the
//! first iteration, and reports the result. No state survives between runs.
//!
//! [Search]: https://en.wikipedia.org/wiki/Program_synthesis
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use log::info;
use rand::Rng;

use crate::evaluation::{Evaluator, Reward};
use crate::program::{State, Variable, DEFAULT_MAX_INSTRUCTIONS};

pub mod mcts;
pub mod tree;

/// Exploration constant used while searching. Extraction always uses `0`.
pub const DEFAULT_EXPLORATION: f64 = 1.0;

/// Default wall-clock budget of a search.
pub const DEFAULT_TIME: Duration = Duration::from_secs(10);

/// Budget of a single search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Wall-clock time. A search iteration is never interrupted, so the search
    /// may overrun this by the duration of one iteration.
    pub time: Duration,
    /// Optional cap on the number of search iterations, useful for
    /// reproducible runs.
    pub iterations: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            time: DEFAULT_TIME,
            iterations: None,
        }
    }
}

/// Parameters of the search.
#[derive(Clone, Debug)]
pub struct Config {
    /// Parameter names of the synthesized function.
    pub params: Vec<String>,
    /// Number of instructions after which programs can only `return`.
    pub max_instructions: usize,
    /// Exploration constant of the UCB1 formula during selection.
    pub exploration: f64,
    #[allow(missing_docs)]
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            params: vec!["a".to_string(), "b".to_string()],
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            exploration: DEFAULT_EXPLORATION,
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Checks that the search can run with this configuration.
    ///
    /// # Errors
    ///
    /// Rejects configurations without parameters, with duplicate or reserved
    /// parameter names, a zero budget or instruction cap, or an exploration
    /// constant that is negative or not finite.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.params.is_empty() {
            bail!("at least one parameter is required");
        }
        let mut seen = HashSet::new();
        for param in &self.params {
            if param.is_empty() {
                bail!("parameter names should not be empty");
            }
            if Variable::is_temporary_name(param) {
                bail!("parameter name '{param}' is reserved for temporaries");
            }
            if !seen.insert(param) {
                bail!("duplicate parameter '{param}'");
            }
        }
        if self.max_instructions == 0 {
            bail!("instruction cap should be positive");
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            bail!(
                "exploration constant should be finite and non-negative, got {}",
                self.exploration
            );
        }
        if self.limits.time.is_zero() {
            bail!("time budget should be positive");
        }
        if self.limits.iterations == Some(0) {
            bail!("iteration limit should be positive");
        }
        Ok(())
    }

    fn initial_state(&self) -> State {
        State::initial(self.params.iter().map(String::as_str).map(Variable::new))
    }
}

/// Tracks the budget of a running search.
pub(crate) struct Limiter {
    timer: Instant,
    limits: Limits,
}

impl Limiter {
    pub(crate) fn new(limits: Limits) -> Self {
        Self {
            timer: Instant::now(),
            limits,
        }
    }

    /// Returns `true` once either limit is reached after `iterations` rounds.
    pub(crate) fn exhausted(&self, iterations: u64) -> bool {
        self.timer.elapsed() >= self.limits.time
            || self.limits.iterations.is_some_and(|limit| iterations >= limit)
    }
}

/// Outcome of [`synthesize`].
#[derive(Debug)]
pub struct SearchResult {
    /// Best complete program found.
    pub program: State,
    /// Reward the evaluator assigns to [`Self::program`].
    pub reward: Reward,
    /// Number of completed search iterations.
    pub iterations: u64,
    /// Size of the search tree.
    pub nodes: usize,
    #[allow(missing_docs)]
    pub elapsed: Duration,
}

/// Searches for a program maximizing the `evaluator`'s reward within the
/// configured limits. Randomness of the simulations comes from `rng` only, so
/// runs with the same seed and iteration limit are reproducible.
///
/// # Errors
///
/// Fails if the configuration is invalid.
pub fn synthesize(
    config: &Config,
    evaluator: &impl Evaluator,
    rng: &mut impl Rng,
) -> anyhow::Result<SearchResult> {
    let timer = Instant::now();
    let mut tree = tree::Tree::new(config.initial_state());

    let iterations = mcts::tree_search(&mut tree, config, evaluator, rng)?;
    let program = mcts::best_terminal(&tree)
        .context("search finished without visiting any program")?
        .clone();
    let reward = evaluator.evaluate(&program);
    let elapsed = timer.elapsed();

    info!(
        "searched {iterations} iterations ({} nodes) in {} ms, best reward {reward}",
        tree.len(),
        elapsed.as_millis()
    );

    Ok(SearchResult {
        program,
        reward,
        iterations,
        nodes: tree.len(),
        elapsed,
    })
}
